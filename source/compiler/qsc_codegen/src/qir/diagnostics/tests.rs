// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{Artifact, ArtifactDirectory, DiagnosticSink};
use std::{fs, path::PathBuf};

fn scratch_dir(test: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("qsc_codegen_{}", std::process::id()))
        .join(test)
}

#[test]
fn directory_is_created_on_construction() {
    let dir = scratch_dir("created").join("nested");
    let _ = fs::remove_dir_all(&dir);
    let sink = ArtifactDirectory::new(&dir).expect("directory should be created");
    assert!(sink.root().is_dir());
    fs::remove_dir_all(&dir).expect("cleanup should succeed");
}

#[test]
fn artifacts_are_written_by_extension() {
    let dir = scratch_dir("written");
    let mut sink = ArtifactDirectory::new(&dir).expect("directory should be created");
    sink.persist("bell", Artifact::Circuit("{}"))
        .expect("json should be written");
    sink.persist("bell", Artifact::Text("; ModuleID = 'bell'\n"))
        .expect("text should be written");
    sink.persist("bell", Artifact::Binary(b"BC\xC0\xDE"))
        .expect("bitcode should be written");

    assert_eq!(
        fs::read_to_string(dir.join("bell.json")).expect("json should exist"),
        "{}"
    );
    assert_eq!(
        fs::read_to_string(dir.join("bell.ll")).expect("text should exist"),
        "; ModuleID = 'bell'\n"
    );
    assert_eq!(
        fs::read(dir.join("bell.bc")).expect("bitcode should exist"),
        b"BC\xC0\xDE"
    );
    fs::remove_dir_all(&dir).expect("cleanup should succeed");
}

#[test]
fn path_uses_name_and_extension() {
    let dir = scratch_dir("paths");
    let sink = ArtifactDirectory::new(&dir).expect("directory should be created");
    assert_eq!(
        sink.path_for("main", &Artifact::Binary(&[])),
        dir.join("main.bc")
    );
    fs::remove_dir_all(&dir).expect("cleanup should succeed");
}
