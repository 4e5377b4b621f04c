// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(test)]
mod tests;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// An intermediate product of a translation that a caller may want to keep.
#[derive(Clone, Copy, Debug)]
pub enum Artifact<'a> {
    /// The input circuit as JSON.
    Circuit(&'a str),
    /// The module as LLVM text.
    Text(&'a str),
    /// The module as LLVM bitcode.
    Binary(&'a [u8]),
}

impl Artifact<'_> {
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Circuit(_) => "json",
            Self::Text(_) => "ll",
            Self::Binary(_) => "bc",
        }
    }

    #[must_use]
    pub fn contents(&self) -> &[u8] {
        match self {
            Self::Circuit(s) | Self::Text(s) => s.as_bytes(),
            Self::Binary(b) => b,
        }
    }
}

/// Receives translation artifacts. A failing sink never fails the translation.
pub trait DiagnosticSink {
    fn persist(&mut self, name: &str, artifact: Artifact<'_>) -> io::Result<()>;
}

/// A sink writing each artifact to `<dir>/<name>.<ext>`.
#[derive(Clone, Debug)]
pub struct ArtifactDirectory {
    root: PathBuf,
}

impl ArtifactDirectory {
    /// Creates the directory, and any missing parents, if it does not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path_for(&self, name: &str, artifact: &Artifact<'_>) -> PathBuf {
        self.root.join(format!("{name}.{}", artifact.extension()))
    }
}

impl DiagnosticSink for ArtifactDirectory {
    fn persist(&mut self, name: &str, artifact: Artifact<'_>) -> io::Result<()> {
        fs::write(self.path_for(name, &artifact), artifact.contents())
    }
}
