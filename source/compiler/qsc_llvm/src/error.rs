// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Eq, Error, PartialEq)]
pub enum Error {
    #[error("input is not LLVM bitcode")]
    #[diagnostic(code("Qsc.Llvm.BadMagic"))]
    BadMagic,

    #[error("unexpected end of bitcode at bit {0}")]
    #[diagnostic(code("Qsc.Llvm.UnexpectedEof"))]
    UnexpectedEof(usize),

    #[error("unknown abbreviation {id} at bit {bit}")]
    #[diagnostic(code("Qsc.Llvm.UnknownAbbrev"))]
    UnknownAbbrev { id: u64, bit: usize },

    #[error("malformed bitstream at bit {bit}: {message}")]
    #[diagnostic(code("Qsc.Llvm.Malformed"))]
    Malformed { bit: usize, message: String },

    #[error("unsupported bitcode module version {0}")]
    #[diagnostic(code("Qsc.Llvm.UnsupportedVersion"))]
    UnsupportedVersion(u64),

    #[error("invalid bitcode module: {0}")]
    #[diagnostic(code("Qsc.Llvm.InvalidModule"))]
    InvalidModule(String),

    #[error("bitcode uses a construct outside the QIR subset: {0}")]
    #[diagnostic(code("Qsc.Llvm.Unsupported"))]
    Unsupported(String),

    #[error("call refers to value {0}, which is not a function")]
    #[diagnostic(code("Qsc.Llvm.UnknownCallee"))]
    UnknownCallee(u64),

    #[error("line {line}: {message}")]
    #[diagnostic(code("Qsc.Llvm.Parse"))]
    Parse { line: usize, message: String },
}
