// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use miette::Diagnostic;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error, PartialEq)]
pub enum Error {
    #[error("operation {position} (`{name}`) has no QIR instruction")]
    #[diagnostic(code("Qsc.Qir.UnsupportedOperation"))]
    #[diagnostic(help(
        "structured control flow and unrecognized gates must be decomposed before generating QIR"
    ))]
    UnsupportedOperation { position: usize, name: String },

    #[error("operation {position} {reference}")]
    #[diagnostic(code("Qsc.Qir.InvalidReference"))]
    InvalidReference {
        position: usize,
        reference: Reference,
    },

    #[error("classical register `{register}` {issue}")]
    #[diagnostic(code("Qsc.Qir.MalformedRegisterLayout"))]
    #[diagnostic(help(
        "registers must be listed in order with offsets starting at 0 and no gaps or overlaps"
    ))]
    MalformedRegisterLayout {
        register: String,
        issue: LayoutIssue,
    },

    #[error("operation {position} has a non-finite parameter `{value}`")]
    #[diagnostic(code("Qsc.Qir.InvalidParameter"))]
    InvalidParameter { position: usize, value: f64 },

    #[error("text and bitcode renderings disagree: {0}")]
    #[diagnostic(code("Qsc.Qir.SerializationMismatch"))]
    SerializationMismatch(String),

    #[error("generated module is malformed: {0}")]
    #[diagnostic(code("Qsc.Qir.MalformedModule"))]
    MalformedModule(String),
}

/// What an operation got wrong about the qubits or classical bits it refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    Qubit { qubit: u32, num_qubits: u32 },
    RepeatedQubit(u32),
    UnknownRegister(String),
    Bit { register: String, bit: u32, size: u32 },
    MissingResult,
    UnexpectedResult,
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qubit { qubit, num_qubits } => write!(
                f,
                "refers to qubit {qubit} but the circuit has {num_qubits} qubits"
            ),
            Self::RepeatedQubit(qubit) => write!(f, "uses qubit {qubit} more than once"),
            Self::UnknownRegister(register) => {
                write!(f, "writes to unknown classical register `{register}`")
            }
            Self::Bit {
                register,
                bit,
                size,
            } => write!(
                f,
                "writes to bit {bit} of classical register `{register}` which has {size} bits"
            ),
            Self::MissingResult => f.write_str("is a measurement without a result target"),
            Self::UnexpectedResult => {
                f.write_str("has a result target but is not a measurement")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutIssue {
    Duplicate,
    Overlap { offset: u32, expected: u32 },
    Gap { offset: u32, expected: u32 },
    TooLarge,
}

impl Display for LayoutIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => f.write_str("is declared more than once"),
            Self::Overlap { offset, expected } => write!(
                f,
                "starts at offset {offset} and overlaps the previous register, expected offset {expected}"
            ),
            Self::Gap { offset, expected } => write!(
                f,
                "starts at offset {offset} and leaves a gap, expected offset {expected}"
            ),
            Self::TooLarge => f.write_str("exceeds the maximum number of results"),
        }
    }
}
