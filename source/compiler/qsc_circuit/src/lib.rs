// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The normalized circuit handed to QIR generation: an ordered list of operations
//! over qubits and classical registers.

mod builder;
mod circuit;

pub use builder::CircuitBuilder;
pub use circuit::{
    ClassicalRegister, ControlFlowKind, Gate, GateKind, NormalizedCircuit, Operation,
    PrepareState, ResultTarget, RotationGate, TimeUnit,
};
