// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter, Write};

/// A circuit in the normalized form accepted by QIR generation.
///
/// Operations are kept in program order. Registers are kept in declaration
/// order, and each register owns the contiguous range of global result indices
/// `offset..offset + size`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedCircuit {
    #[serde(default)]
    pub name: String,
    pub num_qubits: u32,
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub registers: Vec<ClassicalRegister>,
}

impl NormalizedCircuit {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[must_use]
    pub fn register(&self, id: &str) -> Option<&ClassicalRegister> {
        self.registers.iter().find(|reg| reg.id == id)
    }
}

impl Display for NormalizedCircuit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "circuit {} ({} qubits)", self.name, self.num_qubits)?;
        for reg in &self.registers {
            writeln!(f, "    creg {}[{}] @{}", reg.id, reg.size, reg.offset)?;
        }
        for op in &self.operations {
            writeln!(f, "    {op}")?;
        }
        Ok(())
    }
}

/// A single circuit instruction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub kind: GateKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultTarget>,
}

impl Operation {
    #[must_use]
    pub fn new(kind: GateKind, targets: impl Into<Vec<u32>>) -> Self {
        Self {
            kind,
            targets: targets.into(),
            controls: Vec::new(),
            params: Vec::new(),
            result: None,
        }
    }

    #[must_use]
    pub fn with_controls(mut self, controls: impl Into<Vec<u32>>) -> Self {
        self.controls = controls.into();
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: impl Into<Vec<f64>>) -> Self {
        self.params = params.into();
        self
    }

    #[must_use]
    pub fn with_result(mut self, register: impl Into<String>, bit: u32) -> Self {
        self.result = Some(ResultTarget {
            register: register.into(),
            bit,
        });
        self
    }

    /// All qubits the operation touches, controls first.
    pub fn qubits(&self) -> impl Iterator<Item = u32> + '_ {
        self.controls.iter().chain(&self.targets).copied()
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.params.is_empty() {
            let params = self
                .params
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "({params})")?;
        }
        let mut qubits = String::new();
        for (i, q) in self.qubits().enumerate() {
            if i > 0 {
                qubits.push_str(", ");
            }
            write!(qubits, "q{q}")?;
        }
        if !qubits.is_empty() {
            write!(f, " {qubits}")?;
        }
        if let Some(result) = &self.result {
            write!(f, " -> {}[{}]", result.register, result.bit)?;
        }
        Ok(())
    }
}

/// The classical bit a measurement writes, addressed relative to its register.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultTarget {
    pub register: String,
    pub bit: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassicalRegister {
    pub id: String,
    pub size: u32,
    /// Global index of the register's first result.
    pub offset: u32,
}

impl ClassicalRegister {
    #[must_use]
    pub fn global_index(&self, bit: u32) -> u32 {
        self.offset + bit
    }
}

/// The closed set of operation kinds a normalized circuit can contain.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GateKind {
    /// A fixed unitary. With controls, the controlled form of the gate.
    Unitary(Gate),
    /// The inverse of a fixed unitary.
    Adjoint(Gate),
    /// A rotation parameterized by a single angle.
    Rotation(RotationGate),
    /// An idle period whose single parameter is the duration in the given unit.
    Delay(TimeUnit),
    Prepare(PrepareState),
    Measure,
    Reset,
    Barrier,
    ControlFlow(ControlFlowKind),
    /// A gate the circuit source could not normalize.
    Opaque(String),
}

impl GateKind {
    #[must_use]
    pub fn is_measurement(&self) -> bool {
        matches!(self, Self::Measure)
    }
}

impl Display for GateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unitary(gate) => write!(f, "{gate}"),
            Self::Adjoint(gate) => write!(f, "{gate}dg"),
            Self::Rotation(rotation) => write!(f, "{rotation}"),
            Self::Delay(unit) => write!(f, "delay[{unit}]"),
            Self::Prepare(state) => write!(f, "prepare[{state}]"),
            Self::Measure => f.write_str("measure"),
            Self::Reset => f.write_str("reset"),
            Self::Barrier => f.write_str("barrier"),
            Self::ControlFlow(kind) => write!(f, "{kind}"),
            Self::Opaque(name) => f.write_str(name),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gate {
    H,
    X,
    Y,
    Z,
    S,
    T,
    Sx,
    Swap,
}

impl Display for Gate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::H => "h",
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::S => "s",
            Self::T => "t",
            Self::Sx => "sx",
            Self::Swap => "swap",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationGate {
    Rx,
    Ry,
    Rz,
    Rxx,
    Ryy,
    Rzz,
}

impl Display for RotationGate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rx => "rx",
            Self::Ry => "ry",
            Self::Rz => "rz",
            Self::Rxx => "rxx",
            Self::Ryy => "ryy",
            Self::Rzz => "rzz",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    S,
    Ms,
    Us,
    Ns,
    Ps,
    /// Device cycles.
    Dt,
}

impl Display for TimeUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::S => "s",
            Self::Ms => "ms",
            Self::Us => "us",
            Self::Ns => "ns",
            Self::Ps => "ps",
            Self::Dt => "dt",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrepareState {
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl Display for PrepareState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Zero => "0",
            Self::One => "1",
            Self::Plus => "+",
            Self::Minus => "-",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlFlowKind {
    IfElse,
    WhileLoop,
    ForLoop,
    SwitchCase,
    BreakLoop,
    ContinueLoop,
}

impl Display for ControlFlowKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IfElse => "if_else",
            Self::WhileLoop => "while_loop",
            Self::ForLoop => "for_loop",
            Self::SwitchCase => "switch_case",
            Self::BreakLoop => "break_loop",
            Self::ContinueLoop => "continue_loop",
        })
    }
}
