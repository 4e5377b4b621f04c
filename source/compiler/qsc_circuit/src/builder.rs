// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


use crate::circuit::{
    ClassicalRegister, Gate, GateKind, NormalizedCircuit, Operation, PrepareState, RotationGate,
    TimeUnit,
};

/// Builds a [`NormalizedCircuit`] one operation at a time.
///
/// Registers added through the builder are laid out back to back in the order
/// they are added, so the resulting circuit has a valid register layout as long
/// as the sizes sum to at most `u32::MAX`. Offsets past that saturate.
#[derive(Clone, Debug, Default)]
pub struct CircuitBuilder {
    circuit: NormalizedCircuit,
    next_offset: u32,
}

impl CircuitBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            circuit: NormalizedCircuit {
                name: name.into(),
                num_qubits,
                operations: Vec::new(),
                registers: Vec::new(),
            },
            next_offset: 0,
        }
    }

    pub fn register(&mut self, id: impl Into<String>, size: u32) -> &mut Self {
        self.circuit.registers.push(ClassicalRegister {
            id: id.into(),
            size,
            offset: self.next_offset,
        });
        self.next_offset = self.next_offset.saturating_add(size);
        self
    }

    pub fn push(&mut self, op: Operation) -> &mut Self {
        self.circuit.operations.push(op);
        self
    }

    fn gate(&mut self, gate: Gate, q: u32) -> &mut Self {
        self.push(Operation::new(GateKind::Unitary(gate), [q]))
    }

    fn adjoint(&mut self, gate: Gate, q: u32) -> &mut Self {
        self.push(Operation::new(GateKind::Adjoint(gate), [q]))
    }

    fn rotation(&mut self, rotation: RotationGate, theta: f64, qubits: &[u32]) -> &mut Self {
        self.push(Operation::new(GateKind::Rotation(rotation), qubits).with_params([theta]))
    }

    pub fn h(&mut self, q: u32) -> &mut Self {
        self.gate(Gate::H, q)
    }

    pub fn x(&mut self, q: u32) -> &mut Self {
        self.gate(Gate::X, q)
    }

    pub fn y(&mut self, q: u32) -> &mut Self {
        self.gate(Gate::Y, q)
    }

    pub fn z(&mut self, q: u32) -> &mut Self {
        self.gate(Gate::Z, q)
    }

    pub fn s(&mut self, q: u32) -> &mut Self {
        self.gate(Gate::S, q)
    }

    pub fn t(&mut self, q: u32) -> &mut Self {
        self.gate(Gate::T, q)
    }

    pub fn sx(&mut self, q: u32) -> &mut Self {
        self.gate(Gate::Sx, q)
    }

    pub fn sdg(&mut self, q: u32) -> &mut Self {
        self.adjoint(Gate::S, q)
    }

    pub fn tdg(&mut self, q: u32) -> &mut Self {
        self.adjoint(Gate::T, q)
    }

    pub fn sxdg(&mut self, q: u32) -> &mut Self {
        self.adjoint(Gate::Sx, q)
    }

    pub fn cx(&mut self, control: u32, target: u32) -> &mut Self {
        self.push(Operation::new(GateKind::Unitary(Gate::X), [target]).with_controls([control]))
    }

    pub fn cy(&mut self, control: u32, target: u32) -> &mut Self {
        self.push(Operation::new(GateKind::Unitary(Gate::Y), [target]).with_controls([control]))
    }

    pub fn cz(&mut self, control: u32, target: u32) -> &mut Self {
        self.push(Operation::new(GateKind::Unitary(Gate::Z), [target]).with_controls([control]))
    }

    pub fn ccx(&mut self, control1: u32, control2: u32, target: u32) -> &mut Self {
        self.push(
            Operation::new(GateKind::Unitary(Gate::X), [target]).with_controls([control1, control2]),
        )
    }

    pub fn swap(&mut self, q1: u32, q2: u32) -> &mut Self {
        self.push(Operation::new(GateKind::Unitary(Gate::Swap), [q1, q2]))
    }

    pub fn rx(&mut self, theta: f64, q: u32) -> &mut Self {
        self.rotation(RotationGate::Rx, theta, &[q])
    }

    pub fn ry(&mut self, theta: f64, q: u32) -> &mut Self {
        self.rotation(RotationGate::Ry, theta, &[q])
    }

    pub fn rz(&mut self, theta: f64, q: u32) -> &mut Self {
        self.rotation(RotationGate::Rz, theta, &[q])
    }

    pub fn rxx(&mut self, theta: f64, q1: u32, q2: u32) -> &mut Self {
        self.rotation(RotationGate::Rxx, theta, &[q1, q2])
    }

    pub fn ryy(&mut self, theta: f64, q1: u32, q2: u32) -> &mut Self {
        self.rotation(RotationGate::Ryy, theta, &[q1, q2])
    }

    pub fn rzz(&mut self, theta: f64, q1: u32, q2: u32) -> &mut Self {
        self.rotation(RotationGate::Rzz, theta, &[q1, q2])
    }

    pub fn delay(&mut self, duration: f64, unit: TimeUnit, q: u32) -> &mut Self {
        self.push(Operation::new(GateKind::Delay(unit), [q]).with_params([duration]))
    }

    pub fn prepare(&mut self, state: PrepareState, q: u32) -> &mut Self {
        self.push(Operation::new(GateKind::Prepare(state), [q]))
    }

    pub fn measure(&mut self, q: u32, register: impl Into<String>, bit: u32) -> &mut Self {
        self.push(Operation::new(GateKind::Measure, [q]).with_result(register, bit))
    }

    pub fn reset(&mut self, q: u32) -> &mut Self {
        self.push(Operation::new(GateKind::Reset, [q]))
    }

    pub fn barrier(&mut self, qubits: &[u32]) -> &mut Self {
        self.push(Operation::new(GateKind::Barrier, qubits))
    }

    #[must_use]
    pub fn build(&self) -> NormalizedCircuit {
        self.circuit.clone()
    }
}
