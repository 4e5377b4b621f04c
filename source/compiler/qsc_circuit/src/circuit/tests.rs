// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{
    ControlFlowKind, Gate, GateKind, NormalizedCircuit, Operation, PrepareState, RotationGate,
    TimeUnit,
};
use expect_test::expect;
use indoc::indoc;

#[test]
fn circuit_from_json() {
    let circuit = NormalizedCircuit::from_json(indoc! {r#"
        {
            "name": "bell",
            "numQubits": 2,
            "registers": [{ "id": "c", "size": 2, "offset": 0 }],
            "operations": [
                { "kind": { "unitary": "h" }, "targets": [0] },
                { "kind": { "unitary": "x" }, "controls": [0], "targets": [1] },
                { "kind": "measure", "targets": [0], "result": { "register": "c", "bit": 0 } },
                { "kind": "measure", "targets": [1], "result": { "register": "c", "bit": 1 } }
            ]
        }
    "#})
    .expect("circuit json should deserialize");

    assert_eq!(circuit.num_qubits, 2);
    assert_eq!(circuit.operations.len(), 4);
    assert_eq!(circuit.operations[1].kind, GateKind::Unitary(Gate::X));
    assert_eq!(circuit.operations[1].controls, vec![0]);
    assert!(circuit.operations[2].kind.is_measurement());
    assert_eq!(circuit.register("c").map(|reg| reg.size), Some(2));
}

#[test]
fn gate_kinds_from_json() {
    let kinds: Vec<GateKind> = serde_json::from_str(
        r#"[
            { "adjoint": "s" },
            { "rotation": "rzz" },
            { "delay": "dt" },
            { "prepare": "-" },
            "barrier",
            "reset",
            { "controlFlow": "while_loop" },
            { "opaque": "u3" }
        ]"#,
    )
    .expect("gate kinds should deserialize");
    assert_eq!(
        kinds,
        vec![
            GateKind::Adjoint(Gate::S),
            GateKind::Rotation(RotationGate::Rzz),
            GateKind::Delay(TimeUnit::Dt),
            GateKind::Prepare(PrepareState::Minus),
            GateKind::Barrier,
            GateKind::Reset,
            GateKind::ControlFlow(ControlFlowKind::WhileLoop),
            GateKind::Opaque("u3".to_string()),
        ]
    );
}

#[test]
fn json_round_trip_preserves_circuit() {
    let circuit = NormalizedCircuit {
        name: "delay".to_string(),
        num_qubits: 1,
        operations: vec![
            Operation::new(GateKind::Delay(TimeUnit::Ns), [0]).with_params([0.5]),
        ],
        registers: Vec::new(),
    };
    let json = circuit.to_json().expect("circuit should serialize");
    assert_eq!(NormalizedCircuit::from_json(&json).ok(), Some(circuit));
}

#[test]
fn unknown_gate_kind_is_a_deserialization_error() {
    let result = serde_json::from_str::<GateKind>(r#"{ "unitary": "u3" }"#);
    assert!(result.is_err());
}

#[test]
fn operation_qubits_list_controls_first() {
    let op = Operation::new(GateKind::Unitary(Gate::X), [1]).with_controls([2, 0]);
    assert_eq!(op.qubits().collect::<Vec<_>>(), vec![2, 0, 1]);
}

#[test]
fn circuit_display() {
    let circuit = NormalizedCircuit {
        name: "sample".to_string(),
        num_qubits: 2,
        operations: vec![
            Operation::new(GateKind::Rotation(RotationGate::Rx), [0]).with_params([0.5]),
            Operation::new(GateKind::Unitary(Gate::Z), [1]).with_controls([0]),
            Operation::new(GateKind::Adjoint(Gate::T), [1]),
            Operation::new(GateKind::Measure, [1]).with_result("c", 0),
        ],
        registers: vec![super::ClassicalRegister {
            id: "c".to_string(),
            size: 1,
            offset: 0,
        }],
    };
    expect![[r#"
        circuit sample (2 qubits)
            creg c[1] @0
            rx(0.5) q0
            z q0, q1
            tdg q1
            measure q1 -> c[0]
    "#]]
    .assert_eq(&circuit.to_string());
}
