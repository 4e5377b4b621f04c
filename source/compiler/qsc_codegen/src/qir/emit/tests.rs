// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{emit_operations, inverted, microseconds};
use crate::qir::{
    QirOptions,
    error::{Error, Reference},
    module_builder::ModuleBuilder,
    resources::Resources,
};
use expect_test::{Expect, expect};
use qsc_circuit::{
    CircuitBuilder, ControlFlowKind, GateKind, NormalizedCircuit, Operation, PrepareState,
    ResultTarget, TimeUnit,
};
use qsc_data_structures::target::Profile;
use qsc_llvm::ToQir;

fn emit(circuit: &NormalizedCircuit, options: &QirOptions) -> Result<String, Error> {
    let mut builder = ModuleBuilder::new("test", "main");
    emit_operations(circuit, options, &mut builder)?;
    let module = builder.finish(Resources::default(), Profile::Base);
    let block = &module.functions[0].blocks[0];
    Ok(block
        .instructions
        .iter()
        .map(|instr| ToQir::<String>::to_qir(instr, &module).trim_start().to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn check(circuit: &NormalizedCircuit, expect: &Expect) {
    let body = emit(circuit, &QirOptions::default()).expect("emission should succeed");
    expect.assert_eq(&body);
}

#[test]
fn single_qubit_gate() {
    check(
        &CircuitBuilder::new("c", 1).h(0).build(),
        &expect![[r#"
              call void @__quantum__rt__initialize(ptr null)
              call void @__quantum__qis__h__body(ptr inttoptr (i64 0 to ptr))
              ret void"#]],
    );
}

#[test]
fn adjoint_gates() {
    check(
        &CircuitBuilder::new("c", 1).sdg(0).tdg(0).sxdg(0).build(),
        &expect![[r#"
              call void @__quantum__rt__initialize(ptr null)
              call void @__quantum__qis__s__adj(ptr inttoptr (i64 0 to ptr))
              call void @__quantum__qis__t__adj(ptr inttoptr (i64 0 to ptr))
              call void @__quantum__qis__sx__adj(ptr inttoptr (i64 0 to ptr))
              ret void"#]],
    );
}

#[test]
fn rotations_pass_the_angle_first() {
    check(
        &CircuitBuilder::new("c", 2).rx(0.5, 1).rzz(2.0, 1, 0).build(),
        &expect![[r#"
              call void @__quantum__rt__initialize(ptr null)
              call void @__quantum__qis__rx__body(double 0.5, ptr inttoptr (i64 1 to ptr))
              call void @__quantum__qis__rzz__body(double 2.0, ptr inttoptr (i64 1 to ptr), ptr inttoptr (i64 0 to ptr))
              ret void"#]],
    );
}

#[test]
fn controlled_gates_pass_controls_then_targets() {
    check(
        &CircuitBuilder::new("c", 3).cx(1, 0).ccx(2, 0, 1).swap(2, 1).build(),
        &expect![[r#"
              call void @__quantum__rt__initialize(ptr null)
              call void @__quantum__qis__cx__body(ptr inttoptr (i64 1 to ptr), ptr inttoptr (i64 0 to ptr))
              call void @__quantum__qis__ccx__body(ptr inttoptr (i64 2 to ptr), ptr inttoptr (i64 0 to ptr), ptr inttoptr (i64 1 to ptr))
              call void @__quantum__qis__swap__body(ptr inttoptr (i64 2 to ptr), ptr inttoptr (i64 1 to ptr))
              ret void"#]],
    );
}

#[test]
fn delays_are_converted_to_microseconds() {
    check(
        &CircuitBuilder::new("c", 1)
            .delay(0.5, TimeUnit::S, 0)
            .delay(0.5, TimeUnit::Ms, 0)
            .delay(0.5, TimeUnit::Us, 0)
            .delay(0.5, TimeUnit::Ns, 0)
            .delay(0.5, TimeUnit::Ps, 0)
            .delay(1.0, TimeUnit::Dt, 0)
            .build(),
        &expect![[r#"
              call void @__quantum__rt__initialize(ptr null)
              call void @__quantum__qis__delay__body(double 500000.0, ptr inttoptr (i64 0 to ptr))
              call void @__quantum__qis__delay__body(double 500.0, ptr inttoptr (i64 0 to ptr))
              call void @__quantum__qis__delay__body(double 0.5, ptr inttoptr (i64 0 to ptr))
              call void @__quantum__qis__delay__body(double 0.0005, ptr inttoptr (i64 0 to ptr))
              call void @__quantum__qis__delay__body(double 0.0000005, ptr inttoptr (i64 0 to ptr))
              call void @__quantum__qis__delay__body(double 1.0, ptr inttoptr (i64 0 to ptr))
              ret void"#]],
    );
}

#[test]
fn delay_multipliers() {
    assert!((microseconds(0.5, TimeUnit::S) - 500_000.0).abs() < f64::EPSILON);
    assert!((microseconds(2.0, TimeUnit::Ms) - 2_000.0).abs() < f64::EPSILON);
    assert!((microseconds(7.0, TimeUnit::Dt) - 7.0).abs() < f64::EPSILON);
}

#[test]
fn prepares_select_basis_and_sign() {
    check(
        &CircuitBuilder::new("c", 1)
            .prepare(PrepareState::Zero, 0)
            .prepare(PrepareState::One, 0)
            .prepare(PrepareState::Plus, 0)
            .prepare(PrepareState::Minus, 0)
            .build(),
        &expect![[r#"
              call void @__quantum__rt__initialize(ptr null)
              call void @__quantum__qis__prepare_z__body(i1 false, ptr inttoptr (i64 0 to ptr))
              call void @__quantum__qis__prepare_z__body(i1 true, ptr inttoptr (i64 0 to ptr))
              call void @__quantum__qis__prepare_x__body(i1 false, ptr inttoptr (i64 0 to ptr))
              call void @__quantum__qis__prepare_x__body(i1 true, ptr inttoptr (i64 0 to ptr))
              ret void"#]],
    );
    assert!(!inverted(PrepareState::Plus));
    assert!(inverted(PrepareState::Minus));
}

#[test]
fn measurement_uses_global_result_index() {
    check(
        &CircuitBuilder::new("c", 2)
            .register("a", 2)
            .register("b", 2)
            .measure(1, "b", 1)
            .measure(0, "a", 0)
            .build(),
        &expect![[r#"
              call void @__quantum__rt__initialize(ptr null)
              call void @__quantum__qis__mz__body(ptr inttoptr (i64 1 to ptr), ptr inttoptr (i64 3 to ptr))
              call void @__quantum__qis__mz__body(ptr inttoptr (i64 0 to ptr), ptr inttoptr (i64 0 to ptr))
              ret void"#]],
    );
}

#[test]
fn barrier_is_skipped_by_default() {
    let circuit = CircuitBuilder::new("c", 2)
        .h(0)
        .barrier(&[0, 1])
        .h(1)
        .build();
    check(
        &circuit,
        &expect![[r#"
              call void @__quantum__rt__initialize(ptr null)
              call void @__quantum__qis__h__body(ptr inttoptr (i64 0 to ptr))
              call void @__quantum__qis__h__body(ptr inttoptr (i64 1 to ptr))
              ret void"#]],
    );

    let options = QirOptions {
        emit_barrier_calls: true,
        ..QirOptions::default()
    };
    let body = emit(&circuit, &options).expect("emission should succeed");
    expect![[r#"
          call void @__quantum__rt__initialize(ptr null)
          call void @__quantum__qis__h__body(ptr inttoptr (i64 0 to ptr))
          call void @__quantum__qis__barrier__body()
          call void @__quantum__qis__h__body(ptr inttoptr (i64 1 to ptr))
          ret void"#]]
    .assert_eq(&body);
}

#[test]
fn control_flow_is_unsupported() {
    let circuit = CircuitBuilder::new("c", 1)
        .h(0)
        .push(Operation::new(
            GateKind::ControlFlow(ControlFlowKind::WhileLoop),
            [0],
        ))
        .build();
    let err = emit(&circuit, &QirOptions::default()).expect_err("while loop should fail");
    expect!["operation 1 (`while_loop`) has no QIR instruction"].assert_eq(&err.to_string());
}

#[test]
fn opaque_gate_is_unsupported() {
    let circuit = CircuitBuilder::new("c", 1)
        .push(Operation::new(GateKind::Opaque("u3".to_string()), [0]).with_params([0.1, 0.2, 0.3]))
        .build();
    assert_eq!(
        emit(&circuit, &QirOptions::default()),
        Err(Error::UnsupportedOperation {
            position: 0,
            name: "u3".to_string(),
        })
    );
}

#[test]
fn non_finite_parameter_is_rejected() {
    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let circuit = CircuitBuilder::new("c", 1).h(0).rx(value, 0).build();
        match emit(&circuit, &QirOptions::default()) {
            Err(Error::InvalidParameter { position, value: v }) => {
                assert_eq!(position, 1);
                assert_eq!(v.is_nan(), value.is_nan());
            }
            other => panic!("expected invalid parameter, got {other:?}"),
        }
    }
}

#[test]
fn delay_overflowing_in_conversion_is_rejected() {
    let circuit = CircuitBuilder::new("c", 1).delay(1e303, TimeUnit::S, 0).build();
    assert_eq!(
        emit(&circuit, &QirOptions::default()),
        Err(Error::InvalidParameter {
            position: 0,
            value: f64::INFINITY,
        })
    );
}

#[test]
fn measurement_without_known_register_is_rejected() {
    let mut op = Operation::new(GateKind::Measure, [0]);
    op.result = Some(ResultTarget {
        register: "missing".to_string(),
        bit: 0,
    });
    let circuit = CircuitBuilder::new("c", 1).push(op).build();
    assert_eq!(
        emit(&circuit, &QirOptions::default()),
        Err(Error::InvalidReference {
            position: 0,
            reference: Reference::UnknownRegister("missing".to_string()),
        })
    );
}
