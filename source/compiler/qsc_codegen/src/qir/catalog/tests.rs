// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{ArgLayout, Arity, QIS, lookup};
use qsc_circuit::{ControlFlowKind, Gate, GateKind, PrepareState, RotationGate, TimeUnit};
use qsc_data_structures::attrs::Attributes;
use rustc_hash::FxHashSet;

fn arity(controls: usize, targets: usize, params: usize) -> Arity {
    Arity {
        controls,
        targets,
        params,
    }
}

fn name_of(kind: &GateKind, arity: Arity) -> Option<&'static str> {
    lookup(kind, arity).map(|intrinsic| intrinsic.name)
}

#[test]
fn single_qubit_unitaries_resolve_to_body() {
    for (gate, name) in [
        (Gate::H, "__quantum__qis__h__body"),
        (Gate::X, "__quantum__qis__x__body"),
        (Gate::Y, "__quantum__qis__y__body"),
        (Gate::Z, "__quantum__qis__z__body"),
        (Gate::S, "__quantum__qis__s__body"),
        (Gate::T, "__quantum__qis__t__body"),
        (Gate::Sx, "__quantum__qis__sx__body"),
    ] {
        assert_eq!(name_of(&GateKind::Unitary(gate), arity(0, 1, 0)), Some(name));
    }
}

#[test]
fn adjoint_is_a_distinct_intrinsic() {
    for gate in [Gate::S, Gate::T, Gate::Sx] {
        let body = lookup(&GateKind::Unitary(gate), arity(0, 1, 0)).expect("body should exist");
        let adj = lookup(&GateKind::Adjoint(gate), arity(0, 1, 0)).expect("adj should exist");
        assert_ne!(body.name, adj.name);
        assert!(adj.name.ends_with("__adj"));
    }
}

#[test]
fn self_adjoint_gates_have_no_adjoint_entry() {
    for gate in [Gate::H, Gate::X, Gate::Y, Gate::Z, Gate::Swap] {
        assert_eq!(name_of(&GateKind::Adjoint(gate), arity(0, 1, 0)), None);
    }
}

#[test]
fn controls_select_the_controlled_form() {
    let x = GateKind::Unitary(Gate::X);
    assert_eq!(name_of(&x, arity(1, 1, 0)), Some("__quantum__qis__cx__body"));
    assert_eq!(name_of(&x, arity(2, 1, 0)), Some("__quantum__qis__ccx__body"));
    assert_eq!(name_of(&x, arity(3, 1, 0)), None);
    assert_eq!(
        name_of(&GateKind::Unitary(Gate::Y), arity(1, 1, 0)),
        Some("__quantum__qis__cy__body")
    );
    assert_eq!(
        name_of(&GateKind::Unitary(Gate::Z), arity(1, 1, 0)),
        Some("__quantum__qis__cz__body")
    );
}

#[test]
fn gate_with_unsupported_shape_is_rejected() {
    assert_eq!(name_of(&GateKind::Unitary(Gate::H), arity(1, 1, 0)), None);
    assert_eq!(name_of(&GateKind::Unitary(Gate::Swap), arity(0, 1, 0)), None);
    assert_eq!(name_of(&GateKind::Unitary(Gate::H), arity(0, 1, 1)), None);
    assert_eq!(
        name_of(&GateKind::Rotation(RotationGate::Rx), arity(0, 2, 1)),
        None
    );
    assert_eq!(
        name_of(&GateKind::Rotation(RotationGate::Rzz), arity(0, 1, 1)),
        None
    );
    assert_eq!(
        name_of(&GateKind::Rotation(RotationGate::Rz), arity(0, 1, 0)),
        None
    );
}

#[test]
fn rotations_take_the_angle_first() {
    let rx = lookup(&GateKind::Rotation(RotationGate::Rx), arity(0, 1, 1)).expect("rx");
    assert_eq!(rx.layout, ArgLayout::AngleThenQubits);
    let rzz = lookup(&GateKind::Rotation(RotationGate::Rzz), arity(0, 2, 1)).expect("rzz");
    assert_eq!(rzz.name, "__quantum__qis__rzz__body");
    assert_eq!(rzz.params.len(), 3);
}

#[test]
fn delay_shares_one_intrinsic_across_units() {
    let names = [
        TimeUnit::S,
        TimeUnit::Ms,
        TimeUnit::Us,
        TimeUnit::Ns,
        TimeUnit::Ps,
        TimeUnit::Dt,
    ]
    .into_iter()
    .map(|unit| name_of(&GateKind::Delay(unit), arity(0, 1, 1)))
    .collect::<FxHashSet<_>>();
    assert_eq!(names.len(), 1);
    assert!(names.contains(&Some("__quantum__qis__delay__body")));
}

#[test]
fn prepare_basis_selects_intrinsic() {
    let prepare = |state| name_of(&GateKind::Prepare(state), arity(0, 1, 0));
    assert_eq!(prepare(PrepareState::Zero), Some("__quantum__qis__prepare_z__body"));
    assert_eq!(prepare(PrepareState::One), Some("__quantum__qis__prepare_z__body"));
    assert_eq!(prepare(PrepareState::Plus), Some("__quantum__qis__prepare_x__body"));
    assert_eq!(prepare(PrepareState::Minus), Some("__quantum__qis__prepare_x__body"));
}

#[test]
fn measurement_and_reset_are_irreversible() {
    let mz = lookup(&GateKind::Measure, arity(0, 1, 0)).expect("mz");
    let reset = lookup(&GateKind::Reset, arity(0, 1, 0)).expect("reset");
    assert_eq!(mz.attrs, Attributes::Irreversible);
    assert_eq!(mz.layout, ArgLayout::QubitThenResult);
    assert_eq!(reset.attrs, Attributes::Irreversible);
    let irreversible = QIS
        .iter()
        .filter(|intrinsic| intrinsic.attrs.contains(Attributes::Irreversible))
        .count();
    assert_eq!(irreversible, 2);
}

#[test]
fn barrier_accepts_any_number_of_targets() {
    for targets in 0..4 {
        assert_eq!(
            name_of(&GateKind::Barrier, arity(0, targets, 0)),
            Some("__quantum__qis__barrier__body")
        );
    }
}

#[test]
fn control_flow_and_opaque_gates_are_not_in_the_catalog() {
    for kind in [
        ControlFlowKind::IfElse,
        ControlFlowKind::WhileLoop,
        ControlFlowKind::ForLoop,
        ControlFlowKind::SwitchCase,
        ControlFlowKind::BreakLoop,
        ControlFlowKind::ContinueLoop,
    ] {
        assert_eq!(name_of(&GateKind::ControlFlow(kind), arity(0, 1, 0)), None);
        assert_eq!(name_of(&GateKind::ControlFlow(kind), arity(0, 0, 0)), None);
    }
    assert_eq!(
        name_of(&GateKind::Opaque("u3".to_string()), arity(0, 1, 3)),
        None
    );
}

#[test]
fn names_are_unique_and_params_match_layout() {
    let mut seen = FxHashSet::default();
    for intrinsic in QIS {
        assert!(seen.insert(intrinsic.name), "duplicate {}", intrinsic.name);
        assert!(intrinsic.name.starts_with("__quantum__qis__"));
        assert_eq!(intrinsic.ret, None);
        match intrinsic.layout {
            ArgLayout::NoArgs => assert!(intrinsic.params.is_empty()),
            ArgLayout::AngleThenQubits | ArgLayout::DurationThenQubit => {
                assert_eq!(intrinsic.params[0], qsc_llvm::Ty::Double);
            }
            ArgLayout::FlagThenQubit => assert_eq!(intrinsic.params[0], qsc_llvm::Ty::I1),
            ArgLayout::Qubits | ArgLayout::QubitThenResult => assert!(
                intrinsic
                    .params
                    .iter()
                    .all(|ty| *ty == qsc_llvm::Ty::Ptr)
            ),
        }
    }
}
