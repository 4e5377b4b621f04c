// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The static table of QIS and runtime intrinsics a circuit can lower to.
//!
//! Every supported operation resolves to exactly one [`Intrinsic`], keyed by its
//! kind and by how many controls, targets and parameters it carries. The table also
//! pins the positional argument layout of each intrinsic so that emission never has
//! to special-case individual gates.

#[cfg(test)]
mod tests;

use qsc_circuit::{Gate, GateKind, PrepareState, RotationGate};
use qsc_data_structures::attrs::Attributes;
use qsc_llvm::Ty;

/// A callable QIR intrinsic together with the order its arguments are passed in.
#[derive(Debug, PartialEq, Eq)]
pub struct Intrinsic {
    pub name: &'static str,
    pub params: &'static [Ty],
    pub ret: Option<Ty>,
    pub attrs: Attributes,
    pub layout: ArgLayout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgLayout {
    /// Controls in operation order, then targets in operation order.
    Qubits,
    /// The rotation angle, then the targets.
    AngleThenQubits,
    /// The duration in microseconds (or raw device cycles), then the target.
    DurationThenQubit,
    /// An `i1` selecting the inverted state, then the target.
    FlagThenQubit,
    /// The measured qubit, then the result it is written to.
    QubitThenResult,
    NoArgs,
}

/// The shape of an operation used as part of the catalog key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Arity {
    pub controls: usize,
    pub targets: usize,
    pub params: usize,
}

impl Arity {
    #[must_use]
    pub fn of(op: &qsc_circuit::Operation) -> Self {
        Self {
            controls: op.controls.len(),
            targets: op.targets.len(),
            params: op.params.len(),
        }
    }
}

const fn qis(name: &'static str, params: &'static [Ty], layout: ArgLayout) -> Intrinsic {
    Intrinsic {
        name,
        params,
        ret: None,
        attrs: Attributes::empty(),
        layout,
    }
}

const fn irreversible(name: &'static str, params: &'static [Ty], layout: ArgLayout) -> Intrinsic {
    Intrinsic {
        name,
        params,
        ret: None,
        attrs: Attributes::Irreversible,
        layout,
    }
}

const ONE_QUBIT: &[Ty] = &[Ty::Ptr];
const TWO_QUBITS: &[Ty] = &[Ty::Ptr, Ty::Ptr];
const THREE_QUBITS: &[Ty] = &[Ty::Ptr, Ty::Ptr, Ty::Ptr];

pub static H: Intrinsic = qis("__quantum__qis__h__body", ONE_QUBIT, ArgLayout::Qubits);
pub static X: Intrinsic = qis("__quantum__qis__x__body", ONE_QUBIT, ArgLayout::Qubits);
pub static Y: Intrinsic = qis("__quantum__qis__y__body", ONE_QUBIT, ArgLayout::Qubits);
pub static Z: Intrinsic = qis("__quantum__qis__z__body", ONE_QUBIT, ArgLayout::Qubits);
pub static S: Intrinsic = qis("__quantum__qis__s__body", ONE_QUBIT, ArgLayout::Qubits);
pub static S_ADJ: Intrinsic = qis("__quantum__qis__s__adj", ONE_QUBIT, ArgLayout::Qubits);
pub static T: Intrinsic = qis("__quantum__qis__t__body", ONE_QUBIT, ArgLayout::Qubits);
pub static T_ADJ: Intrinsic = qis("__quantum__qis__t__adj", ONE_QUBIT, ArgLayout::Qubits);
pub static SX: Intrinsic = qis("__quantum__qis__sx__body", ONE_QUBIT, ArgLayout::Qubits);
pub static SX_ADJ: Intrinsic = qis("__quantum__qis__sx__adj", ONE_QUBIT, ArgLayout::Qubits);

pub static CX: Intrinsic = qis("__quantum__qis__cx__body", TWO_QUBITS, ArgLayout::Qubits);
pub static CY: Intrinsic = qis("__quantum__qis__cy__body", TWO_QUBITS, ArgLayout::Qubits);
pub static CZ: Intrinsic = qis("__quantum__qis__cz__body", TWO_QUBITS, ArgLayout::Qubits);
pub static SWAP: Intrinsic = qis("__quantum__qis__swap__body", TWO_QUBITS, ArgLayout::Qubits);
pub static CCX: Intrinsic = qis("__quantum__qis__ccx__body", THREE_QUBITS, ArgLayout::Qubits);

pub static RX: Intrinsic = qis(
    "__quantum__qis__rx__body",
    &[Ty::Double, Ty::Ptr],
    ArgLayout::AngleThenQubits,
);
pub static RY: Intrinsic = qis(
    "__quantum__qis__ry__body",
    &[Ty::Double, Ty::Ptr],
    ArgLayout::AngleThenQubits,
);
pub static RZ: Intrinsic = qis(
    "__quantum__qis__rz__body",
    &[Ty::Double, Ty::Ptr],
    ArgLayout::AngleThenQubits,
);
pub static RXX: Intrinsic = qis(
    "__quantum__qis__rxx__body",
    &[Ty::Double, Ty::Ptr, Ty::Ptr],
    ArgLayout::AngleThenQubits,
);
pub static RYY: Intrinsic = qis(
    "__quantum__qis__ryy__body",
    &[Ty::Double, Ty::Ptr, Ty::Ptr],
    ArgLayout::AngleThenQubits,
);
pub static RZZ: Intrinsic = qis(
    "__quantum__qis__rzz__body",
    &[Ty::Double, Ty::Ptr, Ty::Ptr],
    ArgLayout::AngleThenQubits,
);

pub static DELAY: Intrinsic = qis(
    "__quantum__qis__delay__body",
    &[Ty::Double, Ty::Ptr],
    ArgLayout::DurationThenQubit,
);
pub static PREPARE_Z: Intrinsic = qis(
    "__quantum__qis__prepare_z__body",
    &[Ty::I1, Ty::Ptr],
    ArgLayout::FlagThenQubit,
);
pub static PREPARE_X: Intrinsic = qis(
    "__quantum__qis__prepare_x__body",
    &[Ty::I1, Ty::Ptr],
    ArgLayout::FlagThenQubit,
);

pub static MZ: Intrinsic = irreversible(
    "__quantum__qis__mz__body",
    TWO_QUBITS,
    ArgLayout::QubitThenResult,
);
pub static RESET: Intrinsic =
    irreversible("__quantum__qis__reset__body", ONE_QUBIT, ArgLayout::Qubits);
pub static BARRIER: Intrinsic = qis("__quantum__qis__barrier__body", &[], ArgLayout::NoArgs);

pub static INITIALIZE: Intrinsic = qis("__quantum__rt__initialize", ONE_QUBIT, ArgLayout::NoArgs);
pub static ARRAY_RECORD_OUTPUT: Intrinsic = qis(
    "__quantum__rt__array_record_output",
    &[Ty::I64, Ty::Ptr],
    ArgLayout::NoArgs,
);
pub static RESULT_RECORD_OUTPUT: Intrinsic = qis(
    "__quantum__rt__result_record_output",
    TWO_QUBITS,
    ArgLayout::NoArgs,
);

/// Every QIS intrinsic an operation can resolve to.
pub static QIS: &[&Intrinsic] = &[
    &H, &X, &Y, &Z, &S, &S_ADJ, &T, &T_ADJ, &SX, &SX_ADJ, &CX, &CY, &CZ, &SWAP, &CCX, &RX, &RY,
    &RZ, &RXX, &RYY, &RZZ, &DELAY, &PREPARE_Z, &PREPARE_X, &MZ, &RESET, &BARRIER,
];

/// Resolves the intrinsic for an operation of the given kind and shape.
///
/// Returns `None` for structured control flow, opaque gates and for known gates
/// used with a shape no intrinsic accepts, such as `h` with a control.
#[must_use]
pub fn lookup(kind: &GateKind, arity: Arity) -> Option<&'static Intrinsic> {
    let Arity {
        controls,
        targets,
        params,
    } = arity;
    let intrinsic = match (kind, controls, targets, params) {
        (GateKind::Unitary(gate), 0, 1, 0) => match gate {
            Gate::H => &H,
            Gate::X => &X,
            Gate::Y => &Y,
            Gate::Z => &Z,
            Gate::S => &S,
            Gate::T => &T,
            Gate::Sx => &SX,
            Gate::Swap => return None,
        },
        (GateKind::Unitary(Gate::X), 1, 1, 0) => &CX,
        (GateKind::Unitary(Gate::Y), 1, 1, 0) => &CY,
        (GateKind::Unitary(Gate::Z), 1, 1, 0) => &CZ,
        (GateKind::Unitary(Gate::X), 2, 1, 0) => &CCX,
        (GateKind::Unitary(Gate::Swap), 0, 2, 0) => &SWAP,
        (GateKind::Adjoint(Gate::S), 0, 1, 0) => &S_ADJ,
        (GateKind::Adjoint(Gate::T), 0, 1, 0) => &T_ADJ,
        (GateKind::Adjoint(Gate::Sx), 0, 1, 0) => &SX_ADJ,
        (GateKind::Rotation(rotation), 0, 1, 1) => match rotation {
            RotationGate::Rx => &RX,
            RotationGate::Ry => &RY,
            RotationGate::Rz => &RZ,
            RotationGate::Rxx | RotationGate::Ryy | RotationGate::Rzz => return None,
        },
        (GateKind::Rotation(rotation), 0, 2, 1) => match rotation {
            RotationGate::Rxx => &RXX,
            RotationGate::Ryy => &RYY,
            RotationGate::Rzz => &RZZ,
            RotationGate::Rx | RotationGate::Ry | RotationGate::Rz => return None,
        },
        (GateKind::Delay(_), 0, 1, 1) => &DELAY,
        (GateKind::Prepare(PrepareState::Zero | PrepareState::One), 0, 1, 0) => &PREPARE_Z,
        (GateKind::Prepare(PrepareState::Plus | PrepareState::Minus), 0, 1, 0) => &PREPARE_X,
        (GateKind::Measure, 0, 1, 0) => &MZ,
        (GateKind::Reset, 0, 1, 0) => &RESET,
        (GateKind::Barrier, 0, _, 0) => &BARRIER,
        _ => return None,
    };
    Some(intrinsic)
}
