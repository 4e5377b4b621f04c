// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(test)]
mod tests;

use super::{
    QirOptions,
    catalog::{self, ArgLayout, Arity, Intrinsic},
    error::{Error, Reference},
    module_builder::ModuleBuilder,
};
use log::debug;
use qsc_circuit::{GateKind, NormalizedCircuit, Operation, PrepareState, TimeUnit};
use qsc_llvm::Operand;

/// Appends one intrinsic call per operation, in circuit order.
pub fn emit_operations(
    circuit: &NormalizedCircuit,
    options: &QirOptions,
    builder: &mut ModuleBuilder,
) -> Result<(), Error> {
    for (position, op) in circuit.operations.iter().enumerate() {
        if matches!(op.kind, GateKind::Barrier) && !options.emit_barrier_calls {
            debug!("operation {position}: skipping `{op}`");
            continue;
        }

        let intrinsic = catalog::lookup(&op.kind, Arity::of(op))
            .ok_or_else(|| unsupported(position, op))?;
        if let Some(value) = op.params.iter().copied().find(|p| !p.is_finite()) {
            return Err(Error::InvalidParameter { position, value });
        }

        let args = arguments(circuit, position, op, intrinsic)?;
        debug!("operation {position}: `{op}` -> @{}", intrinsic.name);
        builder.call(intrinsic, args);
    }
    Ok(())
}

fn arguments(
    circuit: &NormalizedCircuit,
    position: usize,
    op: &Operation,
    intrinsic: &Intrinsic,
) -> Result<Vec<Operand>, Error> {
    let targets = op.targets.iter().map(|&q| qubit(q));
    let args = match intrinsic.layout {
        ArgLayout::Qubits => op.qubits().map(qubit).collect(),
        ArgLayout::AngleThenQubits => std::iter::once(Operand::Double(op.params[0]))
            .chain(targets)
            .collect(),
        ArgLayout::DurationThenQubit => {
            let GateKind::Delay(unit) = op.kind else {
                return Err(unsupported(position, op));
            };
            let value = microseconds(op.params[0], unit);
            if !value.is_finite() {
                return Err(Error::InvalidParameter { position, value });
            }
            std::iter::once(Operand::Double(value))
                .chain(targets)
                .collect()
        }
        ArgLayout::FlagThenQubit => {
            let GateKind::Prepare(state) = op.kind else {
                return Err(unsupported(position, op));
            };
            std::iter::once(Operand::Bool(inverted(state)))
                .chain(targets)
                .collect()
        }
        ArgLayout::QubitThenResult => {
            let target = op.result.as_ref().ok_or(Error::InvalidReference {
                position,
                reference: Reference::MissingResult,
            })?;
            let index = circuit
                .register(&target.register)
                .map(|reg| reg.global_index(target.bit))
                .ok_or_else(|| Error::InvalidReference {
                    position,
                    reference: Reference::UnknownRegister(target.register.clone()),
                })?;
            targets.chain([result(index)]).collect()
        }
        ArgLayout::NoArgs => Vec::new(),
    };
    Ok(args)
}

fn unsupported(position: usize, op: &Operation) -> Error {
    Error::UnsupportedOperation {
        position,
        name: op.kind.to_string(),
    }
}

fn qubit(q: u32) -> Operand {
    Operand::IntToPtr(u64::from(q))
}

fn result(r: u32) -> Operand {
    Operand::IntToPtr(u64::from(r))
}

/// Converts a delay duration to microseconds. Device cycles are passed through as is.
#[must_use]
pub fn microseconds(duration: f64, unit: TimeUnit) -> f64 {
    match unit {
        TimeUnit::S => duration * 1e6,
        TimeUnit::Ms => duration * 1e3,
        TimeUnit::Us | TimeUnit::Dt => duration,
        TimeUnit::Ns => duration * 1e-3,
        TimeUnit::Ps => duration * 1e-6,
    }
}

/// Whether a preparation targets the second state of its basis (`|1⟩` or `|-⟩`).
#[must_use]
pub fn inverted(state: PrepareState) -> bool {
    matches!(state, PrepareState::One | PrepareState::Minus)
}
