// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


use super::error::{Error, LayoutIssue, Reference};
use log::debug;
use qsc_circuit::{NormalizedCircuit, Operation};
use rustc_hash::FxHashSet;
use serde::Serialize;

/// The qubit and result counts a module declares on its entry point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    pub required_qubits: u32,
    pub required_results: u32,
}

/// Validates the register layout and every qubit and bit reference of the circuit,
/// and computes the resources its entry point requires.
pub fn account(circuit: &NormalizedCircuit) -> Result<Resources, Error> {
    let required_results = check_registers(circuit)?;

    let mut max_qubit = None;
    for (position, op) in circuit.operations.iter().enumerate() {
        check_qubits(circuit, position, op)?;
        check_result(circuit, position, op)?;
        max_qubit = op.qubits().chain(max_qubit).max();
    }

    let required_qubits = max_qubit.map_or(circuit.num_qubits, |q| circuit.num_qubits.max(q + 1));
    let resources = Resources {
        required_qubits,
        required_results,
    };
    debug!("resources for `{}`: {resources:?}", circuit.name);
    Ok(resources)
}

/// Returns the total number of results across all registers.
fn check_registers(circuit: &NormalizedCircuit) -> Result<u32, Error> {
    let mut seen = FxHashSet::default();
    let mut expected = 0u32;
    for reg in &circuit.registers {
        let malformed = |issue| Error::MalformedRegisterLayout {
            register: reg.id.clone(),
            issue,
        };
        if !seen.insert(reg.id.as_str()) {
            return Err(malformed(LayoutIssue::Duplicate));
        }
        if reg.offset < expected {
            return Err(malformed(LayoutIssue::Overlap {
                offset: reg.offset,
                expected,
            }));
        }
        if reg.offset > expected {
            return Err(malformed(LayoutIssue::Gap {
                offset: reg.offset,
                expected,
            }));
        }
        expected = expected
            .checked_add(reg.size)
            .ok_or_else(|| malformed(LayoutIssue::TooLarge))?;
    }
    Ok(expected)
}

fn check_qubits(circuit: &NormalizedCircuit, position: usize, op: &Operation) -> Result<(), Error> {
    let mut used = FxHashSet::default();
    for qubit in op.qubits() {
        if qubit >= circuit.num_qubits {
            return Err(Error::InvalidReference {
                position,
                reference: Reference::Qubit {
                    qubit,
                    num_qubits: circuit.num_qubits,
                },
            });
        }
        if !used.insert(qubit) {
            return Err(Error::InvalidReference {
                position,
                reference: Reference::RepeatedQubit(qubit),
            });
        }
    }
    Ok(())
}

fn check_result(circuit: &NormalizedCircuit, position: usize, op: &Operation) -> Result<(), Error> {
    let invalid = |reference| Error::InvalidReference {
        position,
        reference,
    };
    match (op.kind.is_measurement(), &op.result) {
        (false, None) => Ok(()),
        (false, Some(_)) => Err(invalid(Reference::UnexpectedResult)),
        (true, None) => Err(invalid(Reference::MissingResult)),
        (true, Some(target)) => {
            let reg = circuit
                .register(&target.register)
                .ok_or_else(|| invalid(Reference::UnknownRegister(target.register.clone())))?;
            if target.bit >= reg.size {
                return Err(invalid(Reference::Bit {
                    register: reg.id.clone(),
                    bit: target.bit,
                    size: reg.size,
                }));
            }
            Ok(())
        }
    }
}
