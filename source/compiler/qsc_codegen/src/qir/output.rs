// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


use super::{catalog, module_builder::ModuleBuilder};
use log::debug;
use qsc_circuit::NormalizedCircuit;
use qsc_llvm::Operand;

/// Appends the output recording calls for every classical register.
///
/// Each register contributes one array record sized to the register, followed by
/// one result record per bit in register order.
pub fn record_output(circuit: &NormalizedCircuit, builder: &mut ModuleBuilder) {
    for reg in &circuit.registers {
        debug!("recording register `{}` ({} results)", reg.id, reg.size);
        builder.call(
            &catalog::ARRAY_RECORD_OUTPUT,
            vec![Operand::Int(i64::from(reg.size)), Operand::NullPtr],
        );
        for bit in 0..reg.size {
            builder.call(
                &catalog::RESULT_RECORD_OUTPUT,
                vec![
                    Operand::IntToPtr(u64::from(reg.global_index(bit))),
                    Operand::NullPtr,
                ],
            );
        }
    }
}
