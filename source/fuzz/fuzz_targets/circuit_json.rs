// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![no_main]

#[cfg(feature = "do_fuzz")]
use libfuzzer_sys::fuzz_target;
use qsc_circuit::NormalizedCircuit;
use qsc_codegen::qir::{QirOptions, circuit_to_qir};

fn translate(data: &[u8]) {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(circuit) = NormalizedCircuit::from_json(json) {
        let _ = circuit_to_qir(&circuit, &QirOptions::default());
    }
}

#[cfg(feature = "do_fuzz")]
fuzz_target!(|data: &[u8]| {
    translate(data);
});

#[cfg(not(feature = "do_fuzz"))]
#[unsafe(no_mangle)]
pub extern "C" fn main() {
    translate(&[]);
}
