// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![no_main]

#[cfg(feature = "do_fuzz")]
use libfuzzer_sys::fuzz_target;

fn decode(data: &[u8]) {
    if let Ok(module) = qsc_llvm::bitcode::read_module(data) {
        let encoded = qsc_llvm::bitcode::write_module(&module);
        let decoded =
            qsc_llvm::bitcode::read_module(&encoded).expect("encoded module should decode");
        assert_eq!(qsc_llvm::bitcode::write_module(&decoded), encoded);
    }
}

#[cfg(feature = "do_fuzz")]
fuzz_target!(|data: &[u8]| {
    decode(data);
});

#[cfg(not(feature = "do_fuzz"))]
#[unsafe(no_mangle)]
pub extern "C" fn main() {
    decode(&[]);
}
