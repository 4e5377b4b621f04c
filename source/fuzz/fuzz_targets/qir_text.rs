// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![no_main]

#[cfg(feature = "do_fuzz")]
use libfuzzer_sys::fuzz_target;

fn parse(data: &[u8]) {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = qsc_llvm::parse::parse_module(text);
    }
}

#[cfg(feature = "do_fuzz")]
fuzz_target!(|data: &[u8]| {
    parse(data);
});

#[cfg(not(feature = "do_fuzz"))]
#[unsafe(no_mangle)]
pub extern "C" fn main() {
    parse(&[]);
}
