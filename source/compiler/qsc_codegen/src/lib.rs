// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Code generation from normalized circuits to QIR.
//!
//! The entry points live in [`qir`]: a circuit is validated, lowered one
//! operation at a time into calls to QIS intrinsics, wrapped in a single
//! entry point function and rendered both as LLVM text and as LLVM bitcode.

pub mod qir;
