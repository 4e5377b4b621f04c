// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! An in-memory LLVM module graph restricted to what QIR entry points need,
//! together with its textual (`.ll`) and LLVM bitcode renderings.
//!
//! Both renderings can be read back into a [`Module`], which allows callers
//! to check that the two forms describe the same program.

pub mod bitcode;
mod error;
pub mod model;
pub mod parse;
pub mod text;

#[cfg(test)]
mod test_utils;

pub use error::Error;
pub use model::{
    Attribute, AttributeGroup, Block, Declaration, FlagValue, Function, Instruction, Module,
    ModuleFlag, Operand, Ty,
};
pub use text::ToQir;
