// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! LLVM bitcode for a [`Module`].
//!
//! The writer produces a self-contained bitcode file in the opaque pointer,
//! string table based layout (module version 2): an identification block, the
//! module block and a trailing string table holding the function names. Every
//! constant lives in the module level constant table, so function bodies only
//! hold calls and the terminator. The reader accepts the subset of bitcode the
//! writer produces.

mod bitstream;
mod reader;
mod writer;

#[cfg(test)]
mod tests;

use crate::{Error, model::Module};

const MAGIC: &[u8; 4] = b"BC\xC0\xDE";
const PRODUCER: &str = "qsc_llvm";
const MODULE_VERSION: u64 = 2;

mod block {
    pub const MODULE: u32 = 8;
    pub const PARAMATTR: u32 = 9;
    pub const PARAMATTR_GROUP: u32 = 10;
    pub const CONSTANTS: u32 = 11;
    pub const FUNCTION: u32 = 12;
    pub const IDENTIFICATION: u32 = 13;
    pub const VALUE_SYMTAB: u32 = 14;
    pub const METADATA: u32 = 15;
    pub const TYPE: u32 = 17;
    pub const STRTAB: u32 = 23;
}

mod code {
    pub const IDENTIFICATION_STRING: u32 = 1;
    pub const IDENTIFICATION_EPOCH: u32 = 2;

    pub const MODULE_VERSION: u32 = 1;
    pub const MODULE_FUNCTION: u32 = 8;
    pub const MODULE_SOURCE_FILENAME: u32 = 16;

    pub const PARAMATTR_ENTRY: u32 = 2;
    pub const PARAMATTR_GROUP_ENTRY: u32 = 3;

    pub const TYPE_NUMENTRY: u32 = 1;
    pub const TYPE_VOID: u32 = 2;
    pub const TYPE_DOUBLE: u32 = 4;
    pub const TYPE_INTEGER: u32 = 7;
    pub const TYPE_FUNCTION: u32 = 21;
    pub const TYPE_OPAQUE_POINTER: u32 = 25;

    pub const CST_SETTYPE: u32 = 1;
    pub const CST_NULL: u32 = 2;
    pub const CST_INTEGER: u32 = 4;
    pub const CST_FLOAT: u32 = 6;
    pub const CST_CE_CAST: u32 = 11;

    pub const METADATA_STRING_OLD: u32 = 1;
    pub const METADATA_VALUE: u32 = 2;
    pub const METADATA_NODE: u32 = 3;
    pub const METADATA_NAME: u32 = 4;
    pub const METADATA_NAMED_NODE: u32 = 10;

    pub const FUNC_DECLAREBLOCKS: u32 = 1;
    pub const FUNC_INST_RET: u32 = 10;
    pub const FUNC_INST_CALL: u32 = 34;

    pub const VST_BBENTRY: u32 = 2;

    pub const STRTAB_BLOB: u32 = 1;
}

/// `inttoptr` in `CE_CAST` records.
const CAST_INTTOPTR: u64 = 10;
/// Attribute group index of function attributes.
const FUNCTION_INDEX: u64 = 0xFFFF_FFFF;
const ATTR_STRING: u64 = 3;
const ATTR_STRING_WITH_VALUE: u64 = 4;
/// Bit of the call record's calling convention field marking an explicit function type.
const CALL_EXPLICIT_TYPE: u64 = 1 << 15;
const CALL_FMF: u64 = 1 << 17;
const MODULE_FLAGS: &str = "llvm.module.flags";

/// Serializes the module to LLVM bitcode. The output is fully determined by the module.
#[must_use]
pub fn write_module(module: &Module) -> Vec<u8> {
    writer::write(module)
}

/// Reads a module back from bitcode produced by [`write_module`].
pub fn read_module(bytes: &[u8]) -> Result<Module, Error> {
    reader::read(bytes)
}

/// Integers in bitcode records are sign-rotated: the sign moves to the lowest bit.
fn encode_signed(value: i64) -> u64 {
    if value >= 0 {
        value.unsigned_abs() << 1
    } else {
        (value.unsigned_abs() << 1) | 1
    }
}

fn decode_signed(value: u64) -> i64 {
    let magnitude = value >> 1;
    if value & 1 == 0 {
        i64::try_from(magnitude).unwrap_or_default()
    } else if magnitude == 0 {
        i64::MIN
    } else {
        -i64::try_from(magnitude).unwrap_or_default()
    }
}

/// A constant as stored in the module constant table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Constant {
    Int { width: u64, value: i64 },
    /// The bit pattern of a `double`.
    Double(u64),
    Null,
    IntToPtr(u64),
}
