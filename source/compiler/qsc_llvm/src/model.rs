// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


use std::fmt::{self, Display, Formatter};

/// A module containing external declarations and defined functions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Module {
    pub source_name: String,
    pub declarations: Vec<Declaration>,
    pub functions: Vec<Function>,
    pub attribute_groups: Vec<AttributeGroup>,
    pub flags: Vec<ModuleFlag>,
}

impl Module {
    #[must_use]
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|decl| decl.name == name)
    }

    #[must_use]
    pub fn attribute_group(&self, id: u32) -> Option<&AttributeGroup> {
        self.attribute_groups.iter().find(|group| group.id == id)
    }

    /// Returns the function whose attribute group carries the `entry_point` flag.
    #[must_use]
    pub fn entry_point(&self) -> Option<&Function> {
        self.functions.iter().find(|func| {
            func.attrs
                .and_then(|id| self.attribute_group(id))
                .is_some_and(|group| group.has_flag("entry_point"))
        })
    }

    /// Total number of instructions across all defined functions, terminators included.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.functions
            .iter()
            .flat_map(|func| &func.blocks)
            .map(|block| block.instructions.len())
            .sum()
    }
}

/// An external function declaration, such as a QIS or runtime intrinsic.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Declaration {
    pub name: String,
    pub params: Vec<Ty>,
    pub ret: Option<Ty>,
    pub attrs: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: String,
    pub ret: Option<Ty>,
    pub attrs: Option<u32>,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub label: String,
    pub instructions: Vec<Instruction>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Call { callee: String, args: Vec<Operand> },
    Ret,
}

impl Instruction {
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        matches!(self, Self::Ret)
    }

    #[must_use]
    pub fn callee(&self) -> Option<&str> {
        match self {
            Self::Call { callee, .. } => Some(callee),
            Self::Ret => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operand {
    Bool(bool),
    Int(i64),
    Double(f64),
    NullPtr,
    /// An integer constant cast to a pointer, the static form of qubit and result references.
    IntToPtr(u64),
}

impl Operand {
    #[must_use]
    pub fn ty(&self) -> Ty {
        match self {
            Self::Bool(_) => Ty::I1,
            Self::Int(_) => Ty::I64,
            Self::Double(_) => Ty::Double,
            Self::NullPtr | Self::IntToPtr(_) => Ty::Ptr,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    I1,
    I64,
    Double,
    Ptr,
}

impl Display for Ty {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::I1 => "i1",
            Self::I64 => "i64",
            Self::Double => "double",
            Self::Ptr => "ptr",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeGroup {
    pub id: u32,
    pub attrs: Vec<Attribute>,
}

impl AttributeGroup {
    #[must_use]
    pub fn has_flag(&self, key: &str) -> bool {
        self.attrs
            .iter()
            .any(|attr| matches!(attr, Attribute::Flag(flag) if flag == key))
    }

    /// Returns the value of a `"key"="value"` attribute.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find_map(|attr| match attr {
            Attribute::KeyValue(k, v) if k == key => Some(v.as_str()),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    Flag(String),
    KeyValue(String, String),
}

impl Attribute {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Flag(key) | Self::KeyValue(key, _) => key,
        }
    }
}

/// An entry of `!llvm.module.flags`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModuleFlag {
    pub behavior: u32,
    pub key: String,
    pub value: FlagValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlagValue {
    I32(i32),
    Bool(bool),
}
