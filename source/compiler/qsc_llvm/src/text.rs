// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


use crate::model::{
    Attribute, AttributeGroup, Block, Declaration, FlagValue, Function, Instruction, Module,
    ModuleFlag, Operand, Ty,
};
use std::fmt::Write;

/// A trait for converting a type into QIR of type `T`.
/// This can be used to generate QIR strings or other representations.
pub trait ToQir<T> {
    fn to_qir(&self, module: &Module) -> T;
}

impl ToQir<String> for Ty {
    fn to_qir(&self, _module: &Module) -> String {
        self.to_string()
    }
}

impl ToQir<String> for Option<Ty> {
    fn to_qir(&self, module: &Module) -> String {
        match self {
            Some(ty) => ToQir::<String>::to_qir(ty, module),
            None => "void".to_string(),
        }
    }
}

impl ToQir<String> for Operand {
    fn to_qir(&self, _module: &Module) -> String {
        match self {
            Operand::Bool(b) => format!("i1 {b}"),
            Operand::Int(i) => format!("i64 {i}"),
            Operand::Double(d) => format!("double {}", double_literal(*d)),
            Operand::NullPtr => "ptr null".to_string(),
            Operand::IntToPtr(p) => format!("ptr inttoptr (i64 {p} to ptr)"),
        }
    }
}

/// Formats a double constant the way it appears in an instruction operand.
#[must_use]
pub fn double_literal(d: f64) -> String {
    if (d.floor() - d.ceil()).abs() < f64::EPSILON {
        // The value is a whole number, which requires at least one decimal point
        // to differentiate it from an integer value.
        format!("{d:.1}")
    } else {
        format!("{d}")
    }
}

impl ToQir<String> for Instruction {
    fn to_qir(&self, module: &Module) -> String {
        match self {
            Instruction::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|arg| ToQir::<String>::to_qir(arg, module))
                    .collect::<Vec<_>>()
                    .join(", ");
                let ret = module.declaration(callee).and_then(|decl| decl.ret);
                format!(
                    "  call {} @{callee}({args})",
                    ToQir::<String>::to_qir(&ret, module)
                )
            }
            Instruction::Ret => "  ret void".to_string(),
        }
    }
}

impl ToQir<String> for Block {
    fn to_qir(&self, module: &Module) -> String {
        let mut body = format!("{}:", self.label);
        for instr in &self.instructions {
            body.push('\n');
            body.push_str(&ToQir::<String>::to_qir(instr, module));
        }
        body
    }
}

impl ToQir<String> for Declaration {
    fn to_qir(&self, module: &Module) -> String {
        let params = self
            .params
            .iter()
            .map(|ty| ToQir::<String>::to_qir(ty, module))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "declare {} @{}({params}){}",
            ToQir::<String>::to_qir(&self.ret, module),
            self.name,
            attrs_suffix(self.attrs)
        )
    }
}

impl ToQir<String> for Function {
    fn to_qir(&self, module: &Module) -> String {
        let blocks = self
            .blocks
            .iter()
            .map(|block| ToQir::<String>::to_qir(block, module))
            .collect::<Vec<_>>()
            .join("\n\n");
        format!(
            "define {} @{}(){} {{\n{blocks}\n}}",
            ToQir::<String>::to_qir(&self.ret, module),
            self.name,
            attrs_suffix(self.attrs)
        )
    }
}

fn attrs_suffix(attrs: Option<u32>) -> String {
    attrs.map(|id| format!(" #{id}")).unwrap_or_default()
}

impl ToQir<String> for Attribute {
    fn to_qir(&self, _module: &Module) -> String {
        match self {
            Attribute::Flag(key) => format!("\"{key}\""),
            Attribute::KeyValue(key, value) => format!("\"{key}\"=\"{value}\""),
        }
    }
}

impl ToQir<String> for AttributeGroup {
    fn to_qir(&self, module: &Module) -> String {
        let attrs = self
            .attrs
            .iter()
            .map(|attr| ToQir::<String>::to_qir(attr, module))
            .collect::<Vec<_>>()
            .join(" ");
        format!("attributes #{} = {{ {attrs} }}", self.id)
    }
}

impl ToQir<String> for ModuleFlag {
    fn to_qir(&self, _module: &Module) -> String {
        let value = match self.value {
            FlagValue::I32(v) => format!("i32 {v}"),
            FlagValue::Bool(b) => format!("i1 {b}"),
        };
        format!("!{{i32 {}, !\"{}\", {value}}}", self.behavior, self.key)
    }
}

impl ToQir<String> for Module {
    fn to_qir(&self, _module: &Module) -> String {
        let mut out = String::new();
        writeln!(out, "; ModuleID = '{}'", self.source_name)
            .expect("writing to string should succeed");
        writeln!(out, "source_filename = \"{}\"", self.source_name)
            .expect("writing to string should succeed");

        for decl in &self.declarations {
            write!(out, "\n{}\n", ToQir::<String>::to_qir(decl, self))
                .expect("writing to string should succeed");
        }
        for func in &self.functions {
            write!(out, "\n{}\n", ToQir::<String>::to_qir(func, self))
                .expect("writing to string should succeed");
        }

        if !self.attribute_groups.is_empty() {
            out.push('\n');
            for group in &self.attribute_groups {
                writeln!(out, "{}", ToQir::<String>::to_qir(group, self))
                    .expect("writing to string should succeed");
            }
        }

        if !self.flags.is_empty() {
            let refs = (0..self.flags.len())
                .map(|i| format!("!{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(out, "\n!llvm.module.flags = !{{{refs}}}\n\n")
                .expect("writing to string should succeed");
            for (i, flag) in self.flags.iter().enumerate() {
                writeln!(out, "!{i} = {}", ToQir::<String>::to_qir(flag, self))
                    .expect("writing to string should succeed");
            }
        }
        out
    }
}

/// Renders the module as LLVM textual IR.
#[must_use]
pub fn write_module(module: &Module) -> String {
    ToQir::<String>::to_qir(module, module)
}
