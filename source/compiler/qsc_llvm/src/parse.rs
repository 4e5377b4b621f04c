// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Reads the textual form produced by [`crate::text`] back into a [`Module`].
//!
//! The grammar is line oriented and only covers the constructs QIR entry points
//! use: declarations, a defined function made of labeled blocks of `call` and
//! `ret` instructions, attribute groups and module flags.


use crate::{
    Error,
    model::{
        Attribute, AttributeGroup, Block, Declaration, FlagValue, Function, Instruction, Module,
        ModuleFlag, Operand, Ty,
    },
};
use winnow::{
    ModalResult, Parser,
    ascii::{dec_int, dec_uint, float},
    combinator::{alt, delimited, opt, preceded, separated},
    error::{ContextError, ErrMode},
    token::take_while,
};

/// Parses a module from its textual rendering.
pub fn parse_module(input: &str) -> Result<Module, Error> {
    let mut module = Module::default();
    let mut current: Option<Function> = None;

    for (index, raw_line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(func) = current.as_mut() {
            if line == "}" {
                if let Some(func) = current.take() {
                    module.functions.push(func);
                }
            } else if let Some(label) = line.strip_suffix(':') {
                func.blocks.push(Block {
                    label: run(ident, label, line_no)?.to_string(),
                    instructions: Vec::new(),
                });
            } else {
                let instr = run(instruction, line, line_no)?;
                let Some(block) = func.blocks.last_mut() else {
                    return Err(Error::Parse {
                        line: line_no,
                        message: "instruction outside of a basic block".to_string(),
                    });
                };
                block.instructions.push(instr);
            }
        } else if line.starts_with("source_filename") {
            module.source_name = run(source_filename, line, line_no)?.to_string();
        } else if line.starts_with("declare ") {
            module.declarations.push(run(declaration, line, line_no)?);
        } else if line.starts_with("define ") {
            current = Some(run(function_header, line, line_no)?);
        } else if line.starts_with("attributes ") {
            module.attribute_groups.push(run(attribute_group, line, line_no)?);
        } else if line.starts_with("!llvm.module.flags") {
            // The flag list is derived from the numbered flag entries.
        } else if line.starts_with('!') {
            module.flags.push(run(module_flag, line, line_no)?);
        } else {
            return Err(Error::Parse {
                line: line_no,
                message: format!("unrecognized line `{line}`"),
            });
        }
    }

    if current.is_some() {
        return Err(Error::Parse {
            line: input.lines().count(),
            message: "function body is not terminated".to_string(),
        });
    }
    Ok(module)
}

fn run<'i, O>(
    mut parser: impl Parser<&'i str, O, ErrMode<ContextError>>,
    line: &'i str,
    line_no: usize,
) -> Result<O, Error> {
    parser.parse(line).map_err(|e| Error::Parse {
        line: line_no,
        message: e.to_string(),
    })
}

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$')
    })
    .parse_next(input)
}

fn quoted<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    delimited("\"", take_while(0.., |c: char| c != '"'), "\"").parse_next(input)
}

fn ty(input: &mut &str) -> ModalResult<Ty> {
    alt((
        "i1".value(Ty::I1),
        "i64".value(Ty::I64),
        "double".value(Ty::Double),
        "ptr".value(Ty::Ptr),
    ))
    .parse_next(input)
}

fn ret_ty(input: &mut &str) -> ModalResult<Option<Ty>> {
    alt(("void".value(None), ty.map(Some))).parse_next(input)
}

fn boolean(input: &mut &str) -> ModalResult<bool> {
    alt(("true".value(true), "false".value(false))).parse_next(input)
}

fn attrs_ref(input: &mut &str) -> ModalResult<Option<u32>> {
    opt(preceded(" #", dec_uint)).parse_next(input)
}

fn operand(input: &mut &str) -> ModalResult<Operand> {
    alt((
        preceded("i1 ", boolean).map(Operand::Bool),
        preceded("i64 ", dec_int).map(Operand::Int),
        preceded("double ", float).map(Operand::Double),
        "ptr null".value(Operand::NullPtr),
        delimited("ptr inttoptr (i64 ", dec_uint, " to ptr)").map(Operand::IntToPtr),
    ))
    .parse_next(input)
}

fn operands(input: &mut &str) -> ModalResult<Vec<Operand>> {
    delimited("(", separated(0.., operand, ", "), ")").parse_next(input)
}

fn param_types(input: &mut &str) -> ModalResult<Vec<Ty>> {
    delimited("(", separated(0.., ty, ", "), ")").parse_next(input)
}

fn instruction(input: &mut &str) -> ModalResult<Instruction> {
    alt((
        "ret void".value(Instruction::Ret),
        ("call ", ret_ty, " @", ident, operands).map(|(_, _, _, callee, args)| {
            Instruction::Call {
                callee: callee.to_string(),
                args,
            }
        }),
    ))
    .parse_next(input)
}

fn source_filename<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    preceded("source_filename = ", quoted).parse_next(input)
}

fn declaration(input: &mut &str) -> ModalResult<Declaration> {
    ("declare ", ret_ty, " @", ident, param_types, attrs_ref)
        .map(|(_, ret, _, name, params, attrs)| Declaration {
            name: name.to_string(),
            params,
            ret,
            attrs,
        })
        .parse_next(input)
}

fn function_header(input: &mut &str) -> ModalResult<Function> {
    ("define ", ret_ty, " @", ident, "()", attrs_ref, " {")
        .map(|(_, ret, _, name, _, attrs, _)| Function {
            name: name.to_string(),
            ret,
            attrs,
            blocks: Vec::new(),
        })
        .parse_next(input)
}

fn attribute(input: &mut &str) -> ModalResult<Attribute> {
    (quoted, opt(preceded("=", quoted)))
        .map(|(key, value)| match value {
            Some(value) => Attribute::KeyValue(key.to_string(), value.to_string()),
            None => Attribute::Flag(key.to_string()),
        })
        .parse_next(input)
}

fn attributes(input: &mut &str) -> ModalResult<Vec<Attribute>> {
    separated(0.., attribute, " ").parse_next(input)
}

fn attribute_group(input: &mut &str) -> ModalResult<AttributeGroup> {
    ("attributes #", dec_uint, " = { ", attributes, " }")
        .map(|(_, id, _, attrs, _)| AttributeGroup { id, attrs })
        .parse_next(input)
}

fn flag_value(input: &mut &str) -> ModalResult<FlagValue> {
    alt((
        preceded("i32 ", dec_int).map(FlagValue::I32),
        preceded("i1 ", boolean).map(FlagValue::Bool),
    ))
    .parse_next(input)
}

fn module_flag(input: &mut &str) -> ModalResult<ModuleFlag> {
    (
        "!",
        dec_uint::<_, u32, _>,
        " = !{i32 ",
        dec_uint,
        ", !",
        quoted,
        ", ",
        flag_value,
        "}",
    )
        .map(|(_, _, _, behavior, _, key, _, value, _)| ModuleFlag {
            behavior,
            key: key.to_string(),
            value,
        })
        .parse_next(input)
}
