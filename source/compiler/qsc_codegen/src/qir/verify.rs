// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Checks run on a generated module before it is handed out.


use super::{catalog, error::Error, resources::Resources};
use log::debug;
use qsc_llvm::{AttributeGroup, Instruction, Module, bitcode, parse};
use rustc_hash::FxHashSet;

/// Checks the structural invariants of a generated entry point module.
pub fn verify_module(module: &Module, resources: Resources) -> Result<(), Error> {
    let malformed = |message: String| Err(Error::MalformedModule(message));

    let [func] = module.functions.as_slice() else {
        return malformed(format!(
            "expected exactly one defined function, found {}",
            module.functions.len()
        ));
    };
    let [block] = func.blocks.as_slice() else {
        return malformed(format!(
            "entry point `{}` must have exactly one block, found {}",
            func.name,
            func.blocks.len()
        ));
    };

    if block.instructions.first().and_then(Instruction::callee) != Some(catalog::INITIALIZE.name) {
        return malformed("entry block does not start with runtime initialization".to_string());
    }
    if !block.instructions.last().is_some_and(Instruction::is_terminator) {
        return malformed("entry block does not end with `ret`".to_string());
    }
    let terminators = block
        .instructions
        .iter()
        .filter(|instr| instr.is_terminator())
        .count();
    if terminators != 1 {
        return malformed(format!(
            "entry block has {terminators} terminators, expected 1"
        ));
    }

    let Some(group) = func.attrs.and_then(|id| module.attribute_group(id)) else {
        return malformed(format!("entry point `{}` has no attributes", func.name));
    };
    if !group.has_flag("entry_point") {
        return malformed("entry point attributes lack `entry_point`".to_string());
    }
    for (key, expected) in [
        ("requiredQubits", resources.required_qubits),
        ("requiredResults", resources.required_results),
    ] {
        let expected = expected.to_string();
        if group.value(key) != Some(expected.as_str()) {
            return malformed(format!(
                "attribute `{key}` is {:?}, expected \"{expected}\"",
                group.value(key)
            ));
        }
    }

    let mut names = FxHashSet::default();
    for decl in &module.declarations {
        if !names.insert(decl.name.as_str()) {
            return malformed(format!("`{}` is declared more than once", decl.name));
        }
    }

    for instr in &block.instructions {
        let Instruction::Call { callee, args } = instr else {
            continue;
        };
        let Some(decl) = module.declaration(callee) else {
            return malformed(format!("call to undeclared `{callee}`"));
        };
        let arg_tys = args.iter().map(qsc_llvm::Operand::ty);
        if args.len() != decl.params.len() || !arg_tys.eq(decl.params.iter().copied()) {
            return malformed(format!(
                "call to `{callee}` does not match its declared parameters"
            ));
        }
    }

    debug!("verified module `{}`", module.source_name);
    Ok(())
}

/// The parts of a module both renderings must agree on.
#[derive(Debug, PartialEq)]
struct Summary<'a> {
    declarations: usize,
    instructions: usize,
    attribute_groups: &'a [AttributeGroup],
}

impl<'a> Summary<'a> {
    fn of(module: &'a Module) -> Self {
        Self {
            declarations: module.declarations.len(),
            instructions: module.instruction_count(),
            attribute_groups: &module.attribute_groups,
        }
    }
}

/// Reads both renderings back and checks that they describe the module they were produced from.
pub fn check_parity(module: &Module, text: &str, bytes: &[u8]) -> Result<(), Error> {
    let from_text = parse::parse_module(text)
        .map_err(|e| Error::SerializationMismatch(format!("text rendering does not parse: {e}")))?;
    let from_bitcode = bitcode::read_module(bytes).map_err(|e| {
        Error::SerializationMismatch(format!("bitcode rendering does not decode: {e}"))
    })?;

    let expected = Summary::of(module);
    for (form, summary) in [
        ("text", Summary::of(&from_text)),
        ("bitcode", Summary::of(&from_bitcode)),
    ] {
        if summary.declarations != expected.declarations {
            return Err(Error::SerializationMismatch(format!(
                "{form} rendering has {} declarations, expected {}",
                summary.declarations, expected.declarations
            )));
        }
        if summary.instructions != expected.instructions {
            return Err(Error::SerializationMismatch(format!(
                "{form} rendering has {} instructions, expected {}",
                summary.instructions, expected.instructions
            )));
        }
        if summary.attribute_groups != expected.attribute_groups {
            return Err(Error::SerializationMismatch(format!(
                "{form} rendering has different attributes"
            )));
        }
    }
    debug!("text and bitcode renderings of `{}` agree", module.source_name);
    Ok(())
}
