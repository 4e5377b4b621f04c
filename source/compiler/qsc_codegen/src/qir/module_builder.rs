// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


use super::{catalog, catalog::Intrinsic, resources::Resources};
use log::trace;
use qsc_data_structures::{attrs::Attributes, target::Profile};
use qsc_llvm::{
    Attribute, AttributeGroup, Block, Declaration, FlagValue, Function, Instruction, Module,
    ModuleFlag, Operand,
};
use rustc_hash::FxHashMap;

/// Assembles the single-block entry point of a QIR module.
///
/// The builder starts with the runtime initialization call already in place.
/// Each intrinsic is declared the first time it is called, so declarations come
/// out in first-use order. [`ModuleBuilder::finish`] consumes the builder.
pub struct ModuleBuilder {
    source_name: String,
    entry_point: String,
    declarations: Vec<Declaration>,
    declared: FxHashMap<&'static str, usize>,
    instructions: Vec<Instruction>,
}

impl ModuleBuilder {
    #[must_use]
    pub fn new(source_name: impl Into<String>, entry_point: impl Into<String>) -> Self {
        let mut builder = Self {
            source_name: source_name.into(),
            entry_point: entry_point.into(),
            declarations: Vec::new(),
            declared: FxHashMap::default(),
            instructions: Vec::new(),
        };
        builder.call(&catalog::INITIALIZE, vec![Operand::NullPtr]);
        builder
    }

    /// Appends a call to `intrinsic`, declaring it if this is its first use.
    pub fn call(&mut self, intrinsic: &'static Intrinsic, args: Vec<Operand>) {
        self.declare(intrinsic);
        self.instructions.push(Instruction::Call {
            callee: intrinsic.name.to_string(),
            args,
        });
    }

    fn declare(&mut self, intrinsic: &'static Intrinsic) {
        if self.declared.contains_key(intrinsic.name) {
            return;
        }
        trace!("declaring @{}", intrinsic.name);
        self.declared.insert(intrinsic.name, self.declarations.len());
        self.declarations.push(Declaration {
            name: intrinsic.name.to_string(),
            params: intrinsic.params.to_vec(),
            ret: intrinsic.ret,
            attrs: intrinsic.attrs.group_id(),
        });
    }

    /// Number of instructions appended so far, the initialization call included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Terminates the entry block and attaches the entry point attributes and module flags.
    #[must_use]
    pub fn finish(self, resources: Resources, profile: Profile) -> Module {
        let mut instructions = self.instructions;
        instructions.push(Instruction::Ret);

        let mut attribute_groups = vec![entry_point_group(resources, profile)];
        let irreversible = Attributes::Irreversible
            .group_id()
            .filter(|id| self.declarations.iter().any(|decl| decl.attrs == Some(*id)));
        if let Some(id) = irreversible {
            attribute_groups.push(AttributeGroup {
                id,
                attrs: vec![Attribute::Flag("irreversible".to_string())],
            });
        }

        Module {
            source_name: self.source_name,
            declarations: self.declarations,
            functions: vec![Function {
                name: self.entry_point,
                ret: None,
                attrs: Attributes::EntryPoint.group_id(),
                blocks: vec![Block {
                    label: "entry".to_string(),
                    instructions,
                }],
            }],
            attribute_groups,
            flags: module_flags(),
        }
    }
}

fn entry_point_group(resources: Resources, profile: Profile) -> AttributeGroup {
    let key_value = |key: &str, value: String| Attribute::KeyValue(key.to_string(), value);
    AttributeGroup {
        id: Attributes::EntryPoint.group_id().unwrap_or_default(),
        attrs: vec![
            Attribute::Flag("entry_point".to_string()),
            Attribute::Flag("output_labeling_schema".to_string()),
            key_value("qir_profiles", profile.tag().to_string()),
            key_value("requiredQubits", resources.required_qubits.to_string()),
            key_value("requiredResults", resources.required_results.to_string()),
        ],
    }
}

fn module_flags() -> Vec<ModuleFlag> {
    let flag = |behavior, key: &str, value| ModuleFlag {
        behavior,
        key: key.to_string(),
        value,
    };
    vec![
        flag(1, "qir_major_version", FlagValue::I32(1)),
        flag(7, "qir_minor_version", FlagValue::I32(0)),
        flag(1, "dynamic_qubit_management", FlagValue::Bool(false)),
        flag(1, "dynamic_result_management", FlagValue::Bool(false)),
    ]
}
