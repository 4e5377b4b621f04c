// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::model::{
    Attribute, AttributeGroup, Block, Declaration, FlagValue, Function, Instruction, Module,
    ModuleFlag, Operand, Ty,
};

/// A Bell-pair module: `h`, `cx`, two measurements and output recording for a 2-bit register.
pub(crate) fn bell_module() -> Module {
    let call = |callee: &str, args: Vec<Operand>| Instruction::Call {
        callee: callee.to_string(),
        args,
    };
    Module {
        source_name: "bell".to_string(),
        declarations: vec![
            decl("__quantum__rt__initialize", &[Ty::Ptr], None),
            decl("__quantum__qis__h__body", &[Ty::Ptr], None),
            decl("__quantum__qis__cx__body", &[Ty::Ptr, Ty::Ptr], None),
            decl("__quantum__qis__mz__body", &[Ty::Ptr, Ty::Ptr], Some(1)),
            decl("__quantum__rt__array_record_output", &[Ty::I64, Ty::Ptr], None),
            decl("__quantum__rt__result_record_output", &[Ty::Ptr, Ty::Ptr], None),
        ],
        functions: vec![Function {
            name: "bell".to_string(),
            ret: None,
            attrs: Some(0),
            blocks: vec![Block {
                label: "entry".to_string(),
                instructions: vec![
                    call("__quantum__rt__initialize", vec![Operand::NullPtr]),
                    call("__quantum__qis__h__body", vec![Operand::IntToPtr(0)]),
                    call(
                        "__quantum__qis__cx__body",
                        vec![Operand::IntToPtr(0), Operand::IntToPtr(1)],
                    ),
                    call(
                        "__quantum__qis__mz__body",
                        vec![Operand::IntToPtr(0), Operand::IntToPtr(0)],
                    ),
                    call(
                        "__quantum__qis__mz__body",
                        vec![Operand::IntToPtr(1), Operand::IntToPtr(1)],
                    ),
                    call(
                        "__quantum__rt__array_record_output",
                        vec![Operand::Int(2), Operand::NullPtr],
                    ),
                    call(
                        "__quantum__rt__result_record_output",
                        vec![Operand::IntToPtr(0), Operand::NullPtr],
                    ),
                    call(
                        "__quantum__rt__result_record_output",
                        vec![Operand::IntToPtr(1), Operand::NullPtr],
                    ),
                    Instruction::Ret,
                ],
            }],
        }],
        attribute_groups: vec![
            AttributeGroup {
                id: 0,
                attrs: vec![
                    Attribute::Flag("entry_point".to_string()),
                    Attribute::Flag("output_labeling_schema".to_string()),
                    Attribute::KeyValue("qir_profiles".to_string(), "base_profile".to_string()),
                    Attribute::KeyValue("requiredQubits".to_string(), "2".to_string()),
                    Attribute::KeyValue("requiredResults".to_string(), "2".to_string()),
                ],
            },
            AttributeGroup {
                id: 1,
                attrs: vec![Attribute::Flag("irreversible".to_string())],
            },
        ],
        flags: vec![
            flag(1, "qir_major_version", FlagValue::I32(1)),
            flag(7, "qir_minor_version", FlagValue::I32(0)),
            flag(1, "dynamic_qubit_management", FlagValue::Bool(false)),
            flag(1, "dynamic_result_management", FlagValue::Bool(false)),
        ],
    }
}

fn decl(name: &str, params: &[Ty], attrs: Option<u32>) -> Declaration {
    Declaration {
        name: name.to_string(),
        params: params.to_vec(),
        ret: None,
        attrs,
    }
}

fn flag(behavior: u32, key: &str, value: FlagValue) -> ModuleFlag {
    ModuleFlag {
        behavior,
        key: key.to_string(),
        value,
    }
}
