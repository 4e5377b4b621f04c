// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{decode_signed, encode_signed, read_module, write_module};
use crate::{
    Error,
    model::{FlagValue, Instruction, Module, Operand},
    test_utils::bell_module,
};

fn with_args(args: Vec<Operand>) -> Module {
    let mut module = bell_module();
    module.declarations[1].params = args.iter().map(Operand::ty).collect();
    module.functions[0].blocks[0].instructions[1] = Instruction::Call {
        callee: "__quantum__qis__h__body".to_string(),
        args,
    };
    module
}

fn args_after_read(module: &Module) -> Vec<Operand> {
    let read = read_module(&write_module(module)).expect("module should decode");
    let Instruction::Call { args, .. } = &read.functions[0].blocks[0].instructions[1] else {
        panic!("expected a call");
    };
    args.clone()
}

#[test]
fn output_starts_with_the_bitcode_magic_and_identification_block() {
    let bytes = write_module(&bell_module());
    // `ENTER_SUBBLOCK` of the identification block (13) with abbreviation width 5.
    assert_eq!(bytes[..6], *b"BC\xC0\xDE\x35\x14");
    assert_eq!(bytes.len() % 4, 0);
}

#[test]
fn function_names_live_in_the_string_table() {
    let bytes = write_module(&bell_module());
    let name = b"__quantum__qis__cx__body";
    assert!(bytes.windows(name.len()).any(|window| window == name));
}

#[test]
fn bitcode_reads_back_to_the_same_graph() {
    let module = bell_module();
    assert_eq!(read_module(&write_module(&module)), Ok(module));
}

#[test]
fn empty_module_reads_back() {
    let module = Module {
        source_name: "m".to_string(),
        ..Module::default()
    };
    assert_eq!(read_module(&write_module(&module)), Ok(module));
}

#[test]
fn encoding_is_deterministic() {
    let first = write_module(&bell_module());
    let second = write_module(&bell_module());
    assert_eq!(first, second);
}

#[test]
fn double_operands_keep_their_exact_bits() {
    let value = 0.5 * 1e-6;
    let args = args_after_read(&with_args(vec![Operand::Double(value), Operand::Double(-0.0)]));
    let [Operand::Double(d), Operand::Double(z)] = args[..] else {
        panic!("expected two double operands, got {args:?}");
    };
    assert_eq!(d.to_bits(), value.to_bits());
    assert_eq!(z.to_bits(), (-0.0f64).to_bits());
}

#[test]
fn integer_extremes_and_booleans_survive() {
    let args = vec![
        Operand::Int(i64::MIN),
        Operand::Int(-1),
        Operand::Int(i64::MAX),
        Operand::Bool(true),
        Operand::Bool(false),
        Operand::IntToPtr(u64::MAX),
    ];
    assert_eq!(args_after_read(&with_args(args.clone())), args);
}

#[test]
fn signed_integers_are_rotated() {
    assert_eq!(encode_signed(0), 0);
    assert_eq!(encode_signed(3), 6);
    assert_eq!(encode_signed(-3), 7);
    for value in [0, 1, -1, i64::MAX, i64::MIN, -i64::MAX] {
        assert_eq!(decode_signed(encode_signed(value)), value);
    }
}

#[test]
fn true_module_flags_read_back() {
    let mut module = bell_module();
    module.flags[2].value = FlagValue::Bool(true);
    let read = read_module(&write_module(&module)).expect("module should decode");
    assert_eq!(read.flags, module.flags);
}

#[test]
fn block_labels_read_back() {
    let mut module = bell_module();
    let ret = module.functions[0].blocks[0]
        .instructions
        .pop()
        .expect("entry block should not be empty");
    module.functions[0].blocks[0].instructions.push(Instruction::Ret);
    module.functions[0].blocks.push(crate::model::Block {
        label: "exit".to_string(),
        instructions: vec![ret],
    });
    assert_eq!(read_module(&write_module(&module)), Ok(module));
}

#[test]
fn bad_magic_is_rejected() {
    assert_eq!(read_module(b"QIRB\x01"), Err(Error::BadMagic));
    assert_eq!(read_module(b"BC"), Err(Error::BadMagic));
}

#[test]
fn magic_without_a_module_is_rejected() {
    assert!(matches!(
        read_module(b"BC\xC0\xDE"),
        Err(Error::InvalidModule(_))
    ));
}

#[test]
fn truncated_input_is_rejected() {
    let bytes = write_module(&bell_module());
    assert!(matches!(
        read_module(&bytes[..bytes.len() / 2]),
        Err(Error::UnexpectedEof(_))
    ));
    for len in [5, 9, 40, bytes.len() - 4, bytes.len() - 1] {
        assert!(
            read_module(&bytes[..len]).is_err(),
            "truncation at {len} should be reported"
        );
    }
}

#[test]
fn garbage_after_the_magic_is_rejected() {
    let mut bytes = b"BC\xC0\xDE".to_vec();
    bytes.extend_from_slice(&[0xFF; 12]);
    assert!(read_module(&bytes).is_err());
}

#[test]
fn call_to_undeclared_callee_is_reported() {
    let mut module = bell_module();
    module.functions[0].blocks[0].instructions[0] = Instruction::Call {
        callee: "__quantum__qis__missing__body".to_string(),
        args: Vec::new(),
    };
    assert!(matches!(
        read_module(&write_module(&module)),
        Err(Error::UnknownCallee(_))
    ));
}
