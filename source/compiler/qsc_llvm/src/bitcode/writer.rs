// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{
    ATTR_STRING, ATTR_STRING_WITH_VALUE, CALL_EXPLICIT_TYPE, CAST_INTTOPTR, Constant,
    FUNCTION_INDEX, MAGIC, MODULE_FLAGS, MODULE_VERSION, PRODUCER, bitstream::BitWriter, block,
    code, encode_signed,
};
use crate::model::{Attribute, FlagValue, Function, Instruction, Module, Operand, Ty};
use rustc_hash::{FxHashMap, FxHashSet};

pub(super) fn write(module: &Module) -> Vec<u8> {
    let layout = Layout::new(module);
    let mut w = BitWriter::new();
    w.magic(MAGIC);

    w.enter_block(block::IDENTIFICATION, 5);
    w.string_record(code::IDENTIFICATION_STRING, &[], PRODUCER);
    w.record(code::IDENTIFICATION_EPOCH, &[0]);
    w.exit_block();

    w.enter_block(block::MODULE, 3);
    w.record(code::MODULE_VERSION, &[MODULE_VERSION]);
    layout.write_attributes(&mut w);
    layout.write_types(&mut w);
    w.string_record(code::MODULE_SOURCE_FILENAME, &[], &module.source_name);
    layout.write_function_records(&mut w);
    layout.write_constants(&mut w);
    layout.write_metadata(&mut w);
    for func in &module.functions {
        layout.write_body(&mut w, func);
    }
    w.exit_block();

    w.enter_block(block::STRTAB, 3);
    let abbrev = w.define_blob_abbrev(code::STRTAB_BLOB);
    w.blob_record(abbrev, &layout.strtab);
    w.exit_block();

    w.finish()
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum TypeKey {
    Void,
    Int(u64),
    Double,
    Ptr,
    Function { ret: Option<Ty>, params: Vec<Ty> },
}

impl From<Ty> for TypeKey {
    fn from(ty: Ty) -> Self {
        match ty {
            Ty::I1 => Self::Int(1),
            Ty::I64 => Self::Int(64),
            Ty::Double => Self::Double,
            Ty::Ptr => Self::Ptr,
        }
    }
}

impl Constant {
    fn of(operand: Operand) -> Self {
        match operand {
            Operand::Bool(b) => Self::bool(b),
            Operand::Int(value) => Self::Int { width: 64, value },
            Operand::Double(d) => Self::Double(d.to_bits()),
            Operand::NullPtr => Self::Null,
            Operand::IntToPtr(p) => Self::IntToPtr(p),
        }
    }

    /// An `i1` holds its sign-extended value, so `true` is `-1`.
    fn bool(b: bool) -> Self {
        Self::Int {
            width: 1,
            value: -i64::from(b),
        }
    }

    fn i32(value: i64) -> Self {
        Self::Int { width: 32, value }
    }

    fn ty(self) -> TypeKey {
        match self {
            Self::Int { width, .. } => TypeKey::Int(width),
            Self::Double(_) => TypeKey::Double,
            Self::Null | Self::IntToPtr(_) => TypeKey::Ptr,
        }
    }

    /// Constants are grouped by type, with the integers `inttoptr` refers to first.
    fn rank(self) -> (u8, u64) {
        match self {
            Self::Int { width, .. } => (0, width),
            Self::Double(_) => (1, 0),
            Self::Null | Self::IntToPtr(_) => (2, 0),
        }
    }
}

fn pointer_target(p: u64) -> Constant {
    Constant::Int {
        width: 64,
        value: i64::from_le_bytes(p.to_le_bytes()),
    }
}

struct FunctionEntry<'a> {
    name: &'a str,
    ty: u64,
    returns_value: bool,
    is_proto: bool,
    attrs: Option<u32>,
    strtab_offset: u64,
}

/// Numbering of everything the records refer to by index.
struct Layout<'a> {
    module: &'a Module,
    types: Vec<TypeKey>,
    type_ids: FxHashMap<TypeKey, u64>,
    functions: Vec<FunctionEntry<'a>>,
    function_ids: FxHashMap<&'a str, usize>,
    constants: Vec<Constant>,
    constant_ids: FxHashMap<Constant, u64>,
    strtab: Vec<u8>,
}

impl<'a> Layout<'a> {
    fn new(module: &'a Module) -> Self {
        let mut layout = Self {
            module,
            types: Vec::new(),
            type_ids: FxHashMap::default(),
            functions: Vec::new(),
            function_ids: FxHashMap::default(),
            constants: Vec::new(),
            constant_ids: FxHashMap::default(),
            strtab: Vec::new(),
        };
        for key in [
            TypeKey::Void,
            TypeKey::Int(1),
            TypeKey::Int(32),
            TypeKey::Int(64),
            TypeKey::Double,
            TypeKey::Ptr,
        ] {
            layout.intern_type(key);
        }

        for decl in &module.declarations {
            let ty = layout.intern_type(TypeKey::Function {
                ret: decl.ret,
                params: decl.params.clone(),
            });
            layout.add_function(&decl.name, ty, decl.ret.is_some(), true, decl.attrs);
        }
        for func in &module.functions {
            let ty = layout.intern_type(TypeKey::Function {
                ret: func.ret,
                params: Vec::new(),
            });
            layout.add_function(&func.name, ty, func.ret.is_some(), false, func.attrs);
        }

        let mut constants = Vec::new();
        let mut seen = FxHashSet::default();
        let mut add = |constant: Constant| {
            if seen.insert(constant) {
                constants.push(constant);
            }
        };
        for flag in &module.flags {
            add(Constant::i32(flag.behavior.into()));
            add(flag_constant(flag.value));
        }
        for (callee, args) in calls(module) {
            for arg in args {
                if let Operand::IntToPtr(p) = arg {
                    add(pointer_target(*p));
                }
                add(Constant::of(*arg));
            }
            if !layout.function_ids.contains_key(callee.as_str()) {
                layout.intern_type(TypeKey::Function {
                    ret: None,
                    params: args.iter().map(Operand::ty).collect(),
                });
            }
        }
        constants.sort_by_key(|constant| constant.rank());

        let first = layout.functions.len() as u64;
        for (constant, id) in constants.iter().zip(first..) {
            layout.constant_ids.insert(*constant, id);
        }
        layout.constants = constants;
        layout
    }

    fn intern_type(&mut self, key: TypeKey) -> u64 {
        if let Some(id) = self.type_ids.get(&key) {
            return *id;
        }
        let id = self.types.len() as u64;
        self.types.push(key.clone());
        self.type_ids.insert(key, id);
        id
    }

    fn add_function(
        &mut self,
        name: &'a str,
        ty: u64,
        returns_value: bool,
        is_proto: bool,
        attrs: Option<u32>,
    ) {
        let index = self.functions.len();
        self.function_ids.entry(name).or_insert(index);
        let strtab_offset = self.strtab.len() as u64;
        self.strtab.extend_from_slice(name.as_bytes());
        self.functions.push(FunctionEntry {
            name,
            ty,
            returns_value,
            is_proto,
            attrs,
            strtab_offset,
        });
    }

    fn type_id(&self, key: &TypeKey) -> u64 {
        self.type_ids[key]
    }

    fn constant_id(&self, constant: Constant) -> u64 {
        self.constant_ids[&constant]
    }

    fn value_count(&self) -> u64 {
        (self.functions.len() + self.constants.len()) as u64
    }

    /// The attribute list index of a function: one list per group, 1-based, 0 for none.
    fn attribute_list(&self, attrs: Option<u32>) -> u64 {
        attrs
            .and_then(|id| {
                self.module
                    .attribute_groups
                    .iter()
                    .position(|group| group.id == id)
            })
            .map_or(0, |index| index as u64 + 1)
    }

    fn write_attributes(&self, w: &mut BitWriter) {
        let groups = &self.module.attribute_groups;
        if groups.is_empty() {
            return;
        }

        w.enter_block(block::PARAMATTR_GROUP, 3);
        for group in groups {
            let mut ops = vec![u64::from(group.id) + 1, FUNCTION_INDEX];
            for attr in &group.attrs {
                match attr {
                    Attribute::Flag(key) => {
                        ops.push(ATTR_STRING);
                        push_c_string(&mut ops, key);
                    }
                    Attribute::KeyValue(key, value) => {
                        ops.push(ATTR_STRING_WITH_VALUE);
                        push_c_string(&mut ops, key);
                        push_c_string(&mut ops, value);
                    }
                }
            }
            w.record(code::PARAMATTR_GROUP_ENTRY, &ops);
        }
        w.exit_block();

        w.enter_block(block::PARAMATTR, 3);
        for group in groups {
            w.record(code::PARAMATTR_ENTRY, &[u64::from(group.id) + 1]);
        }
        w.exit_block();
    }

    fn write_types(&self, w: &mut BitWriter) {
        w.enter_block(block::TYPE, 4);
        w.record(code::TYPE_NUMENTRY, &[self.types.len() as u64]);
        for ty in &self.types {
            match ty {
                TypeKey::Void => w.record(code::TYPE_VOID, &[]),
                TypeKey::Int(width) => w.record(code::TYPE_INTEGER, &[*width]),
                TypeKey::Double => w.record(code::TYPE_DOUBLE, &[]),
                TypeKey::Ptr => w.record(code::TYPE_OPAQUE_POINTER, &[0]),
                TypeKey::Function { ret, params } => {
                    let ret = ret.map_or(TypeKey::Void, TypeKey::from);
                    let mut ops = vec![0, self.type_id(&ret)];
                    ops.extend(params.iter().map(|ty| self.type_id(&TypeKey::from(*ty))));
                    w.record(code::TYPE_FUNCTION, &ops);
                }
            }
        }
        w.exit_block();
    }

    fn write_function_records(&self, w: &mut BitWriter) {
        for func in &self.functions {
            // [strtab offset, strtab size, type, callingconv, isproto, linkage, paramattr,
            //  alignment, section, visibility, gc, unnamed_addr, prologuedata,
            //  dllstorageclass, comdat, prefixdata, personalityfn, preemption, addrspace]
            let mut ops = vec![
                func.strtab_offset,
                func.name.len() as u64,
                func.ty,
                0,
                u64::from(func.is_proto),
                0,
                self.attribute_list(func.attrs),
            ];
            ops.resize(19, 0);
            w.record(code::MODULE_FUNCTION, &ops);
        }
    }

    fn write_constants(&self, w: &mut BitWriter) {
        if self.constants.is_empty() {
            return;
        }
        w.enter_block(block::CONSTANTS, 4);
        let mut current = None;
        for constant in &self.constants {
            let ty = self.type_id(&constant.ty());
            if current != Some(ty) {
                w.record(code::CST_SETTYPE, &[ty]);
                current = Some(ty);
            }
            match *constant {
                Constant::Int { value, .. } => w.record(code::CST_INTEGER, &[encode_signed(value)]),
                Constant::Double(bits) => w.record(code::CST_FLOAT, &[bits]),
                Constant::Null => w.record(code::CST_NULL, &[]),
                Constant::IntToPtr(p) => w.record(
                    code::CST_CE_CAST,
                    &[
                        CAST_INTTOPTR,
                        self.type_id(&TypeKey::Int(64)),
                        self.constant_id(pointer_target(p)),
                    ],
                ),
            }
        }
        w.exit_block();
    }

    /// Writes `!llvm.module.flags`. Strings come first, then constant values, then the
    /// flag tuples, all sharing one metadata numbering.
    fn write_metadata(&self, w: &mut BitWriter) {
        let flags = &self.module.flags;
        if flags.is_empty() {
            return;
        }
        w.enter_block(block::METADATA, 3);
        let mut next = 0u64;

        let mut strings = FxHashMap::default();
        for flag in flags {
            strings.entry(flag.key.as_str()).or_insert_with(|| {
                w.string_record(code::METADATA_STRING_OLD, &[], &flag.key);
                next += 1;
                next - 1
            });
        }

        let mut values = FxHashMap::default();
        for flag in flags {
            for constant in [
                Constant::i32(flag.behavior.into()),
                flag_constant(flag.value),
            ] {
                values.entry(constant).or_insert_with(|| {
                    w.record(
                        code::METADATA_VALUE,
                        &[
                            self.type_id(&constant.ty()),
                            self.constant_id(constant),
                        ],
                    );
                    next += 1;
                    next - 1
                });
            }
        }

        let mut nodes = Vec::with_capacity(flags.len());
        for flag in flags {
            let behavior = values[&Constant::i32(flag.behavior.into())];
            let key = strings[flag.key.as_str()];
            let value = values[&flag_constant(flag.value)];
            w.record(code::METADATA_NODE, &[behavior + 1, key + 1, value + 1]);
            nodes.push(next);
            next += 1;
        }
        w.string_record(code::METADATA_NAME, &[], MODULE_FLAGS);
        w.record(code::METADATA_NAMED_NODE, &nodes);
        w.exit_block();
    }

    fn write_body(&self, w: &mut BitWriter, func: &Function) {
        w.enter_block(block::FUNCTION, 4);
        w.record(code::FUNC_DECLAREBLOCKS, &[func.blocks.len() as u64]);

        // Only calls with a result take a value number.
        let mut inst_id = self.value_count();
        for instr in func.blocks.iter().flat_map(|block| &block.instructions) {
            match instr {
                Instruction::Call { callee, args } => {
                    let callee = self.function_ids.get(callee.as_str()).copied();
                    let (fn_ty, callee_rel) = match callee {
                        Some(index) => (self.functions[index].ty, inst_id - index as u64),
                        // An undeclared callee refers to the call's own number, which
                        // the reader reports.
                        None => (
                            self.type_id(&TypeKey::Function {
                                ret: None,
                                params: args.iter().map(Operand::ty).collect(),
                            }),
                            0,
                        ),
                    };
                    let mut ops = vec![0, CALL_EXPLICIT_TYPE, fn_ty, callee_rel];
                    ops.extend(
                        args.iter()
                            .map(|arg| inst_id - self.constant_id(Constant::of(*arg))),
                    );
                    w.record(code::FUNC_INST_CALL, &ops);
                    if callee.is_some_and(|index| self.functions[index].returns_value) {
                        inst_id += 1;
                    }
                }
                Instruction::Ret => w.record(code::FUNC_INST_RET, &[]),
            }
        }

        if func.blocks.iter().any(|block| !block.label.is_empty()) {
            w.enter_block(block::VALUE_SYMTAB, 4);
            for (index, block) in (0u64..).zip(&func.blocks) {
                if !block.label.is_empty() {
                    w.string_record(code::VST_BBENTRY, &[index], &block.label);
                }
            }
            w.exit_block();
        }
        w.exit_block();
    }
}

fn calls(module: &Module) -> impl Iterator<Item = (&String, &Vec<Operand>)> {
    module
        .functions
        .iter()
        .flat_map(|func| &func.blocks)
        .flat_map(|block| &block.instructions)
        .filter_map(|instr| match instr {
            Instruction::Call { callee, args } => Some((callee, args)),
            Instruction::Ret => None,
        })
}

fn flag_constant(value: FlagValue) -> Constant {
    match value {
        FlagValue::I32(v) => Constant::i32(v.into()),
        FlagValue::Bool(b) => Constant::bool(b),
    }
}

fn push_c_string(ops: &mut Vec<u64>, s: &str) {
    ops.extend(s.bytes().map(u64::from));
    ops.push(0);
}
