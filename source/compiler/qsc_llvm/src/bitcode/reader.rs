// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{
    ATTR_STRING, ATTR_STRING_WITH_VALUE, CALL_EXPLICIT_TYPE, CALL_FMF, CAST_INTTOPTR, Constant,
    FUNCTION_INDEX, MAGIC, MODULE_FLAGS, MODULE_VERSION,
    bitstream::{BitReader, Block as BitBlock, Entry, Record},
    block, code, decode_signed,
};
use crate::{
    Error,
    model::{
        Attribute, AttributeGroup, Block, Declaration, FlagValue, Function, Instruction, Module,
        ModuleFlag, Operand, Ty,
    },
};
use rustc_hash::FxHashMap;

pub(super) fn read(bytes: &[u8]) -> Result<Module, Error> {
    let blocks = BitReader::new(bytes).read_stream(MAGIC)?;
    let module = blocks
        .iter()
        .find(|b| b.id == u64::from(block::MODULE))
        .ok_or_else(|| invalid("no module block"))?;
    let strtab = blocks
        .iter()
        .filter(|b| b.id == u64::from(block::STRTAB))
        .flat_map(BitBlock::records)
        .find(|r| r.code == u64::from(code::STRTAB_BLOB))
        .and_then(|r| r.blob.as_deref())
        .unwrap_or_default();

    let mut reader = ModuleReader {
        strtab,
        ..ModuleReader::default()
    };
    reader.read_module_block(module)?;
    reader.finish()
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidModule(message.into())
}

fn is(code: u64, expected: u32) -> bool {
    code == u64::from(expected)
}

fn string(bytes: &[u64]) -> Result<String, Error> {
    let bytes = bytes
        .iter()
        .map(|b| u8::try_from(*b))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid("string character out of range"))?;
    String::from_utf8(bytes).map_err(|_| invalid("string is not valid UTF-8"))
}

/// Splits a zero-terminated string off the front of `ops`.
fn c_string(ops: &[u64]) -> Result<(String, &[u64]), Error> {
    let end = ops
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| invalid("unterminated attribute string"))?;
    Ok((string(&ops[..end])?, &ops[end + 1..]))
}

fn index(value: u64) -> Result<usize, Error> {
    usize::try_from(value).map_err(|_| invalid(format!("index {value} out of range")))
}

#[derive(Clone, Debug, PartialEq)]
enum TypeEntry {
    Void,
    Int(u64),
    Double,
    Ptr,
    Function { ret: u64, params: Vec<u64> },
    Other,
}

#[derive(Clone, Copy, Debug)]
enum Value {
    Function(usize),
    Constant(Constant),
    Other,
}

struct FunctionRecord {
    name: String,
    ty: u64,
    is_proto: bool,
    attrs: Option<u32>,
}

enum Metadata {
    String(String),
    Value(Constant),
    Node(Vec<u64>),
}

#[derive(Default)]
struct ModuleReader<'a> {
    strtab: &'a [u8],
    source_name: String,
    types: Vec<TypeEntry>,
    groups: Vec<(u64, AttributeGroup)>,
    attribute_lists: Vec<Vec<u64>>,
    functions: Vec<FunctionRecord>,
    values: Vec<Value>,
    flags: Vec<ModuleFlag>,
    bodies: Vec<Vec<Block>>,
}

impl Constant {
    fn operand(self) -> Option<Operand> {
        match self {
            Self::Int { width: 1, value } => Some(Operand::Bool(value != 0)),
            Self::Int { width: 64, value } => Some(Operand::Int(value)),
            Self::Int { .. } => None,
            Self::Double(bits) => Some(Operand::Double(f64::from_bits(bits))),
            Self::Null => Some(Operand::NullPtr),
            Self::IntToPtr(p) => Some(Operand::IntToPtr(p)),
        }
    }
}

impl ModuleReader<'_> {
    fn read_module_block(&mut self, module: &BitBlock) -> Result<(), Error> {
        for entry in &module.entries {
            match entry {
                Entry::Record(record) => self.read_module_record(record)?,
                Entry::Block(inner) => match u32::try_from(inner.id).unwrap_or(u32::MAX) {
                    block::PARAMATTR_GROUP => self.read_attribute_groups(inner)?,
                    block::PARAMATTR => {
                        for record in inner.records() {
                            if is(record.code, code::PARAMATTR_ENTRY) {
                                self.attribute_lists.push(record.ops.clone());
                            }
                        }
                    }
                    block::TYPE => self.read_types(inner)?,
                    block::CONSTANTS => {
                        let mut values = std::mem::take(&mut self.values);
                        self.read_constants(inner, &mut values)?;
                        self.values = values;
                    }
                    block::METADATA => self.read_metadata(inner)?,
                    block::FUNCTION => {
                        let body = self.read_body(inner)?;
                        self.bodies.push(body);
                    }
                    _ => {}
                },
            }
        }
        Ok(())
    }

    fn read_module_record(&mut self, record: &Record) -> Result<(), Error> {
        if is(record.code, code::MODULE_VERSION) {
            let version = record.ops.first().copied().unwrap_or_default();
            if version != MODULE_VERSION {
                return Err(Error::UnsupportedVersion(version));
            }
        } else if is(record.code, code::MODULE_SOURCE_FILENAME) {
            self.source_name = string(&record.ops)?;
        } else if is(record.code, code::MODULE_FUNCTION) {
            self.read_function_record(&record.ops)?;
        }
        Ok(())
    }

    fn read_function_record(&mut self, ops: &[u64]) -> Result<(), Error> {
        let [offset, size, ty, _cc, is_proto, _linkage, paramattr, ..] = *ops else {
            return Err(invalid("function record is too short"));
        };
        let name = index(offset)
            .ok()
            .zip(index(size).ok())
            .and_then(|(offset, size)| self.strtab.get(offset..offset.checked_add(size)?))
            .ok_or_else(|| invalid("function name lies outside the string table"))?;
        let name = String::from_utf8(name.to_vec())
            .map_err(|_| invalid("function name is not valid UTF-8"))?;
        if !matches!(self.type_entry(ty)?, TypeEntry::Function { .. }) {
            return Err(invalid(format!("`{name}` does not have a function type")));
        }
        let attrs = self.attributes(paramattr)?;

        self.values.push(Value::Function(self.functions.len()));
        self.functions.push(FunctionRecord {
            name,
            ty,
            is_proto: is_proto != 0,
            attrs,
        });
        Ok(())
    }

    fn attributes(&self, list: u64) -> Result<Option<u32>, Error> {
        if list == 0 {
            return Ok(None);
        }
        let groups = self
            .attribute_lists
            .get(index(list - 1)?)
            .ok_or_else(|| invalid(format!("unknown attribute list {list}")))?;
        let [group] = groups.as_slice() else {
            return Err(invalid("functions must carry a single attribute group"));
        };
        self.groups
            .iter()
            .find(|(id, _)| id == group)
            .map(|(_, group)| Some(group.id))
            .ok_or_else(|| invalid(format!("unknown attribute group {group}")))
    }

    fn read_attribute_groups(&mut self, groups: &BitBlock) -> Result<(), Error> {
        for record in groups.records() {
            if !is(record.code, code::PARAMATTR_GROUP_ENTRY) {
                continue;
            }
            let [group_id, param_index, ref rest @ ..] = record.ops[..] else {
                return Err(invalid("attribute group record is too short"));
            };
            if param_index != FUNCTION_INDEX {
                return Err(Error::Unsupported(
                    "attributes on parameters or return values".to_string(),
                ));
            }
            let id = group_id
                .checked_sub(1)
                .and_then(|id| u32::try_from(id).ok())
                .ok_or_else(|| invalid(format!("attribute group id {group_id}")))?;

            let mut attrs = Vec::new();
            let mut rest = rest;
            while let [kind, tail @ ..] = rest {
                let (key, tail) = c_string(tail)?;
                rest = match *kind {
                    ATTR_STRING => {
                        attrs.push(Attribute::Flag(key));
                        tail
                    }
                    ATTR_STRING_WITH_VALUE => {
                        let (value, tail) = c_string(tail)?;
                        attrs.push(Attribute::KeyValue(key, value));
                        tail
                    }
                    kind => {
                        return Err(Error::Unsupported(format!("attribute kind {kind}")));
                    }
                };
            }
            self.groups.push((group_id, AttributeGroup { id, attrs }));
        }
        Ok(())
    }

    fn read_types(&mut self, types: &BitBlock) -> Result<(), Error> {
        for record in types.records() {
            let entry = match u32::try_from(record.code).unwrap_or(u32::MAX) {
                code::TYPE_NUMENTRY => continue,
                code::TYPE_VOID => TypeEntry::Void,
                code::TYPE_DOUBLE => TypeEntry::Double,
                code::TYPE_OPAQUE_POINTER => TypeEntry::Ptr,
                code::TYPE_INTEGER => TypeEntry::Int(
                    *record
                        .ops
                        .first()
                        .ok_or_else(|| invalid("integer type without a width"))?,
                ),
                code::TYPE_FUNCTION => match record.ops[..] {
                    [0, ret, ref params @ ..] => TypeEntry::Function {
                        ret,
                        params: params.to_vec(),
                    },
                    [_, ..] => return Err(Error::Unsupported("variadic functions".to_string())),
                    [] => return Err(invalid("function type record is empty")),
                },
                _ => TypeEntry::Other,
            };
            self.types.push(entry);
        }
        Ok(())
    }

    fn type_entry(&self, id: u64) -> Result<&TypeEntry, Error> {
        self.types
            .get(index(id)?)
            .ok_or_else(|| invalid(format!("unknown type {id}")))
    }

    fn ty(&self, id: u64) -> Result<Ty, Error> {
        match self.type_entry(id)? {
            TypeEntry::Int(1) => Ok(Ty::I1),
            TypeEntry::Int(64) => Ok(Ty::I64),
            TypeEntry::Double => Ok(Ty::Double),
            TypeEntry::Ptr => Ok(Ty::Ptr),
            _ => Err(Error::Unsupported(format!("type {id} in a signature"))),
        }
    }

    fn ret(&self, id: u64) -> Result<Option<Ty>, Error> {
        match self.type_entry(id)? {
            TypeEntry::Void => Ok(None),
            _ => self.ty(id).map(Some),
        }
    }

    fn signature(&self, id: u64) -> Result<(Option<Ty>, Vec<Ty>), Error> {
        let TypeEntry::Function { ret, params } = self.type_entry(id)? else {
            return Err(invalid(format!("type {id} is not a function type")));
        };
        let params = params
            .iter()
            .map(|param| self.ty(*param))
            .collect::<Result<_, _>>()?;
        Ok((self.ret(*ret)?, params))
    }

    fn read_constants(&self, constants: &BitBlock, values: &mut Vec<Value>) -> Result<(), Error> {
        let mut current = None;
        for record in constants.records() {
            if is(record.code, code::CST_SETTYPE) {
                let ty = record.ops.first().copied().unwrap_or(u64::MAX);
                current = Some(self.type_entry(ty)?.clone());
                continue;
            }
            let constant = match (
                u32::try_from(record.code).unwrap_or(u32::MAX),
                &current,
                &record.ops[..],
            ) {
                (code::CST_NULL, Some(TypeEntry::Ptr), _) => Constant::Null,
                (code::CST_INTEGER, Some(TypeEntry::Int(width)), [value]) => Constant::Int {
                    width: *width,
                    value: decode_signed(*value),
                },
                (code::CST_FLOAT, Some(TypeEntry::Double), [bits]) => Constant::Double(*bits),
                (code::CST_CE_CAST, Some(TypeEntry::Ptr), [CAST_INTTOPTR, _, operand]) => {
                    match values.get(index(*operand)?) {
                        Some(Value::Constant(Constant::Int { width: 64, value })) => {
                            Constant::IntToPtr(u64::from_le_bytes(value.to_le_bytes()))
                        }
                        _ => return Err(invalid("`inttoptr` of a value that is not an i64")),
                    }
                }
                (code, ..) => {
                    return Err(Error::Unsupported(format!("constant record {code}")));
                }
            };
            values.push(Value::Constant(constant));
        }
        Ok(())
    }

    fn read_metadata(&mut self, metadata: &BitBlock) -> Result<(), Error> {
        let mut nodes = Vec::new();
        let mut records = metadata.records();
        while let Some(record) = records.next() {
            match u32::try_from(record.code).unwrap_or(u32::MAX) {
                code::METADATA_STRING_OLD => nodes.push(Metadata::String(string(&record.ops)?)),
                code::METADATA_VALUE => {
                    let [_, value] = record.ops[..] else {
                        return Err(invalid("metadata value record"));
                    };
                    let Some(Value::Constant(constant)) = self.values.get(index(value)?) else {
                        return Err(invalid("metadata refers to a value that is not a constant"));
                    };
                    nodes.push(Metadata::Value(*constant));
                }
                code::METADATA_NODE => nodes.push(Metadata::Node(record.ops.clone())),
                code::METADATA_NAME => {
                    let name = string(&record.ops)?;
                    let named = records
                        .next()
                        .filter(|next| is(next.code, code::METADATA_NAMED_NODE))
                        .ok_or_else(|| invalid("metadata name without a named node"))?;
                    if name == MODULE_FLAGS {
                        for node in &named.ops {
                            let flag = module_flag(&nodes, *node)?;
                            self.flags.push(flag);
                        }
                    }
                }
                code => return Err(Error::Unsupported(format!("metadata record {code}"))),
            }
        }
        Ok(())
    }

    fn read_body(&self, body: &BitBlock) -> Result<Vec<Block>, Error> {
        let mut labels = FxHashMap::default();
        for symtab in body
            .blocks()
            .filter(|b| b.id == u64::from(block::VALUE_SYMTAB))
        {
            for record in symtab
                .records()
                .filter(|r| is(r.code, code::VST_BBENTRY))
            {
                if let [id, ref name @ ..] = record.ops[..] {
                    labels.insert(id, string(name)?);
                }
            }
        }

        let func = self
            .functions
            .iter()
            .filter(|func| !func.is_proto)
            .nth(self.bodies.len())
            .ok_or_else(|| invalid("function body without a defined function"))?;
        let (_, params) = self.signature(func.ty)?;
        let mut values = self.values.clone();
        values.extend(params.iter().map(|_| Value::Other));

        let mut blocks = Vec::new();
        let mut current = 0;
        for entry in &body.entries {
            let record = match entry {
                Entry::Record(record) => record,
                Entry::Block(inner) if inner.id == u64::from(block::CONSTANTS) => {
                    self.read_constants(inner, &mut values)?;
                    continue;
                }
                Entry::Block(_) => continue,
            };
            let instruction = match u32::try_from(record.code).unwrap_or(u32::MAX) {
                code::FUNC_DECLAREBLOCKS => {
                    let count = record.ops.first().copied().unwrap_or_default();
                    if count > body.entries.len() as u64 {
                        return Err(invalid("more blocks declared than instructions"));
                    }
                    blocks = (0..count)
                        .map(|id| Block {
                            label: labels.get(&id).cloned().unwrap_or_default(),
                            instructions: Vec::new(),
                        })
                        .collect();
                    continue;
                }
                code::FUNC_INST_RET if record.ops.is_empty() => Instruction::Ret,
                code::FUNC_INST_CALL => self.read_call(&record.ops, &mut values)?,
                code => return Err(Error::Unsupported(format!("instruction record {code}"))),
            };
            let terminator = instruction.is_terminator();
            blocks
                .get_mut(current)
                .ok_or_else(|| invalid("instruction outside the declared blocks"))?
                .instructions
                .push(instruction);
            if terminator {
                current += 1;
            }
        }
        Ok(blocks)
    }

    /// Reads `[paramattrs, cc, fmf?, fnty, callee, args...]`. Operands are relative to the
    /// number of the call itself.
    fn read_call(&self, ops: &[u64], values: &mut Vec<Value>) -> Result<Instruction, Error> {
        let [_, cc, ref rest @ ..] = ops[..] else {
            return Err(invalid("call record is too short"));
        };
        let rest = if cc & CALL_FMF == 0 {
            rest
        } else {
            rest.get(1..).unwrap_or_default()
        };
        if cc & CALL_EXPLICIT_TYPE == 0 {
            return Err(Error::Unsupported(
                "calls without an explicit function type".to_string(),
            ));
        }
        let [fn_ty, callee, ref args @ ..] = *rest else {
            return Err(invalid("call record is too short"));
        };

        let inst_id = values.len() as u64;
        let callee_id = inst_id.checked_sub(callee).ok_or(Error::UnknownCallee(callee))?;
        let Some(Value::Function(func)) = values.get(index(callee_id)?) else {
            return Err(Error::UnknownCallee(callee_id));
        };
        let callee = self.functions[*func].name.clone();

        let (ret, params) = self.signature(fn_ty)?;
        if params.len() != args.len() {
            return Err(invalid(format!(
                "call to `{callee}` passes {} arguments, its type has {}",
                args.len(),
                params.len()
            )));
        }
        let args = args
            .iter()
            .map(|rel| {
                let id = inst_id
                    .checked_sub(*rel)
                    .ok_or_else(|| invalid("forward reference in call argument"))?;
                match values.get(index(id)?) {
                    Some(Value::Constant(constant)) => constant
                        .operand()
                        .ok_or_else(|| invalid("call argument of unsupported type")),
                    _ => Err(Error::Unsupported("non-constant call arguments".to_string())),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if ret.is_some() {
            values.push(Value::Other);
        }
        Ok(Instruction::Call { callee, args })
    }

    fn finish(mut self) -> Result<Module, Error> {
        let mut declarations = Vec::new();
        let mut functions = Vec::new();
        let mut bodies = std::mem::take(&mut self.bodies).into_iter();
        for func in &self.functions {
            let (ret, params) = self.signature(func.ty)?;
            if func.is_proto {
                declarations.push(Declaration {
                    name: func.name.clone(),
                    params,
                    ret,
                    attrs: func.attrs,
                });
            } else {
                let blocks = bodies
                    .next()
                    .ok_or_else(|| invalid(format!("`{}` has no body", func.name)))?;
                functions.push(Function {
                    name: func.name.clone(),
                    ret,
                    attrs: func.attrs,
                    blocks,
                });
            }
        }

        Ok(Module {
            source_name: self.source_name,
            declarations,
            functions,
            attribute_groups: self.groups.into_iter().map(|(_, group)| group).collect(),
            flags: self.flags,
        })
    }
}

/// Reads one `!{i32 behavior, !"key", value}` tuple of `!llvm.module.flags`.
fn module_flag(nodes: &[Metadata], id: u64) -> Result<ModuleFlag, Error> {
    let get = |id: u64| index(id).ok().and_then(|id| nodes.get(id));
    let Some(Metadata::Node(ops)) = get(id) else {
        return Err(invalid(format!("module flag {id} is not a tuple")));
    };
    let refs = ops
        .iter()
        .map(|op| op.checked_sub(1).and_then(get))
        .collect::<Vec<_>>();
    match refs[..] {
        [
            Some(Metadata::Value(Constant::Int {
                width: 32,
                value: behavior,
            })),
            Some(Metadata::String(key)),
            Some(Metadata::Value(value)),
        ] => {
            let behavior = u32::try_from(*behavior)
                .map_err(|_| invalid(format!("module flag behavior {behavior}")))?;
            let value = match *value {
                Constant::Int { width: 32, value } => FlagValue::I32(
                    i32::try_from(value).map_err(|_| invalid("module flag value out of range"))?,
                ),
                Constant::Int { width: 1, value } => FlagValue::Bool(value != 0),
                _ => return Err(Error::Unsupported("module flag value type".to_string())),
            };
            Ok(ModuleFlag {
                behavior,
                key: key.clone(),
                value,
            })
        }
        _ => Err(invalid(format!("module flag {id} is not a flag tuple"))),
    }
}
