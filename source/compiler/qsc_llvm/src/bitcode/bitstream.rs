// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The LLVM bitstream container: a stream of bits packed little-endian into
//! 32-bit words, organized into nested blocks of records.

use crate::Error;
use rustc_hash::FxHashMap;

const END_BLOCK: u64 = 0;
const ENTER_SUBBLOCK: u64 = 1;
const DEFINE_ABBREV: u64 = 2;
const UNABBREV_RECORD: u64 = 3;
const FIRST_APPLICATION_ABBREV: u64 = 4;

const BLOCKINFO_BLOCK_ID: u64 = 0;
const BLOCKINFO_CODE_SETBID: u64 = 1;

const TOP_LEVEL_ABBREV_WIDTH: u32 = 2;
const MAX_DEPTH: usize = 32;

const ENCODING_FIXED: u64 = 1;
const ENCODING_VBR: u64 = 2;
const ENCODING_ARRAY: u64 = 3;
const ENCODING_CHAR6: u64 = 4;
const ENCODING_BLOB: u64 = 5;

pub(super) struct BitWriter {
    buf: Vec<u8>,
    cur: u64,
    bits: u32,
    abbrev_width: u32,
    scopes: Vec<Scope>,
}

struct Scope {
    outer_width: u32,
    size_word: usize,
}

impl BitWriter {
    pub(super) fn new() -> Self {
        Self {
            buf: Vec::new(),
            cur: 0,
            bits: 0,
            abbrev_width: TOP_LEVEL_ABBREV_WIDTH,
            scopes: Vec::new(),
        }
    }

    /// Writes the low `width` bits of `value`. `width` is at most 32.
    fn emit(&mut self, value: u64, width: u32) {
        debug_assert!(width <= 32 && (width == 32 || value >> width == 0));
        self.cur |= value << self.bits;
        self.bits += width;
        if self.bits >= 32 {
            self.buf.extend_from_slice(&self.cur.to_le_bytes()[..4]);
            self.cur >>= 32;
            self.bits -= 32;
        }
    }

    fn emit_vbr(&mut self, mut value: u64, width: u32) {
        let threshold = 1u64 << (width - 1);
        while value >= threshold {
            self.emit((value & (threshold - 1)) | threshold, width);
            value >>= width - 1;
        }
        self.emit(value, width);
    }

    fn align32(&mut self) {
        if self.bits > 0 {
            self.emit(0, 32 - self.bits);
        }
    }

    pub(super) fn magic(&mut self, magic: &[u8; 4]) {
        for byte in magic {
            self.emit(u64::from(*byte), 8);
        }
    }

    pub(super) fn enter_block(&mut self, id: u32, abbrev_width: u32) {
        self.emit(ENTER_SUBBLOCK, self.abbrev_width);
        self.emit_vbr(id.into(), 8);
        self.emit_vbr(abbrev_width.into(), 4);
        self.align32();
        let size_word = self.buf.len();
        self.emit(0, 32);
        self.scopes.push(Scope {
            outer_width: self.abbrev_width,
            size_word,
        });
        self.abbrev_width = abbrev_width;
    }

    pub(super) fn exit_block(&mut self) {
        self.emit(END_BLOCK, self.abbrev_width);
        self.align32();
        if let Some(scope) = self.scopes.pop() {
            let words = (self.buf.len() - scope.size_word - 4) / 4;
            let words = u32::try_from(words).unwrap_or(u32::MAX);
            self.buf[scope.size_word..scope.size_word + 4].copy_from_slice(&words.to_le_bytes());
            self.abbrev_width = scope.outer_width;
        }
    }

    pub(super) fn record(&mut self, code: u32, ops: &[u64]) {
        self.emit(UNABBREV_RECORD, self.abbrev_width);
        self.emit_vbr(code.into(), 6);
        self.emit_vbr(ops.len() as u64, 6);
        for op in ops {
            self.emit_vbr(*op, 6);
        }
    }

    /// Writes a record whose operands are the bytes of `s`.
    pub(super) fn string_record(&mut self, code: u32, prefix: &[u64], s: &str) {
        let ops = prefix
            .iter()
            .copied()
            .chain(s.bytes().map(u64::from))
            .collect::<Vec<_>>();
        self.record(code, &ops);
    }

    /// Defines the abbreviation `[literal code, blob]` in the current block and returns its id.
    /// Only one abbreviation is ever defined per block.
    pub(super) fn define_blob_abbrev(&mut self, code: u32) -> u64 {
        self.emit(DEFINE_ABBREV, self.abbrev_width);
        self.emit_vbr(2, 5);
        self.emit(1, 1);
        self.emit_vbr(code.into(), 8);
        self.emit(0, 1);
        self.emit(ENCODING_BLOB, 3);
        FIRST_APPLICATION_ABBREV
    }

    pub(super) fn blob_record(&mut self, abbrev: u64, blob: &[u8]) {
        self.emit(abbrev, self.abbrev_width);
        self.emit_vbr(blob.len() as u64, 6);
        self.align32();
        for byte in blob {
            self.emit(u64::from(*byte), 8);
        }
        self.align32();
    }

    pub(super) fn finish(mut self) -> Vec<u8> {
        self.align32();
        self.buf
    }
}

/// A block read from a bitstream, with every record fully expanded.
#[derive(Debug)]
pub(super) struct Block {
    pub id: u64,
    pub entries: Vec<Entry>,
}

#[derive(Debug)]
pub(super) enum Entry {
    Record(Record),
    Block(Block),
}

#[derive(Debug)]
pub(super) struct Record {
    pub code: u64,
    pub ops: Vec<u64>,
    pub blob: Option<Vec<u8>>,
}

impl Block {
    pub(super) fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Record(record) => Some(record),
            Entry::Block(_) => None,
        })
    }

    pub(super) fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Block(block) => Some(block),
            Entry::Record(_) => None,
        })
    }
}

#[derive(Clone, Debug)]
enum AbbrevOp {
    Literal(u64),
    Fixed(u32),
    Vbr(u32),
    Array,
    Char6,
    Blob,
}

type Abbrev = Vec<AbbrevOp>;

pub(super) struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    block_info: FxHashMap<u64, Vec<Abbrev>>,
}

impl<'a> BitReader<'a> {
    pub(super) fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            block_info: FxHashMap::default(),
        }
    }

    fn len_bits(&self) -> usize {
        self.bytes.len() * 8
    }

    fn remaining_bits(&self) -> usize {
        self.len_bits().saturating_sub(self.pos)
    }

    fn read(&mut self, width: u32) -> Result<u64, Error> {
        let width_bits = width as usize;
        if width > 64 || self.remaining_bits() < width_bits {
            return Err(Error::UnexpectedEof(self.pos));
        }
        let mut value = 0u64;
        for i in 0..width_bits {
            let bit = self.pos + i;
            if (self.bytes[bit / 8] >> (bit % 8)) & 1 == 1 {
                value |= 1 << i;
            }
        }
        self.pos += width_bits;
        Ok(value)
    }

    fn read_vbr(&mut self, width: u32) -> Result<u64, Error> {
        let start = self.pos;
        let continuation = 1u64 << (width - 1);
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let piece = self.read(width)?;
            let payload = piece & (continuation - 1);
            if shift >= 64 || (shift > 0 && payload >> (64 - shift) != 0) {
                return Err(Error::Malformed {
                    bit: start,
                    message: "variable-width integer overflows 64 bits".to_string(),
                });
            }
            value |= payload << shift;
            if piece & continuation == 0 {
                return Ok(value);
            }
            shift += width - 1;
        }
    }

    fn align32(&mut self) -> Result<(), Error> {
        let aligned = self.pos.div_ceil(32) * 32;
        if aligned > self.len_bits() {
            return Err(Error::UnexpectedEof(self.pos));
        }
        self.pos = aligned;
        Ok(())
    }

    /// Reads the magic number followed by every top-level block.
    pub(super) fn read_stream(&mut self, magic: &[u8; 4]) -> Result<Vec<Block>, Error> {
        if self.bytes.get(..4) != Some(magic.as_slice()) {
            return Err(Error::BadMagic);
        }
        self.pos = 32;
        let mut blocks = Vec::new();
        while self.remaining_bits() >= 32 {
            let start = self.pos;
            match self.read(TOP_LEVEL_ABBREV_WIDTH)? {
                ENTER_SUBBLOCK => {
                    if let Some(block) = self.read_block(0)? {
                        blocks.push(block);
                    }
                }
                abbrev => {
                    return Err(Error::Malformed {
                        bit: start,
                        message: format!("abbreviation {abbrev} outside of a block"),
                    });
                }
            }
        }
        Ok(blocks)
    }

    /// Reads a block whose `ENTER_SUBBLOCK` id has just been consumed. The block info
    /// block is absorbed into the reader and yields `None`.
    fn read_block(&mut self, depth: usize) -> Result<Option<Block>, Error> {
        let start = self.pos;
        if depth > MAX_DEPTH {
            return Err(Error::Malformed {
                bit: start,
                message: "blocks are nested too deeply".to_string(),
            });
        }
        let id = self.read_vbr(8)?;
        let width = u32::try_from(self.read_vbr(4)?)
            .ok()
            .filter(|width| (2..=32).contains(width))
            .ok_or_else(|| Error::Malformed {
                bit: start,
                message: "invalid abbreviation width".to_string(),
            })?;
        self.align32()?;
        let words = self.read(32)?;
        let end = usize::try_from(words)
            .ok()
            .and_then(|words| words.checked_mul(32))
            .and_then(|bits| bits.checked_add(self.pos))
            .filter(|end| *end <= self.len_bits())
            .ok_or(Error::UnexpectedEof(self.pos))?;

        let mut abbrevs = self.block_info.get(&id).cloned().unwrap_or_default();
        let mut block = Block {
            id,
            entries: Vec::new(),
        };
        let mut info_target = None;
        loop {
            let at = self.pos;
            match self.read(width)? {
                END_BLOCK => {
                    self.align32()?;
                    if self.pos != end {
                        return Err(Error::Malformed {
                            bit: at,
                            message: format!("block {id} does not match its declared length"),
                        });
                    }
                    break;
                }
                ENTER_SUBBLOCK => {
                    if let Some(inner) = self.read_block(depth + 1)? {
                        block.entries.push(Entry::Block(inner));
                    }
                }
                DEFINE_ABBREV => {
                    let abbrev = self.read_abbrev_definition()?;
                    if id == BLOCKINFO_BLOCK_ID {
                        let target = info_target.ok_or_else(|| Error::Malformed {
                            bit: at,
                            message: "block info abbreviation before SETBID".to_string(),
                        })?;
                        self.block_info.entry(target).or_default().push(abbrev);
                    } else {
                        abbrevs.push(abbrev);
                    }
                }
                UNABBREV_RECORD => {
                    let code = self.read_vbr(6)?;
                    let count = self.read_vbr(6)?;
                    let mut ops = Vec::new();
                    for _ in 0..count {
                        ops.push(self.read_vbr(6)?);
                    }
                    if id == BLOCKINFO_BLOCK_ID && code == BLOCKINFO_CODE_SETBID {
                        info_target = ops.first().copied();
                    }
                    block
                        .entries
                        .push(Entry::Record(Record { code, ops, blob: None }));
                }
                abbrev_id => {
                    let abbrev = usize::try_from(abbrev_id - FIRST_APPLICATION_ABBREV)
                        .ok()
                        .and_then(|index| abbrevs.get(index))
                        .cloned()
                        .ok_or(Error::UnknownAbbrev {
                            id: abbrev_id,
                            bit: at,
                        })?;
                    let record = self.read_abbreviated(&abbrev, at)?;
                    block.entries.push(Entry::Record(record));
                }
            }
        }
        Ok((id != BLOCKINFO_BLOCK_ID).then_some(block))
    }

    fn read_abbrev_definition(&mut self) -> Result<Abbrev, Error> {
        let start = self.pos;
        let malformed = |message: &str| Error::Malformed {
            bit: start,
            message: message.to_string(),
        };
        let count = self.read_vbr(5)?;
        let mut ops = Vec::new();
        for _ in 0..count {
            if self.read(1)? == 1 {
                ops.push(AbbrevOp::Literal(self.read_vbr(8)?));
                continue;
            }
            let op = match self.read(3)? {
                encoding @ (ENCODING_FIXED | ENCODING_VBR) => {
                    let width = u32::try_from(self.read_vbr(5)?)
                        .ok()
                        .filter(|width| *width <= 64)
                        .ok_or_else(|| malformed("abbreviation operand is too wide"))?;
                    match (encoding, width) {
                        (_, 0) => AbbrevOp::Literal(0),
                        (ENCODING_FIXED, _) => AbbrevOp::Fixed(width),
                        (_, 1) => return Err(malformed("variable-width operand of width 1")),
                        _ => AbbrevOp::Vbr(width),
                    }
                }
                ENCODING_ARRAY => AbbrevOp::Array,
                ENCODING_CHAR6 => AbbrevOp::Char6,
                ENCODING_BLOB => AbbrevOp::Blob,
                _ => return Err(malformed("unknown abbreviation operand encoding")),
            };
            ops.push(op);
        }

        let last = ops.len().checked_sub(1);
        for (i, op) in ops.iter().enumerate() {
            match op {
                AbbrevOp::Array
                    if Some(i + 1) != last
                        || matches!(
                            ops[i + 1],
                            AbbrevOp::Array | AbbrevOp::Blob | AbbrevOp::Literal(_)
                        ) =>
                {
                    return Err(malformed("array must be followed by one element operand"));
                }
                AbbrevOp::Blob if Some(i) != last => {
                    return Err(malformed("blob must be the last operand"));
                }
                _ => {}
            }
        }
        if ops.is_empty() {
            return Err(malformed("empty abbreviation"));
        }
        Ok(ops)
    }

    fn read_scalar(&mut self, op: &AbbrevOp) -> Result<u64, Error> {
        match op {
            AbbrevOp::Literal(value) => Ok(*value),
            AbbrevOp::Fixed(width) => self.read(*width),
            AbbrevOp::Vbr(width) => self.read_vbr(*width),
            AbbrevOp::Char6 => {
                let value = self.read(6)?;
                Ok(u64::from(
                    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._"
                        [usize::try_from(value).unwrap_or_default()],
                ))
            }
            AbbrevOp::Array | AbbrevOp::Blob => Err(Error::Malformed {
                bit: self.pos,
                message: "aggregate operand in scalar position".to_string(),
            }),
        }
    }

    fn read_abbreviated(&mut self, abbrev: &[AbbrevOp], at: usize) -> Result<Record, Error> {
        let Some((first, rest)) = abbrev.split_first() else {
            return Err(Error::UnknownAbbrev { id: 0, bit: at });
        };
        let code = self.read_scalar(first)?;
        let mut ops = Vec::new();
        let mut blob = None;
        let mut i = 0;
        while i < rest.len() {
            match &rest[i] {
                AbbrevOp::Array => {
                    let len = self.read_vbr(6)?;
                    let element = &rest[i + 1];
                    for _ in 0..len {
                        ops.push(self.read_scalar(element)?);
                    }
                    i += 2;
                }
                AbbrevOp::Blob => {
                    let len = usize::try_from(self.read_vbr(6)?)
                        .ok()
                        .filter(|len| len.saturating_mul(8) <= self.remaining_bits())
                        .ok_or(Error::UnexpectedEof(self.pos))?;
                    self.align32()?;
                    let mut bytes = Vec::with_capacity(len);
                    for _ in 0..len {
                        bytes.push(u8::try_from(self.read(8)?).unwrap_or_default());
                    }
                    self.align32()?;
                    blob = Some(bytes);
                    i += 1;
                }
                op => {
                    ops.push(self.read_scalar(op)?);
                    i += 1;
                }
            }
        }
        Ok(Record { code, ops, blob })
    }
}
