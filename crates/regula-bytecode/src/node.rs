//! Node encoding in the program's `u32` slot array.
//!
//! Narrow links: `[op | flags << 8 | next << 16] [operands..]`.
//! Wide links:   `[op | flags << 8] [next] [operands..]`.
//!
//! `next` is the forward distance in slots from the node's own offset;
//! zero means "not linked yet". Literal bytes are Latin-1 in narrow
//! programs and UTF-8 in wide (UTF-8) programs.

use serde::Serialize;

use crate::opcode::{BITMAP_WORDS, NO_AUX, Opcode, Operands};

/// Largest next distance a narrow header can hold.
pub const MAX_NARROW_LINK: usize = u16::MAX as usize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Encoding {
    /// Pattern and literals are UTF-8 (a code point above 0xFF was seen).
    pub utf8: bool,
    /// Next distances live in their own slot.
    pub wide_links: bool,
}

/// A next distance that does not fit the narrow header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkOverflow {
    pub distance: usize,
}

impl Encoding {
    pub fn header_words(self) -> usize {
        if self.wide_links { 2 } else { 1 }
    }

    /// Total words of a node, given the byte length of a string operand.
    pub fn node_words(self, op: Opcode, str_len: usize) -> usize {
        self.header_words() + op.operand_words(str_len)
    }

    pub fn header(op: Opcode, flags: u8) -> u32 {
        u32::from(op as u8) | (u32::from(flags) << 8)
    }

    pub fn read_next(self, code: &[u32], at: usize) -> usize {
        if self.wide_links {
            code[at + 1] as usize
        } else {
            (code[at] >> 16) as usize
        }
    }

    pub fn write_next(self, code: &mut [u32], at: usize, distance: usize) -> Result<(), LinkOverflow> {
        if self.wide_links {
            code[at + 1] = u32::try_from(distance).map_err(|_| LinkOverflow { distance })?;
        } else {
            if distance > MAX_NARROW_LINK {
                return Err(LinkOverflow { distance });
            }
            code[at] = (code[at] & 0xFFFF) | ((distance as u32) << 16);
        }
        Ok(())
    }
}

/// Packs bytes little-endian into words, preceded by the length word.
pub fn pack_str(bytes: &[u8]) -> Vec<u32> {
    let mut words = Vec::with_capacity(1 + bytes.len().div_ceil(4));
    words.push(bytes.len() as u32);
    for chunk in bytes.chunks(4) {
        let mut buf = [0u8; 4];
        buf[..chunk.len()].copy_from_slice(chunk);
        words.push(u32::from_le_bytes(buf));
    }
    words
}

pub fn unpack_str(words: &[u32], len: usize) -> Vec<u8> {
    words
        .iter()
        .flat_map(|w| w.to_le_bytes())
        .take(len)
        .collect()
}

/// Read-only view of one node.
#[derive(Clone, Copy, Debug)]
pub struct Node<'a> {
    code: &'a [u32],
    offset: usize,
    encoding: Encoding,
}

impl<'a> Node<'a> {
    /// `code` must hold a validated node at `offset`.
    pub fn new(code: &'a [u32], offset: usize, encoding: Encoding) -> Self {
        Self {
            code,
            offset,
            encoding,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn opcode(&self) -> Opcode {
        Opcode::from_u8(self.code[self.offset] as u8).expect("node views only exist over validated code")
    }

    pub fn flags(&self) -> u8 {
        (self.code[self.offset] >> 8) as u8
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags() & flag != 0
    }

    /// Absolute offset of the next node, if linked.
    pub fn next(&self) -> Option<usize> {
        match self.encoding.read_next(self.code, self.offset) {
            0 => None,
            d => Some(self.offset + d),
        }
    }

    fn operand_start(&self) -> usize {
        self.offset + self.encoding.header_words()
    }

    pub fn arg1(&self) -> u32 {
        self.code[self.operand_start()]
    }

    pub fn arg2(&self) -> u32 {
        self.code[self.operand_start() + 1]
    }

    pub fn str_len(&self) -> usize {
        debug_assert_eq!(self.opcode().operands(), Operands::Str);
        self.code[self.operand_start()] as usize
    }

    pub fn literal_bytes(&self) -> Vec<u8> {
        let start = self.operand_start() + 1;
        let len = self.str_len();
        unpack_str(&self.code[start..start + len.div_ceil(4)], len)
    }

    /// Literal as code points, decoded per the program encoding.
    pub fn literal_codepoints(&self) -> Vec<u32> {
        let bytes = self.literal_bytes();
        if self.encoding.utf8 {
            String::from_utf8_lossy(&bytes).chars().map(|c| c as u32).collect()
        } else {
            bytes.into_iter().map(u32::from).collect()
        }
    }

    pub fn literal_text(&self) -> String {
        self.literal_codepoints()
            .into_iter()
            .filter_map(char::from_u32)
            .collect()
    }

    /// Class side-table index, if any.
    pub fn class_aux(&self) -> Option<u32> {
        match self.code[self.operand_start()] {
            NO_AUX => None,
            idx => Some(idx),
        }
    }

    pub fn bitmap(&self) -> [u32; BITMAP_WORDS] {
        let start = self.operand_start() + 1;
        let mut out = [0u32; BITMAP_WORDS];
        out.copy_from_slice(&self.code[start..start + BITMAP_WORDS]);
        out
    }

    pub fn bitmap_contains(&self, byte: u8) -> bool {
        let bits = self.bitmap();
        bits[usize::from(byte >> 5)] & (1 << (byte & 31)) != 0
    }

    pub fn size(&self) -> usize {
        let op = self.opcode();
        let str_len = if op.operands() == Operands::Str {
            self.str_len()
        } else {
            0
        };
        self.encoding.node_words(op, str_len)
    }

    /// Offset right after the operand area: the body of a `Branch`, loop or
    /// lookaround.
    pub fn after(&self) -> usize {
        self.offset + self.size()
    }
}

/// Walks nodes in array order.
pub struct Nodes<'a> {
    code: &'a [u32],
    offset: usize,
    encoding: Encoding,
}

impl<'a> Nodes<'a> {
    pub fn new(code: &'a [u32], encoding: Encoding) -> Self {
        Self {
            code,
            offset: 0,
            encoding,
        }
    }
}

impl<'a> Iterator for Nodes<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.code.len() {
            return None;
        }
        let node = Node::new(self.code, self.offset, self.encoding);
        self.offset = node.after();
        Some(node)
    }
}
