//! Node emission into the slot array.
//!
//! Nodes are appended in pattern order. A quantifier or possessive suffix is
//! applied after its operand is already emitted, so the emitter can also
//! insert a node in front of existing code; every tracked offset and every
//! link that crosses the insertion point is shifted along.

use regula_bytecode::{BITMAP_WORDS, Encoding, LinkOverflow, Node, Opcode, Operands, pack_str};

#[derive(Debug)]
pub(crate) struct Emitter {
    code: Vec<u32>,
    enc: Encoding,
    /// Offset of each physical group's `Open` (index 0 unused).
    pub(crate) opens: Vec<Option<usize>>,
    /// Offset of each physical group's `Close` (index 0 unused).
    pub(crate) closes: Vec<Option<usize>>,
    /// `GoSub` nodes whose target is filled in once the pass is complete.
    pub(crate) gosubs: Vec<usize>,
}

impl Emitter {
    pub fn new(enc: Encoding) -> Self {
        Self {
            code: Vec::new(),
            enc,
            opens: vec![None],
            closes: vec![None],
            gosubs: Vec::new(),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.enc
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn into_code(self) -> Vec<u32> {
        self.code
    }

    pub fn node(&self, at: usize) -> Node<'_> {
        Node::new(&self.code, at, self.enc)
    }

    pub fn opcode(&self, at: usize) -> Opcode {
        self.node(at).opcode()
    }

    fn operand_start(&self, at: usize) -> usize {
        at + self.enc.header_words()
    }

    /// Appends a node with zeroed operands.
    pub fn push(&mut self, op: Opcode, flags: u8) -> usize {
        debug_assert_ne!(op.operands(), Operands::Str);
        let at = self.code.len();
        self.code.push(Encoding::header(op, flags));
        self.code.resize(at + self.enc.node_words(op, 0), 0);
        at
    }

    pub fn push_arg1(&mut self, op: Opcode, flags: u8, arg: u32) -> usize {
        let at = self.push(op, flags);
        self.set_arg1(at, arg);
        at
    }

    pub fn push_arg2(&mut self, op: Opcode, flags: u8, a: u32, b: u32) -> usize {
        let at = self.push(op, flags);
        self.set_arg1(at, a);
        self.set_arg2(at, b);
        at
    }

    pub fn push_str(&mut self, op: Opcode, flags: u8, bytes: &[u8]) -> usize {
        let at = self.code.len();
        self.code.push(Encoding::header(op, flags));
        if self.enc.wide_links {
            self.code.push(0);
        }
        self.code.extend(pack_str(bytes));
        at
    }

    pub fn push_class(&mut self, flags: u8, aux: u32, bitmap: &[u32; BITMAP_WORDS]) -> usize {
        let at = self.push(Opcode::AnyOf, flags);
        let start = self.operand_start(at);
        self.code[start] = aux;
        self.code[start + 1..start + 1 + BITMAP_WORDS].copy_from_slice(bitmap);
        at
    }

    pub fn set_arg1(&mut self, at: usize, value: u32) {
        let start = self.operand_start(at);
        self.code[start] = value;
    }

    pub fn set_arg2(&mut self, at: usize, value: u32) {
        let start = self.operand_start(at);
        self.code[start + 1] = value;
    }

    /// Inserts a node at `at`, moving the code from `at` on up.
    pub fn insert(
        &mut self,
        at: usize,
        op: Opcode,
        flags: u8,
        operands: &[u32],
    ) -> Result<(), LinkOverflow> {
        debug_assert_eq!(operands.len(), op.operand_words(0));
        let mut words = vec![Encoding::header(op, flags)];
        if self.enc.wide_links {
            words.push(0);
        }
        words.extend_from_slice(operands);
        let n = words.len();

        let mut off = 0;
        while off < at {
            let size = self.node(off).size();
            let d = self.enc.read_next(&self.code, off);
            if d != 0 && off + d > at {
                self.enc.write_next(&mut self.code, off, d + n)?;
            }
            off += size;
        }

        self.code.splice(at..at, words);

        let shift = |o: &mut usize| {
            if *o >= at {
                *o += n;
            }
        };
        self.opens.iter_mut().flatten().for_each(shift);
        self.closes.iter_mut().flatten().for_each(shift);
        self.gosubs.iter_mut().for_each(shift);
        Ok(())
    }

    pub fn next_of(&self, at: usize) -> Option<usize> {
        self.node(at).next()
    }

    /// Sets the next link of `from` to `to`.
    pub fn link(&mut self, from: usize, to: usize) -> Result<(), LinkOverflow> {
        debug_assert!(to > from, "links only point forward");
        self.enc.write_next(&mut self.code, from, to - from)
    }

    /// Follows the chain starting at `from` and links its last node to `to`.
    pub fn tail(&mut self, from: usize, to: usize) -> Result<(), LinkOverflow> {
        let mut cur = from;
        while let Some(next) = self.next_of(cur) {
            cur = next;
        }
        if cur == to {
            return Ok(());
        }
        self.link(cur, to)
    }

    /// Links the end of every body in the `Branch` chain starting at `first`.
    pub fn tail_branches(&mut self, first: usize, to: usize) -> Result<(), LinkOverflow> {
        let mut cur = Some(first);
        while let Some(at) = cur {
            if self.opcode(at) != Opcode::Branch {
                break;
            }
            let body = self.node(at).after();
            self.tail(body, to)?;
            cur = self.next_of(at);
        }
        Ok(())
    }

    pub fn track_group(&mut self, physical: u32) {
        let p = physical as usize;
        if self.opens.len() <= p {
            self.opens.resize(p + 1, None);
            self.closes.resize(p + 1, None);
        }
    }
}
