//! Alternation, branch and quantified piece.

use regula_bytecode::{MAX_FINITE_BOUND, Opcode, ProgramFlags, UNBOUNDED, flag};

use super::{PResult, Parser, Piece, PieceFlags};
use crate::diagnostics::DiagnosticKind;
use crate::trace::CompileTracer;

/// Result of parsing `branch ('|' branch)*`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Alternation {
    pub piece: Piece,
    pub branches: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Greed {
    Greedy,
    Lazy,
    Possessive,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Quantifier {
    pub min: u32,
    pub max: Option<u32>,
    pub greed: Greed,
    pub start: usize,
    pub end: usize,
}

/// A syntactically valid `{m}`, `{m,}`, `{m,n}` or `{,n}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Braces {
    pub len: usize,
    pub min: u64,
    pub max: Option<u64>,
}

/// Recognizes a braced quantifier at the start of `text`. Blanks are allowed
/// around the numbers; anything else means the brace is literal text.
pub(crate) fn scan_braces(text: &str) -> Option<Braces> {
    let b = text.as_bytes();
    if b.first() != Some(&b'{') {
        return None;
    }
    let mut i = 1;
    let skip_blanks = |i: &mut usize| {
        while *i < b.len() && matches!(b[*i], b' ' | b'\t') {
            *i += 1;
        }
    };
    let number = |i: &mut usize| {
        let start = *i;
        let mut value: u64 = 0;
        while *i < b.len() && b[*i].is_ascii_digit() {
            value = value
                .saturating_mul(10)
                .saturating_add(u64::from(b[*i] - b'0'));
            *i += 1;
        }
        (*i > start).then_some(value)
    };

    skip_blanks(&mut i);
    let lo = number(&mut i);
    skip_blanks(&mut i);
    match b.get(i)? {
        b'}' => Some(Braces {
            len: i + 1,
            min: lo?,
            max: lo,
        }),
        b',' => {
            i += 1;
            skip_blanks(&mut i);
            let hi = number(&mut i);
            skip_blanks(&mut i);
            if b.get(i) != Some(&b'}') || (lo.is_none() && hi.is_none()) {
                return None;
            }
            Some(Braces {
                len: i + 1,
                min: lo.unwrap_or(0),
                max: hi,
            })
        }
        _ => None,
    }
}

impl<T: CompileTracer> Parser<'_, T> {
    /// `branch ('|' branch)*`. A `Branch` node heads every alternative once
    /// there is more than one. With `reset`, every alternative numbers its
    /// groups from the same logical index.
    pub(crate) fn parse_alternation(&mut self, depth: u32, reset: bool) -> PResult<Alternation> {
        let start = self.emit.len();
        let base_logical = self.groups.logical;
        let mut high_logical = base_logical;
        let mut empty = Vec::new();

        let branch_pos = self.src.pos();
        let (mut piece, is_empty) = self.parse_branch(depth)?;
        if is_empty {
            empty.push(branch_pos);
        }
        let mut branches = 1;
        let mut last_branch: Option<usize> = None;

        while self.src.peek() == Some('|') {
            self.src.bump();
            let prev = match last_branch {
                Some(prev) => prev,
                None => {
                    self.insert(start, Opcode::Branch, 0, &[])?;
                    start
                }
            };
            if reset {
                high_logical = high_logical.max(self.groups.logical);
                self.groups.logical = base_logical;
            }
            let b = self.push(Opcode::Branch, 0)?;
            self.link(prev, b)?;
            last_branch = Some(b);

            let branch_pos = self.src.pos();
            let (next, is_empty) = self.parse_branch(depth)?;
            if is_empty {
                empty.push(branch_pos);
            }
            piece = piece.or(next);
            branches += 1;
        }

        if reset {
            self.groups.logical = high_logical.max(self.groups.logical);
        }
        if branches > 1 {
            for pos in empty {
                self.warn(DiagnosticKind::EmptyAlternative, pos, pos);
            }
        }
        piece.start = start;
        Ok(Alternation { piece, branches })
    }

    /// Wires the fall-through of every alternative to `ender`.
    pub(crate) fn close_alternation(&mut self, alt: &Alternation, ender: usize) -> PResult<()> {
        self.tail(alt.piece.start, ender)?;
        if alt.branches > 1 {
            self.tail_branches(alt.piece.start, ender)?;
        }
        Ok(())
    }

    /// Pieces chained up to `|`, `)` or the end. An empty branch is a
    /// `Nothing` node.
    pub(crate) fn parse_branch(&mut self, depth: u32) -> PResult<(Piece, bool)> {
        let mut acc: Option<Piece> = None;
        let mut prev: Option<usize> = None;
        loop {
            self.skip_ignorable()?;
            if matches!(self.src.peek(), None | Some('|') | Some(')')) {
                break;
            }
            let Some(piece) = self.parse_piece(depth)? else {
                continue;
            };
            if let Some(prev) = prev {
                self.tail(prev, piece.start)?;
            }
            prev = Some(piece.start);
            acc = Some(match acc {
                None => piece,
                Some(acc) => acc.then(piece),
            });
        }
        match acc {
            Some(piece) => Ok((piece, false)),
            None => {
                let at = self.push(Opcode::Nothing, 0)?;
                Ok((Piece::zero_width(at), true))
            }
        }
    }

    /// An atom and its quantifier, if any.
    fn parse_piece(&mut self, depth: u32) -> PResult<Option<Piece>> {
        let Some(atom) = self.parse_atom(depth)? else {
            return Ok(None);
        };
        self.skip_ignorable()?;
        let Some(q) = self.parse_quantifier()? else {
            return Ok(Some(atom));
        };
        let piece = self.apply_quantifier(atom, q)?;
        self.skip_ignorable()?;
        if let Some(len) = self.quantifier_ahead() {
            let pos = self.src.pos();
            return Err(self.error(DiagnosticKind::NestedQuantifier, pos, pos + len));
        }
        Ok(Some(piece))
    }

    /// Length of the quantifier at the cursor, if there is one.
    pub(crate) fn quantifier_ahead(&self) -> Option<usize> {
        match self.src.peek()? {
            '*' | '+' | '?' => Some(1),
            '{' => scan_braces(self.src.rest()).map(|b| b.len),
            _ => None,
        }
    }

    fn parse_quantifier(&mut self) -> PResult<Option<Quantifier>> {
        let start = self.src.pos();
        let (min, max) = match self.src.peek() {
            Some('*') => (0, None),
            Some('+') => (1, None),
            Some('?') => (0, Some(1)),
            Some('{') => {
                let Some(b) = scan_braces(self.src.rest()) else {
                    return Ok(None);
                };
                let limit = u64::from(MAX_FINITE_BOUND);
                if b.min > limit || b.max.is_some_and(|m| m > limit) {
                    return Err(self.error(
                        DiagnosticKind::QuantifierTooLarge,
                        start,
                        start + b.len,
                    ));
                }
                self.src.set_pos(start + b.len - 1);
                (b.min as u32, b.max.map(|m| m as u32))
            }
            _ => return Ok(None),
        };
        self.src.bump();
        let greed = if self.src.eat('?') {
            Greed::Lazy
        } else if self.src.eat('+') {
            Greed::Possessive
        } else {
            Greed::Greedy
        };
        Ok(Some(Quantifier {
            min,
            max,
            greed,
            start,
            end: self.src.pos(),
        }))
    }

    fn apply_quantifier(&mut self, atom: Piece, q: Quantifier) -> PResult<Piece> {
        let mut greed = q.greed;
        let mut min = q.min as usize;
        let mut max = q.max.map(|m| m as usize);

        if greed == Greed::Lazy && Some(min) == max {
            self.warn(DiagnosticKind::UselessGreediness, q.end - 1, q.end);
            greed = Greed::Greedy;
        }

        if let Some(mx) = max
            && min > mx
        {
            self.warn(DiagnosticKind::ReversedQuantifier, q.start, q.end);
            self.insert(atom.start, Opcode::OpFail, 0, &[])?;
            let body = self.emit.node(atom.start).after();
            self.link(atom.start, body)?;
            return Ok(Piece::zero_width(atom.start));
        }

        if min == 1 && max == Some(1) {
            if greed != Greed::Possessive {
                return Ok(atom);
            }
            self.wrap_atomic(atom.start)?;
            return Ok(Piece::new(atom.start, atom.min, atom.max, atom.flags & PieceFlags::POSTPONED));
        }

        if atom.is_zero_width() && !atom.flags.contains(PieceFlags::POSTPONED) {
            if max.is_none_or(|m| m > 1) {
                self.warn(DiagnosticKind::NullMatchLoop, q.start, q.end);
                max = Some(1);
            }
            min = min.min(1);
            if min == 1 {
                return Ok(atom);
            }
        }

        if max.is_none() {
            self.seen |= ProgramFlags::UNBOUNDED;
        }
        let lazy = if greed == Greed::Lazy { flag::LAZY } else { 0 };
        let bound = max.map_or(UNBOUNDED, |m| m as u32);

        if atom.flags.contains(PieceFlags::SIMPLE) {
            match (min, max) {
                (0, None) => self.insert(atom.start, Opcode::Star, lazy, &[])?,
                (1, None) => self.insert(atom.start, Opcode::Plus, lazy, &[])?,
                _ => self.insert(atom.start, Opcode::Curly, lazy, &[min as u32, bound])?,
            }
        } else {
            let whilem = self.push(Opcode::WhileM, 0)?;
            self.tail(atom.start, whilem)?;
            self.insert(atom.start, Opcode::CurlyX, lazy, &[min as u32, bound])?;
            let exit = self.push(Opcode::Nothing, 0)?;
            self.link(atom.start, exit)?;

            self.seen |= ProgramFlags::GENERAL_LOOP;
            if max.is_none() && atom.min == 0 {
                self.seen |= ProgramFlags::ZERO_LEN_LOOP;
            }
            if max.is_none_or(|m| m > 1) {
                self.naughty += 2 + self.naughty / 2;
            }
        }

        let piece_max = match (atom.max, max) {
            (Some(0), _) | (_, Some(0)) => Some(0),
            (Some(a), Some(m)) => Some(a.saturating_mul(m)),
            _ => None,
        };
        let piece = Piece::new(
            atom.start,
            atom.min.saturating_mul(min),
            piece_max,
            atom.flags & PieceFlags::POSTPONED,
        );

        if greed == Greed::Possessive {
            self.wrap_atomic(atom.start)?;
        }
        Ok(piece)
    }

    /// Wraps the construct at `start` (already complete up to the end of the
    /// code) in `Suspend ... Succeed` followed by a `Tail`.
    pub(crate) fn wrap_atomic(&mut self, start: usize) -> PResult<()> {
        self.insert(start, Opcode::Suspend, 0, &[])?;
        let body = self.emit.node(start).after();
        let succeed = self.push(Opcode::Succeed, 0)?;
        self.tail(body, succeed)?;
        let tail = self.push(Opcode::Tail, 0)?;
        self.link(start, tail)
    }
}
