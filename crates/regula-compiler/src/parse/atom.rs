//! Atoms: anchors, dot, escapes with a node of their own, backreferences.
//!
//! Anything that is plain text ends up in the literal run, see `literal.rs`.

use regula_bytecode::{BoundKind, Charset, Opcode, ProgramFlags, charset_flags};

use super::grammar::scan_braces;
use super::{PResult, Parser, Piece, PieceFlags, is_word_char};
use crate::diagnostics::DiagnosticKind;
use crate::trace::CompileTracer;

/// How a `\<digits>` escape outside a class is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DigitEscape {
    Backref(u32),
    Octal,
}

impl<T: CompileTracer> Parser<'_, T> {
    /// One atom. `None` when the cursor held nothing that emits a node.
    pub(crate) fn parse_atom(&mut self, depth: u32) -> PResult<Option<Piece>> {
        let pos = self.src.pos();
        let Some(c) = self.src.peek() else {
            return Ok(None);
        };
        match c {
            '^' => {
                self.src.bump();
                let op = if self.mode.multiline {
                    Opcode::Mbol
                } else {
                    Opcode::Bol
                };
                self.zero_width(op, 0).map(Some)
            }
            '$' => {
                self.src.bump();
                let op = if self.mode.multiline {
                    Opcode::Meol
                } else {
                    Opcode::Eol
                };
                self.zero_width(op, 0).map(Some)
            }
            '.' => {
                self.src.bump();
                let op = if self.mode.dot_all {
                    Opcode::SAny
                } else {
                    Opcode::RegAny
                };
                let at = self.push(op, 0)?;
                Ok(Some(Piece::single(at)))
            }
            '[' => self.parse_bracket_class(depth).map(Some),
            '(' => self.parse_group(depth),
            '*' | '+' | '?' => Err(self.error(DiagnosticKind::QuantifierFollowsNothing, pos, pos + 1)),
            '{' if scan_braces(self.src.rest()).is_some() => {
                let len = scan_braces(self.src.rest()).map_or(1, |b| b.len);
                Err(self.error(DiagnosticKind::QuantifierFollowsNothing, pos, pos + len))
            }
            '\\' => self.parse_escape(depth).map(Some),
            _ => self.parse_literal_run().map(Some),
        }
    }

    fn zero_width(&mut self, op: Opcode, flags: u8) -> PResult<Piece> {
        let at = self.push(op, flags)?;
        Ok(Piece::zero_width(at))
    }

    /// An escape at the cursor. Escapes standing for plain characters are
    /// handed to the literal run.
    fn parse_escape(&mut self, depth: u32) -> PResult<Piece> {
        let start = self.src.pos();
        let Some(c) = self.src.peek_nth(1) else {
            return Err(self.error(DiagnosticKind::TrailingBackslash, start, start + 1));
        };
        match c {
            'A' => self.escape_anchor(Opcode::Sbol),
            'z' => self.escape_anchor(Opcode::Eos),
            'Z' => self.escape_anchor(Opcode::Seol),
            'G' => {
                self.seen |= ProgramFlags::GPOS;
                self.escape_anchor(Opcode::Gpos)
            }
            'K' => {
                self.seen |= ProgramFlags::KEEP;
                self.escape_anchor(Opcode::Keep)
            }
            'b' | 'B' => self.parse_boundary(),
            'd' | 'D' | 'w' | 'W' | 's' | 'S' | 'h' | 'H' | 'v' | 'V' | 'p' | 'P' => {
                self.parse_shorthand_class(depth)
            }
            'N' if self.src.peek_nth(2) != Some('{') => {
                self.src.set_pos(start + 2);
                let at = self.push(Opcode::RegAny, 0)?;
                Ok(Piece::single(at))
            }
            'R' => {
                self.src.set_pos(start + 2);
                let at = self.push(Opcode::LineBreak, 0)?;
                Ok(Piece::new(at, 1, Some(2), PieceFlags::empty()))
            }
            'X' => {
                self.src.set_pos(start + 2);
                let at = self.push(Opcode::Clump, 0)?;
                Ok(Piece::new(at, 1, None, PieceFlags::empty()))
            }
            'g' => self.parse_g_reference(),
            'k' => self.parse_k_reference(),
            '1'..='9' => match self.digit_escape(start) {
                DigitEscape::Backref(n) => {
                    let end = start + 1 + digits_len(&self.src.rest()[1..]);
                    self.src.set_pos(end);
                    self.numbered_ref(n, start, end)
                }
                DigitEscape::Octal => self.parse_literal_run(),
            },
            _ => self.parse_literal_run(),
        }
    }

    fn escape_anchor(&mut self, op: Opcode) -> PResult<Piece> {
        let pos = self.src.pos();
        self.src.set_pos(pos + 2);
        self.zero_width(op, 0)
    }

    /// `\b`, `\B`, and the `\b{..}` flavors.
    fn parse_boundary(&mut self) -> PResult<Piece> {
        let start = self.src.pos();
        self.src.bump();
        let op = match self.src.bump() {
            Some('B') => Opcode::NBound,
            _ => Opcode::Bound,
        };
        let mut kind = BoundKind::Word;
        if self.src.eat('{') {
            let name_start = self.src.pos();
            let Some(name) = self.src.eat_until('}') else {
                let end = self.src.text().len();
                return Err(self.error_msg(
                    DiagnosticKind::UnterminatedConstruct,
                    start,
                    end,
                    "`\\b{` is missing its closing `}`",
                ));
            };
            let name = name.trim().to_string();
            kind = match BoundKind::from_name(&name) {
                Some(kind) => kind,
                None => {
                    let end = self.src.pos();
                    return Err(self.error_msg(
                        DiagnosticKind::InvalidEscape,
                        name_start,
                        end - 1,
                        format!("unknown boundary type `{name}`"),
                    ));
                }
            };
        }
        let charset = self.charset();
        if charset == Charset::Locale {
            self.seen |= ProgramFlags::LOCALE;
        }
        self.seen |= ProgramFlags::ZERO_LEN_ASSERT;
        self.zero_width(op, charset_flags(kind as u8, charset))
    }

    /// Decides whether `\<digits>` at `start` is a backreference. Single
    /// digits and numbers starting with 8 or 9 always are; longer numbers
    /// are backreferences only when that many groups exist.
    pub(crate) fn digit_escape(&mut self, start: usize) -> DigitEscape {
        let digits = &self.src.text()[start + 1..];
        let len = digits_len(digits);
        let text = &digits[..len];
        let num = parse_decimal(text);
        if len == 1 || text.starts_with(['8', '9']) {
            return DigitEscape::Backref(num);
        }
        match self.known.totals.as_ref().map(|t| t.logical) {
            Some(total) if num <= total => DigitEscape::Backref(num),
            Some(_) => DigitEscape::Octal,
            None if num <= self.groups.max_logical => DigitEscape::Backref(num),
            None => {
                self.needs_counts = true;
                DigitEscape::Octal
            }
        }
    }

    /// `\g1`, `\g-1`, `\g{1}`, `\g{-1}`, `\g{name}`.
    fn parse_g_reference(&mut self) -> PResult<Piece> {
        let start = self.src.pos();
        self.src.set_pos(start + 2);
        if self.src.eat('{') {
            let Some(body) = self.src.eat_until('}') else {
                let end = self.src.text().len();
                return Err(self.error_msg(
                    DiagnosticKind::UnterminatedConstruct,
                    start,
                    end,
                    "`\\g{` is missing its closing `}`",
                ));
            };
            let body = body.trim().to_string();
            let end = self.src.pos();
            return match parse_signed(&body) {
                Some(n) => self.signed_ref(n, start, end),
                None if is_group_name(&body) => self.named_ref(&body, start, end),
                None => Err(self.error_msg(
                    DiagnosticKind::InvalidGroupName,
                    start,
                    end,
                    format!("`{body}`"),
                )),
            };
        }
        let neg = self.src.eat('-');
        let digits = self.src.eat_while(|c| c.is_ascii_digit()).to_string();
        let end = self.src.pos();
        if digits.is_empty() {
            return Err(self.error_msg(
                DiagnosticKind::InvalidEscape,
                start,
                end,
                "`\\g` must be followed by a group number or `{name}`",
            ));
        }
        let n = parse_decimal(&digits) as i64;
        self.signed_ref(if neg { -n } else { n }, start, end)
    }

    /// `\k<name>`, `\k'name'`, `\k{name}`.
    fn parse_k_reference(&mut self) -> PResult<Piece> {
        let start = self.src.pos();
        self.src.set_pos(start + 2);
        let close = match self.src.bump() {
            Some('<') => '>',
            Some('\'') => '\'',
            Some('{') => '}',
            _ => {
                let end = self.src.pos();
                return Err(self.error_msg(
                    DiagnosticKind::InvalidEscape,
                    start,
                    end,
                    "`\\k` must be followed by `<name>`, `'name'` or `{name}`",
                ));
            }
        };
        let name = self.parse_group_name(close, start)?;
        let end = self.src.pos();
        self.named_ref(&name, start, end)
    }

    fn signed_ref(&mut self, n: i64, start: usize, end: usize) -> PResult<Piece> {
        if n > 0 {
            return self.numbered_ref(n as u32, start, end);
        }
        if n < 0 {
            let target = i64::from(self.groups.logical) + 1 + n;
            if target >= 1 {
                return self.numbered_ref(target as u32, start, end);
            }
        }
        Err(self.error_msg(
            DiagnosticKind::NonexistentGroup,
            start,
            end,
            n.to_string(),
        ))
    }

    /// A backreference by logical number.
    pub(crate) fn numbered_ref(&mut self, n: u32, start: usize, end: usize) -> PResult<Piece> {
        match self.known.totals.as_ref().map(|t| t.logical) {
            Some(total) if n > total => {
                return Err(self.error_msg(
                    DiagnosticKind::NonexistentGroup,
                    start,
                    end,
                    n.to_string(),
                ));
            }
            Some(_) => {}
            None if n > self.groups.max_logical => self.needs_counts = true,
            None => {}
        }
        self.seen |= ProgramFlags::BACKREF;
        let at = if self.mode.fold {
            let flags = charset_flags(0, self.charset());
            self.push_arg1(Opcode::RefFold, flags, n)?
        } else {
            self.push_arg1(Opcode::Ref, 0, n)?
        };
        Ok(Piece::new(at, 0, None, PieceFlags::empty()))
    }

    /// A backreference by name; the operand is the name-table index.
    pub(crate) fn named_ref(&mut self, name: &str, start: usize, end: usize) -> PResult<Piece> {
        let index = self.name_index(name, start, end)?;
        self.seen |= ProgramFlags::BACKREF;
        let at = if self.mode.fold {
            let flags = charset_flags(0, self.charset());
            self.push_arg1(Opcode::RefNameFold, flags, index)?
        } else {
            self.push_arg1(Opcode::RefName, 0, index)?
        };
        Ok(Piece::new(at, 0, None, PieceFlags::empty()))
    }

    /// Name-table index of `name`. A name not seen yet is entered so the
    /// index stays stable, and the group count is requested.
    pub(crate) fn name_index(&mut self, name: &str, start: usize, end: usize) -> PResult<u32> {
        if let Some(totals) = &self.known.totals {
            let defined = totals.names.get(name).is_some_and(|l| !l.is_empty());
            if !defined {
                return Err(self.error_msg(DiagnosticKind::NonexistentName, start, end, name));
            }
        }
        let defined_here = self.groups.names.get(name).is_some_and(|l| !l.is_empty());
        if !defined_here && self.known.totals.is_none() {
            self.needs_counts = true;
        }
        let index = match self.groups.names.get_index_of(name) {
            Some(index) => index,
            None => self.groups.names.insert_full(name.to_string(), Vec::new()).0,
        };
        Ok(index as u32)
    }

    /// Reads a group name up to `close`, consuming both.
    pub(crate) fn parse_group_name(&mut self, close: char, construct: usize) -> PResult<String> {
        let name_start = self.src.pos();
        let name = self.src.eat_while(is_word_char).to_string();
        let name_end = self.src.pos();
        if !self.src.eat(close) {
            if self.src.is_eof() {
                let end = self.src.text().len();
                return Err(self.error_msg(
                    DiagnosticKind::UnterminatedConstruct,
                    construct,
                    end,
                    "group name is missing its terminator",
                ));
            }
            let end = self.src.pos() + self.src.peek().map_or(0, char::len_utf8);
            return Err(self.error_msg(
                DiagnosticKind::InvalidGroupName,
                name_start,
                end,
                format!("`{}`", self.src.slice(name_start, end)),
            ));
        }
        if !is_group_name(&name) {
            return Err(self.error(DiagnosticKind::InvalidGroupName, name_start, name_end));
        }
        Ok(name)
    }
}

pub(crate) fn is_group_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_word_char(c) && !c.is_ascii_digit() => chars.all(is_word_char),
        _ => false,
    }
}

fn digits_len(text: &str) -> usize {
    text.bytes().take_while(u8::is_ascii_digit).count()
}

fn parse_decimal(digits: &str) -> u32 {
    digits.bytes().fold(0u32, |acc, b| {
        acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
    })
}

fn parse_signed(text: &str) -> Option<i64> {
    let (neg, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n = i64::from(parse_decimal(digits));
    Some(if neg { -n } else { n })
}
