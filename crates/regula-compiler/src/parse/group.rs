//! Parenthesized constructs.

use regula_bytecode::{Charset, Opcode, ProgramFlags, UNBOUNDED, flag};

use super::grammar::Alternation;
use super::{Mode, PResult, Parser, Piece, PieceFlags, is_word_char};
use crate::diagnostics::DiagnosticKind;
use crate::trace::CompileTracer;

/// Longest lookbehind body, in code points.
const MAX_LOOKBEHIND: usize = 255;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Lookaround {
    Ahead,
    NotAhead,
    Behind,
    NotBehind,
}

impl<T: CompileTracer> Parser<'_, T> {
    /// A construct starting with `(`. `None` for a standalone modifier
    /// group such as `(?i)`.
    pub(crate) fn parse_group(&mut self, depth: u32) -> PResult<Option<Piece>> {
        let start = self.src.pos();
        let depth = self.enter(depth)?;
        self.src.bump();

        if self.src.eat('*') {
            return self.parse_verb(start, depth).map(Some);
        }
        if !self.src.eat('?') {
            return if self.mode.no_capture {
                self.non_capturing(start, depth, false).map(Some)
            } else {
                self.capture(start, depth, None).map(Some)
            };
        }

        let Some(c) = self.src.peek() else {
            let end = self.src.text().len();
            return Err(self.error(DiagnosticKind::UnmatchedOpen, start, end));
        };
        match c {
            ':' => {
                self.src.bump();
                self.non_capturing(start, depth, false).map(Some)
            }
            '|' => {
                self.src.bump();
                self.non_capturing(start, depth, true).map(Some)
            }
            '>' => {
                self.src.bump();
                self.atomic(start, depth).map(Some)
            }
            '=' => {
                self.src.bump();
                self.lookaround(start, depth, Lookaround::Ahead).map(Some)
            }
            '!' => {
                self.src.bump();
                self.lookaround(start, depth, Lookaround::NotAhead).map(Some)
            }
            '<' if self.src.peek_nth(1) == Some('=') => {
                self.src.set_pos(self.src.pos() + 2);
                self.lookaround(start, depth, Lookaround::Behind).map(Some)
            }
            '<' if self.src.peek_nth(1) == Some('!') => {
                self.src.set_pos(self.src.pos() + 2);
                self.lookaround(start, depth, Lookaround::NotBehind).map(Some)
            }
            '<' => {
                self.src.bump();
                let name = self.parse_group_name('>', start)?;
                self.capture(start, depth, Some(name)).map(Some)
            }
            '\'' => {
                self.src.bump();
                let name = self.parse_group_name('\'', start)?;
                self.capture(start, depth, Some(name)).map(Some)
            }
            'P' => self.python_group(start, depth).map(Some),
            '&' => {
                self.src.bump();
                let name = self.parse_group_name(')', start)?;
                let end = self.src.pos();
                self.named_recursion(&name, start, end).map(Some)
            }
            'R' | '0'..='9' | '+' => self.numbered_recursion(start).map(Some),
            '-' if self.src.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.numbered_recursion(start).map(Some)
            }
            '(' => self.conditional(start, depth).map(Some),
            '{' => self.callback(start, false, false).map(Some),
            '?' if self.src.peek_nth(1) == Some('{') => {
                self.src.bump();
                self.callback(start, true, false).map(Some)
            }
            '[' => self.parse_set_expression(start, depth).map(Some),
            _ => self.modifiers(start, depth),
        }
    }

    /// Body of a group up to and including its `)`. The mode in effect
    /// before the body is restored afterwards.
    pub(crate) fn group_body(&mut self, start: usize, depth: u32, reset: bool) -> PResult<Alternation> {
        let saved = self.mode;
        let alt = self.parse_alternation(depth, reset)?;
        self.mode = saved;
        self.expect_close(start)?;
        Ok(alt)
    }

    pub(crate) fn expect_close(&mut self, start: usize) -> PResult<()> {
        if self.src.eat(')') {
            return Ok(());
        }
        let end = self.src.text().len();
        Err(self.error_msg(
            DiagnosticKind::UnmatchedOpen,
            start,
            end,
            "the group is never closed",
        ))
    }

    fn capture(&mut self, start: usize, depth: u32, name: Option<String>) -> PResult<Piece> {
        let (physical, logical) = self.groups.open();
        self.emit.track_group(physical);
        if let Some(name) = &name {
            self.groups.add_name(name, logical);
        }
        let open = self.push_arg1(Opcode::Open, 0, physical)?;
        self.emit.opens[physical as usize] = Some(open);

        let alt = self.group_body(start, depth, false)?;

        let close = self.push_arg1(Opcode::Close, 0, physical)?;
        self.emit.closes[physical as usize] = Some(close);
        self.link(open, alt.piece.start)?;
        self.close_alternation(&alt, close)?;
        Ok(Piece::new(
            open,
            alt.piece.min,
            alt.piece.max,
            alt.piece.flags & PieceFlags::POSTPONED,
        ))
    }

    fn non_capturing(&mut self, start: usize, depth: u32, reset: bool) -> PResult<Piece> {
        let alt = self.group_body(start, depth, reset)?;
        self.join_alternatives(alt)
    }

    /// Joins the alternatives of a bracket-less alternation into a `Tail`.
    pub(crate) fn join_alternatives(&mut self, alt: Alternation) -> PResult<Piece> {
        if alt.branches == 1 {
            return Ok(alt.piece);
        }
        let tail = self.push(Opcode::Tail, 0)?;
        self.close_alternation(&alt, tail)?;
        Ok(Piece::new(
            alt.piece.start,
            alt.piece.min,
            alt.piece.max,
            alt.piece.flags & PieceFlags::POSTPONED,
        ))
    }

    pub(crate) fn atomic(&mut self, start: usize, depth: u32) -> PResult<Piece> {
        let suspend = self.push(Opcode::Suspend, 0)?;
        let alt = self.group_body(start, depth, false)?;
        let succeed = self.push(Opcode::Succeed, 0)?;
        self.close_alternation(&alt, succeed)?;
        let tail = self.push(Opcode::Tail, 0)?;
        self.link(suspend, tail)?;
        Ok(Piece::new(
            suspend,
            alt.piece.min,
            alt.piece.max,
            alt.piece.flags & PieceFlags::POSTPONED,
        ))
    }

    pub(crate) fn lookaround(&mut self, start: usize, depth: u32, kind: Lookaround) -> PResult<Piece> {
        let (op, behind) = match kind {
            Lookaround::Ahead => (Opcode::IfMatch, false),
            Lookaround::NotAhead => (Opcode::Unless, false),
            Lookaround::Behind => (Opcode::IfMatch, true),
            Lookaround::NotBehind => (Opcode::Unless, true),
        };
        self.seen |= ProgramFlags::ZERO_LEN_ASSERT;
        self.seen |= if behind {
            ProgramFlags::LOOKBEHIND
        } else {
            ProgramFlags::LOOKAHEAD
        };

        self.skip_ignorable()?;
        if self.src.eat(')') {
            let op = if op == Opcode::IfMatch {
                Opcode::Nothing
            } else {
                Opcode::OpFail
            };
            let at = self.push(op, 0)?;
            return Ok(Piece::zero_width(at));
        }

        let flags = if behind { flag::BEHIND } else { 0 };
        let at = self.push_arg2(op, flags, 0, 0)?;
        let alt = self.group_body(start, depth, false)?;
        let end = self.src.pos();
        if behind {
            match alt.piece.max {
                None => return Err(self.error(DiagnosticKind::LookbehindUnbounded, start, end)),
                Some(max) if max > MAX_LOOKBEHIND => {
                    return Err(self.error(DiagnosticKind::LookbehindTooLong, start, end));
                }
                Some(_) => {}
            }
        }
        let succeed = self.push(Opcode::Succeed, 0)?;
        self.close_alternation(&alt, succeed)?;
        let tail = self.push(Opcode::Tail, 0)?;
        self.link(at, tail)?;
        self.emit.set_arg1(at, clamp_len(alt.piece.min));
        self.emit
            .set_arg2(at, alt.piece.max.map_or(UNBOUNDED, clamp_len));
        Ok(Piece::zero_width(at))
    }

    /// `(?P<name>..)`, `(?P=name)`, `(?P>name)`.
    fn python_group(&mut self, start: usize, depth: u32) -> PResult<Piece> {
        self.src.bump();
        match self.src.bump() {
            Some('<') => {
                let name = self.parse_group_name('>', start)?;
                self.capture(start, depth, Some(name))
            }
            Some('=') => {
                let name = self.parse_group_name(')', start)?;
                let end = self.src.pos();
                self.named_ref(&name, start, end)
            }
            Some('>') => {
                let name = self.parse_group_name(')', start)?;
                let end = self.src.pos();
                self.named_recursion(&name, start, end)
            }
            _ => {
                let end = self.src.pos();
                Err(self.error(DiagnosticKind::UnknownGroupConstruct, start, end))
            }
        }
    }

    // Recursion

    /// `(?R)`, `(?0)`, `(?N)`, `(?+N)`, `(?-N)`.
    fn numbered_recursion(&mut self, start: usize) -> PResult<Piece> {
        let whole = self.src.eat('R');
        let sign = if whole {
            0
        } else if self.src.eat('+') {
            1
        } else if self.src.eat('-') {
            -1
        } else {
            0
        };
        let digits = self.src.eat_while(|c| c.is_ascii_digit()).to_string();
        if !self.src.eat(')') || whole != digits.is_empty() {
            let end = self.src.pos() + self.src.peek().map_or(0, char::len_utf8);
            return Err(self.error(DiagnosticKind::UnknownGroupConstruct, start, end));
        }
        let end = self.src.pos();
        if whole {
            return self.emit_gosub(0);
        }
        let n = digits.parse::<i64>().unwrap_or(i64::MAX);
        let logical = match sign {
            1 => i64::from(self.groups.logical) + n,
            -1 => i64::from(self.groups.logical) + 1 - n,
            _ => n,
        };
        if (sign != 0 && n == 0) || logical < 0 || logical > i64::from(u32::MAX) {
            return Err(self.error_msg(
                DiagnosticKind::NonexistentGroup,
                start,
                end,
                self.src.slice(start + 2, end - 1).to_string(),
            ));
        }
        if logical == 0 {
            return self.emit_gosub(0);
        }
        let physical = self.physical_for(logical as u32, start, end)?;
        self.emit_gosub(physical)
    }

    fn named_recursion(&mut self, name: &str, start: usize, end: usize) -> PResult<Piece> {
        let first_logical = match &self.known.totals {
            Some(totals) => totals.names.get(name).and_then(|l| l.first().copied()),
            None => self.groups.names.get(name).and_then(|l| l.first().copied()),
        };
        let physical = match first_logical {
            Some(logical) => self.physical_for(logical, start, end)?,
            None if self.known.totals.is_some() => {
                return Err(self.error_msg(DiagnosticKind::NonexistentName, start, end, name));
            }
            None => {
                self.needs_counts = true;
                0
            }
        };
        self.emit_gosub(physical)
    }

    /// First physical group of `logical`. Groups not opened yet need the
    /// totals of a complete pass.
    fn physical_for(&mut self, logical: u32, start: usize, end: usize) -> PResult<u32> {
        if let Some(totals) = &self.known.totals {
            return match totals.logical_to_physical.get(logical as usize) {
                Some(&p) if logical <= totals.logical => Ok(p),
                _ => Err(self.error_msg(
                    DiagnosticKind::NonexistentGroup,
                    start,
                    end,
                    logical.to_string(),
                )),
            };
        }
        match self.groups.physical_of(logical) {
            Some(p) => Ok(p),
            None => {
                self.needs_counts = true;
                Ok(0)
            }
        }
    }

    fn emit_gosub(&mut self, physical: u32) -> PResult<Piece> {
        self.seen |= ProgramFlags::RECURSION;
        let at = self.push_arg2(Opcode::GoSub, 0, physical, 0)?;
        self.emit.gosubs.push(at);
        Ok(Piece::postponed(at))
    }

    // Callbacks

    /// `(?{ .. })` and `(??{ .. })`; the cursor is on the `{`. The body is
    /// recorded, never parsed.
    fn callback(&mut self, start: usize, postponed: bool, condition: bool) -> PResult<Piece> {
        let body_start = self.src.pos() + 1;
        let mut depth = 0usize;
        let mut body_end = None;
        for (i, c) in self.src.rest().char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        body_end = Some(self.src.pos() + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(body_end) = body_end else {
            let end = self.src.text().len();
            return Err(self.error_msg(
                DiagnosticKind::UnterminatedConstruct,
                start,
                end,
                "code block is never closed",
            ));
        };
        self.src.set_pos(body_end + 1);
        if !self.src.eat(')') {
            let end = self.src.pos();
            return Err(self.error_msg(
                DiagnosticKind::UnterminatedConstruct,
                start,
                end,
                "code block must be followed by `)`",
            ));
        }
        let end = self.src.pos();
        let body = self.src.slice(body_start, body_end).to_string();
        let token = match &self.opts.callbacks {
            Some(hook) => hook.register(self.src.range(start, end), &body, postponed),
            None => {
                let token = self.eval_tokens;
                self.eval_tokens += 1;
                token
            }
        };

        let mut flags = 0;
        if postponed {
            flags |= flag::POSTPONED;
        }
        if condition {
            flags |= flag::CONDITION;
        }
        self.seen |= ProgramFlags::EVAL;
        let at = self.push_arg1(Opcode::Eval, flags, token)?;
        Ok(if postponed {
            Piece::postponed(at)
        } else {
            Piece::zero_width(at)
        })
    }

    // Conditionals

    /// `(?(cond)yes|no)`; the cursor is on the condition's `(`.
    fn conditional(&mut self, start: usize, depth: u32) -> PResult<Piece> {
        self.seen |= ProgramFlags::CONDITIONAL;
        let cond_start = self.src.pos();
        let (cond, define) = self.condition(start, depth)?;
        let cond_end = self.src.pos();

        let saved = self.mode;
        let yes = self.push(Opcode::IfThen, 0)?;
        self.tail(cond, yes)?;
        let (yes_piece, _) = self.parse_branch(depth)?;

        let mut no = None;
        if self.src.eat('|') {
            if define {
                self.mode = saved;
                return Err(self.error(DiagnosticKind::DefineWithBranches, start, self.src.pos()));
            }
            let n = self.push(Opcode::IfThen, 0)?;
            let (no_piece, _) = self.parse_branch(depth)?;
            no = Some((n, no_piece));
            if self.src.peek() == Some('|') {
                let pos = self.src.pos();
                self.mode = saved;
                return Err(self.error_msg(
                    DiagnosticKind::TooManyBranches,
                    cond_start,
                    pos + 1,
                    self.src.slice(cond_start, cond_end).to_string(),
                ));
            }
        }
        self.mode = saved;
        self.expect_close(start)?;

        let tail = self.push(Opcode::Tail, 0)?;
        let body = self.emit.node(yes).after();
        self.tail(body, tail)?;
        let piece = match no {
            Some((n, no_piece)) => {
                self.link(yes, n)?;
                let body = self.emit.node(n).after();
                self.tail(body, tail)?;
                self.link(n, tail)?;
                yes_piece.or(no_piece)
            }
            None => {
                self.link(yes, tail)?;
                yes_piece.or(Piece::zero_width(yes))
            }
        };
        if define {
            return Ok(Piece::zero_width(cond));
        }
        Ok(Piece::new(
            cond,
            piece.min,
            piece.max,
            piece.flags & PieceFlags::POSTPONED,
        ))
    }

    /// Emits the condition node(s). Returns their start and whether this
    /// is `(DEFINE)`.
    fn condition(&mut self, start: usize, depth: u32) -> PResult<(usize, bool)> {
        let paren = self.src.pos();
        self.src.bump();
        let Some(c) = self.src.peek() else {
            let end = self.src.text().len();
            return Err(self.error(DiagnosticKind::UnmatchedOpen, start, end));
        };

        match c {
            '?' | '*' => {
                self.src.set_pos(paren);
                let at = self.emit.len();
                match (c, self.src.peek_nth(2)) {
                    ('?', Some('{')) => {
                        self.src.set_pos(paren + 2);
                        self.callback(paren, false, true)?;
                    }
                    ('?', Some('=' | '!' | '<')) | ('*', _) => {
                        self.parse_group(depth)?;
                    }
                    _ => return Err(self.unknown_condition(paren)),
                }
                let op = self.emit.opcode(at);
                if !matches!(op, Opcode::IfMatch | Opcode::Unless | Opcode::Eval | Opcode::Nothing | Opcode::OpFail) {
                    return Err(self.unknown_condition(paren));
                }
                Ok((at, false))
            }
            '0'..='9' | '+' | '-' => {
                let sign = match c {
                    '+' => 1,
                    '-' => -1,
                    _ => 0,
                };
                if sign != 0 {
                    self.src.bump();
                }
                let digits = self.src.eat_while(|c| c.is_ascii_digit()).to_string();
                if digits.is_empty() || !self.src.eat(')') {
                    return Err(self.unknown_condition(paren));
                }
                let end = self.src.pos();
                let n = digits.parse::<i64>().unwrap_or(i64::MAX);
                let logical = match sign {
                    1 => i64::from(self.groups.logical) + n,
                    -1 => i64::from(self.groups.logical) + 1 - n,
                    _ => n,
                };
                if logical <= 0 || logical > i64::from(u32::MAX) {
                    return Err(self.error_msg(
                        DiagnosticKind::NonexistentGroup,
                        paren,
                        end,
                        self.src.slice(paren + 1, end - 1).to_string(),
                    ));
                }
                self.check_group_exists(logical as u32, paren, end)?;
                let at = self.push_arg1(Opcode::GroupP, 0, logical as u32)?;
                Ok((at, false))
            }
            '<' | '\'' => {
                self.src.bump();
                let close = if c == '<' { '>' } else { '\'' };
                let name = self.parse_group_name(close, paren)?;
                if !self.src.eat(')') {
                    return Err(self.unknown_condition(paren));
                }
                let end = self.src.pos();
                let index = self.name_index(&name, paren, end)?;
                let at = self.push_arg1(Opcode::GroupPName, 0, index)?;
                Ok((at, false))
            }
            _ => {
                let word = self.src.eat_while(|c| is_word_char(c) || c == '&').to_string();
                if !self.src.eat(')') {
                    return Err(self.unknown_condition(paren));
                }
                let end = self.src.pos();
                if word == "DEFINE" {
                    let at = self.push(Opcode::DefineP, 0)?;
                    return Ok((at, true));
                }
                if word == "R" {
                    let at = self.push_arg1(Opcode::InSubP, 0, 0)?;
                    return Ok((at, false));
                }
                if let Some(name) = word.strip_prefix("R&") {
                    let index = self.name_index(name, paren, end)?;
                    let at = self.push_arg1(Opcode::InSubP, flag::NAMED, index)?;
                    return Ok((at, false));
                }
                if let Some(digits) = word.strip_prefix('R')
                    && !digits.is_empty()
                    && digits.bytes().all(|b| b.is_ascii_digit())
                {
                    let n = digits.parse::<u32>().unwrap_or(u32::MAX);
                    self.check_group_exists(n, paren, end)?;
                    let at = self.push_arg1(Opcode::InSubP, 0, n)?;
                    return Ok((at, false));
                }
                if super::atom::is_group_name(&word) {
                    let index = self.name_index(&word, paren, end)?;
                    let at = self.push_arg1(Opcode::GroupPName, 0, index)?;
                    return Ok((at, false));
                }
                Err(self.unknown_condition(paren))
            }
        }
    }

    fn unknown_condition(&mut self, paren: usize) -> super::Abort {
        let end = self.src.rest().find(')').map_or(self.src.text().len(), |i| self.src.pos() + i + 1);
        self.error(DiagnosticKind::UnknownConditional, paren, end)
    }

    fn check_group_exists(&mut self, logical: u32, start: usize, end: usize) -> PResult<()> {
        match self.known.totals.as_ref().map(|t| t.logical) {
            Some(total) if logical > total => Err(self.error_msg(
                DiagnosticKind::NonexistentGroup,
                start,
                end,
                logical.to_string(),
            )),
            Some(_) => Ok(()),
            None => {
                if logical > self.groups.max_logical {
                    self.needs_counts = true;
                }
                Ok(())
            }
        }
    }

    // Modifiers

    /// `(?flags)` and `(?flags:...)`; the cursor is after `?`.
    fn modifiers(&mut self, start: usize, depth: u32) -> PResult<Option<Piece>> {
        let mut mode = self.mode;
        let mut negate = false;
        let mut charset_seen = false;
        let mut first = true;

        if self.src.eat('^') {
            mode = Mode::caret();
            first = false;
        }

        loop {
            let pos = self.src.pos();
            let Some(c) = self.src.bump() else {
                let end = self.src.text().len();
                return Err(self.error(DiagnosticKind::UnmatchedOpen, start, end));
            };
            match c {
                ')' => {
                    self.mode = mode;
                    return Ok(None);
                }
                ':' => {
                    let saved = self.mode;
                    self.mode = mode;
                    let alt = self.parse_alternation(depth, false);
                    self.mode = saved;
                    let alt = alt?;
                    self.expect_close(start)?;
                    return self.join_alternatives(alt).map(Some);
                }
                '-' if !negate => negate = true,
                'i' => mode.fold = !negate,
                'm' => mode.multiline = !negate,
                's' => mode.dot_all = !negate,
                'n' => mode.no_capture = !negate,
                'x' => {
                    let more = self.src.eat('x');
                    mode.extended = !negate;
                    mode.extended_more = !negate && more;
                }
                'a' | 'u' | 'l' | 'd' => {
                    let double = c == 'a' && self.src.eat('a');
                    let end = self.src.pos();
                    if negate {
                        return Err(self.error_msg(
                            DiagnosticKind::ModifierNotNegatable,
                            pos,
                            end,
                            self.src.slice(pos, end).to_string(),
                        ));
                    }
                    if charset_seen {
                        return Err(self.error(DiagnosticKind::ModifierConflict, pos, end));
                    }
                    charset_seen = true;
                    mode.charset = match (c, double) {
                        ('a', true) => Charset::AsciiStrict,
                        ('a', false) => Charset::Ascii,
                        ('u', _) => Charset::Unicode,
                        ('l', _) => Charset::Locale,
                        _ => Charset::Depends,
                    };
                }
                'p' => {
                    self.warn_msg(DiagnosticKind::UselessModifier, pos, pos + 1, "p");
                }
                'g' | 'c' | 'o' | 'e' | 'r' => {
                    return Err(self.error_msg(
                        DiagnosticKind::UnknownModifier,
                        pos,
                        pos + 1,
                        c.to_string(),
                    ));
                }
                _ if first => {
                    let end = pos + c.len_utf8();
                    return Err(self.error(DiagnosticKind::UnknownGroupConstruct, start, end));
                }
                _ => {
                    let end = pos + c.len_utf8();
                    return Err(self.error_msg(
                        DiagnosticKind::UnknownModifier,
                        pos,
                        end,
                        c.to_string(),
                    ));
                }
            }
            first = false;
        }
    }
}

fn clamp_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(UNBOUNDED - 1).min(UNBOUNDED - 1)
}
