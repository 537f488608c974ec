//! Pattern parser.
//!
//! Three grammar levels (alternation, branch, piece) plus the atom level
//! recurse into each other and append nodes through the [`Emitter`] as they
//! go. Every grammar function returns [`PResult`]; the error side is the
//! [`Abort`] signal, the success side carries a [`Piece`] describing what
//! was emitted (start offset, length bounds, width flags).
//!
//! A pass either completes or aborts. Some aborts ask the driver in
//! `pattern.rs` to throw the pass away and run another one with more
//! knowledge (UTF-8 literals, wide links, total group count).

mod atom;
mod grammar;
mod group;
mod literal;
pub(crate) mod set_expr;
mod verbs;

pub(crate) use literal::{Escaped, fold_bounds};

#[cfg(test)]
mod tests;

use bitflags::bitflags;
use indexmap::IndexMap;
use regula_bytecode::{
    BITMAP_WORDS, Captures, Charset, ClassData, Encoding, LinkOverflow, Opcode, ProgramFlags,
    RestartKind,
};
use rowan::TextRange;

use crate::class::ClassTable;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::emit::Emitter;
use crate::options::CompileOptions;
use crate::source::Source;
use crate::trace::CompileTracer;

/// Largest program, in slots.
pub(crate) const MAX_PROGRAM_SLOTS: usize = 1 << 24;

/// Out-of-band signal of a grammar function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Abort {
    /// A diagnostic was pushed; nothing more to say.
    Reported,
    /// Throw the pass away and start over with more knowledge.
    Restart(RestartKind),
    RecursionLimit,
    TooLarge,
}

pub(crate) type PResult<T> = Result<T, Abort>;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub(crate) struct PieceFlags: u8 {
        /// Can consume input.
        const HAS_WIDTH = 1 << 0;
        /// One node matching exactly one character: a compact loop body.
        const SIMPLE = 1 << 1;
        /// Contents decided at match time (recursion, `(??{ })`).
        const POSTPONED = 1 << 2;
    }
}

/// What one grammar call emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Piece {
    pub start: usize,
    /// Length bounds in code points.
    pub min: usize,
    pub max: Option<usize>,
    pub flags: PieceFlags,
}

impl Piece {
    pub fn new(start: usize, min: usize, max: Option<usize>, flags: PieceFlags) -> Self {
        let mut flags = flags;
        flags.set(PieceFlags::HAS_WIDTH, max != Some(0));
        Self {
            start,
            min,
            max,
            flags,
        }
    }

    pub fn zero_width(start: usize) -> Self {
        Self::new(start, 0, Some(0), PieceFlags::empty())
    }

    /// One node matching exactly one character.
    pub fn single(start: usize) -> Self {
        Self::new(start, 1, Some(1), PieceFlags::SIMPLE)
    }

    pub fn postponed(start: usize) -> Self {
        Self::new(start, 0, None, PieceFlags::POSTPONED)
    }

    pub fn is_zero_width(&self) -> bool {
        self.max == Some(0)
    }

    /// `self` followed by `next`.
    pub fn then(self, next: Piece) -> Piece {
        let flags = (self.flags | next.flags) & PieceFlags::POSTPONED;
        Piece::new(
            self.start,
            self.min.saturating_add(next.min),
            add_max(self.max, next.max),
            flags,
        )
    }

    /// Either `self` or `other`.
    pub fn or(self, other: Piece) -> Piece {
        let flags = (self.flags | other.flags) & PieceFlags::POSTPONED;
        let max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        Piece::new(self.start, self.min.min(other.min), max, flags)
    }
}

pub(crate) fn add_max(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    Some(a?.saturating_add(b?))
}

/// Match modes in effect at the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Mode {
    pub fold: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub extended: bool,
    pub extended_more: bool,
    pub no_capture: bool,
    pub charset: Charset,
}

impl Mode {
    pub fn from_options(opts: &CompileOptions) -> Self {
        Self {
            fold: opts.fold,
            multiline: opts.multiline,
            dot_all: opts.dot_all,
            extended: opts.extended || opts.extended_more,
            extended_more: opts.extended_more,
            no_capture: opts.no_capture,
            charset: opts.charset,
        }
    }

    /// What `(?^)` resets to.
    pub fn caret() -> Self {
        Self {
            fold: false,
            multiline: false,
            dot_all: false,
            extended: false,
            extended_more: false,
            no_capture: false,
            charset: Charset::Depends,
        }
    }
}

/// Group counts learned from a complete earlier pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct GroupTotals {
    pub logical: u32,
    pub logical_to_physical: Vec<u32>,
    pub names: IndexMap<String, Vec<u32>>,
}

/// What the driver knows before a pass starts.
#[derive(Clone, Debug, Default)]
pub(crate) struct PassKnowledge {
    pub encoding: Encoding,
    pub totals: Option<GroupTotals>,
}

/// Capture numbering as groups are opened.
#[derive(Debug)]
pub(crate) struct GroupTable {
    pub physical: u32,
    /// Counter the next group's logical number is taken from. Branch reset
    /// rewinds it.
    pub logical: u32,
    pub max_logical: u32,
    physical_to_logical: Vec<u32>,
    logical_to_physical: Vec<u32>,
    next_physical: Vec<u32>,
    pub names: IndexMap<String, Vec<u32>>,
}

impl GroupTable {
    pub fn new(totals: Option<&GroupTotals>) -> Self {
        let mut names = IndexMap::new();
        if let Some(totals) = totals {
            for name in totals.names.keys() {
                names.insert(name.clone(), Vec::new());
            }
        }
        Self {
            physical: 0,
            logical: 0,
            max_logical: 0,
            physical_to_logical: vec![0],
            logical_to_physical: vec![0],
            next_physical: vec![0],
            names,
        }
    }

    /// Opens a group and returns its (physical, logical) numbers.
    pub fn open(&mut self) -> (u32, u32) {
        self.physical += 1;
        self.logical += 1;
        self.max_logical = self.max_logical.max(self.logical);
        let (p, l) = (self.physical, self.logical);
        self.physical_to_logical.push(l);
        self.next_physical.push(0);
        match self.logical_to_physical.get(l as usize).copied() {
            None => self.logical_to_physical.push(p),
            Some(first) => {
                let mut last = first;
                while self.next_physical[last as usize] != 0 {
                    last = self.next_physical[last as usize];
                }
                self.next_physical[last as usize] = p;
            }
        }
        (p, l)
    }

    pub fn add_name(&mut self, name: &str, logical: u32) {
        let entry = self.names.entry(name.to_string()).or_default();
        if !entry.contains(&logical) {
            entry.push(logical);
        }
    }

    /// First physical group carrying `logical`, if opened already.
    pub fn physical_of(&self, logical: u32) -> Option<u32> {
        self.logical_to_physical.get(logical as usize).copied()
    }

    pub fn totals(&self) -> GroupTotals {
        GroupTotals {
            logical: self.max_logical,
            logical_to_physical: self.logical_to_physical.clone(),
            names: self.names.clone(),
        }
    }

    pub fn into_captures(self) -> Captures {
        Captures {
            physical: self.physical,
            logical: self.max_logical,
            physical_to_logical: self.physical_to_logical,
            logical_to_physical: self.logical_to_physical,
            next_physical: self.next_physical,
            names: self.names,
        }
    }
}

/// A completed pass.
#[derive(Debug)]
pub(crate) struct Parsed {
    pub code: Vec<u32>,
    pub encoding: Encoding,
    pub flags: ProgramFlags,
    pub captures: Captures,
    pub classes: Vec<ClassData>,
    pub verb_args: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// A pass that stopped early.
#[derive(Debug)]
pub(crate) struct Interrupted {
    pub abort: Abort,
    pub diagnostics: Diagnostics,
    pub totals: GroupTotals,
}

pub(crate) struct Parser<'a, T: CompileTracer> {
    pub(crate) src: Source,
    pub(crate) opts: &'a CompileOptions,
    pub(crate) known: &'a PassKnowledge,
    pub(crate) tracer: &'a mut T,
    pub(crate) diag: Diagnostics,
    pub(crate) emit: Emitter,
    pub(crate) mode: Mode,
    pub(crate) seen: ProgramFlags,
    pub(crate) groups: GroupTable,
    pub(crate) classes: ClassTable,
    pub(crate) verb_args: Vec<String>,
    pub(crate) naughty: u32,
    /// A reference needs the total group count to be resolved.
    pub(crate) needs_counts: bool,
    /// While parsing synthesized text, diagnostics point here instead.
    pub(crate) substitution: Option<TextRange>,
    pub(crate) eval_tokens: u32,
}

/// Runs one pass over `text`.
pub(crate) fn run<T: CompileTracer>(
    text: &str,
    opts: &CompileOptions,
    known: &PassKnowledge,
    tracer: &mut T,
) -> Result<Parsed, Interrupted> {
    let mut parser = Parser::new(text, opts, known, tracer);
    match parser.parse_pattern() {
        Ok(()) => Ok(parser.finish()),
        Err(abort) => Err(Interrupted {
            abort,
            totals: parser.groups.totals(),
            diagnostics: parser.diag,
        }),
    }
}

impl<'a, T: CompileTracer> Parser<'a, T> {
    pub fn new(
        text: &str,
        opts: &'a CompileOptions,
        known: &'a PassKnowledge,
        tracer: &'a mut T,
    ) -> Self {
        Self {
            src: Source::new(text),
            opts,
            known,
            tracer,
            diag: Diagnostics::new(),
            emit: Emitter::new(known.encoding),
            mode: Mode::from_options(opts),
            seen: ProgramFlags::empty(),
            groups: GroupTable::new(known.totals.as_ref()),
            classes: ClassTable::default(),
            verb_args: Vec::new(),
            naughty: 0,
            needs_counts: false,
            substitution: None,
            eval_tokens: 0,
        }
    }

    fn parse_pattern(&mut self) -> PResult<()> {
        let alt = self.parse_alternation(0, false)?;
        if self.src.peek() == Some(')') {
            let pos = self.src.pos();
            return Err(self.error(DiagnosticKind::UnmatchedClose, pos, pos + 1));
        }
        let end = self.push(Opcode::End, 0)?;
        self.close_alternation(&alt, end)?;
        self.resolve_gosubs()?;
        if self.needs_counts && self.known.totals.is_none() {
            return Err(Abort::Restart(RestartKind::CountGroups));
        }
        Ok(())
    }

    fn finish(self) -> Parsed {
        let mut flags = self.seen;
        if self.naughty >= 10 {
            flags |= ProgramFlags::NAUGHTY;
        }
        let encoding = self.emit.encoding();
        Parsed {
            code: self.emit.into_code(),
            encoding,
            flags,
            captures: self.groups.into_captures(),
            classes: self.classes.into_entries(),
            verb_args: self.verb_args,
            diagnostics: self.diag,
        }
    }

    /// Fills in the target of every `GoSub` now that all groups are placed.
    fn resolve_gosubs(&mut self) -> PResult<()> {
        for i in 0..self.emit.gosubs.len() {
            let at = self.emit.gosubs[i];
            let physical = self.emit.node(at).arg1() as usize;
            let target = if physical == 0 {
                0
            } else {
                match self.emit.opens.get(physical).copied().flatten() {
                    Some(open) => open,
                    None => {
                        // Only reachable on a pass that is restarted anyway.
                        debug_assert!(self.needs_counts);
                        0
                    }
                }
            };
            self.emit.set_arg2(at, target as u32);
        }
        Ok(())
    }

    // Diagnostics

    pub(crate) fn span(&self, start: usize, end: usize) -> TextRange {
        self.substitution
            .unwrap_or_else(|| self.src.range(start, end.max(start)))
    }

    pub(crate) fn error(&mut self, kind: DiagnosticKind, start: usize, end: usize) -> Abort {
        let range = self.span(start, end);
        self.diag.report(kind, range).emit();
        Abort::Reported
    }

    pub(crate) fn error_msg(
        &mut self,
        kind: DiagnosticKind,
        start: usize,
        end: usize,
        msg: impl Into<String>,
    ) -> Abort {
        let range = self.span(start, end);
        self.diag.report(kind, range).message(msg).emit();
        Abort::Reported
    }

    pub(crate) fn warn(&mut self, kind: DiagnosticKind, start: usize, end: usize) {
        if kind.is_strict_only() && !self.opts.strict {
            return;
        }
        let range = self.span(start, end);
        self.diag.report(kind, range).emit();
    }

    pub(crate) fn warn_msg(
        &mut self,
        kind: DiagnosticKind,
        start: usize,
        end: usize,
        msg: impl Into<String>,
    ) {
        if kind.is_strict_only() && !self.opts.strict {
            return;
        }
        let range = self.span(start, end);
        self.diag.report(kind, range).message(msg).emit();
    }

    // Shared helpers

    /// Skips `(?#...)` comments, and whitespace and `#` comments under `x`.
    pub(crate) fn skip_ignorable(&mut self) -> PResult<()> {
        loop {
            if self.src.starts_with("(?#") {
                let start = self.src.pos();
                self.src.eat_str("(?#");
                if self.src.eat_until(')').is_none() {
                    let end = self.src.text().len();
                    return Err(self.error_msg(
                        DiagnosticKind::UnterminatedConstruct,
                        start,
                        end,
                        "comment",
                    ));
                }
                continue;
            }
            if !self.mode.extended {
                return Ok(());
            }
            match self.src.peek() {
                Some(c) if is_pattern_whitespace(c) => {
                    self.src.bump();
                }
                Some('#') => {
                    self.src.eat_while(|c| c != '\n');
                }
                _ => return Ok(()),
            }
        }
    }

    /// Requests the UTF-8 restart for a code point a narrow program can't hold.
    pub(crate) fn need_codepoint(&self, cp: u32) -> PResult<()> {
        if cp > 0xFF && !self.emit.encoding().utf8 {
            return Err(Abort::Restart(RestartKind::Upgrade));
        }
        Ok(())
    }

    /// Charset that actually applies: `d` means Unicode rules in a UTF-8
    /// program.
    pub(crate) fn charset(&self) -> Charset {
        match self.mode.charset {
            Charset::Depends if self.emit.encoding().utf8 => Charset::Unicode,
            other => other,
        }
    }

    pub(crate) fn enter(&mut self, depth: u32) -> PResult<u32> {
        if depth >= self.opts.max_depth {
            return Err(Abort::RecursionLimit);
        }
        Ok(depth + 1)
    }

    // Emission, with link overflow mapped to the wide-link restart

    fn overflow(&self, _: LinkOverflow) -> Abort {
        if self.emit.encoding().wide_links {
            Abort::TooLarge
        } else {
            Abort::Restart(RestartKind::WideLinks)
        }
    }

    fn check_size(&self) -> PResult<()> {
        if self.emit.len() > MAX_PROGRAM_SLOTS {
            return Err(Abort::TooLarge);
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, op: Opcode, flags: u8) -> PResult<usize> {
        let at = self.emit.push(op, flags);
        self.tracer.trace_emit(at, op);
        self.check_size()?;
        Ok(at)
    }

    pub(crate) fn push_arg1(&mut self, op: Opcode, flags: u8, arg: u32) -> PResult<usize> {
        let at = self.emit.push_arg1(op, flags, arg);
        self.tracer.trace_emit(at, op);
        self.check_size()?;
        Ok(at)
    }

    pub(crate) fn push_arg2(&mut self, op: Opcode, flags: u8, a: u32, b: u32) -> PResult<usize> {
        let at = self.emit.push_arg2(op, flags, a, b);
        self.tracer.trace_emit(at, op);
        self.check_size()?;
        Ok(at)
    }

    pub(crate) fn push_str(&mut self, op: Opcode, flags: u8, bytes: &[u8]) -> PResult<usize> {
        let at = self.emit.push_str(op, flags, bytes);
        self.tracer.trace_emit(at, op);
        self.check_size()?;
        Ok(at)
    }

    pub(crate) fn push_class(
        &mut self,
        flags: u8,
        aux: u32,
        bitmap: &[u32; BITMAP_WORDS],
    ) -> PResult<usize> {
        let at = self.emit.push_class(flags, aux, bitmap);
        self.tracer.trace_emit(at, Opcode::AnyOf);
        self.check_size()?;
        Ok(at)
    }

    pub(crate) fn insert(
        &mut self,
        at: usize,
        op: Opcode,
        flags: u8,
        operands: &[u32],
    ) -> PResult<()> {
        self.emit
            .insert(at, op, flags, operands)
            .map_err(|e| self.overflow(e))?;
        self.tracer.trace_insert(at, op);
        self.check_size()
    }

    pub(crate) fn link(&mut self, from: usize, to: usize) -> PResult<()> {
        self.emit.link(from, to).map_err(|e| self.overflow(e))
    }

    pub(crate) fn tail(&mut self, from: usize, to: usize) -> PResult<()> {
        self.emit.tail(from, to).map_err(|e| self.overflow(e))
    }

    pub(crate) fn tail_branches(&mut self, first: usize, to: usize) -> PResult<()> {
        self.emit
            .tail_branches(first, to)
            .map_err(|e| self.overflow(e))
    }

    pub(crate) fn verb_arg(&mut self, arg: &str) -> u32 {
        if let Some(i) = self.verb_args.iter().position(|a| a == arg) {
            return i as u32;
        }
        self.verb_args.push(arg.to_string());
        (self.verb_args.len() - 1) as u32
    }
}

/// Whitespace skipped under `x`.
pub(crate) fn is_pattern_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r' | ' ' | '\u{85}' | '\u{200E}' | '\u{200F}'
            | '\u{2028}' | '\u{2029}'
    )
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
