//! Character class engine.
//!
//! Bracket classes, shorthand classes and properties are first collected
//! into a [`ClassBuilder`], which keeps plain members, POSIX members and
//! property members apart because charset and fold rules treat them
//! differently. The builder is then resolved into one static set plus the
//! parts that can only be decided at match time (UTF-8 target, locale,
//! user-defined property), and the cheapest node that expresses the result
//! is emitted.
//!
//! A class containing a character whose fold is several characters long
//! becomes an alternation, see [`Parser::emit_multi_fold_class`].

mod bracket;
mod posix;
mod property;

#[cfg(test)]
mod class_tests;

use std::collections::HashMap;

use regula_bytecode::{
    BITMAP_WORDS, Charset, ClassData, DeferredProperty, NO_AUX, Opcode, ProgramFlags,
    charset_flags, flag,
};
use regula_core::{CodepointSet, MAX_CODEPOINT, PosixClass};

pub(crate) use bracket::ClassItem;

use crate::parse::{PResult, Parser, Piece, PieceFlags};
use crate::source::Source;
use crate::trace::CompileTracer;

/// Members of a class as they are parsed.
#[derive(Debug, Clone)]
pub(crate) struct ClassBuilder {
    /// Source offset of the class.
    pub start: usize,
    pub negated: bool,
    plain: CodepointSet,
    /// Plain members that came from ranges.
    ranges: CodepointSet,
    /// Plain members given as single characters.
    singles: Vec<u32>,
    posix: CodepointSet,
    property: CodepointSet,
    utf8_only: CodepointSet,
    locale_classes: Vec<(PosixClass, bool)>,
    pub deferred: Option<DeferredProperty>,
    /// Named sequences and multi-character folds.
    pub multi: Vec<Vec<u32>>,
    /// The last POSIX element; only meaningful when it is the only element.
    sole_posix: Option<(PosixClass, bool)>,
    pub elements: usize,
}

impl ClassBuilder {
    pub fn new(start: usize) -> Self {
        Self {
            start,
            negated: false,
            plain: CodepointSet::new(),
            ranges: CodepointSet::new(),
            singles: Vec::new(),
            posix: CodepointSet::new(),
            property: CodepointSet::new(),
            utf8_only: CodepointSet::new(),
            locale_classes: Vec::new(),
            deferred: None,
            multi: Vec::new(),
            sole_posix: None,
            elements: 0,
        }
    }

    /// A class holding exactly `set`, already final.
    pub fn from_set(start: usize, set: CodepointSet) -> Self {
        let mut b = Self::new(start);
        b.add_set(set);
        b
    }

    pub fn add_char(&mut self, cp: u32) {
        self.plain.add(cp);
        self.singles.push(cp);
        self.elements += 1;
    }

    pub fn add_range(&mut self, lo: u32, hi: u32) {
        self.plain.add_range(lo, hi);
        self.ranges.add_range(lo, hi);
        self.elements += 1;
    }

    pub fn add_sequence(&mut self, cps: Vec<u32>) {
        self.multi.push(cps);
        self.elements += 1;
    }

    /// Members that are final: no charset or fold rule applies to them.
    pub fn add_set(&mut self, set: CodepointSet) {
        self.property.extend(&set);
        self.elements += 1;
    }

    fn has_member(&self, cp: u32) -> bool {
        self.plain.contains(cp)
            || self.posix.contains(cp)
            || self.property.contains(cp)
            || self.utf8_only.contains(cp)
    }
}

/// A class reduced to a static set plus match-time conditions.
#[derive(Debug)]
struct Resolved {
    set: CodepointSet,
    /// The static set is already complemented; the conditional parts
    /// exclude rather than include.
    inverted: bool,
    utf8_only: CodepointSet,
    locale_classes: Vec<(PosixClass, bool)>,
    deferred: Option<DeferredProperty>,
    /// Members below 256 fold by the run-time locale.
    locale_fold: bool,
    sole_posix: Option<(PosixClass, bool)>,
}

impl Resolved {
    fn has_conditions(&self) -> bool {
        !self.utf8_only.is_empty()
            || !self.locale_classes.is_empty()
            || self.deferred.is_some()
            || self.locale_fold
    }
}

/// Side table of class nodes, deduplicated by content.
#[derive(Debug, Default)]
pub(crate) struct ClassTable {
    entries: Vec<ClassData>,
    by_checksum: HashMap<u32, Vec<u32>>,
}

impl ClassTable {
    /// Index of an entry equal to `data`, adding it if there is none.
    pub fn intern(&mut self, data: ClassData) -> u32 {
        let key = checksum(&data);
        if let Some(found) = self.by_checksum.get(&key).and_then(|candidates| {
            candidates
                .iter()
                .copied()
                .find(|&i| self.entries[i as usize] == data)
        }) {
            return found;
        }
        let index = self.entries.len() as u32;
        self.entries.push(data);
        self.by_checksum.entry(key).or_default().push(index);
        index
    }

    pub fn into_entries(self) -> Vec<ClassData> {
        self.entries
    }
}

fn checksum(data: &ClassData) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for set in [&data.above, &data.utf8_only] {
        for word in set.to_words() {
            hasher.update(&word.to_le_bytes());
        }
        hasher.update(&[0xFF]);
    }
    for &(class, negated) in &data.locale_classes {
        hasher.update(&[class as u8, u8::from(negated)]);
    }
    if let Some(deferred) = &data.deferred {
        hasher.update(deferred.name.as_bytes());
        hasher.update(&[u8::from(deferred.negated)]);
    }
    hasher.finalize()
}

/// Base and mask of a set that is every combination of a few bits over a
/// common base, e.g. `[Aa]` or `[0246]`.
pub(crate) fn bitmask(set: &CodepointSet, max_points: u64) -> Option<(u32, u32)> {
    let len = set.len();
    if !(2..=max_points).contains(&len) || set.max()? > 0xFF {
        return None;
    }
    let base = set.min()?;
    let diff = set.iter().fold(0u32, |acc, cp| acc | (cp ^ base));
    (1u64 << diff.count_ones() == len).then_some((base, !diff & 0xFF))
}

pub(crate) fn bitmap_of(set: &CodepointSet) -> [u32; BITMAP_WORDS] {
    let mut bits = [0u32; BITMAP_WORDS];
    for &(lo, hi) in set.ranges() {
        if lo > 0xFF {
            break;
        }
        for cp in lo..=hi.min(0xFF) {
            bits[(cp >> 5) as usize] |= 1 << (cp & 31);
        }
    }
    bits
}

impl<T: CompileTracer> Parser<'_, T> {
    /// Adds a POSIX class (or `\d`, `\w`, `\s`) under the charset in effect.
    pub(crate) fn add_posix_class(&mut self, b: &mut ClassBuilder, class: PosixClass, negated: bool) {
        let class = if self.mode.fold {
            class.under_fold()
        } else {
            class
        };
        let data = self.opts.unicode.clone();
        match self.charset() {
            Charset::Unicode => {
                let set = data.posix_class(class, false);
                b.posix.extend(&complement_if(set, negated));
            }
            Charset::Ascii | Charset::AsciiStrict => {
                b.posix.extend(&complement_if(class.ascii_set(), negated));
            }
            Charset::Locale => {
                let set = complement_if(data.posix_class(class, false), negated);
                let (_, above) = set.split_at(0x100);
                b.posix.extend(&above);
                b.locale_classes.push((class, negated));
                self.seen |= ProgramFlags::LOCALE;
            }
            Charset::Depends if negated => {
                b.posix
                    .extend(&data.posix_class(class, false).complement());
            }
            Charset::Depends => {
                let set = data.posix_class(class, false);
                let (low, above) = set.split_at(0x100);
                let (ascii, latin1) = low.split_at(0x80);
                b.posix.extend(&ascii);
                b.posix.extend(&above);
                b.utf8_only.extend(&latin1);
            }
        }
        b.sole_posix = Some((class, negated));
        b.elements += 1;
    }

    /// Adds a property provided by the data service, such as `horizspace`.
    pub(crate) fn add_named_property(&mut self, b: &mut ClassBuilder, name: &str, negated: bool) {
        let set = match self.opts.unicode.property(name, None) {
            regula_core::PropertyLookup::Found { set, .. } => set,
            _ => CodepointSet::new(),
        };
        b.add_set(complement_if(set, negated));
    }

    /// Emits the node(s) for a finished class.
    pub(crate) fn finish_class(&mut self, mut b: ClassBuilder, depth: u32) -> PResult<Piece> {
        if let Some(cp) = self.fold_literal(&b) {
            let at = self.emit.len();
            let piece = self.emit_literal(&[cp], true)?;
            let set = self.opts.unicode.simple_folds(cp);
            self.tracer.trace_class(b.start, &set, self.emit.opcode(at));
            return Ok(piece);
        }
        self.extract_multi_folds(&mut b);
        if !b.multi.is_empty() {
            return self.emit_multi_fold_class(b, depth);
        }
        let start = b.start;
        let resolved = self.resolve_class(b);
        self.emit_resolved(start, resolved)
    }

    /// The set of a class used as an operand of a set expression, where
    /// Unicode rules always apply.
    pub(crate) fn raw_set(&mut self, b: ClassBuilder, end: usize) -> PResult<CodepointSet> {
        let start = b.start;
        if !b.multi.is_empty() {
            return Err(self.error_msg(
                crate::diagnostics::DiagnosticKind::InvalidSetExpression,
                start,
                end,
                "multi-character sequences can't be combined",
            ));
        }
        if b.deferred.is_some() {
            return Err(self.error_msg(
                crate::diagnostics::DiagnosticKind::InvalidSetExpression,
                start,
                end,
                "user-defined properties can't be combined",
            ));
        }
        Ok(self.resolve_class(b).set)
    }

    /// `[x]` under `i` for a single folding character: a folded literal
    /// does the same job in one node.
    fn fold_literal(&self, b: &ClassBuilder) -> Option<u32> {
        if !self.mode.fold
            || b.negated
            || b.elements != 1
            || b.deferred.is_some()
            || !b.multi.is_empty()
        {
            return None;
        }
        let &[cp] = b.singles.as_slice() else {
            return None;
        };
        let data = &self.opts.unicode;
        let usable = (cp <= 0xFF || self.emit.encoding().utf8)
            && !(0xD800..=0xDFFF).contains(&cp)
            && data.multi_char_fold(cp).is_none()
            && self.folds(cp);
        usable.then_some(cp)
    }

    /// Moves single characters with a multi-character fold to the
    /// sequence list.
    fn extract_multi_folds(&self, b: &mut ClassBuilder) {
        let charset = self.charset();
        if !self.mode.fold || b.negated || charset == Charset::AsciiStrict {
            return;
        }
        let data = self.opts.unicode.clone();
        let singles = std::mem::take(&mut b.singles);
        for cp in singles {
            if charset == Charset::Locale && cp < 0x100 {
                b.singles.push(cp);
                continue;
            }
            match data.multi_char_fold(cp) {
                Some(fold) if !b.ranges.contains(cp) => {
                    b.plain = b.plain.difference(&CodepointSet::single(cp));
                    if !b.multi.iter().any(|m| m.as_slice() == fold) {
                        b.multi.push(fold.to_vec());
                    }
                }
                _ => b.singles.push(cp),
            }
        }
    }

    fn fold_plain(&mut self, b: &mut ClassBuilder) -> bool {
        let data = self.opts.unicode.clone();
        let plain = std::mem::take(&mut b.plain);
        let mut locale_fold = false;
        b.plain = match self.charset() {
            Charset::Unicode | Charset::Ascii => data.fold_closure(&plain),
            Charset::AsciiStrict => {
                let (ascii, rest) = plain.split_at(0x80);
                let (ascii_folds, _) = data.fold_closure(&ascii).split_at(0x80);
                let (_, rest_folds) = data.fold_closure(&rest).split_at(0x80);
                plain.union(&ascii_folds).union(&rest_folds)
            }
            Charset::Locale => {
                let (low, high) = plain.split_at(0x100);
                if !low.is_empty() {
                    locale_fold = true;
                    self.seen |= ProgramFlags::LOCALE;
                }
                low.union(&data.fold_closure(&high))
            }
            Charset::Depends => {
                let added = data.fold_closure(&plain).difference(&plain);
                let (low, above) = added.split_at(0x100);
                let (ascii, latin1) = low.split_at(0x80);
                b.utf8_only.extend(&latin1);
                plain.union(&ascii).union(&above)
            }
        };
        locale_fold
    }

    fn resolve_class(&mut self, mut b: ClassBuilder) -> Resolved {
        let locale_fold = if self.mode.fold {
            self.fold_plain(&mut b)
        } else {
            false
        };
        let mut set = b.plain.union(&b.posix).union(&b.property);
        let mut utf8_only = b.utf8_only.difference(&set);
        if b.deferred.is_some() {
            self.seen |= ProgramFlags::DEFERRED;
        }
        let sole_posix = if b.elements == 1 && b.deferred.is_none() {
            b.sole_posix.map(|(class, negated)| (class, negated != b.negated))
        } else {
            None
        };

        let mut r = Resolved {
            set: CodepointSet::new(),
            inverted: false,
            utf8_only: CodepointSet::new(),
            locale_classes: b.locale_classes,
            deferred: b.deferred,
            locale_fold,
            sole_posix,
        };
        let conditional = !utf8_only.is_empty()
            || !r.locale_classes.is_empty()
            || r.deferred.is_some()
            || r.locale_fold;
        if b.negated {
            set = set.complement();
            r.inverted = conditional;
        }
        if r.inverted {
            utf8_only = utf8_only.intersection(&set);
        }
        r.set = set;
        r.utf8_only = utf8_only;
        r
    }

    fn emit_resolved(&mut self, pos: usize, r: Resolved) -> PResult<Piece> {
        let charset = self.charset();
        let data_max = self.opts.tuning.bitmask_max_points;
        let utf8 = self.emit.encoding().utf8;

        if let Some((class, negated)) = r.sole_posix {
            let op = if negated {
                Opcode::NPosix
            } else {
                Opcode::Posix
            };
            let at = self.push(op, charset_flags(class as u8, charset))?;
            return self.class_done(pos, &r.set, Piece::single(at));
        }

        if !r.has_conditions() {
            let set = &r.set;
            if set.is_empty() {
                let at = self.push(Opcode::OpFail, 0)?;
                return self.class_done(pos, set, Piece::new(at, 1, Some(1), PieceFlags::empty()));
            }
            if set.is_full() {
                let at = self.push(Opcode::SAny, 0)?;
                return self.class_done(pos, set, Piece::single(at));
            }
            if let Some((base, mask)) = bitmask(set, data_max) {
                let at = self.push_arg2(Opcode::AnyOfM, 0, base, mask)?;
                return self.class_done(pos, set, Piece::single(at));
            }
            let (_, above) = set.split_at(0x100);
            if above.ranges() == [(0x100, MAX_CODEPOINT)]
                && let Some((base, mask)) = bitmask(&set.complement(), data_max)
            {
                let at = self.push_arg2(Opcode::NAnyOfM, 0, base, mask)?;
                return self.class_done(pos, set, Piece::single(at));
            }
            if let Some(cp) = set.as_single()
                && (cp <= 0xFF || utf8)
                && !(0xD800..=0xDFFF).contains(&cp)
            {
                let at = self.emit.len();
                let piece = self.emit_literal(&[cp], false)?;
                self.tracer.trace_class(pos, set, self.emit.opcode(at));
                return Ok(piece);
            }
            if let Some((lo, hi)) = set.as_single_range() {
                let at = self.push_arg2(Opcode::AnyOfR, 0, lo, hi)?;
                return self.class_done(pos, set, Piece::single(at));
            }
        }

        let (low, mut above) = r.set.split_at(0x100);
        let mut flags = 0;
        if r.inverted {
            flags |= flag::CLASS_INVERTED;
        }
        if !r.locale_classes.is_empty() || r.locale_fold {
            flags |= flag::CLASS_LOCALE;
        }
        if !r.utf8_only.is_empty() {
            flags |= flag::CLASS_UTF8_ONLY;
        }
        if r.deferred.is_some() {
            flags |= flag::CLASS_DEFERRED;
        }
        if above.ranges() == [(0x100, MAX_CODEPOINT)] {
            flags |= flag::CLASS_ALL_ABOVE;
            above = CodepointSet::new();
        }
        let needs_aux = !above.is_empty()
            || !r.utf8_only.is_empty()
            || !r.locale_classes.is_empty()
            || r.deferred.is_some();
        let aux = if needs_aux {
            flags |= flag::CLASS_HAS_AUX;
            self.classes.intern(ClassData {
                above,
                utf8_only: r.utf8_only,
                locale_classes: r.locale_classes,
                deferred: r.deferred,
            })
        } else {
            NO_AUX
        };
        let at = self.push_class(flags, aux, &bitmap_of(&low))?;
        self.class_done(pos, &r.set, Piece::single(at))
    }

    fn class_done(&mut self, pos: usize, set: &CodepointSet, piece: Piece) -> PResult<Piece> {
        let op = self.emit.opcode(piece.start);
        self.tracer.trace_class(pos, set, op);
        Ok(piece)
    }

    /// `(?:seq1|seq2|...|[rest])`, built by parsing synthesized text for
    /// the sequences. Diagnostics from that text point at the class.
    fn emit_multi_fold_class(&mut self, mut b: ClassBuilder, depth: u32) -> PResult<Piece> {
        let depth = self.enter(depth)?;
        let text = b
            .multi
            .iter()
            .map(|seq| {
                seq.iter()
                    .map(|cp| format!("\\x{{{cp:X}}}"))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("|");
        let span = self.span(b.start, self.src.pos());
        let saved_src = std::mem::replace(&mut self.src, Source::new(text));
        let saved_sub = self.substitution.replace(span);
        let saved_mode = self.mode;
        self.mode.extended = false;
        self.mode.extended_more = false;

        let alt = self.parse_alternation(depth, false);

        self.src = saved_src;
        self.substitution = saved_sub;
        self.mode = saved_mode;
        let mut alt = alt?;

        b.multi.clear();
        let rest_empty = b.elements == 0
            || (b.plain.is_empty()
                && b.posix.is_empty()
                && b.property.is_empty()
                && b.utf8_only.is_empty()
                && b.locale_classes.is_empty()
                && b.deferred.is_none());
        if !rest_empty {
            if alt.branches == 1 {
                self.insert(alt.piece.start, Opcode::Branch, 0, &[])?;
            }
            let mut last = alt.piece.start;
            while let Some(next) = self.emit.next_of(last) {
                if self.emit.opcode(next) != Opcode::Branch {
                    break;
                }
                last = next;
            }
            let branch = self.push(Opcode::Branch, 0)?;
            self.link(last, branch)?;
            let start = b.start;
            let resolved = self.resolve_class(b);
            let piece = self.emit_resolved(start, resolved)?;
            alt.piece = alt.piece.or(piece);
            alt.branches += 1;
        }
        let piece = self.join_alternatives(alt)?;
        Ok(Piece::new(piece.start, piece.min, piece.max, PieceFlags::empty()))
    }
}

fn complement_if(set: CodepointSet, negate: bool) -> CodepointSet {
    if negate { set.complement() } else { set }
}
