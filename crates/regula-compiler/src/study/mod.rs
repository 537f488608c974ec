//! Whole-program analysis run once the final pass has emitted its code.
//!
//! Computes the length bounds of any match, the leading anchor, the
//! longest literal required at a fixed offset and at a floating one, and a
//! predicate on the first character. None of it changes the code; the
//! matcher uses it to reject or skip start positions early.

#[cfg(test)]
mod study_tests;

use regula_bytecode::{
    Anchor, Anchoring, Charset, ClassData, Encoding, Node, Opcode, ProgramFlags,
    RequiredSubstring, StartClass, StudyInfo, SubstrCheck, UNBOUNDED, flag, split_charset_flags,
};
use regula_core::{CodepointSet, MAX_CODEPOINT};

use crate::options::CompileOptions;
use crate::parse::fold_bounds;
use crate::trace::CompileTracer;

/// Length bounds of a construct, in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Len {
    min: usize,
    max: Option<usize>,
}

impl Len {
    const ZERO: Len = Len {
        min: 0,
        max: Some(0),
    };
    const ANY: Len = Len { min: 0, max: None };

    fn exact(n: usize) -> Self {
        Len { min: n, max: Some(n) }
    }

    fn then(self, next: Len) -> Len {
        Len {
            min: self.min.saturating_add(next.min),
            max: self.max.zip(next.max).map(|(a, b)| a.saturating_add(b)),
        }
    }

    fn or(self, other: Len) -> Len {
        Len {
            min: self.min.min(other.min),
            max: self.max.zip(other.max).map(|(a, b)| a.max(b)),
        }
    }

    fn repeat(self, min: u32, max: u32) -> Len {
        let max = match (self.max, max) {
            (Some(0), _) | (_, 0) => Some(0),
            (Some(body), m) if m != UNBOUNDED => Some(body.saturating_mul(m as usize)),
            _ => None,
        };
        Len {
            min: self.min.saturating_mul(min as usize),
            max,
        }
    }
}

/// One step along a chain: the construct's length and where the chain
/// continues after it.
struct Step {
    len: Len,
    next: Option<usize>,
}

struct Study<'a> {
    code: &'a [u32],
    enc: Encoding,
    flags: ProgramFlags,
    classes: &'a [ClassData],
    opts: &'a CompileOptions,
}

/// Studies `code` and returns what the matcher needs to know up front.
pub(crate) fn study<T: CompileTracer>(
    code: &[u32],
    enc: Encoding,
    flags: ProgramFlags,
    classes: &[ClassData],
    opts: &CompileOptions,
    tracer: &mut T,
) -> StudyInfo {
    let s = Study {
        code,
        enc,
        flags,
        classes,
        opts,
    };
    let accepts = s.contains(Opcode::Accept);

    let len = if accepts { Len::ANY } else { s.seq(0, None) };
    let mut info = StudyInfo {
        min_len: len.min,
        max_len: len.max,
        anchor: s.anchoring(0),
        ..StudyInfo::default()
    };

    if !accepts {
        let (fixed, floating) = s.substrings();
        info.check = match (&fixed, &floating) {
            (None, None) => None,
            (Some(_), None) => Some(SubstrCheck::Fixed),
            (None, Some(_)) => Some(SubstrCheck::Floating),
            (Some(f), Some(fl)) => Some(choose_check(f, fl, opts.tuning.prefer_floating_on_tie)),
        };
        info.fixed = fixed;
        info.floating = floating;
    }

    match s.start_class(0) {
        Ok(sc) => info.start_class = Some(sc),
        Err(reason) => tracer.trace_abandon(reason),
    }
    tracer.trace_study(&info);
    info
}

/// Picks the substring to check first. The longer one wins; on a tie the
/// floating one wins only when its offset window is bounded, otherwise the
/// one that starts earlier does.
fn choose_check(
    fixed: &RequiredSubstring,
    floating: &RequiredSubstring,
    prefer_floating: bool,
) -> SubstrCheck {
    if fixed.len() != floating.len() {
        return if fixed.len() > floating.len() {
            SubstrCheck::Fixed
        } else {
            SubstrCheck::Floating
        };
    }
    if prefer_floating && floating.max_offset.is_some() {
        SubstrCheck::Floating
    } else if floating.min_offset < fixed.min_offset {
        SubstrCheck::Floating
    } else {
        SubstrCheck::Fixed
    }
}

impl<'a> Study<'a> {
    fn node(&self, at: usize) -> Node<'a> {
        Node::new(self.code, at, self.enc)
    }

    fn contains(&self, op: Opcode) -> bool {
        regula_bytecode::Nodes::new(self.code, self.enc).any(|n| n.opcode() == op)
    }

    /// Where a `Branch` (or `IfThen`) chain continues once an
    /// alternative has matched.
    fn chain_end(&self, first: usize, op: Opcode) -> Option<usize> {
        let mut at = first;
        loop {
            let next = self.node(at).next()?;
            if self.node(next).opcode() != op {
                return Some(next);
            }
            at = next;
        }
    }

    /// Alternatives of a `Branch` or `IfThen` chain, as body offsets.
    fn alternatives(&self, first: usize, op: Opcode) -> Vec<usize> {
        let mut out = Vec::new();
        let mut cur = Some(first);
        while let Some(at) = cur {
            let node = self.node(at);
            if node.opcode() != op {
                break;
            }
            out.push(node.after());
            cur = node.next();
        }
        out
    }

    /// Walks the chain from `at` until `stop` or the end of a body.
    fn seq(&self, mut at: usize, stop: Option<usize>) -> Len {
        let mut total = Len::ZERO;
        loop {
            if Some(at) == stop
                || matches!(
                    self.node(at).opcode(),
                    Opcode::End | Opcode::Succeed | Opcode::WhileM
                )
            {
                return total;
            }
            let step = self.step(at);
            total = total.then(step.len);
            match step.next {
                Some(next) => at = next,
                None => return total,
            }
        }
    }

    fn literal_len(&self, node: &Node<'_>) -> Len {
        let cps = node.literal_codepoints();
        let charset = match node.opcode() {
            Opcode::Exact => return Len::exact(cps.len()),
            Opcode::ExactFoldLocale => Charset::Locale,
            _ => split_charset_flags(node.flags()).1.unwrap_or_default(),
        };
        if !self.flags.contains(ProgramFlags::UNFOLDED_MULTI) {
            return Len::exact(cps.len());
        }
        let (min, max) = fold_bounds(&*self.opts.unicode, &cps, charset);
        Len { min, max: Some(max) }
    }

    fn step(&self, at: usize) -> Step {
        let node = self.node(at);
        let op = node.opcode();
        let next = node.next();
        let len = match op {
            Opcode::Exact | Opcode::ExactFold | Opcode::ExactFoldLocale => self.literal_len(&node),
            _ if op.is_simple() => Len::exact(1),
            Opcode::Clump => Len { min: 1, max: None },
            Opcode::LineBreak => Len { min: 1, max: Some(2) },
            Opcode::OpFail => Len::ZERO,
            Opcode::Star | Opcode::Plus | Opcode::Curly => {
                let body = self.step(node.after()).len;
                let (min, max) = match op {
                    Opcode::Star => (0, UNBOUNDED),
                    Opcode::Plus => (1, UNBOUNDED),
                    _ => (node.arg1(), node.arg2()),
                };
                body.repeat(min, max)
            }
            Opcode::CurlyX => self
                .seq(node.after(), None)
                .repeat(node.arg1(), node.arg2()),
            Opcode::Branch => {
                let end = self.chain_end(at, Opcode::Branch);
                let len = self
                    .alternatives(at, Opcode::Branch)
                    .into_iter()
                    .map(|body| self.seq(body, end))
                    .reduce(Len::or)
                    .unwrap_or(Len::ZERO);
                return Step { len, next: end };
            }
            Opcode::IfThen => {
                let end = self.chain_end(at, Opcode::IfThen);
                let bodies = self.alternatives(at, Opcode::IfThen);
                let mut len = bodies
                    .iter()
                    .map(|&body| self.seq(body, end))
                    .reduce(Len::or)
                    .unwrap_or(Len::ZERO);
                if bodies.len() == 1 {
                    len = len.or(Len::ZERO);
                }
                return Step { len, next: end };
            }
            Opcode::DefineP => {
                let end = next.and_then(|n| self.chain_end(n, Opcode::IfThen));
                return Step {
                    len: Len::ZERO,
                    next: end,
                };
            }
            Opcode::Suspend => self.seq(node.after(), None),
            Opcode::Eval if node.has_flag(flag::POSTPONED) => Len::ANY,
            Opcode::GoSub
            | Opcode::Ref
            | Opcode::RefFold
            | Opcode::RefName
            | Opcode::RefNameFold => Len::ANY,
            _ => Len::ZERO,
        };
        Step { len, next }
    }

    // Anchors

    /// First node at or after `at` that isn't a group boundary.
    fn skip_groups(&self, mut at: usize) -> usize {
        while matches!(self.node(at).opcode(), Opcode::Open | Opcode::Nothing)
            && let Some(next) = self.node(at).next()
        {
            at = next;
        }
        at
    }

    fn anchoring(&self, at: usize) -> Anchoring {
        let at = self.skip_groups(at);
        let node = self.node(at);
        let explicit = |kind| Anchoring {
            kind,
            implicit: false,
        };
        match node.opcode() {
            Opcode::Bol | Opcode::Sbol => explicit(Anchor::Sbol),
            Opcode::Mbol => explicit(Anchor::Mbol),
            Opcode::Gpos => explicit(Anchor::Gpos),
            Opcode::Branch => {
                let mut kinds = self
                    .alternatives(at, Opcode::Branch)
                    .into_iter()
                    .map(|body| self.anchoring(body));
                let Some(first) = kinds.next() else {
                    return Anchoring::default();
                };
                if kinds.all(|k| k.kind == first.kind) {
                    first
                } else {
                    Anchoring::default()
                }
            }
            Opcode::Star
                if !self
                    .flags
                    .intersects(ProgramFlags::BACKREF | ProgramFlags::RECURSION) =>
            {
                let kind = match self.node(node.after()).opcode() {
                    Opcode::SAny => Anchor::Sbol,
                    Opcode::RegAny => Anchor::Mbol,
                    _ => return Anchoring::default(),
                };
                Anchoring {
                    kind,
                    implicit: true,
                }
            }
            _ => Anchoring::default(),
        }
    }

    // Required substrings

    /// The longest literal at a fixed offset and the longest at a
    /// variable one, read off the top-level chain.
    fn substrings(&self) -> (Option<RequiredSubstring>, Option<RequiredSubstring>) {
        let mut found = Found::default();
        let mut offset = Len::ZERO;
        let mut run = String::new();
        let mut run_offset = Len::ZERO;
        let mut at = 0;

        loop {
            let node = self.node(at);
            let op = node.opcode();
            if op == Opcode::End {
                break;
            }
            let step = self.step(at);
            match op {
                Opcode::Exact => {
                    if run.is_empty() {
                        run_offset = offset;
                    }
                    run.push_str(&node.literal_text());
                }
                Opcode::Eos | Opcode::Seol | Opcode::Eol => {
                    let before_end = step.next.is_some_and(|n| self.reaches_end(n));
                    found.offer(&mut run, run_offset, before_end);
                }
                Opcode::Plus | Opcode::Curly
                    if (op == Opcode::Plus || node.arg1() >= 1)
                        && self.node(node.after()).opcode() == Opcode::Exact =>
                {
                    found.offer(&mut run, run_offset, false);
                    let mut text = self.node(node.after()).literal_text();
                    found.offer(&mut text, offset, false);
                }
                _ if op.is_zero_width() => {}
                _ => found.offer(&mut run, run_offset, false),
            }
            offset = offset.then(step.len);
            match step.next {
                Some(next) => at = next,
                None => break,
            }
        }
        found.offer(&mut run, run_offset, false);
        (found.fixed, found.floating)
    }

    /// Only group ends stand between `at` and the end of the program.
    fn reaches_end(&self, mut at: usize) -> bool {
        loop {
            match self.node(at).opcode() {
                Opcode::End => return true,
                Opcode::Close | Opcode::Tail | Opcode::Nothing => match self.node(at).next() {
                    Some(next) => at = next,
                    None => return false,
                },
                _ => return false,
            }
        }
    }

    // Start class

    /// Skips nodes that consume nothing.
    fn skip_zero_width(&self, mut at: usize) -> usize {
        loop {
            let op = self.node(at).opcode();
            if !op.is_zero_width() || matches!(op, Opcode::Succeed | Opcode::WhileM) {
                return at;
            }
            match self.step(at).next {
                Some(next) => at = next,
                None => return at,
            }
        }
    }

    fn start_class(&self, at: usize) -> Result<StartClass, &'static str> {
        let at = self.skip_zero_width(at);
        let node = self.node(at);
        match node.opcode() {
            Opcode::Exact | Opcode::ExactFold => Ok(StartClass::Node(at)),
            Opcode::ExactFoldLocale => Err("first character folds by locale"),
            op if op.is_simple() && op != Opcode::SAny => Ok(StartClass::Node(at)),
            Opcode::Plus => Ok(StartClass::Node(node.after())),
            Opcode::Curly if node.arg1() >= 1 => Ok(StartClass::Node(node.after())),
            Opcode::CurlyX if node.arg1() >= 1 => self.start_class(node.after()),
            Opcode::Suspend => self.start_class(node.after()),
            Opcode::Branch => {
                let bodies = self.alternatives(at, Opcode::Branch);
                if bodies.len() > self.opts.tuning.start_class_max_branches {
                    return Err("too many alternatives");
                }
                let mut set = CodepointSet::new();
                for body in bodies {
                    set.extend(&self.first_set(body)?);
                }
                if set.is_full() {
                    return Err("first character can be anything");
                }
                Ok(StartClass::Set(set))
            }
            _ => Err("no fixed first character"),
        }
    }

    /// Characters a match of the chain at `at` can start with.
    fn first_set(&self, at: usize) -> Result<CodepointSet, &'static str> {
        let at = self.skip_zero_width(at);
        let node = self.node(at);
        let data = &self.opts.unicode;
        match node.opcode() {
            Opcode::Exact => node
                .literal_codepoints()
                .first()
                .map(|&cp| CodepointSet::single(cp))
                .ok_or("empty literal"),
            Opcode::ExactFold => node
                .literal_codepoints()
                .first()
                .map(|&cp| {
                    let mut set = data.simple_folds(cp);
                    if self.flags.contains(ProgramFlags::UNFOLDED_MULTI) {
                        // Characters whose multi-character fold starts with `cp`.
                        for &(src, fold) in regula_core::unicode::MULTI_CHAR_FOLDS {
                            if fold.first() == Some(&cp) {
                                set.add(src);
                            }
                        }
                    }
                    set
                })
                .ok_or("empty literal"),
            Opcode::ExactFoldLocale => Err("first character folds by locale"),
            Opcode::AnyOfR => Ok(CodepointSet::range(node.arg1(), node.arg2())),
            Opcode::AnyOfM => Ok(mask_set(node.arg1(), node.arg2())),
            Opcode::NAnyOfM => Ok(mask_set(node.arg1(), node.arg2()).complement()),
            Opcode::RegAny => Ok(CodepointSet::single(u32::from(b'\n')).complement()),
            Opcode::AnyOf => self.any_of_set(&node),
            Opcode::Plus => self.first_set(node.after()),
            Opcode::Curly | Opcode::CurlyX if node.arg1() >= 1 => self.first_set(node.after()),
            Opcode::Suspend => self.first_set(node.after()),
            Opcode::Branch => {
                let mut set = CodepointSet::new();
                for body in self.alternatives(at, Opcode::Branch) {
                    set.extend(&self.first_set(body)?);
                }
                Ok(set)
            }
            Opcode::SAny => Err("first character can be anything"),
            Opcode::Posix | Opcode::NPosix => Err("first character depends on the charset"),
            _ => Err("no fixed first character"),
        }
    }

    fn any_of_set(&self, node: &Node<'_>) -> Result<CodepointSet, &'static str> {
        let conditional = flag::CLASS_INVERTED
            | flag::CLASS_LOCALE
            | flag::CLASS_UTF8_ONLY
            | flag::CLASS_DEFERRED;
        if node.flags() & conditional != 0 {
            return Err("class depends on match-time conditions");
        }
        let mut set = CodepointSet::new();
        for byte in 0..=u8::MAX {
            if node.bitmap_contains(byte) {
                set.add(u32::from(byte));
            }
        }
        if node.has_flag(flag::CLASS_ALL_ABOVE) {
            set.add_range(0x100, MAX_CODEPOINT);
        }
        if let Some(data) = node.class_aux().and_then(|aux| self.classes.get(aux as usize)) {
            set.extend(&data.above);
        }
        Ok(set)
    }
}

/// Members of an `AnyOfM` node.
fn mask_set(base: u32, mask: u32) -> CodepointSet {
    CodepointSet::from_codepoints((0..=0xFFu32).filter(|cp| cp & mask == base & mask))
}

#[derive(Default)]
struct Found {
    fixed: Option<RequiredSubstring>,
    floating: Option<RequiredSubstring>,
}

impl Found {
    /// Considers `text` (emptied afterwards) as a required substring.
    fn offer(&mut self, text: &mut String, at: Len, before_end: bool) {
        if text.is_empty() {
            return;
        }
        let candidate = RequiredSubstring {
            text: std::mem::take(text),
            min_offset: at.min,
            max_offset: at.max,
            before_end,
        };
        let slot = if candidate.is_fixed() {
            &mut self.fixed
        } else {
            &mut self.floating
        };
        if slot.as_ref().is_none_or(|best| candidate.len() > best.len()) {
            *slot = Some(candidate);
        }
    }
}
