//! Literal runs and single-character escapes.
//!
//! Consecutive plain characters pack into one literal node. Under `i`,
//! characters that take part in case folding and characters that don't go
//! to separate nodes, and a node never ends inside a multi-character fold
//! sequence. When a quantifier follows, its character is backed out so the
//! quantifier applies to that character alone.

use regula_bytecode::{Charset, Opcode, ProgramFlags, charset_flags};
use regula_core::{MAX_CODEPOINT, UnicodeData, unicode::MULTI_CHAR_FOLDS};

use super::atom::DigitEscape;
use super::{PResult, Parser, Piece, PieceFlags};
use crate::diagnostics::{Checkpoint, DiagnosticKind};
use crate::trace::CompileTracer;

/// A character escape resolved to code points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Escaped {
    Char(u32),
    /// A named sequence from `\N{...}`.
    Sequence(Vec<u32>),
}

/// One source element of a literal run.
#[derive(Debug)]
struct Unit {
    pos: usize,
    cps: Vec<u32>,
    diag: Checkpoint,
}

impl<T: CompileTracer> Parser<'_, T> {
    pub(crate) fn parse_literal_run(&mut self) -> PResult<Piece> {
        let start = self.src.pos();
        let max_bytes = self.opts.tuning.literal_max_bytes.max(4);
        let mut units: Vec<Unit> = Vec::new();
        let mut run_folds: Option<bool> = None;
        let mut bytes = 0;
        let mut quantified = false;

        loop {
            let pos = self.src.pos();
            let diag = self.diag.checkpoint();
            let prev = units.last().and_then(|u| u.cps.last().copied());
            let Some(cps) = self.literal_unit(prev)? else {
                break;
            };

            if self.mode.fold {
                let folds = cps.iter().any(|&cp| self.folds(cp));
                match run_folds {
                    Some(kind) if kind != folds => match self.fold_sequence_start(&units, &cps) {
                        // The whole run leads into a multi-character fold: it
                        // becomes a folding run.
                        Some(0) => run_folds = Some(true),
                        Some(cut) => {
                            let (pos, diag) = (units[cut].pos, units[cut].diag);
                            units.truncate(cut);
                            self.back_off(pos, diag);
                            break;
                        }
                        None => {
                            self.back_off(pos, diag);
                            break;
                        }
                    },
                    _ => run_folds = Some(folds),
                }
            }

            let size = self.encoded_len(&cps);
            if bytes + size > max_bytes && !units.is_empty() {
                if self.mode.fold {
                    self.back_off_fold_prefix(&mut units, &cps);
                }
                self.back_off(pos, diag);
                break;
            }
            bytes += size;
            units.push(Unit { pos, cps, diag });

            self.skip_ignorable()?;
            if self.quantifier_ahead().is_some() {
                quantified = true;
                break;
            }
        }

        if quantified && units.len() > 1 {
            if let Some(last) = units.pop() {
                self.back_off(last.pos, last.diag);
            }
        }

        if units.is_empty() {
            // Only reachable on text the atom dispatcher never sends here.
            let pos = self.src.pos();
            return Err(self.error(DiagnosticKind::InvalidEscape, start, pos + 1));
        }

        let cps: Vec<u32> = units.into_iter().flat_map(|u| u.cps).collect();
        self.emit_literal(&cps, run_folds.unwrap_or(false))
    }

    fn back_off(&mut self, pos: usize, diag: Checkpoint) {
        self.src.set_pos(pos);
        self.diag.rollback(diag);
    }

    /// When a run is cut for size inside a multi-character fold sequence,
    /// moves the cut in front of the sequence.
    fn back_off_fold_prefix(&mut self, units: &mut Vec<Unit>, next: &[u32]) {
        if let Some(cut) = self.fold_sequence_start(units, next).filter(|&cut| cut > 0) {
            let (pos, diag) = (units[cut].pos, units[cut].diag);
            units.truncate(cut);
            self.back_off(pos, diag);
        }
    }

    /// Index of the earliest unit in the tail of `units` that, followed by
    /// `next`, begins a multi-character fold sequence.
    fn fold_sequence_start(&self, units: &[Unit], next: &[u32]) -> Option<usize> {
        (1..=units.len().min(2)).rev().find_map(|k| {
            let cut = units.len() - k;
            let keys: Vec<u32> = units[cut..]
                .iter()
                .flat_map(|u| u.cps.iter())
                .chain(next)
                .map(|&cp| fold_key(cp))
                .collect();
            self.opts.unicode.is_multi_fold_prefix(&keys).then_some(cut)
        })
    }

    /// Reads one literal element. `None` at anything that isn't literal text.
    fn literal_unit(&mut self, prev: Option<u32>) -> PResult<Option<Vec<u32>>> {
        let pos = self.src.pos();
        let Some(c) = self.src.peek() else {
            return Ok(None);
        };
        match c {
            '^' | '$' | '.' | '|' | '(' | ')' | '[' | '*' | '+' | '?' => Ok(None),
            '{' if self.quantifier_ahead().is_some() => Ok(None),
            '{' => {
                self.src.bump();
                if prev.is_some_and(|p| char::from_u32(p).is_some_and(|p| p.is_ascii_alphanumeric())) {
                    self.warn(DiagnosticKind::UnescapedBrace, pos, pos + 1);
                }
                Ok(Some(vec!['{' as u32]))
            }
            ']' | '}' => {
                self.src.bump();
                if self.opts.strict {
                    self.warn_msg(DiagnosticKind::UnescapedBrace, pos, pos + 1, c.to_string());
                }
                Ok(Some(vec![c as u32]))
            }
            '\\' => self.literal_escape(),
            _ => {
                self.src.bump();
                let cp = c as u32;
                self.need_codepoint(cp)?;
                Ok(Some(vec![cp]))
            }
        }
    }

    /// An escape inside a literal run. Escapes with a node of their own end
    /// the run.
    fn literal_escape(&mut self) -> PResult<Option<Vec<u32>>> {
        let start = self.src.pos();
        let Some(c) = self.src.peek_nth(1) else {
            return Err(self.error(DiagnosticKind::TrailingBackslash, start, start + 1));
        };
        match c {
            'A' | 'z' | 'Z' | 'G' | 'K' | 'b' | 'B' | 'd' | 'D' | 'w' | 'W' | 's' | 'S' | 'h'
            | 'H' | 'v' | 'V' | 'p' | 'P' | 'R' | 'X' | 'g' | 'k' => return Ok(None),
            'N' if self.src.peek_nth(2) != Some('{') => return Ok(None),
            '1'..='9' if matches!(self.digit_escape(start), DigitEscape::Backref(_)) => {
                return Ok(None);
            }
            _ => {}
        }

        match self.parse_char_escape(false)? {
            Some(Escaped::Char(cp)) => {
                let end = self.src.pos();
                self.check_literal_codepoint(cp, start, end)?;
                Ok(Some(vec![cp]))
            }
            Some(Escaped::Sequence(cps)) => {
                let end = self.src.pos();
                for &cp in &cps {
                    self.check_literal_codepoint(cp, start, end)?;
                }
                Ok(Some(cps))
            }
            None => {
                self.src.bump();
                let Some(c) = self.src.bump() else {
                    return Err(self.error(DiagnosticKind::TrailingBackslash, start, start + 1));
                };
                let end = self.src.pos();
                if c.is_alphanumeric() {
                    self.warn_msg(
                        DiagnosticKind::UnrecognizedEscape,
                        start,
                        end,
                        c.to_string(),
                    );
                } else if c.is_ascii_punctuation() && !is_escapable_punct(c) {
                    self.warn(DiagnosticKind::RedundantEscape, start, end);
                }
                let cp = c as u32;
                self.need_codepoint(cp)?;
                Ok(Some(vec![cp]))
            }
        }
    }

    fn check_literal_codepoint(&mut self, cp: u32, start: usize, end: usize) -> PResult<()> {
        if (0xD800..=0xDFFF).contains(&cp) {
            return Err(self.error_msg(
                DiagnosticKind::InvalidEscape,
                start,
                end,
                format!("surrogate U+{cp:04X} can't appear in a literal"),
            ));
        }
        Ok(())
    }

    /// Resolves a character escape at the cursor (on the backslash). Leaves
    /// the cursor alone and returns `None` for escapes that aren't
    /// character escapes.
    pub(crate) fn parse_char_escape(&mut self, in_class: bool) -> PResult<Option<Escaped>> {
        let start = self.src.pos();
        self.src.bump();
        let Some(c) = self.src.bump() else {
            return Err(self.error(DiagnosticKind::TrailingBackslash, start, start + 1));
        };
        let cp: u64 = match c {
            't' => 0x09,
            'n' => 0x0A,
            'r' => 0x0D,
            'f' => 0x0C,
            'e' => 0x1B,
            'a' => 0x07,
            'b' if in_class => 0x08,
            'c' => {
                let Some(x) = self.src.bump() else {
                    return Err(self.error_msg(
                        DiagnosticKind::InvalidEscape,
                        start,
                        self.src.pos(),
                        "`\\c` at end of pattern",
                    ));
                };
                if !x.is_ascii() {
                    let end = self.src.pos();
                    return Err(self.error_msg(
                        DiagnosticKind::InvalidEscape,
                        start,
                        end,
                        "`\\c` must be followed by an ASCII character",
                    ));
                }
                u64::from(x.to_ascii_uppercase() as u8 ^ 64)
            }
            '0' => {
                let digits = self.eat_octal_digits(2);
                octal_value(&digits)
            }
            '1'..='7' => {
                let mut digits = c.to_string();
                digits.push_str(&self.eat_octal_digits(2));
                if !in_class {
                    let end = self.src.pos();
                    self.warn(DiagnosticKind::OctalAmbiguity, start, end);
                }
                octal_value(&digits)
            }
            'o' => {
                let body = self.braced_escape_body(start, 'o')?;
                let digits: String = body.chars().filter(|c| !matches!(c, ' ' | '\t' | '_')).collect();
                if digits.is_empty() || !digits.chars().all(|c| ('0'..='7').contains(&c)) {
                    let end = self.src.pos();
                    return Err(self.error_msg(
                        DiagnosticKind::InvalidEscape,
                        start,
                        end,
                        "`\\o{}` needs octal digits",
                    ));
                }
                octal_value(&digits)
            }
            'x' => {
                if self.src.peek() == Some('{') {
                    let body = self.braced_escape_body(start, 'x')?;
                    let digits: String = body.chars().filter(|c| !matches!(c, ' ' | '\t' | '_')).collect();
                    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                        let end = self.src.pos();
                        return Err(self.error_msg(
                            DiagnosticKind::InvalidEscape,
                            start,
                            end,
                            "`\\x{}` needs hexadecimal digits",
                        ));
                    }
                    hex_value(&digits)
                } else {
                    let mut digits = String::new();
                    while digits.len() < 2 {
                        match self.src.peek() {
                            Some(h) if h.is_ascii_hexdigit() => {
                                digits.push(h);
                                self.src.bump();
                            }
                            _ => break,
                        }
                    }
                    hex_value(&digits)
                }
            }
            'N' => return self.named_char(start).map(Some),
            _ => {
                self.src.set_pos(start);
                return Ok(None);
            }
        };
        let end = self.src.pos();
        self.check_codepoint(cp, start, end)?;
        Ok(Some(Escaped::Char(cp as u32)))
    }

    /// `\N{U+XXXX}`, `\N{U+XXXX.YYYY}` and `\N{NAME}`; the cursor is past the `N`.
    fn named_char(&mut self, start: usize) -> PResult<Escaped> {
        if self.src.peek() != Some('{') {
            let end = self.src.pos();
            return Err(self.error_msg(
                DiagnosticKind::InvalidEscape,
                start,
                end,
                "`\\N` in a character class must be a named character: `\\N{...}`",
            ));
        }
        let body = self.braced_escape_body(start, 'N')?;
        let end = self.src.pos();
        let body = body.trim();
        let cps: Vec<u32> = if let Some(hex) = body.strip_prefix("U+") {
            let mut cps = Vec::new();
            for part in hex.split('.') {
                if part.is_empty() || !part.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(self.error_msg(
                        DiagnosticKind::InvalidEscape,
                        start,
                        end,
                        "`\\N{U+...}` needs hexadecimal digits",
                    ));
                }
                cps.push(hex_value(part));
            }
            let mut out = Vec::with_capacity(cps.len());
            for cp in cps {
                self.check_codepoint(cp, start, end)?;
                out.push(cp as u32);
            }
            out
        } else {
            match self.opts.unicode.named_sequence(body) {
                Some(cps) => cps,
                None => {
                    return Err(self.error_msg(
                        DiagnosticKind::UnknownCharacterName,
                        start,
                        end,
                        body.to_string(),
                    ));
                }
            }
        };
        for &cp in &cps {
            self.need_codepoint(cp)?;
        }
        Ok(match cps.as_slice() {
            [cp] => Escaped::Char(*cp),
            _ => Escaped::Sequence(cps),
        })
    }

    /// Body of `\x{..}`, `\o{..}` or `\N{..}`; the cursor is on the `{`.
    fn braced_escape_body(&mut self, start: usize, letter: char) -> PResult<String> {
        if !self.src.eat('{') {
            let end = self.src.pos();
            return Err(self.error_msg(
                DiagnosticKind::InvalidEscape,
                start,
                end,
                format!("missing braces on `\\{letter}{{}}`"),
            ));
        }
        match self.src.eat_until('}') {
            Some(body) => Ok(body.to_string()),
            None => {
                let end = self.src.text().len();
                Err(self.error_msg(
                    DiagnosticKind::UnterminatedConstruct,
                    start,
                    end,
                    format!("`\\{letter}{{` is missing its closing `}}`"),
                ))
            }
        }
    }

    fn eat_octal_digits(&mut self, max: usize) -> String {
        let mut digits = String::new();
        while digits.len() < max {
            match self.src.peek() {
                Some(d @ '0'..='7') => {
                    digits.push(d);
                    self.src.bump();
                }
                _ => break,
            }
        }
        digits
    }

    /// Rejects code points past the Unicode range and asks for the UTF-8
    /// restart when a narrow pass meets one above 0xFF.
    fn check_codepoint(&mut self, cp: u64, start: usize, end: usize) -> PResult<()> {
        if cp > u64::from(MAX_CODEPOINT) {
            return Err(self.error_msg(
                DiagnosticKind::CodepointTooLarge,
                start,
                end,
                format!("0x{cp:X}"),
            ));
        }
        self.need_codepoint(cp as u32)
    }

    // Folding

    /// Takes part in case folding under the current charset.
    pub(crate) fn folds(&self, cp: u32) -> bool {
        if self.charset() == Charset::Locale && cp < 0x100 {
            return true;
        }
        let data = &self.opts.unicode;
        data.simple_folds(cp).len() > 1 || data.multi_char_fold(cp).is_some()
    }

    fn encoded_len(&self, cps: &[u32]) -> usize {
        if self.emit.encoding().utf8 {
            cps.iter()
                .map(|&cp| char::from_u32(cp).map_or(3, char::len_utf8))
                .sum()
        } else {
            cps.len()
        }
    }

    /// Emits a literal node for `cps`.
    pub(crate) fn emit_literal(&mut self, cps: &[u32], folding: bool) -> PResult<Piece> {
        let bytes = self.literal_bytes(cps);
        let n = cps.len();
        let (op, flags, min, max) = if !(self.mode.fold && folding) {
            (Opcode::Exact, 0, n, n)
        } else {
            let charset = self.charset();
            let (min, max) = fold_bounds(&*self.opts.unicode, cps, charset);
            if charset == Charset::Locale {
                self.seen |= ProgramFlags::LOCALE;
                (Opcode::ExactFoldLocale, 0, min, max)
            } else {
                (Opcode::ExactFold, charset_flags(0, charset), min, max)
            }
        };
        if (min, max) != (n, n) {
            self.seen |= ProgramFlags::UNFOLDED_MULTI;
        }
        let at = self.push_str(op, flags, &bytes)?;
        let simple = if n == 1 && (min, max) == (1, 1) {
            PieceFlags::SIMPLE
        } else {
            PieceFlags::empty()
        };
        Ok(Piece::new(at, min, Some(max), simple))
    }

    fn literal_bytes(&self, cps: &[u32]) -> Vec<u8> {
        if self.emit.encoding().utf8 {
            let text: String = cps.iter().filter_map(|&cp| char::from_u32(cp)).collect();
            text.into_bytes()
        } else {
            cps.iter().map(|&cp| cp as u8).collect()
        }
    }
}

/// Length bounds of a folded literal. A code point with a multi-character
/// fold can match several characters, and a sequence that is such a fold
/// can match a single one.
pub(crate) fn fold_bounds(data: &dyn UnicodeData, cps: &[u32], charset: Charset) -> (usize, usize) {
    let allowed = |fold: &[u32]| charset != Charset::AsciiStrict || !fold.iter().all(|&c| c < 0x80);

    let max = cps
        .iter()
        .map(|&cp| match data.multi_char_fold(cp) {
            Some(fold) if allowed(fold) => fold.len(),
            _ => 1,
        })
        .sum();

    let keys: Vec<u32> = cps.iter().map(|&cp| fold_key(cp)).collect();
    let mut shrink = 0;
    let mut i = 0;
    while i < keys.len() {
        let longest = MULTI_CHAR_FOLDS
            .iter()
            .map(|&(_, fold)| fold)
            .filter(|fold| allowed(fold) && keys[i..].starts_with(fold))
            .map(<[u32]>::len)
            .max();
        match longest {
            Some(len) => {
                shrink += len - 1;
                i += len;
            }
            None => i += 1,
        }
    }
    (cps.len() - shrink, max)
}

/// Canonical case of `cp` for comparing fold sequences.
pub(crate) fn fold_key(cp: u32) -> u32 {
    let Some(c) = char::from_u32(cp) else {
        return cp;
    };
    let mut upper = c.to_uppercase();
    let c = match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    };
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l as u32,
        _ => c as u32,
    }
}

/// Punctuation that has a meaning somewhere in the pattern language, so
/// escaping it is never redundant.
fn is_escapable_punct(c: char) -> bool {
    matches!(
        c,
        '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '-'
            | '/' | '#' | '&' | '~' | '!' | '\'' | '"' | '<' | '>' | '=' | ':' | ','
    )
}

fn octal_value(digits: &str) -> u64 {
    digits.bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(8).saturating_add(u64::from(b - b'0'))
    })
}

fn hex_value(digits: &str) -> u64 {
    digits.chars().fold(0u64, |acc, c| {
        acc.saturating_mul(16)
            .saturating_add(u64::from(c.to_digit(16).unwrap_or(0)))
    })
}
