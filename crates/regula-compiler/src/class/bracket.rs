//! `[...]` classes and the escapes allowed inside them.

use regula_core::PosixClass;

use super::ClassBuilder;
use crate::diagnostics::{DiagnosticKind, Severity};
use crate::parse::{Abort, Escaped, PResult, Parser, Piece};
use crate::trace::CompileTracer;

/// What one class element turned out to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ClassItem {
    /// A single character, possibly the start of a range.
    Char(u32),
    /// A set that was added to the builder already.
    Class,
    /// A multi-character sequence, added already.
    Sequence,
}

impl<T: CompileTracer> Parser<'_, T> {
    /// A bracket class at the cursor, emitted as node(s).
    pub(crate) fn parse_bracket_class(&mut self, depth: u32) -> PResult<Piece> {
        let start = self.src.pos();
        if let Some(len) = posix_outside_len(self.src.rest()) {
            self.warn(DiagnosticKind::PosixOutsideClass, start, start + len);
        }
        let b = self.parse_bracket_builder()?;
        self.finish_class(b, depth)
    }

    /// `\d`, `\w`, `\p{..}` and friends outside brackets; the cursor is on
    /// the backslash.
    pub(crate) fn parse_shorthand_class(&mut self, depth: u32) -> PResult<Piece> {
        let mut b = ClassBuilder::new(self.src.pos());
        self.class_escape(&mut b)?;
        self.finish_class(b, depth)
    }

    /// Parses `[...]` into a builder without emitting anything.
    pub(crate) fn parse_bracket_builder(&mut self) -> PResult<ClassBuilder> {
        let start = self.src.pos();
        self.src.bump();
        let mut b = ClassBuilder::new(start);
        b.negated = self.src.eat('^');

        let mut first = true;
        loop {
            self.skip_class_blanks();
            let Some(c) = self.src.peek() else {
                let end = self.src.text().len();
                return Err(self.error(DiagnosticKind::UnterminatedClass, start, end));
            };
            if c == ']' && !first {
                self.src.bump();
                break;
            }
            first = false;

            let item_start = self.src.pos();
            match self.class_item(&mut b)? {
                ClassItem::Char(lo) => self.class_char_or_range(&mut b, lo, item_start)?,
                ClassItem::Class => {
                    if self.dash_starts_range() {
                        let dash = self.src.pos();
                        self.false_range(item_start, dash + 1)?;
                        self.src.bump();
                        b.add_char('-' as u32);
                    }
                }
                ClassItem::Sequence => {}
            }
        }
        Ok(b)
    }

    /// `lo` alone or as the start of `lo-hi`.
    fn class_char_or_range(&mut self, b: &mut ClassBuilder, lo: u32, start: usize) -> PResult<()> {
        if !self.dash_starts_range() {
            self.add_class_char(b, lo, start);
            return Ok(());
        }
        self.src.bump();
        self.skip_class_blanks();
        match self.class_item(b)? {
            ClassItem::Char(hi) => {
                let end = self.src.pos();
                if lo > hi {
                    return Err(self.error_msg(
                        DiagnosticKind::InvalidRange,
                        start,
                        end,
                        format!("`{}`", self.src.slice(start, end)),
                    ));
                }
                b.add_range(lo, hi);
            }
            ClassItem::Class | ClassItem::Sequence => {
                let end = self.src.pos();
                self.false_range(start, end)?;
                self.add_class_char(b, lo, start);
                b.add_char('-' as u32);
            }
        }
        Ok(())
    }

    fn add_class_char(&mut self, b: &mut ClassBuilder, cp: u32, start: usize) {
        if self.opts.strict && b.has_member(cp) {
            let end = self.src.pos();
            self.warn(DiagnosticKind::DuplicateClassMember, start, end);
        }
        b.add_char(cp);
    }

    /// A `-` that is followed by something other than the closing `]`.
    fn dash_starts_range(&self) -> bool {
        if self.src.peek() != Some('-') {
            return false;
        }
        let after = &self.src.rest()[1..];
        let after = if self.mode.extended_more {
            after.trim_start_matches([' ', '\t'])
        } else {
            after
        };
        !after.is_empty() && !after.starts_with(']')
    }

    fn false_range(&mut self, start: usize, end: usize) -> PResult<()> {
        let range = self.span(start, end);
        let text = format!("`{}`", self.src.slice(start, end));
        if self.opts.strict {
            self.diag
                .report(DiagnosticKind::FalseRange, range)
                .message(text)
                .severity(Severity::Error)
                .emit();
            return Err(Abort::Reported);
        }
        self.diag
            .report(DiagnosticKind::FalseRange, range)
            .message(text)
            .hint("escape the `-` to match it literally")
            .emit();
        Ok(())
    }

    fn skip_class_blanks(&mut self) {
        if self.mode.extended_more {
            self.src.eat_while(|c| c == ' ' || c == '\t');
        }
    }

    /// One element: a character, an escape, or a POSIX class.
    fn class_item(&mut self, b: &mut ClassBuilder) -> PResult<ClassItem> {
        let Some(c) = self.src.peek() else {
            let end = self.src.text().len();
            return Err(self.error(DiagnosticKind::UnterminatedClass, b.start, end));
        };
        match c {
            '[' => {
                if self.try_posix_class(b)? {
                    return Ok(ClassItem::Class);
                }
                self.src.bump();
                Ok(ClassItem::Char('[' as u32))
            }
            '\\' => self.class_escape(b),
            _ => {
                self.src.bump();
                let cp = c as u32;
                self.need_codepoint(cp)?;
                Ok(ClassItem::Char(cp))
            }
        }
    }

    /// An escape inside a class, or one used as a set-expression operand.
    pub(crate) fn class_escape(&mut self, b: &mut ClassBuilder) -> PResult<ClassItem> {
        let start = self.src.pos();
        let Some(c) = self.src.peek_nth(1) else {
            return Err(self.error(DiagnosticKind::TrailingBackslash, start, start + 1));
        };
        match c {
            'd' | 'D' | 'w' | 'W' | 's' | 'S' => {
                self.src.set_pos(start + 2);
                let class = match c.to_ascii_lowercase() {
                    'd' => PosixClass::Digit,
                    'w' => PosixClass::Word,
                    _ => PosixClass::Space,
                };
                self.add_posix_class(b, class, c.is_ascii_uppercase());
                Ok(ClassItem::Class)
            }
            'h' | 'H' | 'v' | 'V' => {
                self.src.set_pos(start + 2);
                let name = if c.eq_ignore_ascii_case(&'h') {
                    "horizspace"
                } else {
                    "vertspace"
                };
                self.add_named_property(b, name, c.is_ascii_uppercase());
                Ok(ClassItem::Class)
            }
            'p' | 'P' => {
                self.parse_property(b)?;
                Ok(ClassItem::Class)
            }
            'R' | 'X' | '8' | '9' => {
                self.src.set_pos(start + 2);
                self.warn_msg(
                    DiagnosticKind::UnrecognizedEscape,
                    start,
                    start + 2,
                    c.to_string(),
                );
                Ok(ClassItem::Char(c as u32))
            }
            _ => match self.parse_char_escape(true)? {
                Some(Escaped::Char(cp)) => Ok(ClassItem::Char(cp)),
                Some(Escaped::Sequence(cps)) => {
                    if b.negated {
                        let end = self.src.pos();
                        return Err(self.error_msg(
                            DiagnosticKind::InvalidEscape,
                            start,
                            end,
                            "a named sequence can't appear in a negated class",
                        ));
                    }
                    b.add_sequence(cps);
                    Ok(ClassItem::Sequence)
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
                    }
                    let cp = c as u32;
                    self.need_codepoint(cp)?;
                    Ok(ClassItem::Char(cp))
                }
            },
        }
    }
}

/// Length of `[:name:]` (or `[.name.]`, `[=name=]`) at the start of
/// `text`, written where a class was expected.
fn posix_outside_len(text: &str) -> Option<usize> {
    let b = text.as_bytes();
    if b.first() != Some(&b'[') {
        return None;
    }
    let delim = *b.get(1)?;
    if !matches!(delim, b':' | b'.' | b'=') {
        return None;
    }
    let mut i = 2;
    if b.get(i) == Some(&b'^') {
        i += 1;
    }
    let name_start = i;
    while b.get(i).is_some_and(u8::is_ascii_alphanumeric) {
        i += 1;
    }
    (i > name_start && b.get(i) == Some(&delim) && b.get(i + 1) == Some(&b']')).then_some(i + 2)
}

#[cfg(test)]
mod tests {
    use super::posix_outside_len;

    #[test]
    fn posix_outside() {
        assert_eq!(posix_outside_len("[:alpha:]"), Some(9));
        assert_eq!(posix_outside_len("[:^digit:]x"), Some(10));
        assert_eq!(posix_outside_len("[.a.]"), Some(5));
        assert_eq!(posix_outside_len("[:alpha]"), None);
        assert_eq!(posix_outside_len("[abc]"), None);
    }
}
