//! `[:name:]` inside a bracket class.
//!
//! Recognition is forgiving: a blank, a semicolon for a colon, a missing
//! or doubled colon and small misspellings are repaired with a warning for
//! each repair, as long as the name stays within the configured edit
//! distance of a real class. Text that is too far off is read as plain
//! class members starting with a literal `[`.

use regula_core::edit_distance::closest;
use regula_core::{CodepointSet, PosixClass};

use super::{ClassBuilder, complement_if};
use crate::diagnostics::DiagnosticKind;
use crate::parse::{PResult, Parser};
use crate::trace::CompileTracer;

/// Something repaired while reading a POSIX class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Defect {
    LeadingBlank,
    SemicolonOpener,
    MissingOpener,
    ExtraColon,
    BlankInName,
    SemicolonCloser,
    MissingCloser,
    TrailingBlank,
}

impl Defect {
    fn describe(self) -> &'static str {
        match self {
            Defect::LeadingBlank => "blank after `[`",
            Defect::SemicolonOpener => "`;` where `:` was expected after `[`",
            Defect::MissingOpener => "missing `:` after `[`",
            Defect::ExtraColon => "more than one `:` after `[`",
            Defect::BlankInName => "blank inside the class name",
            Defect::SemicolonCloser => "`;` where `:` was expected before `]`",
            Defect::MissingCloser => "missing `:` before `]`",
            Defect::TrailingBlank => "blank before `]`",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Scan {
    Class {
        len: usize,
        negated: bool,
        name: String,
        defects: Vec<Defect>,
    },
    /// `[.x.]` or `[=x=]`.
    Reserved { len: usize },
}

/// Reads a POSIX class candidate at the start of `text`, which begins
/// with `[`.
fn scan(text: &str) -> Option<Scan> {
    let b = text.as_bytes();
    let blank = |c: u8| c == b' ' || c == b'\t';
    let mut defects = Vec::new();
    let mut i = 1;

    if b.get(i).is_some_and(|&c| c == b'.' || c == b'=') {
        let delim = b[i];
        let body = &b[i + 1..];
        let close = body.iter().position(|&c| c == b']')?;
        return (close > 1 && body[close - 1] == delim).then_some(Scan::Reserved {
            len: i + 1 + close + 1,
        });
    }

    if b.get(i).copied().is_some_and(blank) {
        defects.push(Defect::LeadingBlank);
        while b.get(i).copied().is_some_and(blank) {
            i += 1;
        }
    }

    let mut colons = 0;
    match b.get(i) {
        Some(b':') => {
            colons += 1;
            i += 1;
        }
        Some(b';') => {
            colons += 1;
            defects.push(Defect::SemicolonOpener);
            i += 1;
        }
        _ => defects.push(Defect::MissingOpener),
    }
    if b.get(i).is_some_and(|&c| c == b':' || c == b';') {
        defects.push(Defect::ExtraColon);
        while b.get(i).is_some_and(|&c| c == b':' || c == b';') {
            i += 1;
        }
    }

    let negated = b.get(i) == Some(&b'^');
    if negated {
        i += 1;
    }

    let name_start = i;
    while b.get(i).is_some_and(|&c| c.is_ascii_alphabetic() || blank(c)) {
        i += 1;
    }
    let raw = text[name_start..i].trim_end_matches([' ', '\t']);
    let trailing = i - name_start - raw.len();
    if raw.is_empty() {
        return None;
    }
    let name: String = raw.chars().filter(|c| !matches!(c, ' ' | '\t')).collect();
    if name.len() != raw.len() {
        defects.push(Defect::BlankInName);
    }
    if trailing > 0 {
        defects.push(Defect::TrailingBlank);
    }

    match b.get(i) {
        Some(b':') => {
            colons += 1;
            i += 1;
        }
        Some(b';') => {
            colons += 1;
            defects.push(Defect::SemicolonCloser);
            i += 1;
        }
        _ => defects.push(Defect::MissingCloser),
    }
    if b.get(i).copied().is_some_and(blank) {
        if !defects.contains(&Defect::TrailingBlank) {
            defects.push(Defect::TrailingBlank);
        }
        while b.get(i).copied().is_some_and(blank) {
            i += 1;
        }
    }

    if colons == 0 || b.get(i) != Some(&b']') {
        return None;
    }
    Some(Scan::Class {
        len: i + 1,
        negated,
        name,
        defects,
    })
}

fn candidates() -> Vec<&'static str> {
    let mut names = PosixClass::BRACKET_NAMES.to_vec();
    names.push("ascii");
    names
}

impl<T: CompileTracer> Parser<'_, T> {
    /// Tries to read a POSIX class at the cursor (on an inner `[`). On
    /// `false` nothing was consumed.
    pub(crate) fn try_posix_class(&mut self, b: &mut ClassBuilder) -> PResult<bool> {
        let start = self.src.pos();
        let Some(found) = scan(self.src.rest()) else {
            return Ok(false);
        };
        let (len, negated, name, defects) = match found {
            Scan::Reserved { len } => {
                let text = self.src.slice(start, start + len).to_string();
                return Err(self.error_msg(
                    DiagnosticKind::ReservedPosixSyntax,
                    start,
                    start + len,
                    format!("`{text}`"),
                ));
            }
            Scan::Class {
                len,
                negated,
                name,
                defects,
            } => (len, negated, name, defects),
        };
        let end = start + len;
        let max = self.opts.tuning.posix_max_distance;
        let max_malformed = self.opts.tuning.posix_max_distance_malformed;
        let names = candidates();
        let range = self.span(start, end);

        let resolved = if defects.is_empty() {
            if names.contains(&name.as_str()) {
                name.clone()
            } else if let Some((guess, _)) = closest(&name, &names, max) {
                self.diag
                    .report(DiagnosticKind::AssumedPosixClass, range)
                    .message(guess)
                    .hint(format!("`{name}` is not a POSIX class"))
                    .emit();
                guess.to_string()
            } else {
                return Err(self.error_msg(DiagnosticKind::UnknownPosixClass, start, end, name));
            }
        } else {
            let Some((guess, distance)) = closest(&name, &names, max_malformed)
            else {
                return Ok(false);
            };
            for defect in &defects {
                self.diag
                    .report(DiagnosticKind::AssumedPosixClass, range)
                    .message(guess)
                    .hint(defect.describe())
                    .emit();
            }
            if distance > 0 {
                self.diag
                    .report(DiagnosticKind::AssumedPosixClass, range)
                    .message(guess)
                    .hint(format!("`{name}` is not a POSIX class"))
                    .emit();
            }
            guess.to_string()
        };

        self.src.set_pos(end);
        match PosixClass::from_name(&resolved) {
            Some(class) => self.add_posix_class(b, class, negated),
            None => b.add_set(complement_if(CodepointSet::range(0, 0x7F), negated)),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::{Defect, Scan, scan};

    fn class(text: &str) -> (String, Vec<Defect>) {
        match scan(text) {
            Some(Scan::Class { name, defects, .. }) => (name, defects),
            other => panic!("expected a class for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn well_formed() {
        assert_eq!(
            scan("[:alpha:]]"),
            Some(Scan::Class {
                len: 9,
                negated: false,
                name: "alpha".into(),
                defects: vec![],
            })
        );
        assert_eq!(
            scan("[:^digit:]"),
            Some(Scan::Class {
                len: 10,
                negated: true,
                name: "digit".into(),
                defects: vec![],
            })
        );
    }

    #[test]
    fn repairs() {
        assert_eq!(
            class("[ :alpha: ]"),
            ("alpha".into(), vec![Defect::LeadingBlank, Defect::TrailingBlank])
        );
        assert_eq!(class("[:alpha]"), ("alpha".into(), vec![Defect::MissingCloser]));
        assert_eq!(class("[;alpha:]"), ("alpha".into(), vec![Defect::SemicolonOpener]));
        assert_eq!(class("[::alpha:]"), ("alpha".into(), vec![Defect::ExtraColon]));
        assert_eq!(class("[:al pha:]"), ("alpha".into(), vec![Defect::BlankInName]));
    }

    #[test]
    fn not_a_class() {
        assert_eq!(scan("[abc]"), None);
        assert_eq!(scan("[:]"), None);
        assert_eq!(scan("[:alpha:"), None);
        assert_eq!(scan("[:12:]"), None);
    }

    #[test]
    fn reserved() {
        assert_eq!(scan("[.a.]"), Some(Scan::Reserved { len: 5 }));
        assert_eq!(scan("[=e=]x"), Some(Scan::Reserved { len: 5 }));
        assert_eq!(scan("[.a]"), None);
    }
}
