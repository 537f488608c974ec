//! The Unicode data service.
//!
//! The compiler never carries property tables itself; it asks a
//! [`UnicodeData`] implementation for property and POSIX class membership,
//! case folds and character names. [`StandardUnicode`] answers from the
//! tables bundled with `regex-syntax`.
//!
//! A provider may answer [`PropertyLookup::Deferred`] for a property it can
//! only resolve later (user-defined properties). The compiler stores a
//! deferred reference in the class node and resolves it at first use.

use std::fmt;

use serde::Serialize;

use crate::CodepointSet;

mod folds;
mod names;
mod standard;
mod wildcard;

#[cfg(test)]
mod standard_tests;
#[cfg(test)]
mod wildcard_tests;

pub use folds::MULTI_CHAR_FOLDS;
pub use standard::StandardUnicode;
pub use wildcard::{WildcardError, wildcard_set};

/// Outcome of a property lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyLookup {
    Found {
        set: CodepointSet,
        /// Replacement advice when the name is deprecated.
        deprecated: Option<&'static str>,
    },
    /// Not known at compile time; resolved later through a `PropertyResolver`.
    Deferred,
    Unknown,
}

/// Resolves properties the data service deferred.
pub trait PropertyResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<CodepointSet>;
}

/// The fourteen POSIX classes, in the order of their bit encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PosixClass {
    Word = 0,
    Digit,
    Alpha,
    Lower,
    Upper,
    Punct,
    Print,
    Alnum,
    Graph,
    Cased,
    Space,
    Blank,
    Cntrl,
    XDigit,
}

impl PosixClass {
    pub const ALL: [PosixClass; 14] = [
        PosixClass::Word,
        PosixClass::Digit,
        PosixClass::Alpha,
        PosixClass::Lower,
        PosixClass::Upper,
        PosixClass::Punct,
        PosixClass::Print,
        PosixClass::Alnum,
        PosixClass::Graph,
        PosixClass::Cased,
        PosixClass::Space,
        PosixClass::Blank,
        PosixClass::Cntrl,
        PosixClass::XDigit,
    ];

    /// Names accepted inside `[: :]`. `ascii` is handled separately since it
    /// is not charset dependent.
    pub const BRACKET_NAMES: [&'static str; 13] = [
        "word", "digit", "alpha", "lower", "upper", "punct", "print", "alnum", "graph", "space",
        "blank", "cntrl", "xdigit",
    ];

    pub fn from_u8(v: u8) -> Option<Self> {
        Self::ALL.get(usize::from(v)).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "word" => Self::Word,
            "digit" => Self::Digit,
            "alpha" => Self::Alpha,
            "lower" => Self::Lower,
            "upper" => Self::Upper,
            "punct" => Self::Punct,
            "print" => Self::Print,
            "alnum" => Self::Alnum,
            "graph" => Self::Graph,
            "cased" => Self::Cased,
            "space" => Self::Space,
            "blank" => Self::Blank,
            "cntrl" => Self::Cntrl,
            "xdigit" => Self::XDigit,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Digit => "digit",
            Self::Alpha => "alpha",
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Punct => "punct",
            Self::Print => "print",
            Self::Alnum => "alnum",
            Self::Graph => "graph",
            Self::Cased => "cased",
            Self::Space => "space",
            Self::Blank => "blank",
            Self::Cntrl => "cntrl",
            Self::XDigit => "xdigit",
        }
    }

    /// Members below 128. Identical in every charset mode.
    pub fn ascii_ranges(self) -> &'static [(u32, u32)] {
        match self {
            Self::Word => &[(0x30, 0x39), (0x41, 0x5A), (0x5F, 0x5F), (0x61, 0x7A)],
            Self::Digit => &[(0x30, 0x39)],
            Self::Alpha => &[(0x41, 0x5A), (0x61, 0x7A)],
            Self::Lower => &[(0x61, 0x7A)],
            Self::Upper => &[(0x41, 0x5A)],
            Self::Punct => &[(0x21, 0x2F), (0x3A, 0x40), (0x5B, 0x60), (0x7B, 0x7E)],
            Self::Print => &[(0x20, 0x7E)],
            Self::Alnum => &[(0x30, 0x39), (0x41, 0x5A), (0x61, 0x7A)],
            Self::Graph => &[(0x21, 0x7E)],
            Self::Cased => &[(0x41, 0x5A), (0x61, 0x7A)],
            Self::Space => &[(0x09, 0x0D), (0x20, 0x20)],
            Self::Blank => &[(0x09, 0x09), (0x20, 0x20)],
            Self::Cntrl => &[(0x00, 0x1F), (0x7F, 0x7F)],
            Self::XDigit => &[(0x30, 0x39), (0x41, 0x46), (0x61, 0x66)],
        }
    }

    pub fn ascii_set(self) -> CodepointSet {
        CodepointSet::from_ranges(self.ascii_ranges().iter().copied())
    }

    /// Under case-insensitive matching `lower`, `upper` and `cased` all mean `cased`.
    pub fn under_fold(self) -> Self {
        match self {
            Self::Lower | Self::Upper => Self::Cased,
            other => other,
        }
    }
}

impl fmt::Display for PosixClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Property, class, fold and name data consulted during compilation.
pub trait UnicodeData: Send + Sync + fmt::Debug {
    /// Looks up `\p{name}` or `\p{name=value}`. Names match loosely (case,
    /// blanks, `_` and `-` are ignored).
    fn property(&self, name: &str, value: Option<&str>) -> PropertyLookup;

    /// Every legal value of an enumerated property, for value wildcards.
    fn property_values(&self, name: &str) -> Option<Vec<&'static str>>;

    /// Members of a POSIX class. `ascii_only` restricts to code points below 128.
    fn posix_class(&self, class: PosixClass, ascii_only: bool) -> CodepointSet;

    /// Simple case-fold closure of `cp`, including `cp` itself.
    fn simple_folds(&self, cp: u32) -> CodepointSet;

    /// Simple case-fold closure of every member of `set`.
    fn fold_closure(&self, set: &CodepointSet) -> CodepointSet {
        let mut out = set.clone();
        for cp in set.iter() {
            out.extend(&self.simple_folds(cp));
        }
        out
    }

    /// Full case fold of `cp` when it is longer than one code point.
    fn multi_char_fold(&self, cp: u32) -> Option<&'static [u32]> {
        MULTI_CHAR_FOLDS
            .binary_search_by_key(&cp, |&(src, _)| src)
            .ok()
            .map(|i| MULTI_CHAR_FOLDS[i].1)
    }

    /// True when `seq` (already folded) is a proper prefix of, or equal to,
    /// the fold of some code point with a multi-character fold.
    fn is_multi_fold_prefix(&self, seq: &[u32]) -> bool {
        !seq.is_empty()
            && MULTI_CHAR_FOLDS
                .iter()
                .any(|&(_, fold)| fold.len() >= seq.len() && fold[..seq.len()] == *seq)
    }

    /// True when the fold of `cp` cannot be known before the run-time
    /// locale is.
    fn is_locale_fold_problem(&self, cp: u32) -> bool {
        cp < 0x100 || matches!(cp, 0x130 | 0x131 | 0x17F | 0x1E9E | 0x212A)
    }

    /// Resolves a character name or named sequence from `\N{...}`.
    fn named_sequence(&self, name: &str) -> Option<Vec<u32>> {
        names::lookup(name)
    }

    /// Every (name, code point) pair, for `\p{name=/.../}` wildcards.
    fn all_names(&self) -> Vec<(String, u32)> {
        names::all_names()
    }
}
