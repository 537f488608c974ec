//! Pattern-wide facts collected while parsing and studying, consumed by
//! the matcher.

use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
    pub struct ProgramFlags: u32 {
        const BACKREF = 1 << 0;
        const LOOKBEHIND = 1 << 1;
        const LOOKAHEAD = 1 << 2;
        const RECURSION = 1 << 3;
        /// A general loop whose body can match the empty string.
        const ZERO_LEN_LOOP = 1 << 4;
        /// Nested quantifiers past the complexity threshold.
        const NAUGHTY = 1 << 5;
        const LOCALE = 1 << 6;
        /// Some quantifier has no upper bound.
        const UNBOUNDED = 1 << 7;
        const GPOS = 1 << 8;
        const KEEP = 1 << 9;
        const EVAL = 1 << 10;
        const VERBS = 1 << 11;
        const CUTGROUP = 1 << 12;
        const ZERO_LEN_ASSERT = 1 << 13;
        const GENERAL_LOOP = 1 << 14;
        const DEFERRED = 1 << 15;
        const CONDITIONAL = 1 << 16;
        /// A case-insensitive literal could match a multi-character fold.
        const UNFOLDED_MULTI = 1 << 17;
    }
}

impl ProgramFlags {
    /// Lowercase flag names, in bit order.
    pub fn names(self) -> Vec<String> {
        self.iter_names()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect()
    }
}
