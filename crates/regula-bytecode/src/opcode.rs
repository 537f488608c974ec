//! Opcode table.
//!
//! Every node starts with a header word holding the opcode, an 8-bit flag
//! field whose meaning depends on the opcode, and (in narrow-link programs)
//! the 16-bit distance to the next node. The operand area that follows has
//! one of the shapes in [`Operands`].

use serde::Serialize;

/// Operand area layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operands {
    None,
    /// One 32-bit integer.
    Arg1,
    /// Two 32-bit integers.
    Arg2,
    /// Byte length word followed by the packed bytes.
    Str,
    /// Side-table index word followed by a 256-bit bitmap.
    Class,
}

/// Words in the inline bitmap of a class node.
pub const BITMAP_WORDS: usize = 8;

/// Side-table index meaning "no side-table entry".
pub const NO_AUX: u32 = u32::MAX;

/// Loop maximum meaning "no upper bound".
pub const UNBOUNDED: u32 = u32::MAX;

/// Largest finite quantifier bound.
pub const MAX_FINITE_BOUND: u32 = 65534;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum Opcode {
    /// End of program; the match succeeds.
    End = 0,
    /// End of a lookaround or atomic body.
    Succeed,
    Nothing,
    /// Joins the fall-through of a construct to what follows.
    Tail,
    /// Unconditional failure.
    OpFail,

    Bol,
    Mbol,
    Sbol,
    Eol,
    Meol,
    Seol,
    Eos,
    Gpos,
    Keep,
    Bound,
    NBound,

    RegAny,
    SAny,
    Exact,
    ExactFold,
    ExactFoldLocale,
    AnyOf,
    AnyOfR,
    AnyOfM,
    NAnyOfM,
    Posix,
    NPosix,
    Clump,
    LineBreak,

    Branch,
    /// Compact loops over one simple node.
    Star,
    Plus,
    Curly,
    /// General loop controller. The body ends in a `WhileM`; the
    /// controller's own next is the loop exit.
    CurlyX,
    WhileM,

    Open,
    Close,
    Ref,
    RefFold,
    RefName,
    RefNameFold,

    IfMatch,
    Unless,
    Suspend,
    ScriptRunOpen,
    ScriptRunClose,
    IfThen,
    GroupP,
    GroupPName,
    InSubP,
    DefineP,
    GoSub,
    Eval,

    Commit,
    Prune,
    Skip,
    Then,
    Mark,
    Accept,
}

impl Opcode {
    pub const COUNT: usize = Opcode::Accept as usize + 1;

    pub fn from_u8(v: u8) -> Option<Self> {
        use Opcode::*;
        const TABLE: [Opcode; Opcode::COUNT] = [
            End, Succeed, Nothing, Tail, OpFail, Bol, Mbol, Sbol, Eol, Meol, Seol, Eos, Gpos, Keep,
            Bound, NBound, RegAny, SAny, Exact, ExactFold, ExactFoldLocale, AnyOf, AnyOfR, AnyOfM,
            NAnyOfM, Posix, NPosix, Clump, LineBreak, Branch, Star, Plus, Curly, CurlyX, WhileM,
            Open, Close, Ref, RefFold, RefName, RefNameFold, IfMatch, Unless, Suspend,
            ScriptRunOpen, ScriptRunClose, IfThen, GroupP, GroupPName, InSubP, DefineP, GoSub,
            Eval, Commit, Prune, Skip, Then, Mark, Accept,
        ];
        TABLE.get(usize::from(v)).copied()
    }

    pub fn operands(self) -> Operands {
        use Opcode::*;
        match self {
            Exact | ExactFold | ExactFoldLocale => Operands::Str,
            AnyOf => Operands::Class,
            AnyOfR | AnyOfM | NAnyOfM | Curly | CurlyX | IfMatch | Unless | GoSub => {
                Operands::Arg2
            }
            Open | Close | Ref | RefFold | RefName | RefNameFold | GroupP | GroupPName | InSubP
            | Eval | Prune | Skip | Then | Mark | Accept => Operands::Arg1,
            _ => Operands::None,
        }
    }

    /// Operand words, given the byte length for string operands.
    pub fn operand_words(self, str_len: usize) -> usize {
        match self.operands() {
            Operands::None => 0,
            Operands::Arg1 => 1,
            Operands::Arg2 => 2,
            Operands::Str => 1 + str_len.div_ceil(4),
            Operands::Class => 1 + BITMAP_WORDS,
        }
    }

    /// Matches exactly one character with no side effects; may be the body
    /// of a compact loop.
    pub fn is_simple(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            RegAny | SAny | AnyOf | AnyOfR | AnyOfM | NAnyOfM | Posix | NPosix
        )
    }

    /// Never consumes input.
    pub fn is_zero_width(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            Bol | Mbol
                | Sbol
                | Eol
                | Meol
                | Seol
                | Eos
                | Gpos
                | Keep
                | Bound
                | NBound
                | Nothing
                | Tail
                | IfMatch
                | Unless
                | Mark
                | Commit
                | Prune
                | Skip
                | Then
                | Open
                | Close
                | Succeed
                | WhileM
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(self, Opcode::Exact | Opcode::ExactFold | Opcode::ExactFoldLocale)
    }

    /// Opcodes whose operand area is followed by an inline body.
    pub fn has_body(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            Branch | Star | Plus | Curly | CurlyX | IfMatch | Unless | Suspend | IfThen
        )
    }

    pub fn name(self) -> &'static str {
        use Opcode::*;
        match self {
            End => "END",
            Succeed => "SUCCEED",
            Nothing => "NOTHING",
            Tail => "TAIL",
            OpFail => "OPFAIL",
            Bol => "BOL",
            Mbol => "MBOL",
            Sbol => "SBOL",
            Eol => "EOL",
            Meol => "MEOL",
            Seol => "SEOL",
            Eos => "EOS",
            Gpos => "GPOS",
            Keep => "KEEPS",
            Bound => "BOUND",
            NBound => "NBOUND",
            RegAny => "REG_ANY",
            SAny => "SANY",
            Exact => "EXACT",
            ExactFold => "EXACTF",
            ExactFoldLocale => "EXACTFL",
            AnyOf => "ANYOF",
            AnyOfR => "ANYOFR",
            AnyOfM => "ANYOFM",
            NAnyOfM => "NANYOFM",
            Posix => "POSIX",
            NPosix => "NPOSIX",
            Clump => "CLUMP",
            LineBreak => "LNBREAK",
            Branch => "BRANCH",
            Star => "STAR",
            Plus => "PLUS",
            Curly => "CURLY",
            CurlyX => "CURLYX",
            WhileM => "WHILEM",
            Open => "OPEN",
            Close => "CLOSE",
            Ref => "REF",
            RefFold => "REFF",
            RefName => "REFN",
            RefNameFold => "REFFN",
            IfMatch => "IFMATCH",
            Unless => "UNLESSM",
            Suspend => "SUSPEND",
            ScriptRunOpen => "SROPEN",
            ScriptRunClose => "SRCLOSE",
            IfThen => "IFTHEN",
            GroupP => "GROUPP",
            GroupPName => "GROUPPN",
            InSubP => "INSUBP",
            DefineP => "DEFINEP",
            GoSub => "GOSUB",
            Eval => "EVAL",
            Commit => "COMMIT",
            Prune => "PRUNE",
            Skip => "SKIP",
            Then => "CUTGROUP",
            Mark => "MARKPOINT",
            Accept => "ACCEPT",
        }
    }
}

/// Per-opcode meanings of the header flag byte.
pub mod flag {
    /// `Star`, `Plus`, `Curly`, `CurlyX`: non-greedy.
    pub const LAZY: u8 = 0x01;
    /// `IfMatch`, `Unless`: the body is matched backwards from the current position.
    pub const BEHIND: u8 = 0x01;
    /// `Eval`: `(??{ })`, the result is used as a sub-pattern.
    pub const POSTPONED: u8 = 0x01;
    /// `Eval`: the callback is the condition of a conditional.
    pub const CONDITION: u8 = 0x02;
    /// `InSubP`: the operand is a name-table index.
    pub const NAMED: u8 = 0x01;

    /// `AnyOf`: the operand indexes a class side-table entry.
    pub const CLASS_HAS_AUX: u8 = 0x01;
    /// `AnyOf`: the side-table part is inverted at match time.
    pub const CLASS_INVERTED: u8 = 0x02;
    /// `AnyOf`: membership depends on the run-time locale.
    pub const CLASS_LOCALE: u8 = 0x04;
    /// `AnyOf`: some members match only against UTF-8 targets.
    pub const CLASS_UTF8_ONLY: u8 = 0x08;
    /// `AnyOf`: a user-defined property is resolved on first use.
    pub const CLASS_DEFERRED: u8 = 0x10;
    /// `AnyOf`: every code point above the bitmap matches.
    pub const CLASS_ALL_ABOVE: u8 = 0x20;

    /// `Posix`, `NPosix`, `Bound`, `NBound`, `ExactFold`, `RefFold`: charset
    /// mode lives in bits 4..7.
    pub const CHARSET_SHIFT: u8 = 4;
    pub const LOW_MASK: u8 = 0x0F;
}

/// Character-set rules in effect for a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Charset {
    /// Unicode rules only when the target (or pattern) is UTF-8.
    #[default]
    Depends = 0,
    Unicode = 1,
    /// `\d \s \w` and POSIX classes are ASCII-only.
    Ascii = 2,
    /// As `Ascii`, and no fold crosses the ASCII boundary.
    AsciiStrict = 3,
    Locale = 4,
}

impl Charset {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Depends,
            1 => Self::Unicode,
            2 => Self::Ascii,
            3 => Self::AsciiStrict,
            4 => Self::Locale,
            _ => return None,
        })
    }

    /// Modifier spelling: `d`, `u`, `a`, `aa`, `l`.
    pub fn modifier(self) -> &'static str {
        match self {
            Self::Depends => "d",
            Self::Unicode => "u",
            Self::Ascii => "a",
            Self::AsciiStrict => "aa",
            Self::Locale => "l",
        }
    }

    pub fn is_ascii_restricted(self) -> bool {
        matches!(self, Self::Ascii | Self::AsciiStrict)
    }
}

/// `\b{...}` flavors, stored in the low bits of `Bound`/`NBound` flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum BoundKind {
    Word = 0,
    Gcb = 1,
    Lb = 2,
    Sb = 3,
    Wb = 4,
}

impl BoundKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Word,
            1 => Self::Gcb,
            2 => Self::Lb,
            3 => Self::Sb,
            4 => Self::Wb,
            _ => return None,
        })
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "gcb" | "g" => Self::Gcb,
            "lb" => Self::Lb,
            "sb" => Self::Sb,
            "wb" => Self::Wb,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Word => "",
            Self::Gcb => "gcb",
            Self::Lb => "lb",
            Self::Sb => "sb",
            Self::Wb => "wb",
        }
    }
}

/// Packs a low 4-bit value with a charset into a flag byte.
pub fn charset_flags(low: u8, charset: Charset) -> u8 {
    (low & flag::LOW_MASK) | ((charset as u8) << flag::CHARSET_SHIFT)
}

pub fn split_charset_flags(flags: u8) -> (u8, Option<Charset>) {
    (
        flags & flag::LOW_MASK,
        Charset::from_u8(flags >> flag::CHARSET_SHIFT),
    )
}
