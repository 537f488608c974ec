#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Compiled program format for regula.
//!
//! - [`Opcode`] table and per-opcode flag meanings
//! - [`Encoding`] and [`Node`] views over the `u32` slot array
//! - [`Program`] with study results, capture tables and side tables
//! - [`dump`] for a human-readable listing

mod dump;
mod flags;
mod node;
mod opcode;
mod program;

#[cfg(test)]
mod opcode_tests;
#[cfg(test)]
mod program_tests;

pub use dump::dump;
pub use flags::ProgramFlags;
pub use node::{Encoding, LinkOverflow, MAX_NARROW_LINK, Node, Nodes, pack_str, unpack_str};
pub use opcode::{
    BITMAP_WORDS, BoundKind, Charset, MAX_FINITE_BOUND, NO_AUX, Opcode, Operands, UNBOUNDED,
    charset_flags, flag, split_charset_flags,
};
pub use program::{
    Anchor, Anchoring, Captures, ClassData, CompileStats, DecodeError, DeferredProperty, Program,
    ProgramParts, ProgramSummary, RequiredSubstring, RestartKind, StartClass, StudyInfo,
    SubstrCheck, validate,
};
