//! Regula compiler: parser, class engine, emitter and optimizer.
//!
//! This crate turns pattern text into a [`regula_bytecode::Program`]:
//! - `parse` - grammar levels, escapes, groups, verbs and set expressions
//! - `class` - bracket classes, POSIX classes, properties and class nodes
//! - `emit` - node array construction and link patching
//! - `study` - length bounds, anchoring, required substrings, start class
//! - `diagnostics` - error reporting
//! - `pattern` - high-level [`Pattern`] facade
//!
//! # Example
//!
//! ```
//! use regula_compiler::Pattern;
//!
//! let pattern = Pattern::new("^foo[0-9]+$").expect("valid pattern");
//! assert_eq!(pattern.program().min_len(), 4);
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod class;
pub mod diagnostics;
mod emit;
pub mod options;
mod parse;
pub mod pattern;
pub mod render;
mod source;
mod study;
pub mod trace;

#[cfg(test)]
mod pattern_tests;
#[cfg(test)]
pub mod test_utils;

pub use diagnostics::{DiagnosticKind, Diagnostics, DiagnosticsPrinter, Severity};
pub use options::{CallbackHook, CompileOptions, DEFAULT_MAX_DEPTH, Tuning, UnknownFlag};
pub use pattern::{Pattern, PatternBuilder};
pub use trace::{CompileTracer, NoopTracer, PrintTracer};

/// Errors that can occur while compiling a pattern.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("pattern compilation failed with {} errors", .0.error_count())]
    PatternError(Diagnostics),

    /// Recursion fuel exhausted (pattern nested too deeply).
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,

    #[error("program exceeds {0} slots")]
    ProgramTooLarge(usize),

    /// A restart kind was requested twice in one compile.
    #[error("restart limit exceeded")]
    RestartLimitExceeded,
}

/// Result type for compile operations.
pub type Result<T> = std::result::Result<T, Error>;
