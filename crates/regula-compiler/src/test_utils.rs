//! Test helpers and snapshot macros.

use regula_bytecode::dump;
use regula_core::Colors;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::{Error, Pattern, PatternBuilder};

/// Compiles with default options; panics with the rendered diagnostics on
/// failure.
pub fn compile_ok(src: &str) -> Pattern {
    compile_with(src, "").unwrap_or_else(|e| panic!("`{src}` failed: {}", describe(src, &e)))
}

/// Compiles with a flag string such as `"ix"`.
pub fn compile_with(src: &str, flags: &str) -> crate::Result<Pattern> {
    PatternBuilder::new(src)
        .with_flags(flags)
        .expect("valid flag string")
        .compile()
}

/// Compiles expecting a pattern error and returns its diagnostics.
pub fn compile_err(src: &str) -> Diagnostics {
    compile_err_with(src, "")
}

pub fn compile_err_with(src: &str, flags: &str) -> Diagnostics {
    match compile_with(src, flags) {
        Err(Error::PatternError(diag)) => diag,
        Err(other) => panic!("`{src}` failed with {other}, expected diagnostics"),
        Ok(_) => panic!("`{src}` compiled, expected an error"),
    }
}

/// Kinds of the warnings a successful compile produced.
pub fn warning_kinds(src: &str, flags: &str) -> Vec<DiagnosticKind> {
    match compile_with(src, flags) {
        Ok(pattern) => pattern.diagnostics().kinds(),
        Err(e) => panic!("`{src}` failed: {}", describe(src, &e)),
    }
}

pub fn dump_of(src: &str) -> String {
    dump(compile_ok(src).program(), Colors::OFF)
}

pub fn errors_of(src: &str) -> String {
    compile_err(src).printer().source(src).render()
}

fn describe(src: &str, e: &Error) -> String {
    match e {
        Error::PatternError(diag) => diag.printer().source(src).render(),
        other => other.to_string(),
    }
}

/// Snapshot of the program dump.
#[macro_export]
macro_rules! shot_dump {
    ($pattern:literal, @$snapshot:literal) => {{
        let pattern = indoc::indoc!($pattern).trim();
        let output = $crate::test_utils::dump_of(pattern);
        insta::assert_snapshot!(output, @$snapshot);
    }};
}

/// Snapshot of the rendered error diagnostics.
#[macro_export]
macro_rules! shot_error {
    ($pattern:literal, @$snapshot:literal) => {{
        let pattern = indoc::indoc!($pattern).trim();
        let output = $crate::test_utils::errors_of(pattern);
        insta::assert_snapshot!(output, @$snapshot);
    }};
}
