//! Shared logic for every command: load the pattern, build it, report.

use std::path::PathBuf;

use regula_compiler::{CompileTracer, Diagnostics, Error, Pattern, PatternBuilder};

use super::pattern_loader::{LoadedPattern, load_pattern};

/// Where the pattern text comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternSource {
    Text(String),
    /// A path, or "-" for stdin.
    File(PathBuf),
}

/// Compile flags collected from the command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatternFlags {
    pub fold: bool,
    pub multiline: bool,
    pub dot_all: bool,
    /// 1 for `x`, 2 or more for `xx`.
    pub extended: u8,
    pub no_capture: bool,
    pub charset: Option<String>,
    pub strict: bool,
    pub warnings_fatal: bool,
}

impl PatternFlags {
    /// Modifier letters in the form `CompileOptions::apply_flags` accepts.
    pub fn modifier_letters(&self) -> String {
        let mut letters = String::new();
        for (on, letter) in [
            (self.fold, "i"),
            (self.multiline, "m"),
            (self.dot_all, "s"),
            (self.extended > 0, "x"),
            (self.extended > 1, "x"),
            (self.no_capture, "n"),
        ] {
            if on {
                letters.push_str(letter);
            }
        }
        if let Some(charset) = &self.charset {
            letters.push_str(charset);
        }
        letters
    }
}

pub fn load_or_exit(source: &PatternSource) -> LoadedPattern {
    load_pattern(source).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(1);
    })
}

pub fn builder_for(pattern: &LoadedPattern, flags: &PatternFlags) -> PatternBuilder {
    let builder = PatternBuilder::new(pattern.text.as_str())
        .with_flags(&flags.modifier_letters())
        .unwrap_or_else(|e| {
            eprintln!("error: {}", e);
            std::process::exit(1);
        });
    builder
        .with_strict(flags.strict)
        .with_warnings_fatal(flags.warnings_fatal)
}

/// Compile or print the failure and exit with status 1.
pub fn compile_or_exit<T: CompileTracer>(
    pattern: &LoadedPattern,
    flags: &PatternFlags,
    color: bool,
    tracer: &mut T,
) -> Pattern {
    match builder_for(pattern, flags).compile_traced(tracer) {
        Ok(compiled) => compiled,
        Err(Error::PatternError(diagnostics)) => {
            print_diagnostics(&diagnostics, pattern, color);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Render diagnostics against the pattern text on stderr.
pub fn print_diagnostics(diagnostics: &Diagnostics, pattern: &LoadedPattern, color: bool) {
    if diagnostics.is_empty() {
        return;
    }
    let mut printer = diagnostics
        .printer()
        .source(&pattern.text)
        .colored(color)
        .summary(true);
    if let Some(path) = &pattern.path {
        printer = printer.path(path);
    }
    eprintln!("{}", printer.render());
}
