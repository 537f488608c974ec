//! High-level compile facade.
//!
//! [`PatternBuilder`] collects options and runs the pass loop: parse, and on
//! a restart request parse again with what the aborted pass learned. Each
//! restart kind is granted once. The finished node array is studied and
//! wrapped into a [`Program`].

use std::sync::Arc;

use indexmap::IndexMap;
use regula_bytecode::{Charset, CompileStats, Program, ProgramParts, RestartKind};
use regula_core::UnicodeData;

use crate::diagnostics::Diagnostics;
use crate::options::{CallbackHook, CompileOptions, Tuning, UnknownFlag};
use crate::parse::{self, Abort, Interrupted, MAX_PROGRAM_SLOTS, PassKnowledge};
use crate::render::render;
use crate::study::study;
use crate::trace::{CompileTracer, NoopTracer};
use crate::{Error, Result};

/// A compiled pattern together with the warnings its compile produced.
#[derive(Debug)]
pub struct Pattern {
    source: String,
    program: Program,
    diagnostics: Diagnostics,
}

impl Pattern {
    /// Compiles `source` with default options.
    pub fn new(source: &str) -> Result<Self> {
        PatternBuilder::new(source).compile()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn into_program(self) -> Program {
        self.program
    }

    /// Warnings. A pattern with errors never compiles.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn rendering(&self) -> &str {
        self.program.rendering()
    }

    /// Capture names and the logical groups carrying each.
    pub fn names(&self) -> &IndexMap<String, Vec<u32>> {
        self.program.names()
    }
}

pub struct PatternBuilder {
    source: String,
    options: CompileOptions,
}

impl PatternBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Applies a flag string such as `"imsx"` on top of the current options.
    pub fn with_flags(mut self, flags: &str) -> std::result::Result<Self, UnknownFlag> {
        self.options.apply_flags(flags)?;
        Ok(self)
    }

    pub fn with_fold(mut self, on: bool) -> Self {
        self.options.fold = on;
        self
    }

    pub fn with_multiline(mut self, on: bool) -> Self {
        self.options.multiline = on;
        self
    }

    pub fn with_dot_all(mut self, on: bool) -> Self {
        self.options.dot_all = on;
        self
    }

    pub fn with_extended(mut self, on: bool) -> Self {
        self.options.extended = on;
        self
    }

    pub fn with_no_capture(mut self, on: bool) -> Self {
        self.options.no_capture = on;
        self
    }

    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.options.charset = charset;
        self
    }

    pub fn with_strict(mut self, on: bool) -> Self {
        self.options.strict = on;
        self
    }

    pub fn with_warnings_fatal(mut self, on: bool) -> Self {
        self.options.warnings_fatal = on;
        self
    }

    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.options.max_depth = limit;
        self
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.options.tuning = tuning;
        self
    }

    pub fn with_unicode(mut self, unicode: Arc<dyn UnicodeData>) -> Self {
        self.options.unicode = unicode;
        self
    }

    pub fn with_callbacks(mut self, hook: Arc<dyn CallbackHook>) -> Self {
        self.options.callbacks = Some(hook);
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn compile(self) -> Result<Pattern> {
        self.compile_traced(&mut NoopTracer)
    }

    pub fn compile_traced<T: CompileTracer>(self, tracer: &mut T) -> Result<Pattern> {
        let (program, diagnostics) = compile_program(&self.source, &self.options, tracer)?;
        Ok(Pattern {
            source: self.source,
            program,
            diagnostics,
        })
    }
}

fn compile_program<T: CompileTracer>(
    source: &str,
    opts: &CompileOptions,
    tracer: &mut T,
) -> Result<(Program, Diagnostics)> {
    let mut known = PassKnowledge::default();
    let mut stats = CompileStats::default();

    let parsed = loop {
        stats.passes += 1;
        tracer.trace_pass(stats.passes, known.encoding);
        let Interrupted {
            abort,
            mut diagnostics,
            totals,
        } = match parse::run(source, opts, &known, tracer) {
            Ok(parsed) => break parsed,
            Err(interrupted) => interrupted,
        };

        let kind = match abort {
            Abort::Restart(kind) => kind,
            Abort::Reported => {
                if opts.warnings_fatal {
                    diagnostics.escalate_warnings();
                }
                return Err(Error::PatternError(diagnostics));
            }
            Abort::RecursionLimit => return Err(Error::RecursionLimitExceeded),
            Abort::TooLarge => return Err(Error::ProgramTooLarge(MAX_PROGRAM_SLOTS)),
        };
        if stats.restarts.contains(&kind) {
            return Err(Error::RestartLimitExceeded);
        }
        tracer.trace_restart(kind);
        stats.restarts.push(kind);
        match kind {
            RestartKind::Upgrade => known.encoding.utf8 = true,
            RestartKind::WideLinks => known.encoding.wide_links = true,
            RestartKind::CountGroups => known.totals = Some(totals),
        }
    };

    let mut diagnostics = parsed.diagnostics;
    if opts.warnings_fatal {
        diagnostics.escalate_warnings();
    }
    if diagnostics.has_errors() {
        return Err(Error::PatternError(diagnostics));
    }

    let info = study(
        &parsed.code,
        parsed.encoding,
        parsed.flags,
        &parsed.classes,
        opts,
        tracer,
    );
    let parts = ProgramParts {
        rendering: render(source, opts, parsed.encoding.utf8),
        code: parsed.code,
        encoding: parsed.encoding,
        study: info,
        flags: parsed.flags,
        captures: parsed.captures,
        classes: parsed.classes,
        verb_args: parsed.verb_args,
        stats,
    };
    let program = Program::from_parts(parts).expect("emitter produced a malformed node array");
    Ok((program, diagnostics))
}
