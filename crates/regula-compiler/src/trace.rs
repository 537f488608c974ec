//! Tracing hooks for watching a compile.
//!
//! The parser is generic over [`CompileTracer`]. With [`NoopTracer`] every
//! hook is an empty `#[inline(always)]` function and the calls vanish;
//! [`PrintTracer`] records one line per event for `regula dump --trace`.

use regula_bytecode::{Encoding, Opcode, RestartKind, StudyInfo};
use regula_core::{CodepointSet, Colors};

pub trait CompileTracer {
    /// Called when a pass starts, with the encoding it assumes.
    fn trace_pass(&mut self, pass: u8, encoding: Encoding);

    /// Called when a pass is abandoned.
    fn trace_restart(&mut self, kind: RestartKind);

    /// Called after a node is appended.
    fn trace_emit(&mut self, offset: usize, op: Opcode);

    /// Called after a node is inserted in front of already emitted code.
    fn trace_insert(&mut self, offset: usize, op: Opcode);

    /// Called when a class has been resolved to a node.
    fn trace_class(&mut self, pos: usize, set: &CodepointSet, op: Opcode);

    /// Called when the optimizer gives up on a start class.
    fn trace_abandon(&mut self, reason: &'static str);

    /// Called once the optimizer is done.
    fn trace_study(&mut self, study: &StudyInfo);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl CompileTracer for NoopTracer {
    #[inline(always)]
    fn trace_pass(&mut self, _pass: u8, _encoding: Encoding) {}

    #[inline(always)]
    fn trace_restart(&mut self, _kind: RestartKind) {}

    #[inline(always)]
    fn trace_emit(&mut self, _offset: usize, _op: Opcode) {}

    #[inline(always)]
    fn trace_insert(&mut self, _offset: usize, _op: Opcode) {}

    #[inline(always)]
    fn trace_class(&mut self, _pos: usize, _set: &CodepointSet, _op: Opcode) {}

    #[inline(always)]
    fn trace_abandon(&mut self, _reason: &'static str) {}

    #[inline(always)]
    fn trace_study(&mut self, _study: &StudyInfo) {}
}

/// Tracer that collects one line per compile event.
pub struct PrintTracer {
    lines: Vec<String>,
    colors: Colors,
}

impl PrintTracer {
    pub fn new(colors: Colors) -> Self {
        Self {
            lines: Vec::new(),
            colors,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Print all trace lines.
    pub fn print(&self) {
        for line in &self.lines {
            println!("{}", line);
        }
    }

    pub fn into_string(self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

impl CompileTracer for PrintTracer {
    fn trace_pass(&mut self, pass: u8, encoding: Encoding) {
        let c = self.colors;
        if !self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.lines.push(format!(
            "{}pass {pass}{} ({}, {} links)",
            c.blue,
            c.reset,
            if encoding.utf8 { "utf8" } else { "latin1" },
            if encoding.wide_links { "wide" } else { "narrow" }
        ));
    }

    fn trace_restart(&mut self, kind: RestartKind) {
        let c = self.colors;
        let reason = match kind {
            RestartKind::Upgrade => "code point above 0xFF",
            RestartKind::CountGroups => "group count needed",
            RestartKind::WideLinks => "link distance overflow",
        };
        self.lines
            .push(format!("  {}restart{}: {reason}", c.yellow, c.reset));
    }

    fn trace_emit(&mut self, offset: usize, op: Opcode) {
        self.lines.push(format!("  + {offset} {}", op.name()));
    }

    fn trace_insert(&mut self, offset: usize, op: Opcode) {
        let c = self.colors;
        self.lines
            .push(format!("  {}^{} {offset} {}", c.yellow, c.reset, op.name()));
    }

    fn trace_class(&mut self, pos: usize, set: &CodepointSet, op: Opcode) {
        let c = self.colors;
        self.lines.push(format!(
            "  {}class{} @{pos} {}{set}{} => {}",
            c.dim,
            c.reset,
            c.green,
            c.reset,
            op.name()
        ));
    }

    fn trace_abandon(&mut self, reason: &'static str) {
        let c = self.colors;
        self.lines
            .push(format!("  {}no start class{}: {reason}", c.dim, c.reset));
    }

    fn trace_study(&mut self, study: &StudyInfo) {
        let max = study
            .max_len
            .map_or_else(|| "unbounded".to_string(), |m| m.to_string());
        self.lines
            .push(format!("study: minlen {}, maxlen {max}", study.min_len));
    }
}
