//! Renders diagnostics against the pattern text.

use std::fmt;
use std::ops::Range;

use annotate_snippets::{AnnotationKind, Group, Level, Patch, Renderer, Snippet};
use rowan::TextRange;

use super::{DiagnosticMessage, Diagnostics, Severity};

/// Builder for the human-readable form of a [`Diagnostics`] collection.
///
/// Without a source each diagnostic is one line with its byte range. With
/// the pattern text, the offending span is underlined, hints become `help`
/// footers and a suggested rewrite is shown as a patch.
pub struct DiagnosticsPrinter<'d, 's> {
    diagnostics: &'d Diagnostics,
    source: Option<&'s str>,
    origin: Option<&'s str>,
    colored: bool,
    filtered: bool,
    summary: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics) -> Self {
        Self {
            diagnostics,
            source: None,
            origin: None,
            colored: false,
            filtered: false,
            summary: false,
        }
    }

    pub fn source(mut self, source: &'s str) -> Self {
        self.source = Some(source);
        self
    }

    /// Where the pattern came from, usually the file it was read from.
    pub fn path(mut self, origin: &'s str) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    /// Only print the highest-priority diagnostic at each position.
    pub fn filtered(mut self, value: bool) -> Self {
        self.filtered = value;
        self
    }

    /// End the output with the error and warning counts.
    pub fn summary(mut self, value: bool) -> Self {
        self.summary = value;
        self
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    fn messages(&self) -> Vec<&'d DiagnosticMessage> {
        if self.filtered {
            self.diagnostics.filtered()
        } else {
            self.diagnostics.iter().collect()
        }
    }

    fn report<'a>(&'a self, diag: &'a DiagnosticMessage, source: &'a str) -> Vec<Group<'a>> {
        let span = underline(diag.range, source);

        let mut snippet = Snippet::source(source)
            .line_start(1)
            .annotation(AnnotationKind::Primary.span(span.clone()).label(&diag.message));
        if let Some(origin) = self.origin {
            snippet = snippet.path(origin);
        }
        for related in &diag.related {
            snippet = snippet.annotation(
                AnnotationKind::Context
                    .span(underline(related.range, source))
                    .label(&related.message),
            );
        }

        let mut group = level(diag.severity)
            .primary_title(&diag.message)
            .element(snippet);
        for hint in &diag.hints {
            group = group.element(Level::HELP.message(hint.as_str()));
        }

        let mut report = vec![group];
        if let Some(fix) = &diag.fix {
            report.push(
                Level::HELP.secondary_title(&fix.description).element(
                    Snippet::source(source)
                        .line_start(1)
                        .patch(Patch::new(span, &fix.replacement)),
                ),
            );
        }
        report
    }
}

impl fmt::Display for DiagnosticsPrinter<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages = self.messages();
        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, diag) in messages.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match self.source {
                Some(source) => write!(f, "{}", renderer.render(&self.report(diag, source)))?,
                None => write!(f, "{diag}")?,
            }
        }

        if self.summary && !messages.is_empty() {
            let errors = messages.iter().filter(|m| m.is_error()).count();
            let warnings = messages.len() - errors;
            write!(f, "\n{}, {}", counted(errors, "error"), counted(warnings, "warning"))?;
        }
        Ok(())
    }
}

fn level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Error => Level::ERROR,
        Severity::Warning => Level::WARNING,
    }
}

fn counted(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// Byte span to underline for `range`. Both ends sit on character
/// boundaries; an empty range covers the character it points at.
fn underline(range: TextRange, source: &str) -> Range<usize> {
    let boundary = |at: usize| {
        let mut at = at.min(source.len());
        while !source.is_char_boundary(at) {
            at += 1;
        }
        at
    };
    let start = boundary(range.start().into());
    let end = boundary(range.end().into());
    if start < end {
        return start..end;
    }
    let width = source[start..].chars().next().map_or(0, char::len_utf8);
    start..start + width
}

impl Diagnostics {
    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }
}
