use rowan::TextRange;

use super::*;

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(start.into(), end.into())
}

#[test]
fn severity_display() {
    insta::assert_snapshot!(format!("{}", Severity::Error), @"error");
    insta::assert_snapshot!(format!("{}", Severity::Warning), @"warning");
}

#[test]
fn kinds_after_reversed_quantifier_are_warnings() {
    assert_eq!(
        DiagnosticKind::LookbehindTooLong.default_severity(),
        Severity::Error
    );
    assert_eq!(
        DiagnosticKind::ReversedQuantifier.default_severity(),
        Severity::Warning
    );
    assert_eq!(
        DiagnosticKind::AssumedPosixClass.default_severity(),
        Severity::Warning
    );
}

#[test]
fn report_with_default_message() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::NestedQuantifier, range(2, 3))
        .emit();

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.has_errors());
    insta::assert_snapshot!(diagnostics.to_string(), @"error at 2..3: nested quantifiers");
}

#[test]
fn report_with_custom_message() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnknownPosixClass, range(1, 10))
        .message("bogus")
        .emit();

    insta::assert_snapshot!(diagnostics.to_string(), @"error at 1..10: unknown POSIX class `[:bogus:]`");
}

#[test]
fn default_hint_is_attached() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::ReversedQuantifier, range(1, 6))
        .emit();

    assert!(diagnostics.has_warnings());
    assert!(!diagnostics.has_errors());
    insta::assert_snapshot!(
        diagnostics.to_string(),
        @"warning at 1..6: quantifier with minimum above maximum can't match (hint: write the smaller bound first)"
    );
}

#[test]
fn checkpoint_and_rollback() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnescapedBrace, range(0, 1))
        .emit();
    let cp = diagnostics.checkpoint();
    diagnostics
        .report(DiagnosticKind::AssumedPosixClass, range(2, 8))
        .message("alpha")
        .emit();
    diagnostics
        .report(DiagnosticKind::FalseRange, range(3, 4))
        .emit();
    assert_eq!(diagnostics.len(), 3);

    diagnostics.rollback(cp);
    assert_eq!(diagnostics.kinds(), vec![DiagnosticKind::UnescapedBrace]);
}

#[test]
fn escalate_turns_warnings_into_errors() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UselessGreediness, range(0, 4))
        .emit();
    assert_eq!(diagnostics.error_count(), 0);

    diagnostics.escalate_warnings();
    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(diagnostics.warning_count(), 0);
}

#[test]
fn filtered_keeps_highest_priority_at_same_start() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnterminatedClass, range(0, 4))
        .emit();
    diagnostics
        .report(DiagnosticKind::InvalidRange, range(0, 3))
        .emit();
    diagnostics
        .report(DiagnosticKind::FalseRange, range(2, 3))
        .emit();

    let kinds: Vec<_> = diagnostics.filtered().iter().map(|m| m.kind()).collect();
    assert_eq!(
        kinds,
        vec![DiagnosticKind::UnterminatedClass, DiagnosticKind::FalseRange]
    );
}

#[test]
fn builder_with_related() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnmatchedOpen, range(0, 5))
        .message("primary")
        .related_to("related info", range(6, 10))
        .emit();

    assert_eq!(diagnostics.len(), 1);
    let result = diagnostics.printer().source("hello world!").render();
    insta::assert_snapshot!(result, @r"
    error: unmatched `(`; primary
      |
    1 | hello world!
      | ^^^^^ ---- related info
    ");
}

#[test]
fn builder_with_fix() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnescapedBrace, range(1, 2))
        .fix("escape the brace", "\\{")
        .emit();

    let result = diagnostics.printer().render();
    insta::assert_snapshot!(
        result,
        @r"warning at 1..2: unescaped literal `{` (fix: escape the brace) (hint: escape it with a backslash)"
    );
}

#[test]
fn printer_colored() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::NestedQuantifier, range(0, 2))
        .message("test")
        .emit();

    let result = diagnostics.printer().source("a**").colored(true).render();
    assert!(result.contains("test"));
    assert!(result.contains('\x1b'));
}

#[test]
fn printer_empty_diagnostics() {
    let diagnostics = Diagnostics::new();
    let result = diagnostics.printer().source("source").render();
    assert!(result.is_empty());
}

#[test]
fn printer_with_path() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::NonexistentGroup, range(0, 2))
        .message("\\2")
        .emit();

    let result = diagnostics.printer().source("\\2(a)").path("pattern.re").render();
    assert!(result.contains("pattern.re:1:1"));
    assert!(result.contains("reference to nonexistent group `\\2`"));
}

#[test]
fn printer_zero_width_span() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnmatchedOpen, TextRange::empty(0.into()))
        .message("zero width error")
        .emit();

    let result = diagnostics.printer().source("hello").render();
    insta::assert_snapshot!(result, @r"
    error: unmatched `(`; zero width error
      |
    1 | hello
      | ^
    ");
}

#[test]
fn plain_format_without_source() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnmatchedClose, range(3, 4))
        .emit();
    diagnostics
        .report(DiagnosticKind::EmptyAlternative, range(1, 1))
        .emit();

    insta::assert_snapshot!(diagnostics.printer().render(), @r"
    error at 3..4: unmatched `)`
    warning at 1..1: empty alternative
    ");
}

#[test]
fn hints_render_as_help_footers() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::ReversedQuantifier, range(1, 6))
        .emit();

    let result = diagnostics.printer().source("a{3,1}").render();
    assert!(result.starts_with("warning: "));
    assert!(result.contains("help: write the smaller bound first"));
}

#[test]
fn summary_counts_errors_and_warnings() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnmatchedClose, range(3, 4))
        .emit();
    diagnostics
        .report(DiagnosticKind::EmptyAlternative, range(1, 1))
        .emit();

    insta::assert_snapshot!(diagnostics.printer().summary(true).render(), @r"
    error at 3..4: unmatched `)`
    warning at 1..1: empty alternative
    1 error, 1 warning
    ");

    let empty = Diagnostics::new();
    assert!(empty.printer().summary(true).render().is_empty());
}

#[test]
fn zero_width_span_on_a_wide_character() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnmatchedOpen, TextRange::empty(2.into()))
        .emit();
    diagnostics
        .report(DiagnosticKind::UnmatchedClose, range(1, 3))
        .emit();

    let result = diagnostics.printer().source("(\u{e9})").render();
    assert!(result.contains("(\u{e9})"));
    assert_eq!(result.matches("error: ").count(), 2);
}
