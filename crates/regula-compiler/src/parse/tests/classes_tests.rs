use regula_bytecode::Opcode;

use super::{opcodes, opcodes_with};
use crate::test_utils::{compile_err, compile_ok, warning_kinds};
use crate::{DiagnosticKind, Error, PatternBuilder};

use Opcode::*;

#[test]
fn cheapest_node_wins() {
    assert_eq!(opcodes("[a]"), [Exact, End]);
    assert_eq!(opcodes("[.]"), [Exact, End]);
    assert_eq!(opcodes("[Aa]"), [AnyOfM, End]);
    assert_eq!(opcodes("[a-z]"), [AnyOfR, End]);
    assert_eq!(opcodes("[acx]"), [AnyOf, End]);
    assert_eq!(opcodes(r"[\d]"), [Posix, End]);
    assert_eq!(opcodes(r"[^\d]"), [NPosix, End]);
    assert_eq!(opcodes(r"\D"), [NPosix, End]);

    let pattern = compile_ok("[a-f]");
    let node = pattern.program().node(0);
    assert_eq!((node.arg1(), node.arg2()), ('a' as u32, 'f' as u32));
}

#[test]
fn class_bitmap() {
    let pattern = compile_ok("[acx]");
    let node = pattern.program().node(0);
    assert!(node.bitmap_contains(b'a'));
    assert!(node.bitmap_contains(b'x'));
    assert!(!node.bitmap_contains(b'b'));
}

#[test]
fn leading_bracket_is_a_member() {
    let pattern = compile_ok("[]a]");
    let program = pattern.program();
    assert_eq!(program.nodes().count(), 2);
    let node = program.node(0);
    assert_eq!(node.opcode(), AnyOf);
    assert!(node.bitmap_contains(b']'));
    assert!(node.bitmap_contains(b'a'));
}

#[test]
fn empty_class_never_matches() {
    assert_eq!(opcodes(r"[^\x00-\x{10FFFF}]"), [OpFail, End]);
    assert_eq!(opcodes("(?[ [a] & [b] ])"), [OpFail, End]);
}

#[test]
fn single_folding_member_becomes_folded_literal() {
    assert_eq!(opcodes_with("[k]", "i"), [ExactFold, End]);
    assert_eq!(opcodes_with("[1]", "i"), [Exact, End]);
}

#[test]
fn multi_character_fold_becomes_alternation() {
    assert_eq!(opcodes(r"[\x{DF}]"), [Exact, End]);

    let ops = opcodes_with(r"[\x{DF}]", "i");
    assert!(ops.contains(&ExactFold));
    assert!(!ops.contains(&AnyOf));

    let ops = opcodes_with(r"[\x{DF}x]", "i");
    assert!(ops.contains(&Branch));
    assert!(ops.contains(&ExactFold));
    assert!(ops.contains(&AnyOfM));
}

#[test]
fn posix_classes() {
    assert_eq!(opcodes("[[:alpha:]]"), [Posix, End]);
    assert_eq!(opcodes("[[:^alpha:]]"), [NPosix, End]);
    assert!(warning_kinds("[[:alpha:]]", "").is_empty());
    assert_eq!(compile_err("[[:bogus:]]").kinds(), [DiagnosticKind::UnknownPosixClass]);
    assert_eq!(compile_err("[[.a.]]").kinds(), [DiagnosticKind::ReservedPosixSyntax]);
    assert_eq!(compile_err("[[=e=]]").kinds(), [DiagnosticKind::ReservedPosixSyntax]);
}

#[test]
fn posix_classes_are_repaired_with_warnings() {
    use DiagnosticKind::AssumedPosixClass;

    assert_eq!(warning_kinds("[[:alph:]]", ""), [AssumedPosixClass]);
    assert_eq!(warning_kinds("[[:alpha]]", ""), [AssumedPosixClass]);
    assert_eq!(warning_kinds("[[;alpha:]]", ""), [AssumedPosixClass]);
    assert_eq!(
        warning_kinds("[[ :alpha: ]]", ""),
        [AssumedPosixClass, AssumedPosixClass]
    );
    assert_eq!(opcodes("[[:alph:]]"), [Posix, End]);
}

#[test]
fn range_errors() {
    assert_eq!(compile_err("[z-a]").kinds(), [DiagnosticKind::InvalidRange]);
    assert_eq!(compile_err("[abc").kinds(), [DiagnosticKind::UnterminatedClass]);
    assert_eq!(compile_err("[").kinds(), [DiagnosticKind::UnterminatedClass]);
}

#[test]
fn false_ranges_warn_or_fail_under_strict() {
    assert_eq!(warning_kinds(r"[\w-z]", ""), [DiagnosticKind::FalseRange]);
    assert_eq!(warning_kinds(r"[a-\d]", ""), [DiagnosticKind::FalseRange]);
    assert!(warning_kinds("[a-]", "").is_empty());

    let result = PatternBuilder::new(r"[\w-z]").with_strict(true).compile();
    let Err(Error::PatternError(diag)) = result else {
        panic!("expected a pattern error");
    };
    assert_eq!(diag.kinds(), [DiagnosticKind::FalseRange]);
    assert!(diag.has_errors());
}

#[test]
fn duplicate_members_only_under_strict() {
    assert!(warning_kinds("[aba]", "").is_empty());
    let pattern = PatternBuilder::new("[aba]")
        .with_strict(true)
        .compile()
        .expect("valid pattern");
    assert_eq!(pattern.diagnostics().kinds(), [DiagnosticKind::DuplicateClassMember]);
}

#[test]
fn set_expressions() {
    let pattern = compile_ok("(?[ [a-z] - [aeiou] ])");
    let node = pattern.program().node(0);
    assert_eq!(node.opcode(), AnyOf);
    assert!(node.bitmap_contains(b'b'));
    assert!(!node.bitmap_contains(b'a'));
    assert!(!node.bitmap_contains(b'B'));

    let pattern = compile_ok(r"(?[ \d & [0-4] ])");
    let node = pattern.program().node(0);
    assert_eq!(node.opcode(), AnyOfR);
    assert_eq!((node.arg1(), node.arg2()), ('0' as u32, '4' as u32));

    assert_eq!(opcodes("(?[ ( [a] + [b] ) & [b] ])"), [Exact, End]);
}

#[test]
fn malformed_set_expressions() {
    use DiagnosticKind::{InvalidSetExpression, UnterminatedConstruct};

    assert_eq!(compile_err("(?[ [a] + ])").kinds(), [InvalidSetExpression]);
    assert_eq!(compile_err("(?[ [a] * [b] ])").kinds(), [InvalidSetExpression]);
    assert_eq!(compile_err("(?[ [a] ]").kinds(), [InvalidSetExpression]);
    assert_eq!(compile_err("(?[ [a] ").kinds(), [UnterminatedConstruct]);
}
