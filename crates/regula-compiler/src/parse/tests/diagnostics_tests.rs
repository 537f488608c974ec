use regula_bytecode::Opcode;

use super::opcodes;
use crate::test_utils::{compile_err, warning_kinds};
use crate::{DiagnosticKind, Error, PatternBuilder, shot_error};

use DiagnosticKind::*;

fn error_kind(src: &str) -> DiagnosticKind {
    let kinds = compile_err(src).kinds();
    assert_eq!(kinds.len(), 1, "`{src}` reported {kinds:?}");
    kinds[0]
}

fn strict_warnings(src: &str) -> Vec<DiagnosticKind> {
    PatternBuilder::new(src)
        .with_strict(true)
        .compile()
        .expect("valid pattern")
        .diagnostics()
        .kinds()
}

#[test]
fn grouping_errors() {
    assert_eq!(error_kind("(a"), UnmatchedOpen);
    assert_eq!(error_kind("(?:a"), UnmatchedOpen);
    assert_eq!(error_kind("a)"), UnmatchedClose);
    assert_eq!(error_kind("(?"), UnmatchedOpen);
}

#[test]
fn quantifier_errors() {
    assert_eq!(error_kind("*a"), QuantifierFollowsNothing);
    assert_eq!(error_kind("a|?"), QuantifierFollowsNothing);
    assert_eq!(error_kind("{2}"), QuantifierFollowsNothing);
    assert_eq!(error_kind("a**"), NestedQuantifier);
    assert_eq!(error_kind("a{2}{3}"), NestedQuantifier);
    assert_eq!(error_kind("a{70000}"), QuantifierTooLarge);
    assert_eq!(error_kind("a{1,65535}"), QuantifierTooLarge);
}

#[test]
fn modifier_errors() {
    assert_eq!(error_kind("(?Q)"), UnknownGroupConstruct);
    assert_eq!(error_kind("(?iQ)"), UnknownModifier);
    assert_eq!(error_kind("(?g)"), UnknownModifier);
    assert_eq!(error_kind("(?au)"), ModifierConflict);
    assert_eq!(error_kind("(?-u)"), ModifierNotNegatable);
    assert_eq!(error_kind("(?Pa)"), UnknownGroupConstruct);
}

#[test]
fn verb_errors() {
    assert_eq!(error_kind("(*BOGUS)"), UnknownVerb);
    assert_eq!(error_kind("(*MARK)"), VerbArgumentRequired);
    assert_eq!(error_kind("(*pla)"), VerbArgumentRequired);
    assert_eq!(error_kind("(*PRUNE"), UnterminatedConstruct);
}

#[test]
fn conditional_errors() {
    assert_eq!(error_kind("(a)(?(1)a|b|c)"), TooManyBranches);
    assert_eq!(error_kind("(?(DEFINE)a|b)"), DefineWithBranches);
    assert_eq!(error_kind("(?(1x)a)"), UnknownConditional);
    assert_eq!(error_kind("(?(!)a)"), UnknownConditional);
}

#[test]
fn lookbehind_errors() {
    assert_eq!(error_kind("(?<=a+)b"), LookbehindUnbounded);
    assert_eq!(error_kind("(?<!a{300})b"), LookbehindTooLong);
    assert_eq!(opcodes("(?<=a{255})b")[0], Opcode::IfMatch);
}

#[test]
fn property_diagnostics() {
    assert_eq!(error_kind(r"\p{bogus}"), UnknownProperty);
    assert_eq!(error_kind(r"\p{}"), UnknownProperty);
    assert_eq!(error_kind(r"\p{L"), UnterminatedConstruct);
    assert_eq!(warning_kinds(r"\p{Hyphen}", ""), [DeprecatedProperty]);
    assert!(warning_kinds(r"\p{Greek}\pL", "").is_empty());
}

#[test]
fn reversed_quantifier_never_matches() {
    assert_eq!(warning_kinds("a{3,1}", ""), [ReversedQuantifier]);
    assert_eq!(opcodes("a{3,1}")[0], Opcode::OpFail);

    let pattern = PatternBuilder::new("a{3,1}").compile().expect("valid pattern");
    insta::assert_snapshot!(
        pattern.diagnostics().to_string(),
        @"warning at 1..6: quantifier with minimum above maximum can't match (hint: write the smaller bound first)"
    );
}

#[test]
fn fatal_warnings() {
    let result = PatternBuilder::new("a{3,1}")
        .with_warnings_fatal(true)
        .compile();
    let Err(Error::PatternError(diag)) = result else {
        panic!("expected a pattern error");
    };
    assert!(diag.has_errors());
    assert_eq!(diag.kinds(), [ReversedQuantifier]);
    assert!(diag.to_string().starts_with("error at 1..6"));
}

#[test]
fn warnings() {
    assert_eq!(warning_kinds("a{2}?", ""), [UselessGreediness]);
    assert_eq!(warning_kinds(r"\b*", ""), [NullMatchLoop]);
    assert_eq!(warning_kinds("[:alpha:]", ""), [PosixOutsideClass]);
    assert_eq!(warning_kinds("(?p)a", ""), [UselessModifier]);
    assert_eq!(warning_kinds("x{", ""), [UnescapedBrace]);
    assert!(warning_kinds("a{2}", "").is_empty());
    assert!(warning_kinds("(?:ab|a){2}+c", "").is_empty());
    assert!(warning_kinds("(?:ab|a){1}+c", "").is_empty());
    assert_eq!(warning_kinds(r"\b{2}", ""), [NullMatchLoop]);
    assert!(warning_kinds(r"\b?", "").is_empty());
    assert!(warning_kinds(r"\b{0,1}", "").is_empty());
    assert!(warning_kinds("a|b", "").is_empty());
}

#[test]
fn strict_only_warnings() {
    assert!(warning_kinds("a||b", "").is_empty());
    assert_eq!(strict_warnings("a||b"), [EmptyAlternative]);
    assert_eq!(strict_warnings("a|"), [EmptyAlternative]);
    assert_eq!(strict_warnings("a}"), [UnescapedBrace]);
    assert!(strict_warnings("(a|b)").is_empty());
}

#[test]
fn error_positions() {
    insta::assert_snapshot!(compile_err("a**").to_string(), @"error at 2..3: nested quantifiers");
    insta::assert_snapshot!(
        compile_err(r"\p{bogus}").to_string(),
        @"error at 0..9: unknown property `bogus`"
    );
}

#[test]
fn rendered_errors() {
    shot_error!("a)", @r"
    error: unmatched `)`
      |
    1 | a)
      |  ^
    ");

    shot_error!("a**", @r"
    error: nested quantifiers
      |
    1 | a**
      |   ^
    ");
}
