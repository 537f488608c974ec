use proptest::prelude::*;

use crate::test_utils::compile_with;
use crate::{DEFAULT_MAX_DEPTH, Error, Pattern, PatternBuilder};

#[test]
fn default_options() {
    let pattern = Pattern::new("a(b)c").unwrap();
    assert_eq!(pattern.source(), "a(b)c");
    assert_eq!(pattern.rendering(), "(?^:a(b)c)");
    assert!(pattern.diagnostics().is_empty());
    assert!(pattern.names().is_empty());
}

#[test]
fn builder_setters_reach_the_rendering() {
    let pattern = PatternBuilder::new("a")
        .with_fold(true)
        .with_multiline(true)
        .with_no_capture(true)
        .compile()
        .unwrap();
    assert_eq!(pattern.rendering(), "(?^min:a)");
}

#[test]
fn unknown_flag_is_rejected_before_compiling() {
    assert!(PatternBuilder::new("a").with_flags("iq").is_err());
    assert!(PatternBuilder::new("a").with_flags("ixx").is_ok());
}

#[test]
fn recursion_limit() {
    let nested = |n: usize| format!("{}a{}", "(".repeat(n), ")".repeat(n));

    let ok = PatternBuilder::new(nested(3)).with_recursion_limit(3).compile();
    assert!(ok.is_ok());

    let deep = PatternBuilder::new(nested(4)).with_recursion_limit(3).compile();
    assert!(matches!(deep, Err(Error::RecursionLimitExceeded)));
}

#[test]
fn default_recursion_limit_stops_deep_nesting() {
    let nested = |n: usize| format!("{}a{}", "(?:".repeat(n), ")".repeat(n));

    assert!(Pattern::new(&nested(DEFAULT_MAX_DEPTH as usize)).is_ok());
    assert!(matches!(
        Pattern::new(&nested(DEFAULT_MAX_DEPTH as usize + 1)),
        Err(Error::RecursionLimitExceeded)
    ));
    assert!(matches!(Pattern::new(&nested(4000)), Err(Error::RecursionLimitExceeded)));

    let classes = format!("{}[a]{}", "(?[".repeat(4000), "])".repeat(4000));
    assert!(matches!(Pattern::new(&classes), Err(Error::RecursionLimitExceeded)));
}

#[test]
fn errors_summarize_their_count() {
    let Err(err) = Pattern::new("(a") else {
        panic!("expected an error");
    };
    assert_eq!(err.to_string(), "pattern compilation failed with 1 errors");
}

#[test]
fn into_program_keeps_the_rendering() {
    let program = Pattern::new("x+").unwrap().into_program();
    assert_eq!(program.rendering(), "(?^:x+)");
}

fn piece() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "a", "bc", "[a-f]", r"\d", "(x|yz)", "(?:ab)+", r"\w{2,3}", ".", "^", "$", r"\bq",
        "\u{df}", r"\x{100}", r"[^\s]", "(?<n>k)", "(?i:st)", "a*?", "z?", "[[:alpha:]]",
    ])
}

proptest! {
    #[test]
    fn rendering_recompiles_to_the_same_program(
        pieces in prop::collection::vec(piece(), 1..6),
        flags in prop::sample::select(vec!["", "i", "m", "s", "x", "n", "ims", "ia", "iaa", "u"]),
    ) {
        let src = pieces.concat();
        let original = compile_with(&src, flags).expect("valid pattern");
        let again = compile_with(original.rendering(), "").expect("rendering compiles");

        let (a, b) = (original.program().summary(), again.program().summary());
        prop_assert_eq!(a.checksum, b.checksum);
        prop_assert_eq!((a.min_len, a.max_len), (b.min_len, b.max_len));
        prop_assert_eq!(a.anchor, b.anchor);
        prop_assert_eq!(a.start_class, b.start_class);
        prop_assert_eq!(a.fixed, b.fixed);
        prop_assert_eq!(a.floating, b.floating);
        prop_assert_eq!(a.check, b.check);
        prop_assert_eq!(a.physical_groups, b.physical_groups);
    }
}
