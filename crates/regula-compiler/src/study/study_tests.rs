use regula_bytecode::{Anchor, StartClass, SubstrCheck, UNBOUNDED};
use regula_core::{CodepointSet, Colors};

use super::Len;
use crate::test_utils::{compile_ok, compile_with};
use crate::{PatternBuilder, PrintTracer, Tuning};

fn lengths(src: &str) -> (usize, Option<usize>) {
    let pattern = compile_ok(src);
    let study = pattern.program().study();
    (study.min_len, study.max_len)
}

#[test]
fn len_arithmetic() {
    let ab = Len::exact(2);
    assert_eq!(ab.then(Len::exact(1)), Len::exact(3));
    assert_eq!(ab.or(Len::exact(5)), Len { min: 2, max: Some(5) });
    assert_eq!(ab.or(Len::ANY), Len::ANY);
    assert_eq!(ab.repeat(1, 3), Len { min: 2, max: Some(6) });
    assert_eq!(ab.repeat(0, UNBOUNDED), Len::ANY);
    assert_eq!(Len::ZERO.repeat(2, UNBOUNDED), Len::ZERO);
}

#[test]
fn length_bounds() {
    assert_eq!(lengths("abc"), (3, Some(3)));
    assert_eq!(lengths("a{2,5}"), (2, Some(5)));
    assert_eq!(lengths("a*"), (0, None));
    assert_eq!(lengths("(ab|c)?d"), (1, Some(3)));
    assert_eq!(lengths(r"\bfoo\b"), (3, Some(3)));
    assert_eq!(lengths("(?<=x)abc"), (3, Some(3)));
    assert_eq!(lengths("x|yyy"), (1, Some(3)));
}

#[test]
fn references_are_unbounded() {
    assert_eq!(lengths(r"(a)\1"), (1, None));
    assert_eq!(lengths("(a(?1)?)"), (1, None));
}

#[test]
fn accept_gives_up_on_bounds_and_substrings() {
    let pattern = compile_ok("abc(*ACCEPT)def");
    let study = pattern.program().study();
    assert_eq!((study.min_len, study.max_len), (0, None));
    assert!(study.fixed.is_none());
    assert!(study.floating.is_none());
    assert_eq!(study.check, None);
}

#[test]
fn anchored_fixed_prefix() {
    let pattern = compile_ok("^foobar[0-9]+$");
    let study = pattern.program().study();

    assert_eq!(study.min_len, 7);
    assert_eq!(study.max_len, None);
    assert_eq!(study.anchor.kind, Anchor::Sbol);
    assert!(!study.anchor.implicit);

    let fixed = study.fixed.as_ref().expect("fixed substring");
    assert_eq!(fixed.text, "foobar");
    assert_eq!(fixed.min_offset, 0);
    assert_eq!(fixed.max_offset, Some(0));
    assert!(study.floating.is_none());
    assert_eq!(study.check, Some(SubstrCheck::Fixed));
    assert!(matches!(study.start_class, Some(StartClass::Node(_))));
}

#[test]
fn floating_after_variable_prefix() {
    let pattern = compile_ok(r"\d+foo");
    let study = pattern.program().study();
    let floating = study.floating.as_ref().expect("floating substring");
    assert_eq!(floating.text, "foo");
    assert_eq!(floating.min_offset, 1);
    assert_eq!(floating.max_offset, None);
    assert!(study.fixed.is_none());
    assert_eq!(study.check, Some(SubstrCheck::Floating));
}

#[test]
fn literal_before_end() {
    let pattern = compile_ok("foo$");
    let fixed = pattern.program().study().fixed.clone().expect("fixed substring");
    assert_eq!(fixed.text, "foo");
    assert!(fixed.before_end);
}

#[test]
fn tie_prefers_floating_with_a_bounded_window() {
    let pattern = compile_ok(r"foo\d{1,3}bar");
    let study = pattern.program().study();
    assert_eq!(study.fixed.as_ref().map(|s| s.text.as_str()), Some("foo"));
    let floating = study.floating.as_ref().expect("floating substring");
    assert_eq!((floating.text.as_str(), floating.min_offset, floating.max_offset), ("bar", 4, Some(6)));
    assert_eq!(study.check, Some(SubstrCheck::Floating));

    let tuning = Tuning {
        prefer_floating_on_tie: false,
        ..Tuning::default()
    };
    let pattern = PatternBuilder::new(r"foo\d{1,3}bar")
        .with_tuning(tuning)
        .compile()
        .expect("valid pattern");
    assert_eq!(pattern.program().study().check, Some(SubstrCheck::Fixed));
}

#[test]
fn tie_without_a_reliable_offset_keeps_the_earlier_substring() {
    let pattern = compile_ok(r"foo\d+bar");
    let study = pattern.program().study();
    assert_eq!(study.fixed.as_ref().map(|s| s.text.as_str()), Some("foo"));
    let floating = study.floating.as_ref().expect("floating substring");
    assert_eq!((floating.text.as_str(), floating.max_offset), ("bar", None));
    assert_eq!(study.check, Some(SubstrCheck::Fixed));
}

#[test]
fn longer_substring_wins() {
    let pattern = compile_ok(r"ab\d+wxyz");
    assert_eq!(pattern.program().study().check, Some(SubstrCheck::Floating));
    let pattern = compile_ok(r"abcd\d+xy");
    assert_eq!(pattern.program().study().check, Some(SubstrCheck::Fixed));
}

#[test]
fn alternation_has_no_substrings() {
    let pattern = compile_ok("a|b|c");
    let study = pattern.program().study();
    assert!(study.fixed.is_none());
    assert!(study.floating.is_none());
    assert_eq!(study.check, None);
    assert_eq!(
        study.start_class,
        Some(StartClass::Set(CodepointSet::from_codepoints(
            "abc".chars().map(u32::from)
        )))
    );
}

#[test]
fn explicit_anchors() {
    let anchor = |src: &str, flags: &str| {
        let pattern = compile_with(src, flags).expect("valid pattern");
        pattern.program().study().anchor
    };
    assert_eq!(anchor("^a", "").kind, Anchor::Sbol);
    assert_eq!(anchor(r"\Aa", "").kind, Anchor::Sbol);
    assert_eq!(anchor("^a", "m").kind, Anchor::Mbol);
    assert_eq!(anchor(r"\Ga", "").kind, Anchor::Gpos);
    assert_eq!(anchor("(^a)", "").kind, Anchor::Sbol);
    assert_eq!(anchor("^a|^b", "").kind, Anchor::Sbol);
    assert_eq!(anchor("^a|b", "").kind, Anchor::None);
    assert_eq!(anchor("a^", "").kind, Anchor::None);
}

#[test]
fn implicit_anchor_from_leading_dot_star() {
    let pattern = compile_ok(".*foo");
    let anchor = pattern.program().study().anchor;
    assert_eq!(anchor.kind, Anchor::Mbol);
    assert!(anchor.implicit);

    let pattern = compile_with(".*foo", "s").expect("valid pattern");
    assert_eq!(pattern.program().study().anchor.kind, Anchor::Sbol);

    let pattern = compile_ok(r"(.*)\1");
    assert_eq!(pattern.program().study().anchor.kind, Anchor::None);
}

#[test]
fn start_class_abandon_is_traced() {
    let mut tracer = PrintTracer::new(Colors::OFF);
    let pattern = PatternBuilder::new(".foo")
        .with_dot_all(true)
        .compile_traced(&mut tracer)
        .expect("valid pattern");
    assert!(pattern.program().study().start_class.is_none());
    assert!(tracer.lines().iter().any(|l| l.contains("no start class")));
    assert!(tracer.lines().iter().any(|l| l.starts_with("study: minlen 4")));
}

#[test]
fn folded_literal_bounds_follow_the_fold_table() {
    let fold_lengths = |src: &str| {
        let study = compile_with(src, "i").expect("valid pattern").program().study().clone();
        (study.min_len, study.max_len)
    };

    assert_eq!(fold_lengths(r"[\x{DF}]"), (1, Some(2)));
    assert_eq!(fold_lengths(r"\x{DF}"), (1, Some(2)));
    assert_eq!(fold_lengths("ss"), (1, Some(2)));
    assert_eq!(fold_lengths(r"a\x{DF}b"), (3, Some(4)));
    assert_eq!(fold_lengths("abc"), (3, Some(3)));
    assert_eq!(fold_lengths(r"abc|\x{DF}"), (1, Some(3)));
}
