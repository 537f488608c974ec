use super::pattern_loader::LoadedPattern;
use super::run_common::{PatternFlags, builder_for};

fn loaded(text: &str) -> LoadedPattern {
    LoadedPattern {
        text: text.to_string(),
        path: None,
    }
}

#[test]
fn no_flags_no_letters() {
    assert_eq!(PatternFlags::default().modifier_letters(), "");
}

#[test]
fn charset_goes_last() {
    let flags = PatternFlags {
        fold: true,
        extended: 1,
        charset: Some("aa".to_string()),
        ..Default::default()
    };
    assert_eq!(flags.modifier_letters(), "ixaa");
}

#[test]
fn flags_reach_the_compiler() {
    let flags = PatternFlags {
        fold: true,
        extended: 1,
        ..Default::default()
    };
    let pattern = builder_for(&loaded("a b"), &flags).compile().unwrap();
    assert_eq!(pattern.rendering(), "(?^ix:a b)");

    let flags = PatternFlags {
        multiline: true,
        charset: Some("l".to_string()),
        ..Default::default()
    };
    let pattern = builder_for(&loaded("a"), &flags).compile().unwrap();
    assert_eq!(pattern.rendering(), "(?^lm:a)");
}

#[test]
fn fatal_warnings_fail_the_compile() {
    let flags = PatternFlags {
        warnings_fatal: true,
        ..Default::default()
    };
    assert!(builder_for(&loaded("a{3,1}"), &flags).compile().is_err());
    assert!(builder_for(&loaded("a{1,3}"), &flags).compile().is_ok());
}
