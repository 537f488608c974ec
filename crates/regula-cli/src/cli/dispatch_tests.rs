//! Tests for CLI dispatch logic.
//!
//! These tests verify:
//! 1. Every command shares the pattern input and compile flags
//! 2. Output switches are only accepted where they apply
//! 3. Params extraction: correct fields are extracted from ArgMatches

use std::path::PathBuf;

use super::*;
use crate::cli::commands::{check_command, dump_command, render_command};
use crate::commands::run_common::PatternSource;

#[test]
fn check_extracts_inline_pattern_and_flags() {
    let result = check_command().try_get_matches_from(["check", "a+b", "-i", "--strict"]);
    assert!(result.is_ok(), "check should accept flags: {:?}", result.err());

    let params = CheckParams::from_matches(&result.unwrap());
    assert_eq!(params.source, PatternSource::Text("a+b".to_string()));
    assert!(params.flags.fold);
    assert!(params.flags.strict);
    assert!(!params.flags.warnings_fatal);
    assert_eq!(params.color, ColorChoice::Auto);
}

#[test]
fn stacked_short_flags() {
    let result = dump_command().try_get_matches_from(["dump", "a b", "-msxx", "-n"]);
    assert!(result.is_ok(), "dump should accept stacked flags: {:?}", result.err());

    let params = DumpParams::from_matches(&result.unwrap());
    assert!(params.flags.multiline);
    assert!(params.flags.dot_all);
    assert!(params.flags.no_capture);
    assert_eq!(params.flags.extended, 2);
    assert_eq!(params.flags.modifier_letters(), "msxxn");
}

#[test]
fn pattern_from_file() {
    let result = render_command().try_get_matches_from(["render", "-f", "pattern.re"]);
    assert!(result.is_ok(), "render should accept -f: {:?}", result.err());

    let params = RenderParams::from_matches(&result.unwrap());
    assert_eq!(params.source, PatternSource::File(PathBuf::from("pattern.re")));
}

#[test]
fn pattern_and_file_conflict() {
    let result = check_command().try_get_matches_from(["check", "a", "-f", "pattern.re"]);
    assert!(result.is_err());
}

#[test]
fn pattern_is_required() {
    assert!(check_command().try_get_matches_from(["check"]).is_err());
    assert!(render_command().try_get_matches_from(["render", "-i"]).is_err());
}

#[test]
fn charset_values_are_checked() {
    let result = check_command().try_get_matches_from(["check", "a", "--charset", "aa"]);
    let params = CheckParams::from_matches(&result.unwrap());
    assert_eq!(params.flags.charset.as_deref(), Some("aa"));

    let result = check_command().try_get_matches_from(["check", "a", "--charset", "z"]);
    assert!(result.is_err());
}

#[test]
fn dump_output_switches() {
    let result =
        dump_command().try_get_matches_from(["dump", "a|b", "--trace", "--json", "--color", "never"]);
    assert!(result.is_ok(), "dump should accept output switches: {:?}", result.err());

    let params = DumpParams::from_matches(&result.unwrap());
    assert!(params.trace);
    assert!(params.json);
    assert_eq!(params.color, ColorChoice::Never);
}

#[test]
fn json_is_dump_only() {
    assert!(check_command().try_get_matches_from(["check", "a", "--json"]).is_err());
    assert!(render_command().try_get_matches_from(["render", "a", "--trace"]).is_err());
}

#[test]
fn json_dump_is_never_colored() {
    let result = dump_command().try_get_matches_from(["dump", "a", "--json", "--color", "always"]);
    let args: crate::commands::dump::DumpArgs = DumpParams::from_matches(&result.unwrap()).into();
    assert!(!args.color);
}

#[test]
fn subcommand_is_required() {
    assert!(build_cli().try_get_matches_from(["regula"]).is_err());
    assert!(build_cli().try_get_matches_from(["regula", "check", "a"]).is_ok());
}
