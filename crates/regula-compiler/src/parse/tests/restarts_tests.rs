use regula_bytecode::{Opcode, RestartKind};
use regula_core::Colors;

use crate::test_utils::{compile_ok, warning_kinds};
use crate::{PatternBuilder, PrintTracer};

#[test]
fn single_pass_when_nothing_is_missing() {
    let pattern = compile_ok("a(b)c");
    let stats = pattern.program().stats();
    assert_eq!(stats.passes, 1);
    assert!(stats.restarts.is_empty());
    assert!(!pattern.program().encoding().utf8);
}

#[test]
fn wide_code_point_upgrades_once() {
    let pattern = compile_ok(r"a\x{100}b\x{200}c\x{300}");
    let program = pattern.program();
    assert_eq!(program.stats().passes, 2);
    assert_eq!(program.stats().restarts, [RestartKind::Upgrade]);
    assert!(program.encoding().utf8);
    assert_eq!(program.node(0).literal_text(), "a\u{100}b\u{200}c\u{300}");
}

#[test]
fn forward_reference_counts_groups() {
    let pattern = compile_ok(r"\1(a)");
    let program = pattern.program();
    assert_eq!(program.stats().restarts, [RestartKind::CountGroups]);
    assert_eq!(program.node(0).opcode(), Opcode::Ref);
    assert_eq!(program.node(0).arg1(), 1);
}

#[test]
fn ambiguous_number_becomes_octal_once_counted() {
    let pattern = compile_ok(r"(a)\10");
    let program = pattern.program();
    assert_eq!(program.stats().restarts, [RestartKind::CountGroups]);
    assert!(
        program
            .nodes()
            .any(|n| n.opcode() == Opcode::Exact && n.literal_codepoints() == [8])
    );

    let many = format!("{}\\10", "(a)".repeat(10));
    let pattern = compile_ok(&many);
    let program = pattern.program();
    let refs: Vec<u32> = program
        .nodes()
        .filter(|n| n.opcode() == Opcode::Ref)
        .map(|n| n.arg1())
        .collect();
    assert_eq!(refs, [10]);
    assert!(warning_kinds(&many, "").is_empty());
}

#[test]
fn restarts_accumulate() {
    let pattern = compile_ok(r"\1\x{100}(a)");
    let stats = pattern.program().stats();
    assert_eq!(stats.passes, 3);
    assert_eq!(stats.restarts, [RestartKind::Upgrade, RestartKind::CountGroups]);
}

#[test]
fn long_branch_switches_to_wide_links() {
    let source = format!("{}|b", "a".repeat(400_000));
    let pattern = compile_ok(&source);
    let program = pattern.program();
    assert!(program.encoding().wide_links);
    assert_eq!(program.stats().restarts, [RestartKind::WideLinks]);

    let first = program.node(0);
    assert_eq!(first.opcode(), Opcode::Branch);
    let second = program.node(first.next().expect("second branch"));
    assert_eq!(second.opcode(), Opcode::Branch);
}

#[test]
fn restarts_are_traced() {
    let mut tracer = PrintTracer::new(Colors::OFF);
    PatternBuilder::new(r"\1\x{100}(a)")
        .compile_traced(&mut tracer)
        .expect("valid pattern");
    let lines = tracer.lines();
    assert_eq!(lines[0], "pass 1 (latin1, narrow links)");
    assert!(lines.contains(&"  restart: code point above 0xFF".to_string()));
    assert!(lines.contains(&"  restart: group count needed".to_string()));
    assert!(lines.contains(&"pass 3 (utf8, narrow links)".to_string()));
}
