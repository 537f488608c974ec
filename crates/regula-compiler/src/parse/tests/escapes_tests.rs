use regula_bytecode::Opcode;

use super::opcodes;
use crate::{DiagnosticKind, PatternBuilder};
use crate::test_utils::{compile_err, compile_ok, warning_kinds};

fn codepoints(src: &str) -> Vec<u32> {
    let pattern = compile_ok(src);
    let node = pattern.program().node(0);
    assert_eq!(node.opcode(), Opcode::Exact, "`{src}` is not a single literal");
    node.literal_codepoints()
}

#[test]
fn control_escapes() {
    assert_eq!(codepoints(r"\t\n\r\f\e\a"), [9, 10, 13, 12, 27, 7]);
    assert_eq!(codepoints(r"\cA"), [1]);
    assert_eq!(codepoints(r"\c?"), [0x7F]);
}

#[test]
fn numeric_escapes() {
    assert_eq!(codepoints(r"\0"), [0]);
    assert_eq!(codepoints(r"\012"), [10]);
    assert_eq!(codepoints(r"\o{101}"), [0x41]);
    assert_eq!(codepoints(r"\x41"), [0x41]);
    assert_eq!(codepoints(r"\x{41}"), [0x41]);
    assert_eq!(codepoints(r"\x{ 4_1 }"), [0x41]);
    assert_eq!(codepoints(r"\xz"), [0, 'z' as u32]);
}

#[test]
fn named_characters() {
    assert_eq!(codepoints(r"\N{U+41}"), [0x41]);
    assert_eq!(codepoints(r"\N{LATIN SMALL LETTER SHARP S}"), [0xDF]);

    let pattern = compile_ok(r"\N{LATIN SMALL LETTER SHARP S}");
    assert!(!pattern.program().encoding().utf8);

    let pattern = compile_ok(r"\N{LATIN CAPITAL LETTER A WITH MACRON AND GRAVE}");
    let program = pattern.program();
    assert!(program.encoding().utf8);
    assert_eq!(program.node(0).literal_codepoints(), [0x100, 0x300]);
}

#[test]
fn escapes_join_the_literal_run() {
    let pattern = compile_ok(r"a\tb\x41");
    let program = pattern.program();
    assert_eq!(program.nodes().count(), 2);
    assert_eq!(program.node(0).literal_text(), "a\tbA");
}

#[test]
fn escapes_with_nodes_of_their_own_end_the_run() {
    let ops = opcodes(r"a\db");
    assert_eq!(ops.len(), 4);
    assert_eq!((ops[0], ops[2], ops[3]), (Opcode::Exact, Opcode::Exact, Opcode::End));
}

#[test]
fn unrecognized_escape_is_a_literal() {
    assert_eq!(warning_kinds(r"\q", ""), [DiagnosticKind::UnrecognizedEscape]);
    assert_eq!(codepoints(r"\q"), ['q' as u32]);
    assert_eq!(codepoints(r"\-\#"), ['-' as u32, '#' as u32]);
}

#[test]
fn redundant_escape_only_under_strict() {
    assert!(warning_kinds(r"\%", "").is_empty());
    assert!(warning_kinds(r"\.", "").is_empty());

    let pattern = PatternBuilder::new(r"\%\.")
        .with_strict(true)
        .compile()
        .expect("valid pattern");
    assert_eq!(pattern.diagnostics().kinds(), [DiagnosticKind::RedundantEscape]);
}

#[test]
fn octal_outside_class_warns() {
    assert_eq!(warning_kinds(r"(a)\10", ""), [DiagnosticKind::OctalAmbiguity]);
}

#[test]
fn malformed_escapes() {
    let kinds = |src: &str| compile_err(src).kinds();
    assert_eq!(kinds(r"a\"), [DiagnosticKind::TrailingBackslash]);
    assert_eq!(kinds(r"\x{110000}"), [DiagnosticKind::CodepointTooLarge]);
    assert_eq!(kinds(r"\x{D800}"), [DiagnosticKind::InvalidEscape]);
    assert_eq!(kinds(r"\o{9}"), [DiagnosticKind::InvalidEscape]);
    assert_eq!(kinds(r"\o{}"), [DiagnosticKind::InvalidEscape]);
    assert_eq!(kinds(r"\x{zz}"), [DiagnosticKind::InvalidEscape]);
    assert_eq!(kinds(r"\o12"), [DiagnosticKind::InvalidEscape]);
    assert_eq!(kinds(r"\x{41"), [DiagnosticKind::UnterminatedConstruct]);
    assert_eq!(kinds(r"\N{NOT A NAME}"), [DiagnosticKind::UnknownCharacterName]);
    assert_eq!(kinds(r"\N{U+zz}"), [DiagnosticKind::InvalidEscape]);
    assert_eq!(kinds("\\c\u{e9}"), [DiagnosticKind::InvalidEscape]);
}
