mod classes_tests;
mod diagnostics_tests;
mod escapes_tests;
mod restarts_tests;

use regula_bytecode::Opcode;

use crate::test_utils::compile_with;

/// Opcodes of the compiled program, in layout order.
fn opcodes(src: &str) -> Vec<Opcode> {
    opcodes_with(src, "")
}

fn opcodes_with(src: &str, flags: &str) -> Vec<Opcode> {
    let pattern = compile_with(src, flags).expect("valid pattern");
    pattern.program().nodes().map(|n| n.opcode()).collect()
}
