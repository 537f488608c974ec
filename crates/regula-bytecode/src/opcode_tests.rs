use crate::opcode::{BoundKind, Charset, Opcode, Operands, charset_flags, split_charset_flags};

#[test]
fn from_u8_covers_every_opcode() {
    for v in 0..Opcode::COUNT as u8 {
        let op = Opcode::from_u8(v).unwrap();
        assert_eq!(op as u8, v);
    }
    assert_eq!(Opcode::from_u8(Opcode::COUNT as u8), None);
}

#[test]
fn operand_words() {
    assert_eq!(Opcode::End.operand_words(0), 0);
    assert_eq!(Opcode::Open.operand_words(0), 1);
    assert_eq!(Opcode::Curly.operand_words(0), 2);
    assert_eq!(Opcode::Exact.operand_words(5), 3);
    assert_eq!(Opcode::Exact.operand_words(8), 3);
    assert_eq!(Opcode::AnyOf.operand_words(0), 9);
}

#[test]
fn simple_nodes_are_one_char() {
    assert!(Opcode::AnyOf.is_simple());
    assert!(Opcode::Posix.is_simple());
    assert!(!Opcode::Exact.is_simple());
    assert!(!Opcode::Branch.is_simple());
    assert_eq!(Opcode::Branch.operands(), Operands::None);
}

#[test]
fn charset_packing() {
    let flags = charset_flags(9, Charset::AsciiStrict);
    assert_eq!(split_charset_flags(flags), (9, Some(Charset::AsciiStrict)));
}

#[test]
fn bound_names() {
    assert_eq!(BoundKind::from_name("wb"), Some(BoundKind::Wb));
    assert_eq!(BoundKind::from_name("g"), Some(BoundKind::Gcb));
    assert_eq!(BoundKind::from_name("xx"), None);
}
