use super::{StandardUnicode, WildcardError, wildcard_set};

#[test]
fn general_category_prefix() {
    let data = StandardUnicode::new();
    let letters = wildcard_set(&data, "gc", "^L").unwrap();
    assert!(letters.contains('a' as u32));
    assert!(letters.contains('Z' as u32));
    assert!(!letters.contains('1' as u32));
}

#[test]
fn names_are_searched() {
    let data = StandardUnicode::new();
    let set = wildcard_set(&data, "name", "^DIGIT (ONE|TWO)$").unwrap();
    assert_eq!(set.ranges(), &[(0x31, 0x32)]);
}

#[test]
fn unknown_property_is_not_enumerable() {
    let data = StandardUnicode::new();
    assert_eq!(
        wildcard_set(&data, "Alphabetic", "x"),
        Err(WildcardError::NotEnumerable("Alphabetic".to_string()))
    );
}

#[test]
fn bad_sub_pattern() {
    let data = StandardUnicode::new();
    assert!(matches!(
        wildcard_set(&data, "gc", "("),
        Err(WildcardError::InvalidPattern(_))
    ));
}
