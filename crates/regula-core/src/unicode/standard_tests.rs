use super::{MULTI_CHAR_FOLDS, PosixClass, PropertyLookup, StandardUnicode, UnicodeData};

fn found(lookup: PropertyLookup) -> crate::CodepointSet {
    match lookup {
        PropertyLookup::Found { set, .. } => set,
        other => panic!("expected a set, got {other:?}"),
    }
}

#[test]
fn general_category_short_name() {
    let data = StandardUnicode::new();
    let lu = found(data.property("Lu", None));
    assert!(lu.contains('A' as u32));
    assert!(!lu.contains('a' as u32));
}

#[test]
fn script_with_value() {
    let data = StandardUnicode::new();
    let greek = found(data.property("Script", Some("Greek")));
    assert!(greek.contains(0x3B1));
    assert!(!greek.contains('a' as u32));
}

#[test]
fn loose_is_prefix() {
    let data = StandardUnicode::new();
    let alpha = found(data.property("IsAlpha", None));
    assert!(alpha.contains('q' as u32));
}

#[test]
fn posix_prefixed_names() {
    let data = StandardUnicode::new();
    let ascii_digit = found(data.property("PosixDigit", None));
    assert_eq!(ascii_digit.ranges(), &[(0x30, 0x39)]);
    let digit = found(data.property("XPosixDigit", None));
    assert!(digit.contains(0x0660));
}

#[test]
fn hyphen_is_deprecated() {
    let data = StandardUnicode::new();
    match data.property("Hyphen", None) {
        PropertyLookup::Found { deprecated, set } => {
            assert!(deprecated.is_some());
            assert!(set.contains('-' as u32));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn blocks() {
    let data = StandardUnicode::new();
    assert_eq!(found(data.property("InGreek", None)).ranges(), &[(0x370, 0x3FF)]);
    assert_eq!(
        found(data.property("Block", Some("Basic Latin"))).ranges(),
        &[(0, 0x7F)]
    );
}

#[test]
fn user_defined_is_deferred() {
    let data = StandardUnicode::new();
    assert_eq!(data.property("IsVowel", None), PropertyLookup::Deferred);
    assert_eq!(data.property("main::Custom", None), PropertyLookup::Deferred);
    assert_eq!(data.property("bogus", None), PropertyLookup::Unknown);
}

#[test]
fn rejects_unsafe_names() {
    let data = StandardUnicode::new();
    assert_eq!(data.property("L}|x{", None), PropertyLookup::Unknown);
}

#[test]
fn posix_ascii_and_unicode() {
    let data = StandardUnicode::new();
    let ascii = data.posix_class(PosixClass::Alpha, true);
    assert_eq!(ascii.ranges(), &[(0x41, 0x5A), (0x61, 0x7A)]);
    let unicode = data.posix_class(PosixClass::Alpha, false);
    assert!(unicode.contains(0xE9));
    assert!(ascii.is_subset(&unicode));
}

#[test]
fn simple_folds_include_kelvin() {
    let data = StandardUnicode::new();
    let k = data.simple_folds('k' as u32);
    assert!(k.contains('K' as u32));
    assert!(k.contains(0x212A));
    assert!(k.contains('k' as u32));
}

#[test]
fn multi_char_folds() {
    let data = StandardUnicode::new();
    assert_eq!(data.multi_char_fold(0xDF), Some(&[0x73, 0x73][..]));
    assert_eq!(data.multi_char_fold('a' as u32), None);
    assert!(data.is_multi_fold_prefix(&[0x73]));
    assert!(data.is_multi_fold_prefix(&[0x66, 0x66]));
    assert!(!data.is_multi_fold_prefix(&[0x71]));
}

#[test]
fn greek_iota_subscript_folds() {
    let data = StandardUnicode::new();
    assert_eq!(data.multi_char_fold(0x1F80), Some(&[0x1F00, 0x3B9][..]));
    assert_eq!(data.multi_char_fold(0x1F8F), Some(&[0x1F07, 0x3B9][..]));
    assert_eq!(data.multi_char_fold(0x1FAF), Some(&[0x1F67, 0x3B9][..]));
    assert_eq!(data.multi_char_fold(0x1FB3), Some(&[0x3B1, 0x3B9][..]));
    assert_eq!(data.multi_char_fold(0x1FB7), Some(&[0x3B1, 0x342, 0x3B9][..]));
    assert_eq!(data.multi_char_fold(0x1FB5), None);
}

#[test]
fn multi_char_fold_table_is_complete_and_sorted() {
    assert_eq!(MULTI_CHAR_FOLDS.len(), 104);
    assert!(MULTI_CHAR_FOLDS.windows(2).all(|w| w[0].0 < w[1].0));
    assert!(MULTI_CHAR_FOLDS.iter().all(|(_, fold)| (2..=3).contains(&fold.len())));
}

#[test]
fn named_characters() {
    let data = StandardUnicode::new();
    assert_eq!(data.named_sequence("LATIN SMALL LETTER SHARP S"), Some(vec![0xDF]));
    assert_eq!(data.named_sequence("latin capital letter q"), Some(vec![0x51]));
    assert_eq!(data.named_sequence("DIGIT SEVEN"), Some(vec![0x37]));
    assert_eq!(data.named_sequence("CJK UNIFIED IDEOGRAPH-4E00"), Some(vec![0x4E00]));
    assert_eq!(
        data.named_sequence("KEYCAP DIGIT ONE"),
        Some(vec![0x31, 0xFE0F, 0x20E3])
    );
    assert_eq!(data.named_sequence("NOT A CHARACTER"), None);
}

#[test]
fn fold_closure_of_range_keeps_surrogates() {
    let data = StandardUnicode::new();
    let set = crate::CodepointSet::from_ranges([(0x61, 0x62), (0xD800, 0xD801)]);
    let folded = data.fold_closure(&set);
    assert!(folded.contains('A' as u32));
    assert!(folded.contains('B' as u32));
    assert!(folded.contains(0xD800));
    assert!(!folded.contains('C' as u32));
}
