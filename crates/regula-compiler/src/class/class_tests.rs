use proptest::prelude::*;
use regula_bytecode::{ClassData, DeferredProperty};
use regula_core::{CodepointSet, PosixClass};

use super::{ClassBuilder, ClassTable, bitmap_of, bitmask};

#[test]
fn bitmask_case_pair() {
    let set = CodepointSet::from_codepoints([b'A' as u32, b'a' as u32]);
    assert_eq!(bitmask(&set, 8), Some((0x41, 0xDF)));
}

#[test]
fn bitmask_even_digits() {
    let set = CodepointSet::from_codepoints("0246".chars().map(u32::from));
    assert_eq!(bitmask(&set, 8), Some((0x30, 0xF9)));
}

#[test]
fn bitmask_rejects_partial_cube() {
    let set = CodepointSet::from_codepoints("abc".chars().map(u32::from));
    assert_eq!(bitmask(&set, 8), None);
    let set = CodepointSet::from_codepoints("024".chars().map(u32::from));
    assert_eq!(bitmask(&set, 8), None);
}

#[test]
fn bitmask_limits() {
    assert_eq!(bitmask(&CodepointSet::single(0x41), 8), None);
    let wide = CodepointSet::from_codepoints([0x41, 0x141]);
    assert_eq!(bitmask(&wide, 8), None);
    let sixteen = CodepointSet::range(0x30, 0x3F);
    assert_eq!(bitmask(&sixteen, 8), None);
    assert_eq!(bitmask(&sixteen, 16), Some((0x30, 0xF0)));
}

#[test]
fn bitmap_covers_low_plane_only() {
    let mut set = CodepointSet::range(0x41, 0x43);
    set.add(0xFF);
    set.add(0x100);
    let bits = bitmap_of(&set);
    assert_eq!(bits[2], 0b1110);
    assert_eq!(bits[7], 1 << 31);
    assert_eq!(bits.iter().map(|w| w.count_ones()).sum::<u32>(), 4);
}

#[test]
fn class_table_deduplicates() {
    let mut table = ClassTable::default();
    let greek = ClassData {
        above: CodepointSet::range(0x391, 0x3A9),
        ..ClassData::default()
    };
    let locale = ClassData {
        locale_classes: vec![(PosixClass::Alpha, false)],
        ..ClassData::default()
    };
    let deferred = ClassData {
        deferred: Some(DeferredProperty::new("IsVowel", false)),
        ..ClassData::default()
    };

    assert_eq!(table.intern(greek.clone()), 0);
    assert_eq!(table.intern(locale.clone()), 1);
    assert_eq!(table.intern(greek), 0);
    assert_eq!(table.intern(deferred.clone()), 2);
    assert_eq!(table.intern(locale), 1);
    assert_eq!(table.intern(deferred), 2);
    assert_eq!(table.into_entries().len(), 3);
}

#[test]
fn builder_tracks_members() {
    let mut b = ClassBuilder::new(0);
    b.add_char('x' as u32);
    b.add_range('a' as u32, 'f' as u32);
    b.add_set(CodepointSet::single(0x3B1));
    assert!(b.has_member('c' as u32));
    assert!(b.has_member('x' as u32));
    assert!(b.has_member(0x3B1));
    assert!(!b.has_member('y' as u32));
    assert_eq!(b.elements, 3);
}

fn small_set() -> impl Strategy<Value = CodepointSet> {
    prop::collection::vec((0u32..600, 0u32..40), 0..6).prop_map(|pairs| {
        CodepointSet::from_ranges(pairs.into_iter().map(|(lo, len)| (lo, lo + len)))
    })
}

proptest! {
    #[test]
    fn bitmask_matches_members(set in small_set()) {
        if let Some((base, mask)) = bitmask(&set, 8) {
            for cp in 0..=0xFFu32 {
                prop_assert_eq!((cp & mask) == (base & mask), set.contains(cp));
            }
        }
    }

    #[test]
    fn bitmap_agrees_with_set(set in small_set()) {
        let bits = bitmap_of(&set);
        for cp in 0..=0xFFu32 {
            let bit = bits[(cp >> 5) as usize] & (1 << (cp & 31)) != 0;
            prop_assert_eq!(bit, set.contains(cp));
        }
    }
}
