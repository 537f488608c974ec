use proptest::prelude::*;

use crate::invlist::{CodepointSet, MAX_CODEPOINT};

fn set(ranges: &[(u32, u32)]) -> CodepointSet {
    CodepointSet::from_ranges(ranges.iter().copied())
}

#[test]
fn from_ranges_canonicalizes() {
    let s = set(&[(10, 20), (0, 5), (6, 9), (30, 40), (35, 50)]);
    assert_eq!(s.ranges(), &[(0, 20), (30, 50)]);
}

#[test]
fn inverted_range_is_dropped() {
    assert!(set(&[(9, 3)]).is_empty());
}

#[test]
fn add_range_appends_and_merges() {
    let mut s = CodepointSet::new();
    s.add_range(b'a'.into(), b'z'.into());
    s.add(b'0'.into());
    s.add_range(b'A'.into(), b'Z'.into());
    s.add(b'{'.into());
    assert_eq!(s.ranges(), &[(0x30, 0x30), (0x41, 0x5A), (0x61, 0x7B)]);
}

#[test]
fn contains_uses_inclusive_bounds() {
    let s = set(&[(0x41, 0x5A), (0x100, 0x100)]);
    assert!(s.contains(0x41));
    assert!(s.contains(0x5A));
    assert!(s.contains(0x100));
    assert!(!s.contains(0x5B));
    assert!(!s.contains(0x40));
}

#[test]
fn complement_of_empty_is_full() {
    assert!(CodepointSet::new().complement().is_full());
    assert!(CodepointSet::full().complement().is_empty());
}

#[test]
fn complement_touching_bounds() {
    let s = set(&[(0, 9), (MAX_CODEPOINT, MAX_CODEPOINT)]);
    assert_eq!(s.complement().ranges(), &[(10, MAX_CODEPOINT - 1)]);
}

#[test]
fn difference_splits_ranges() {
    let s = set(&[(0, 100)]).difference(&set(&[(10, 20), (50, 60), (100, 200)]));
    assert_eq!(s.ranges(), &[(0, 9), (21, 49), (61, 99)]);
}

#[test]
fn symmetric_difference_basic() {
    let s = set(&[(0, 10)]).symmetric_difference(&set(&[(5, 15)]));
    assert_eq!(s.ranges(), &[(0, 4), (11, 15)]);
}

#[test]
fn split_at_boundary() {
    let (below, above) = set(&[(0xF0, 0x110)]).split_at(0x100);
    assert_eq!(below.ranges(), &[(0xF0, 0xFF)]);
    assert_eq!(above.ranges(), &[(0x100, 0x110)]);
}

#[test]
fn len_and_single() {
    let s = set(&[(1, 3), (7, 7)]);
    assert_eq!(s.len(), 4);
    assert_eq!(s.as_single(), None);
    assert_eq!(CodepointSet::single(7).as_single(), Some(7));
    assert_eq!(set(&[(1, 3)]).as_single_range(), Some((1, 3)));
}

#[test]
fn display_uses_class_syntax() {
    let s = set(&[(0x61, 0x7A), (0x5F, 0x5F), (0x100, 0x101)]);
    assert_eq!(s.to_string(), "[\\x5Fa-z\\x{100}\\x{101}]");
}

#[test]
fn words_round_trip() {
    let s = set(&[(3, 9), (20, 20)]);
    assert_eq!(CodepointSet::from_words(&s.to_words()), s);
}

fn arb_set() -> impl Strategy<Value = CodepointSet> {
    prop::collection::vec((0u32..700, 0u32..40), 0..8)
        .prop_map(|v| CodepointSet::from_ranges(v.into_iter().map(|(lo, len)| (lo, lo + len))))
}

fn members(s: &CodepointSet) -> Vec<u32> {
    (0u32..760).filter(|&cp| s.contains(cp)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn complement_is_self_inverse(a in arb_set()) {
        prop_assert_eq!(a.complement().complement(), a);
    }

    #[test]
    fn union_matches_membership(a in arb_set(), b in arb_set()) {
        let u = a.union(&b);
        for cp in 0u32..760 {
            prop_assert_eq!(u.contains(cp), a.contains(cp) || b.contains(cp));
        }
    }

    #[test]
    fn intersection_is_de_morgan_dual(a in arb_set(), b in arb_set()) {
        let lhs = a.intersection(&b);
        let rhs = a.complement().union(&b.complement()).complement();
        prop_assert_eq!(lhs, rhs);
    }

    #[test]
    fn difference_is_intersection_with_complement(a in arb_set(), b in arb_set()) {
        prop_assert_eq!(a.difference(&b), a.intersection(&b.complement()));
    }

    #[test]
    fn symmetric_difference_composes(a in arb_set(), b in arb_set()) {
        let x = a.symmetric_difference(&b);
        prop_assert_eq!(x.complement(), a.complement().symmetric_difference(&b));
        prop_assert_eq!(&x, &b.symmetric_difference(&a));
    }

    #[test]
    fn canonical_form_is_unique(a in arb_set()) {
        let rebuilt = CodepointSet::from_codepoints(members(&a));
        prop_assert_eq!(rebuilt.ranges(), a.ranges());
        for w in a.ranges().windows(2) {
            prop_assert!(w[0].1 + 1 < w[1].0);
        }
    }
}
