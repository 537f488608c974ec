use crate::edit_distance::{closest, damerau_levenshtein, edit_distance};

#[test]
fn identical_sequences() {
    assert_eq!(damerau_levenshtein("alpha", "alpha"), 0);
    assert_eq!(damerau_levenshtein("", ""), 0);
}

#[test]
fn single_edits() {
    assert_eq!(damerau_levenshtein("alpha", "alph"), 1);
    assert_eq!(damerau_levenshtein("alpha", "alphas"), 1);
    assert_eq!(damerau_levenshtein("alpha", "alpga"), 1);
}

#[test]
fn transposition_costs_one() {
    assert_eq!(damerau_levenshtein("alpha", "lapha"), 1);
    assert_eq!(damerau_levenshtein("digit", "dgiit"), 1);
}

#[test]
fn non_adjacent_transposition() {
    assert_eq!(damerau_levenshtein("ca", "abc"), 2);
}

#[test]
fn empty_side() {
    assert_eq!(damerau_levenshtein("", "word"), 4);
    assert_eq!(damerau_levenshtein("word", ""), 4);
}

#[test]
fn cutoff_rejects_far_candidates() {
    let a: Vec<char> = "alpha".chars().collect();
    let b: Vec<char> = "xdigit".chars().collect();
    assert_eq!(edit_distance(&a, &b, 2), None);

    let c: Vec<char> = "alhpa".chars().collect();
    assert_eq!(edit_distance(&a, &c, 2), Some(1));
}

#[test]
fn cutoff_on_length_difference() {
    let a: Vec<char> = "a".chars().collect();
    let b: Vec<char> = "alnum".chars().collect();
    assert_eq!(edit_distance(&a, &b, 2), None);
}

#[test]
fn works_on_bytes() {
    assert_eq!(edit_distance(b"space", b"spcae", 2), Some(1));
}

#[test]
fn closest_prefers_smallest_distance() {
    let names = ["alpha", "alnum", "digit"];
    assert_eq!(closest("alph", &names, 2), Some(("alpha", 1)));
    assert_eq!(closest("bogus", &names, 2), None);
}
