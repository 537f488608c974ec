//! Canonical code point sets ("inversion lists").
//!
//! A set is a strictly increasing list of disjoint, non-adjacent inclusive
//! ranges. Every operation keeps that form, so two equal sets always have
//! identical range lists and serialize identically.

use std::fmt;

use serde::Serialize;

/// Largest code point a set may contain.
pub const MAX_CODEPOINT: u32 = 0x10FFFF;

#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CodepointSet {
    ranges: Vec<(u32, u32)>,
}

impl CodepointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every code point `0..=MAX_CODEPOINT`.
    pub fn full() -> Self {
        Self {
            ranges: vec![(0, MAX_CODEPOINT)],
        }
    }

    pub fn single(cp: u32) -> Self {
        Self::range(cp, cp)
    }

    pub fn range(lo: u32, hi: u32) -> Self {
        let mut set = Self::new();
        set.add_range(lo, hi);
        set
    }

    /// Builds a canonical set from arbitrary (possibly overlapping,
    /// unordered) inclusive ranges.
    pub fn from_ranges(ranges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut raw: Vec<(u32, u32)> = ranges
            .into_iter()
            .filter_map(|(lo, hi)| clamp(lo, hi))
            .collect();
        raw.sort_unstable();
        Self {
            ranges: coalesce(raw),
        }
    }

    pub fn from_codepoints(cps: impl IntoIterator<Item = u32>) -> Self {
        Self::from_ranges(cps.into_iter().map(|cp| (cp, cp)))
    }

    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ranges == [(0, MAX_CODEPOINT)]
    }

    /// Number of member code points.
    pub fn len(&self) -> u64 {
        self.ranges
            .iter()
            .map(|&(lo, hi)| u64::from(hi - lo) + 1)
            .sum()
    }

    pub fn min(&self) -> Option<u32> {
        self.ranges.first().map(|r| r.0)
    }

    pub fn max(&self) -> Option<u32> {
        self.ranges.last().map(|r| r.1)
    }

    /// The only member, if the set has exactly one.
    pub fn as_single(&self) -> Option<u32> {
        match self.ranges.as_slice() {
            [(lo, hi)] if lo == hi => Some(*lo),
            _ => None,
        }
    }

    /// The only range, if the set is one contiguous run.
    pub fn as_single_range(&self) -> Option<(u32, u32)> {
        match self.ranges.as_slice() {
            [r] => Some(*r),
            _ => None,
        }
    }

    pub fn contains(&self, cp: u32) -> bool {
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if hi < cp {
                    std::cmp::Ordering::Less
                } else if lo > cp {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// True when every member is in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.difference(other).is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.ranges.iter().flat_map(|&(lo, hi)| lo..=hi)
    }

    pub fn add(&mut self, cp: u32) {
        self.add_range(cp, cp);
    }

    pub fn add_range(&mut self, lo: u32, hi: u32) {
        let Some((lo, hi)) = clamp(lo, hi) else {
            return;
        };
        // Appending past the end is the common case while parsing classes.
        if let Some(last) = self.ranges.last_mut() {
            if lo > last.1.saturating_add(1) {
                self.ranges.push((lo, hi));
                return;
            }
            if lo >= last.0 {
                last.1 = last.1.max(hi);
                return;
            }
        } else {
            self.ranges.push((lo, hi));
            return;
        }
        *self = self.union(&Self { ranges: vec![(lo, hi)] });
    }

    pub fn extend(&mut self, other: &Self) {
        *self = self.union(other);
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut merged = Vec::with_capacity(self.ranges.len() + other.ranges.len());
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() || j < other.ranges.len() {
            let take_left = match (self.ranges.get(i), other.ranges.get(j)) {
                (Some(a), Some(b)) => a.0 <= b.0,
                (Some(_), None) => true,
                _ => false,
            };
            let next = if take_left {
                i += 1;
                self.ranges[i - 1]
            } else {
                j += 1;
                other.ranges[j - 1]
            };
            push_merged(&mut merged, next);
        }
        Self { ranges: merged }
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let (alo, ahi) = self.ranges[i];
            let (blo, bhi) = other.ranges[j];
            let lo = alo.max(blo);
            let hi = ahi.min(bhi);
            if lo <= hi {
                out.push((lo, hi));
            }
            if ahi < bhi {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self { ranges: out }
    }

    pub fn complement(&self) -> Self {
        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = 0u32;
        for &(lo, hi) in &self.ranges {
            if lo > next {
                out.push((next, lo - 1));
            }
            next = hi.saturating_add(1);
        }
        if self.max().is_none_or(|hi| hi < MAX_CODEPOINT) {
            out.push((next, MAX_CODEPOINT));
        }
        Self { ranges: out }
    }

    pub fn difference(&self, other: &Self) -> Self {
        let mut out = Vec::new();
        let mut j = 0;
        for &(lo, hi) in &self.ranges {
            let mut start = lo;
            while j < other.ranges.len() && other.ranges[j].1 < start {
                j += 1;
            }
            let mut k = j;
            while start <= hi {
                match other.ranges.get(k) {
                    Some(&(blo, bhi)) if blo <= hi => {
                        if blo > start {
                            out.push((start, blo - 1));
                        }
                        if bhi >= hi {
                            start = hi.saturating_add(1);
                            if hi == MAX_CODEPOINT {
                                break;
                            }
                        } else {
                            start = bhi + 1;
                            k += 1;
                        }
                    }
                    _ => {
                        out.push((start, hi));
                        break;
                    }
                }
            }
        }
        Self { ranges: out }
    }

    pub fn symmetric_difference(&self, other: &Self) -> Self {
        self.union(other).difference(&self.intersection(other))
    }

    /// Members below `limit` and members at or above it.
    pub fn split_at(&self, limit: u32) -> (Self, Self) {
        if limit == 0 {
            return (Self::new(), self.clone());
        }
        let below = self.intersection(&Self::range(0, limit - 1));
        let above = self.difference(&below);
        (below, above)
    }

    /// Flattened `[lo, hi, lo, hi, ...]` form used for hashing and storage.
    pub fn to_words(&self) -> Vec<u32> {
        self.ranges.iter().flat_map(|&(lo, hi)| [lo, hi]).collect()
    }

    pub fn from_words(words: &[u32]) -> Self {
        Self::from_ranges(words.chunks_exact(2).map(|w| (w[0], w[1])))
    }
}

impl fmt::Debug for CodepointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Bracket-class style: `[a-z\x{100}]`.
impl fmt::Display for CodepointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for &(lo, hi) in &self.ranges {
            write_cp(f, lo)?;
            if hi > lo {
                if hi > lo + 1 {
                    f.write_str("-")?;
                }
                write_cp(f, hi)?;
            }
        }
        f.write_str("]")
    }
}

fn write_cp(f: &mut fmt::Formatter<'_>, cp: u32) -> fmt::Result {
    match char::from_u32(cp) {
        Some(c) if c.is_ascii_alphanumeric() => write!(f, "{c}"),
        _ if cp <= 0xFF => write!(f, "\\x{cp:02X}"),
        _ => write!(f, "\\x{{{cp:X}}}"),
    }
}

impl FromIterator<u32> for CodepointSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self::from_codepoints(iter)
    }
}

fn clamp(lo: u32, hi: u32) -> Option<(u32, u32)> {
    let hi = hi.min(MAX_CODEPOINT);
    (lo <= hi).then_some((lo, hi))
}

fn coalesce(sorted: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    let mut out = Vec::with_capacity(sorted.len());
    for r in sorted {
        push_merged(&mut out, r);
    }
    out
}

/// Appends `r` (whose start is >= every previous start) merging overlap and
/// adjacency.
fn push_merged(out: &mut Vec<(u32, u32)>, r: (u32, u32)) {
    if let Some(last) = out.last_mut()
        && r.0 <= last.1.saturating_add(1)
    {
        last.1 = last.1.max(r.1);
        return;
    }
    out.push(r);
}
