#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures shared by the regula crates.
//!
//! - [`CodepointSet`]: canonical inversion list with O(n) set algebra
//! - [`edit_distance`]: bounded Damerau-Levenshtein distance
//! - [`unicode`]: the Unicode data service consulted by the class engine
//! - [`Colors`]: ANSI palette for dumps and traces

mod colors;
pub mod edit_distance;
mod invlist;
pub mod unicode;

#[cfg(test)]
mod edit_distance_tests;
#[cfg(test)]
mod invlist_tests;

pub use colors::Colors;
pub use edit_distance::{damerau_levenshtein, edit_distance};
pub use invlist::{CodepointSet, MAX_CODEPOINT};
pub use unicode::{PosixClass, PropertyLookup, PropertyResolver, StandardUnicode, UnicodeData};
