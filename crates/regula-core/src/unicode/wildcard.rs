//! Property value wildcards: `\p{name=/pattern/}`.
//!
//! The sub-pattern is compiled once into a DFA and tested against every
//! legal value of the property (or every known character name for
//! `name`/`na`); the sets of all matching values are unioned.

use regex_automata::Input;
use regex_automata::dfa::{Automaton, StartKind, dense};
use thiserror::Error;

use super::{PropertyLookup, UnicodeData};
use crate::CodepointSet;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WildcardError {
    #[error("invalid wildcard sub-pattern: {0}")]
    InvalidPattern(String),

    #[error("property '{0}' has no enumerable values")]
    NotEnumerable(String),
}

pub fn wildcard_set(
    data: &dyn UnicodeData,
    property: &str,
    pattern: &str,
) -> Result<CodepointSet, WildcardError> {
    let dfa = dense::DFA::builder()
        .configure(dense::DFA::config().start_kind(StartKind::Unanchored))
        .build(pattern)
        .map_err(|e| WildcardError::InvalidPattern(e.to_string()))?;
    let matches = |text: &str| {
        dfa.try_search_fwd(&Input::new(text))
            .ok()
            .flatten()
            .is_some()
    };

    let property_key: String = property
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if matches!(property_key.as_str(), "na" | "name") {
        return Ok(data
            .all_names()
            .into_iter()
            .filter(|(name, _)| matches(name))
            .map(|(_, cp)| cp)
            .collect());
    }

    let values = data
        .property_values(property)
        .ok_or_else(|| WildcardError::NotEnumerable(property.to_string()))?;

    let mut out = CodepointSet::new();
    for value in values.into_iter().filter(|v| matches(v)) {
        if let PropertyLookup::Found { set, .. } = data.property(property, Some(value)) {
            out.extend(&set);
        }
    }
    Ok(out)
}
