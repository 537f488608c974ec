//! `\p{...}` and `\P{...}`.

use regula_bytecode::DeferredProperty;
use regula_core::unicode::wildcard_set;
use regula_core::PropertyLookup;

use super::{ClassBuilder, complement_if};
use crate::diagnostics::DiagnosticKind;
use crate::parse::{PResult, Parser};
use crate::trace::CompileTracer;

/// Properties whose members change under case folding.
const CASE_PROPERTIES: &[&str] = &[
    "lower",
    "lowercase",
    "upper",
    "uppercase",
    "title",
    "titlecase",
    "ll",
    "lu",
    "lt",
    "lowercaseletter",
    "uppercaseletter",
    "titlecaseletter",
    "cased",
    "casedletter",
    "lc",
    "l&",
];

fn loose(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '_' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn is_case_property(name: &str, value: Option<&str>) -> bool {
    let key = match value {
        Some(value) if matches!(loose(name).as_str(), "gc" | "generalcategory" | "category") => {
            loose(value)
        }
        Some(_) => return false,
        None => loose(name),
    };
    CASE_PROPERTIES.contains(&key.as_str())
}

impl<T: CompileTracer> Parser<'_, T> {
    /// A property escape at the cursor (on the backslash), added to `b`.
    pub(crate) fn parse_property(&mut self, b: &mut ClassBuilder) -> PResult<()> {
        let start = self.src.pos();
        self.src.bump();
        let mut negated = self.src.bump() == Some('P');

        let body = if self.src.eat('{') {
            match self.src.eat_until('}') {
                Some(body) => body.to_string(),
                None => {
                    let end = self.src.text().len();
                    return Err(self.error_msg(
                        DiagnosticKind::UnterminatedConstruct,
                        start,
                        end,
                        "property is missing its closing `}`",
                    ));
                }
            }
        } else {
            match self.src.bump() {
                Some(c) if c.is_alphabetic() => c.to_string(),
                _ => {
                    let end = self.src.pos();
                    return Err(self.error_msg(
                        DiagnosticKind::InvalidEscape,
                        start,
                        end,
                        "`\\p` needs a property name",
                    ));
                }
            }
        };
        let end = self.src.pos();

        let mut spec = body.trim();
        if let Some(rest) = spec.strip_prefix('^') {
            negated = !negated;
            spec = rest.trim_start();
        }
        let (name, value) = match spec.find(['=', ':']) {
            Some(i) => (spec[..i].trim(), Some(spec[i + 1..].trim())),
            None => (spec, None),
        };
        if name.is_empty() {
            return Err(self.error_msg(DiagnosticKind::UnknownProperty, start, end, body));
        }

        let data = self.opts.unicode.clone();
        let lookup = match value {
            Some(v) if v.len() >= 2 && v.starts_with('/') && v.ends_with('/') => {
                match wildcard_set(&*data, name, &v[1..v.len() - 1]) {
                    Ok(set) => PropertyLookup::Found {
                        set,
                        deprecated: None,
                    },
                    Err(e) => {
                        return Err(self.error_msg(
                            DiagnosticKind::InvalidWildcard,
                            start,
                            end,
                            e.to_string(),
                        ));
                    }
                }
            }
            _ => data.property(name, value),
        };

        match lookup {
            PropertyLookup::Found { set, deprecated } => {
                if let Some(advice) = deprecated {
                    self.warn_msg(
                        DiagnosticKind::DeprecatedProperty,
                        start,
                        end,
                        format!("`{spec}` ({advice})"),
                    );
                }
                let set = if self.mode.fold && is_case_property(name, value) {
                    data.fold_closure(&set)
                } else {
                    set
                };
                b.add_set(complement_if(set, negated));
            }
            PropertyLookup::Deferred => {
                if b.deferred.is_some() {
                    let range = self.span(start, end);
                    self.diag
                        .report(DiagnosticKind::UnknownProperty, range)
                        .message(spec)
                        .hint("only one user-defined property per class")
                        .emit();
                    return Err(crate::parse::Abort::Reported);
                }
                b.deferred = Some(DeferredProperty::new(spec, negated));
                b.elements += 1;
            }
            PropertyLookup::Unknown => {
                return Err(self.error_msg(DiagnosticKind::UnknownProperty, start, end, spec));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::is_case_property;

    #[test]
    fn case_properties() {
        assert!(is_case_property("Lowercase_Letter", None));
        assert!(is_case_property("gc", Some("Lu")));
        assert!(is_case_property("Upper", None));
        assert!(!is_case_property("Greek", None));
        assert!(!is_case_property("sc", Some("Lu")));
    }
}
