//! Bidirectional map between dotted selector strings and ordered Parts arrays.
//!
//! Parts is the canonical internal form (§4.1): `toParts`/`fromParts` are the
//! only places a dotted string is parsed or rendered; every other component
//! in this crate works with `Parts`.

use std::fmt;

use crate::error::ConfigError;

/// Canonical array form of a dotted selector, e.g. `$.util.cmd` -> `["$", "util", "cmd"]`.
///
/// The first element names a global variable; subsequent elements name
/// own-properties of the value reached so far.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Parts(Vec<String>);

impl Parts {
    /// Builds a Parts from an already-split, non-empty sequence of names.
    ///
    /// # Errors
    /// Returns `ConfigError::EmptyParts` if `names` is empty.
    pub fn new(names: Vec<String>) -> Result<Self, ConfigError> {
        if names.is_empty() {
            return Err(ConfigError::EmptyParts);
        }
        Ok(Self(names))
    }

    /// Splits a dotted selector string into Parts.
    ///
    /// # Errors
    /// Returns `ConfigError::EmptyParts` for an empty string, and
    /// `ConfigError::MalformedSelector` for a selector with an empty
    /// component (e.g. `"a..b"`, leading/trailing `.`).
    pub fn to_parts(selector: &str) -> Result<Self, ConfigError> {
        if selector.is_empty() {
            return Err(ConfigError::EmptyParts);
        }
        let names: Vec<String> = selector.split('.').map(str::to_owned).collect();
        if names.iter().any(String::is_empty) {
            return Err(ConfigError::MalformedSelector(selector.to_owned()));
        }
        Ok(Self(names))
    }

    /// Joins Parts back into a dotted selector string.
    #[must_use]
    pub fn from_parts(parts: &[String]) -> String {
        parts.join(".")
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn first(&self) -> &str {
        &self.0[0]
    }

    #[must_use]
    pub fn last(&self) -> &str {
        self.0.last().expect("Parts is never empty")
    }

    /// All but the last component. Empty when `self` has exactly one part
    /// (a bare variable binding).
    #[must_use]
    pub fn prefix(&self) -> &[String] {
        &self.0[..self.0.len() - 1]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false // Parts is never empty by construction; kept for clippy::len_without_is_empty
    }

    /// Returns a new Parts extending `self` with one more component, for
    /// descending into an own-property during a RECURSE walk.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut names = self.0.clone();
        names.push(name.to_owned());
        Self(names)
    }

    #[must_use]
    pub fn display(&self) -> String {
        Self::from_parts(&self.0)
    }

    /// Renders this Parts as a JS expression reaching the same location:
    /// the first component verbatim (a variable name), then one access step
    /// per remaining component — `.name` for a valid identifier, `[0]` for a
    /// canonical array index, `["a-b"]` (via `quote_js_string`) otherwise.
    /// `display`'s plain `.`-join is only valid JS when every component
    /// happens to be an identifier; this is the form `dumpBinding`/`toExpr`
    /// must use to emit syntactically valid property access (§3's Array
    /// class and arbitrary property names both need it).
    #[must_use]
    pub fn to_js_expr(&self) -> String {
        let mut out = self.0[0].clone();
        for part in &self.0[1..] {
            out.push_str(&property_access(part));
        }
        out
    }
}

fn property_access(name: &str) -> String {
    if is_identifier(name) {
        format!(".{name}")
    } else if is_array_index(name) {
        format!("[{name}]")
    } else {
        format!("[{}]", crate::quote::quote_js_string(name))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c == '$' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}

fn is_array_index(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) && (name == "0" || !name.starts_with('0'))
}

impl fmt::Display for Parts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_selector_string() {
        let parts = Parts::to_parts("$.util.cmd").unwrap();
        assert_eq!(parts.as_slice(), &["$", "util", "cmd"]);
        assert_eq!(parts.display(), "$.util.cmd");
    }

    #[test]
    fn single_part_has_empty_prefix() {
        let parts = Parts::to_parts("x").unwrap();
        assert_eq!(parts.prefix(), &[] as &[String]);
        assert_eq!(parts.last(), "x");
    }

    #[test]
    fn empty_selector_is_an_error() {
        assert!(matches!(Parts::to_parts(""), Err(ConfigError::EmptyParts)));
    }

    #[test]
    fn selector_with_empty_component_is_malformed() {
        assert!(matches!(Parts::to_parts("a..b"), Err(ConfigError::MalformedSelector(_))));
        assert!(matches!(Parts::to_parts(".a"), Err(ConfigError::MalformedSelector(_))));
    }

    #[test]
    fn child_appends_one_component() {
        let parts = Parts::to_parts("a.b").unwrap();
        let child = parts.child("c");
        assert_eq!(child.display(), "a.b.c");
    }

    #[test]
    fn js_expr_uses_dot_for_identifier_properties() {
        let parts = Parts::to_parts("a.b.c").unwrap();
        assert_eq!(parts.to_js_expr(), "a.b.c");
    }

    #[test]
    fn js_expr_uses_bracket_for_array_indices() {
        let parts = Parts::new(vec!["a".to_owned(), "0".to_owned()]).unwrap();
        assert_eq!(parts.to_js_expr(), "a[0]");
    }

    #[test]
    fn js_expr_quotes_non_identifier_keys() {
        let parts = Parts::new(vec!["a".to_owned(), "a-b".to_owned()]).unwrap();
        assert_eq!(parts.to_js_expr(), "a['a-b']");

        let parts = Parts::new(vec!["a".to_owned(), "x y".to_owned()]).unwrap();
        assert_eq!(parts.to_js_expr(), "a['x y']");
    }

    #[test]
    fn js_expr_treats_leading_zero_digit_strings_as_non_canonical_indices() {
        let parts = Parts::new(vec!["a".to_owned(), "01".to_owned()]).unwrap();
        assert_eq!(parts.to_js_expr(), "a['01']");
    }
}
