//! URI template expansion.
//!
//! Only the simple-string form of RFC 6570 is understood: `{name}` is
//! replaced by the value bound to `name`. A placeholder without a binding is
//! kept verbatim, so a partially expanded href can still be inspected or
//! expanded again later.

use std::fmt::Display;

use rustc_hash::FxHashMap;

/// Variables bound to template placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    values: FxHashMap<String, String>,
}

impl Variables {
    /// Create an empty set of variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create variables from `(name, value)` pairs. Later pairs win.
    pub fn from_pairs(iter: impl IntoIterator<Item = (impl Into<String>, impl Display)>) -> Self {
        let mut vars = Self::new();
        for (name, value) in iter {
            vars.insert(name, value);
        }
        vars
    }

    /// Bind `name` to `value`, returning `self` for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.insert(name, value);
        self
    }

    /// Bind `name` to `value`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Display) {
        self.values.insert(name.into(), value.to_string());
    }

    /// Get the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for Variables {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Expand every `{name}` placeholder in `template` that has a binding.
pub fn expand(template: &str, variables: &Variables) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            // unterminated, copy the remainder as-is
            out.push_str(&rest[open..]);
            return out;
        };

        let name = &after[..close];
        match variables.get(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

/// Returns `true` if `template` holds at least one `{...}` placeholder.
pub fn has_placeholder(template: &str) -> bool {
    template
        .find('{')
        .is_some_and(|open| template[open..].contains('}'))
}

/// Shared behaviour of hypermedia targets that carry an href template.
pub trait Templated {
    /// The raw, unexpanded href.
    fn href(&self) -> &str;

    /// Whether the href must be expanded before use.
    fn is_templated(&self) -> bool;

    /// Build a concrete URL from the href.
    ///
    /// Non-templated hrefs are returned untouched even if they happen to
    /// contain braces.
    fn prepare_url(&self, variables: &Variables) -> String {
        if self.is_templated() {
            expand(self.href(), variables)
        } else {
            self.href().to_string()
        }
    }
}
