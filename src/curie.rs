//! CURIE definitions.
//!
//! A CURIE maps the prefix of a namespaced relation such as `acme:widgets`
//! to a documentation URL template, typically `http://docs.example/{rel}`.

use serde_json::Value;

use crate::error::{HalError, HalResult};
use crate::template::{Templated, Variables, has_placeholder};

/// One entry of the `curies` link relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curie {
    name: String,
    href: String,
    templated: bool,
}

impl Curie {
    /// Create a CURIE. It is templated if `templated` is set or `href`
    /// contains a placeholder.
    pub fn new(name: impl Into<String>, href: impl Into<String>, templated: bool) -> Self {
        let href = href.into();
        let templated = templated || has_placeholder(&href);
        Self {
            name: name.into(),
            href,
            templated,
        }
    }

    /// Read a CURIE from its raw `{"name", "href", "templated"?}` object.
    pub fn from_value(raw: &Value) -> HalResult<Self> {
        let Some(name) = raw.get("name").and_then(Value::as_str) else {
            return Err(HalError::InvalidLink(
                "curies".into(),
                "CURIE entry without a `name`".into(),
            ));
        };
        let href = raw.get("href").and_then(Value::as_str).unwrap_or_default();
        let templated = raw
            .get("templated")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(Self::new(name, href, templated))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Documentation URL for `reference`, e.g. `widgets` in `acme:widgets`.
    pub fn docs_for(&self, reference: &str) -> String {
        self.prepare_url(&Variables::new().with("rel", reference))
    }

    /// A CURIE alone names no resource, so it can never be fetched.
    pub fn get(&self) -> HalResult<()> {
        Err(HalError::CurieNotDereferenceable(self.name.clone()))
    }
}

impl Templated for Curie {
    fn href(&self) -> &str {
        &self.href
    }

    fn is_templated(&self) -> bool {
        self.templated
    }
}

/// Read the `curies` relation.
///
/// Some servers (Apigility / ZF-Hal among them) emit a single CURIE object
/// instead of an array. Both shapes are accepted. Malformed entries are
/// skipped.
pub fn parse_curies(raw: &Value) -> Vec<Curie> {
    let entries: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) if map.is_empty() => Vec::new(),
        Value::Object(_) => vec![raw],
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| match Curie::from_value(entry) {
            Ok(curie) => Some(curie),
            Err(err) => {
                tracing::warn!("Skipping malformed CURIE {entry}: {err}");
                None
            }
        })
        .collect()
}
