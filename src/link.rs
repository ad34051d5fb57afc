//! Hypermedia links.
//!
//! A [`Link`] is materialised from a `_links` entry the first time its
//! relation is accessed. It keeps a weak handle on the document it came
//! from: CURIE lookup and link dereferencing go through that document, which
//! must therefore outlive the link.

use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::document::HalDocument;
use crate::entry_point::EntryPoint;
use crate::error::{HalError, HalResult};
use crate::template::{Templated, Variables, has_placeholder};

/// One link relation of a HAL document.
#[derive(Debug, Clone)]
pub struct Link {
    name: String,
    href: String,
    templated: bool,
    title: Option<String>,
    nc_name: Option<String>,
    reference: Option<String>,
    owner: Weak<HalDocument>,
}

impl Link {
    /// Create a link for relation `name`.
    ///
    /// A name of the form `prefix:reference` (exactly one colon) is treated
    /// as CURIE-qualified.
    pub fn new(
        name: impl Into<String>,
        href: impl Into<String>,
        templated: bool,
        title: Option<String>,
        owner: Weak<HalDocument>,
    ) -> Self {
        let name = name.into();
        let (nc_name, reference) = match name.split_once(':') {
            Some((prefix, reference)) if !reference.contains(':') => {
                (Some(prefix.to_string()), Some(reference.to_string()))
            }
            _ => (None, None),
        };

        Self {
            name,
            href: href.into(),
            templated,
            title,
            nc_name,
            reference,
            owner,
        }
    }

    /// Read a link from its raw `_links` value.
    ///
    /// When a relation holds an array of link objects, the first one is used.
    pub fn from_value(name: &str, raw: &Value, owner: Weak<HalDocument>) -> HalResult<Self> {
        let object = match raw {
            Value::Object(_) => raw,
            Value::Array(items) => items.first().ok_or_else(|| {
                HalError::InvalidLink(name.to_string(), "empty link array".into())
            })?,
            other => {
                return Err(HalError::InvalidLink(
                    name.to_string(),
                    format!("expected an object, got {other}"),
                ));
            }
        };

        let href = object.get("href").and_then(Value::as_str).unwrap_or_default();
        let templated = object
            .get("templated")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let title = object
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self::new(name, href, templated, title, owner))
    }

    /// Full relation name, e.g. `acme:widgets`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// CURIE prefix of the relation, `acme` in `acme:widgets`.
    pub fn nc_name(&self) -> Option<&str> {
        self.nc_name.as_deref()
    }

    /// Local part of the relation, `widgets` in `acme:widgets`.
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Documentation URL resolved through the owner's CURIEs.
    pub fn docs(&self) -> Option<String> {
        self.owner.upgrade()?.curie_href(self)
    }

    /// Fetch the linked resource as a new top-level document.
    ///
    /// Templated links must have every placeholder bound, and the expanded
    /// URL must not be empty. The request goes through the owning
    /// document's client context.
    pub async fn get(&self, variables: &Variables) -> HalResult<Rc<HalDocument>> {
        let url = self.prepare_url(variables);
        if url.is_empty() {
            return Err(HalError::EmptyHref(self.name.clone()));
        }
        if self.templated && (variables.is_empty() || has_placeholder(&url)) {
            return Err(HalError::MissingVariables(self.name.clone()));
        }

        let owner = self
            .owner
            .upgrade()
            .ok_or_else(|| HalError::DetachedLink(self.name.clone()))?;

        EntryPoint::new(url, owner.context().clone())
            .resource()
            .await
    }

    pub(crate) fn rebind(&self, owner: Weak<HalDocument>) -> Self {
        Self {
            owner,
            ..self.clone()
        }
    }
}

impl Templated for Link {
    fn href(&self) -> &str {
        &self.href
    }

    fn is_templated(&self) -> bool {
        self.templated
    }
}
