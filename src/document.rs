//! The HAL document model.
//!
//! A [`HalDocument`] splits a decoded HAL+JSON object into three parts:
//!
//! ```text
//!   { "title": ..., "_links": {...}, "_embedded": {...} }
//!        │               │                 │
//!    properties        links           embedded
//!   (plain JSON)   (raw → Link)   (raw → HalDocument | ResourceCollection)
//! ```
//!
//! Links and embedded values stay raw until first accessed. Materialisation
//! replaces the raw slot in place, so repeated access returns the same `Rc`.
//! A relation that is only linked is fetched on first [`HalDocument::get`]
//! and cached in the embedded slot; later calls perform no I/O.
//!
//! **Invariants:**
//! - A property shadows an embedded value or link of the same name.
//! - The CURIE table is rebuilt from `_links.curies` on construction and on
//!   every [`HalDocument::refresh`].
//! - Document graphs are single-threaded: memoisation is idempotent but not
//!   atomic, and nothing here is `Send`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use http::StatusCode;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::client::{ClientContext, Fetcher, RequestFactory};
use crate::collection::ResourceCollection;
use crate::curie::{Curie, parse_curies};
use crate::entry_point::{self, ContentTypePolicy};
use crate::error::{HalError, HalResult};
use crate::link::Link;
use crate::template::{Templated, Variables};

/// A lazily materialised value.
#[derive(Debug, Clone)]
pub(crate) enum Slot<T> {
    Raw(Value),
    Materialized(T),
}

/// What an embedded relation materialises into.
#[derive(Debug, Clone)]
enum Nested {
    Resource(Rc<HalDocument>),
    Collection(Rc<ResourceCollection>),
}

impl From<Nested> for Resolved {
    fn from(nested: Nested) -> Self {
        match nested {
            Nested::Resource(doc) => Resolved::Resource(doc),
            Nested::Collection(col) => Resolved::Collection(col),
        }
    }
}

/// The value [`HalDocument::get`] resolves a name to.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A plain property.
    Property(Value),
    /// A single embedded or linked resource.
    Resource(Rc<HalDocument>),
    /// An embedded collection.
    Collection(Rc<ResourceCollection>),
}

impl Resolved {
    pub fn as_property(&self) -> Option<&Value> {
        match self {
            Resolved::Property(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Rc<HalDocument>> {
        match self {
            Resolved::Resource(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Rc<ResourceCollection>> {
        match self {
            Resolved::Collection(col) => Some(col),
            _ => None,
        }
    }

    pub fn into_property(self) -> Option<Value> {
        match self {
            Resolved::Property(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_resource(self) -> Option<Rc<HalDocument>> {
        match self {
            Resolved::Resource(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn into_collection(self) -> Option<Rc<ResourceCollection>> {
        match self {
            Resolved::Collection(col) => Some(col),
            _ => None,
        }
    }
}

/// Shape of a raw `_embedded` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedShape {
    Single,
    Collection,
}

/// Decide whether a raw embedded value is one resource or a collection.
///
/// Arrays, empty objects and objects keyed exactly `"0"..="n-1"` are
/// collections; anything else is a single resource.
pub fn classify_embedded(raw: &Value) -> EmbeddedShape {
    match raw {
        Value::Array(_) => EmbeddedShape::Collection,
        Value::Object(map) if map.is_empty() || is_index_keyed(map) => EmbeddedShape::Collection,
        _ => EmbeddedShape::Single,
    }
}

fn is_index_keyed(map: &Map<String, Value>) -> bool {
    (0..map.len()).all(|i| map.contains_key(&i.to_string()))
}

/// Elements of a raw value classified as a collection, in index order.
fn collection_elements(raw: &Value) -> Vec<Value> {
    match raw {
        Value::Array(items) => items.clone(),
        Value::Object(map) => (0..map.len())
            .filter_map(|i| map.get(&i.to_string()).cloned())
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Default)]
struct DocumentState {
    properties: Map<String, Value>,
    links: FxHashMap<String, Slot<Rc<Link>>>,
    embedded: FxHashMap<String, Slot<Nested>>,
    curies: FxHashMap<String, Rc<Curie>>,
}

impl DocumentState {
    fn new(
        properties: Map<String, Value>,
        links: Map<String, Value>,
        embedded: Map<String, Value>,
    ) -> Self {
        let curies = links
            .get("curies")
            .map(parse_curies)
            .unwrap_or_default()
            .into_iter()
            .map(|curie| (curie.name().to_string(), Rc::new(curie)))
            .collect();

        Self {
            properties,
            links: links.into_iter().map(|(k, v)| (k, Slot::Raw(v))).collect(),
            embedded: embedded
                .into_iter()
                .map(|(k, v)| (k, Slot::Raw(v)))
                .collect(),
            curies,
        }
    }

    /// Copy for a new wrapper: data is shared, links point at `owner`.
    fn rebound(&self, owner: &Weak<HalDocument>) -> Self {
        let links = self
            .links
            .iter()
            .map(|(name, slot)| {
                let slot = match slot {
                    Slot::Materialized(link) => Slot::Materialized(Rc::new(link.rebind(owner.clone()))),
                    Slot::Raw(raw) => Slot::Raw(raw.clone()),
                };
                (name.clone(), slot)
            })
            .collect();

        Self {
            links,
            ..self.clone()
        }
    }
}

/// A parsed HAL resource.
#[derive(Debug)]
pub struct HalDocument {
    this: Weak<HalDocument>,
    state: RefCell<DocumentState>,
    context: ClientContext,
}

impl HalDocument {
    /// Create a document from already separated parts.
    pub fn new(
        properties: Map<String, Value>,
        links: Map<String, Value>,
        embedded: Map<String, Value>,
        context: ClientContext,
    ) -> Rc<Self> {
        Self::from_state(DocumentState::new(properties, links, embedded), context)
    }

    /// Create a document from a decoded HAL+JSON value.
    ///
    /// `_links` and `_embedded` are split off; every other key is a
    /// property. A top-level array becomes a document keyed by index.
    pub fn create(data: Value, context: ClientContext) -> HalResult<Rc<Self>> {
        let mut properties = match data {
            Value::Object(map) => map,
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            other => {
                return Err(HalError::InvalidDocument(format!(
                    "expected a JSON object, got {other}"
                )));
            }
        };

        let links = section(properties.remove("_links"), "_links")?;
        let embedded = section(properties.remove("_embedded"), "_embedded")?;

        Ok(Self::new(properties, links, embedded, context))
    }

    fn from_state(state: DocumentState, context: ClientContext) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            state: RefCell::new(state),
            context,
        })
    }

    fn with_context(&self, context: ClientContext) -> Rc<Self> {
        let state = self.state.borrow();
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            state: RefCell::new(state.rebound(this)),
            context,
        })
    }

    /// Same data, different fetcher.
    pub fn with_client(&self, fetcher: Rc<dyn Fetcher>) -> Rc<Self> {
        self.with_context(self.context.clone().with_fetcher(fetcher))
    }

    /// Same data, different request factory.
    pub fn with_request_factory(&self, factory: Rc<dyn RequestFactory>) -> Rc<Self> {
        self.with_context(self.context.clone().with_request_factory(factory))
    }

    /// Same data, different default headers.
    pub fn with_default_headers(&self, headers: http::HeaderMap) -> Rc<Self> {
        self.with_context(self.context.clone().with_default_headers(headers))
    }

    /// Same data, different content-type policy for followed links.
    pub fn with_content_type(&self, policy: ContentTypePolicy) -> Rc<Self> {
        self.with_context(self.context.clone().with_content_type(policy))
    }

    /// Collaborators used when following links from this document.
    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    /// Snapshot of the properties.
    pub fn properties(&self) -> Map<String, Value> {
        self.state.borrow().properties.clone()
    }

    /// A single property by name. A property holding `null` is returned as
    /// `Some(Value::Null)`.
    pub fn property(&self, name: &str) -> Option<Value> {
        self.state.borrow().properties.get(name).cloned()
    }

    /// Link relation names, sorted.
    pub fn link_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.borrow().links.keys().cloned().collect();
        names.sort();
        names
    }

    /// Embedded relation names, sorted. Includes relations fetched through
    /// [`HalDocument::get`].
    pub fn embedded_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.borrow().embedded.keys().cloned().collect();
        names.sort();
        names
    }

    /// Map the properties onto a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> HalResult<T> {
        serde_json::from_value(Value::Object(self.properties()))
            .map_err(|e| HalError::InvalidDocument(e.to_string()))
    }

    /// Whether `name` is a property, a link or an embedded relation.
    ///
    /// All `has*` checks treat a key holding `null` as absent.
    pub fn has(&self, name: &str) -> bool {
        self.has_property(name) || self.has_link(name) || self.has_embedded(name)
    }

    /// Whether a non-null property `name` exists.
    pub fn has_property(&self, name: &str) -> bool {
        self.state
            .borrow()
            .properties
            .get(name)
            .is_some_and(|value| !value.is_null())
    }

    /// Whether a non-null link relation `name` exists.
    pub fn has_link(&self, name: &str) -> bool {
        self.state.borrow().links.get(name).is_some_and(is_set)
    }

    /// Whether a non-null embedded relation `name` exists, including one
    /// already fetched through [`HalDocument::get`].
    pub fn has_embedded(&self, name: &str) -> bool {
        self.state.borrow().embedded.get(name).is_some_and(is_set)
    }

    /// The link for relation `name`, materialised on first access.
    pub fn link(&self, name: &str) -> HalResult<Option<Rc<Link>>> {
        let mut state = self.state.borrow_mut();
        let Some(slot) = state.links.get_mut(name) else {
            return Ok(None);
        };

        let link = match slot {
            Slot::Materialized(link) => return Ok(Some(link.clone())),
            Slot::Raw(raw) => Rc::new(Link::from_value(name, raw, self.this.clone())?),
        };
        tracing::trace!("Materialized link `{name}`");
        *slot = Slot::Materialized(link.clone());
        Ok(Some(link))
    }

    pub fn curie(&self, name: &str) -> Option<Rc<Curie>> {
        self.state.borrow().curies.get(name).cloned()
    }

    /// Documentation URL of a CURIE-qualified link, if its prefix is defined
    /// here.
    pub fn curie_href(&self, link: &Link) -> Option<String> {
        let curie = self.curie(link.nc_name()?)?;
        Some(curie.docs_for(link.reference()?))
    }

    /// Resolve `name` to a property, an embedded value, or a linked resource.
    ///
    /// Returns `Ok(None)` when nothing of that name exists. A linked
    /// resource is fetched once and then served from the embedded slot.
    pub async fn get(&self, name: &str) -> HalResult<Option<Resolved>> {
        if let Some(value) = self.property(name) {
            return Ok(Some(Resolved::Property(value)));
        }

        let embedded = self.state.borrow().embedded.contains_key(name);
        if !embedded {
            let Some(link) = self.link(name)? else {
                return Ok(None);
            };
            let resource = self.get_resource(&link, &Variables::new()).await?;
            self.state
                .borrow_mut()
                .embedded
                .insert(name.to_string(), Slot::Materialized(Nested::Resource(resource)));
        }

        self.embedded_value(name)
    }

    fn embedded_value(&self, name: &str) -> HalResult<Option<Resolved>> {
        let mut state = self.state.borrow_mut();
        let Some(slot) = state.embedded.get_mut(name) else {
            return Ok(None);
        };

        let nested = match slot {
            Slot::Materialized(nested) => return Ok(Some(nested.clone().into())),
            Slot::Raw(raw) => self.materialize(raw)?,
        };
        tracing::trace!("Materialized embedded `{name}`");
        *slot = Slot::Materialized(nested.clone());
        Ok(Some(nested.into()))
    }

    fn materialize(&self, raw: &Value) -> HalResult<Nested> {
        Ok(match classify_embedded(raw) {
            EmbeddedShape::Collection => Nested::Collection(Rc::new(ResourceCollection::new(
                collection_elements(raw),
                self.context.clone(),
            ))),
            EmbeddedShape::Single => {
                Nested::Resource(HalDocument::create(raw.clone(), self.context.clone())?)
            }
        })
    }

    /// Fetch the target of `link` and parse it into a new document.
    ///
    /// Anything but a 200 response is rejected.
    pub async fn get_resource(
        &self,
        link: &Link,
        variables: &Variables,
    ) -> HalResult<Rc<HalDocument>> {
        let href = link.prepare_url(variables);
        let response = self.context.get(&href).await?;

        if response.status() != StatusCode::OK {
            return Err(HalError::UnexpectedStatus(response.status().as_u16()));
        }

        entry_point::parse(&response, &self.context)
    }

    /// Reload this document from its `self` link, in place.
    pub async fn refresh(&self) -> HalResult<()> {
        let Some(link) = self.link("self")? else {
            return Err(HalError::MissingSelfReference);
        };

        tracing::debug!("Refreshing document from {}", link.href());
        let fresh = self.get_resource(&link, &Variables::new()).await?;
        let state = fresh.state.take();
        *self.state.borrow_mut() = state;
        Ok(())
    }

    /// Documents are read-only.
    pub fn set(&self, name: &str, _value: Value) -> HalResult<()> {
        Err(HalError::OperationNotAllowed(format!(
            "cannot assign `{name}` on a HAL document"
        )))
    }

    /// Documents are read-only.
    pub fn unset(&self, name: &str) -> HalResult<()> {
        Err(HalError::OperationNotAllowed(format!(
            "cannot remove `{name}` from a HAL document"
        )))
    }
}

fn is_set<T>(slot: &Slot<T>) -> bool {
    !matches!(slot, Slot::Raw(Value::Null))
}

fn section(value: Option<Value>, key: &str) -> HalResult<Map<String, Value>> {
    match value {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        // PHP servers encode an empty map as `[]`
        Some(Value::Array(items)) if items.is_empty() => Ok(Map::new()),
        Some(other) => Err(HalError::InvalidDocument(format!(
            "`{key}` must be an object, got {other}"
        ))),
    }
}
