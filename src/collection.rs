//! Lazily materialised resource collections.
//!
//! A [`ResourceCollection`] is a read-only view over raw elements. Each
//! element becomes a [`HalDocument`] the first time it is reached, whether
//! by iteration or by index, without materialising its neighbours.
//!
//! Two kinds of storage back a collection:
//!
//! | Storage | Count | Indexed access | Memoised |
//! |---------|-------|----------------|----------|
//! | JSON array ([`ResourceCollection::new`]) | yes | yes | always |
//! | foreign iterator ([`ResourceCollection::from_iterator`]) | no | no | only with `update` |
//!
//! Foreign iterators are drained on demand and their raw elements buffered,
//! so iterating twice replays what was already pulled.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::client::ClientContext;
use crate::document::{HalDocument, Slot};
use crate::error::{HalError, HalResult};

type Element = Slot<Rc<HalDocument>>;

struct Storage {
    slots: Vec<Element>,
    pending: Option<Box<dyn Iterator<Item = Value>>>,
    indexed: bool,
    update: bool,
}

/// A read-only, lazily materialising collection of HAL documents.
pub struct ResourceCollection {
    storage: RefCell<Storage>,
    context: ClientContext,
}

impl ResourceCollection {
    /// Collection over raw JSON elements.
    pub fn new(elements: Vec<Value>, context: ClientContext) -> Self {
        Self {
            storage: RefCell::new(Storage {
                slots: elements.into_iter().map(Slot::Raw).collect(),
                pending: None,
                indexed: true,
                update: true,
            }),
            context,
        }
    }

    /// Collection over a caller-supplied iterator of raw elements.
    ///
    /// With `update`, each element is materialised once and the document is
    /// kept. Without it, every access builds a fresh document. Counting and
    /// indexed access are not available.
    pub fn from_iterator(
        elements: impl Iterator<Item = Value> + 'static,
        update: bool,
        context: ClientContext,
    ) -> Self {
        Self {
            storage: RefCell::new(Storage {
                slots: Vec::new(),
                pending: Some(Box::new(elements)),
                indexed: false,
                update,
            }),
            context,
        }
    }

    /// Number of elements.
    pub fn count(&self) -> HalResult<usize> {
        let storage = self.storage.borrow();
        if !storage.indexed {
            return Err(HalError::OperationNotAllowed(
                "count on an iterator-backed collection".into(),
            ));
        }
        Ok(storage.slots.len())
    }

    /// Whether a non-null element exists at `index`.
    pub fn contains(&self, index: usize) -> HalResult<bool> {
        let storage = self.storage.borrow();
        if !storage.indexed {
            return Err(HalError::OperationNotAllowed(
                "indexed lookup on an iterator-backed collection".into(),
            ));
        }
        Ok(storage
            .slots
            .get(index)
            .is_some_and(|slot| !matches!(slot, Slot::Raw(Value::Null))))
    }

    /// Element at `index`, or `None` when out of range or null.
    pub fn get(&self, index: usize) -> HalResult<Option<Rc<HalDocument>>> {
        if !self.storage.borrow().indexed {
            return Err(HalError::OperationNotAllowed(
                "indexed access on an iterator-backed collection".into(),
            ));
        }
        self.at(index).unwrap_or(Ok(None))
    }

    /// Iterate in order. Null elements yield `Ok(None)`.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            collection: self,
            position: 0,
        }
    }

    /// Collections are read-only.
    pub fn set(&self, index: usize, _document: Rc<HalDocument>) -> HalResult<()> {
        Err(HalError::OperationNotAllowed(format!(
            "cannot assign index {index} of a resource collection"
        )))
    }

    /// Collections are read-only.
    pub fn unset(&self, index: usize) -> HalResult<()> {
        Err(HalError::OperationNotAllowed(format!(
            "cannot remove index {index} of a resource collection"
        )))
    }

    /// Materialise the element at `position`, pulling from a foreign
    /// iterator as needed. `None` past the end.
    fn at(&self, position: usize) -> Option<HalResult<Option<Rc<HalDocument>>>> {
        let mut guard = self.storage.borrow_mut();
        let storage = &mut *guard;

        while storage.slots.len() <= position {
            match storage.pending.as_mut().and_then(|it| it.next()) {
                Some(raw) => storage.slots.push(Slot::Raw(raw)),
                None => {
                    storage.pending = None;
                    return None;
                }
            }
        }

        let update = storage.update;
        let slot = &mut storage.slots[position];
        Some(self.materialize(slot, update, position))
    }

    fn materialize(
        &self,
        slot: &mut Element,
        update: bool,
        position: usize,
    ) -> HalResult<Option<Rc<HalDocument>>> {
        let raw = match slot {
            Slot::Materialized(doc) => return Ok(Some(doc.clone())),
            Slot::Raw(Value::Null) => return Ok(None),
            Slot::Raw(raw) => raw,
        };

        let doc = HalDocument::create(raw.clone(), self.context.clone())?;
        if update {
            tracing::trace!("Materialized collection element {position}");
            *slot = Slot::Materialized(doc.clone());
        }
        Ok(Some(doc))
    }
}

impl fmt::Debug for ResourceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = self.storage.borrow();
        f.debug_struct("ResourceCollection")
            .field("buffered", &storage.slots.len())
            .field("indexed", &storage.indexed)
            .field("update", &storage.update)
            .finish_non_exhaustive()
    }
}

/// Iterator over a [`ResourceCollection`].
pub struct Iter<'a> {
    collection: &'a ResourceCollection,
    position: usize,
}

impl Iterator for Iter<'_> {
    type Item = HalResult<Option<Rc<HalDocument>>>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.collection.at(self.position)?;
        self.position += 1;
        Some(item)
    }
}

impl<'a> IntoIterator for &'a ResourceCollection {
    type Item = HalResult<Option<Rc<HalDocument>>>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
