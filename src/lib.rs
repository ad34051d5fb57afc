//! HAL Client — lazy navigation of HAL+JSON hypermedia APIs
//!
//! This crate turns a HAL (Hypertext Application Language) response into a
//! navigable document graph. Links are followed on demand: nothing is
//! fetched until a relation is actually read, and everything read is cached
//! on the document it came from.
//!
//! # Overview
//!
//! - [`EntryPoint`] fetches the API root once and hands out the root
//!   [`HalDocument`]
//! - [`HalDocument::get`] resolves a name to a property, an embedded
//!   resource or collection, or a linked resource (fetched and cached)
//! - [`Link`] and [`Curie`] expose hrefs, URI templates and CURIE
//!   documentation URLs
//! - [`ResourceCollection`] materialises collection elements one at a time
//! - [`Fetcher`] is the only I/O seam; the caller supplies the transport
//! - [`HalError`] with categorized error variants
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use hal_client::{ClientContext, EntryPoint};
//!
//! let context = ClientContext::new(Rc::new(MyFetcher::default()));
//! let api = EntryPoint::new("https://api.example.com/", context);
//!
//! if let Some(orders) = api.get("orders").await?.and_then(|r| r.into_collection()) {
//!     for order in orders.iter() {
//!         if let Some(order) = order? {
//!             println!("{:?}", order.property("total"));
//!         }
//!     }
//! }
//! ```
//!
//! # Navigation
//!
//! ```text
//!   Fetcher ──→ parse() ──→ HalDocument ──get(rel)──→ Link ──→ Fetcher ──→ ...
//!                              │                                  │
//!                              └──────── embedded[rel] ←──────────┘
//!                                         (memoised)
//! ```
//!
//! Document graphs are single-threaded (`Rc`-based). Confine one graph to
//! one task; run independent graphs concurrently if needed.

pub mod client;
pub mod collection;
pub mod curie;
pub mod document;
pub mod entry_point;
pub mod error;
pub mod link;
pub mod template;

#[cfg(test)]
mod test_support;

pub use client::{ClientConfig, ClientContext, DefaultRequestFactory, Fetcher, RequestFactory};
pub use collection::ResourceCollection;
pub use curie::Curie;
pub use document::{EmbeddedShape, HalDocument, Resolved, classify_embedded};
pub use entry_point::{ContentTypePolicy, EntryPoint, parse};
pub use error::{HalError, HalResult};
pub use link::Link;
pub use template::{Templated, Variables, expand};
