//! Response parsing and the API entry point.
//!
//! [`parse`] turns a transport response into a [`HalDocument`]:
//!
//! 1. If a `Content-Type` header is present, it must satisfy the context's
//!    [`ContentTypePolicy`]. A missing header is accepted.
//! 2. The body must decode to non-null JSON.
//! 3. The value is split into properties, links and embedded resources.
//!
//! [`EntryPoint`] fetches a root URL once and serves navigation from the
//! cached document afterwards.

use std::rc::Rc;
use std::sync::LazyLock;

use http::Response;
use http::header::CONTENT_TYPE;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::client::ClientContext;
use crate::document::{HalDocument, Resolved};
use crate::error::{HalError, HalResult};

static HAL_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^application/hal\+json(;.*)?$").expect("HAL media type pattern")
});

static ANY_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^application/(\w+\+)?json(;.*)?$").expect("JSON media type pattern")
});

/// Which `Content-Type` values are read as HAL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentTypePolicy {
    /// `application/hal+json`, optionally followed by `;parameters`.
    #[default]
    Strict,
    /// `application/json` or any `application/<type>+json`, optionally
    /// followed by `;parameters`.
    AnyJson,
}

impl ContentTypePolicy {
    /// Whether `media_type` (a raw header value) is accepted.
    pub fn accepts(&self, media_type: &str) -> bool {
        let media_type = media_type.trim();
        match self {
            ContentTypePolicy::Strict => HAL_JSON.is_match(media_type),
            ContentTypePolicy::AnyJson => ANY_JSON.is_match(media_type),
        }
    }
}

/// Validate and decode a response into a document.
pub fn parse(response: &Response<Vec<u8>>, context: &ClientContext) -> HalResult<Rc<HalDocument>> {
    if let Some(header) = response.headers().get(CONTENT_TYPE) {
        let media_type = header
            .to_str()
            .map_err(|_| HalError::InvalidContentType(format!("{header:?}")))?;
        if !context.content_type().accepts(media_type) {
            return Err(HalError::InvalidContentType(media_type.to_string()));
        }
    }

    let data: Value = serde_json::from_slice(response.body())
        .map_err(|e| HalError::InvalidJson(e.to_string()))?;
    if data.is_null() {
        return Err(HalError::InvalidJson("document is null".into()));
    }

    HalDocument::create(data, context.clone())
}

/// The root of a HAL API.
///
/// The first call to [`EntryPoint::resource`] or [`EntryPoint::get`]
/// performs the only request this entry point ever sends. The response
/// status is not checked; the body is parsed as-is.
#[derive(Debug)]
pub struct EntryPoint {
    url: String,
    context: ClientContext,
    resource: OnceCell<Rc<HalDocument>>,
}

impl EntryPoint {
    pub fn new(url: impl Into<String>, context: ClientContext) -> Self {
        Self {
            url: url.into(),
            context,
            resource: OnceCell::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The root document, fetched on first use.
    pub async fn resource(&self) -> HalResult<Rc<HalDocument>> {
        self.resource
            .get_or_try_init(|| self.initialize())
            .await
            .cloned()
    }

    /// Resolve `name` on the root document.
    pub async fn get(&self, name: &str) -> HalResult<Option<Resolved>> {
        self.resource().await?.get(name).await
    }

    async fn initialize(&self) -> HalResult<Rc<HalDocument>> {
        tracing::debug!("Initializing entry point {}", self.url);
        let response = self.context.get(&self.url).await?;
        parse(&response, &self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Templated;
    use crate::test_support::MockFetcher;

    const ENTRY_POINT: &str = r#"{
        "version": "1.0",
        "_links": {
            "self": {"href": "http://propilex.herokuapp.com"},
            "curies": [{"name": "p", "href": "http://propilex.herokuapp.com/rels/{rel}", "templated": true}],
            "p:documents": {"href": "http://propilex.herokuapp.com/documents"}
        }
    }"#;

    const DOCUMENTS: &str = r#"{
        "page": 1,
        "limit": 10,
        "pages": 1,
        "_links": {"self": {"href": "http://propilex.herokuapp.com/documents?page=1"}},
        "_embedded": {
            "documents": [
                {"id": 1, "title": "test", "body": "a"},
                {"id": 2, "title": "teste", "body": "b"},
                {"id": 3, "title": "hello", "body": "c"},
                {"id": 4, "title": "world", "body": "d"}
            ]
        }
    }"#;

    fn response(content_type: Option<&str>, body: &str) -> Response<Vec<u8>> {
        let mut builder = Response::builder().status(200);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        builder.body(body.as_bytes().to_vec()).unwrap()
    }

    fn context() -> ClientContext {
        ClientContext::new(Rc::new(MockFetcher::new()))
    }

    #[test]
    fn test_strict_policy() {
        let strict = ContentTypePolicy::Strict;
        assert!(strict.accepts("application/hal+json"));
        assert!(strict.accepts("application/hal+json;version=42"));
        assert!(strict.accepts("application/hal+json; charset=utf-8"));
        assert!(!strict.accepts("application/json"));
        assert!(!strict.accepts("application/hal+jsonx"));
        assert!(!strict.accepts("text/html"));
    }

    #[test]
    fn test_any_json_policy() {
        let any = ContentTypePolicy::AnyJson;
        assert!(any.accepts("application/json"));
        assert!(any.accepts("application/anything+json"));
        assert!(any.accepts("application/foobar+json;version=42"));
        assert!(any.accepts("application/baz+json;basically!anything#can_go here"));
        assert!(!any.accepts("text/json"));
        assert!(!any.accepts("application/xml"));
    }

    #[test]
    fn test_parse_rejects_content_type() {
        let err = parse(&response(Some("application/json"), "{}"), &context()).unwrap_err();
        assert!(matches!(err, HalError::InvalidContentType(ref t) if t == "application/json"));

        let loose = context().with_content_type(ContentTypePolicy::AnyJson);
        assert!(parse(&response(Some("application/json"), "{}"), &loose).is_ok());
    }

    #[test]
    fn test_parse_version_parameter() {
        let doc = parse(
            &response(Some("application/hal+json;version=42"), "[]"),
            &context(),
        )
        .unwrap();
        assert!(doc.properties().is_empty());
    }

    #[test]
    fn test_parse_without_content_type() {
        let doc = parse(&response(None, r#"{"a": 1}"#), &context()).unwrap();
        assert!(doc.has_property("a"));
    }

    #[test]
    fn test_parse_invalid_json() {
        let hal = Some("application/hal+json");
        assert!(matches!(
            parse(&response(hal, "{not json"), &context()),
            Err(HalError::InvalidJson(_))
        ));
        assert!(matches!(
            parse(&response(hal, "null"), &context()),
            Err(HalError::InvalidJson(_))
        ));
        assert!(matches!(
            parse(&response(hal, ""), &context()),
            Err(HalError::InvalidJson(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_content_type_from_entry_point() {
        let fetcher = Rc::new(MockFetcher::new());
        fetcher.respond("/", 200, Some("application/json"), "{}");

        let entry = EntryPoint::new("/", ClientContext::new(fetcher.clone()));
        assert!(matches!(
            entry.resource().await,
            Err(HalError::InvalidContentType(_))
        ));
        assert_eq!(fetcher.count("/"), 1);
    }

    #[tokio::test]
    async fn test_navigation() {
        let fetcher = Rc::new(MockFetcher::new());
        fetcher.respond_hal("/", ENTRY_POINT);
        fetcher.respond_hal("http://propilex.herokuapp.com/documents", DOCUMENTS);

        let entry = EntryPoint::new("/", ClientContext::new(fetcher.clone()));
        let root = entry.resource().await.unwrap();

        assert_eq!(root.properties().len(), 1);
        assert!(root.embedded_names().is_empty());

        let link = root.link("p:documents").unwrap().unwrap();
        assert_eq!(link.href(), "http://propilex.herokuapp.com/documents");
        assert_eq!(
            link.docs().as_deref(),
            Some("http://propilex.herokuapp.com/rels/documents")
        );
        assert!(entry.get("fake").await.unwrap().is_none());

        let page = entry
            .get("p:documents")
            .await
            .unwrap()
            .unwrap()
            .into_resource()
            .unwrap();
        assert_eq!(page.property("page"), Some(serde_json::json!(1)));
        assert_eq!(page.property("limit"), Some(serde_json::json!(10)));
        assert_eq!(page.property("pages"), Some(serde_json::json!(1)));

        let collection = page
            .get("documents")
            .await
            .unwrap()
            .unwrap()
            .into_collection()
            .unwrap();
        assert_eq!(collection.count().unwrap(), 4);

        for child in collection.iter() {
            let child = child.unwrap().unwrap();
            assert!(child.get("title").await.unwrap().is_some());
            assert!(child.get("body").await.unwrap().is_some());
            assert!(child.get("id").await.unwrap().is_some());
            assert!(child.get("fake").await.unwrap().is_none());
        }

        let second = collection.get(1).unwrap().unwrap();
        assert_eq!(second.property("title"), Some(serde_json::json!("teste")));

        // root fetched once, documents fetched once
        assert_eq!(fetcher.count("/"), 1);
        assert_eq!(fetcher.count("http://propilex.herokuapp.com/documents"), 1);
    }

    #[tokio::test]
    async fn test_entry_point_sends_configured_headers() {
        let fetcher = Rc::new(MockFetcher::new());
        fetcher.respond_hal("/", "{}");
        let config = crate::client::ClientConfig::new().with_header("Accept", "application/hal+json");
        let context = ClientContext::from_config(fetcher.clone(), &config).unwrap();

        let entry = EntryPoint::new("/", context);
        entry.resource().await.unwrap();
        entry.resource().await.unwrap();

        let sent = fetcher.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].headers["accept"], "application/hal+json");
    }
}
