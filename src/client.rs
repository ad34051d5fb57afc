//! Transport collaborators and client configuration.
//!
//! The client never talks to the network itself. Every document carries a
//! [`ClientContext`] holding the collaborators it needs to follow links:
//!
//! ```text
//!   RequestFactory ──→ Fetcher::send_request() ──→ entry_point::parse()
//!   (build GET)         (async, caller's I/O)       (content type + JSON)
//! ```
//!
//! ## Design principles
//!
//! - **Explicit**: there is no process-wide default fetcher. Whoever creates
//!   the first document decides the transport.
//! - **Single-threaded**: document graphs are `Rc`-based and memoise through
//!   `RefCell`, so the seam is `#[async_trait(?Send)]`.
//! - **GET only**: the client only ever issues `GET` requests.

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, Request, Response};
use serde::{Deserialize, Serialize};

use crate::entry_point::ContentTypePolicy;
use crate::error::{HalError, HalResult};

/// Sends HTTP requests on behalf of the client.
///
/// # Contract
///
/// - Implementations perform exactly one round trip per call.
/// - Failures to obtain any response are reported as
///   [`HalError::Transport`]. Non-200 responses are returned as-is; the
///   client decides what to do with them.
/// - Timeouts, retries and connection reuse are the implementor's business.
#[async_trait(?Send)]
pub trait Fetcher {
    /// Send `request` and return the full response.
    async fn send_request(&self, request: Request<()>) -> HalResult<Response<Vec<u8>>>;
}

/// Builds the requests the client sends.
pub trait RequestFactory {
    fn create_request(
        &self,
        method: Method,
        uri: &str,
        headers: &HeaderMap,
    ) -> HalResult<Request<()>>;
}

/// [`RequestFactory`] backed by [`http::Request::builder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRequestFactory;

impl RequestFactory for DefaultRequestFactory {
    fn create_request(
        &self,
        method: Method,
        uri: &str,
        headers: &HeaderMap,
    ) -> HalResult<Request<()>> {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .map_err(|e| HalError::InvalidRequest(format!("{uri}: {e}")))?;
        request.headers_mut().extend(headers.clone());
        Ok(request)
    }
}

/// Serializable client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Headers sent with every request, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_headers: Vec<(String, String)>,
    /// Which `Content-Type` values are accepted as HAL.
    #[serde(default)]
    pub content_type: ContentTypePolicy,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a default header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Select the content-type policy.
    pub fn with_content_type(mut self, policy: ContentTypePolicy) -> Self {
        self.content_type = policy;
        self
    }

    /// Validate the configured headers into a [`HeaderMap`].
    pub fn header_map(&self) -> HalResult<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(self.default_headers.len());
        for (name, value) in &self.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HalError::Configuration(format!("header name `{name}`: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| HalError::Configuration(format!("header `{name}` value: {e}")))?;
            headers.append(name, value);
        }
        Ok(headers)
    }
}

/// The collaborators and settings a document graph shares.
///
/// Cloning is cheap apart from the header map.
#[derive(Clone)]
pub struct ClientContext {
    fetcher: Rc<dyn Fetcher>,
    request_factory: Rc<dyn RequestFactory>,
    default_headers: HeaderMap,
    content_type: ContentTypePolicy,
}

impl ClientContext {
    /// Context with no default headers and the strict content-type policy.
    pub fn new(fetcher: Rc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            request_factory: Rc::new(DefaultRequestFactory),
            default_headers: HeaderMap::new(),
            content_type: ContentTypePolicy::default(),
        }
    }

    /// Context built from a [`ClientConfig`].
    pub fn from_config(fetcher: Rc<dyn Fetcher>, config: &ClientConfig) -> HalResult<Self> {
        Ok(Self {
            default_headers: config.header_map()?,
            content_type: config.content_type,
            ..Self::new(fetcher)
        })
    }

    pub fn with_fetcher(mut self, fetcher: Rc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_request_factory(mut self, factory: Rc<dyn RequestFactory>) -> Self {
        self.request_factory = factory;
        self
    }

    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn with_content_type(mut self, policy: ContentTypePolicy) -> Self {
        self.content_type = policy;
        self
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    pub fn content_type(&self) -> ContentTypePolicy {
        self.content_type
    }

    /// Issue a `GET` for `uri` with the default headers.
    pub async fn get(&self, uri: &str) -> HalResult<Response<Vec<u8>>> {
        let request =
            self.request_factory
                .create_request(Method::GET, uri, &self.default_headers)?;
        tracing::debug!("GET {uri}");
        self.fetcher.send_request(request).await
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("default_headers", &self.default_headers)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockFetcher;

    #[test]
    fn test_default_request_factory() {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/hal+json"));

        let request = DefaultRequestFactory
            .create_request(Method::GET, "http://localhost/orders", &headers)
            .unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.uri(), "http://localhost/orders");
        assert_eq!(request.headers()["accept"], "application/hal+json");
    }

    #[test]
    fn test_request_factory_rejects_bad_uri() {
        let err = DefaultRequestFactory
            .create_request(Method::GET, "http://localhost/two words", &HeaderMap::new())
            .unwrap_err();
        assert!(matches!(
            err,
            HalError::InvalidRequest(ref msg) if msg.starts_with("http://localhost/two words")
        ));

        assert!(matches!(
            DefaultRequestFactory.create_request(Method::GET, "", &HeaderMap::new()),
            Err(HalError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_config_header_map() {
        let config = ClientConfig::new()
            .with_header("Accept", "application/hal+json")
            .with_header("X-Trace", "a")
            .with_header("X-Trace", "b");

        let headers = config.header_map().unwrap();
        assert_eq!(headers["accept"], "application/hal+json");
        assert_eq!(headers.get_all("x-trace").iter().count(), 2);
    }

    #[test]
    fn test_config_rejects_invalid_header() {
        let config = ClientConfig::new().with_header("bad header", "x");
        assert!(matches!(
            config.header_map(),
            Err(HalError::Configuration(_))
        ));
    }

    #[test]
    fn test_config_serde() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"default_headers": [["Accept", "application/hal+json"]], "content_type": "any_json"}"#,
        )
        .unwrap();
        assert_eq!(config.content_type, ContentTypePolicy::AnyJson);
        assert_eq!(config.default_headers.len(), 1);

        let empty: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ClientConfig::default());
    }

    #[tokio::test]
    async fn test_context_get_sends_default_headers() {
        let fetcher = Rc::new(MockFetcher::new());
        fetcher.respond_hal("http://localhost/", "{}");

        let config = ClientConfig::new().with_header("Authorization", "Bearer t");
        let context = ClientContext::from_config(fetcher.clone(), &config).unwrap();
        let response = context.get("http://localhost/").await.unwrap();

        assert_eq!(response.status(), 200);
        let sent = fetcher.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::GET);
        assert_eq!(sent[0].headers["authorization"], "Bearer t");
    }
}
