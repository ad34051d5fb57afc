//! In-memory fetcher used by the unit tests.

use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use http::header::{CONTENT_TYPE, HeaderMap};
use http::{Method, Request, Response};
use rustc_hash::FxHashMap;

use crate::client::{DefaultRequestFactory, Fetcher, RequestFactory};
use crate::error::{HalError, HalResult};

#[derive(Debug, Clone)]
pub(crate) struct SentRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone)]
struct Canned {
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
}

/// Serves canned responses by URL and records every request.
#[derive(Default)]
pub(crate) struct MockFetcher {
    routes: RefCell<FxHashMap<String, Canned>>,
    sent: RefCell<Vec<SentRequest>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, uri: &str, status: u16, content_type: Option<&str>, body: &str) {
        self.routes.borrow_mut().insert(
            uri.to_string(),
            Canned {
                status,
                content_type: content_type.map(str::to_string),
                body: body.as_bytes().to_vec(),
            },
        );
    }

    pub fn respond_hal(&self, uri: &str, body: &str) {
        self.respond(uri, 200, Some("application/hal+json"), body);
    }

    pub fn requests(&self) -> Vec<SentRequest> {
        self.sent.borrow().clone()
    }

    pub fn count(&self, uri: &str) -> usize {
        self.sent.borrow().iter().filter(|r| r.uri == uri).count()
    }
}

#[async_trait(?Send)]
impl Fetcher for MockFetcher {
    async fn send_request(&self, request: Request<()>) -> HalResult<Response<Vec<u8>>> {
        let uri = request.uri().to_string();
        self.sent.borrow_mut().push(SentRequest {
            method: request.method().clone(),
            uri: uri.clone(),
            headers: request.headers().clone(),
        });

        let Some(canned) = self.routes.borrow().get(&uri).cloned() else {
            return Err(HalError::Transport(format!("no route for {uri}")));
        };

        let mut builder = Response::builder().status(canned.status);
        if let Some(content_type) = canned.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        builder
            .body(canned.body)
            .map_err(|e| HalError::Transport(e.to_string()))
    }
}

/// Delegates to [`DefaultRequestFactory`] and counts the requests it built.
#[derive(Default)]
pub(crate) struct RecordingFactory {
    built: Cell<usize>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn built(&self) -> usize {
        self.built.get()
    }
}

impl RequestFactory for RecordingFactory {
    fn create_request(
        &self,
        method: Method,
        uri: &str,
        headers: &HeaderMap,
    ) -> HalResult<Request<()>> {
        self.built.set(self.built.get() + 1);
        DefaultRequestFactory.create_request(method, uri, headers)
    }
}
