//! HAL client error types.
//!
//! Errors are grouped by where they surface:
//!
//! | Category | Variants | Caller action |
//! |----------|----------|---------------|
//! | **Response** | `InvalidContentType`, `InvalidJson`, `InvalidDocument` | Server sent something that is not a HAL document |
//! | **Transport** | `UnexpectedStatus`, `Transport`, `InvalidRequest` | Inspect the fetcher or the URL |
//! | **Navigation** | `MissingSelfReference`, `DetachedLink`, `InvalidLink` | Fix the traversal |
//! | **Precondition** | `MissingVariables`, `EmptyHref`, `CurieNotDereferenceable`, `OperationNotAllowed` | Fix the call |
//! | **Config** | `Configuration` | Fix configuration |
//!
//! The client never retries. Retry policy, if any, belongs to the [`Fetcher`].
//!
//! [`Fetcher`]: crate::client::Fetcher

use thiserror::Error;

/// Errors that can occur while fetching or navigating HAL documents.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    // ── Response errors ──────────────────────────────────────────────
    /// The response declared a media type the active policy rejects.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// The body is not JSON, or decodes to `null`.
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),

    /// The JSON value cannot be read as a HAL document.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    // ── Transport contract ───────────────────────────────────────────
    /// The fetcher answered with a status other than 200.
    #[error("Fetcher did not return a 200 status code, given: {0}")]
    UnexpectedStatus(u16),

    /// The fetcher failed to produce a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A request could not be built (usually an unparsable URI).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ── Navigation errors ────────────────────────────────────────────
    /// `refresh()` was called on a document without a `self` link.
    #[error("Invalid resource, no `self` reference available")]
    MissingSelfReference,

    /// The document a link was materialised from has been dropped.
    #[error("Link `{0}` outlived its owning document")]
    DetachedLink(String),

    /// A `_links` entry is not a link object.
    #[error("Invalid link `{0}`: {1}")]
    InvalidLink(String, String),

    // ── Precondition violations ──────────────────────────────────────
    /// A templated link was dereferenced without variables.
    #[error("Link `{0}` is templated and requires variables")]
    MissingVariables(String),

    /// A link with an empty href was dereferenced.
    #[error("Link `{0}` has an empty href")]
    EmptyHref(String),

    /// CURIEs only describe documentation URLs and cannot be fetched.
    #[error("CURIE `{0}` cannot be dereferenced without a relation")]
    CurieNotDereferenceable(String),

    /// Mutation, or a capability the underlying storage lacks.
    #[error("Operation not allowed: {0}")]
    OperationNotAllowed(String),

    // ── Config errors ────────────────────────────────────────────────
    /// Configuration error (fix configuration).
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl HalError {
    /// Returns `true` if the error comes from calling an operation whose
    /// preconditions were not met, rather than from the server's answer.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingVariables(_)
                | Self::EmptyHref(_)
                | Self::CurieNotDereferenceable(_)
                | Self::OperationNotAllowed(_)
                | Self::MissingSelfReference
        )
    }
}

/// Result type for HAL client operations.
pub type HalResult<T> = Result<T, HalError>;
