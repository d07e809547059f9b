//! Error types for the Data Warehouse client.
//!
//! # Design
//! Every failure lands in one of five kinds. Operations add a line of
//! context (the operation name) by wrapping the error in `Context`, which
//! keeps the underlying kind reachable through [`ApiError::root`]. Non-200
//! responses are not split by status: 404 and 500 both become
//! `UnexpectedStatus`, with the raw body kept for diagnostics.

use thiserror::Error;

/// Boxed cause of a transport-level failure.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `Client` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The base URL or API key was empty or missing. No client is produced.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// DNS, connect or I/O failure while performing the request.
    #[error("error sending request: {0}")]
    TransportError(#[source] TransportError),

    /// The server answered with a status other than 200.
    #[error("unexpected status code: {status}, body: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The request payload could not be encoded to JSON.
    #[error("error marshalling data to JSON: {0}")]
    SerializationError(#[source] serde_json::Error),

    /// The response body did not match the expected envelope.
    #[error("error unmarshalling response data: {0}")]
    DeserializationError(#[source] serde_json::Error),

    /// An underlying error annotated with the operation that produced it.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// Wrap `self` with a line of operation context.
    pub fn context(self, context: impl Into<String>) -> Self {
        ApiError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers removed.
    pub fn root(&self) -> &ApiError {
        let mut current = self;
        while let ApiError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Status code of an `UnexpectedStatus` error, looking through context.
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            ApiError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_peels_every_context_layer() {
        let err = ApiError::UnexpectedStatus {
            status: 502,
            body: "bad gateway".to_string(),
        }
        .context("inner")
        .context("outer");

        assert!(matches!(
            err.root(),
            ApiError::UnexpectedStatus { status: 502, .. }
        ));
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn context_is_prepended_to_display() {
        let err = ApiError::UnexpectedStatus {
            status: 404,
            body: r#"{"error":{"message":"not found","code":"NOT_FOUND"}}"#.to_string(),
        }
        .context("error retrieving article");

        assert_eq!(
            err.to_string(),
            r#"error retrieving article: unexpected status code: 404, body: {"error":{"message":"not found","code":"NOT_FOUND"}}"#
        );
    }

    #[test]
    fn source_chains_through_context() {
        use std::error::Error;

        let err = ApiError::InvalidConfiguration("url is empty".to_string()).context("setup");
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "invalid configuration: url is empty");
    }

    #[test]
    fn status_is_none_for_other_kinds() {
        let err = ApiError::InvalidConfiguration("apiKey is empty".to_string());
        assert_eq!(err.status(), None);
    }
}
