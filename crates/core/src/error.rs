use std::error::Error as StdError;
use std::time::Duration;

use intake_model::{ErrorKind, ModelProviderError};
use thiserror::Error;

/// A failed call through the [`ModelClient`](crate::ModelClient).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The model provider reported a failure.
    #[error("completion request failed: {source}")]
    Provider {
        /// What went wrong, as classified by the provider.
        kind: ErrorKind,
        /// The HTTP status, if the backend answered at all.
        status: Option<u16>,
        /// The raw failure body, kept for diagnostics.
        body: Option<String>,
        /// The provider's own error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The provider did not answer within the configured timeout.
    #[error("completion request timed out after {0:?}")]
    Timeout(Duration),
}

impl GatewayError {
    pub(crate) fn from_provider<E: ModelProviderError>(err: E) -> Self {
        GatewayError::Provider {
            kind: err.kind(),
            status: err.status(),
            body: err.body().map(ToOwned::to_owned),
            source: Box::new(err),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Provider { kind, .. } => *kind,
            GatewayError::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// Returns the HTTP status reported by the backend, if any.
    #[inline]
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Provider { status, .. } => *status,
            GatewayError::Timeout(_) => None,
        }
    }

    /// Returns the failure body reported by the backend, if any.
    #[inline]
    pub fn body(&self) -> Option<&str> {
        match self {
            GatewayError::Provider { body, .. } => body.as_deref(),
            GatewayError::Timeout(_) => None,
        }
    }

    /// Returns `true` if the same request may succeed later.
    ///
    /// Server-side (5xx) statuses count as transient.
    #[inline]
    pub fn is_transient(&self) -> bool {
        self.kind().is_transient() || self.status().is_some_and(|s| s >= 500)
    }
}

/// Errors returned by analyzers and the agent registry.
#[derive(Debug, Error)]
pub enum Error {
    /// The completion call failed. The transcript is left untouched.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// No agent is registered under the requested name.
    #[error("agent `{name}` not found, available agents: [{}]", .known.join(", "))]
    UnknownAgent {
        /// The requested name.
        name: String,
        /// Every registered name, in registration order.
        known: Vec<String>,
    },
    /// An agent with the same name is already registered.
    #[error("agent `{0}` is already registered")]
    DuplicateAgent(String),
    /// The analyzer was built on a different transcript than the registry's.
    #[error("agent `{0}` does not share the registry transcript")]
    ForeignTranscript(String),
    /// The text splitter settings are unusable.
    #[error("invalid splitter settings: {0}")]
    InvalidSplitter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_agent_lists_names() {
        let err = Error::UnknownAgent {
            name: "nonexistent".to_owned(),
            known: vec!["project_analyst".to_owned(), "technical_expert".to_owned()],
        };
        assert_eq!(
            err.to_string(),
            "agent `nonexistent` not found, available agents: \
             [project_analyst, technical_expert]"
        );
    }

    #[test]
    fn test_timeout_kind() {
        let err = GatewayError::Timeout(Duration::from_secs(60));
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.is_transient());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "completion request timed out after 60s");
    }
}
