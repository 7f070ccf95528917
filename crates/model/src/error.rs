use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The request could not be delivered, or the connection broke
    /// before a response was received.
    Transport,
    /// The provider answered with a non-success status.
    Status,
    /// The provider answered, but the payload is not a usable completion.
    InvalidResponse,
    /// The request did not finish in time.
    Timeout,
    /// Any other errors.
    Other,
}

impl ErrorKind {
    /// Returns `true` if a later attempt of the same request may succeed.
    ///
    /// Whether to actually retry is up to the caller.
    #[inline]
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimitExceeded
                | ErrorKind::Transport
                | ErrorKind::Timeout
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::RateLimitExceeded => "rate limit exceeded",
            ErrorKind::Transport => "transport error",
            ErrorKind::Status => "unsuccessful status",
            ErrorKind::InvalidResponse => "invalid response",
            ErrorKind::Timeout => "timed out",
            ErrorKind::Other => "other error",
        };
        f.write_str(s)
    }
}
