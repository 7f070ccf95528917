use intake_model::ModelFinishReason;
use serde::{Deserialize, Serialize};

/// The preset response for one completion request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// The text the model answers with.
    pub content: String,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
    /// The HTTP status reported by failed attempts. Failures without a
    /// status look like transport errors.
    #[serde(default)]
    pub status: Option<u16>,
    /// The finish reason reported with the content. Unset means a normal
    /// stop.
    #[serde(default)]
    pub finish_reason: Option<ModelFinishReason>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` answering with `content`.
    #[inline]
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            failures: None,
            status: None,
            finish_reason: None,
        }
    }

    /// Creates a `PresetResponse` that never succeeds.
    #[inline]
    pub fn always_failing() -> Self {
        Self::with_content("").with_failures(0)
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Reports `reason` as the finish reason of the successful response.
    #[inline]
    pub fn with_finish_reason(mut self, reason: ModelFinishReason) -> Self {
        self.finish_reason = Some(reason);
        self
    }

    /// Makes the failed attempts report an HTTP status.
    #[inline]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}
