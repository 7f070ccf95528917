use serde::{Deserialize, Serialize};

/// A completely received response from the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The generated text.
    pub content: String,
    /// The reason the model stopped generating, if the backend reports it.
    pub finish_reason: Option<ModelFinishReason>,
}

impl ModelResponse {
    /// Creates a response that finished normally.
    #[inline]
    pub fn with_content<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            finish_reason: Some(ModelFinishReason::Stop),
        }
    }
}

/// The reason why a model response has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFinishReason {
    /// The model has finished generating text.
    Stop,
    /// The output was cut off by a token limit.
    Length,
    /// The output was withheld by a content filter.
    ContentFilter,
}

impl ModelFinishReason {
    /// Parses the wire value used by OpenAI-compatible backends.
    ///
    /// Unknown values are treated as a normal stop.
    #[inline]
    pub fn from_wire(value: &str) -> Self {
        match value {
            "length" => ModelFinishReason::Length,
            "content_filter" => ModelFinishReason::ContentFilter,
            _ => ModelFinishReason::Stop,
        }
    }
}
