//! Condenses over-long input before it reaches the model.

mod splitter;

use std::borrow::Cow;

use intake_model::ModelMessage;
use tracing::Level;

use crate::error::Error;
use crate::model_client::ModelClient;
pub use splitter::TextSplitter;

/// Settings for [`TextReducer`]. All lengths are in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReducerConfig {
    /// Texts longer than this are summarized.
    pub threshold: usize,
    /// Maximum chunk length.
    pub chunk_size: usize,
    /// Maximum overlap between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            threshold: 2000,
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Replaces long input with a model-written summary.
///
/// Text up to the threshold passes through untouched. Longer text is split
/// into chunks (so that steps needing bounded units have them) and then
/// summarized as a whole with one extra completion. A failed or empty
/// summary falls back to the original text.
#[derive(Clone, Debug)]
pub struct TextReducer {
    threshold: usize,
    splitter: TextSplitter,
}

impl TextReducer {
    /// Creates a reducer, validating the chunk settings.
    pub fn new(config: ReducerConfig) -> Result<Self, Error> {
        Ok(Self {
            threshold: config.threshold,
            splitter: TextSplitter::new(config.chunk_size, config.chunk_overlap)?,
        })
    }

    /// Returns the length above which text is summarized.
    #[inline]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Returns `true` if `text` is long enough to be summarized.
    #[inline]
    pub fn needs_reduction(&self, text: &str) -> bool {
        text.chars().count() > self.threshold
    }

    /// Splits `text` into overlapping, ordered chunks.
    #[inline]
    pub fn split(&self, text: &str) -> Vec<String> {
        self.splitter.split(text)
    }

    /// Returns `text` itself, or a summary of it if it is too long.
    pub async fn reduce<'a>(
        &self,
        model_client: &ModelClient,
        text: &'a str,
    ) -> Cow<'a, str> {
        if !self.needs_reduction(text) {
            return Cow::Borrowed(text);
        }

        if enabled!(Level::DEBUG) {
            debug!(
                chars = text.chars().count(),
                chunks = self.split(text).len(),
                "input exceeds {} characters, summarizing",
                self.threshold
            );
        }

        let messages = vec![ModelMessage::User(format!(
            "Please summarize this text: {text}"
        ))];
        match model_client.complete(messages, None).await {
            Ok(summary) if !summary.trim().is_empty() => Cow::Owned(summary),
            Ok(_) => {
                warn!("summary came back empty, keeping the original text");
                Cow::Borrowed(text)
            }
            Err(err) => {
                warn!("summarization failed, keeping the original text: {err}");
                Cow::Borrowed(text)
            }
        }
    }
}

impl Default for TextReducer {
    fn default() -> Self {
        Self {
            threshold: ReducerConfig::default().threshold,
            splitter: TextSplitter::default(),
        }
    }
}
