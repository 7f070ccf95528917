mod builder;
#[cfg(test)]
mod tests;

use std::borrow::Cow;

use intake_model::{ModelFinishReason, ModelMessage, ModelRequest};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::error::Error;
use crate::extract::{self, ExtractMode};
use crate::model_client::ModelClient;
use crate::persona::Persona;
use crate::reducer::TextReducer;
use crate::transcript::{Message, Transcript};
pub use builder::AnalyzerBuilder;

/// The user message sent in final-summary mode, in place of the caller's
/// text.
pub const FINAL_SUMMARY_INSTRUCTION: &str = "Please provide a comprehensive updated summary incorporating all the information above.";

/// The outcome of one analyzed turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The analysis, or the summary in final-summary mode.
    pub analysis: String,
    /// The follow-up question, empty in final-summary mode.
    pub follow_up_question: String,
    /// A copy of the transcript taken right after this turn.
    pub transcript: Vec<Message>,
    /// `true` if the model stopped at its output limit, in which case the
    /// question may be missing.
    #[serde(default)]
    pub truncated: bool,
}

/// Runs turns of a conversation for one persona.
///
/// Several analyzers may hold the same [`Transcript`]; each turn then sees
/// what the others have appended before it. Turns on one transcript run one
/// at a time, whichever analyzer issues them.
#[derive(Debug)]
pub struct Analyzer {
    model_client: ModelClient,
    persona: Persona,
    transcript: Transcript,
    reducer: TextReducer,
    temperature: Option<f32>,
}

impl Analyzer {
    /// Analyzes `user_text` and asks a follow-up question, or, with
    /// `is_final_summary`, summarizes the conversation so far.
    ///
    /// On success the (possibly reduced) user text and the raw model answer
    /// are appended to the transcript. On failure nothing is appended.
    pub async fn analyze_response(
        &self,
        user_text: &str,
        is_final_summary: bool,
    ) -> Result<AnalysisResult, Error> {
        let mode = ExtractMode::from_final_flag(is_final_summary);
        let span = debug_span!("analyze", role = self.persona.role_label(), ?mode);
        self.run_turn(user_text, mode).instrument(span).await
    }

    async fn run_turn(
        &self,
        user_text: &str,
        mode: ExtractMode,
    ) -> Result<AnalysisResult, Error> {
        let text = match mode {
            ExtractMode::FollowUp => {
                self.reducer.reduce(&self.model_client, user_text).await
            }
            ExtractMode::Summary => Cow::Borrowed(user_text),
        };

        let _turn = self.transcript.begin_turn().await;
        let history = self.transcript.render();
        let (system, request_text) = match mode {
            ExtractMode::FollowUp => {
                (self.persona.analysis_prompt(&history), text.as_ref())
            }
            ExtractMode::Summary => (
                self.persona.summary_prompt(&history),
                FINAL_SUMMARY_INSTRUCTION,
            ),
        };
        let messages = vec![
            ModelMessage::System(system),
            ModelMessage::User(request_text.to_owned()),
        ];

        let req = ModelRequest {
            messages,
            temperature: self.temperature,
        };
        let resp = self.model_client.send_request(req).await?;
        let raw = resp.content;
        trace!("raw model answer: {raw}");

        let truncated = resp.finish_reason == Some(ModelFinishReason::Length);
        if truncated {
            warn!("model answer was cut off at the output limit");
        }

        let extraction = extract::extract(&raw, mode);
        if mode == ExtractMode::FollowUp
            && extraction.follow_up_question.is_empty()
        {
            debug!("model answer carries no follow-up question");
        }

        self.transcript.append_exchange(
            Message::user(text.into_owned()),
            Message::assistant(raw),
        );

        Ok(AnalysisResult {
            analysis: extraction.analysis,
            follow_up_question: extraction.follow_up_question,
            transcript: self.transcript.snapshot(),
            truncated,
        })
    }

    /// Clears the transcript, for every analyzer sharing it.
    #[inline]
    pub fn reset_conversation(&self) {
        debug!("resetting conversation");
        self.transcript.clear();
    }

    /// Returns a copy of the conversation so far.
    #[inline]
    pub fn conversation_history(&self) -> Vec<Message> {
        self.transcript.snapshot()
    }

    /// Returns the transcript this analyzer appends to.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the persona of this analyzer.
    #[inline]
    pub fn persona(&self) -> &Persona {
        &self.persona
    }
}
