//! Conversation engine: transcripts, personas, analyzers and the agent
//! registry that ties them together.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod analyzer;
mod error;
pub mod extract;
mod model_client;
mod persona;
pub mod reducer;
mod registry;
pub mod transcript;

pub use analyzer::{
    AnalysisResult, Analyzer, AnalyzerBuilder, FINAL_SUMMARY_INSTRUCTION,
};
pub use error::{Error, GatewayError};
pub use model_client::{DEFAULT_TIMEOUT, ModelClient};
pub use persona::{HISTORY_PLACEHOLDER, Persona};
pub use reducer::{ReducerConfig, TextReducer};
pub use registry::AgentRegistry;
pub use transcript::{Message, Transcript};
