use intake_model::ModelProvider;

use super::Analyzer;
use crate::model_client::ModelClient;
use crate::persona::Persona;
use crate::reducer::TextReducer;
use crate::transcript::Transcript;

/// [`Analyzer`] builder.
pub struct AnalyzerBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) persona: Persona,
    pub(crate) transcript: Option<Transcript>,
    pub(crate) reducer: TextReducer,
    pub(crate) temperature: Option<f32>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self::with_model_client(ModelClient::new(provider))
    }

    /// Creates a new builder around an existing client.
    #[inline]
    pub fn with_model_client(model_client: ModelClient) -> Self {
        Self {
            model_client,
            persona: Persona::default(),
            transcript: None,
            reducer: TextReducer::default(),
            temperature: None,
        }
    }

    /// Sets the persona. Defaults to a project analyst.
    #[inline]
    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Makes the analyzer append to `transcript` instead of a fresh one.
    #[inline]
    pub fn with_transcript(mut self, transcript: &Transcript) -> Self {
        self.transcript = Some(transcript.share());
        self
    }

    /// Sets the sampling temperature sent with every turn.
    #[inline]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Replaces the default reducer.
    #[inline]
    pub fn with_reducer(mut self, reducer: TextReducer) -> Self {
        self.reducer = reducer;
        self
    }

    /// Builds the analyzer.
    #[inline]
    pub fn build(self) -> Analyzer {
        let AnalyzerBuilder {
            model_client,
            persona,
            transcript,
            reducer,
            temperature,
        } = self;

        Analyzer {
            model_client,
            persona,
            transcript: transcript.unwrap_or_default(),
            reducer,
            temperature,
        }
    }
}
