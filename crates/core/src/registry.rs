use tracing::Instrument;

use crate::analyzer::{AnalysisResult, Analyzer, AnalyzerBuilder};
use crate::error::Error;
use crate::model_client::ModelClient;
use crate::persona::Persona;
use crate::transcript::{Message, Transcript};

/// A set of named analyzers answering on one shared transcript.
///
/// Names are unique and kept in registration order, which is also the
/// order [`analyze_with_all`](Self::analyze_with_all) runs them in.
#[derive(Debug)]
pub struct AgentRegistry {
    model_client: ModelClient,
    transcript: Transcript,
    temperature: Option<f32>,
    agents: Vec<(String, Analyzer)>,
}

impl AgentRegistry {
    /// Creates an empty registry whose agents all call `model_client`.
    pub fn new(model_client: ModelClient) -> Self {
        Self {
            model_client,
            transcript: Transcript::new(),
            temperature: None,
            agents: Vec::new(),
        }
    }

    /// Sets the temperature for agents registered from now on.
    #[inline]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Returns a builder preset with the registry's client, transcript and
    /// temperature, for agents that need more than a persona.
    pub fn analyzer_builder(&self) -> AnalyzerBuilder {
        let builder =
            AnalyzerBuilder::with_model_client(self.model_client.clone())
                .with_transcript(&self.transcript);
        match self.temperature {
            Some(temperature) => builder.with_temperature(temperature),
            None => builder,
        }
    }

    /// Registers an agent playing `persona` under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        persona: Persona,
    ) -> Result<&Analyzer, Error> {
        let analyzer = self.analyzer_builder().with_persona(persona).build();
        self.add_analyzer(name, analyzer)
    }

    /// Registers a prebuilt analyzer under `name`.
    ///
    /// The analyzer must append to this registry's transcript, see
    /// [`analyzer_builder`](Self::analyzer_builder).
    pub fn add_analyzer(
        &mut self,
        name: impl Into<String>,
        analyzer: Analyzer,
    ) -> Result<&Analyzer, Error> {
        let name = name.into();
        if self.index_of(&name).is_some() {
            return Err(Error::DuplicateAgent(name));
        }
        if !analyzer.transcript().same_as(&self.transcript) {
            return Err(Error::ForeignTranscript(name));
        }

        debug!(
            "registered agent `{name}` as {}",
            analyzer.persona().role_label()
        );
        self.agents.push((name, analyzer));
        let (_, analyzer) = &self.agents[self.agents.len() - 1];
        Ok(analyzer)
    }

    /// Returns the agent registered under `name`.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Analyzer> {
        self.index_of(name).map(|idx| &self.agents[idx].1)
    }

    /// Returns the registered names in registration order.
    pub fn agent_names(&self) -> Vec<String> {
        self.agents.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Returns the transcript shared by every agent.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Runs one turn with the agent registered under `name`.
    ///
    /// An unknown name fails without touching the transcript.
    pub async fn analyze_with(
        &self,
        name: &str,
        user_text: &str,
        is_final_summary: bool,
    ) -> Result<AnalysisResult, Error> {
        let Some(analyzer) = self.get(name) else {
            return Err(Error::UnknownAgent {
                name: name.to_owned(),
                known: self.agent_names(),
            });
        };
        analyzer
            .analyze_response(user_text, is_final_summary)
            .instrument(debug_span!("agent", name))
            .await
    }

    /// Runs one turn with every agent, one after another in registration
    /// order.
    ///
    /// Each agent appends its own exchange, so later agents see the answers
    /// of earlier ones. A failing agent is reported in place and does not
    /// stop the others.
    pub async fn analyze_with_all(
        &self,
        user_text: &str,
        is_final_summary: bool,
    ) -> Vec<(String, Result<AnalysisResult, Error>)> {
        let mut results = Vec::with_capacity(self.agents.len());
        for (name, analyzer) in &self.agents {
            let result = analyzer
                .analyze_response(user_text, is_final_summary)
                .instrument(debug_span!("agent", name = name.as_str()))
                .await;
            if let Err(err) = &result {
                warn!("agent `{name}` failed: {err}");
            }
            results.push((name.clone(), result));
        }
        results
    }

    /// Clears the shared transcript.
    #[inline]
    pub fn reset_conversation(&self) {
        self.transcript.clear();
    }

    /// Returns a copy of the shared transcript.
    #[inline]
    pub fn conversation_history(&self) -> Vec<Message> {
        self.transcript.snapshot()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.agents.iter().position(|(n, _)| n == name)
    }
}

#[cfg(test)]
mod tests {
    use intake_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    fn registry(model_provider: &TestModelProvider) -> AgentRegistry {
        let mut registry =
            AgentRegistry::new(ModelClient::new(model_provider.clone()));
        registry
            .register("project_analyst", Persona::new("project analyst"))
            .unwrap();
        registry
            .register("technical_expert", Persona::new("technical expert"))
            .unwrap();
        registry
    }

    #[test]
    fn test_registration() {
        let mut registry = registry(&TestModelProvider::default());
        assert_eq!(
            registry.agent_names(),
            vec!["project_analyst".to_owned(), "technical_expert".to_owned()]
        );
        assert_eq!(
            registry.get("technical_expert").unwrap().persona().role_label(),
            "technical expert"
        );
        assert!(registry.get("nonexistent").is_none());

        let err = registry
            .register("project_analyst", Persona::default())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateAgent(name) if name == "project_analyst"));
        assert_eq!(registry.agent_names().len(), 2);
    }

    #[test]
    fn test_foreign_transcript_rejected() {
        let model_provider = TestModelProvider::default();
        let mut registry = registry(&model_provider);
        let stray =
            AnalyzerBuilder::with_model_provider(model_provider).build();
        let err = registry.add_analyzer("stray", stray).unwrap_err();
        assert!(matches!(err, Error::ForeignTranscript(name) if name == "stray"));

        let custom = registry
            .analyzer_builder()
            .with_persona(Persona::new("market researcher"))
            .build();
        registry.add_analyzer("market_researcher", custom).unwrap();
        assert_eq!(registry.agent_names().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_agent() {
        let model_provider = TestModelProvider::default();
        let registry = registry(&model_provider);
        let err = registry
            .analyze_with("nonexistent", "hello", false)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "agent `nonexistent` not found, available agents: \
             [project_analyst, technical_expert]"
        );
        assert!(registry.transcript().is_empty());
        assert_eq!(model_provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_analyze_with_shares_history() {
        let model_provider = TestModelProvider::default();
        model_provider.add_text_step("Mobile app.\nFollow-up question: iOS?");
        model_provider.add_text_step("Use Swift.\nFollow-up question: Offline?");
        let registry = registry(&model_provider).with_temperature(0.2);

        registry
            .analyze_with("project_analyst", "A mobile app.", false)
            .await
            .unwrap();
        let result = registry
            .analyze_with("technical_expert", "Yes, iOS only.", false)
            .await
            .unwrap();
        assert_eq!(result.follow_up_question, "Offline?");
        assert_eq!(registry.conversation_history().len(), 4);

        let requests = model_provider.requests();
        assert!(requests[1].messages[0].content().contains("User: A mobile app."));
        // Temperature applies to agents registered afterwards only.
        assert_eq!(requests[1].temperature, None);
    }

    #[tokio::test]
    async fn test_analyze_with_all() {
        let model_provider = TestModelProvider::default();
        model_provider.add_text_step("Analyst view.\nFollow-up question: Who?");
        // The expert is rate limited once; the same step then answers the
        // next agent.
        model_provider.add_response_step(
            PresetResponse::with_content("Security view.\nFollow-up question: PII?")
                .with_failures(1)
                .with_status(429),
        );
        model_provider.add_text_step("Data view.\nFollow-up question: Volume?");
        let mut registry = registry(&model_provider);
        registry
            .register("security_specialist", Persona::new("security specialist"))
            .unwrap();
        registry
            .register("data_scientist", Persona::new("data scientist"))
            .unwrap();

        let results = registry
            .analyze_with_all("We store payment data.", false)
            .await;
        let names: Vec<_> = results.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "project_analyst",
                "technical_expert",
                "security_specialist",
                "data_scientist"
            ]
        );
        assert_eq!(results[0].1.as_ref().unwrap().follow_up_question, "Who?");
        assert!(matches!(&results[1].1, Err(Error::Gateway(e)) if e.status() == Some(429)));
        assert_eq!(results[2].1.as_ref().unwrap().follow_up_question, "PII?");
        let last = results[3].1.as_ref().unwrap();
        assert_eq!(last.follow_up_question, "Volume?");

        // Each successful agent sees a longer transcript than the one
        // before it; the failed agent appended nothing.
        let lens: Vec<_> = results
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(|r| r.transcript.len())
            .collect();
        assert_eq!(lens, vec![2, 4, 6]);
        assert!(lens.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(registry.transcript().len(), 6);

        let requests = model_provider.requests();
        assert_eq!(requests.len(), 4);
        assert!(requests[2].messages[0].content().contains("Assistant: Analyst view."));
        assert!(requests[3].messages[0].content().contains("Assistant: Security view."));
        assert_eq!(model_provider.remaining_steps(), 0);
    }

    #[tokio::test]
    async fn test_reset_conversation() {
        let model_provider = TestModelProvider::default();
        model_provider.add_text_step("Ok.\nFollow-up question: More?");
        let registry = registry(&model_provider);
        registry
            .analyze_with("technical_expert", "Rust backend.", false)
            .await
            .unwrap();
        assert!(!registry.get("project_analyst").unwrap().conversation_history().is_empty());

        registry.reset_conversation();
        assert!(registry.conversation_history().is_empty());
        registry.reset_conversation();
        assert!(registry.transcript().is_empty());
    }
}
