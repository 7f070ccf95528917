/// Replaced by the rendered transcript every time a prompt is built.
pub const HISTORY_PLACEHOLDER: &str = "{{HISTORY}}";

const ROLE_PLACEHOLDER: &str = "{{ROLE}}";
const ANALYSIS_TEMPLATE: &str = include_str!("./prompts/analysis.md");
const SUMMARY_TEMPLATE: &str = include_str!("./prompts/summary.md");

/// The role an analyzer plays, and the instructions it sends as its system
/// message.
///
/// Instructions may contain [`HISTORY_PLACEHOLDER`], which is substituted
/// with the live transcript on every call. Instructions without it are
/// sent as they are.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Persona {
    role_label: String,
    analysis_instructions: String,
    summary_instructions: String,
}

impl Persona {
    /// Creates a persona with the built-in instructions, e.g.
    /// `Persona::new("technical expert")`.
    ///
    /// The built-in analysis instructions ask the model for the
    /// [`FOLLOW_UP_DELIMITER`](crate::extract::FOLLOW_UP_DELIMITER) the
    /// extractor relies on.
    pub fn new<S: Into<String>>(role_label: S) -> Self {
        let role_label = role_label.into();
        Self {
            analysis_instructions: ANALYSIS_TEMPLATE
                .replace(ROLE_PLACEHOLDER, &role_label),
            summary_instructions: SUMMARY_TEMPLATE
                .replace(ROLE_PLACEHOLDER, &role_label),
            role_label,
        }
    }

    /// Creates a persona with custom instructions.
    ///
    /// Custom analysis instructions must ask for the follow-up delimiter
    /// themselves, otherwise every question comes back empty.
    pub fn with_instructions(
        role_label: impl Into<String>,
        analysis_instructions: impl Into<String>,
        summary_instructions: impl Into<String>,
    ) -> Self {
        Self {
            role_label: role_label.into(),
            analysis_instructions: analysis_instructions.into(),
            summary_instructions: summary_instructions.into(),
        }
    }

    /// Returns the role label, e.g. `project analyst`.
    #[inline]
    pub fn role_label(&self) -> &str {
        &self.role_label
    }

    /// Returns the analysis instructions, placeholder included.
    #[inline]
    pub fn analysis_instructions(&self) -> &str {
        &self.analysis_instructions
    }

    /// Returns the summary instructions, placeholder included.
    #[inline]
    pub fn summary_instructions(&self) -> &str {
        &self.summary_instructions
    }

    pub(crate) fn analysis_prompt(&self, history: &str) -> String {
        self.analysis_instructions
            .replace(HISTORY_PLACEHOLDER, history)
    }

    pub(crate) fn summary_prompt(&self, history: &str) -> String {
        self.summary_instructions.replace(HISTORY_PLACEHOLDER, history)
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::new("project analyst")
    }
}
