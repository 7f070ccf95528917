use std::fmt::Write as _;

use intake_core::extract::normalize_question;
use intake_core::{AnalysisResult, Analyzer, Error};

/// The number of follow-up rounds before the closing summary.
pub const ROUNDS: usize = 3;

const START_REMINDER: &str = "IMPORTANT: Generate exactly ONE focused follow-up question. Do not include any numbering or multiple questions.";
const ROUND_REMINDER: &str = "IMPORTANT: Generate exactly ONE focused follow-up question based on this context. Do not include any numbering or multiple questions.";

/// How follow-up questions are requested and presented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum QuestionStyle {
    /// Every prompt repeats the one-question reminder, and questions are
    /// cut to one unnumbered line before they are returned.
    #[default]
    Normalized,
    /// Prompts carry only the collected context, and questions are
    /// returned as extracted.
    Raw,
}

/// A guided interview: an initial summary, a few rounds of follow-up
/// questions and a final summary.
///
/// Each follow-up turn resends the initial summary together with every
/// answer collected so far.
#[derive(Debug)]
pub struct Interview {
    analyzer: Analyzer,
    style: QuestionStyle,
    initial_summary: String,
    collected: Vec<(String, String)>,
}

impl Interview {
    /// Creates an interview driven by `analyzer`.
    pub fn new(analyzer: Analyzer, style: QuestionStyle) -> Self {
        Self {
            analyzer,
            style,
            initial_summary: String::new(),
            collected: Vec::new(),
        }
    }

    /// Starts over from `summary`, keeping the transcript, and returns the
    /// first analysis and question.
    pub async fn start(
        &mut self,
        summary: &str,
    ) -> Result<AnalysisResult, Error> {
        self.initial_summary = summary.trim().to_owned();
        self.collected.clear();

        let mut prompt = format!("Initial summary: {}", self.initial_summary);
        if self.style == QuestionStyle::Normalized {
            prompt.push('\n');
            prompt.push_str(START_REMINDER);
        }
        let result = self.analyzer.analyze_response(&prompt, false).await?;
        Ok(self.present(result))
    }

    /// Records `answer` to `question` and returns the next analysis and
    /// question.
    ///
    /// A blank answer, or an answer to a blank question, is skipped:
    /// nothing is recorded or sent and `None` is returned, so the caller may
    /// ask the same question again. Answering a question a second time
    /// replaces the earlier answer.
    pub async fn answer(
        &mut self,
        question: &str,
        answer: &str,
    ) -> Result<Option<AnalysisResult>, Error> {
        let (question, answer) = (question.trim(), answer.trim());
        if question.is_empty() || answer.is_empty() {
            debug!("skipping empty question or answer");
            return Ok(None);
        }
        self.record(question, answer);

        let mut prompt = self.context();
        if self.style == QuestionStyle::Normalized {
            prompt.push('\n');
            prompt.push_str(ROUND_REMINDER);
        }
        let result = self.analyzer.analyze_response(&prompt, false).await?;
        Ok(Some(self.present(result)))
    }

    /// Asks for a summary of everything collected so far.
    pub async fn summarize(&self) -> Result<String, Error> {
        let result = self
            .analyzer
            .analyze_response(&self.context(), true)
            .await?;
        Ok(result.analysis)
    }

    /// Forgets the summary and the answers, and clears the transcript.
    pub fn reset(&mut self) {
        self.initial_summary.clear();
        self.collected.clear();
        self.analyzer.reset_conversation();
    }

    /// Renders the initial summary and the collected answers.
    pub fn context(&self) -> String {
        let mut context = format!(
            "Initial summary: {}\nCollected information:\n",
            self.initial_summary
        );
        for (question, answer) in &self.collected {
            // Writing into a `String` never fails.
            let _ = writeln!(context, "Q: {question}\nA: {answer}");
        }
        context
    }

    /// Returns the collected question and answer pairs, in asking order.
    #[inline]
    pub fn collected(&self) -> &[(String, String)] {
        &self.collected
    }

    /// Returns the analyzer driving this interview.
    #[inline]
    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    fn record(&mut self, question: &str, answer: &str) {
        match self.collected.iter_mut().find(|(q, _)| q == question) {
            Some((_, a)) => *a = answer.to_owned(),
            None => {
                self.collected.push((question.to_owned(), answer.to_owned()))
            }
        }
    }

    fn present(&self, mut result: AnalysisResult) -> AnalysisResult {
        if self.style == QuestionStyle::Normalized {
            result.follow_up_question =
                normalize_question(&result.follow_up_question);
        }
        result
    }
}
