//! Pulls structured fields out of raw model output.
//!
//! The structure is a convention, not a format: the analysis prompt asks the
//! model to put its question after [`FOLLOW_UP_DELIMITER`], and this module
//! splits on that literal and nothing else. The prompt text lives in
//! `prompts/analysis.md`; change both together.

/// The literal separating the analysis from the follow-up question.
pub const FOLLOW_UP_DELIMITER: &str = "Follow-up question:";

/// Which fields to extract from a completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExtractMode {
    /// Analysis followed by one follow-up question.
    FollowUp,
    /// A consolidated summary, no question.
    Summary,
}

impl ExtractMode {
    /// Maps the `is_final_summary` flag used by analyzers to a mode.
    #[inline]
    pub fn from_final_flag(is_final_summary: bool) -> Self {
        if is_final_summary {
            ExtractMode::Summary
        } else {
            ExtractMode::FollowUp
        }
    }
}

/// The fields extracted from one completion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Extraction {
    /// The analysis, or the whole summary in summary mode.
    pub analysis: String,
    /// The follow-up question. Empty in summary mode, or when the model
    /// did not emit the delimiter.
    pub follow_up_question: String,
}

/// Extracts the analysis and the follow-up question from `raw`.
///
/// In follow-up mode the text before the first delimiter is the analysis
/// and the text up to the next delimiter (if the model repeated it) is the
/// question, both trimmed. Without a delimiter the whole trimmed text is
/// the analysis. In summary mode `raw` is returned verbatim.
pub fn extract(raw: &str, mode: ExtractMode) -> Extraction {
    match mode {
        ExtractMode::Summary => Extraction {
            analysis: raw.to_owned(),
            follow_up_question: String::new(),
        },
        ExtractMode::FollowUp => {
            let mut parts = raw.split(FOLLOW_UP_DELIMITER);
            let analysis = parts.next().unwrap_or_default().trim();
            let question = parts.next().unwrap_or_default().trim();
            Extraction {
                analysis: analysis.to_owned(),
                follow_up_question: question.to_owned(),
            }
        }
    }
}

/// Reduces a question to a single, unnumbered line.
///
/// Keeps the first line of the trimmed input and strips leading list
/// markers such as `1.` or `2)`. A marker directly followed by a digit is
/// left alone, so `3.5 million users?` survives. Applying it twice gives
/// the same result as applying it once.
pub fn normalize_question(question: &str) -> String {
    let first_line = question.trim().lines().next().unwrap_or_default();
    let mut rest = first_line.trim();
    while let Some(stripped) = strip_list_marker(rest) {
        rest = stripped.trim_start();
    }
    rest.trim_end().to_owned()
}

fn strip_list_marker(s: &str) -> Option<&str> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &s[digits..];
    let rest = rest
        .strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))?;
    if rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(rest)
}
