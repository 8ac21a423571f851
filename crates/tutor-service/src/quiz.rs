use serde::{Deserialize, Serialize};

use tutor_core::{Error, Result};

pub const OPTION_COUNT: usize = 4;

/// A validated multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
}

/// Parse one model completion into a `QuizItem`.
///
/// Accepts bare JSON or JSON wrapped in a Markdown code fence. The item must
/// have a non-empty question, exactly four options and an answer index
/// pointing at one of them.
pub fn parse_quiz_item(raw: &str) -> Result<QuizItem> {
    let body = strip_code_fence(raw);
    let item: QuizItem = serde_json::from_str(body)
        .map_err(|e| Error::MalformedGenerationOutput(format!("quiz item is not valid JSON: {e}")))?;
    if item.question.trim().is_empty() {
        return Err(Error::MalformedGenerationOutput("quiz item has an empty question".into()));
    }
    if item.options.len() != OPTION_COUNT {
        return Err(Error::MalformedGenerationOutput(format!(
            "quiz item has {} options, expected {OPTION_COUNT}",
            item.options.len()
        )));
    }
    if item.answer_index >= OPTION_COUNT {
        return Err(Error::MalformedGenerationOutput(format!(
            "answer_index {} is out of range",
            item.answer_index
        )));
    }
    Ok(item)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag line, e.g. ```json
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
