//! Fixed user-facing strings and prompt builders for the generation service.
use std::collections::BTreeMap;

use tutor_core::types::{ChatMessage, CompletionRequest};

use crate::requests::HistoryTurn;

pub const OUT_OF_SCOPE_ANSWER: &str = "This question appears to be outside the scope of this course.";
pub const ANSWER_FAILED: &str = "Answer generation failed.";
pub const QUIZ_FAILED: &str = "Quiz generation failed.";
pub const NO_WRONG_ANSWERS: &str = "Good work, no incorrect answers to analyze.";
pub const RECOMMENDATION_FALLBACK: &str = "Revise the related unit sections and practice the example problems.";
pub const RECOMMENDATION_FAILED: &str = "Recommendation generation failed.";

const TUTOR_STYLE: &str = "You are an interactive university tutor.

Teaching style:
1. Answer in 4 to 8 short sentences, under 120 words in total.
2. Explain the intuition in plain language instead of reciting a textbook.
3. Give at most one small example of one or two lines.
4. Avoid long bullet lists, long analogies and ASCII diagrams.
5. Do not repeat ideas or mention documents or the syllabus.
6. When defining a term, give a one-line definition, a short intuitive explanation and a tiny example.
7. If the question has nothing to do with the course, say that it is out of scope.
8. Finish with one short follow-up question that makes the student think.";

const EXAM_SETTER: &str = "You are a university-level exam setter.";
const RECOMMENDER: &str = "You are a concise tutor producing a short recommendation.";

pub const ANSWER_TEMPERATURE: f32 = 0.3;
pub const ANSWER_MAX_TOKENS: u32 = 220;
pub const QUIZ_TEMPERATURE: f32 = 0.3;
pub const QUIZ_MAX_TOKENS: u32 = 300;
pub const RECOMMEND_TEMPERATURE: f32 = 0.2;
pub const RECOMMEND_MAX_TOKENS: u32 = 70;

/// Style directive, retrieved context, the last `history_limit` usable turns, then the question.
pub fn answer_request(context: &str, history: &[HistoryTurn], history_limit: usize, question: &str) -> CompletionRequest {
    let mut messages = vec![
        ChatMessage::system(TUTOR_STYLE),
        ChatMessage::system(format!("Relevant course material:\n{context}")),
    ];
    let skip = history.len().saturating_sub(history_limit);
    for turn in &history[skip..] {
        let (Some(sender), Some(message)) = (turn.sender.as_deref(), turn.message.as_deref()) else {
            continue;
        };
        messages.push(if sender == "bot" { ChatMessage::assistant(message) } else { ChatMessage::user(message) });
    }
    messages.push(ChatMessage::user(question));
    CompletionRequest { messages, temperature: ANSWER_TEMPERATURE, max_tokens: ANSWER_MAX_TOKENS }
}

pub fn quiz_item_request(material: &str, difficulty: &str) -> CompletionRequest {
    let difficulty = match difficulty.trim() {
        "" => "medium",
        d => d,
    };
    let prompt = format!(
        r#"Write ONE multiple choice question at {difficulty} difficulty, based strictly on the course material below.

Rules:
- The question must test understanding of a concept.
- Never ask about document structure such as units, sections or formatting.
- Never ask where something is mentioned.
- Exactly 4 options with exactly 1 correct answer.
- Wrong options must be plausible but clearly incorrect.
- Reply with strict JSON only, in this shape:

{{
  "question": "text",
  "options": ["A", "B", "C", "D"],
  "answer_index": 0
}}

Course material:
{material}
"#
    );
    CompletionRequest {
        messages: vec![ChatMessage::system(EXAM_SETTER), ChatMessage::user(prompt)],
        temperature: QUIZ_TEMPERATURE,
        max_tokens: QUIZ_MAX_TOKENS,
    }
}

pub fn recommendation_request(
    wrong_questions: &[String],
    selected_topics: &BTreeMap<String, Vec<String>>,
    score: Option<i64>,
    total: Option<i64>,
) -> CompletionRequest {
    let topics_json = serde_json::to_string(selected_topics).unwrap_or_else(|_| "{}".to_string());
    let mut prompt = String::from(
        "Write a one or two sentence recommendation for a student who got the questions below wrong. \
         Name the concepts they most likely need to revise and one concrete next step, such as a \
         section to review or exercises to try. Output only the recommendation.\n\n",
    );
    prompt.push_str(&format!("Selected topics (unit -> sections): {topics_json}\n"));
    if let (Some(score), Some(total)) = (score, total) {
        prompt.push_str(&format!("Score: {score}/{total}\n"));
    }
    prompt.push_str("\nWrong questions:\n");
    for (n, question) in wrong_questions.iter().enumerate() {
        prompt.push_str(&format!("{}. {question}\n", n + 1));
    }
    CompletionRequest {
        messages: vec![ChatMessage::system(RECOMMENDER), ChatMessage::user(prompt)],
        temperature: RECOMMEND_TEMPERATURE,
        max_tokens: RECOMMEND_MAX_TOKENS,
    }
}
