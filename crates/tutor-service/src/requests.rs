//! Inbound request bodies and outbound reply payloads.
//!
//! Every handler answers with a `Reply`: `{"ok": true, ...payload}` on
//! success or `{"ok": false, "error": "..."}` on any domain failure.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use tutor_retrieval::{SectionRef, TopicSelection};

use crate::quiz::QuizItem;

/// One prior chat turn. Turns missing either field are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl HistoryTurn {
    pub fn new(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self { sender: Some(sender.into()), message: Some(message.into()) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    pub units: Option<Vec<String>>,
    #[serde(default)]
    pub sections: Option<Vec<SectionRef>>,
    pub num_questions: i64,
    #[serde(default)]
    pub difficulty: String,
}

impl QuizRequest {
    pub fn selection(&self) -> TopicSelection {
        TopicSelection {
            units: self.units.clone().unwrap_or_default(),
            sections: self.sections.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub wrong_questions: Vec<String>,
    #[serde(default)]
    pub selected_topics: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub total: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply<T> {
    Success {
        ok: bool,
        #[serde(flatten)]
        payload: T,
    },
    Failure {
        ok: bool,
        error: String,
    },
}

impl<T> Reply<T> {
    pub fn success(payload: T) -> Self {
        Reply::Success { ok: true, payload }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Reply::Failure { ok: false, error: error.into() }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Success { .. })
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Reply::Success { payload, .. } => Some(payload),
            Reply::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Reply::Success { .. } => None,
            Reply::Failure { error, .. } => Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerPayload {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizPayload {
    pub questions: Vec<QuizItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationPayload {
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionListing {
    pub section: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitListing {
    pub unit: String,
    pub sections: Vec<SectionListing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicsPayload {
    pub topics: Vec<UnitListing>,
}
