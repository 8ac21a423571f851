//! Request-facing layer of the tutor: ask, topics, quiz generation and
//! study recommendations over a shared `KnowledgeBase`.
pub mod generation;
pub mod prompts;
pub mod quiz;
pub mod requests;
pub mod tutor;

pub use generation::ChatClient;
pub use quiz::{parse_quiz_item, QuizItem};
pub use requests::{AnswerPayload, AskRequest, HistoryTurn, QuizPayload, QuizRequest, RecommendRequest, RecommendationPayload, Reply, TopicsPayload};
pub use tutor::{recommend, topics_listing, Tutor};
