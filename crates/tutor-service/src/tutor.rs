//! Request handlers. Ask and quiz read the shared knowledge base; recommend
//! needs only the generation service. Each talks to the generator at most as
//! often as its contract allows and always answers with a well-formed `Reply`.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use tutor_core::config::GenerationSettings;
use tutor_core::topics::TopicCatalog;
use tutor_core::traits::TextGenerator;
use tutor_core::Error;
use tutor_retrieval::{clamp_question_count, KnowledgeBase};

use crate::prompts::{self, ANSWER_FAILED, NO_WRONG_ANSWERS, OUT_OF_SCOPE_ANSWER, QUIZ_FAILED};
use crate::quiz::{parse_quiz_item, QuizItem};
use crate::requests::{
    AnswerPayload, AskRequest, QuizPayload, QuizRequest, RecommendRequest, RecommendationPayload, Reply,
    SectionListing, TopicsPayload, UnitListing,
};

/// Units and their sections, in catalog order.
pub fn topics_listing(catalog: &TopicCatalog) -> TopicsPayload {
    let topics = catalog
        .units()
        .map(|(unit, sections)| UnitListing {
            unit: unit.to_string(),
            sections: sections
                .iter()
                .map(|(section, s)| SectionListing { section: section.clone(), title: s.title.clone() })
                .collect(),
        })
        .collect();
    TopicsPayload { topics }
}

pub struct Tutor<G> {
    knowledge: Arc<KnowledgeBase>,
    generator: G,
    history_limit: usize,
}

impl<G: TextGenerator> Tutor<G> {
    pub fn new(knowledge: Arc<KnowledgeBase>, generator: G, settings: &GenerationSettings) -> Self {
        Self { knowledge, generator, history_limit: settings.history_limit }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn topics(&self) -> TopicsPayload {
        topics_listing(self.knowledge.catalog())
    }

    #[instrument(skip_all)]
    pub async fn ask(&self, request: &AskRequest) -> Reply<AnswerPayload> {
        let retrieval = match self.knowledge.retriever().retrieve(&request.question) {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "retrieval failed");
                return Reply::failure(ANSWER_FAILED);
            }
        };
        if !retrieval.in_scope {
            info!(best_score = ?retrieval.best_score(), "refusing out-of-scope question");
            return Reply::success(AnswerPayload { answer: OUT_OF_SCOPE_ANSWER.to_string() });
        }
        let completion =
            prompts::answer_request(&retrieval.context(), &request.history, self.history_limit, &request.question);
        match self.generator.complete(&completion).await {
            Ok(answer) => Reply::success(AnswerPayload { answer }),
            Err(e) => {
                warn!(error = %e, "answer generation failed");
                Reply::failure(ANSWER_FAILED)
            }
        }
    }

    pub async fn generate_quiz(&self, request: &QuizRequest) -> Reply<QuizPayload> {
        let mut rng = StdRng::from_entropy();
        self.generate_quiz_with_rng(request, &mut rng).await
    }

    /// Same as `generate_quiz` with the sampling source supplied by the caller.
    #[instrument(skip_all, fields(requested = request.num_questions))]
    pub async fn generate_quiz_with_rng<R: Rng + Send>(&self, request: &QuizRequest, rng: &mut R) -> Reply<QuizPayload> {
        let pool = match self.knowledge.resolve_candidates(&request.selection()) {
            Ok(pool) => pool,
            Err(e @ Error::EmptyCandidates) => {
                info!("no chunks match the selected topics");
                return Reply::failure(e.to_string());
            }
            Err(e) => {
                error!(error = %e, "candidate resolution failed");
                return Reply::failure(QUIZ_FAILED);
            }
        };
        let count = clamp_question_count(request.num_questions, self.knowledge.quiz_settings());
        let sampler = self.knowledge.sampler();
        debug!(candidates = pool.len(), count, "generating quiz");

        let mut questions: Vec<QuizItem> = Vec::with_capacity(count);
        for item in 0..count {
            let ids = sampler.draw(&pool, rng);
            let material = match self.knowledge.corpus().join(&ids) {
                Ok(m) => m,
                Err(e) => {
                    error!(error = %e, "sampled chunk missing from corpus");
                    return Reply::failure(QUIZ_FAILED);
                }
            };
            let completion = prompts::quiz_item_request(&material, &request.difficulty);
            let raw = match self.generator.complete(&completion).await {
                Ok(raw) => raw,
                Err(Error::MalformedGenerationOutput(reason)) => {
                    warn!(item, %reason, "skipping quiz item");
                    continue;
                }
                Err(e) => {
                    error!(item, error = %e, "quiz generation failed");
                    return Reply::failure(QUIZ_FAILED);
                }
            };
            match parse_quiz_item(&raw) {
                Ok(q) => questions.push(q),
                Err(e) => warn!(item, error = %e, "skipping quiz item"),
            }
        }
        info!(generated = questions.len(), requested = count, "quiz ready");
        Reply::success(QuizPayload { questions })
    }

    pub async fn recommend(&self, request: &RecommendRequest) -> Reply<RecommendationPayload> {
        recommend(&self.generator, request).await
    }
}

/// Study advice from a finished quiz. Needs only the generation service,
/// never the knowledge base.
#[instrument(skip_all, fields(wrong = request.wrong_questions.len()))]
pub async fn recommend<G: TextGenerator + ?Sized>(generator: &G, request: &RecommendRequest) -> Reply<RecommendationPayload> {
    if request.wrong_questions.is_empty() {
        return Reply::success(RecommendationPayload { recommendation: NO_WRONG_ANSWERS.to_string() });
    }
    let empty = BTreeMap::new();
    let topics = request.selected_topics.as_ref().unwrap_or(&empty);
    let completion = prompts::recommendation_request(&request.wrong_questions, topics, request.score, request.total);
    let recommendation = match generator.complete(&completion).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) | Err(Error::MalformedGenerationOutput(_)) => {
            debug!("empty recommendation, using fallback");
            prompts::RECOMMENDATION_FALLBACK.to_string()
        }
        Err(e) => {
            warn!(error = %e, "recommendation generation failed");
            return Reply::failure(prompts::RECOMMENDATION_FAILED);
        }
    };
    Reply::success(RecommendationPayload { recommendation })
}
