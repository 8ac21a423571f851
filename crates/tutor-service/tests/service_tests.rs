use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use tutor_core::config::{GenerationSettings, QuizSettings, RetrievalSettings};
use tutor_core::topics::TopicCatalog;
use tutor_core::traits::{Embedder, TextGenerator};
use tutor_core::types::{CompletionRequest, Role};
use tutor_core::Error;
use tutor_retrieval::{CorpusStore, KnowledgeBase, SectionRef};
use tutor_service::prompts::{
    ANSWER_FAILED, NO_WRONG_ANSWERS, OUT_OF_SCOPE_ANSWER, QUIZ_FAILED, RECOMMENDATION_FAILED, RECOMMENDATION_FALLBACK,
};
use tutor_service::{recommend, topics_listing, AskRequest, HistoryTurn, QuizRequest, RecommendRequest, Reply, Tutor};
use tutor_vector::FlatIpIndex;

const VALID_ITEM: &str = r#"{"question": "Which structure keeps keys ordered?", "options": ["BST", "Hash table", "Queue", "Stack"], "answer_index": 0}"#;

const VOCABULARY: [&str; 4] = ["tree", "sort", "graph", "hash"];

/// One dimension per vocabulary word; text without any of them embeds to zero.
struct KeywordEmbedder;

impl Embedder for KeywordEmbedder {
    fn embedder_id(&self) -> &str { "keyword" }
    fn dim(&self) -> usize { VOCABULARY.len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                let mut v: Vec<f32> = VOCABULARY.iter().map(|w| lower.matches(w).count() as f32).collect();
                let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm > 0.0 {
                    v.iter_mut().for_each(|x| *x /= norm);
                }
                v
            })
            .collect())
    }
}

/// Replays canned replies and records every request it receives.
/// Once the script runs out it answers with a valid quiz item.
#[derive(Default)]
struct ScriptedGenerator {
    replies: Mutex<VecDeque<tutor_core::Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<tutor_core::Result<String>>) -> Self {
        Self { replies: Mutex::new(replies.into()), requests: Mutex::default() }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, request: &CompletionRequest) -> tutor_core::Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| Ok(VALID_ITEM.to_string()))
    }
}

fn knowledge_base() -> Arc<KnowledgeBase> {
    let texts = [
        "A binary search tree keeps keys ordered.",
        "Merge sort splits the array and merges sorted halves.",
        "Graph traversal with BFS visits neighbours level by level.",
        "A hash table maps keys to buckets.",
        "Heap sort builds a max heap and extracts the root.",
    ];
    let embedder = KeywordEmbedder;
    let rows = embedder.embed_batch(&texts.iter().map(|t| t.to_string()).collect::<Vec<_>>()).unwrap();
    let index = FlatIpIndex::from_rows(embedder.dim(), rows).unwrap();
    let catalog = TopicCatalog::from_json_str(
        r#"{
            "unit1": {"sec1": {"title": "Trees", "keywords": ["tree"]}, "sec2": {"title": "Sorting", "keywords": ["sort"]}},
            "unit2": {"sec1": {"title": "Graphs", "keywords": ["graph"]}, "sec2": {"title": "Hashing", "keywords": ["hash"]}},
            "unit3": {"sec1": {"title": "Quantum", "keywords": ["qubit"]}}
        }"#,
    )
    .unwrap();
    let kb = KnowledgeBase::new(
        CorpusStore::from_texts(texts),
        Box::new(index),
        Box::new(embedder),
        catalog,
        RetrievalSettings::default(),
        QuizSettings::default(),
    )
    .unwrap();
    Arc::new(kb)
}

fn tutor(replies: Vec<tutor_core::Result<String>>) -> Tutor<ScriptedGenerator> {
    Tutor::new(knowledge_base(), ScriptedGenerator::new(replies), &GenerationSettings::default())
}

fn quiz(units: &[&str], sections: &[(&str, &str)], num_questions: i64) -> QuizRequest {
    QuizRequest {
        units: Some(units.iter().map(|u| u.to_string()).collect()),
        sections: Some(sections.iter().map(|(u, s)| SectionRef::new(*u, *s)).collect()),
        num_questions,
        difficulty: "easy".to_string(),
    }
}

#[test]
fn topics_lists_units_and_section_titles() {
    let payload = tutor(vec![]).topics();
    let value = serde_json::to_value(&payload).unwrap();
    assert_eq!(
        value["topics"][0],
        json!({"unit": "unit1", "sections": [{"section": "sec1", "title": "Trees"}, {"section": "sec2", "title": "Sorting"}]})
    );
    assert_eq!(payload.topics.len(), 3);
}

#[test]
fn topics_follow_catalog_file_order() {
    let catalog = TopicCatalog::from_json_str(
        r#"{"unit2": {"sec2": {"title": "Later"}, "sec1": {"title": "Earlier"}}, "unit10": {"sec1": {"title": "Last"}}}"#,
    )
    .unwrap();
    let value = serde_json::to_value(topics_listing(&catalog)).unwrap();
    assert_eq!(
        value,
        json!({"topics": [
            {"unit": "unit2", "sections": [{"section": "sec2", "title": "Later"}, {"section": "sec1", "title": "Earlier"}]},
            {"unit": "unit10", "sections": [{"section": "sec1", "title": "Last"}]}
        ]})
    );
}

#[tokio::test]
async fn out_of_scope_question_skips_generation() {
    let tutor = tutor(vec![]);
    let reply = tutor.ask(&AskRequest { question: "what is the weather today".into(), history: vec![] }).await;

    assert_eq!(reply.payload().unwrap().answer, OUT_OF_SCOPE_ANSWER);
    assert_eq!(tutor.generator().calls(), 0);
    assert_eq!(serde_json::to_value(&reply).unwrap(), json!({"ok": true, "answer": OUT_OF_SCOPE_ANSWER}));
}

#[tokio::test]
async fn in_scope_question_sends_context_history_and_question() {
    let tutor = tutor(vec![Ok("A tree is a hierarchy.".into())]);
    let history: Vec<HistoryTurn> = (0..8)
        .map(|i| HistoryTurn::new(if i % 2 == 0 { "user" } else { "bot" }, format!("turn {i}")))
        .collect();
    let reply = tutor.ask(&AskRequest { question: "explain a tree".into(), history }).await;

    assert_eq!(reply.payload().unwrap().answer, "A tree is a hierarchy.");
    let requests = tutor.generator().requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!((request.temperature - 0.3).abs() < f32::EPSILON);
    assert_eq!(request.max_tokens, 220);

    let messages = &request.messages;
    assert_eq!(messages.len(), 2 + 6 + 1);
    assert_eq!(messages[0].role, Role::System);
    assert!(messages[1].content.starts_with("Relevant course material:\nA binary search tree keeps keys ordered.\n\n"));
    assert_eq!(messages[2].content, "turn 2");
    assert_eq!(messages[2].role, Role::User);
    assert_eq!(messages[3].role, Role::Assistant);
    assert_eq!(messages[8].role, Role::User);
    assert_eq!(messages[8].content, "explain a tree");
}

#[tokio::test]
async fn incomplete_history_turns_are_skipped() {
    let tutor = tutor(vec![Ok("ok".into())]);
    let history = vec![
        HistoryTurn { sender: None, message: Some("orphan".into()) },
        HistoryTurn::new("bot", "earlier answer"),
        HistoryTurn { sender: Some("user".into()), message: None },
    ];
    tutor.ask(&AskRequest { question: "hash buckets?".into(), history }).await;

    let messages = &tutor.generator().requests()[0].messages;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].content, "earlier answer");
}

#[tokio::test]
async fn failed_answer_generation_is_a_structured_failure() {
    let tutor = tutor(vec![Err(Error::Collaborator("401 unauthorized".into()))]);
    let reply = tutor.ask(&AskRequest { question: "graph search".into(), history: vec![] }).await;

    assert_eq!(serde_json::to_value(&reply).unwrap(), json!({"ok": false, "error": ANSWER_FAILED}));
}

#[tokio::test]
async fn empty_candidates_fail_without_generation() {
    let tutor = tutor(vec![]);
    let reply = tutor.generate_quiz(&quiz(&["unit3", "unit9"], &[], 3)).await;

    assert_eq!(reply.error(), Some("No content found for selected topics."));
    assert_eq!(tutor.generator().calls(), 0);
}

#[tokio::test]
async fn malformed_item_is_skipped_and_batch_continues() {
    let tutor = tutor(vec![Ok(VALID_ITEM.into()), Ok("Here is a great question!".into()), Ok(VALID_ITEM.into())]);
    let reply = tutor.generate_quiz(&quiz(&["unit1"], &[], 3)).await;

    assert_eq!(reply.payload().unwrap().questions.len(), 2);
    assert_eq!(tutor.generator().calls(), 3);
}

#[tokio::test]
async fn question_count_is_clamped() {
    for (requested, expected) in [(0, 1), (15, 10), (-3, 1), (4, 4)] {
        let tutor = tutor(vec![]);
        let reply = tutor.generate_quiz(&quiz(&["unit2"], &[], requested)).await;
        assert!(reply.is_ok());
        assert_eq!(tutor.generator().calls(), expected, "requested {requested}");
    }
}

#[tokio::test]
async fn explicit_sections_decide_the_material() {
    let tutor = tutor(vec![]);
    let reply = tutor.generate_quiz(&quiz(&["unit2"], &[("unit1", "sec2")], 1)).await;
    assert!(reply.is_ok());

    let request = &tutor.generator().requests()[0];
    assert!((request.temperature - 0.3).abs() < f32::EPSILON);
    assert_eq!(request.max_tokens, 300);
    assert_eq!(request.messages[0].content, "You are a university-level exam setter.");
    let prompt = &request.messages[1].content;
    assert!(prompt.contains("Merge sort") && prompt.contains("Heap sort"));
    assert!(!prompt.contains("Graph traversal"));
    assert!(prompt.contains("easy difficulty"));
}

#[tokio::test]
async fn section_missing_its_name_is_ignored() {
    let request: QuizRequest = serde_json::from_str(
        r#"{"sections": [{"unit": "unit1"}, {"unit": "unit1", "section": "sec2"}], "num_questions": 1, "difficulty": "easy"}"#,
    )
    .unwrap();
    let tutor = tutor(vec![]);
    let reply = tutor.generate_quiz(&request).await;
    assert!(reply.is_ok());

    let prompt = &tutor.generator().requests()[0].messages[1].content;
    assert!(prompt.contains("Merge sort") && prompt.contains("Heap sort"));
}

#[tokio::test]
async fn seeded_sampling_is_reproducible() {
    let prompts = |tutor: &Tutor<ScriptedGenerator>| {
        tutor.generator().requests().into_iter().map(|r| r.messages[1].content.clone()).collect::<Vec<_>>()
    };
    let first = tutor(vec![]);
    let second = tutor(vec![]);
    let request = quiz(&["unit1"], &[], 4);
    first.generate_quiz_with_rng(&request, &mut StdRng::seed_from_u64(7)).await;
    second.generate_quiz_with_rng(&request, &mut StdRng::seed_from_u64(7)).await;

    assert_eq!(prompts(&first), prompts(&second));
}

#[tokio::test]
async fn collaborator_failure_fails_the_quiz() {
    let tutor = tutor(vec![Ok(VALID_ITEM.into()), Err(Error::Collaborator("rate limited".into()))]);
    let reply = tutor.generate_quiz(&quiz(&["unit1"], &[], 3)).await;

    assert_eq!(reply.error(), Some(QUIZ_FAILED));
    assert_eq!(tutor.generator().calls(), 2);
}

#[tokio::test]
async fn no_wrong_answers_needs_no_generation() {
    let tutor = tutor(vec![]);
    let reply = tutor.recommend(&RecommendRequest::default()).await;

    assert_eq!(reply.payload().unwrap().recommendation, NO_WRONG_ANSWERS);
    assert_eq!(tutor.generator().calls(), 0);
}

#[tokio::test]
async fn recommendation_prompt_lists_wrong_questions() {
    let tutor = tutor(vec![Ok("  Review merge sort in unit1/sec2.  ".into())]);
    let request = RecommendRequest {
        wrong_questions: vec!["What is stable sorting?".into(), "Worst case of quicksort?".into()],
        selected_topics: Some(BTreeMap::from([("unit1".to_string(), vec!["sec2".to_string()])])),
        score: Some(3),
        total: Some(5),
    };
    let reply = tutor.recommend(&request).await;

    assert_eq!(reply.payload().unwrap().recommendation, "Review merge sort in unit1/sec2.");
    let sent = &tutor.generator().requests()[0];
    assert!((sent.temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(sent.max_tokens, 70);
    let prompt = &sent.messages[1].content;
    assert!(prompt.contains("1. What is stable sorting?\n2. Worst case of quicksort?"));
    assert!(prompt.contains(r#"{"unit1":["sec2"]}"#));
    assert!(prompt.contains("Score: 3/5"));
}

#[tokio::test]
async fn blank_recommendation_falls_back() {
    for reply in [Ok("   ".to_string()), Err(Error::MalformedGenerationOutput("no content".into()))] {
        let tutor = tutor(vec![reply]);
        let request = RecommendRequest { wrong_questions: vec!["Q1".into()], ..Default::default() };
        let out = tutor.recommend(&request).await;
        assert_eq!(out.payload().unwrap().recommendation, RECOMMENDATION_FALLBACK);
    }
}

#[tokio::test]
async fn failed_recommendation_is_a_structured_failure() {
    let tutor = tutor(vec![Err(Error::Collaborator("timeout".into()))]);
    let request = RecommendRequest { wrong_questions: vec!["Q1".into()], ..Default::default() };
    let reply: Reply<_> = tutor.recommend(&request).await;

    assert!(!reply.is_ok());
    assert_eq!(reply.error(), Some(RECOMMENDATION_FAILED));
}

#[tokio::test]
async fn recommendation_runs_on_the_generator_alone() {
    let generator = ScriptedGenerator::new(vec![Ok("Revisit hashing.".into())]);
    let request = RecommendRequest { wrong_questions: vec!["What is a bucket?".into()], ..Default::default() };
    let reply = recommend(&generator, &request).await;

    assert_eq!(reply.payload().unwrap().recommendation, "Revisit hashing.");
    assert_eq!(generator.calls(), 1);
    assert!(generator.requests()[0].messages[1].content.contains("1. What is a bucket?"));
}
