use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tutor_core::config::QuizSettings;
use tutor_core::topics::TopicCatalog;
use tutor_core::Error;
use tutor_retrieval::{
    clamp_question_count, resolve_candidates, CandidateSampler, CorpusStore, SectionRef, TopicIndex, TopicSelection,
};

fn index() -> TopicIndex {
    let corpus = CorpusStore::from_texts([
        "stack push pop",
        "queue enqueue",
        "stack and queue together",
        "graph traversal",
        "tree rotation",
        "graph coloring",
        "tree and graph",
        "hashing",
    ]);
    let catalog = TopicCatalog::from_json_str(
        r#"{
            "unit1": {"s1": {"title": "Stacks", "keywords": ["stack"]}, "s2": {"title": "Queues", "keywords": ["queue"]}},
            "unit2": {"s1": {"title": "Graphs", "keywords": ["graph"]}, "s2": {"title": "Trees", "keywords": ["tree"]}}
        }"#,
    )
    .unwrap();
    TopicIndex::build(&corpus, &catalog)
}

fn ids(selection: &TopicSelection) -> BTreeSet<usize> {
    resolve_candidates(&index(), selection).unwrap().ids().iter().copied().collect()
}

#[test]
fn sections_union_and_dedupe() {
    let selection = TopicSelection {
        units: vec![],
        sections: vec![SectionRef::new("unit1", "s1"), SectionRef::new("unit1", "s2")],
    };
    assert_eq!(ids(&selection), [0, 1, 2].into_iter().collect());
}

#[test]
fn explicit_sections_take_precedence_over_units() {
    let selection = TopicSelection {
        units: vec!["unit2".to_string()],
        sections: vec![SectionRef::new("unit1", "s1")],
    };
    assert_eq!(ids(&selection), [0, 2].into_iter().collect(), "unit2 must not be expanded");
}

#[test]
fn units_only_expand_every_section() {
    let selection = TopicSelection { units: vec!["unit2".to_string(), "nope".to_string()], sections: vec![] };
    assert_eq!(ids(&selection), [3, 4, 5, 6].into_iter().collect());
}

#[test]
fn unknown_pairs_are_skipped() {
    let selection = TopicSelection {
        units: vec![],
        sections: vec![SectionRef::new("unit9", "s1"), SectionRef::new("unit1", "zz"), SectionRef::new("unit2", "s2")],
    };
    assert_eq!(ids(&selection), [4, 6].into_iter().collect());
}

#[test]
fn unmatched_sections_do_not_fall_back_to_units() {
    let selection = TopicSelection {
        units: vec!["unit1".to_string()],
        sections: vec![SectionRef::new("unit9", "s1")],
    };
    assert!(matches!(resolve_candidates(&index(), &selection), Err(Error::EmptyCandidates)));
}

#[test]
fn empty_selection_is_empty_candidates() {
    let err = resolve_candidates(&index(), &TopicSelection::default()).unwrap_err();
    assert!(matches!(err, Error::EmptyCandidates));
    assert_eq!(err.to_string(), "No content found for selected topics.");
}

#[test]
fn question_count_is_clamped() {
    let settings = QuizSettings::default();
    assert_eq!(clamp_question_count(0, &settings), 1);
    assert_eq!(clamp_question_count(15, &settings), 10);
    assert_eq!(clamp_question_count(-3, &settings), 1);
    assert_eq!(clamp_question_count(7, &settings), 7);
}

#[test]
fn draws_are_distinct_bounded_and_within_pool() {
    let selection = TopicSelection { units: vec!["unit1".into(), "unit2".into()], sections: vec![] };
    let pool = resolve_candidates(&index(), &selection).unwrap();
    assert_eq!(pool.len(), 7);
    let sampler = CandidateSampler::new(5);
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let drawn = sampler.draw(&pool, &mut rng);
        assert_eq!(drawn.len(), 5);
        let unique: BTreeSet<_> = drawn.iter().collect();
        assert_eq!(unique.len(), 5, "no replacement within one item");
        assert!(drawn.iter().all(|id| pool.ids().contains(id)));
    }
}

#[test]
fn small_pool_is_drawn_whole() {
    let selection = TopicSelection { units: vec![], sections: vec![SectionRef::new("unit2", "s2")] };
    let pool = resolve_candidates(&index(), &selection).unwrap();
    let drawn: BTreeSet<_> = CandidateSampler::new(5).draw(&pool, &mut StdRng::seed_from_u64(1)).into_iter().collect();
    assert_eq!(drawn, [4, 6].into_iter().collect());
}

#[test]
fn seeded_draws_are_reproducible() {
    let selection = TopicSelection { units: vec!["unit2".into()], sections: vec![] };
    let pool = resolve_candidates(&index(), &selection).unwrap();
    let sampler = CandidateSampler::new(2);
    let a: Vec<_> = (0..5).map(|_| ()).scan(StdRng::seed_from_u64(42), |rng, ()| Some(sampler.draw(&pool, rng))).collect();
    let b: Vec<_> = (0..5).map(|_| ()).scan(StdRng::seed_from_u64(42), |rng, ()| Some(sampler.draw(&pool, rng))).collect();
    assert_eq!(a, b);
}

#[test]
fn incomplete_pairs_are_skipped_but_still_block_units() {
    let selection = TopicSelection {
        units: vec!["unit2".to_string()],
        sections: vec![
            SectionRef { unit: Some("unit1".to_string()), section: None },
            SectionRef { unit: None, section: Some("s1".to_string()) },
            SectionRef::new("unit1", "s2"),
        ],
    };
    assert_eq!(ids(&selection), [1, 2].into_iter().collect());

    let only_incomplete = TopicSelection {
        units: vec!["unit2".to_string()],
        sections: vec![SectionRef { unit: Some("unit1".to_string()), section: None }],
    };
    assert!(matches!(resolve_candidates(&index(), &only_incomplete), Err(Error::EmptyCandidates)));
}
