// Integration tests for distrec
use distrec::prelude::*;
use distrec::{FlatBackend, InMemoryHistories, UserRecommender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::sync::Arc;

fn random_corpus(n: usize, dim: usize, seed: u64) -> Vec<Embedding> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| Embedding::new((0..dim).map(|_| rng.random_range(-1.0f32..1.0f32)).collect()))
        .collect()
}

#[test]
fn test_index_ids_stay_in_corpus() {
    let corpus = random_corpus(200, 16, 1);
    let index = SimilarityIndex::build(&corpus, &IndexConfig::default()).unwrap();

    let queries = random_corpus(10, 16, 2);
    let scores = index.query(&queries, 20).unwrap();
    assert!(!scores.is_empty());
    assert!(scores.ids().all(|id| id < corpus.len()));
}

#[test]
fn test_corpus_scenario_cosine() {
    let corpus = vec![
        Embedding::new(vec![0.0, 0.0]),
        Embedding::new(vec![1.0, 0.0]),
        Embedding::new(vec![0.0, 1.0]),
    ];
    let index = SimilarityIndex::build(&corpus, &IndexConfig::default()).unwrap();
    let scores = index.query(&[Embedding::new(vec![1.0, 0.0])], 2).unwrap();

    let (ids, values) = transform::unpack(&scores);
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], 1);
    assert!((values[0] - 1.0).abs() < 1e-6);
    // zero vector: cosine distance 1.0, same as the orthogonal item
    assert!(ids[1] == 0 || ids[1] == 2);
    assert!(values[1].abs() < 1e-6);
}

#[test]
fn test_max_aggregation_across_history() {
    // every item points away from the queries except item 5
    let mut corpus = random_corpus(10, 3, 3)
        .into_iter()
        .map(|e| Embedding::new(e.as_slice().iter().map(|x| x - 5.0).collect()))
        .collect::<Vec<_>>();
    corpus[5] = Embedding::new(vec![1.0, 0.0, 0.0]);

    let index = SimilarityIndex::<FlatBackend>::build_with(&corpus, &IndexConfig::default()).unwrap();

    let q1 = Embedding::new(vec![1.0, 0.1, 0.0]);
    let q2 = Embedding::new(vec![1.0, 0.3, 0.0]);
    let single_1 = index.query(std::slice::from_ref(&q1), 1).unwrap();
    let single_2 = index.query(std::slice::from_ref(&q2), 1).unwrap();
    assert!(single_1.get(5).unwrap() > single_2.get(5).unwrap());

    let merged = index.query(&[q2, q1], 1).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged.get(5), single_1.get(5));
}

#[test]
fn test_duplicate_history_is_idempotent() {
    let corpus = random_corpus(100, 8, 4);
    let index = Arc::new(SimilarityIndex::build(&corpus, &IndexConfig::default()).unwrap());
    let recommender = EmbeddingRecommender::new(
        index,
        InMemoryEmbeddings::new(corpus),
        RecommenderConfig { k: 5, ..Default::default() },
    )
    .unwrap();

    let once = recommender.recommend(&[7]).unwrap();
    let twice = recommender.recommend(&[7, 7]).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_hnsw_matches_flat_on_small_corpus() {
    let corpus = random_corpus(20, 4, 5);
    let config = IndexConfig::default();
    let hnsw = SimilarityIndex::build(&corpus, &config).unwrap();
    let flat = SimilarityIndex::<FlatBackend>::build_with(&corpus, &config).unwrap();

    let queries = random_corpus(5, 4, 6);
    let a = transform::unpack(&hnsw.query(&queries, 5).unwrap()).0;
    let b = transform::unpack(&flat.query(&queries, 5).unwrap()).0;
    assert_eq!(a, b);
}

#[test]
fn test_end_to_end_top_k() {
    let corpus = random_corpus(300, 12, 7);
    let index = Arc::new(SimilarityIndex::build(&corpus, &IndexConfig::default()).unwrap());
    let recommender = EmbeddingRecommender::new(
        index,
        InMemoryEmbeddings::new(corpus),
        RecommenderConfig { k: 10, sample_weight: 2.0, ..Default::default() },
    )
    .unwrap();

    let history = [3, 14, 159];
    let raw = recommender.recommend(&history).unwrap();
    let picked = finalize(&raw, &history, 10, Selection::TopK).unwrap();

    assert_eq!(picked.len(), 10);
    for id in history {
        assert!(!picked.contains(id));
    }
    let lowest_kept = picked.iter().map(|(_, s)| s).fold(f32::INFINITY, f32::min);
    for (id, score) in transform::exclude(&raw, history).iter() {
        if !picked.contains(id) {
            assert!(score <= lowest_kept);
        }
    }
}

#[test]
fn test_end_to_end_sampling() {
    let corpus = random_corpus(150, 6, 8);
    let index = Arc::new(SimilarityIndex::build(&corpus, &IndexConfig::default()).unwrap());
    let config = RecommenderConfig {
        k: 4,
        sample_weight: 3.0,
        selection: Selection::Sample { seed: 11 },
        ..Default::default()
    };
    let recommender = EmbeddingRecommender::new(index, InMemoryEmbeddings::new(corpus), config).unwrap();

    let first = recommender.recommend_final(&[1, 2]).unwrap();
    let second = recommender.recommend_final(&[1, 2]).unwrap();
    assert_eq!(first.len(), 4);
    assert_eq!(first, second);

    let raw = recommender.recommend(&[1, 2]).unwrap();
    for (id, score) in first.iter() {
        assert_eq!(raw.get(id), Some(score));
    }

    let err = finalize(&raw, &[], raw.len() + 1, Selection::Sample { seed: 1 }).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { .. }));
}

#[test]
fn test_resolution_policies() {
    let corpus = random_corpus(20, 4, 9);
    let index = Arc::new(SimilarityIndex::build(&corpus, &IndexConfig::default()).unwrap());

    let strict = EmbeddingRecommender::new(
        index.clone(),
        InMemoryEmbeddings::new(corpus.clone()),
        RecommenderConfig::default(),
    )
    .unwrap();
    assert!(matches!(strict.recommend(&[1, 500]), Err(Error::NotFound(500))));

    let lenient = EmbeddingRecommender::new(
        index,
        InMemoryEmbeddings::new(corpus),
        RecommenderConfig { resolution: ResolutionPolicy::Skip, ..Default::default() },
    )
    .unwrap();
    assert_eq!(lenient.recommend(&[1, 500]).unwrap(), lenient.recommend(&[1]).unwrap());
}

#[test]
fn test_user_recommender_end_to_end() {
    let corpus = random_corpus(50, 5, 10);
    let index = Arc::new(SimilarityIndex::build(&corpus, &IndexConfig::default()).unwrap());
    let by_history = EmbeddingRecommender::new(
        index,
        InMemoryEmbeddings::new(corpus),
        RecommenderConfig { k: 3, ..Default::default() },
    )
    .unwrap();
    let expected = by_history.recommend(&[4, 9]).unwrap();

    let histories: InMemoryHistories = [(1u64, vec![4, 9])].into_iter().collect();
    let by_user = UserRecommender::new(histories, by_history);
    assert_eq!(by_user.recommend(&1).unwrap(), expected);
}

#[test]
fn test_shared_index_across_threads() {
    let corpus = random_corpus(120, 8, 12);
    let index = Arc::new(SimilarityIndex::build(&corpus, &IndexConfig::default()).unwrap());
    let expected = index.query(&corpus[..3], 5).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let index = index.clone();
            let queries = corpus[..3].to_vec();
            std::thread::spawn(move || index.query(&queries, 5).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_settings_file_drives_pipeline() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "index": {{ "space": "cosine", "m": 8, "ef_construction": 64 }},
             "recommender": {{ "k": 2, "sample_weight": 1.5 }} }}"#
    )
    .unwrap();
    let settings = distrec::Settings::from_json_file(file.path()).unwrap();
    assert_eq!(settings.recommender.fetch_size(), 3);

    let corpus = random_corpus(30, 4, 13);
    let index = Arc::new(SimilarityIndex::build(&corpus, &settings.index).unwrap());
    let recommender =
        EmbeddingRecommender::new(index, InMemoryEmbeddings::new(corpus), settings.recommender).unwrap();

    let raw = recommender.recommend(&[0]).unwrap();
    assert_eq!(raw.len(), 3);
    assert_eq!(recommender.recommend_final(&[0]).unwrap().len(), 2);
}

#[test]
fn test_dimension_mismatch_from_lookup() {
    let corpus = random_corpus(10, 4, 14);
    let index = Arc::new(SimilarityIndex::build(&corpus, &IndexConfig::default()).unwrap());
    let wrong = InMemoryEmbeddings::new(random_corpus(10, 3, 15));
    let recommender = EmbeddingRecommender::new(index, wrong, RecommenderConfig::default()).unwrap();

    assert!(matches!(
        recommender.recommend(&[0]),
        Err(Error::InvalidDimension { expected: 4, actual: 3 })
    ));
}
