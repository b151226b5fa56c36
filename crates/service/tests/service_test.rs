//! Integration tests for the service crate.
//!
//! Trains on an in-memory two-cluster catalog and queries the models
//! through `RecommendationService`.

use data_loader::{DataIndex, Genre, Movie, MovieId, Rating, UserId};
use service::*;
use std::collections::HashSet;
use std::sync::Arc;

/// 40 users, 30 movies. Movies 1-15 are comedies loved by odd users,
/// movies 16-30 are horror films loved by even users.
fn create_test_index() -> DataIndex {
    let movies = (1..=30u32)
        .map(|id| Movie {
            id,
            title: if id <= 15 {
                format!("Funny Movie {} (2001)", id)
            } else {
                format!("Scary Movie {} (2002)", id)
            },
            year: Some(if id <= 15 { 2001 } else { 2002 }),
            genres: vec![if id <= 15 { Genre::Comedy } else { Genre::Horror }],
        })
        .collect();

    let mut ratings = Vec::new();
    for user in 1..=40u32 {
        let own_start = if user % 2 == 1 { 1 } else { 16 };
        let other_start = if user % 2 == 1 { 16 } else { 1 };
        for i in 0..10u32 {
            ratings.push(rating(user, own_start + (user + i) % 15, 4.5));
        }
        for i in 0..2u32 {
            ratings.push(rating(user, other_start + (user + i) % 15, 1.5));
        }
    }

    DataIndex::from_parts(movies, ratings, vec![])
}

fn rating(user_id: UserId, movie_id: MovieId, rating: f32) -> Rating {
    Rating {
        user_id,
        movie_id,
        rating,
        timestamp: 0,
    }
}

fn create_test_service() -> (RecommendationService, TrainingSummary) {
    let index = create_test_index();
    let (models, summary) = fit_models(&TrainingConfig::default(), &index).unwrap();
    let service = RecommendationService::new(ModelHandle::with_models(models), Arc::new(index));
    (service, summary)
}

fn temp_model_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("movie-recs-service-{}-{}", name, std::process::id()))
}

#[test]
fn test_fit_models_uses_configured_parameters() {
    let (_, summary) = create_test_service();

    assert_eq!(summary.neighbors, DEFAULT_NEIGHBORS);
    assert_eq!(summary.blend_weight, 0.7);
    assert!(summary.neighbor_tuning.is_none());
    assert!(summary.weight_tuning.is_none());
    assert_eq!(summary.excluded_users, 0);
    assert_eq!(summary.train_ratings + summary.test_ratings, 40 * 12);
}

#[test]
fn test_fit_models_shares_one_training_matrix() {
    let (models, summary) = fit_models(&TrainingConfig::default(), &create_test_index()).unwrap();

    let collaborative = models.collaborative.matrix_arc();
    assert!(Arc::ptr_eq(&collaborative, &models.hybrid.collaborative().matrix_arc()));
    assert_eq!(collaborative.nnz(), summary.train_ratings);
}

#[test]
fn test_user_recommendations_are_enriched() {
    let (service, _) = create_test_service();
    let recs = service.recommend_for_user(1, 5).unwrap();

    assert!(!recs.collaborative.is_empty());
    assert!(!recs.hybrid.is_empty());
    assert!(recs.hybrid.len() <= 5);

    for rec in &recs.hybrid {
        assert!(rec.title.contains("Movie"));
        assert_eq!(rec.genres.len(), 1);
        assert!((0.0..=1.0).contains(&rec.score));
    }

    let ids: HashSet<MovieId> = recs.collaborative.iter().map(|r| r.movie_id).collect();
    assert_eq!(ids.len(), recs.collaborative.len());
}

#[test]
fn test_unknown_user_falls_back_to_popularity() {
    let (service, _) = create_test_service();
    let recs = service.recommend_for_user(999, 5).unwrap();

    assert!(recs.collaborative.is_empty());
    let scores: Vec<f64> = recs.hybrid.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![5.0, 4.0, 3.0, 2.0, 1.0]);
}

#[test]
fn test_similar_movies_stay_in_genre() {
    let (service, _) = create_test_service();
    let similar = service.similar_movies(3, 5).unwrap();

    assert_eq!(similar.len(), 5);
    for movie in &similar {
        assert_ne!(movie.movie_id, 3);
        assert_eq!(movie.genres, vec!["Comedy".to_string()]);
    }

    assert!(service.similar_movies(999, 5).unwrap().is_empty());
}

#[test]
fn test_search_caps_results() {
    let (service, _) = create_test_service();

    let results = service.search_titles("funny");
    assert_eq!(results.len(), MAX_SEARCH_RESULTS);
    assert_eq!(results[0].movie_id, 1);

    assert_eq!(service.search_titles("scary movie 30").len(), 1);
    assert!(service.search_titles("x").is_empty());
}

#[test]
fn test_models_round_trip_through_directory() {
    let index = create_test_index();
    let (models, _) = fit_models(&TrainingConfig::default(), &index).unwrap();
    let dir = temp_model_dir("round-trip");

    models.save_to_dir(&dir).unwrap();
    let handle = ModelHandle::new();
    assert!(!handle.is_loaded());
    handle.load_from_dir(&dir).unwrap();

    let index = Arc::new(index);
    let original = RecommendationService::new(ModelHandle::with_models(models), Arc::clone(&index));
    let reloaded = RecommendationService::new(handle, index);
    for user in [1, 2, 17] {
        assert_eq!(
            original.recommend_for_user(user, 10).unwrap(),
            reloaded.recommend_for_user(user, 10).unwrap()
        );
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_model_dir_is_an_error() {
    let handle = ModelHandle::new();
    let result = handle.load_from_dir(&temp_model_dir("missing"));
    assert!(result.is_err());
    assert!(!handle.is_loaded());
}

#[test]
fn test_swap_leaves_existing_snapshot_usable() {
    let index = create_test_index();
    let (first, _) = fit_models(&TrainingConfig::default(), &index).unwrap();
    let (second, _) = fit_models(&TrainingConfig::default().with_neighbors(5), &index).unwrap();

    let handle = ModelHandle::with_models(first);
    let snapshot = handle.current().unwrap();
    let previous = handle.swap(second).unwrap();

    assert!(Arc::ptr_eq(&snapshot, &previous));
    assert_eq!(snapshot.collaborative.k(), DEFAULT_NEIGHBORS);
    assert_eq!(handle.current().unwrap().collaborative.k(), 5);
}

#[test]
fn test_tuning_records_both_searches() {
    let index = create_test_index();
    let config = TrainingConfig::default().with_tuning(true);
    let (models, summary) = fit_models(&config, &index).unwrap();

    let k_report = summary.neighbor_tuning.unwrap();
    let w_report = summary.weight_tuning.unwrap();
    assert_eq!(summary.neighbors, k_report.best);
    assert_eq!(summary.blend_weight, w_report.best);
    assert_eq!(models.collaborative.k(), k_report.best);
    assert_eq!(models.hybrid.blend_weight(), w_report.best);
}

#[test]
fn test_evaluate_index_reports_both_models() {
    let index = create_test_index();
    let summary = evaluate_index(&TrainingConfig::default(), &index).unwrap();

    for report in [&summary.collaborative, &summary.hybrid] {
        assert!((0.0..=1.0).contains(&report.precision));
        assert!((0.0..=1.0).contains(&report.recall));
        assert!((0.0..=1.0).contains(&report.hit_rate));
        assert!(report.sampled_users > 0);
    }
}
