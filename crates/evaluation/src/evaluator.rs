//! Offline precision / recall / hit-rate on the held-out split.

use crate::metrics::{precision_at_k, recall_at_k};
use data_loader::{MovieId, Rating, UserId};
use models::{QueryResult, Recommender};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// How many evaluated users get a detailed debug line
const DETAILED_USERS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationConfig {
    /// Recommendations requested per user (default: 10)
    pub k: usize,
    /// Minimum test rating that counts as "liked" (default: 3.5)
    pub threshold: f32,
    /// Upper bound on sampled users (default: 50)
    pub max_users: usize,
    /// Users with fewer test ratings are skipped (default: 2)
    pub min_test_ratings: usize,
    /// Seed for the user sample (default: 42)
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            k: 10,
            threshold: 3.5,
            max_users: 50,
            min_test_ratings: 2,
            seed: 42,
        }
    }
}

impl EvaluationConfig {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_users(mut self, max_users: usize) -> Self {
        self.max_users = max_users;
        self
    }

    pub fn with_min_test_ratings(mut self, min_test_ratings: usize) -> Self {
        self.min_test_ratings = min_test_ratings;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub k: usize,
    /// Mean precision@k over evaluated users
    pub precision: f64,
    /// Mean recall@k over evaluated users
    pub recall: f64,
    /// Users with at least one hit / (sampled - failed)
    pub hit_rate: f64,
    pub sampled_users: usize,
    pub evaluated_users: usize,
    /// Too few test ratings, nothing liked, or no recommendation
    pub skipped_users: usize,
    /// The model raised an internal error for these users
    pub failed_users: usize,
}

/// Per-user outcome
enum UserOutcome {
    Evaluated { precision: f64, recall: f64 },
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvaluationConfig,
}

impl Evaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluate `model` against held-out `test` ratings.
    ///
    /// A per-user failure is logged and counted, never returned.
    #[instrument(skip(self, model, test), fields(model = model.name(), k = self.config.k))]
    pub fn evaluate<R: Recommender + ?Sized>(
        &self,
        model: &R,
        test: &[Rating],
    ) -> EvaluationReport {
        let (users, by_user) = group_by_user(test);
        info!("Evaluating on {} test users", users.len());

        let sample = self.sample_users(users);

        let mut precisions = Vec::new();
        let mut recalls = Vec::new();
        let mut hits = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;

        for &user_id in &sample {
            match self.evaluate_user(model, user_id, &by_user[&user_id], precisions.len()) {
                UserOutcome::Evaluated { precision, recall } => {
                    if precision > 0.0 {
                        hits += 1;
                    }
                    precisions.push(precision);
                    recalls.push(recall);
                }
                UserOutcome::Skipped => skipped += 1,
                UserOutcome::Failed => failed += 1,
            }
        }

        let counted = sample.len() - failed;
        let report = EvaluationReport {
            k: self.config.k,
            precision: mean(&precisions),
            recall: mean(&recalls),
            hit_rate: if counted == 0 {
                0.0
            } else {
                hits as f64 / counted as f64
            },
            sampled_users: sample.len(),
            evaluated_users: precisions.len(),
            skipped_users: skipped,
            failed_users: failed,
        };

        info!(
            "Evaluation results on {} valid users: hit_rate={:.4}, precision@{}={:.4}, recall@{}={:.4}",
            report.evaluated_users,
            report.hit_rate,
            report.k,
            report.precision,
            report.k,
            report.recall
        );
        report
    }

    /// Seeded sample without replacement, at most `max_users`
    fn sample_users(&self, mut users: Vec<UserId>) -> Vec<UserId> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        users.shuffle(&mut rng);
        users.truncate(self.config.max_users);
        users
    }

    fn evaluate_user<R: Recommender + ?Sized>(
        &self,
        model: &R,
        user_id: UserId,
        ratings: &[&Rating],
        evaluated_so_far: usize,
    ) -> UserOutcome {
        if ratings.len() < self.config.min_test_ratings {
            return UserOutcome::Skipped;
        }

        let liked: Vec<MovieId> = ratings
            .iter()
            .filter(|r| r.rating >= self.config.threshold)
            .map(|r| r.movie_id)
            .collect();
        if liked.is_empty() {
            return UserOutcome::Skipped;
        }
        let liked_set: HashSet<MovieId> = liked.iter().copied().collect();

        let recommended = match model.try_recommend(user_id, self.config.k) {
            Ok(QueryResult::Found(recs)) => {
                recs.into_iter().map(|r| r.movie_id).collect::<Vec<_>>()
            }
            Ok(QueryResult::NotFound) => return UserOutcome::Skipped,
            Err(e) => {
                warn!("Error evaluating user {}: {}", user_id, e);
                return UserOutcome::Failed;
            }
        };

        let precision = precision_at_k(&recommended, &liked_set, self.config.k);
        let recall = recall_at_k(&recommended, &liked_set, self.config.k);

        if evaluated_so_far < DETAILED_USERS {
            debug!(
                "User {}: recommended {:?}, liked {:?}, precision={:.4}, recall={:.4}",
                user_id,
                &recommended[..recommended.len().min(5)],
                &liked[..liked.len().min(5)],
                precision,
                recall
            );
        }

        UserOutcome::Evaluated { precision, recall }
    }
}

/// Users in order of first appearance, plus each user's test ratings
fn group_by_user(test: &[Rating]) -> (Vec<UserId>, HashMap<UserId, Vec<&Rating>>) {
    let mut order = Vec::new();
    let mut groups: HashMap<UserId, Vec<&Rating>> = HashMap::new();
    for rating in test {
        groups
            .entry(rating.user_id)
            .or_insert_with(|| {
                order.push(rating.user_id);
                Vec::new()
            })
            .push(rating);
    }
    (order, groups)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{RecommendError, Recommendation};

    /// Recommends a fixed list to every user; user 666 triggers an error
    struct FixedModel(Vec<MovieId>);

    impl Recommender for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        fn try_recommend(&self, user_id: UserId, n: usize) -> Result<QueryResult, RecommendError> {
            if user_id == 666 {
                return Err(RecommendError::InconsistentModel("boom".to_string()));
            }
            Ok(QueryResult::from_recommendations(
                self.0.iter().take(n).map(|&m| Recommendation::new(m, 1.0)).collect(),
            ))
        }
    }

    fn rating(user_id: UserId, movie_id: MovieId, rating: f32) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating,
            timestamp: 0,
        }
    }

    #[test]
    fn test_group_by_user_keeps_first_appearance_order() {
        let test = [rating(5, 1, 4.0), rating(2, 1, 4.0), rating(5, 2, 3.0)];
        let (order, groups) = group_by_user(&test);
        assert_eq!(order, vec![5, 2]);
        assert_eq!(groups[&5].len(), 2);
    }

    #[test]
    fn test_metrics_and_skips() {
        let test = vec![
            // Hit: likes 1, gets 1
            rating(1, 1, 5.0),
            rating(1, 9, 2.0),
            // Miss: likes 7 only
            rating(2, 7, 4.0),
            rating(2, 8, 1.0),
            // Skipped: a single test rating
            rating(3, 1, 5.0),
            // Skipped: nothing liked
            rating(4, 1, 2.0),
            rating(4, 2, 1.0),
        ];
        let model = FixedModel(vec![1, 2]);
        let report = Evaluator::default().evaluate(&model, &test);

        assert_eq!(report.sampled_users, 4);
        assert_eq!(report.evaluated_users, 2);
        assert_eq!(report.skipped_users, 2);
        assert_eq!(report.failed_users, 0);
        // precision: (1/2 + 0) / 2
        assert_eq!(report.precision, 0.25);
        assert_eq!(report.recall, 0.5);
        // 1 hit over 4 sampled users
        assert_eq!(report.hit_rate, 0.25);
    }

    #[test]
    fn test_failures_excluded_from_hit_rate() {
        let test = vec![
            rating(1, 1, 5.0),
            rating(1, 2, 5.0),
            rating(666, 1, 5.0),
            rating(666, 2, 5.0),
        ];
        let report = Evaluator::default().evaluate(&FixedModel(vec![1]), &test);

        assert_eq!(report.failed_users, 1);
        assert_eq!(report.evaluated_users, 1);
        assert_eq!(report.hit_rate, 1.0);
    }

    #[test]
    fn test_sample_is_bounded_and_deterministic() {
        let evaluator = Evaluator::new(EvaluationConfig::default().with_max_users(3));
        let users: Vec<UserId> = (1..=20).collect();

        let first = evaluator.sample_users(users.clone());
        let second = evaluator.sample_users(users);
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_test_set() {
        let report = Evaluator::default().evaluate(&FixedModel(vec![1]), &[]);
        assert_eq!(report.hit_rate, 0.0);
        assert_eq!(report.precision, 0.0);
    }
}
