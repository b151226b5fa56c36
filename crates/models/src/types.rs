//! Query results shared by every recommender.

use crate::error::RecommendError;
use data_loader::{MovieId, UserId};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One ranked item. The scale of `score` depends on the model that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub score: f64,
}

impl Recommendation {
    pub fn new(movie_id: MovieId, score: f64) -> Self {
        Self { movie_id, score }
    }
}

/// Outcome of a recommendation query.
///
/// `Found` always holds at least one item; an empty ranking is `NotFound`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Found(Vec<Recommendation>),
    NotFound,
}

impl QueryResult {
    pub fn from_recommendations(recommendations: Vec<Recommendation>) -> Self {
        if recommendations.is_empty() {
            QueryResult::NotFound
        } else {
            QueryResult::Found(recommendations)
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, QueryResult::Found(_))
    }

    /// Ranked items, empty for `NotFound`
    pub fn recommendations(&self) -> &[Recommendation] {
        match self {
            QueryResult::Found(recs) => recs,
            QueryResult::NotFound => &[],
        }
    }

    pub fn movie_ids(&self) -> Vec<MovieId> {
        self.recommendations().iter().map(|r| r.movie_id).collect()
    }

    pub fn into_vec(self) -> Vec<Recommendation> {
        match self {
            QueryResult::Found(recs) => recs,
            QueryResult::NotFound => Vec::new(),
        }
    }
}

/// A model that ranks items for a user.
///
/// `Send + Sync` so trained models can sit behind an `Arc` and serve
/// concurrent readers.
pub trait Recommender: Send + Sync {
    /// Returns the name of this model (for logging)
    fn name(&self) -> &str;

    /// Top-`n` items for `user_id`, surfacing internal inconsistencies as errors.
    fn try_recommend(&self, user_id: UserId, n: usize)
    -> std::result::Result<QueryResult, RecommendError>;

    /// Top-`n` items for `user_id`. Never fails: an internal error is logged
    /// and reported as [`QueryResult::NotFound`].
    fn recommend_items(&self, user_id: UserId, n: usize) -> QueryResult {
        match self.try_recommend(user_id, n) {
            Ok(result) => result,
            Err(e) => {
                warn!(model = self.name(), user_id, "Recommendation failed: {}", e);
                QueryResult::NotFound
            }
        }
    }
}

/// Stable sort by score, highest first. Equal scores keep their input order.
pub(crate) fn sort_by_score_desc<T>(items: &mut [T], score: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));
}
