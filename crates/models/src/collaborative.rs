//! User-based nearest-neighbor collaborative filtering.
//!
//! ## Algorithm
//! 1. Cosine similarity between the target's rating row and every other row
//!    (a zero row is similarity 0 to everything)
//! 2. Keep the `k` most similar users, the target never among them
//! 3. For every item a neighbor rated that the target has not, add the
//!    neighbor's rating to the item's score (equal weights, no distance decay)
//! 4. Nothing to score: fall back to the item column means
//! 5. Sort descending (ties keep first-encounter order) and take `n`

use crate::error::{ModelError, RecommendError, Result};
use crate::types::{QueryResult, Recommendation, Recommender, sort_by_score_desc};
use data_loader::{MovieId, UserId, UserItemMatrix};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredNeighborModel", into = "StoredNeighborModel")]
pub struct NeighborModel {
    k: usize,
    matrix: Arc<UserItemMatrix>,
    /// L2 norm of every matrix row
    norms: Vec<f64>,
}

/// On-disk form; row norms are recomputed on load
#[derive(Serialize, Deserialize)]
struct StoredNeighborModel {
    k: usize,
    matrix: UserItemMatrix,
}

impl NeighborModel {
    /// Fit on a user-item matrix with `k` neighbors per query.
    pub fn fit(matrix: Arc<UserItemMatrix>, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(ModelError::InvalidParameter {
                name: "k",
                reason: "neighbor count must be at least 1".to_string(),
            });
        }
        if matrix.n_users() == 0 || matrix.n_items() == 0 {
            return Err(ModelError::EmptyTrainingSet {
                model: "collaborative",
            });
        }

        let norms = (0..matrix.n_users())
            .into_par_iter()
            .map(|row| l2_norm(matrix.row(row)))
            .collect();

        debug!(
            "Fitted neighbor model with k={} on {} users x {} items",
            k,
            matrix.n_users(),
            matrix.n_items()
        );
        Ok(Self { k, matrix, norms })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn matrix(&self) -> &UserItemMatrix {
        &self.matrix
    }

    /// Shared handle to the training matrix
    pub fn matrix_arc(&self) -> Arc<UserItemMatrix> {
        Arc::clone(&self.matrix)
    }

    /// Up to `k` nearest users to the row at `target`, nearest first.
    /// Equal similarities keep row order.
    fn nearest_neighbors(&self, target: usize) -> Vec<(usize, f64)> {
        let target_row = self.matrix.row(target);
        let target_norm = self.norms[target];

        let mut similarities: Vec<(usize, f64)> = (0..self.matrix.n_users())
            .into_par_iter()
            .filter(|&row| row != target)
            .map(|row| {
                let norm = self.norms[row];
                let similarity = if target_norm == 0.0 || norm == 0.0 {
                    0.0
                } else {
                    dot(target_row, self.matrix.row(row)) / (target_norm * norm)
                };
                (row, similarity)
            })
            .collect();

        sort_by_score_desc(&mut similarities, |&(_, s)| s);
        similarities.truncate(self.k);
        similarities
    }

    /// Sum of neighbor ratings per unrated item, in first-encounter order
    fn neighbor_votes(&self, target_row: &[f32], neighbors: &[(usize, f64)]) -> Vec<(usize, f64)> {
        let mut votes: Vec<(usize, f64)> = Vec::new();
        let mut positions: HashMap<usize, usize> = HashMap::new();

        for &(neighbor, _) in neighbors {
            for (col, &rating) in self.matrix.row(neighbor).iter().enumerate() {
                if rating > 0.0 && target_row[col] <= 0.0 {
                    let pos = *positions.entry(col).or_insert_with(|| {
                        votes.push((col, 0.0));
                        votes.len() - 1
                    });
                    votes[pos].1 += rating as f64;
                }
            }
        }
        votes
    }

    /// Items by column mean (zeros included), skipping rated and non-positive ones
    fn column_mean_fallback(&self, target_row: &[f32], n: usize) -> Vec<(usize, f64)> {
        let mut means: Vec<(usize, f64)> =
            self.matrix.column_means().into_iter().enumerate().collect();
        sort_by_score_desc(&mut means, |&(_, m)| m);

        means
            .into_iter()
            .filter(|&(col, mean)| target_row[col] <= 0.0 && mean > 0.0)
            .take(n)
            .collect()
    }

    fn check_consistency(&self) -> std::result::Result<(), RecommendError> {
        if !self.matrix.is_consistent() {
            return Err(RecommendError::InconsistentModel(
                "user-item matrix storage does not match its shape".to_string(),
            ));
        }
        if self.norms.len() != self.matrix.n_users() {
            return Err(RecommendError::InconsistentModel(format!(
                "{} row norms for {} users",
                self.norms.len(),
                self.matrix.n_users()
            )));
        }
        Ok(())
    }
}

impl Recommender for NeighborModel {
    fn name(&self) -> &str {
        "collaborative"
    }

    #[instrument(skip(self), fields(k = self.k))]
    fn try_recommend(
        &self,
        user_id: UserId,
        n: usize,
    ) -> std::result::Result<QueryResult, RecommendError> {
        let Some(target) = self.matrix.user_position(user_id) else {
            debug!("User {} not found in training data", user_id);
            return Ok(QueryResult::NotFound);
        };
        if n == 0 {
            return Ok(QueryResult::NotFound);
        }
        self.check_consistency()?;

        let target_row = self.matrix.row(target);
        let neighbors = self.nearest_neighbors(target);
        let mut scored = self.neighbor_votes(target_row, &neighbors);

        if scored.is_empty() {
            debug!("No neighbor candidates for user {}, using item means", user_id);
            scored = self.column_mean_fallback(target_row, n);
        }

        sort_by_score_desc(&mut scored, |&(_, s)| s);
        scored.truncate(n);

        let items = self.matrix.items();
        let recommendations = scored
            .into_iter()
            .map(|(col, score)| Recommendation::new(items[col], score))
            .collect();

        Ok(QueryResult::from_recommendations(recommendations))
    }
}

impl TryFrom<StoredNeighborModel> for NeighborModel {
    type Error = ModelError;

    fn try_from(stored: StoredNeighborModel) -> Result<Self> {
        NeighborModel::fit(Arc::new(stored.matrix), stored.k)
    }
}

impl From<NeighborModel> for StoredNeighborModel {
    fn from(model: NeighborModel) -> Self {
        StoredNeighborModel {
            k: model.k,
            matrix: Arc::unwrap_or_clone(model.matrix),
        }
    }
}

/// Items the user rated above zero in the training matrix
pub fn rated_items(matrix: &UserItemMatrix, user_id: UserId) -> Vec<MovieId> {
    let Some(row) = matrix.user_row(user_id) else {
        return Vec::new();
    };
    row.iter()
        .zip(matrix.items())
        .filter(|(rating, _)| **rating > 0.0)
        .map(|(_, &movie_id)| movie_id)
        .collect()
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| x as f64 * y as f64).sum()
}

fn l2_norm(row: &[f32]) -> f64 {
    dot(row, row).sqrt()
}
