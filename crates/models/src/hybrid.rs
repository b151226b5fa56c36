//! Weighted blend of collaborative and content-based rankings.
//!
//! ## Query
//! 1. Ask the collaborative model for `2n` candidates. Unknown user: answer
//!    from the popularity ranking instead (synthetic scores `n, n-1, .., 1`)
//! 2. Find the user's highest-rated training item. None rated: return the
//!    collaborative top `n`
//! 3. Ask the content model for `2n` items similar to it. None: return the
//!    collaborative top `n`
//! 4. Divide each side by its own maximum
//! 5. Outer-join on movie id, a missing side counts as 0
//! 6. `score = w * collaborative + (1 - w) * content`, highest first

use crate::collaborative::{NeighborModel, rated_items};
use crate::content::ContentModel;
use crate::error::{ModelError, RecommendError, Result};
use crate::popularity::PopularityRanking;
use crate::types::{QueryResult, Recommendation, Recommender, sort_by_score_desc};
use data_loader::{MovieId, Rating, UserId, UserItemMatrix};
use features::MovieFeatures;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub const DEFAULT_BLEND_WEIGHT: f64 = 0.7;
pub const DEFAULT_HYBRID_NEIGHBORS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridConfig {
    /// Weight of the collaborative side, in [0, 1] (default: 0.7)
    pub blend_weight: f64,
    /// Neighbor count of the inner collaborative model (default: 20)
    pub neighbors: usize,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            blend_weight: DEFAULT_BLEND_WEIGHT,
            neighbors: DEFAULT_HYBRID_NEIGHBORS,
        }
    }
}

impl HybridConfig {
    pub fn with_blend_weight(mut self, blend_weight: f64) -> Self {
        self.blend_weight = blend_weight;
        self
    }

    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.neighbors = neighbors;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridModel {
    blend_weight: f64,
    collaborative: NeighborModel,
    content: ContentModel,
    popularity: PopularityRanking,
}

impl HybridModel {
    /// Fit both component models and the popularity ranking.
    ///
    /// `train` should be the same ratings `matrix` was built from.
    pub fn fit(
        matrix: Arc<UserItemMatrix>,
        features: MovieFeatures,
        train: &[Rating],
        config: HybridConfig,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.blend_weight) {
            return Err(ModelError::InvalidParameter {
                name: "blend_weight",
                reason: format!("{} is outside [0, 1]", config.blend_weight),
            });
        }

        let collaborative = NeighborModel::fit(matrix, config.neighbors)?;
        let content = ContentModel::fit(features)?;
        let popularity = PopularityRanking::from_ratings(train);

        info!(
            "Fitted hybrid model (blend_weight={}, neighbors={}, {} ranked movies)",
            config.blend_weight,
            config.neighbors,
            popularity.len()
        );

        Ok(Self {
            blend_weight: config.blend_weight,
            collaborative,
            content,
            popularity,
        })
    }

    pub fn blend_weight(&self) -> f64 {
        self.blend_weight
    }

    pub fn collaborative(&self) -> &NeighborModel {
        &self.collaborative
    }

    pub fn content(&self) -> &ContentModel {
        &self.content
    }

    pub fn popularity(&self) -> &PopularityRanking {
        &self.popularity
    }

    /// Most popular items the user has not rated, scored `n, n-1, ..`
    fn popularity_fallback(&self, user_id: UserId, n: usize) -> QueryResult {
        let seen: HashSet<MovieId> = rated_items(self.collaborative.matrix(), user_id)
            .into_iter()
            .collect();

        let recommendations = self
            .popularity
            .top(n, &seen)
            .into_iter()
            .enumerate()
            .map(|(rank, movie_id)| Recommendation::new(movie_id, (n - rank) as f64))
            .collect();
        QueryResult::from_recommendations(recommendations)
    }

    /// First item holding the user's maximum rating, if that maximum is positive
    fn top_rated_item(&self, user_id: UserId) -> Option<MovieId> {
        let matrix = self.collaborative.matrix();
        let row = matrix.user_row(user_id)?;

        let mut best: Option<(usize, f32)> = None;
        for (col, &rating) in row.iter().enumerate() {
            if best.is_none_or(|(_, max)| rating > max) {
                best = Some((col, rating));
            }
        }

        match best {
            Some((col, max)) if max > 0.0 => Some(matrix.items()[col]),
            _ => None,
        }
    }

    fn blend(
        &self,
        collaborative: &[Recommendation],
        content: &[Recommendation],
        n: usize,
    ) -> Vec<Recommendation> {
        let mut joined: BTreeMap<MovieId, (f64, f64)> = BTreeMap::new();
        for (movie_id, score) in normalize(collaborative) {
            joined.entry(movie_id).or_insert((0.0, 0.0)).0 = score;
        }
        for (movie_id, score) in normalize(content) {
            joined.entry(movie_id).or_insert((0.0, 0.0)).1 = score;
        }

        let w = self.blend_weight;
        let mut blended: Vec<Recommendation> = joined
            .into_iter()
            .map(|(movie_id, (cf, cb))| Recommendation::new(movie_id, w * cf + (1.0 - w) * cb))
            .collect();

        sort_by_score_desc(&mut blended, |r| r.score);
        blended.truncate(n);
        blended
    }
}

impl Recommender for HybridModel {
    fn name(&self) -> &str {
        "hybrid"
    }

    #[instrument(skip(self), fields(blend_weight = self.blend_weight))]
    fn try_recommend(
        &self,
        user_id: UserId,
        n: usize,
    ) -> std::result::Result<QueryResult, RecommendError> {
        if n == 0 {
            return Ok(QueryResult::NotFound);
        }

        let candidates = n.saturating_mul(2);
        let collaborative = match self.collaborative.try_recommend(user_id, candidates)? {
            QueryResult::Found(recs) => recs,
            QueryResult::NotFound => {
                debug!("No collaborative candidates for user {}, using popularity", user_id);
                return Ok(self.popularity_fallback(user_id, n));
            }
        };

        let cf_top_n = || {
            QueryResult::from_recommendations(collaborative.iter().take(n).copied().collect())
        };

        let Some(anchor) = self.top_rated_item(user_id) else {
            return Ok(cf_top_n());
        };

        let content = match self.content.recommend_similar(anchor, candidates) {
            QueryResult::Found(recs) => recs,
            QueryResult::NotFound => {
                debug!("Movie {} has no content neighbors", anchor);
                return Ok(cf_top_n());
            }
        };

        Ok(QueryResult::from_recommendations(self.blend(&collaborative, &content, n)))
    }
}

/// Scores divided by their maximum. A non-positive or non-finite maximum
/// maps every score to 0.
fn normalize(recs: &[Recommendation]) -> Vec<(MovieId, f64)> {
    let max = recs.iter().map(|r| r.score).fold(f64::NEG_INFINITY, f64::max);
    let valid = max.is_finite() && max > 0.0;
    recs.iter()
        .map(|r| (r.movie_id, if valid { r.score / max } else { 0.0 }))
        .collect()
}
