//! Item-to-item content similarity.
//!
//! `fit` precomputes cosine similarity for every pair of catalog items and
//! stores it as a packed upper triangle, so the table is symmetric by
//! construction. Memory grows with the square of the catalog, which is why
//! catalogs above [`MAX_CATALOG_ITEMS`] are rejected. Feature vectors are
//! sparse, so each pair costs a merge over the non-zero entries only and the
//! stored model holds just those entries.

use crate::error::{ModelError, Result};
use crate::types::{QueryResult, Recommendation, sort_by_score_desc};
use data_loader::MovieId;
use features::{MovieFeatures, SparseVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Largest catalog the pairwise table is built for (~800 MB of `f32`)
pub const MAX_CATALOG_ITEMS: usize = 20_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "MovieFeatures", into = "MovieFeatures")]
pub struct ContentModel {
    features: MovieFeatures,
    positions: HashMap<MovieId, usize>,
    /// Whether each item's vector has non-zero length
    non_zero: Vec<bool>,
    /// Pairs (i, j) with i < j, row by row
    similarities: Vec<f32>,
}

impl ContentModel {
    #[instrument(skip(features), fields(items = features.len()))]
    pub fn fit(features: MovieFeatures) -> Result<Self> {
        let n = features.len();
        if n == 0 {
            return Err(ModelError::EmptyTrainingSet { model: "content" });
        }
        if n > MAX_CATALOG_ITEMS {
            return Err(ModelError::CatalogTooLarge {
                items: n,
                max: MAX_CATALOG_ITEMS,
            });
        }
        if features.vectors.len() != n {
            return Err(ModelError::InvalidParameter {
                name: "features",
                reason: format!("{} movie ids but {} vectors", n, features.vectors.len()),
            });
        }

        let expected = features.dimension();
        for (movie_id, vector) in features.iter() {
            if let Some(max) = vector.max_index().filter(|&i| i as usize >= expected) {
                return Err(ModelError::FeatureDimensionMismatch {
                    movie_id,
                    expected,
                    found: max as usize + 1,
                });
            }
        }

        let mut positions = HashMap::with_capacity(n);
        for (pos, &movie_id) in features.movie_ids.iter().enumerate() {
            if positions.insert(movie_id, pos).is_some() {
                return Err(ModelError::InvalidParameter {
                    name: "features",
                    reason: format!("movie {} appears twice", movie_id),
                });
            }
        }

        let unit: Vec<SparseVector> = features
            .vectors
            .par_iter()
            .map(SparseVector::normalized)
            .collect();
        let non_zero = unit.iter().map(|v| !v.is_zero()).collect();

        let similarities: Vec<f32> = (0..n)
            .into_par_iter()
            .map(|i| {
                (i + 1..n)
                    .map(|j| unit[i].dot(&unit[j]) as f32)
                    .collect::<Vec<f32>>()
            })
            .flatten()
            .collect();

        info!(
            "Computed {} pairwise similarities for {} movies ({} stored feature entries)",
            similarities.len(),
            n,
            features.nnz()
        );

        Ok(Self {
            features,
            positions,
            non_zero,
            similarities,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.positions.contains_key(&movie_id)
    }

    /// Cosine similarity of two catalog items, `None` if either is unknown
    pub fn similarity(&self, a: MovieId, b: MovieId) -> Option<f64> {
        let i = *self.positions.get(&a)?;
        let j = *self.positions.get(&b)?;
        Some(self.similarity_at(i, j))
    }

    fn similarity_at(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return if self.non_zero[i] { 1.0 } else { 0.0 };
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        self.similarities[pair_offset(self.len(), lo, hi)] as f64
    }

    /// The `n` items most similar to `movie_id`, excluding the item itself.
    /// Equal similarities keep catalog order.
    #[instrument(skip(self))]
    pub fn recommend_similar(&self, movie_id: MovieId, n: usize) -> QueryResult {
        let Some(&pos) = self.positions.get(&movie_id) else {
            debug!("Movie {} not in the content catalog", movie_id);
            return QueryResult::NotFound;
        };

        let mut scored: Vec<(usize, f64)> = (0..self.len())
            .filter(|&other| other != pos)
            .map(|other| (other, self.similarity_at(pos, other)))
            .collect();
        sort_by_score_desc(&mut scored, |&(_, s)| s);
        scored.truncate(n);

        let recommendations = scored
            .into_iter()
            .map(|(other, score)| Recommendation::new(self.features.movie_ids[other], score))
            .collect();
        QueryResult::from_recommendations(recommendations)
    }
}

impl TryFrom<MovieFeatures> for ContentModel {
    type Error = ModelError;

    fn try_from(features: MovieFeatures) -> Result<Self> {
        ContentModel::fit(features)
    }
}

impl From<ContentModel> for MovieFeatures {
    fn from(model: ContentModel) -> Self {
        model.features
    }
}

/// Index of pair (i, j), i < j, in the packed upper triangle of an n×n table
fn pair_offset(n: usize, i: usize, j: usize) -> usize {
    i * (2 * n - i - 1) / 2 + (j - i - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_features() -> MovieFeatures {
        MovieFeatures::new(
            vec![10, 20, 30, 40, 50],
            vec![
                vec![1.0, 1.0, 0.0],
                vec![1.0, 1.0, 0.0],
                vec![1.0, 0.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.0, 0.0],
            ],
        )
    }

    #[test]
    fn test_pair_offset_covers_triangle() {
        let n = 5;
        let mut offsets = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                offsets.push(pair_offset(n, i, j));
            }
        }
        assert_eq!(offsets, (0..n * (n - 1) / 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let model = ContentModel::fit(create_test_features()).unwrap();
        for &a in &[10, 20, 30, 40, 50] {
            for &b in &[10, 20, 30, 40, 50] {
                assert_eq!(model.similarity(a, b), model.similarity(b, a));
            }
        }
        assert!((model.similarity(10, 30).unwrap() - 1.0 / 2f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_has_zero_similarity() {
        let model = ContentModel::fit(create_test_features()).unwrap();
        assert_eq!(model.similarity(50, 10), Some(0.0));
        assert_eq!(model.similarity(50, 50), Some(0.0));
    }

    #[test]
    fn test_recommend_similar_excludes_self() {
        let model = ContentModel::fit(create_test_features()).unwrap();
        let result = model.recommend_similar(10, 4);

        assert_eq!(result.movie_ids(), vec![20, 30, 40, 50]);
        assert!((result.recommendations()[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_movie_not_found() {
        let model = ContentModel::fit(create_test_features()).unwrap();
        assert_eq!(model.recommend_similar(99, 5), QueryResult::NotFound);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let features = MovieFeatures::new(vec![1, 2], vec![vec![1.0], vec![0.0, 1.0]]);
        let err = ContentModel::fit(features).unwrap_err();
        assert!(matches!(
            err,
            ModelError::FeatureDimensionMismatch {
                movie_id: 2,
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let err = ContentModel::fit(MovieFeatures::new(vec![], vec![])).unwrap_err();
        assert!(matches!(err, ModelError::EmptyTrainingSet { .. }));
    }

    #[test]
    fn test_wide_sparse_features_stay_compact() {
        let vectors = vec![
            SparseVector::from_entries(vec![(0, 1.0), (999_999, 1.0)]),
            SparseVector::from_entries(vec![(999_999, 2.0)]),
            SparseVector::from_entries(vec![(5, 1.0)]),
        ];
        let features = MovieFeatures::from_sparse(vec![1, 2, 3], 1_000_000, vectors);
        let model = ContentModel::fit(features).unwrap();

        assert!((model.similarity(1, 2).unwrap() - 1.0 / 2f64.sqrt()).abs() < 1e-6);
        assert_eq!(model.similarity(1, 3), Some(0.0));

        let json = serde_json::to_string(&model).unwrap();
        assert!(json.len() < 200, "{} bytes", json.len());
    }
}
