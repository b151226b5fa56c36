//! Per-user train/test split and user-item matrix construction.
//!
//! Policy: a user needs at least [`MIN_USER_RATINGS`] ratings to take part in
//! training or evaluation at all. Users below that are dropped from both
//! partitions, not silently folded into one of them.

use crate::error::{DataLoadError, Result};
use crate::matrix::UserItemMatrix;
use crate::types::{Rating, UserId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use tracing::info;

/// Users with fewer ratings than this are excluded from both partitions
pub const MIN_USER_RATINGS: usize = 5;

/// Larger requested test fractions are clamped to this
pub const MAX_TEST_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    /// Share of each user's ratings held out for testing (default 0.2)
    pub test_fraction: f64,
    /// Seed for the per-user permutation (default 42)
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Output of [`prepare_data`]
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub train: Vec<Rating>,
    pub test: Vec<Rating>,
    /// Built from `train` only
    pub matrix: UserItemMatrix,
    /// Users dropped for having fewer than [`MIN_USER_RATINGS`] ratings
    pub excluded_users: usize,
}

/// Split ratings per user and pivot the training half into a matrix.
pub fn prepare_data(ratings: &[Rating], config: &SplitConfig) -> Result<PreparedData> {
    let (train, test, excluded_users) = train_test_split(ratings, config)?;

    info!(
        "Split data into {} training and {} testing samples ({} users excluded with < {} ratings)",
        train.len(),
        test.len(),
        excluded_users,
        MIN_USER_RATINGS
    );

    let matrix = UserItemMatrix::from_ratings(&train);
    info!(
        "Built user-item matrix: {} users x {} items ({} ratings)",
        matrix.n_users(),
        matrix.n_items(),
        matrix.nnz()
    );

    Ok(PreparedData {
        train,
        test,
        matrix,
        excluded_users,
    })
}

/// Returns `(train, test, excluded_user_count)`.
///
/// Each eligible user's ratings are permuted with an RNG seeded by
/// `config.seed` (the same seed for every user); the first
/// `ceil(fraction * n)` go to test, the rest to train.
pub fn train_test_split(
    ratings: &[Rating],
    config: &SplitConfig,
) -> Result<(Vec<Rating>, Vec<Rating>, usize)> {
    if !(config.test_fraction > 0.0 && config.test_fraction < 1.0) {
        return Err(DataLoadError::InvalidValue {
            field: "test_fraction".to_string(),
            value: config.test_fraction.to_string(),
        });
    }
    let fraction = config.test_fraction.min(MAX_TEST_FRACTION);

    let mut by_user: BTreeMap<UserId, Vec<Rating>> = BTreeMap::new();
    for rating in ratings {
        by_user.entry(rating.user_id).or_default().push(*rating);
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    let mut excluded = 0;

    for user_ratings in by_user.values() {
        let n = user_ratings.len();
        if n < MIN_USER_RATINGS {
            excluded += 1;
            continue;
        }

        let n_test = (fraction * n as f64).ceil() as usize;
        let mut permutation: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(config.seed);
        permutation.shuffle(&mut rng);

        test.extend(permutation[..n_test].iter().map(|&i| user_ratings[i]));
        train.extend(permutation[n_test..].iter().map(|&i| user_ratings[i]));
    }

    if train.is_empty() {
        return Err(DataLoadError::ValidationError(format!(
            "no user has at least {MIN_USER_RATINGS} ratings"
        )));
    }

    Ok((train, test, excluded))
}
