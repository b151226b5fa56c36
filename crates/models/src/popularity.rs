//! Global popularity ranking used when a user cannot be personalized.

use data_loader::{MovieId, Rating, popularity_score};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::types::sort_by_score_desc;

/// Movies ordered by `rating_count × mean_rating`, highest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularityRanking {
    ranked: Vec<(MovieId, f64)>,
}

impl PopularityRanking {
    /// Rank every movie that appears in `ratings`. Equal scores keep
    /// ascending movie id order.
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let mut totals: BTreeMap<MovieId, (f64, u32)> = BTreeMap::new();
        for r in ratings {
            let entry = totals.entry(r.movie_id).or_insert((0.0, 0));
            entry.0 += r.rating as f64;
            entry.1 += 1;
        }

        let mut ranked: Vec<(MovieId, f64)> = totals
            .into_iter()
            .map(|(movie_id, (sum, count))| {
                let mean = (sum / count as f64) as f32;
                (movie_id, popularity_score(mean, count) as f64)
            })
            .collect();
        sort_by_score_desc(&mut ranked, |&(_, score)| score);

        Self { ranked }
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// `(movie_id, popularity)` pairs, most popular first
    pub fn ranked(&self) -> &[(MovieId, f64)] {
        &self.ranked
    }

    /// The `n` most popular movies not in `exclude`
    pub fn top(&self, n: usize, exclude: &HashSet<MovieId>) -> Vec<MovieId> {
        self.ranked
            .iter()
            .map(|&(movie_id, _)| movie_id)
            .filter(|movie_id| !exclude.contains(movie_id))
            .take(n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(user_id: u32, movie_id: MovieId, rating: f32) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating,
            timestamp: 0,
        }
    }

    #[test]
    fn test_count_times_mean_ordering() {
        let ranking = PopularityRanking::from_ratings(&[
            // Movie 1: one 5-star rating -> 5
            rating(1, 1, 5.0),
            // Movie 2: three 3-star ratings -> 9
            rating(1, 2, 3.0),
            rating(2, 2, 3.0),
            rating(3, 2, 3.0),
            // Movie 3: two 4-star ratings -> 8
            rating(1, 3, 4.0),
            rating(2, 3, 4.0),
        ]);

        assert_eq!(ranking.ranked(), &[(2, 9.0), (3, 8.0), (1, 5.0)]);
    }

    #[test]
    fn test_top_skips_excluded() {
        let ranking = PopularityRanking::from_ratings(&[
            rating(1, 1, 5.0),
            rating(2, 1, 5.0),
            rating(1, 2, 4.0),
            rating(1, 3, 1.0),
        ]);
        let exclude: HashSet<MovieId> = [1].into_iter().collect();
        assert_eq!(ranking.top(5, &exclude), vec![2, 3]);
    }
}
