//! DataIndex building and indexing logic.
//!
//! - Parse the CSV files (in parallel)
//! - Build the primary indices (movies, ratings by user and by movie, tags)
//! - Compute aggregate statistics (movie stats)
//! - Validate referential integrity

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, warn};

pub const RATINGS_FILE: &str = "ratings.csv";
pub const MOVIES_FILE: &str = "movies.csv";
pub const TAGS_FILE: &str = "tags.csv";

/// Smallest and largest rating MovieLens hands out
const RATING_RANGE: (f32, f32) = (0.5, 5.0);

impl DataIndex {
    /// Load a MovieLens `ml-latest-small` style directory.
    ///
    /// `ratings.csv` and `movies.csv` are required; `tags.csv` is optional and
    /// only feeds the text features. A missing directory or required file is
    /// reported as [`DataLoadError::DataUnavailable`].
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading MovieLens dataset from {:?}", data_dir);

        if !data_dir.is_dir() {
            return Err(DataLoadError::DataUnavailable {
                path: data_dir.display().to_string(),
            });
        }

        let ratings_path = data_dir.join(RATINGS_FILE);
        let movies_path = data_dir.join(MOVIES_FILE);
        let tags_path = data_dir.join(TAGS_FILE);

        let (ratings, movies) = rayon::join(
            || parser::parse_ratings(&ratings_path),
            || parser::parse_movies(&movies_path),
        );
        let ratings = ratings?;
        let movies = movies?;

        let tags = if tags_path.exists() {
            parser::parse_tags(&tags_path)?
        } else {
            warn!("{} not found, content features will use genres only", TAGS_FILE);
            Vec::new()
        };

        info!(
            "Loaded {} ratings, {} movies, {} tags",
            ratings.len(),
            movies.len(),
            tags.len()
        );

        let mut index = DataIndex::from_parts(movies, ratings, tags);
        index.validate()?;

        let (users, movies, ratings) = index.counts();
        info!(
            "DataIndex built: {} users, {} movies, {} ratings",
            users, movies, ratings
        );
        Ok(index)
    }

    /// Assemble an index from already-parsed records and compute statistics
    pub fn from_parts(movies: Vec<Movie>, ratings: Vec<Rating>, tags: Vec<Tag>) -> Self {
        let mut index = DataIndex::new();
        for movie in movies {
            index.insert_movie(movie);
        }
        for rating in ratings {
            index.insert_rating(rating);
        }
        for tag in tags {
            index.insert_tag(tag);
        }
        index.compute_movie_stats();
        index
    }

    /// Compute average rating, count and popularity for every rated movie
    pub fn compute_movie_stats(&mut self) {
        self.movie_stats = self
            .movie_ratings
            .par_iter()
            .map(|(&movie_id, ratings)| {
                let rating_count = ratings.len() as u32;
                let avg_rating = if rating_count > 0 {
                    let total: f32 = ratings.iter().map(|r| r.rating).sum();
                    total / rating_count as f32
                } else {
                    0.0
                };

                (
                    movie_id,
                    MovieStats {
                        avg_rating,
                        rating_count,
                        popularity_score: popularity_score(avg_rating, rating_count),
                    },
                )
            })
            .collect();
    }

    /// Every rating must point at a known movie and lie in 0.5..=5.0
    pub fn validate(&self) -> Result<()> {
        for rating in &self.ratings {
            if !self.movies.contains_key(&rating.movie_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "Movie".to_string(),
                    id: rating.movie_id,
                });
            }
            if !(RATING_RANGE.0..=RATING_RANGE.1).contains(&rating.rating) {
                return Err(DataLoadError::InvalidValue {
                    field: "rating".to_string(),
                    value: rating.rating.to_string(),
                });
            }
        }
        if self.ratings.is_empty() {
            return Err(DataLoadError::ValidationError(
                "dataset contains no ratings".to_string(),
            ));
        }
        Ok(())
    }
}

/// Popularity = rating count × mean rating.
///
/// Shared with the hybrid model's popularity fallback so both rank the same way.
pub fn popularity_score(avg_rating: f32, rating_count: u32) -> f32 {
    rating_count as f32 * avg_rating
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: MovieId, title: &str, genres: Vec<Genre>) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            year: None,
            genres,
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
    fn test_popularity_score() {
        assert_eq!(popularity_score(4.0, 10), 40.0);
        assert_eq!(popularity_score(0.0, 0), 0.0);
    }

    #[test]
    fn test_from_parts_computes_stats() {
        let index = DataIndex::from_parts(
            vec![movie(1, "A", vec![Genre::Drama]), movie(2, "B", vec![Genre::Comedy])],
            vec![rating(1, 1, 4.0), rating(2, 1, 5.0), rating(1, 2, 3.0)],
            vec![],
        );

        let stats = index.get_movie_stats(1).unwrap();
        assert_eq!(stats.rating_count, 2);
        assert!((stats.avg_rating - 4.5).abs() < 1e-6);
        assert!((stats.popularity_score - 9.0).abs() < 1e-6);
        assert_eq!(index.counts(), (2, 2, 3));
    }

    #[test]
    fn test_validate_rejects_unknown_movie() {
        let index = DataIndex::from_parts(
            vec![movie(1, "A", vec![Genre::Drama])],
            vec![rating(1, 99, 4.0)],
            vec![],
        );
        assert!(matches!(
            index.validate(),
            Err(DataLoadError::MissingReference { id: 99, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_rating() {
        let index = DataIndex::from_parts(
            vec![movie(1, "A", vec![Genre::Drama])],
            vec![rating(1, 1, 7.0)],
            vec![],
        );
        assert!(matches!(
            index.validate(),
            Err(DataLoadError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_missing_directory_is_data_unavailable() {
        let result = DataIndex::load_from_files(Path::new("/no/such/movielens/dir"));
        assert!(matches!(result, Err(DataLoadError::DataUnavailable { .. })));
    }

    #[test]
    fn test_load_dataset() {
        // Requires the real dataset; place ml-latest-small in ../../data/
        let data_dir = Path::new("../../data/ml-latest-small");

        if data_dir.exists() {
            let index = DataIndex::load_from_files(data_dir).unwrap();
            let (users, movies, ratings) = index.counts();

            assert_eq!(users, 610);
            assert_eq!(movies, 9742);
            assert_eq!(ratings, 100836);
        }
    }
}
