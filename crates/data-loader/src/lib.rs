//! # Data Loader Crate
//!
//! Loads and indexes the MovieLens `ml-latest-small` dataset and prepares it
//! for training.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Rating, Tag, DataIndex)
//! - **parser**: Parse the CSV files into Rust structs
//! - **index**: Build the lookup indices and movie statistics
//! - **split**: Per-user train/test split
//! - **matrix**: The user × item rating table models train on
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{DataIndex, SplitConfig, prepare_data};
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("data/ml-latest-small"))?;
//! let prepared = prepare_data(index.ratings(), &SplitConfig::default())?;
//!
//! println!("{} users in the training matrix", prepared.matrix.n_users());
//! ```

pub mod error;
pub mod index;
pub mod matrix;
pub mod parser;
pub mod split;
pub mod types;

pub use error::{DataLoadError, Result};
pub use index::popularity_score;
pub use matrix::UserItemMatrix;
pub use split::{MIN_USER_RATINGS, PreparedData, SplitConfig, prepare_data, train_test_split};
pub use types::{DataIndex, Genre, Movie, MovieId, MovieStats, Rating, Tag, UserId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_index_creation() {
        let index = DataIndex::new();
        assert_eq!(index.counts(), (0, 0, 0));
    }

    #[test]
    fn test_insert_movie() {
        let mut index = DataIndex::new();

        index.insert_movie(Movie {
            id: 1,
            title: "Toy Story (1995)".to_string(),
            year: Some(1995),
            genres: vec![Genre::Animation, Genre::Children, Genre::Comedy],
        });

        let retrieved = index.get_movie(1).unwrap();
        assert_eq!(retrieved.year, Some(1995));
        assert_eq!(retrieved.genres.len(), 3);
    }

    #[test]
    fn test_insert_rating_updates_both_indices() {
        let mut index = DataIndex::new();

        index.insert_rating(Rating {
            user_id: 1,
            movie_id: 1193,
            rating: 5.0,
            timestamp: 978300760,
        });

        assert_eq!(index.get_user_ratings(1).len(), 1);
        assert_eq!(index.get_movie_ratings(1193).len(), 1);
        assert_eq!(index.ratings().len(), 1);
        assert_eq!(index.user_ids(), vec![1]);
    }

    #[test]
    fn test_insert_tag() {
        let mut index = DataIndex::new();
        index.insert_tag(Tag {
            user_id: 2,
            movie_id: 60756,
            tag: "funny".to_string(),
            timestamp: 0,
        });
        assert_eq!(index.get_movie_tags(60756), &["funny".to_string()]);
    }

    #[test]
    fn test_empty_queries() {
        let index = DataIndex::new();

        assert!(index.get_movie(999).is_none());
        assert!(index.get_user_ratings(999).is_empty());
        assert!(index.get_movie_ratings(999).is_empty());
        assert!(index.get_movie_tags(999).is_empty());
        assert!(index.get_movie_stats(999).is_none());
    }

    #[test]
    fn test_genre_index_matches_all_order() {
        for (i, genre) in Genre::ALL.iter().enumerate() {
            assert_eq!(genre.index(), i);
        }
    }
}
