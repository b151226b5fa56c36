//! # Features Crate
//!
//! Turns the movie catalog into fixed-length numeric vectors for the
//! content-based model.
//!
//! Every vector starts with the one-hot genre flags. When text features are
//! enabled, a TF-IDF block over each movie's genres, user tags and title is
//! appended, so all vectors in one [`MovieFeatures`] share the same length.
//! Vectors are stored sparsely: a movie carries a handful of genres and
//! terms out of a vocabulary of thousands.
//!
//! ## Example Usage
//!
//! ```ignore
//! use features::FeatureBuilder;
//!
//! let features = FeatureBuilder::new().with_tags(true).build(&data_index);
//! assert_eq!(features.len(), data_index.movies_sorted().len());
//! ```

pub mod genre;
pub mod sparse;
pub mod tfidf;

pub use genre::{GENRE_DIMENSION, genre_one_hot, genre_text};
pub use sparse::SparseVector;
pub use tfidf::TfidfVectorizer;

use data_loader::{DataIndex, Movie, MovieId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Per-movie feature vectors in catalog order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieFeatures {
    pub movie_ids: Vec<MovieId>,
    /// Logical length of every vector
    dimension: usize,
    pub vectors: Vec<SparseVector>,
}

impl MovieFeatures {
    /// From dense vectors; the first vector's length sets the dimension.
    pub fn new(movie_ids: Vec<MovieId>, vectors: Vec<Vec<f64>>) -> Self {
        let dimension = vectors.first().map_or(0, Vec::len);
        let vectors = vectors.iter().map(|v| SparseVector::from_dense(v)).collect();
        Self::from_sparse(movie_ids, dimension, vectors)
    }

    pub fn from_sparse(
        movie_ids: Vec<MovieId>,
        dimension: usize,
        vectors: Vec<SparseVector>,
    ) -> Self {
        Self {
            movie_ids,
            dimension,
            vectors,
        }
    }

    pub fn len(&self) -> usize {
        self.movie_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movie_ids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Stored entries across all vectors
    pub fn nnz(&self) -> usize {
        self.vectors.iter().map(SparseVector::nnz).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MovieId, &SparseVector)> {
        self.movie_ids.iter().copied().zip(self.vectors.iter())
    }
}

/// Builds [`MovieFeatures`] from a loaded dataset.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    use_tags: bool,
    min_df: usize,
}

impl FeatureBuilder {
    /// Genre flags only (default)
    pub fn new() -> Self {
        Self {
            use_tags: false,
            min_df: TfidfVectorizer::DEFAULT_MIN_DF,
        }
    }

    /// Append TF-IDF weights over genres, tags and title (default: false)
    pub fn with_tags(mut self, use_tags: bool) -> Self {
        self.use_tags = use_tags;
        self
    }

    /// Minimum document frequency for TF-IDF terms (default: 2)
    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df;
        self
    }

    #[instrument(skip(self, index), fields(use_tags = self.use_tags))]
    pub fn build(&self, index: &DataIndex) -> MovieFeatures {
        let movies = index.movies_sorted();
        let movie_ids: Vec<MovieId> = movies.iter().map(|m| m.id).collect();

        let mut vectors: Vec<SparseVector> = movies
            .par_iter()
            .map(|m| SparseVector::from_dense(&genre_one_hot(m)))
            .collect();
        let mut dimension = GENRE_DIMENSION;

        if self.use_tags {
            let documents: Vec<String> = movies
                .par_iter()
                .map(|m| content_document(m, index.get_movie_tags(m.id)))
                .collect();

            let mut vectorizer = TfidfVectorizer::with_min_df(self.min_df);
            let text_vectors = vectorizer.fit_transform(&documents);
            for (vector, text) in vectors.iter_mut().zip(&text_vectors) {
                vector.append_block(text, GENRE_DIMENSION as u32);
            }
            dimension += vectorizer.vocabulary_len();
            info!(
                "Built text features with {} TF-IDF terms",
                vectorizer.vocabulary_len()
            );
        }

        let features = MovieFeatures::from_sparse(movie_ids, dimension, vectors);
        info!(
            "Built feature vectors for {} movies ({} dimensions, {} stored entries)",
            features.len(),
            features.dimension(),
            features.nnz()
        );
        features
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Text describing one movie: genres, lowercased tags, then the title
fn content_document(movie: &Movie, tags: &[String]) -> String {
    let tags = tags
        .iter()
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{} {} {}", genre_text(movie), tags, movie.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Genre, Tag};

    fn create_test_index() -> DataIndex {
        let mut index = DataIndex::new();
        let movies = [
            (3, "Alien (1979)", vec![Genre::Horror, Genre::SciFi]),
            (1, "Aliens (1986)", vec![Genre::Action, Genre::Horror, Genre::SciFi]),
            (2, "Amelie (2001)", vec![Genre::Comedy, Genre::Romance]),
        ];
        for (id, title, genres) in movies {
            index.insert_movie(Movie {
                id,
                title: title.to_string(),
                year: None,
                genres,
            });
        }
        for movie_id in [1, 3] {
            index.insert_tag(Tag {
                user_id: 1,
                movie_id,
                tag: "Ridley Scott".to_string(),
                timestamp: 0,
            });
        }
        index
    }

    #[test]
    fn test_genre_only_features() {
        let features = FeatureBuilder::new().build(&create_test_index());

        assert_eq!(features.movie_ids, vec![1, 2, 3]);
        assert_eq!(features.dimension(), GENRE_DIMENSION);
        assert_eq!(features.vectors[1].get(Genre::Romance.index() as u32), 1.0);
    }

    #[test]
    fn test_tag_features_extend_every_vector_equally() {
        let features = FeatureBuilder::new().with_tags(true).build(&create_test_index());
        let dim = features.dimension();

        assert!(dim > GENRE_DIMENSION);
        for vector in &features.vectors {
            assert!(vector.max_index().is_none_or(|i| (i as usize) < dim));
        }
    }

    #[test]
    fn test_content_document_layout() {
        let movie = Movie {
            id: 1,
            title: "Heat (1995)".to_string(),
            year: Some(1995),
            genres: vec![Genre::Crime],
        };
        let doc = content_document(&movie, &["Al Pacino".to_string()]);
        assert_eq!(doc, "Crime al pacino Heat (1995)");
    }

    #[test]
    fn test_iter_pairs_ids_with_vectors() {
        let features = MovieFeatures::new(vec![10, 20], vec![vec![1.0], vec![0.0]]);
        let pairs: Vec<_> = features.iter().collect();
        assert_eq!(pairs[1], (20, &SparseVector::new()));
        assert_eq!(features.dimension(), 1);
    }

    #[test]
    fn test_features_serialize_exactly() {
        let features = FeatureBuilder::new().with_tags(true).build(&create_test_index());
        let json = serde_json::to_string(&features).unwrap();
        let restored: MovieFeatures = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, features);
    }

    #[test]
    fn test_text_block_is_stored_sparsely() {
        // Shared terms: horror, sci, fi, ridley, scott. Amelie has none of them.
        let features = FeatureBuilder::new().with_tags(true).build(&create_test_index());

        assert_eq!(features.dimension(), GENRE_DIMENSION + 5);
        assert_eq!(features.vectors[1].nnz(), 2);
        assert!(features.vectors[0].nnz() > 3);
        assert!(features.nnz() < features.len() * features.dimension());
    }
}
