//! Core domain types for the MovieLens dataset.
//!
//! The `ml-latest-small` layout has no users file: a user exists because it
//! rated something. Movies carry their genres, ratings are immutable events.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

// =============================================================================
// Movie-related Types
// =============================================================================

/// Represents a movie in the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Year extracted from title (e.g., "Toy Story (1995)")
    pub year: Option<u16>,
    pub genres: Vec<Genre>,
}

/// Movie genres used by MovieLens.
///
/// `NoGenresListed` is a real label in the dataset ("(no genres listed)") and
/// gets its own one-hot column like any other genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    NoGenresListed,
    Action,
    Adventure,
    Animation,
    Children,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Fantasy,
    FilmNoir,
    Horror,
    Imax,
    Musical,
    Mystery,
    Romance,
    SciFi,
    Thriller,
    War,
    Western,
}

impl Genre {
    /// Every genre, in one-hot column order
    pub const ALL: [Genre; 20] = [
        Genre::NoGenresListed,
        Genre::Action,
        Genre::Adventure,
        Genre::Animation,
        Genre::Children,
        Genre::Comedy,
        Genre::Crime,
        Genre::Documentary,
        Genre::Drama,
        Genre::Fantasy,
        Genre::FilmNoir,
        Genre::Horror,
        Genre::Imax,
        Genre::Musical,
        Genre::Mystery,
        Genre::Romance,
        Genre::SciFi,
        Genre::Thriller,
        Genre::War,
        Genre::Western,
    ];

    /// Position of this genre in [`Genre::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The label as it appears in `movies.csv`
    pub fn label(self) -> &'static str {
        match self {
            Genre::NoGenresListed => "(no genres listed)",
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Animation => "Animation",
            Genre::Children => "Children",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Documentary => "Documentary",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::FilmNoir => "Film-Noir",
            Genre::Horror => "Horror",
            Genre::Imax => "IMAX",
            Genre::Musical => "Musical",
            Genre::Mystery => "Mystery",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Thriller => "Thriller",
            Genre::War => "War",
            Genre::Western => "Western",
        }
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Rating and Tag Types
// =============================================================================

/// A single rating event. Immutable once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value from 0.5 to 5.0 in half-star steps
    pub rating: f32,
    /// Unix timestamp when rating was made
    pub timestamp: i64,
}

/// A free-text tag a user attached to a movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub tag: String,
    pub timestamp: i64,
}

// =============================================================================
// Statistics Types
// =============================================================================

/// Precomputed statistics for a movie
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovieStats {
    pub avg_rating: f32,
    pub rating_count: u32,
    /// `rating_count * avg_rating`, the same score the popularity ranking uses
    pub popularity_score: f32,
}

// =============================================================================
// DataIndex - The In-Memory Dataset
// =============================================================================

/// Holds the loaded dataset and its lookup indices.
#[derive(Debug, Default)]
pub struct DataIndex {
    pub(crate) movies: HashMap<MovieId, Movie>,

    /// Every rating in file order
    pub(crate) ratings: Vec<Rating>,
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    pub(crate) movie_ratings: HashMap<MovieId, Vec<Rating>>,

    /// Tag strings grouped by movie, in file order
    pub(crate) movie_tags: HashMap<MovieId, Vec<String>>,

    pub(crate) movie_stats: HashMap<MovieId, MovieStats>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// All ratings made by a user, empty if the user is unknown
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All ratings received by a movie
    pub fn get_movie_ratings(&self, movie_id: MovieId) -> &[Rating] {
        self.movie_ratings
            .get(&movie_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_movie_tags(&self, movie_id: MovieId) -> &[String] {
        self.movie_tags
            .get(&movie_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_movie_stats(&self, movie_id: MovieId) -> Option<&MovieStats> {
        self.movie_stats.get(&movie_id)
    }

    /// Every rating event in load order
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    /// All movies, sorted by id
    pub fn movies_sorted(&self) -> Vec<&Movie> {
        let mut movies: Vec<&Movie> = self.movies.values().collect();
        movies.sort_unstable_by_key(|m| m.id);
        movies
    }

    /// All user ids that rated at least one movie, sorted
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.user_ratings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn insert_movie(&mut self, movie: Movie) {
        self.movies.insert(movie.id, movie);
    }

    /// Insert a rating and update the per-user and per-movie indices
    pub fn insert_rating(&mut self, rating: Rating) {
        self.ratings.push(rating);
        self.user_ratings
            .entry(rating.user_id)
            .or_default()
            .push(rating);
        self.movie_ratings
            .entry(rating.movie_id)
            .or_default()
            .push(rating);
    }

    pub fn insert_tag(&mut self, tag: Tag) {
        self.movie_tags.entry(tag.movie_id).or_default().push(tag.tag);
    }

    /// (users, movies, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.user_ratings.len(), self.movies.len(), self.ratings.len())
    }
}
