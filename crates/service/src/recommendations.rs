//! # Recommendation Service
//!
//! Answers user-facing queries against the currently loaded models:
//! 1. Take an `Arc` snapshot of the trained models from the [`ModelHandle`]
//! 2. Ask the collaborative, hybrid or content model for a ranking
//! 3. Enrich each movie id with its catalog entry (title, year, genres)
//!
//! An empty list means no recommendation is available for that query.
//! Only a missing set of models is an error.

use crate::error::ServiceError;
use crate::handle::ModelHandle;
use data_loader::{DataIndex, Movie, MovieId, UserId};
use models::{QueryResult, Recommendation, Recommender};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Shortest title query that is searched at all
pub const MIN_SEARCH_LEN: usize = 2;

/// Upper bound on title search results
pub const MAX_SEARCH_RESULTS: usize = 10;

/// A recommended movie with its catalog details
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRecommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub year: Option<u16>,
    pub genres: Vec<String>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecommendations {
    pub user_id: UserId,
    pub collaborative: Vec<MovieRecommendation>,
    pub hybrid: Vec<MovieRecommendation>,
}

impl UserRecommendations {
    pub fn is_empty(&self) -> bool {
        self.collaborative.is_empty() && self.hybrid.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub movie_id: MovieId,
    pub title: String,
}

/// One rating from a user's history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub rating: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub rating_count: usize,
    pub average_rating: f32,
    /// Highest rated first
    pub top_rated: Vec<RatedMovie>,
}

#[derive(Clone)]
pub struct RecommendationService {
    handle: ModelHandle,
    data_index: Arc<DataIndex>,
}

impl RecommendationService {
    pub fn new(handle: ModelHandle, data_index: Arc<DataIndex>) -> Self {
        Self { handle, data_index }
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    /// Collaborative and hybrid recommendations for a user
    #[instrument(skip(self))]
    pub fn recommend_for_user(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<UserRecommendations, ServiceError> {
        let models = self.handle.require()?;

        let collaborative = models.collaborative.recommend_items(user_id, limit);
        let hybrid = models.hybrid.recommend_items(user_id, limit);
        debug!(
            "{}: {}, {}: {}",
            models.collaborative.name(),
            collaborative.recommendations().len(),
            models.hybrid.name(),
            hybrid.recommendations().len()
        );

        let result = UserRecommendations {
            user_id,
            collaborative: self.enrich(collaborative),
            hybrid: self.enrich(hybrid),
        };
        if result.is_empty() {
            info!("No recommendations available for user {}", user_id);
        }
        Ok(result)
    }

    /// Movies whose content is closest to `movie_id`
    #[instrument(skip(self))]
    pub fn similar_movies(
        &self,
        movie_id: MovieId,
        limit: usize,
    ) -> Result<Vec<MovieRecommendation>, ServiceError> {
        let models = self.handle.require()?;
        let similar = models.hybrid.content().recommend_similar(movie_id, limit);
        if !similar.is_found() {
            info!("No similar movies available for movie {}", movie_id);
        }
        Ok(self.enrich(similar))
    }

    /// Case-insensitive substring search over titles, in catalog order.
    ///
    /// Does not need trained models.
    pub fn search_titles(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim().to_lowercase();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Vec::new();
        }

        self.data_index
            .movies_sorted()
            .into_iter()
            .filter(|movie| movie.title.to_lowercase().contains(&query))
            .take(MAX_SEARCH_RESULTS)
            .map(|movie| SearchResult {
                movie_id: movie.id,
                title: movie.title.clone(),
            })
            .collect()
    }

    /// A user's rating history, or `None` for a user without ratings
    pub fn user_profile(&self, user_id: UserId, limit: usize) -> Option<UserProfile> {
        let ratings = self.data_index.get_user_ratings(user_id);
        if ratings.is_empty() {
            return None;
        }

        let average_rating = ratings.iter().map(|r| r.rating).sum::<f32>() / ratings.len() as f32;

        let mut history: Vec<_> = ratings.iter().collect();
        history.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| a.movie_id.cmp(&b.movie_id))
        });

        let top_rated = history
            .into_iter()
            .take(limit)
            .map(|r| RatedMovie {
                movie_id: r.movie_id,
                title: self.title_of(r.movie_id),
                rating: r.rating,
            })
            .collect();

        Some(UserProfile {
            user_id,
            rating_count: ratings.len(),
            average_rating,
            top_rated,
        })
    }

    fn enrich(&self, result: QueryResult) -> Vec<MovieRecommendation> {
        result
            .into_vec()
            .into_iter()
            .map(|rec| self.describe(rec))
            .collect()
    }

    fn describe(&self, rec: Recommendation) -> MovieRecommendation {
        match self.data_index.get_movie(rec.movie_id) {
            Some(movie) => from_movie(movie, rec.score),
            None => MovieRecommendation {
                movie_id: rec.movie_id,
                title: unknown_title(rec.movie_id),
                year: None,
                genres: Vec::new(),
                score: rec.score,
            },
        }
    }

    fn title_of(&self, movie_id: MovieId) -> String {
        self.data_index
            .get_movie(movie_id)
            .map(|m| m.title.clone())
            .unwrap_or_else(|| unknown_title(movie_id))
    }
}

fn from_movie(movie: &Movie, score: f64) -> MovieRecommendation {
    MovieRecommendation {
        movie_id: movie.id,
        title: movie.title.clone(),
        year: movie.year,
        genres: movie.genres.iter().map(|g| g.label().to_string()).collect(),
        score,
    }
}

fn unknown_title(movie_id: MovieId) -> String {
    format!("Movie {}", movie_id)
}
