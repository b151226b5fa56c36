use data_loader::MovieId;
use thiserror::Error;

/// Errors raised while fitting, saving or loading a model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Cannot fit {model} on an empty training set")]
    EmptyTrainingSet { model: &'static str },

    #[error("Feature vector for movie {movie_id} spans {found} dimensions, expected at most {expected}")]
    FeatureDimensionMismatch {
        movie_id: MovieId,
        expected: usize,
        found: usize,
    },

    #[error("Catalog of {items} items exceeds the {max} item limit of the similarity table")]
    CatalogTooLarge { items: usize, max: usize },

    #[error("Model file not found: {path}")]
    NotFound { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Internal failure while answering a query.
///
/// Never reaches callers of `recommend_items`; see
/// [`Recommender::recommend_items`](crate::Recommender::recommend_items).
#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("Inconsistent model state: {0}")]
    InconsistentModel(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
