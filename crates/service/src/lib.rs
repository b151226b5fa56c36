//! # Service Crate
//!
//! Ties the workspace together for callers such as the CLI.
//!
//! - **training**: load, split, featurize, tune, fit and save
//! - **handle**: the shared, swappable reference to the trained models
//! - **recommendations**: user, similar-movie and title queries enriched
//!   with catalog details
//!
//! ## Example Usage
//!
//! ```ignore
//! use service::{ModelHandle, RecommendationService, TrainingConfig, train};
//!
//! let config = TrainingConfig::default().with_tuning(true);
//! let (models, summary) = train(&config)?;
//!
//! let handle = ModelHandle::with_models(models);
//! let service = RecommendationService::new(handle, data_index);
//! let recs = service.recommend_for_user(1, 10)?;
//! ```

pub mod error;
pub mod handle;
pub mod recommendations;
pub mod training;

pub use error::ServiceError;
pub use handle::{COLLABORATIVE_FILE, HYBRID_FILE, ModelHandle, TrainedModels};
pub use recommendations::{
    MAX_SEARCH_RESULTS, MIN_SEARCH_LEN, MovieRecommendation, RatedMovie, RecommendationService,
    SearchResult, UserProfile, UserRecommendations,
};
pub use training::{
    DEFAULT_NEIGHBORS, EVALUATION_NEIGHBORS, EvaluationSummary, TrainingConfig, TrainingSummary,
    evaluate, evaluate_index, fit_models, train,
};
