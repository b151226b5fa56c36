//! # Models Crate
//!
//! The recommendation models and their persistence.
//!
//! ## Components
//!
//! ### Neighbor model (collaborative)
//! "Users who rate like you also liked...": cosine similarity between rating
//! rows, votes summed over the `k` nearest users.
//!
//! ### Content model
//! "Movies like this one": precomputed cosine similarity between movie
//! feature vectors.
//!
//! ### Hybrid model
//! A weighted blend of both, anchored on the user's favorite movie, with a
//! popularity fallback for users the collaborative side does not know.
//!
//! ## Example Usage
//!
//! ```ignore
//! use models::{HybridConfig, HybridModel, NeighborModel, Recommender};
//! use std::sync::Arc;
//!
//! let matrix = Arc::new(prepared.matrix);
//! let cf = NeighborModel::fit(matrix.clone(), 20)?;
//! let hybrid = HybridModel::fit(matrix, features, &prepared.train, HybridConfig::default())?;
//!
//! for rec in hybrid.recommend_items(1, 10).recommendations() {
//!     println!("{} {:.3}", rec.movie_id, rec.score);
//! }
//! ```

pub mod collaborative;
pub mod content;
pub mod error;
pub mod hybrid;
pub mod popularity;
pub mod store;
pub mod types;

pub use collaborative::{NeighborModel, rated_items};
pub use content::{ContentModel, MAX_CATALOG_ITEMS};
pub use error::{ModelError, RecommendError, Result};
pub use hybrid::{DEFAULT_BLEND_WEIGHT, DEFAULT_HYBRID_NEIGHBORS, HybridConfig, HybridModel};
pub use popularity::PopularityRanking;
pub use store::{load_model, save_model};
pub use types::{QueryResult, Recommendation, Recommender};
