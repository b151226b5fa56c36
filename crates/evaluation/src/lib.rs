//! # Evaluation Crate
//!
//! Offline quality measurement for the recommenders.
//!
//! - **metrics**: `precision_at_k` and `recall_at_k`
//! - **evaluator**: samples test users and aggregates precision, recall and hit-rate
//! - **tuner**: grid search over neighbor count and blend weight
//!
//! ## Example Usage
//!
//! ```ignore
//! use evaluation::{EvaluationConfig, Evaluator, Tuner};
//!
//! let evaluator = Evaluator::new(EvaluationConfig::default());
//! let report = evaluator.evaluate(&model, &prepared.test);
//! println!("hit rate {:.3}", report.hit_rate);
//!
//! let tuning = Tuner::new(evaluator).tune_neighbors(&matrix, &prepared.test)?;
//! println!("best k = {}", tuning.best);
//! ```

pub mod evaluator;
pub mod metrics;
pub mod tuner;

pub use evaluator::{EvaluationConfig, EvaluationReport, Evaluator};
pub use metrics::{precision_at_k, recall_at_k};
pub use tuner::{BLEND_WEIGHT_GRID, NEIGHBOR_GRID, Trial, Tuner, TuningError, TuningReport};
