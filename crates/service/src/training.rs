//! Training and offline evaluation workflows.
//!
//! ## Training
//! 1. Load the dataset (missing data aborts the run)
//! 2. Split per user and build the user-item matrix
//! 3. Build movie feature vectors
//! 4. Optionally tune k and the blend weight (a tuning failure falls back to
//!    the configured values)
//! 5. Fit the final collaborative and hybrid models
//! 6. Save both to the model directory

use crate::handle::TrainedModels;
use anyhow::{Context, Result};
use data_loader::{DataIndex, PreparedData, Rating, SplitConfig, UserItemMatrix, prepare_data};
use evaluation::{
    EvaluationConfig, EvaluationReport, Evaluator, Tuner, TuningError, TuningReport,
};
use features::{FeatureBuilder, MovieFeatures};
use models::{
    DEFAULT_BLEND_WEIGHT, DEFAULT_HYBRID_NEIGHBORS, HybridConfig, HybridModel, NeighborModel,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Neighbor count of the final collaborative model when tuning is off or fails
pub const DEFAULT_NEIGHBORS: usize = 20;

/// Neighbor count of the collaborative model in [`evaluate`]
pub const EVALUATION_NEIGHBORS: usize = 10;

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub data_dir: PathBuf,
    pub model_dir: PathBuf,
    pub test_fraction: f64,
    pub seed: u64,
    /// Grid-search k and the blend weight before the final fit
    pub tune: bool,
    pub neighbors: usize,
    pub blend_weight: f64,
    /// Neighbor count inside the hybrid model
    pub hybrid_neighbors: usize,
    /// Append TF-IDF text features (genres, tags, title) to the genre flags
    pub use_tags: bool,
    pub evaluation: EvaluationConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let split = SplitConfig::default();
        Self {
            data_dir: PathBuf::from("data/ml-latest-small"),
            model_dir: PathBuf::from("models"),
            test_fraction: split.test_fraction,
            seed: split.seed,
            tune: false,
            neighbors: DEFAULT_NEIGHBORS,
            blend_weight: DEFAULT_BLEND_WEIGHT,
            hybrid_neighbors: DEFAULT_HYBRID_NEIGHBORS,
            use_tags: false,
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_model_dir(mut self, model_dir: impl Into<PathBuf>) -> Self {
        self.model_dir = model_dir.into();
        self
    }

    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_tuning(mut self, tune: bool) -> Self {
        self.tune = tune;
        self
    }

    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.neighbors = neighbors;
        self
    }

    pub fn with_blend_weight(mut self, blend_weight: f64) -> Self {
        self.blend_weight = blend_weight;
        self
    }

    pub fn with_tags(mut self, use_tags: bool) -> Self {
        self.use_tags = use_tags;
        self
    }

    pub fn with_evaluation(mut self, evaluation: EvaluationConfig) -> Self {
        self.evaluation = evaluation;
        self
    }

    fn split(&self) -> SplitConfig {
        SplitConfig::default()
            .with_test_fraction(self.test_fraction)
            .with_seed(self.seed)
    }

    fn hybrid_config(&self, blend_weight: f64) -> HybridConfig {
        HybridConfig::default()
            .with_blend_weight(blend_weight)
            .with_neighbors(self.hybrid_neighbors)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub train_ratings: usize,
    pub test_ratings: usize,
    pub excluded_users: usize,
    /// Parameters of the final models
    pub neighbors: usize,
    pub blend_weight: f64,
    pub neighbor_tuning: Option<TuningReport<usize>>,
    pub weight_tuning: Option<TuningReport<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub collaborative: EvaluationReport,
    pub hybrid: EvaluationReport,
}

/// Load the dataset, fit both models and save them to `config.model_dir`.
pub fn train(config: &TrainingConfig) -> Result<(TrainedModels, TrainingSummary)> {
    let start = Instant::now();
    let index = DataIndex::load_from_files(&config.data_dir)
        .context("Failed to load MovieLens dataset")?;

    let (models, summary) = fit_models(config, &index)?;

    models
        .save_to_dir(&config.model_dir)
        .with_context(|| format!("Failed to save models to {:?}", config.model_dir))?;

    info!("Training finished in {:.2?}", start.elapsed());
    Ok((models, summary))
}

/// The in-memory part of [`train`]: split, featurize, tune and fit.
pub fn fit_models(
    config: &TrainingConfig,
    index: &DataIndex,
) -> Result<(TrainedModels, TrainingSummary)> {
    let PreparedData {
        train,
        test,
        matrix,
        excluded_users,
    } = prepare_data(index.ratings(), &config.split()).context("Failed to split ratings")?;
    let features = FeatureBuilder::new().with_tags(config.use_tags).build(index);
    let matrix = Arc::new(matrix);

    let (neighbors, blend_weight, neighbor_tuning, weight_tuning) = if config.tune {
        info!("Finding optimal parameters...");
        match tune(config, &matrix, &features, &train, &test) {
            Ok((k_report, w_report)) => (
                k_report.best,
                w_report.best,
                Some(k_report),
                Some(w_report),
            ),
            Err(e) => {
                warn!(
                    "Error tuning parameters: {}; using k={}, blend_weight={}",
                    e, config.neighbors, config.blend_weight
                );
                (config.neighbors, config.blend_weight, None, None)
            }
        }
    } else {
        (config.neighbors, config.blend_weight, None, None)
    };

    info!(
        "Training final models with k={}, blend_weight={}...",
        neighbors, blend_weight
    );
    let collaborative = NeighborModel::fit(Arc::clone(&matrix), neighbors)
        .context("Failed to fit collaborative model")?;
    let hybrid = HybridModel::fit(matrix, features, &train, config.hybrid_config(blend_weight))
    .context("Failed to fit hybrid model")?;

    let summary = TrainingSummary {
        train_ratings: train.len(),
        test_ratings: test.len(),
        excluded_users,
        neighbors,
        blend_weight,
        neighbor_tuning,
        weight_tuning,
    };
    Ok((
        TrainedModels {
            collaborative,
            hybrid,
        },
        summary,
    ))
}

fn tune(
    config: &TrainingConfig,
    matrix: &Arc<UserItemMatrix>,
    features: &MovieFeatures,
    train: &[Rating],
    test: &[Rating],
) -> std::result::Result<(TuningReport<usize>, TuningReport<f64>), TuningError> {
    let tuner = Tuner::new(Evaluator::new(config.evaluation))
        .with_hybrid_neighbors(config.hybrid_neighbors);
    let k_report = tuner.tune_neighbors(matrix, test)?;
    let w_report = tuner.tune_blend_weight(matrix, features, train, test)?;
    Ok((k_report, w_report))
}

/// Fit both models in memory and report their metrics on the held-out split.
pub fn evaluate(config: &TrainingConfig) -> Result<EvaluationSummary> {
    let index = DataIndex::load_from_files(&config.data_dir)
        .context("Failed to load MovieLens dataset")?;
    evaluate_index(config, &index)
}

/// [`evaluate`] on an already-loaded dataset
pub fn evaluate_index(config: &TrainingConfig, index: &DataIndex) -> Result<EvaluationSummary> {
    let PreparedData {
        train,
        test,
        matrix,
        ..
    } = prepare_data(index.ratings(), &config.split()).context("Failed to split ratings")?;
    let features = FeatureBuilder::new().with_tags(config.use_tags).build(index);
    let matrix = Arc::new(matrix);

    let collaborative = NeighborModel::fit(Arc::clone(&matrix), EVALUATION_NEIGHBORS)
        .context("Failed to fit collaborative model")?;
    let hybrid = HybridModel::fit(
        matrix,
        features,
        &train,
        config.hybrid_config(config.blend_weight),
    )
    .context("Failed to fit hybrid model")?;

    let evaluator = Evaluator::new(config.evaluation);
    info!("Evaluating collaborative filtering model...");
    let collaborative = evaluator.evaluate(&collaborative, &test);
    info!("Evaluating hybrid recommendation model...");
    let hybrid = evaluator.evaluate(&hybrid, &test);

    Ok(EvaluationSummary {
        collaborative,
        hybrid,
    })
}
