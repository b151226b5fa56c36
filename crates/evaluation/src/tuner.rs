//! Grid search over the neighbor count and the hybrid blend weight.
//!
//! Every candidate is a full refit followed by an evaluation; the candidate
//! with the highest hit-rate wins and ties go to the earliest one.

use crate::evaluator::{EvaluationReport, Evaluator};
use data_loader::{Rating, UserItemMatrix};
use features::MovieFeatures;
use models::{DEFAULT_HYBRID_NEIGHBORS, HybridConfig, HybridModel, ModelError, NeighborModel};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

pub const NEIGHBOR_GRID: [usize; 6] = [5, 10, 15, 20, 30, 50];
pub const BLEND_WEIGHT_GRID: [f64; 4] = [0.3, 0.5, 0.7, 0.9];

#[derive(Error, Debug)]
pub enum TuningError {
    #[error("Parameter grid is empty")]
    EmptyGrid,

    #[error("Failed to fit candidate model: {0}")]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trial<P> {
    pub param: P,
    pub report: EvaluationReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuningReport<P> {
    pub best: P,
    pub best_report: EvaluationReport,
    /// Every candidate in grid order
    pub trials: Vec<Trial<P>>,
}

impl<P: Copy> TuningReport<P> {
    /// Pick the first trial with the maximal hit-rate
    fn from_trials(trials: Vec<Trial<P>>) -> Result<Self, TuningError> {
        let mut best: Option<&Trial<P>> = None;
        for trial in &trials {
            if best.is_none_or(|b| trial.report.hit_rate > b.report.hit_rate) {
                best = Some(trial);
            }
        }
        let best = best.ok_or(TuningError::EmptyGrid)?;
        let (best, best_report) = (best.param, best.report.clone());
        Ok(Self {
            best,
            best_report,
            trials,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Tuner {
    evaluator: Evaluator,
    neighbor_grid: Vec<usize>,
    weight_grid: Vec<f64>,
    hybrid_neighbors: usize,
}

impl Tuner {
    pub fn new(evaluator: Evaluator) -> Self {
        Self {
            evaluator,
            neighbor_grid: NEIGHBOR_GRID.to_vec(),
            weight_grid: BLEND_WEIGHT_GRID.to_vec(),
            hybrid_neighbors: DEFAULT_HYBRID_NEIGHBORS,
        }
    }

    pub fn with_neighbor_grid(mut self, grid: Vec<usize>) -> Self {
        self.neighbor_grid = grid;
        self
    }

    pub fn with_weight_grid(mut self, grid: Vec<f64>) -> Self {
        self.weight_grid = grid;
        self
    }

    /// Neighbor count of the hybrid's inner model while tuning weights (default: 20)
    pub fn with_hybrid_neighbors(mut self, neighbors: usize) -> Self {
        self.hybrid_neighbors = neighbors;
        self
    }

    #[instrument(skip_all, fields(candidates = self.neighbor_grid.len()))]
    pub fn tune_neighbors(
        &self,
        matrix: &Arc<UserItemMatrix>,
        test: &[Rating],
    ) -> Result<TuningReport<usize>, TuningError> {
        info!("Tuning collaborative filtering parameters...");
        let mut trials = Vec::with_capacity(self.neighbor_grid.len());

        for &k in &self.neighbor_grid {
            info!("Testing with k={}...", k);
            let model = NeighborModel::fit(Arc::clone(matrix), k)?;
            let report = self.evaluator.evaluate(&model, test);
            trials.push(Trial { param: k, report });
        }

        let result = TuningReport::from_trials(trials)?;
        info!("Best k value: {}", result.best);
        Ok(result)
    }

    #[instrument(skip_all, fields(candidates = self.weight_grid.len()))]
    pub fn tune_blend_weight(
        &self,
        matrix: &Arc<UserItemMatrix>,
        features: &MovieFeatures,
        train: &[Rating],
        test: &[Rating],
    ) -> Result<TuningReport<f64>, TuningError> {
        info!("Tuning hybrid recommender weights...");
        let mut trials = Vec::with_capacity(self.weight_grid.len());

        for &weight in &self.weight_grid {
            info!("Testing with blend_weight={}...", weight);
            let config = HybridConfig::default()
                .with_blend_weight(weight)
                .with_neighbors(self.hybrid_neighbors);
            let model = HybridModel::fit(Arc::clone(matrix), features.clone(), train, config)?;
            let report = self.evaluator.evaluate(&model, test);
            trials.push(Trial {
                param: weight,
                report,
            });
        }

        let result = TuningReport::from_trials(trials)?;
        info!("Best blend weight: {}", result.best);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(hit_rate: f64) -> EvaluationReport {
        EvaluationReport {
            k: 10,
            precision: 0.0,
            recall: 0.0,
            hit_rate,
            sampled_users: 1,
            evaluated_users: 1,
            skipped_users: 0,
            failed_users: 0,
        }
    }

    fn trial<P>(param: P, hit_rate: f64) -> Trial<P> {
        Trial {
            param,
            report: report(hit_rate),
        }
    }

    #[test]
    fn test_first_maximum_wins() {
        let trials = vec![
            trial(5, 0.2),
            trial(10, 0.6),
            trial(15, 0.6),
            trial(20, 0.4),
        ];
        let result = TuningReport::from_trials(trials).unwrap();
        assert_eq!(result.best, 10);
        assert_eq!(result.best_report.hit_rate, 0.6);
    }

    #[test]
    fn test_all_equal_picks_first() {
        let trials = vec![trial(0.3, 0.0), trial(0.5, 0.0)];
        assert_eq!(TuningReport::from_trials(trials).unwrap().best, 0.3);
    }

    #[test]
    fn test_empty_grid_is_an_error() {
        let result = TuningReport::<usize>::from_trials(Vec::new());
        assert!(matches!(result, Err(TuningError::EmptyGrid)));
    }
}
