//! Shared, swappable reference to the trained models.
//!
//! Readers take a cheap `Arc` snapshot with [`ModelHandle::current`] and keep
//! using it even if a newer set of models is swapped in while they work.
//! Trained models are never mutated in place.

use crate::error::ServiceError;
use models::{HybridModel, NeighborModel, load_model, save_model};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub const COLLABORATIVE_FILE: &str = "collaborative.json";
pub const HYBRID_FILE: &str = "hybrid.json";

/// The models one training run produces
#[derive(Debug, Clone)]
pub struct TrainedModels {
    pub collaborative: NeighborModel,
    pub hybrid: HybridModel,
}

impl TrainedModels {
    pub fn save_to_dir(&self, dir: &Path) -> Result<(), ServiceError> {
        save_model(&dir.join(COLLABORATIVE_FILE), &self.collaborative)?;
        save_model(&dir.join(HYBRID_FILE), &self.hybrid)?;
        Ok(())
    }

    pub fn load_from_dir(dir: &Path) -> Result<Self, ServiceError> {
        Ok(Self {
            collaborative: load_model(&dir.join(COLLABORATIVE_FILE))?,
            hybrid: load_model(&dir.join(HYBRID_FILE))?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelHandle {
    inner: Arc<RwLock<Option<Arc<TrainedModels>>>>,
}

impl ModelHandle {
    /// An empty handle; queries fail with `ModelsNotLoaded` until a swap
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(models: TrainedModels) -> Self {
        let handle = Self::new();
        handle.swap(models);
        handle
    }

    /// Load both model files from `dir` and swap them in
    pub fn load_from_dir(&self, dir: &Path) -> Result<(), ServiceError> {
        let models = TrainedModels::load_from_dir(dir)?;
        self.swap(models);
        info!("Loaded trained models from {:?}", dir);
        Ok(())
    }

    /// Replace the current models, returning the previous ones
    pub fn swap(&self, models: TrainedModels) -> Option<Arc<TrainedModels>> {
        self.inner.write().replace(Arc::new(models))
    }

    pub fn current(&self) -> Option<Arc<TrainedModels>> {
        self.inner.read().clone()
    }

    pub fn require(&self) -> Result<Arc<TrainedModels>, ServiceError> {
        self.current().ok_or(ServiceError::ModelsNotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.read().is_some()
    }
}
