use data_loader::DataLoadError;
use models::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Models not loaded. Run `movie-recs train` first")]
    ModelsNotLoaded,

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Data error: {0}")]
    Data(#[from] DataLoadError),
}
