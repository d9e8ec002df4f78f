use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Scale(#[from] flowgate_core::geometry::ScaleError),
    #[error(transparent)]
    Engine(#[from] flowgate_engine::errors::EngineError),
    #[error(transparent)]
    Io(#[from] flowgate_io::IoError),
}
