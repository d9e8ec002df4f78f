pub mod command;
pub mod history;
pub mod session;

pub mod errors {
    use flowgate_core::gates::GateError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error(transparent)]
        Gate(#[from] GateError),
        #[error("an import is in progress; mutations are rejected until it completes")]
        ImportPending,
    }
}
