use diamond_match_engine::MatchFlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Match flow error. {0}")]
    MatchFlow(#[from] MatchFlowError),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}
