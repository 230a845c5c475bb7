use thiserror::Error;

pub type EvaultResult<T> = Result<T, EvaultError>;

#[derive(Debug, Error)]
pub enum EvaultError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
