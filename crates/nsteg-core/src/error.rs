use thiserror::Error;

pub type NstegResult<T> = Result<T, NstegError>;

#[derive(Debug, Error)]
pub enum NstegError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
