use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("share backend: {0}")]
    Backend(String),
}
