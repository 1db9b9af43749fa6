use axum::response::{IntoResponse, Response};
use http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    DavError(#[from] rustical_dav::Error),

    #[error(transparent)]
    BodyError(#[from] axum::Error),

    #[error(transparent)]
    FSError(#[from] crate::filesystem::Error),

    #[error(transparent)]
    ShareError(#[from] share_types::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::DavError(err) => err.status_code(),
            Error::FSError(err) => err.status_code(),
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::BodyError(_) => StatusCode::BAD_REQUEST,
            Error::ShareError(share_types::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            Error::ShareError(share_types::Error::Forbidden(_)) => StatusCode::FORBIDDEN,
            Error::IoError(_) | Error::ShareError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::DavError(err) => err.into_response(),
            Error::FSError(err) => err.into_response(),
            _ => (self.status_code(), self.to_string()).into_response(),
        }
    }
}
