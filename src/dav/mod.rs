mod error;
pub mod fs;

use axum::extract::FromRequestParts;
pub use error::Error;
use http::request::Parts;
use quick_xml::name::Namespace;
use rustical_dav::Principal;

/// Namespace of the ownCloud property extensions
pub const NS_OWNCLOUD: Namespace<'static> = Namespace(b"http://owncloud.org/ns");

#[derive(Debug, derive_more::From, Clone)]
pub struct User(pub String);

impl Principal for User {
    fn get_id(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for User {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .ok_or(Error::Unauthorized)
    }
}
