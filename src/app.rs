use crate::{
    dav::{
        User,
        fs::{FSPrincipalUri, FSResourceService, SharedDirectory},
    },
    filesystem::FilesystemProvider,
};
use axum::{Extension, Router};
use rustical_dav::resource::ResourceService;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn make_app<FSP: FilesystemProvider>(
    fs_provider: Arc<FSP>,
    shares: SharedDirectory,
    user: String,
) -> Router {
    let service = FSResourceService::new(fs_provider, shares);
    Router::new()
        .route_service("/dav/mount/{mount}", service.clone().axum_service())
        .route_service("/dav/mount/{mount}/{*path}", service.axum_service())
        .layer(Extension(FSPrincipalUri))
        .layer(Extension(User(user)))
        .layer(TraceLayer::new_for_http())
}
