mod get;
mod mkcol;
mod put;

pub use get::route_get;
pub use mkcol::route_mkcol;
pub use put::route_put;
