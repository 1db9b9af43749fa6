//! Share-type annotation for WebDAV listings.
mod annotator;
mod cache;
mod error;
mod memory;
mod node;
mod share;
mod tree;

pub use annotator::{Depth, REQUESTED_SHARE_TYPES, ShareAnnotator, ShareTypesResolver};
pub use cache::ShareTypeCache;
pub use error::Error;
pub use memory::{MemoryShareDirectory, Share, ShareId};
pub use node::{Node, NodeId, NodeKind};
pub use share::{ShareRecord, ShareType, ShareTypeList};
pub use tree::{FileTree, ShareDirectory};
