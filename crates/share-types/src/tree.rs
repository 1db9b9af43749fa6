use crate::{Error, Node, NodeId, ShareRecord, ShareType};
use std::sync::Arc;

/// Resolves paths to nodes and lists folders.
pub trait FileTree {
    fn get(&self, path: &str) -> Result<Node, Error>;
    fn list_children(&self, node: &Node) -> Result<Vec<Node>, Error>;
}

/// Looks up the shares a user created on a set of nodes.
pub trait ShareDirectory {
    fn shares_for(
        &self,
        user: &str,
        share_types: &[ShareType],
        node_ids: &[NodeId],
    ) -> Result<Vec<ShareRecord>, Error>;
}

impl<T: FileTree + ?Sized> FileTree for &T {
    fn get(&self, path: &str) -> Result<Node, Error> {
        (**self).get(path)
    }
    fn list_children(&self, node: &Node) -> Result<Vec<Node>, Error> {
        (**self).list_children(node)
    }
}

impl<T: FileTree + ?Sized> FileTree for Arc<T> {
    fn get(&self, path: &str) -> Result<Node, Error> {
        (**self).get(path)
    }
    fn list_children(&self, node: &Node) -> Result<Vec<Node>, Error> {
        (**self).list_children(node)
    }
}

impl<D: ShareDirectory + ?Sized> ShareDirectory for &D {
    fn shares_for(
        &self,
        user: &str,
        share_types: &[ShareType],
        node_ids: &[NodeId],
    ) -> Result<Vec<ShareRecord>, Error> {
        (**self).shares_for(user, share_types, node_ids)
    }
}

impl<D: ShareDirectory + ?Sized> ShareDirectory for Arc<D> {
    fn shares_for(
        &self,
        user: &str,
        share_types: &[ShareType],
        node_ids: &[NodeId],
    ) -> Result<Vec<ShareRecord>, Error> {
        (**self).shares_for(user, share_types, node_ids)
    }
}
