use crate::{Error, FileTree, Node, NodeId, ShareDirectory, ShareType, ShareTypeCache, ShareTypeList};
use tracing::{instrument, warn};

/// Share types requested from the directory on every lookup.
pub const REQUESTED_SHARE_TYPES: [ShareType; 4] = ShareType::ALL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Zero,
    One,
}

/// Handle for the deferred `share-types` property of one node.
///
/// Obtained from [`ShareAnnotator::handle_propfind`] and resolved with
/// [`ShareAnnotator::resolve`] once the response is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareTypesResolver {
    node_id: NodeId,
    path: String,
}

/// Attaches share types to the nodes of one PROPFIND request.
///
/// When a folder listing is requested, the share types of the folder and all
/// of its children are fetched with a single directory lookup, so resolving
/// the children afterwards does not hit the directory again.
pub struct ShareAnnotator<T, D> {
    tree: T,
    directory: D,
    user: String,
    cache: ShareTypeCache,
}

impl<T: FileTree, D: ShareDirectory> ShareAnnotator<T, D> {
    pub fn new(tree: T, directory: D, user: impl Into<String>) -> Self {
        Self {
            tree,
            directory,
            user: user.into(),
            cache: ShareTypeCache::new(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn cache(&self) -> &ShareTypeCache {
        &self.cache
    }

    /// First phase: prefetches a folder listing if needed and hands out the
    /// resolver for `node`. Returns `None` if the node carries no share types.
    #[instrument(skip(self, node), fields(path = %node.path))]
    pub fn handle_propfind(
        &mut self,
        node: &Node,
        depth: Depth,
        share_types_requested: bool,
    ) -> Result<Option<ShareTypesResolver>, Error> {
        if !node.kind.is_file_or_directory() {
            return Ok(None);
        }

        if node.is_directory() && depth != Depth::Zero && share_types_requested {
            let folder = self.tree.get(&node.path)?;
            let children = self.tree.list_children(&folder)?;

            if let Some(child) = children
                .iter()
                .find(|child| !child.kind.is_file_or_directory())
            {
                warn!(
                    child = %child.path,
                    "listing contains a node that is neither file nor folder, skipping share types"
                );
                return Ok(None);
            }

            let node_ids: Vec<_> = std::iter::once(folder.id)
                .chain(children.iter().map(|child| child.id))
                .collect();
            self.lookup(&node_ids)?;
        }

        Ok(Some(ShareTypesResolver {
            node_id: node.id,
            path: node.path.clone(),
        }))
    }

    /// Second phase: share types of the resolver's node, served from the
    /// cache or fetched individually on a miss.
    pub fn resolve(&mut self, resolver: &ShareTypesResolver) -> Result<ShareTypeList, Error> {
        if let Some(share_types) = self.cache.get(resolver.node_id) {
            return Ok(share_types.clone());
        }

        let node_id = self.tree.get(&resolver.path)?.id;
        self.lookup(&[node_id])?;
        Ok(self.cache.get(node_id).cloned().unwrap_or_default())
    }

    fn lookup(&mut self, node_ids: &[NodeId]) -> Result<(), Error> {
        let records = self
            .directory
            .shares_for(&self.user, &REQUESTED_SHARE_TYPES, node_ids)?;
        self.cache.fill(node_ids, records);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Depth, ShareAnnotator};
    use crate::{
        Error, FileTree, MemoryShareDirectory, Node, NodeId, NodeKind, Share, ShareDirectory,
        ShareRecord, ShareType,
    };
    use std::{cell::RefCell, collections::HashMap};

    #[derive(Default)]
    struct MemoryTree {
        nodes: HashMap<String, Node>,
        children: HashMap<NodeId, Vec<Node>>,
    }

    impl MemoryTree {
        fn with_node(mut self, node: Node, parent: Option<NodeId>) -> Self {
            if let Some(parent) = parent {
                self.children.entry(parent).or_default().push(node.clone());
            }
            self.nodes.insert(node.path.clone(), node);
            self
        }
    }

    impl FileTree for MemoryTree {
        fn get(&self, path: &str) -> Result<Node, Error> {
            self.nodes
                .get(path)
                .cloned()
                .ok_or_else(|| Error::NotFound(path.to_owned()))
        }

        fn list_children(&self, node: &Node) -> Result<Vec<Node>, Error> {
            Ok(self.children.get(&node.id).cloned().unwrap_or_default())
        }
    }

    /// Records every lookup before delegating.
    #[derive(Default)]
    struct RecordingDirectory {
        inner: MemoryShareDirectory,
        lookups: RefCell<Vec<Vec<NodeId>>>,
        fail: bool,
    }

    impl RecordingDirectory {
        fn share(self, node: u64, share_type: ShareType) -> Self {
            self.inner
                .insert(Share {
                    owner: "alice".to_owned(),
                    node_id: NodeId(node),
                    share_type,
                    share_with: None,
                })
                .unwrap();
            self
        }

        fn lookups(&self) -> Vec<Vec<NodeId>> {
            self.lookups.borrow().clone()
        }
    }

    impl ShareDirectory for RecordingDirectory {
        fn shares_for(
            &self,
            user: &str,
            share_types: &[ShareType],
            node_ids: &[NodeId],
        ) -> Result<Vec<ShareRecord>, Error> {
            self.lookups.borrow_mut().push(node_ids.to_vec());
            if self.fail {
                return Err(Error::Backend("unavailable".to_owned()));
            }
            self.inner.shares_for(user, share_types, node_ids)
        }
    }

    fn listing() -> MemoryTree {
        MemoryTree::default()
            .with_node(Node::directory(5, "d"), None)
            .with_node(Node::file(6, "d/f1"), Some(NodeId(5)))
            .with_node(Node::file(7, "d/f2"), Some(NodeId(5)))
    }

    fn ids(ids: &[u64]) -> Vec<NodeId> {
        ids.iter().copied().map(NodeId).collect()
    }

    #[test]
    fn listing_is_fetched_in_one_batch() {
        let tree = listing();
        let directory = RecordingDirectory::default()
            .share(5, ShareType::User)
            .share(6, ShareType::Link)
            .share(6, ShareType::Group);
        let mut annotator = ShareAnnotator::new(&tree, &directory, "alice");

        let folder = tree.get("d").unwrap();
        let resolver = annotator
            .handle_propfind(&folder, Depth::One, true)
            .unwrap()
            .unwrap();
        assert_eq!(directory.lookups(), vec![ids(&[5, 6, 7])]);
        assert_eq!(
            annotator.resolve(&resolver).unwrap().as_slice(),
            &[ShareType::User]
        );

        let f1 = annotator
            .handle_propfind(&tree.get("d/f1").unwrap(), Depth::Zero, true)
            .unwrap()
            .unwrap();
        let f2 = annotator
            .handle_propfind(&tree.get("d/f2").unwrap(), Depth::Zero, true)
            .unwrap()
            .unwrap();
        assert_eq!(
            annotator.resolve(&f1).unwrap().as_slice(),
            &[ShareType::Link, ShareType::Group]
        );
        assert!(annotator.resolve(&f2).unwrap().is_empty());

        assert_eq!(directory.lookups().len(), 1);
    }

    #[test]
    fn single_file_is_looked_up_alone() {
        let tree = MemoryTree::default().with_node(Node::file(9, "f"), None);
        let directory = RecordingDirectory::default();
        let mut annotator = ShareAnnotator::new(&tree, &directory, "alice");

        let resolver = annotator
            .handle_propfind(&tree.get("f").unwrap(), Depth::One, true)
            .unwrap()
            .unwrap();
        assert!(directory.lookups().is_empty());

        assert!(annotator.resolve(&resolver).unwrap().is_empty());
        assert!(annotator.resolve(&resolver).unwrap().is_empty());
        assert_eq!(directory.lookups(), vec![ids(&[9])]);
        assert!(annotator.cache().contains(NodeId(9)));
    }

    #[test]
    fn duplicate_records_collapse() {
        let tree = listing();
        let directory = RecordingDirectory::default()
            .share(6, ShareType::Link)
            .share(6, ShareType::Link)
            .share(6, ShareType::Remote);
        let mut annotator = ShareAnnotator::new(&tree, &directory, "alice");

        let resolver = annotator
            .handle_propfind(&tree.get("d/f1").unwrap(), Depth::Zero, true)
            .unwrap()
            .unwrap();
        assert_eq!(
            annotator.resolve(&resolver).unwrap().codes(),
            vec![3, 6]
        );
    }

    #[test]
    fn depth_zero_folder_is_not_prefetched() {
        let tree = listing();
        let directory = RecordingDirectory::default();
        let mut annotator = ShareAnnotator::new(&tree, &directory, "alice");

        let resolver = annotator
            .handle_propfind(&tree.get("d").unwrap(), Depth::Zero, true)
            .unwrap()
            .unwrap();
        annotator.resolve(&resolver).unwrap();
        assert_eq!(directory.lookups(), vec![ids(&[5])]);
    }

    #[test]
    fn unrequested_property_skips_prefetch() {
        let tree = listing();
        let directory = RecordingDirectory::default();
        let mut annotator = ShareAnnotator::new(&tree, &directory, "alice");

        let resolver = annotator
            .handle_propfind(&tree.get("d").unwrap(), Depth::One, false)
            .unwrap();
        assert!(resolver.is_some());
        assert!(directory.lookups().is_empty());
    }

    #[test]
    fn other_nodes_get_no_resolver() {
        let tree = MemoryTree::default();
        let directory = RecordingDirectory::default();
        let mut annotator = ShareAnnotator::new(&tree, &directory, "alice");

        let fifo = Node::new(3, "pipe", NodeKind::Other);
        assert_eq!(
            annotator.handle_propfind(&fifo, Depth::One, true).unwrap(),
            None
        );
        assert!(directory.lookups().is_empty());
    }

    #[test]
    fn malformed_child_aborts_listing() {
        let tree = listing().with_node(Node::new(8, "d/socket", NodeKind::Other), Some(NodeId(5)));
        let directory = RecordingDirectory::default().share(5, ShareType::User);
        let mut annotator = ShareAnnotator::new(&tree, &directory, "alice");

        let resolver = annotator
            .handle_propfind(&tree.get("d").unwrap(), Depth::One, true)
            .unwrap();
        assert_eq!(resolver, None);
        assert!(directory.lookups().is_empty());
        assert!(annotator.cache().is_empty());

        // Siblings still resolve on their own.
        let f1 = annotator
            .handle_propfind(&tree.get("d/f1").unwrap(), Depth::Zero, true)
            .unwrap()
            .unwrap();
        assert!(annotator.resolve(&f1).unwrap().is_empty());
        assert_eq!(directory.lookups(), vec![ids(&[6])]);
    }

    #[test]
    fn failed_lookup_leaves_cache_untouched() {
        let tree = listing();
        let directory = RecordingDirectory {
            fail: true,
            ..Default::default()
        };
        let mut annotator = ShareAnnotator::new(&tree, &directory, "alice");

        let result = annotator.handle_propfind(&tree.get("d").unwrap(), Depth::One, true);
        assert!(matches!(result, Err(Error::Backend(_))));
        assert!(annotator.cache().is_empty());
    }

    #[test]
    fn missing_path_propagates() {
        let tree = listing();
        let directory = RecordingDirectory::default();
        let mut annotator = ShareAnnotator::new(&tree, &directory, "alice");

        let gone = Node::directory(42, "gone");
        let result = annotator.handle_propfind(&gone, Depth::One, true);
        assert!(matches!(result, Err(Error::NotFound(path)) if path == "gone"));

        let resolver = annotator
            .handle_propfind(&gone, Depth::Zero, true)
            .unwrap()
            .unwrap();
        assert!(matches!(annotator.resolve(&resolver), Err(Error::NotFound(_))));
        assert!(directory.lookups().is_empty());
    }

    #[test]
    fn shares_of_other_users_are_ignored() {
        let tree = listing();
        let directory = RecordingDirectory::default().share(6, ShareType::Link);
        let mut annotator = ShareAnnotator::new(&tree, &directory, "bob");

        let resolver = annotator
            .handle_propfind(&tree.get("d/f1").unwrap(), Depth::Zero, true)
            .unwrap()
            .unwrap();
        assert!(annotator.resolve(&resolver).unwrap().is_empty());
    }
}
