use rustical_xml::XmlSerialize;
use share_types::{
    Depth, Error, FileTree, Node, ShareAnnotator, ShareDirectory, ShareTypeList,
    ShareTypesResolver,
};
use std::sync::{Arc, Mutex, PoisonError};

pub type SharedDirectory = Arc<dyn ShareDirectory + Send + Sync>;

#[derive(Debug, Clone, PartialEq, XmlSerialize)]
pub struct ShareTypes {
    #[xml(ns = "crate::dav::NS_OWNCLOUD", flatten)]
    share_type: Vec<u64>,
}

impl From<ShareTypeList> for ShareTypes {
    fn from(value: ShareTypeList) -> Self {
        Self {
            share_type: value.codes().into_iter().map(u64::from).collect(),
        }
    }
}

struct Listing {
    folder: Node,
    // Outcome of the folder's listing pass once it ran
    resolver: Option<Option<ShareTypesResolver>>,
}

struct Scope<FS> {
    tree: Arc<FS>,
    directory: SharedDirectory,
    // Bound to the principal of the first resolution
    annotator: Option<ShareAnnotator<Arc<FS>, SharedDirectory>>,
    listing: Option<Listing>,
}

/// Share-type state of one request, shared by all resources it produced.
pub struct RequestShares<FS>(Arc<Mutex<Scope<FS>>>);

impl<FS> Clone for RequestShares<FS> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<FS: FileTree> RequestShares<FS> {
    pub fn new(tree: FS, directory: SharedDirectory) -> Self {
        Self(Arc::new(Mutex::new(Scope {
            tree: Arc::new(tree),
            directory,
            annotator: None,
            listing: None,
        })))
    }

    /// Scope whose first resolution runs the listing pass of `folder`,
    /// batching the folder and its children into one lookup.
    pub fn for_listing(tree: FS, directory: SharedDirectory, folder: Node) -> Self {
        let shares = Self::new(tree, directory);
        shares.scope().listing = Some(Listing {
            folder,
            resolver: None,
        });
        shares
    }

    fn scope(&self) -> std::sync::MutexGuard<'_, Scope<FS>> {
        // The cache stays consistent even if a holder panicked
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Share types `user` created on `node`. `None` if the node is neither
    /// file nor folder, or if it is the listed folder and its listing holds
    /// such a node.
    pub fn share_types(&self, user: &str, node: &Node) -> Result<Option<ShareTypeList>, Error> {
        let mut scope = self.scope();
        let Scope {
            tree,
            directory,
            annotator,
            listing,
        } = &mut *scope;

        if annotator.as_ref().is_some_and(|annotator| annotator.user() != user) {
            *annotator = None;
            if let Some(listing) = listing.as_mut() {
                listing.resolver = None;
            }
        }
        let annotator = annotator
            .get_or_insert_with(|| ShareAnnotator::new(tree.clone(), directory.clone(), user));

        if let Some(listing) = listing.as_mut() {
            let folder_resolver = match &listing.resolver {
                Some(resolver) => resolver.clone(),
                None => {
                    let resolver = annotator.handle_propfind(&listing.folder, Depth::One, true)?;
                    listing.resolver = Some(resolver.clone());
                    resolver
                }
            };
            if node.path == listing.folder.path {
                return match folder_resolver {
                    Some(resolver) => Ok(Some(annotator.resolve(&resolver)?)),
                    None => Ok(None),
                };
            }
        }

        let Some(resolver) = annotator.handle_propfind(node, Depth::Zero, true)? else {
            return Ok(None);
        };
        Ok(Some(annotator.resolve(&resolver)?))
    }
}
