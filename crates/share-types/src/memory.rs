use crate::{Error, NodeId, ShareDirectory, ShareRecord, ShareType};
use std::sync::{
    RwLock,
    atomic::{AtomicU64, Ordering},
};

const FIRST_SHARE_ID: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShareId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    pub owner: String,
    pub node_id: NodeId,
    pub share_type: ShareType,
    pub share_with: Option<String>,
}

impl From<&Share> for ShareRecord {
    fn from(share: &Share) -> Self {
        Self {
            node_id: share.node_id,
            share_type: share.share_type,
        }
    }
}

/// Share storage kept in memory for the lifetime of the process.
#[derive(Debug)]
pub struct MemoryShareDirectory {
    shares: RwLock<Vec<(ShareId, Share)>>,
    counter: AtomicU64,
}

impl Default for MemoryShareDirectory {
    fn default() -> Self {
        Self {
            shares: RwLock::default(),
            counter: AtomicU64::new(FIRST_SHARE_ID),
        }
    }
}

impl MemoryShareDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, share: Share) -> Result<ShareId, Error> {
        let id = ShareId(self.counter.fetch_add(1, Ordering::Relaxed));
        self.shares
            .write()
            .map_err(|_| Error::Backend("share store poisoned".to_owned()))?
            .push((id, share));
        Ok(id)
    }

    pub fn remove(&self, id: ShareId) -> Result<Option<Share>, Error> {
        let mut shares = self
            .shares
            .write()
            .map_err(|_| Error::Backend("share store poisoned".to_owned()))?;
        Ok(shares
            .iter()
            .position(|(share_id, _)| *share_id == id)
            .map(|pos| shares.remove(pos).1))
    }

    pub fn shares_by_owner(&self, owner: &str) -> Result<Vec<(ShareId, Share)>, Error> {
        Ok(self
            .shares
            .read()
            .map_err(|_| Error::Backend("share store poisoned".to_owned()))?
            .iter()
            .filter(|(_, share)| share.owner == owner)
            .cloned()
            .collect())
    }

    pub fn len(&self) -> usize {
        self.shares.read().map(|shares| shares.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ShareDirectory for MemoryShareDirectory {
    fn shares_for(
        &self,
        user: &str,
        share_types: &[ShareType],
        node_ids: &[NodeId],
    ) -> Result<Vec<ShareRecord>, Error> {
        Ok(self
            .shares
            .read()
            .map_err(|_| Error::Backend("share store poisoned".to_owned()))?
            .iter()
            .map(|(_, share)| share)
            .filter(|share| {
                share.owner == user
                    && share_types.contains(&share.share_type)
                    && node_ids.contains(&share.node_id)
            })
            .map(ShareRecord::from)
            .collect())
    }
}
