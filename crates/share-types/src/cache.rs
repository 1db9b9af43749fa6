use crate::{NodeId, ShareRecord, ShareTypeList};
use std::collections::HashMap;

/// Share types per node, valid for a single request.
///
/// A present key means the node has been resolved, even when its list is empty.
#[derive(Debug, Default, Clone)]
pub struct ShareTypeCache(HashMap<NodeId, ShareTypeList>);

impl ShareTypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `node_ids` as resolved with no share types, then merges `records` in.
    pub fn fill(&mut self, node_ids: &[NodeId], records: impl IntoIterator<Item = ShareRecord>) {
        for id in node_ids {
            self.0.insert(*id, ShareTypeList::default());
        }
        for record in records {
            self.0
                .entry(record.node_id)
                .or_default()
                .insert(record.share_type);
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&ShareTypeList> {
        self.0.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ShareTypeCache;
    use crate::{NodeId, ShareRecord, ShareType};

    #[test]
    fn empty_entry_counts_as_resolved() {
        let mut cache = ShareTypeCache::new();
        cache.fill(&[NodeId(1)], []);
        assert!(cache.contains(NodeId(1)));
        assert!(cache.get(NodeId(1)).unwrap().is_empty());
        assert!(!cache.contains(NodeId(2)));
    }

    #[test]
    fn fill_resets_previous_entries() {
        let mut cache = ShareTypeCache::new();
        cache.fill(
            &[NodeId(1)],
            [ShareRecord {
                node_id: NodeId(1),
                share_type: ShareType::Link,
            }],
        );
        cache.fill(&[NodeId(1)], []);
        assert!(cache.get(NodeId(1)).unwrap().is_empty());
        assert_eq!(cache.len(), 1);
    }
}
