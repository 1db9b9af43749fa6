use crate::{
    config::ShareConfig,
    filesystem::{Error, FilesystemProvider},
};
use share_types::{FileTree, MemoryShareDirectory, Share};
use tracing::{info, warn};

/// Resolves the configured shares to node ids. Entries whose mount or path
/// does not exist are skipped.
pub async fn load_shares<FSP: FilesystemProvider>(
    provider: &FSP,
    shares: &[ShareConfig],
) -> Result<MemoryShareDirectory, share_types::Error> {
    let directory = MemoryShareDirectory::new();
    for share in shares {
        let fs = match provider.get_filesystem(&share.mount).await {
            Ok(fs) => fs,
            Err(Error::NotFound) => {
                warn!(mount = %share.mount, "skipping share on unknown mount");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        let node = match fs.get(&share.path) {
            Ok(node) => node,
            Err(share_types::Error::NotFound(path)) => {
                warn!(mount = %share.mount, %path, "skipping share on missing path");
                continue;
            }
            Err(err) => return Err(err),
        };
        let owner = share.owner.clone().unwrap_or_else(|| share.mount.clone());
        let id = directory.insert(Share {
            owner,
            node_id: node.id,
            share_type: share.share_type,
            share_with: share.share_with.clone(),
        })?;
        info!(share = id.0, mount = %share.mount, path = %node.path, share_type = %share.share_type, "loaded share");
    }
    Ok(directory)
}

#[cfg(test)]
mod tests {
    use super::load_shares;
    use crate::{config::ShareConfig, filesystem::SimpleFilesystemProvider};
    use share_types::{NodeId, ShareDirectory, ShareType};
    use std::os::unix::fs::MetadataExt;

    fn share(mount: &str, path: &str, share_type: ShareType) -> ShareConfig {
        ShareConfig {
            mount: mount.to_owned(),
            path: path.to_owned(),
            owner: None,
            share_type,
            share_with: None,
        }
    }

    #[tokio::test]
    async fn resolves_paths_to_inodes() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("alice/docs")).unwrap();
        let inode = std::fs::metadata(root.path().join("alice/docs"))
            .unwrap()
            .ino();
        let provider = SimpleFilesystemProvider::new(root.path().to_owned());

        let directory = load_shares(
            &provider,
            &[
                share("alice", "docs", ShareType::Link),
                share("alice", "missing", ShareType::User),
                share("bob", "docs", ShareType::User),
            ],
        )
        .await
        .unwrap();

        assert_eq!(directory.len(), 1);
        let records = directory
            .shares_for("alice", &ShareType::ALL, &[NodeId(inode)])
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].share_type, ShareType::Link);
    }

    #[tokio::test]
    async fn explicit_owner_overrides_mount() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("team/plans")).unwrap();
        let inode = std::fs::metadata(root.path().join("team/plans"))
            .unwrap()
            .ino();
        let provider = SimpleFilesystemProvider::new(root.path().to_owned());

        let mut config = share("team", "plans", ShareType::Group);
        config.owner = Some("carol".to_owned());
        let directory = load_shares(&provider, &[config]).await.unwrap();

        assert!(directory
            .shares_for("team", &ShareType::ALL, &[NodeId(inode)])
            .unwrap()
            .is_empty());
        assert_eq!(
            directory
                .shares_for("carol", &ShareType::ALL, &[NodeId(inode)])
                .unwrap()
                .len(),
            1
        );
    }
}
