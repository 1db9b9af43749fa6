use async_trait::async_trait;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use scoped_fs::ScopedPath;
use share_types::{FileTree, Node, NodeId, NodeKind};
use std::{
    fs::Metadata,
    io::ErrorKind,
    os::unix::fs::MetadataExt,
    path::{Path, PathBuf},
    time::SystemTime,
};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("Not Found")]
    NotFound,
    #[error("Conflict")]
    Conflict,
    #[error(transparent)]
    Scope(#[from] scoped_fs::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::IOError(err) if err.kind() == ErrorKind::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Scope(scoped_fs::Error::OutsideScope(_)) => StatusCode::FORBIDDEN,
            Self::Scope(scoped_fs::Error::NotFound) => StatusCode::NOT_FOUND,
            Self::Scope(scoped_fs::Error::Conflict) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

impl From<Error> for share_types::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::IOError(err) if err.kind() == ErrorKind::NotFound => {
                Self::NotFound(err.to_string())
            }
            Error::IOError(err) => Self::IO(err),
            err @ (Error::NotFound | Error::Scope(scoped_fs::Error::NotFound)) => {
                Self::NotFound(err.to_string())
            }
            Error::Scope(scoped_fs::Error::OutsideScope(path)) => Self::Forbidden(path),
            other => Self::Backend(other.to_string()),
        }
    }
}

pub trait DavMetadata: Clone + Send + Sync + 'static {
    fn is_dir(&self) -> bool;
    fn len(&self) -> u64;
    fn created(&self) -> SystemTime;
    fn modified(&self) -> SystemTime;
    fn node_id(&self) -> NodeId;
    fn node_kind(&self) -> NodeKind;
}

#[derive(Debug, Clone)]
pub struct FileMetadata {
    kind: NodeKind,
    len: u64,
    created: SystemTime,
    modified: SystemTime,
    inode: u64,
}

impl From<&Metadata> for FileMetadata {
    fn from(md: &Metadata) -> Self {
        let kind = if md.is_dir() {
            NodeKind::Directory
        } else if md.is_file() {
            NodeKind::File
        } else {
            NodeKind::Other
        };
        let modified = md.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Self {
            kind,
            len: md.len(),
            // Not every filesystem records a birth time
            created: md.created().unwrap_or(modified),
            modified,
            inode: md.ino(),
        }
    }
}

impl DavMetadata for FileMetadata {
    fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
    fn len(&self) -> u64 {
        self.len
    }
    fn created(&self) -> SystemTime {
        self.created
    }
    fn modified(&self) -> SystemTime {
        self.modified
    }
    fn node_id(&self) -> NodeId {
        NodeId(self.inode)
    }
    fn node_kind(&self) -> NodeKind {
        self.kind
    }
}

#[async_trait]
pub trait FilesystemProvider: Send + Sync + 'static {
    type FS: Filesystem;

    async fn get_filesystem(&self, mount: &str) -> Result<Self::FS, Error>;
}

#[async_trait]
pub trait Filesystem: FileTree + Send + Sync + 'static {
    type Metadata: DavMetadata;

    async fn metadata(&self, path: &ScopedPath) -> Result<Self::Metadata, Error>;
    async fn list_dir(&self, path: &ScopedPath) -> Result<Vec<ScopedPath>, Error>;
    async fn get_file(&self, path: &ScopedPath) -> Result<tokio::fs::File, Error>;
    async fn create_dir(&self, path: &ScopedPath) -> Result<(), Error>;
    async fn create_file(&self, path: &ScopedPath) -> Result<tokio::fs::File, Error>;
    async fn delete(&self, path: &ScopedPath) -> Result<(), Error>;
    /// Returns whether the destination existed before
    async fn copy(&self, from: &ScopedPath, to: &ScopedPath, overwrite: bool) -> Result<bool, Error>;
    /// Returns whether the destination existed before
    async fn mv(&self, from: &ScopedPath, to: &ScopedPath, overwrite: bool) -> Result<bool, Error>;
}

pub struct SimpleFilesystemProvider {
    root_path: PathBuf,
}

impl SimpleFilesystemProvider {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }
}

#[async_trait]
impl FilesystemProvider for SimpleFilesystemProvider {
    type FS = SimpleFilesystem;

    async fn get_filesystem(&self, mount: &str) -> Result<SimpleFilesystem, Error> {
        let root_path = ScopedPath::from(mount).with_base(&self.root_path)?;
        if mount.is_empty() || mount.contains('/') || !root_path.is_dir() {
            return Err(Error::NotFound);
        }
        Ok(SimpleFilesystem { root_path })
    }
}

pub struct SimpleFilesystem {
    root_path: PathBuf,
}

impl SimpleFilesystem {
    fn resolve(&self, path: &ScopedPath) -> Result<PathBuf, Error> {
        Ok(path.with_base(&self.root_path)?)
    }

    fn node(path: ScopedPath, md: &Metadata) -> Node {
        let md = FileMetadata::from(md);
        Node::new(md.node_id().0, path.as_str(), md.node_kind())
    }
}

/// Follows symlinks, falling back to the link itself when it dangles.
fn stat(path: &Path) -> std::io::Result<Metadata> {
    std::fs::metadata(path).or_else(|_| std::fs::symlink_metadata(path))
}

fn copy_recursive(from: &Path, to: &Path) -> std::io::Result<()> {
    if from.is_dir() {
        std::fs::create_dir_all(to)?;
        for entry in std::fs::read_dir(from)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
        }
    } else {
        std::fs::copy(from, to)?;
    }
    Ok(())
}

/// Source and destination are the same node or one contains the other.
fn overlapping(from: &Path, to: &Path) -> bool {
    to.starts_with(from) || from.starts_with(to)
}

fn remove_any(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

#[async_trait]
impl Filesystem for SimpleFilesystem {
    type Metadata = FileMetadata;

    async fn metadata(&self, path: &ScopedPath) -> Result<FileMetadata, Error> {
        let sub_path = self.resolve(path)?;
        match stat(&sub_path) {
            Ok(md) => Ok(FileMetadata::from(&md)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(Error::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_dir(&self, path: &ScopedPath) -> Result<Vec<ScopedPath>, Error> {
        let sub_path = self.resolve(path)?;
        if !sub_path.is_dir() {
            return Ok(vec![]);
        }
        let mut entries = tokio::fs::read_dir(&sub_path).await?;
        let mut result = vec![];
        while let Some(entry) = entries.next_entry().await? {
            result.push(path.join_segment(&entry.file_name().to_string_lossy()));
        }
        Ok(result)
    }

    async fn get_file(&self, path: &ScopedPath) -> Result<tokio::fs::File, Error> {
        let sub_path = self.resolve(path)?;
        if !sub_path.is_file() {
            return Err(Error::NotFound);
        }
        Ok(tokio::fs::File::open(sub_path).await?)
    }

    async fn create_dir(&self, path: &ScopedPath) -> Result<(), Error> {
        let sub_path = self.resolve(path)?;
        if sub_path.exists() {
            return Err(Error::Conflict);
        }
        debug!(path = %path, "creating directory");
        Ok(tokio::fs::create_dir(&sub_path).await?)
    }

    async fn create_file(&self, path: &ScopedPath) -> Result<tokio::fs::File, Error> {
        let sub_path = self.resolve(path)?;
        if sub_path.is_dir() {
            return Err(Error::Conflict);
        }
        Ok(tokio::fs::File::create(sub_path).await?)
    }

    async fn delete(&self, path: &ScopedPath) -> Result<(), Error> {
        if path.is_root() {
            return Err(Error::Conflict);
        }
        let sub_path = self.resolve(path)?;
        if !sub_path.exists() {
            return Err(Error::NotFound);
        }
        debug!(path = %path, "deleting");
        Ok(remove_any(&sub_path)?)
    }

    async fn copy(
        &self,
        from: &ScopedPath,
        to: &ScopedPath,
        overwrite: bool,
    ) -> Result<bool, Error> {
        let sub_path_from = self.resolve(from)?;
        let sub_path_to = self.resolve(to)?;
        if !sub_path_from.exists() {
            return Err(Error::NotFound);
        }
        if overlapping(&sub_path_from, &sub_path_to) {
            return Err(Error::Conflict);
        }
        let existed = sub_path_to.exists();
        if existed {
            if !overwrite {
                return Err(Error::Conflict);
            }
            remove_any(&sub_path_to)?;
        }
        copy_recursive(&sub_path_from, &sub_path_to)?;
        Ok(existed)
    }

    async fn mv(&self, from: &ScopedPath, to: &ScopedPath, overwrite: bool) -> Result<bool, Error> {
        let sub_path_from = self.resolve(from)?;
        let sub_path_to = self.resolve(to)?;
        if !sub_path_from.exists() {
            return Err(Error::NotFound);
        }
        if overlapping(&sub_path_from, &sub_path_to) {
            return Err(Error::Conflict);
        }
        let existed = sub_path_to.exists();
        if existed {
            if !overwrite {
                return Err(Error::Conflict);
            }
            remove_any(&sub_path_to)?;
        }
        tokio::fs::rename(sub_path_from, sub_path_to).await?;
        Ok(existed)
    }
}

impl FileTree for SimpleFilesystem {
    fn get(&self, path: &str) -> Result<Node, share_types::Error> {
        let path = ScopedPath::from(path);
        let sub_path = self.resolve(&path)?;
        match std::fs::metadata(&sub_path) {
            Ok(md) => Ok(Self::node(path, &md)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(share_types::Error::NotFound(path.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn list_children(&self, node: &Node) -> Result<Vec<Node>, share_types::Error> {
        let path = ScopedPath::from(node.path.as_str());
        let sub_path = self.resolve(&path)?;
        let mut children = vec![];
        for entry in std::fs::read_dir(sub_path)? {
            let entry = entry?;
            let child = path.join_segment(&entry.file_name().to_string_lossy());
            children.push(Self::node(child, &stat(&entry.path())?));
        }
        Ok(children)
    }
}
