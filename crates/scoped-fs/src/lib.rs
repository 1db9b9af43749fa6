mod error;
pub use error::Error;
use serde::Deserialize;
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Path relative to a mount root, without leading or trailing slashes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopedPath(String);

impl ScopedPath {
    pub fn new(path: String) -> Self {
        Self(path.trim_matches('/').to_owned())
    }

    /// Joins the path onto `base`, refusing segments that climb out of it.
    pub fn with_base(&self, base: &Path) -> Result<PathBuf, Error> {
        if self.segments().any(|segment| segment == "..") {
            return Err(Error::OutsideScope(self.0.clone()));
        }
        Ok(base.join(&self.0))
    }

    pub fn join_segment(&self, name: &str) -> Self {
        let mut path = self.clone();
        let name = name.trim_matches('/');
        if !path.0.is_empty() && !name.is_empty() {
            path.0.push('/');
        }
        path.0.push_str(name);
        path
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(match self.0.rsplit_once('/') {
            Some((prefix, _filename)) => Self(prefix.to_owned()),
            None => Self::default(),
        })
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|segment| !segment.is_empty())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> &str {
        if let Some((_prefix, filename)) = self.0.rsplit_once('/') {
            filename
        } else {
            self.0.as_str()
        }
    }

    pub fn file_extension(&self) -> Option<&str> {
        let filename = self.file_name();
        filename.rsplit_once('.').map(|(_prefix, ext)| ext)
    }
}

impl fmt::Display for ScopedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopedPath {
    fn from(value: &str) -> Self {
        Self::new(value.to_owned())
    }
}

impl<'de> Deserialize<'de> for ScopedPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self::new(String::deserialize(deserializer)?))
    }
}
