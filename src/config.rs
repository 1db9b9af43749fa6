use serde::{Deserialize, Serialize};
use share_types::ShareType;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub dav: DavConfig,
    #[serde(default)]
    pub shares: Vec<ShareConfig>,

    pub fs: FSConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FSConfig {
    pub root_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DavConfig {
    /// Principal every request is served as
    pub user: String,
}

impl Default for DavConfig {
    fn default() -> Self {
        Self {
            user: "user".to_owned(),
        }
    }
}

/// A share on `path` inside `mount`, owned by `owner` or else by the user
/// named like the mount
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ShareConfig {
    pub mount: String,
    pub path: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub share_type: ShareType,
    #[serde(default)]
    pub share_with: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct TracingConfig {
    pub opentelemetry: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            opentelemetry: true,
        }
    }
}
