//! Sources of helper metadata for `get`, `ols` and `fls`.
//!
//! A running service answers `Helper.list` through its RPC bridge. The same
//! response saved to a file works offline.

use serde::{Deserialize, Serialize};
use sr_core::meta::{HelperList, HelperQuery, ObjectMeta};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Action every service registers for its helper metadata.
pub const HELPER_ACTION: &str = "Helper.list";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request to {address} failed: {message}")]
    Http { address: String, message: String },
    #[error("invalid helper response: {0}")]
    Parse(String),
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Something that can list the RPC objects a target publishes.
pub trait HelperSource {
    fn list(&self, target: &str, query: &HelperQuery) -> Result<Vec<ObjectMeta>, ClientError>;
}

/// Request envelope the bridge forwards to `target`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RequestData<'a> {
    mark: &'a str,
    target: &'a str,
    action: &'a str,
    data: &'a HelperQuery,
}

/// Asks a live service through the HTTP bridge at `address`.
pub struct HttpHelperSource {
    address: String,
    agent: ureq::Agent,
}

impl HttpHelperSource {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            agent: ureq::Agent::new_with_config(
                ureq::config::Config::builder()
                    .timeout_global(Some(timeout))
                    .build(),
            ),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/request", self.address.trim_end_matches('/'))
    }
}

impl HelperSource for HttpHelperSource {
    fn list(&self, target: &str, query: &HelperQuery) -> Result<Vec<ObjectMeta>, ClientError> {
        let body = RequestData {
            mark: "call",
            target,
            action: HELPER_ACTION,
            data: query,
        };
        let http = |e: ureq::Error| ClientError::Http {
            address: self.address.clone(),
            message: e.to_string(),
        };
        tracing::debug!(address = %self.address, remote = target, "requesting helpers");
        let mut response = self
            .agent
            .post(&self.endpoint())
            .send_json(&body)
            .map_err(http)?;
        let list: HelperList = response
            .body_mut()
            .read_json()
            .map_err(|e| ClientError::Parse(e.to_string()))?;
        Ok(filter(list.list, query))
    }
}

/// Reads a saved `Helper.list` response: either `{"list": [...]}` or a bare
/// array of objects. The target is not checked; the file is the target.
pub struct FileHelperSource {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SavedHelpers {
    Bare(Vec<ObjectMeta>),
    List(HelperList),
}

impl FileHelperSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HelperSource for FileHelperSource {
    fn list(&self, target: &str, query: &HelperQuery) -> Result<Vec<ObjectMeta>, ClientError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| ClientError::Io {
            path: self.path.clone(),
            source,
        })?;
        let saved: SavedHelpers =
            serde_json::from_str(&content).map_err(|e| ClientError::Parse(e.to_string()))?;
        let objects = match saved {
            SavedHelpers::Bare(list) => list,
            SavedHelpers::List(list) => list.list,
        };
        tracing::debug!(path = %self.path.display(), remote = target, "read saved helpers");
        Ok(filter(objects, query))
    }
}

/// Servers filter already; this also covers files and older bridges.
fn filter(objects: Vec<ObjectMeta>, query: &HelperQuery) -> Vec<ObjectMeta> {
    objects.into_iter().filter(|o| query.matches(o)).collect()
}
