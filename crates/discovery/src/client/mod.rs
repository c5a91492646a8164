//! Authenticated backend clients consumed by the adapters.
//!
//! Clients are constructed and authorized elsewhere; adapters only ever see
//! them through these traits. Each method is one network round-trip. Clients
//! report failures as plain errors and the adapters raise them as
//! [`BackendUnavailable`](crate::error::ErrorKind::BackendUnavailable).

#[cfg(any(test, feature = "mock"))]
mod mock;
#[cfg(feature = "s3")]
mod s3;

#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockFolderService, MockObjectStore};
#[cfg(feature = "s3")]
pub use self::s3::S3Client;
use crate::error::Result;
use async_trait::async_trait;
use derive_more::Display;
use std::sync::Arc;

pub type ObjectStoreHandle = Arc<dyn ObjectStoreClient>;
pub type FolderServiceHandle = Arc<dyn FolderServiceClient>;

/// One object in a flat-namespace bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    pub key: String,
    /// Content-hash tag exactly as the service returned it (may be quoted,
    /// may be upper case).
    pub tag: Option<String>,
}

impl ObjectRecord {
    pub fn new(key: impl Into<String>, tag: Option<&str>) -> Self {
        Self { key: key.into(), tag: tag.map(str::to_string) }
    }
}

/// One page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub objects: Vec<ObjectRecord>,
    /// Marker to pass back to get the next page.
    pub next_marker: Option<String>,
    /// More pages follow when `true`.
    pub is_truncated: bool,
}

impl ObjectPage {
    /// A page with more pages after it.
    pub fn truncated(objects: impl IntoIterator<Item = ObjectRecord>, next_marker: impl Into<String>) -> Self {
        Self {
            objects: objects.into_iter().collect(),
            next_marker: Some(next_marker.into()),
            is_truncated: true,
        }
    }

    /// The final page of a listing.
    pub fn last(objects: impl IntoIterator<Item = ObjectRecord>) -> Self {
        Self {
            objects: objects.into_iter().collect(),
            next_marker: None,
            is_truncated: false,
        }
    }
}

/// Client for object stores without a folder hierarchy.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Look up a single object by key.
    ///
    /// Returns `Ok(None)` when the service says the key does not exist.
    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectRecord>>;

    /// Fetch one page of the bucket listing, starting after `marker`.
    async fn list_objects(&self, bucket: &str, marker: Option<&str>) -> Result<ObjectPage>;
}

/// Identifier of a folder in a hierarchical service.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderId(String);

impl FolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The service's top-level folder.
    pub fn top_level() -> Self {
        Self(crate::scope::TOP_LEVEL_FOLDER_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FolderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Folder,
    /// Web links, shortcuts and anything else the crawl ignores.
    Other,
}

/// An item returned by a hierarchical service search or listing.
///
/// Searches and listings may return partial records; `ancestors` is `None`
/// when the service left the path metadata out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub id: String,
    pub kind: ItemKind,
    pub name: Option<String>,
    pub parent: Option<String>,
    pub sha1: Option<String>,
    /// Names of the ancestor folders, outermost first.
    pub ancestors: Option<Vec<String>>,
}

impl ItemRecord {
    pub fn file(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::File,
            name: Some(name.into()),
            parent: None,
            sha1: None,
            ancestors: None,
        }
    }

    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { kind: ItemKind::Folder, ..Self::file(id, name) }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_sha1(mut self, sha1: impl Into<String>) -> Self {
        self.sha1 = Some(sha1.into());
        self
    }

    pub fn with_ancestors(mut self, ancestors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ancestors = Some(ancestors.into_iter().map(Into::into).collect());
        self
    }
}

/// Client for folder-hierarchy services with native name search.
#[async_trait]
pub trait FolderServiceClient: Send + Sync {
    /// Search for folders called `name`, returning at most `limit` of them.
    async fn search_folders(&self, name: &str, limit: usize) -> Result<Vec<ItemRecord>>;

    /// Native name search, optionally restricted to descendants of
    /// `ancestor`. Returns at most `limit` items.
    async fn search(&self, query: &str, limit: usize, ancestor: Option<&FolderId>) -> Result<Vec<ItemRecord>>;

    /// One page of a folder's direct children.
    async fn list_children(&self, folder: &FolderId, limit: usize, offset: usize) -> Result<Vec<ItemRecord>>;

    /// Fetch the full attribute set (id, parent, name, sha1, ancestors) of a
    /// single item. `Ok(None)` when the item no longer exists.
    async fn fetch_item(&self, id: &str) -> Result<Option<ItemRecord>>;
}
