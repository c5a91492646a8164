use omnifind_discovery::error::Result as ScopeResult;
use omnifind_discovery::{DEFAULT_NAME_SEARCH_LIMIT, DEFAULT_PAGE_SIZE, FlatScope, HierarchyScope};
use serde::Deserialize;

/// One configured backend, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    S3(S3Config),
    Box(BoxConfig),
}

impl BackendConfig {
    /// Check the backend's scope would be accepted by its adapter.
    pub fn validate(&self) -> ScopeResult<()> {
        match self {
            Self::S3(config) => config.scope().map(drop),
            Self::Box(config) => config.scope().map(drop),
        }
    }
}

/// Buckets or folders a backend searches, in order.
///
/// Accepts a list or a single `;`-separated string (`"archive;uploads"`), which
/// is also the only way to set a list from an environment variable. Entries
/// are trimmed and blank entries dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawScopeList")]
pub struct ScopeList(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScopeList {
    Many(Vec<String>),
    Joined(String),
}

impl From<RawScopeList> for ScopeList {
    fn from(raw: RawScopeList) -> Self {
        match raw {
            RawScopeList::Many(entries) => entries.iter().map(String::as_str).collect(),
            RawScopeList::Joined(joined) => joined.split(';').collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for ScopeList {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::trim).filter(|entry| !entry.is_empty()).map(str::to_string).collect())
    }
}

impl ScopeList {
    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// S3-compatible object store.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct S3Config {
    pub region: String,
    /// Custom endpoint for non-AWS services.
    #[serde(default)]
    pub endpoint: Option<String>,
    pub key_id: String,
    pub key_secret: String,
    pub buckets: ScopeList,
}

impl S3Config {
    pub fn scope(&self) -> ScopeResult<FlatScope> {
        FlatScope::new(self.buckets.entries())
    }

    #[cfg(feature = "s3")]
    pub fn client(&self) -> omnifind_discovery::client::S3Client {
        omnifind_discovery::client::S3Client::new(
            &self.region,
            self.endpoint.as_deref(),
            &self.key_id,
            &self.key_secret,
        )
    }
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .field("buckets", &self.buckets)
            .finish()
    }
}

/// Folder-hierarchy service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoxConfig {
    /// Folder names to search under; `/` is the top level.
    #[serde(default = "default_folders")]
    pub folders: ScopeList,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_name_search_limit")]
    pub name_search_limit: usize,
}

impl BoxConfig {
    pub fn scope(&self) -> ScopeResult<HierarchyScope> {
        HierarchyScope::new(self.folders.entries())
            .with_page_size(self.page_size)?
            .with_name_search_limit(self.name_search_limit)
    }
}

impl Default for BoxConfig {
    fn default() -> Self {
        Self {
            folders: default_folders(),
            page_size: DEFAULT_PAGE_SIZE,
            name_search_limit: DEFAULT_NAME_SEARCH_LIMIT,
        }
    }
}

fn default_folders() -> ScopeList {
    ScopeList(vec!["/".to_string()])
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_name_search_limit() -> usize {
    DEFAULT_NAME_SEARCH_LIMIT
}
