//! Flat-namespace (object store) discovery.
//!
//! Object stores have no folders and no hash index. Names are looked up with
//! a direct key fetch per bucket; hashes by walking the full, paginated
//! bucket listing and comparing every object's content-hash tag.

use crate::backend::DiscoveryBackend;
use crate::client::{ObjectPage, ObjectRecord, ObjectStoreHandle};
use crate::criteria::{HashKind, require};
use crate::descriptor::FileDescriptor;
use crate::error::{ErrorKind, Result};
use crate::scope::FlatScope;
use async_stream::stream;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;
use tracing::instrument;

const SERVICE_TYPE: &str = "AmazonS3";

type ObjectPageStream<'a> = Pin<Box<dyn Stream<Item = Result<ObjectPage>> + Send + 'a>>;

/// Whether a bucket scan stops at its first match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanMode {
    /// Walk every page of the bucket.
    #[default]
    Exhaustive,
    /// Stop scanning the current bucket once one match is recorded. Other
    /// buckets are still scanned by [`FlatScanAdapter::scan`].
    FirstMatch,
}

/// Normalize a content-hash tag for comparison: quotes stripped, lower case.
///
/// ```
/// use omnifind_discovery::backend::normalize_tag;
/// assert_eq!(normalize_tag("\"ABC123\""), "abc123");
/// ```
pub fn normalize_tag(tag: &str) -> String {
    tag.replace('"', "").to_lowercase()
}

/// Adapter for flat-namespace object stores.
///
/// Buckets are searched in their configured order and results keep that
/// order, then page order, then listing order within a page.
///
/// # Examples
///
/// ```no_run
/// use omnifind_discovery::{DiscoveryBackend, FlatScanAdapter, FlatScope, SearchCriteria};
/// use omnifind_discovery::client::ObjectStoreHandle;
/// use omnifind_discovery::error::Result;
///
/// # async fn example(client: ObjectStoreHandle) -> Result<()> {
/// let scope = FlatScope::new(["archive", "uploads"])?;
/// let backend = FlatScanAdapter::new("s3-main", client, scope);
/// let found = backend.find_file(&SearchCriteria::by_md5("d41d8cd98f00b204e9800998ecf8427e")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FlatScanAdapter {
    name: String,
    client: ObjectStoreHandle,
    scope: FlatScope,
}

impl FlatScanAdapter {
    pub fn new(name: impl Into<String>, client: ObjectStoreHandle, scope: FlatScope) -> Self {
        Self { name: name.into(), client, scope }
    }

    pub fn scope(&self) -> &FlatScope {
        &self.scope
    }

    /// Stream every page of a bucket listing.
    ///
    /// Pages are requested with the marker of the page before them until a
    /// page comes back untruncated. A truncated page without a marker, or
    /// with the same marker as the previous page, ends the stream with a
    /// [`BackendUnavailable`](ErrorKind::BackendUnavailable) error rather
    /// than looping forever.
    pub fn pages<'a>(&'a self, bucket: &'a str) -> ObjectPageStream<'a> {
        Box::pin(stream! {
            let mut marker: Option<String> = None;
            loop {
                let page = match self.client.list_objects(bucket, marker.as_deref()).await {
                    Ok(page) => page,
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                };
                tracing::debug!(backend = %self.name, bucket, marker = ?marker, objects = page.objects.len(), "Fetched listing page");
                let next = next_marker(bucket, marker.as_deref(), &page);
                yield Ok(page);
                match next {
                    Ok(Some(next)) => marker = Some(next),
                    Ok(None) => break,
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        })
    }

    /// Scan one bucket for objects whose tag matches `md5` or `sha1`.
    ///
    /// Fails with [`InvalidArgument`](ErrorKind::InvalidArgument) before any
    /// I/O when neither hash is given.
    #[instrument(skip_all, fields(backend = %self.name, bucket = %bucket))]
    pub async fn scan_bucket(
        &self,
        bucket: &str,
        md5: Option<&str>,
        sha1: Option<&str>,
        mode: ScanMode,
    ) -> Result<Vec<FileDescriptor>> {
        let targets = Targets::new(md5, sha1)?;
        self.scan_bucket_inner(bucket, &targets, mode).await
    }

    /// Scan every configured bucket, in order, for objects whose tag matches
    /// `md5` or `sha1`. [`ScanMode::FirstMatch`] applies per bucket.
    #[instrument(skip_all, fields(backend = %self.name))]
    pub async fn scan(&self, md5: Option<&str>, sha1: Option<&str>, mode: ScanMode) -> Result<Vec<FileDescriptor>> {
        let targets = Targets::new(md5, sha1)?;
        let mut matches = Vec::new();
        for bucket in self.scope.buckets() {
            matches.extend(self.scan_bucket_inner(bucket, &targets, mode).await?);
        }
        Ok(matches)
    }

    async fn scan_bucket_inner(&self, bucket: &str, targets: &Targets, mode: ScanMode) -> Result<Vec<FileDescriptor>> {
        let mut matches = Vec::new();
        let mut pages = self.pages(bucket);
        'pages: while let Some(page) = pages.try_next().await? {
            for object in page.objects {
                let Some(tag) = object.tag.as_deref().map(normalize_tag) else {
                    continue;
                };
                if !targets.matches(&tag) {
                    continue;
                }
                if let Some(file) = self.normalize(object) {
                    matches.push(file);
                    if mode == ScanMode::FirstMatch {
                        break 'pages;
                    }
                }
            }
        }
        tracing::debug!(backend = %self.name, bucket, matches = matches.len(), "Finished bucket scan");
        Ok(matches)
    }

    /// Key becomes both name and path; the normalized tag is the md5.
    fn normalize(&self, object: ObjectRecord) -> Option<FileDescriptor> {
        let md5 = object.tag.as_deref().map(normalize_tag);
        match FileDescriptor::builder(object.key.as_str()).md5(md5).path(object.key.as_str()).build() {
            Ok(file) => Some(file),
            Err(err) => {
                tracing::warn!(backend = %self.name, error = ?err, "Dropping object");
                None
            },
        }
    }
}

#[async_trait]
impl DiscoveryBackend for FlatScanAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn service_type(&self) -> &'static str {
        SERVICE_TYPE
    }

    /// The first bucket that has the key wins. A bucket without it doesn't
    /// stop the search; a failing fetch does.
    async fn find_by_name(&self, name: &str) -> Result<Vec<FileDescriptor>> {
        let name = require("name", name)?;
        for bucket in self.scope.buckets() {
            match self.client.fetch_object(bucket, name).await? {
                Some(object) => {
                    if let Some(file) = self.normalize(object) {
                        tracing::debug!(backend = %self.name, bucket = %bucket, key = name, "Found object by key");
                        return Ok(vec![file]);
                    }
                },
                None => tracing::debug!(backend = %self.name, bucket = %bucket, key = name, "Key not in bucket"),
            }
        }
        Ok(Vec::new())
    }

    async fn find_by_hash(&self, kind: HashKind, hash: &str) -> Result<Vec<FileDescriptor>> {
        match kind {
            HashKind::Md5 => self.scan(Some(hash), None, ScanMode::Exhaustive).await,
            HashKind::Sha1 => self.scan(None, Some(hash), ScanMode::Exhaustive).await,
        }
    }
}

/// Normalized hashes an object tag is compared against.
struct Targets {
    md5: Option<String>,
    sha1: Option<String>,
}

impl Targets {
    fn new(md5: Option<&str>, sha1: Option<&str>) -> Result<Self> {
        let clean = |hash: Option<&str>| hash.map(normalize_tag).filter(|h| !h.trim().is_empty());
        let targets = Self { md5: clean(md5), sha1: clean(sha1) };
        if targets.md5.is_none() && targets.sha1.is_none() {
            exn::bail!(ErrorKind::InvalidArgument("no md5 or sha1 supplied to hash scan".to_string()));
        }
        Ok(targets)
    }

    fn matches(&self, tag: &str) -> bool {
        self.md5.as_deref() == Some(tag) || self.sha1.as_deref() == Some(tag)
    }
}

fn next_marker(bucket: &str, previous: Option<&str>, page: &ObjectPage) -> Result<Option<String>> {
    if !page.is_truncated {
        return Ok(None);
    }
    match page.next_marker.as_deref() {
        None => exn::bail!(ErrorKind::backend(format!("truncated listing of {bucket} has no continuation marker"))),
        Some(next) if Some(next) == previous => {
            exn::bail!(ErrorKind::backend(format!("listing of {bucket} repeated continuation marker {next}")))
        },
        Some(next) => Ok(Some(next.to_string())),
    }
}
