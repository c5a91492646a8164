//! Discovery backend trait and implementations.
//!
//! This module defines the [`DiscoveryBackend`] trait, the one interface the
//! resolver and callers use to find files regardless of how the underlying
//! service stores them. Each supported storage model gets one adapter:
//!
//! - [`FlatScanAdapter`] for object stores (buckets of keys, no folders, no
//!   hash index).
//! - [`HierarchyCrawlAdapter`] for folder services with native name search
//!   but no hash search.

mod flat;
mod hierarchy;

pub use self::flat::{FlatScanAdapter, ScanMode, normalize_tag};
pub use self::hierarchy::HierarchyCrawlAdapter;
use crate::criteria::{HashKind, SearchCriteria};
use crate::descriptor::FileDescriptor;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

type DescriptorStream<'a> = Pin<Box<dyn Stream<Item = Result<FileDescriptor>> + Send + 'a>>;

/// Unified interface for discovery backends.
///
/// Adapters only implement the native search tiers
/// ([`find_by_name`](Self::find_by_name) and
/// [`find_by_hash`](Self::find_by_hash)); the name → md5 → sha1 fallback in
/// [`find_file`](Self::find_file) is shared by every backend.
///
/// # Concurrency
/// A call runs its tiers, buckets, pages and folders strictly one after the
/// other. Adapters hold no locks: two concurrent calls against the same
/// adapter are only as safe as the client underneath it. There is no
/// built-in timeout; wrap the call (e.g. in `tokio::time::timeout`) if you
/// need one.
///
/// # Examples
///
/// ```no_run
/// use omnifind_discovery::{DiscoveryBackend, SearchCriteria, error::Result};
///
/// async fn locate(backend: &dyn DiscoveryBackend) -> Result<()> {
///     let criteria = SearchCriteria::by_name("invoice.pdf").with_sha1("da39a3ee5e6b4b0d3255bfef95601890afd80709");
///     for file in backend.find_file(&criteria).await? {
///         println!("{} ({}): {}", file.name(), backend.service_type(), file.path());
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait DiscoveryBackend: Send + Sync {
    /// Name of the configured backend. Supposed to be unique, but only used
    /// for logging and registry lookups.
    fn name(&self) -> &str;

    /// Fixed tag identifying the kind of service (e.g. `"AmazonS3"`). For
    /// diagnostics and caller-side selection; the core never branches on it.
    fn service_type(&self) -> &'static str;

    /// Native name search across the backend's whole configured scope.
    async fn find_by_name(&self, name: &str) -> Result<Vec<FileDescriptor>>;

    /// Hash search across the backend's whole configured scope.
    ///
    /// Backends that can't search by `kind` log an
    /// [`UnsupportedCapability`](ErrorKind::UnsupportedCapability) warning
    /// and return an empty list instead of failing.
    async fn find_by_hash(&self, kind: HashKind, hash: &str) -> Result<Vec<FileDescriptor>>;

    /// Find files by name, falling back to md5 and then sha1.
    ///
    /// Returns every match of the first tier that finds anything. An empty
    /// list is not an error. Fails with
    /// [`InvalidArgument`](ErrorKind::InvalidArgument) when `criteria` is
    /// empty, before any backend I/O.
    async fn find_file(&self, criteria: &SearchCriteria) -> Result<Vec<FileDescriptor>> {
        crate::resolver::resolve(self, criteria).await
    }

    /// Retrieve file contents. No backend implements this.
    async fn get_file(&self, _criteria: &SearchCriteria) -> Result<Vec<FileDescriptor>> {
        exn::bail!(ErrorKind::NotImplemented("get_file"))
    }
}
