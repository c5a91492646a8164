//! Name → md5 → sha1 fallback shared by every backend.

use crate::backend::DiscoveryBackend;
use crate::criteria::{HashKind, SearchCriteria};
use crate::descriptor::FileDescriptor;
use crate::error::Result;
use tracing::instrument;

/// Run the fallback protocol against `backend`.
///
/// 1. A name, if given, is searched first. Any match ends the search; hashes
///    are never consulted.
/// 2. Otherwise an md5, if given, is searched. Any match ends the search.
/// 3. Otherwise a sha1, if given, is searched and its result returned as is.
///
/// The order is fixed and the same for every backend. Backend failures are
/// returned unchanged and nothing is retried.
#[instrument(skip_all, fields(backend = backend.name(), service = backend.service_type()))]
pub(crate) async fn resolve<B>(backend: &B, criteria: &SearchCriteria) -> Result<Vec<FileDescriptor>>
where
    B: DiscoveryBackend + ?Sized,
{
    criteria.validate()?;

    if let Some(name) = criteria.name() {
        let found = backend.find_by_name(name).await?;
        if !found.is_empty() {
            tracing::debug!(matches = found.len(), "Resolved by name");
            return Ok(found);
        }
        tracing::debug!(name, "No name matches");
    }

    let mut found = Vec::new();
    for kind in [HashKind::Md5, HashKind::Sha1] {
        let Some(hash) = criteria.hash(kind) else {
            continue;
        };
        found = backend.find_by_hash(kind, hash).await?;
        if !found.is_empty() {
            tracing::debug!(matches = found.len(), %kind, "Resolved by hash");
            break;
        }
        tracing::debug!(%kind, hash, "No hash matches");
    }
    Ok(found)
}
