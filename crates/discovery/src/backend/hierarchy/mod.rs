//! Hierarchical (folder service) discovery.
//!
//! Folder services can search by name within a folder subtree but have no
//! hash search at all. A sha1 lookup therefore walks every folder in scope,
//! breadth first, comparing each file's sha1 attribute. This is expensive:
//! one round-trip per page of every folder in the subtree.

mod frontier;

use self::frontier::Frontier;
use crate::backend::{DescriptorStream, DiscoveryBackend};
use crate::client::{FolderId, FolderServiceHandle, ItemKind, ItemRecord};
use crate::criteria::{HashKind, SearchCriteria, require};
use crate::descriptor::FileDescriptor;
use crate::error::{ErrorKind, Result};
use crate::scope::{HierarchyScope, ScopeRoot};
use async_stream::stream;
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use tokio::sync::OnceCell;
use tracing::instrument;

const SERVICE_TYPE: &str = "Box";

/// A configured scope root after looking it up on the service.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedRoot {
    /// Restriction for native name searches; `None` searches everything.
    ancestor: Option<FolderId>,
    /// Where a crawl of this root starts.
    seed: FolderId,
}

/// Adapter for folder-hierarchy services.
///
/// # Examples
///
/// ```no_run
/// use omnifind_discovery::{DiscoveryBackend, HierarchyCrawlAdapter, HierarchyScope, SearchCriteria};
/// use omnifind_discovery::client::FolderServiceHandle;
/// use omnifind_discovery::error::Result;
///
/// # async fn example(client: FolderServiceHandle) -> Result<()> {
/// let scope = HierarchyScope::new(["Projects", "Shared"]).with_page_size(500)?;
/// let backend = HierarchyCrawlAdapter::new("box", client, scope);
/// let criteria = SearchCriteria::by_sha1("da39a3ee5e6b4b0d3255bfef95601890afd80709");
/// let found = backend.find_file(&criteria).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HierarchyCrawlAdapter {
    name: String,
    client: FolderServiceHandle,
    scope: HierarchyScope,
}

impl HierarchyCrawlAdapter {
    pub fn new(name: impl Into<String>, client: FolderServiceHandle, scope: HierarchyScope) -> Self {
        Self { name: name.into(), client, scope }
    }

    pub fn scope(&self) -> &HierarchyScope {
        &self.scope
    }

    /// Look up every configured root on the service.
    ///
    /// Named roots resolve through a folder search bounded to one result.
    /// A root the service can't find is skipped with a warning rather than
    /// widening the search to the whole space.
    async fn resolve_roots(&self) -> Result<Vec<ResolvedRoot>> {
        let mut resolved = Vec::with_capacity(self.scope.roots().len());
        for root in self.scope.roots() {
            match root {
                ScopeRoot::TopLevel => resolved.push(ResolvedRoot {
                    ancestor: None,
                    seed: FolderId::top_level(),
                }),
                ScopeRoot::Folder(name) => match self.client.search_folders(name, 1).await?.into_iter().next() {
                    Some(folder) => {
                        let id = FolderId::new(folder.id);
                        resolved.push(ResolvedRoot { ancestor: Some(id.clone()), seed: id });
                    },
                    None => tracing::warn!(backend = %self.name, folder = %name, "Scope folder not found; skipping"),
                },
            }
        }
        Ok(resolved)
    }

    /// Stream every file in scope whose sha1 equals `sha1`.
    ///
    /// Walks the whole configured subtree breadth first, listing each folder
    /// in pages of the configured size until a short page comes back. Each
    /// folder is listed at most once, however many times it is linked. The
    /// comparison is exact (case-sensitive, as the service reports it) and
    /// the walk never stops early: the same content can live in any sibling
    /// subtree. A blank `sha1` fails with
    /// [`InvalidArgument`](ErrorKind::InvalidArgument) before any I/O.
    pub fn crawl_sha1<'a>(&'a self, sha1: &'a str) -> DescriptorStream<'a> {
        Box::pin(stream! {
            let lookup = Lookup::new(self);
            let mut files = lookup.crawl(sha1);
            while let Some(file) = files.next().await {
                yield file;
            }
        })
    }

    /// Turn a service item into a descriptor, dropping it on failure.
    ///
    /// Items without ancestor metadata get one follow-up attribute fetch. If
    /// that fails, or the item still has no name, it is logged and dropped.
    async fn normalize(&self, item: ItemRecord) -> Option<FileDescriptor> {
        let item = match item.ancestors {
            Some(_) => item,
            None => match self.client.fetch_item(&item.id).await {
                Ok(Some(details)) => details,
                Ok(None) => {
                    let kind = ErrorKind::NormalizationFailure(format!("item {} no longer exists", item.id));
                    tracing::warn!(backend = %self.name, error = %kind, "Dropping item");
                    return None;
                },
                Err(err) => {
                    tracing::warn!(backend = %self.name, item = %item.id, error = ?err, "Dropping item; attribute fetch failed");
                    return None;
                },
            },
        };
        let path = item.ancestors.as_deref().unwrap_or_default().join("/");
        let built = FileDescriptor::builder(item.name.unwrap_or_default())
            .id(item.id)
            .parent(item.parent)
            .sha1(item.sha1)
            .path(path)
            .build();
        match built {
            Ok(file) => Some(file),
            Err(err) => {
                tracing::warn!(backend = %self.name, error = ?err, "Dropping item");
                None
            },
        }
    }
}

/// One discovery call against a [`HierarchyCrawlAdapter`].
///
/// Scope roots are looked up at most once per call, so a name search that
/// falls through to a sha1 crawl seeds the crawl from the folders the name
/// search already resolved.
struct Lookup<'a> {
    adapter: &'a HierarchyCrawlAdapter,
    roots: OnceCell<Vec<ResolvedRoot>>,
}

impl<'a> Lookup<'a> {
    fn new(adapter: &'a HierarchyCrawlAdapter) -> Self {
        Self { adapter, roots: OnceCell::new() }
    }

    async fn roots(&self) -> Result<&[ResolvedRoot]> {
        let roots = self.roots.get_or_try_init(|| self.adapter.resolve_roots()).await?;
        Ok(roots.as_slice())
    }

    async fn frontier(&self, sha1: &str) -> Result<Frontier> {
        require("sha1", sha1)?;
        let seeds = self.roots().await?.iter().map(|root| root.seed.clone());
        let frontier = Frontier::new(seeds);
        tracing::warn!(
            backend = %self.adapter.name,
            folders = frontier.pending(),
            "Folder service has no sha1 search; walking the whole configured hierarchy"
        );
        Ok(frontier)
    }

    fn crawl<'s>(&'s self, sha1: &'s str) -> DescriptorStream<'s> {
        let adapter = self.adapter;
        let page_size = adapter.scope.page_size();
        Box::pin(stream! {
            let mut frontier = match self.frontier(sha1).await {
                Ok(frontier) => frontier,
                Err(err) => {
                    yield Err(err);
                    Frontier::default()
                }
            };
            'folders: while let Some(folder) = frontier.next() {
                let mut offset = 0;
                loop {
                    let items = match adapter.client.list_children(&folder, page_size, offset).await {
                        Ok(items) => items,
                        Err(err) => {
                            yield Err(err);
                            break 'folders;
                        }
                    };
                    let count = items.len();
                    tracing::debug!(backend = %adapter.name, %folder, offset, count, "Analyzing folder page");
                    for item in items {
                        match item.kind {
                            ItemKind::Folder => frontier.push(FolderId::new(item.id)),
                            ItemKind::File if item.sha1.as_deref() == Some(sha1) => {
                                if let Some(file) = adapter.normalize(item).await {
                                    yield Ok(file);
                                }
                            },
                            ItemKind::File | ItemKind::Other => {},
                        }
                    }
                    if count < page_size {
                        break;
                    }
                    offset += page_size;
                }
                frontier.mark_visited(folder);
            }
            tracing::debug!(backend = %adapter.name, visited = frontier.visited(), "Finished crawl");
        })
    }
}

#[async_trait]
impl DiscoveryBackend for Lookup<'_> {
    fn name(&self) -> &str {
        &self.adapter.name
    }

    fn service_type(&self) -> &'static str {
        SERVICE_TYPE
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<FileDescriptor>> {
        let name = require("name", name)?;
        let adapter = self.adapter;
        let mut matches = Vec::new();
        for root in self.roots().await? {
            let items = adapter.client.search(name, adapter.scope.name_search_limit(), root.ancestor.as_ref()).await?;
            for item in items {
                if let Some(file) = adapter.normalize(item).await {
                    matches.push(file);
                }
            }
        }
        Ok(matches)
    }

    async fn find_by_hash(&self, kind: HashKind, hash: &str) -> Result<Vec<FileDescriptor>> {
        match kind {
            HashKind::Sha1 => self.crawl(hash).try_collect().await,
            HashKind::Md5 => {
                require("md5", hash)?;
                let kind = ErrorKind::UnsupportedCapability {
                    backend: SERVICE_TYPE,
                    capability: "md5",
                };
                tracing::warn!(backend = %self.adapter.name, error = %kind, "Skipping search tier");
                Ok(Vec::new())
            },
        }
    }
}

#[async_trait]
impl DiscoveryBackend for HierarchyCrawlAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn service_type(&self) -> &'static str {
        SERVICE_TYPE
    }

    #[instrument(skip_all, fields(backend = %self.name))]
    async fn find_by_name(&self, name: &str) -> Result<Vec<FileDescriptor>> {
        Lookup::new(self).find_by_name(name).await
    }

    async fn find_by_hash(&self, kind: HashKind, hash: &str) -> Result<Vec<FileDescriptor>> {
        Lookup::new(self).find_by_hash(kind, hash).await
    }

    /// Runs the shared fallback with the scope roots resolved once for the
    /// whole call.
    async fn find_file(&self, criteria: &SearchCriteria) -> Result<Vec<FileDescriptor>> {
        Lookup::new(self).find_file(criteria).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockFolderService;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::sync::Arc;

    const SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    fn adapter(service: &Arc<MockFolderService>, scope: HierarchyScope) -> HierarchyCrawlAdapter {
        HierarchyCrawlAdapter::new("test-box", service.clone(), scope)
    }

    fn file(id: &str, name: &str, parent: &str, ancestors: &[&str]) -> ItemRecord {
        ItemRecord::file(id, name).with_parent(parent).with_ancestors(ancestors.iter().copied())
    }

    fn names(found: &[FileDescriptor]) -> Vec<&str> {
        found.iter().map(FileDescriptor::name).collect()
    }

    /// Folder graph where `shared` (id 30) is linked from both `a` and `b`,
    /// and `b` links back to the top level.
    fn diamond() -> MockFolderService {
        MockFolderService::default()
            .with_children("0", [
                ItemRecord::folder("10", "a"),
                ItemRecord::folder("20", "b"),
                file("1", "top.txt", "0", &["All Files"]).with_sha1(SHA1),
            ])
            .with_children("10", [ItemRecord::folder("30", "shared"), file("2", "a.txt", "10", &["All Files", "a"])])
            .with_children("20", [
                ItemRecord::folder("30", "shared"),
                ItemRecord::folder("0", "All Files"),
                file("3", "b.txt", "20", &["All Files", "b"]).with_sha1(SHA1),
            ])
            .with_children("30", [file("4", "deep.txt", "30", &["All Files", "a", "shared"]).with_sha1(SHA1)])
    }

    #[tokio::test]
    async fn test_crawl_lists_each_folder_once() {
        let service = Arc::new(diamond());
        let found = adapter(&service, HierarchyScope::top_level()).find_by_hash(HashKind::Sha1, SHA1).await.unwrap();
        assert_eq!(names(&found), ["top.txt", "b.txt", "deep.txt"]);

        let mut per_folder: HashMap<FolderId, usize> = HashMap::new();
        for (folder, _, _) in service.list_calls().await {
            *per_folder.entry(folder).or_default() += 1;
        }
        assert_eq!(per_folder.len(), 4);
        assert!(per_folder.values().all(|&count| count == 1));
    }

    #[tokio::test]
    async fn test_crawl_is_breadth_first() {
        let service = Arc::new(diamond());
        adapter(&service, HierarchyScope::top_level()).find_by_hash(HashKind::Sha1, SHA1).await.unwrap();
        let order: Vec<_> = service.list_calls().await.into_iter().map(|(folder, _, _)| folder).collect();
        assert_eq!(order, ["0", "10", "20", "30"].map(FolderId::from));
    }

    #[tokio::test]
    async fn test_crawl_does_not_stop_at_first_match() {
        let service = Arc::new(
            MockFolderService::default()
                .with_children("0", [file("1", "first.txt", "0", &[]).with_sha1(SHA1), ItemRecord::folder("10", "x")])
                .with_children("10", [ItemRecord::folder("11", "y")])
                .with_children("11", [file("2", "last.txt", "11", &["x", "y"]).with_sha1(SHA1)]),
        );
        let found = adapter(&service, HierarchyScope::top_level()).find_file(&SearchCriteria::by_sha1(SHA1)).await.unwrap();
        assert_eq!(names(&found), ["first.txt", "last.txt"]);
        assert_eq!(found[1].path(), "x/y");
        assert_eq!(found[1].parent(), Some("11"));
        assert_eq!(found[1].id(), Some("2"));
    }

    #[tokio::test]
    async fn test_crawl_pages_by_offset() {
        let children: Vec<_> = (0..5).map(|i| file(&i.to_string(), &format!("f{i}.txt"), "0", &[]).with_sha1(SHA1)).collect();
        let service = Arc::new(MockFolderService::default().with_children("0", children));
        let scope = HierarchyScope::top_level().with_page_size(2).unwrap();
        let found = adapter(&service, scope).find_by_hash(HashKind::Sha1, SHA1).await.unwrap();
        assert_eq!(found.len(), 5);
        let pages: Vec<_> = service.list_calls().await.into_iter().map(|(_, limit, offset)| (limit, offset)).collect();
        assert_eq!(pages, [(2, 0), (2, 2), (2, 4)]);
    }

    #[tokio::test]
    async fn test_crawl_full_last_page_requests_one_more() {
        let children: Vec<_> = (0..4).map(|i| file(&i.to_string(), "f.txt", "0", &[])).collect();
        let service = Arc::new(MockFolderService::default().with_children("0", children));
        let scope = HierarchyScope::top_level().with_page_size(2).unwrap();
        let found = adapter(&service, scope).find_by_hash(HashKind::Sha1, SHA1).await.unwrap();
        assert!(found.is_empty());
        assert_eq!(service.list_calls().await.len(), 3);
    }

    #[tokio::test]
    async fn test_sha1_comparison_is_case_sensitive() {
        let service = Arc::new(
            MockFolderService::default().with_children("0", [file("1", "upper.txt", "0", &[]).with_sha1(SHA1.to_uppercase())]),
        );
        let found = adapter(&service, HierarchyScope::top_level()).find_by_hash(HashKind::Sha1, SHA1).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_md5_is_unsupported_and_empty() {
        let service = Arc::new(diamond());
        let criteria = SearchCriteria::by_md5("d41d8cd98f00b204e9800998ecf8427e");
        let found = adapter(&service, HierarchyScope::top_level()).find_file(&criteria).await.unwrap();
        assert!(found.is_empty());
        assert!(service.list_calls().await.is_empty());
        assert!(service.folder_search_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_md5_tier_falls_through_to_sha1() {
        let service = Arc::new(diamond());
        let criteria = SearchCriteria::by_md5("d41d8cd98f00b204e9800998ecf8427e").with_sha1(SHA1);
        let found = adapter(&service, HierarchyScope::top_level()).find_file(&criteria).await.unwrap();
        assert_eq!(found.len(), 3);
    }

    #[tokio::test]
    async fn test_crawl_seeds_from_resolved_roots() {
        let service = Arc::new(diamond());
        let scope = HierarchyScope::new(["b", "missing"]);
        let found = adapter(&service, scope).find_by_hash(HashKind::Sha1, SHA1).await.unwrap();
        // `b` links back to the top level, so the whole graph is still reachable.
        assert_eq!(names(&found), ["b.txt", "deep.txt", "top.txt"]);
        assert_eq!(service.folder_search_calls().await, ["b", "missing"]);
        assert_eq!(service.list_calls().await[0].0, FolderId::new("20"));
    }

    #[rstest]
    #[case(HashKind::Sha1, "")]
    #[case(HashKind::Sha1, "  ")]
    #[case(HashKind::Md5, "")]
    #[tokio::test]
    async fn test_blank_hash_is_invalid_without_io(#[case] kind: HashKind, #[case] hash: &str) {
        let service = Arc::new(diamond());
        let backend = adapter(&service, HierarchyScope::new(["a", "/"]));
        let err = backend.find_by_hash(kind, hash).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidArgument(_)));
        assert!(service.list_calls().await.is_empty());
        assert!(service.folder_search_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_sha1_crawl_stream_fails_first() {
        let service = Arc::new(diamond());
        let backend = adapter(&service, HierarchyScope::top_level());
        let results: Vec<_> = backend.crawl_sha1("").collect().await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0].as_ref().map_err(|err| &**err), Err(ErrorKind::InvalidArgument(_))));
        assert!(service.list_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_name_is_invalid_without_io() {
        let service = Arc::new(diamond());
        let err = adapter(&service, HierarchyScope::new(["a"])).find_by_name(" ").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidArgument(_)));
        assert!(service.search_calls().await.is_empty());
        assert!(service.folder_search_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_name_fallthrough_resolves_roots_once() {
        let service = Arc::new(diamond());
        let criteria = SearchCriteria::by_name("missing.txt").with_sha1(SHA1);
        let found = adapter(&service, HierarchyScope::new(["a"])).find_file(&criteria).await.unwrap();
        assert_eq!(names(&found), ["deep.txt"]);
        assert_eq!(service.folder_search_calls().await, ["a"]);
        assert_eq!(service.search_calls().await, [("missing.txt".to_string(), Some(FolderId::new("10")))]);
        assert_eq!(service.list_calls().await[0].0, FolderId::new("10"));
    }

    #[tokio::test]
    async fn test_separate_calls_resolve_roots_again() {
        let service = Arc::new(diamond());
        let backend = adapter(&service, HierarchyScope::new(["a"]));
        backend.find_by_name("deep.txt").await.unwrap();
        backend.find_by_hash(HashKind::Sha1, SHA1).await.unwrap();
        assert_eq!(service.folder_search_calls().await, ["a", "a"]);
    }

    #[tokio::test]
    async fn test_name_search_restricted_to_roots() {
        let service = Arc::new(diamond());
        let scope = HierarchyScope::new(["a", "/"]);
        let found = adapter(&service, scope).find_file(&SearchCriteria::by_name("deep.txt")).await.unwrap();
        // Found once under `a`, once from the top level.
        assert_eq!(names(&found), ["deep.txt", "deep.txt"]);
        assert_eq!(found[0].path(), "All Files/a/shared");
        assert_eq!(
            service.search_calls().await,
            [("deep.txt".to_string(), Some(FolderId::new("10"))), ("deep.txt".to_string(), None)]
        );
        assert!(service.list_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_ancestors_trigger_follow_up_fetch() {
        let service = Arc::new(
            MockFolderService::default()
                .with_children("0", [ItemRecord::file("5", "partial.txt").with_sha1(SHA1)])
                .with_details(file("5", "partial.txt", "0", &["All Files"]).with_sha1(SHA1)),
        );
        let found = adapter(&service, HierarchyScope::top_level()).find_by_hash(HashKind::Sha1, SHA1).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path(), "All Files");
        assert_eq!(found[0].parent(), Some("0"));
        assert_eq!(service.fetch_calls().await, ["5"]);
    }

    #[tokio::test]
    async fn test_unusable_items_are_dropped() {
        let service = Arc::new(
            MockFolderService::default()
                .with_children("0", [
                    ItemRecord::file("6", "vanished.txt").with_sha1(SHA1),
                    ItemRecord::file("7", "broken.txt").with_sha1(SHA1),
                    ItemRecord { name: None, ..file("8", "", "0", &[]) }.with_sha1(SHA1),
                    file("9", "fine.txt", "0", &[]).with_sha1(SHA1),
                ])
                .with_unavailable_item("7"),
        );
        let found = adapter(&service, HierarchyScope::top_level()).find_by_hash(HashKind::Sha1, SHA1).await.unwrap();
        assert_eq!(names(&found), ["fine.txt"]);
        assert_eq!(service.fetch_calls().await, ["6", "7"]);
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let service = Arc::new(diamond().with_unavailable_folder("20"));
        let err = adapter(&service, HierarchyScope::top_level()).find_by_hash(HashKind::Sha1, SHA1).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_every_descriptor_has_a_name() {
        let service = Arc::new(diamond());
        let found = adapter(&service, HierarchyScope::top_level()).find_by_hash(HashKind::Sha1, SHA1).await.unwrap();
        assert!(!found.is_empty());
        assert!(found.iter().all(|file| !file.name().is_empty()));
    }
}
