//! In-memory clients for testing.
//!
//! Both mocks record every call they receive so tests can assert on which
//! round-trips an adapter made, and in which order.

use super::{FolderId, FolderServiceClient, ItemKind, ItemRecord, ObjectPage, ObjectRecord, ObjectStoreClient};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::Mutex;

/// Object store with scripted listing pages.
///
/// The first page of a bucket is served for a `None` marker, every later
/// page for the marker carried by the page before it. Direct key fetches
/// look through every page of the bucket.
#[derive(Default)]
pub struct MockObjectStore {
    buckets: HashMap<String, Vec<ObjectPage>>,
    unavailable: HashSet<String>,
    list_calls: Mutex<Vec<(String, Option<String>)>>,
    fetch_calls: Mutex<Vec<(String, String)>>,
}

impl MockObjectStore {
    pub fn with_pages(mut self, bucket: impl Into<String>, pages: impl IntoIterator<Item = ObjectPage>) -> Self {
        self.buckets.insert(bucket.into(), pages.into_iter().collect());
        self
    }

    /// Single-page bucket.
    pub fn with_objects(self, bucket: impl Into<String>, objects: impl IntoIterator<Item = ObjectRecord>) -> Self {
        self.with_pages(bucket, [ObjectPage::last(objects)])
    }

    /// Every call touching `bucket` fails.
    pub fn with_unavailable(mut self, bucket: impl Into<String>) -> Self {
        self.unavailable.insert(bucket.into());
        self
    }

    /// `(bucket, marker)` of every listing request, in call order.
    pub async fn list_calls(&self) -> Vec<(String, Option<String>)> {
        self.list_calls.lock().await.clone()
    }

    /// `(bucket, key)` of every direct fetch, in call order.
    pub async fn fetch_calls(&self) -> Vec<(String, String)> {
        self.fetch_calls.lock().await.clone()
    }

    /// Total number of calls of any kind.
    pub async fn total_calls(&self) -> usize {
        self.list_calls.lock().await.len() + self.fetch_calls.lock().await.len()
    }

    fn check_available(&self, bucket: &str) -> Result<()> {
        if self.unavailable.contains(bucket) {
            exn::bail!(ErrorKind::backend(format!("bucket {bucket} is unreachable")));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStoreClient for MockObjectStore {
    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectRecord>> {
        self.fetch_calls.lock().await.push((bucket.to_string(), key.to_string()));
        self.check_available(bucket)?;
        Ok(self
            .buckets
            .get(bucket)
            .into_iter()
            .flatten()
            .flat_map(|page| page.objects.iter())
            .find(|object| object.key == key)
            .cloned())
    }

    async fn list_objects(&self, bucket: &str, marker: Option<&str>) -> Result<ObjectPage> {
        self.list_calls.lock().await.push((bucket.to_string(), marker.map(str::to_string)));
        self.check_available(bucket)?;
        let pages = self.buckets.get(bucket).map(Vec::as_slice).unwrap_or_default();
        let index = match marker {
            None => 0,
            Some(marker) => match pages.iter().position(|page| page.next_marker.as_deref() == Some(marker)) {
                Some(previous) => previous + 1,
                None => exn::bail!(ErrorKind::backend(format!("unknown marker {marker} for bucket {bucket}"))),
            },
        };
        Ok(pages.get(index).cloned().unwrap_or_default())
    }
}

/// Folder service backed by an in-memory folder graph.
///
/// The graph is whatever the test says it is: the same folder id may appear
/// under several parents, and a folder may even list one of its ancestors.
/// Children listings return records exactly as registered (so they can leave
/// out ancestor metadata); [`fetch_item`](FolderServiceClient::fetch_item)
/// returns the record registered with [`with_details`](Self::with_details).
#[derive(Default)]
pub struct MockFolderService {
    children: HashMap<FolderId, Vec<ItemRecord>>,
    details: HashMap<String, ItemRecord>,
    unavailable_items: HashSet<String>,
    unavailable_folders: HashSet<FolderId>,
    list_calls: Mutex<Vec<(FolderId, usize, usize)>>,
    search_calls: Mutex<Vec<(String, Option<FolderId>)>>,
    folder_search_calls: Mutex<Vec<String>>,
    fetch_calls: Mutex<Vec<String>>,
}

impl MockFolderService {
    pub fn with_children(mut self, folder: impl Into<FolderId>, items: impl IntoIterator<Item = ItemRecord>) -> Self {
        self.children.entry(folder.into()).or_default().extend(items);
        self
    }

    pub fn with_details(mut self, item: ItemRecord) -> Self {
        self.details.insert(item.id.clone(), item);
        self
    }

    /// Fetching the attributes of item `id` fails.
    pub fn with_unavailable_item(mut self, id: impl Into<String>) -> Self {
        self.unavailable_items.insert(id.into());
        self
    }

    /// Listing the children of `folder` fails.
    pub fn with_unavailable_folder(mut self, folder: impl Into<FolderId>) -> Self {
        self.unavailable_folders.insert(folder.into());
        self
    }

    /// `(folder, limit, offset)` of every children listing, in call order.
    pub async fn list_calls(&self) -> Vec<(FolderId, usize, usize)> {
        self.list_calls.lock().await.clone()
    }

    pub async fn search_calls(&self) -> Vec<(String, Option<FolderId>)> {
        self.search_calls.lock().await.clone()
    }

    pub async fn folder_search_calls(&self) -> Vec<String> {
        self.folder_search_calls.lock().await.clone()
    }

    pub async fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().await.clone()
    }

    /// Every item below `root`, breadth first. Visits each folder once.
    fn descendants(&self, root: &FolderId) -> Vec<&ItemRecord> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([root.clone()]);
        while let Some(folder) = queue.pop_front() {
            if !seen.insert(folder.clone()) {
                continue;
            }
            for item in self.children.get(&folder).into_iter().flatten() {
                if item.kind == ItemKind::Folder {
                    queue.push_back(FolderId::new(item.id.as_str()));
                }
                found.push(item);
            }
        }
        found
    }
}

#[async_trait]
impl FolderServiceClient for MockFolderService {
    async fn search_folders(&self, name: &str, limit: usize) -> Result<Vec<ItemRecord>> {
        self.folder_search_calls.lock().await.push(name.to_string());
        Ok(self
            .descendants(&FolderId::top_level())
            .into_iter()
            .filter(|item| item.kind == ItemKind::Folder && item.name.as_deref() == Some(name))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn search(&self, query: &str, limit: usize, ancestor: Option<&FolderId>) -> Result<Vec<ItemRecord>> {
        self.search_calls.lock().await.push((query.to_string(), ancestor.cloned()));
        let root = ancestor.cloned().unwrap_or_else(FolderId::top_level);
        Ok(self
            .descendants(&root)
            .into_iter()
            .filter(|item| item.name.as_deref() == Some(query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_children(&self, folder: &FolderId, limit: usize, offset: usize) -> Result<Vec<ItemRecord>> {
        self.list_calls.lock().await.push((folder.clone(), limit, offset));
        if self.unavailable_folders.contains(folder) {
            exn::bail!(ErrorKind::backend(format!("folder {folder} is unreachable")));
        }
        let items = self.children.get(folder).map(Vec::as_slice).unwrap_or_default();
        Ok(items.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn fetch_item(&self, id: &str) -> Result<Option<ItemRecord>> {
        self.fetch_calls.lock().await.push(id.to_string());
        if self.unavailable_items.contains(id) {
            exn::bail!(ErrorKind::backend(format!("item {id} is unreachable")));
        }
        Ok(self.details.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_follows_markers() {
        let store = MockObjectStore::default().with_pages(
            "a",
            [
                ObjectPage::truncated([ObjectRecord::new("1", None)], "m1"),
                ObjectPage::truncated([ObjectRecord::new("2", None)], "m2"),
                ObjectPage::last([ObjectRecord::new("3", None)]),
            ],
        );
        assert_eq!(store.list_objects("a", None).await.unwrap().objects[0].key, "1");
        assert_eq!(store.list_objects("a", Some("m2")).await.unwrap().objects[0].key, "3");
        assert!(store.list_objects("a", Some("bogus")).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_bucket_is_empty() {
        let store = MockObjectStore::default();
        let page = store.list_objects("nope", None).await.unwrap();
        assert!(page.objects.is_empty());
        assert!(!page.is_truncated);
        assert_eq!(store.fetch_object("nope", "key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_children_paging() {
        let service = MockFolderService::default()
            .with_children("0", (0..5).map(|i| ItemRecord::file(i.to_string(), format!("f{i}"))));
        let page = service.list_children(&FolderId::top_level(), 2, 4).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "4");
    }

    #[tokio::test]
    async fn test_search_restricted_to_ancestor() {
        let service = MockFolderService::default()
            .with_children("0", [ItemRecord::folder("1", "docs"), ItemRecord::file("2", "a.txt")])
            .with_children("1", [ItemRecord::file("3", "a.txt")]);
        let everywhere = service.search("a.txt", 10, None).await.unwrap();
        assert_eq!(everywhere.len(), 2);
        let in_docs = service.search("a.txt", 10, Some(&FolderId::new("1"))).await.unwrap();
        assert_eq!(in_docs.len(), 1);
        assert_eq!(in_docs[0].id, "3");
    }
}
