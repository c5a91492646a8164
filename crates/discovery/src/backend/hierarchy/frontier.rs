use crate::client::FolderId;
use std::collections::{HashSet, VecDeque};

/// Breadth-first work queue of folders still to list, plus the folders
/// already listed.
///
/// Lives for exactly one crawl. A folder that shows up more than once (two
/// parents linking the same child, a child linking back to an ancestor) is
/// handed out by [`next`](Self::next) only until it is marked visited.
#[derive(Debug, Default)]
pub(super) struct Frontier {
    queue: VecDeque<FolderId>,
    visited: HashSet<FolderId>,
}

impl Frontier {
    pub(super) fn new(seeds: impl IntoIterator<Item = FolderId>) -> Self {
        let mut frontier = Self::default();
        seeds.into_iter().for_each(|seed| frontier.push(seed));
        frontier
    }

    /// Queue a folder. Folders already visited are dropped straight away.
    pub(super) fn push(&mut self, folder: FolderId) {
        if !self.visited.contains(&folder) {
            self.queue.push_back(folder);
        }
    }

    /// Oldest queued folder that hasn't been visited yet.
    pub(super) fn next(&mut self) -> Option<FolderId> {
        while let Some(folder) = self.queue.pop_front() {
            if self.visited.contains(&folder) {
                tracing::debug!(%folder, "Folder already processed");
                continue;
            }
            return Some(folder);
        }
        None
    }

    pub(super) fn mark_visited(&mut self, folder: FolderId) {
        self.visited.insert(folder);
    }

    pub(super) fn pending(&self) -> usize {
        self.queue.len()
    }

    pub(super) fn visited(&self) -> usize {
        self.visited.len()
    }
}
