//! Find files across heterogeneous storage services.
//!
//! Every service is wrapped in a [`DiscoveryBackend`] which answers the same
//! question (which files match this name, md5 or sha1?) regardless of what the
//! service can natively search for. Backends are grouped in a [`Registry`].

pub mod backend;
pub mod client;
mod criteria;
mod descriptor;
pub mod error;
mod registry;
mod resolver;
mod scope;

pub use crate::backend::{DiscoveryBackend, FlatScanAdapter, HierarchyCrawlAdapter, ScanMode};
pub use crate::criteria::{HashKind, SearchCriteria};
pub use crate::descriptor::{FileDescriptor, FileDescriptorBuilder};
pub use crate::registry::{BackendResult, Registry};
pub use crate::scope::{
    DEFAULT_NAME_SEARCH_LIMIT, DEFAULT_PAGE_SIZE, FlatScope, HierarchyScope, ScopeRoot, TOP_LEVEL_FOLDER_ID,
};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn DiscoveryBackend>;
