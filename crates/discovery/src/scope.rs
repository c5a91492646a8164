//! Backend scope: which buckets or folders an adapter is allowed to look in.
//!
//! Scopes are validated once when constructed and are read-only afterward.

use crate::error::{ErrorKind, Result};

/// Folder id a hierarchical service uses for its top level.
pub const TOP_LEVEL_FOLDER_ID: &str = "0";
/// Default number of children requested per folder listing page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;
/// Default cap on results from a single native name search.
pub const DEFAULT_NAME_SEARCH_LIMIT: usize = 200;

/// Ordered list of buckets for a flat-namespace backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatScope {
    buckets: Vec<String>,
}

impl FlatScope {
    /// Blank bucket names are dropped. Fails with
    /// [`InvalidConfig`](ErrorKind::InvalidConfig) if nothing is left.
    pub fn new(buckets: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        let buckets: Vec<String> = buckets
            .into_iter()
            .map(Into::into)
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();
        if buckets.is_empty() {
            exn::bail!(ErrorKind::InvalidConfig("at least one bucket is required".to_string()));
        }
        Ok(Self { buckets })
    }

    pub fn buckets(&self) -> &[String] {
        &self.buckets
    }
}

/// One configured root of a hierarchical backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeRoot {
    /// The whole space (configured as `/`).
    TopLevel,
    /// A folder found by name through the service's folder search.
    Folder(String),
}

impl ScopeRoot {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" => None,
            "/" => Some(Self::TopLevel),
            name => Some(Self::Folder(name.to_string())),
        }
    }
}

/// Ordered roots and paging bounds for a hierarchical backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyScope {
    roots: Vec<ScopeRoot>,
    page_size: usize,
    name_search_limit: usize,
}

impl HierarchyScope {
    /// Build a scope from folder names, `/` meaning the top level. With no
    /// usable folders the scope is the whole space.
    pub fn new(folders: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let mut roots: Vec<ScopeRoot> = folders.into_iter().filter_map(|f| ScopeRoot::parse(f.as_ref())).collect();
        if roots.is_empty() {
            roots.push(ScopeRoot::TopLevel);
        }
        Self {
            roots,
            page_size: DEFAULT_PAGE_SIZE,
            name_search_limit: DEFAULT_NAME_SEARCH_LIMIT,
        }
    }

    /// Whole-space scope with default bounds.
    pub fn top_level() -> Self {
        Self::new(["/"])
    }

    pub fn with_page_size(mut self, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            exn::bail!(ErrorKind::InvalidConfig("page size must be greater than zero".to_string()));
        }
        self.page_size = page_size;
        Ok(self)
    }

    pub fn with_name_search_limit(mut self, limit: usize) -> Result<Self> {
        if limit == 0 {
            exn::bail!(ErrorKind::InvalidConfig("name search limit must be greater than zero".to_string()));
        }
        self.name_search_limit = limit;
        Ok(self)
    }

    pub fn roots(&self) -> &[ScopeRoot] {
        &self.roots
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn name_search_limit(&self) -> usize {
        self.name_search_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_flat_scope_drops_blanks() {
        let scope = FlatScope::new(["a", "", " b ", "  "]).unwrap();
        assert_eq!(scope.buckets(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_flat_scope_requires_bucket() {
        let err = FlatScope::new(["", " "]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidConfig(_)));
    }

    #[rstest]
    #[case("/", Some(ScopeRoot::TopLevel))]
    #[case("Projects", Some(ScopeRoot::Folder("Projects".to_string())))]
    #[case(" Projects ", Some(ScopeRoot::Folder("Projects".to_string())))]
    #[case("", None)]
    fn test_scope_root_parse(#[case] raw: &str, #[case] expected: Option<ScopeRoot>) {
        assert_eq!(ScopeRoot::parse(raw), expected);
    }

    #[test]
    fn test_hierarchy_scope_defaults_to_top_level() {
        let scope = HierarchyScope::new(Vec::<String>::new());
        assert_eq!(scope.roots(), [ScopeRoot::TopLevel]);
        assert_eq!(scope.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(scope.name_search_limit(), DEFAULT_NAME_SEARCH_LIMIT);
    }

    #[test]
    fn test_hierarchy_scope_rejects_zero_page_size() {
        let err = HierarchyScope::top_level().with_page_size(0).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidConfig(_)));
    }
}
