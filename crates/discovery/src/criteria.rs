use crate::error::{ErrorKind, Result};
use derive_more::Display;

/// Which content hash a hash-tier search compares against.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKind {
    #[display("md5")]
    Md5,
    #[display("sha1")]
    Sha1,
}

/// What to look for: any combination of name, MD5 and SHA-1.
///
/// Values are kept exactly as given (object keys may start or end with
/// whitespace), but blank values count as absent, so
/// `SearchCriteria::default().with_name("  ")` is still empty. At least one
/// criterion must be present for a search to be valid; see
/// [`validate`](Self::validate).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    name: Option<String>,
    md5: Option<String>,
    sha1: Option<String>,
}

impl SearchCriteria {
    pub fn by_name(name: impl AsRef<str>) -> Self {
        Self::default().with_name(name)
    }

    pub fn by_md5(md5: impl AsRef<str>) -> Self {
        Self::default().with_md5(md5)
    }

    pub fn by_sha1(sha1: impl AsRef<str>) -> Self {
        Self::default().with_sha1(sha1)
    }

    pub fn with_name(mut self, name: impl AsRef<str>) -> Self {
        self.name = clean(name.as_ref());
        self
    }

    pub fn with_md5(mut self, md5: impl AsRef<str>) -> Self {
        self.md5 = clean(md5.as_ref());
        self
    }

    pub fn with_sha1(mut self, sha1: impl AsRef<str>) -> Self {
        self.sha1 = clean(sha1.as_ref());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn md5(&self) -> Option<&str> {
        self.md5.as_deref()
    }

    pub fn sha1(&self) -> Option<&str> {
        self.sha1.as_deref()
    }

    pub fn hash(&self, kind: HashKind) -> Option<&str> {
        match kind {
            HashKind::Md5 => self.md5(),
            HashKind::Sha1 => self.sha1(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.md5.is_none() && self.sha1.is_none()
    }

    /// Fails with [`InvalidArgument`](ErrorKind::InvalidArgument) when no
    /// criterion is present.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            exn::bail!(ErrorKind::InvalidArgument("no name, md5 or sha1 search criteria supplied".to_string()));
        }
        Ok(())
    }
}

fn clean(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

/// Reject a blank search value before any backend I/O.
pub(crate) fn require<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        exn::bail!(ErrorKind::InvalidArgument(format!("no {what} supplied")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SearchCriteria::default(), false)]
    #[case(SearchCriteria::by_name("   "), false)]
    #[case(SearchCriteria::by_md5("").with_sha1("\t"), false)]
    #[case(SearchCriteria::by_name("a.txt"), true)]
    #[case(SearchCriteria::by_md5("d41d8cd98f00b204e9800998ecf8427e"), true)]
    #[case(SearchCriteria::by_sha1("da39a3ee5e6b4b0d3255bfef95601890afd80709"), true)]
    fn test_validate(#[case] criteria: SearchCriteria, #[case] valid: bool) {
        assert_eq!(criteria.validate().is_ok(), valid);
    }

    #[test]
    fn test_invalid_argument_kind() {
        let err = SearchCriteria::default().validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidArgument(_)));
    }

    #[test]
    fn test_values_kept_verbatim() {
        let criteria = SearchCriteria::by_name(" report.pdf").with_md5("ABC").with_sha1("  ");
        assert_eq!(criteria.name(), Some(" report.pdf"));
        assert_eq!(criteria.hash(HashKind::Md5), Some("ABC"));
        assert_eq!(criteria.hash(HashKind::Sha1), None);
    }

    #[rstest]
    #[case("", false)]
    #[case(" \t", false)]
    #[case(" report.pdf", true)]
    fn test_require(#[case] value: &str, #[case] accepted: bool) {
        match require("name", value) {
            Ok(kept) => {
                assert!(accepted);
                assert_eq!(kept, value);
            },
            Err(err) => {
                assert!(!accepted);
                assert!(matches!(&*err, ErrorKind::InvalidArgument(_)));
            },
        }
    }
}
