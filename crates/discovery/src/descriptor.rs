//! Canonical file descriptor.
//!
//! Every backend adapter normalizes its native result records into a
//! [`FileDescriptor`], so callers never have to care which service a match
//! came from.

use crate::error::{ErrorKind, Result};

/// One discovered file, independent of the backend that found it.
///
/// Descriptors are snapshots: they hold no connection to the backend and are
/// stale the moment they are returned. Query again for current state.
///
/// Only [`name`](Self::name) is guaranteed; everything else is best-effort
/// and depends on what the backend surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FileDescriptor {
    id: Option<String>,
    name: String,
    parent: Option<String>,
    md5: Option<String>,
    sha1: Option<String>,
    path: String,
}

impl FileDescriptor {
    /// Start building a descriptor for a file called `name`.
    ///
    /// The name is checked when [`build`](FileDescriptorBuilder::build) is
    /// called, not here.
    pub fn builder(name: impl Into<String>) -> FileDescriptorBuilder {
        FileDescriptorBuilder {
            inner: FileDescriptor {
                id: None,
                name: name.into(),
                parent: None,
                md5: None,
                sha1: None,
                path: String::new(),
            },
        }
    }

    /// Opaque backend-assigned identifier. Flat namespaces have none.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// File name as reported by the backend. Never empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the containing folder or bucket.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Hex-encoded MD5, if the backend surfaces one.
    pub fn md5(&self) -> Option<&str> {
        self.md5.as_deref()
    }

    /// Hex-encoded SHA-1, if the backend surfaces one.
    pub fn sha1(&self) -> Option<&str> {
        self.sha1.as_deref()
    }

    /// Forward-slash delimited ancestor path. Empty when the backend can't
    /// cheaply supply it.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Builder returned by [`FileDescriptor::builder`].
#[derive(Debug, Clone)]
#[must_use]
pub struct FileDescriptorBuilder {
    inner: FileDescriptor,
}

impl FileDescriptorBuilder {
    pub fn id(mut self, id: impl Into<Option<String>>) -> Self {
        self.inner.id = non_empty(id.into());
        self
    }

    pub fn parent(mut self, parent: impl Into<Option<String>>) -> Self {
        self.inner.parent = non_empty(parent.into());
        self
    }

    pub fn md5(mut self, md5: impl Into<Option<String>>) -> Self {
        self.inner.md5 = non_empty(md5.into());
        self
    }

    pub fn sha1(mut self, sha1: impl Into<Option<String>>) -> Self {
        self.inner.sha1 = non_empty(sha1.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.inner.path = path.into();
        self
    }

    /// Finish the descriptor.
    ///
    /// Fails with [`NormalizationFailure`](ErrorKind::NormalizationFailure)
    /// if the name is empty or whitespace.
    pub fn build(self) -> Result<FileDescriptor> {
        if self.inner.name.trim().is_empty() {
            exn::bail!(ErrorKind::NormalizationFailure(format!(
                "record {} has no name",
                self.inner.id.as_deref().unwrap_or("<no id>")
            )));
        }
        Ok(self.inner)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
