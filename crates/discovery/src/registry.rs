use crate::BackendHandle;
use crate::criteria::SearchCriteria;
use crate::descriptor::FileDescriptor;
use crate::error::Result;
use tracing::instrument;

/// Per-backend outcome of [`Registry::find_file_everywhere`]: the backend
/// name and either its matches or its error.
pub type BackendResult = (String, Result<Vec<FileDescriptor>>);

/// Named set of configured backends.
///
/// Keeps registration order; callers iterating or searching everywhere see
/// backends in the order they were added.
#[derive(Clone, Default)]
pub struct Registry {
    backends: Vec<BackendHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a backend, replacing (and returning) any backend already
    /// registered under the same name. The replacement keeps the old
    /// backend's position.
    pub fn register(&mut self, backend: BackendHandle) -> Option<BackendHandle> {
        match self.backends.iter_mut().find(|existing| existing.name() == backend.name()) {
            Some(existing) => {
                tracing::warn!(backend = backend.name(), "Replacing backend registered under the same name");
                Some(std::mem::replace(existing, backend))
            },
            None => {
                tracing::debug!(backend = backend.name(), service = backend.service_type(), "Registered backend");
                self.backends.push(backend);
                None
            },
        }
    }

    pub fn with(mut self, backend: BackendHandle) -> Self {
        self.register(backend);
        self
    }

    pub fn get(&self, name: &str) -> Option<&BackendHandle> {
        self.backends.iter().find(|backend| backend.name() == name)
    }

    pub fn by_service_type<'a>(&'a self, service_type: &'a str) -> impl Iterator<Item = &'a BackendHandle> + 'a {
        self.backends.iter().filter(move |backend| backend.service_type() == service_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackendHandle> {
        self.backends.iter()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Run [`find_file`](crate::DiscoveryBackend::find_file) against every
    /// registered backend, one after the other.
    ///
    /// One backend failing doesn't stop the others; its error is reported in
    /// its own slot. Only invalid criteria fail the whole call, before any
    /// backend is queried.
    #[instrument(skip_all, fields(backends = self.backends.len()))]
    pub async fn find_file_everywhere(&self, criteria: &SearchCriteria) -> Result<Vec<BackendResult>> {
        criteria.validate()?;
        let mut results = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            let result = backend.find_file(criteria).await;
            match &result {
                Ok(found) => tracing::debug!(backend = backend.name(), matches = found.len(), "Backend searched"),
                Err(err) => tracing::warn!(backend = backend.name(), error = ?err, "Backend search failed"),
            }
            results.push((backend.name().to_string(), result));
        }
        Ok(results)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.backends.iter().map(|backend| backend.name())).finish()
    }
}
