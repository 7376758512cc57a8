//! The endpoint registry: a fixed name-to-endpoint table built once
//! at startup.

use std::sync::Arc;

use indexmap::IndexMap;

use drydock_core::Endpoint;

/// Registry construction errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// Two endpoints claimed the same name.
    #[error("endpoint name '{name}' registered twice")]
    Duplicate {
        /// The contested name.
        name: String,
    },
}

/// Accumulates endpoint registrations before the server starts.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: IndexMap<String, Arc<dyn Endpoint>>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint under a name.
    ///
    /// # Errors
    /// Returns [`RegistryError::Duplicate`] if the name is already
    /// taken. A collision is a deployment mistake; refusing to start
    /// beats silently serving whichever endpoint registered last.
    pub fn register(
        mut self,
        name: impl Into<String>,
        endpoint: Arc<dyn Endpoint>,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }
        tracing::info!(endpoint = %name, "registered endpoint /api/{name}");
        self.entries.insert(name, endpoint);
        Ok(self)
    }

    /// Freeze the registrations into an immutable registry.
    #[must_use]
    pub fn build(self) -> EndpointRegistry {
        EndpointRegistry { entries: self.entries }
    }
}

/// The immutable endpoint table the dispatcher consults per request.
pub struct EndpointRegistry {
    entries: IndexMap<String, Arc<dyn Endpoint>>,
}

impl EndpointRegistry {
    /// Look up an endpoint by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Endpoint>> {
        self.entries.get(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
