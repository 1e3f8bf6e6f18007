//! Provider lookup by URL prefix.

use tracing::debug;

use super::{NnmProvider, Provider, RutrackerProvider, TrackerError};

/// Collection of providers dispatched by longest base-URL prefix.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn Provider>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Registry with every built-in tracker at its public address.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(NnmProvider::new()));
        registry.register(Box::new(RutrackerProvider::new()));
        registry
    }

    /// Adds a provider.
    #[tracing::instrument(skip(self, provider), fields(provider = provider.name()))]
    pub fn register(&mut self, provider: Box<dyn Provider>) {
        debug!(base_url = provider.base_url(), "registering provider");
        self.providers.push(provider);
    }

    /// Returns the number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no providers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Base URLs of every registered provider, in registration order.
    #[must_use]
    pub fn base_urls(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.base_url()).collect()
    }

    /// Picks the provider whose base URL is the longest prefix of `url`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::ProviderNotFound`] if no base URL matches.
    pub fn select(&self, url: &str) -> Result<&dyn Provider, TrackerError> {
        self.providers
            .iter()
            .filter(|p| url.starts_with(p.base_url()))
            .max_by_key(|p| p.base_url().len())
            .map(AsRef::as_ref)
            .ok_or_else(|| TrackerError::provider_not_found(url, &self.base_urls()))
    }
}
