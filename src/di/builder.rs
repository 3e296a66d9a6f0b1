use crate::di::ServiceLocator;
use crate::error::Result;
use crate::event::ListenerAggregate;

/// Builder for constructing a service locator
///
/// Use this to register services before handing the locator to an
/// application.
///
/// # Example
/// ```rust,ignore
/// let services = ServiceLocatorBuilder::new()
///     .register("AlbumTable", AlbumTable::new())
///     .listener("AuditListener", AuditListener::default())
///     .build();
/// ```
pub struct ServiceLocatorBuilder {
    locator: ServiceLocator,
}

impl ServiceLocatorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            locator: ServiceLocator::new(),
        }
    }

    /// Register a service instance
    pub fn register<T: 'static + Send + Sync>(mut self, name: impl Into<String>, instance: T) -> Self {
        self.locator.set(name, instance);
        self
    }

    /// Register a factory, run on first lookup
    pub fn factory<T, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ServiceLocator) -> Result<T> + 'static + Send + Sync,
    {
        self.locator.set_factory(name, factory);
        self
    }

    /// Register a listener aggregate
    pub fn listener<L: ListenerAggregate>(mut self, name: impl Into<String>, aggregate: L) -> Self {
        self.locator.set_listener_aggregate(name, aggregate);
        self
    }

    /// Build the locator
    pub fn build(self) -> ServiceLocator {
        self.locator
    }
}

impl Default for ServiceLocatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
