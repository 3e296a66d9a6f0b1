use crate::error::{MvcError, Result};
use crate::event::ListenerAggregate;
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;

type SharedService = Arc<dyn Any + Send + Sync>;

/// Type alias for a factory building a service on first lookup.
type FactoryFn = Arc<dyn Fn(&ServiceLocator) -> Result<SharedService> + Send + Sync>;

/// Marker wrapper so aggregates can be told apart from other services.
struct AggregateService(Arc<dyn ListenerAggregate>);

#[derive(Clone)]
enum ServiceEntry {
    Instance(SharedService),
    Factory(FactoryFn),
}

/// Thread-safe, string-keyed service locator.
///
/// Factories run once, on first lookup; the built instance replaces them.
pub struct ServiceLocator {
    services: DashMap<String, ServiceEntry>,
}

impl Clone for ServiceLocator {
    fn clone(&self) -> Self {
        Self {
            services: self.services.clone(),
        }
    }
}

impl ServiceLocator {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    pub fn set<T: 'static + Send + Sync>(&mut self, name: impl Into<String>, instance: T) -> &mut Self {
        self.set_shared(name, Arc::new(instance))
    }

    pub fn set_shared<T: 'static + Send + Sync>(
        &mut self,
        name: impl Into<String>,
        instance: Arc<T>,
    ) -> &mut Self {
        self.services
            .insert(name.into(), ServiceEntry::Instance(instance));
        self
    }

    pub fn set_factory<T, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ServiceLocator) -> Result<T> + 'static + Send + Sync,
    {
        let factory: FactoryFn =
            Arc::new(move |locator: &ServiceLocator| Ok(Arc::new(factory(locator)?) as SharedService));
        self.services
            .insert(name.into(), ServiceEntry::Factory(factory));
        self
    }

    /// Register a listener aggregate under `name`.
    pub fn set_listener_aggregate<L: ListenerAggregate>(
        &mut self,
        name: impl Into<String>,
        aggregate: L,
    ) -> &mut Self {
        self.set(name, AggregateService(Arc::new(aggregate)))
    }

    /// Register a factory building a listener aggregate on first lookup.
    pub fn set_aggregate_factory<L, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        L: ListenerAggregate,
        F: Fn(&ServiceLocator) -> Result<L> + 'static + Send + Sync,
    {
        self.set_factory(name, move |locator: &ServiceLocator| {
            Ok(AggregateService(Arc::new(factory(locator)?)))
        })
    }

    fn get_any(&self, name: &str) -> Result<SharedService> {
        // Clone the entry out so no shard lock is held while a factory runs.
        let entry = self
            .services
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| MvcError::ServiceNotFound {
                name: name.to_string(),
            })?;

        match entry {
            ServiceEntry::Instance(instance) => Ok(instance),
            ServiceEntry::Factory(factory) => {
                let instance = factory(self)?;
                self.services
                    .insert(name.to_string(), ServiceEntry::Instance(instance.clone()));
                tracing::debug!("Built service '{}' from factory", name);
                Ok(instance)
            }
        }
    }

    pub fn get<T: 'static + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.get_any(name)?
            .downcast::<T>()
            .map_err(|_| MvcError::DowncastFailed {
                name: format!("{} as {}", name, std::any::type_name::<T>()),
            })
    }

    /// Resolve a listener aggregate.
    ///
    /// A missing key yields `ServiceNotFound`; a key bound to anything else
    /// yields `InvalidListener`.
    pub fn listener_aggregate(&self, name: &str) -> Result<Arc<dyn ListenerAggregate>> {
        self.get_any(name)?
            .downcast::<AggregateService>()
            .map(|service| Arc::clone(&service.0))
            .map_err(|_| MvcError::InvalidListener {
                name: name.to_string(),
            })
    }

    pub fn has(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn keys(&self) -> Vec<String> {
        self.services.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Default for ServiceLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventManager, ListenerHandle, MvcEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestService {
        value: i32,
    }

    struct NoopAggregate;

    impl ListenerAggregate for NoopAggregate {
        fn attach(
            self: Arc<Self>,
            _events: &mut EventManager<MvcEvent>,
            _priority: i32,
        ) -> Vec<ListenerHandle> {
            Vec::new()
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut locator = ServiceLocator::new();
        locator.set("test", TestService { value: 42 });
        let service = locator.get::<TestService>("test").unwrap();
        assert_eq!(service.value, 42);
    }

    #[test]
    fn test_missing_service() {
        let locator = ServiceLocator::new();
        match locator.get::<TestService>("missing") {
            Err(MvcError::ServiceNotFound { name }) => assert_eq!(name, "missing"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_wrong_type_is_downcast_failure() {
        let mut locator = ServiceLocator::new();
        locator.set("test", TestService { value: 1 });
        assert!(matches!(
            locator.get::<String>("test"),
            Err(MvcError::DowncastFailed { .. })
        ));
    }

    #[test]
    fn test_factory_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut locator = ServiceLocator::new();
        locator.set_factory("lazy", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(TestService { value: 7 })
        });

        assert_eq!(locator.get::<TestService>("lazy").unwrap().value, 7);
        assert_eq!(locator.get::<TestService>("lazy").unwrap().value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_can_resolve_dependencies() {
        let mut locator = ServiceLocator::new();
        locator.set("base", TestService { value: 20 });
        locator.set_factory("derived", |locator| {
            let base = locator.get::<TestService>("base")?;
            Ok(TestService {
                value: base.value + 1,
            })
        });
        assert_eq!(locator.get::<TestService>("derived").unwrap().value, 21);
    }

    #[test]
    fn test_listener_aggregate_resolution() {
        let mut locator = ServiceLocator::new();
        locator.set_listener_aggregate("noop", NoopAggregate);
        locator.set("plain", TestService { value: 0 });

        assert!(locator.listener_aggregate("noop").is_ok());
        assert!(matches!(
            locator.listener_aggregate("plain"),
            Err(MvcError::InvalidListener { name }) if name == "plain"
        ));
        assert!(matches!(
            locator.listener_aggregate("absent"),
            Err(MvcError::ServiceNotFound { name }) if name == "absent"
        ));
    }
}
