use super::Application;
use crate::di::keys;
use crate::error::Result;
use crate::event::DEFAULT_PRIORITY;

/// Listener services attached by every application, in this order.
pub const DEFAULT_LISTENERS: [&str; 5] = [
    keys::ROUTE_LISTENER,
    keys::DISPATCH_LISTENER,
    keys::HTTP_METHOD_LISTENER,
    keys::VIEW_MANAGER,
    keys::SEND_RESPONSE_LISTENER,
];

/// A unit of application setup, typically attaching listeners.
///
/// Closures of the shape `Fn(&mut Application) -> Result<()>` implement
/// this automatically.
pub trait Bootstrapper: Send + Sync {
    fn bootstrap(&self, app: &mut Application) -> Result<()>;
}

impl<F> Bootstrapper for F
where
    F: Fn(&mut Application) -> Result<()> + Send + Sync,
{
    fn bootstrap(&self, app: &mut Application) -> Result<()> {
        self(app)
    }
}

/// Ordered list of bootstrappers.
///
/// Bootstrappers run strictly in insertion order; the first failure stops
/// the chain and is returned.
#[derive(Default)]
pub struct BootstrapperChain {
    bootstrappers: Vec<Box<dyn Bootstrapper>>,
}

impl BootstrapperChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bootstrapper: impl Bootstrapper + 'static) -> &mut Self {
        self.bootstrappers.push(Box::new(bootstrapper));
        self
    }

    pub fn with(mut self, bootstrapper: impl Bootstrapper + 'static) -> Self {
        self.add(bootstrapper);
        self
    }

    pub fn len(&self) -> usize {
        self.bootstrappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bootstrappers.is_empty()
    }
}

impl Bootstrapper for BootstrapperChain {
    fn bootstrap(&self, app: &mut Application) -> Result<()> {
        let total = self.bootstrappers.len();
        for (index, bootstrapper) in self.bootstrappers.iter().enumerate() {
            tracing::debug!("Running bootstrapper {}/{}", index + 1, total);
            if let Err(e) = bootstrapper.bootstrap(app) {
                tracing::error!("Bootstrapper {}/{} failed: {}", index + 1, total, e);
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Resolves listener aggregates from the service locator by name and
/// attaches them to the application's event manager.
///
/// A missing name fails with the locator's `ServiceNotFound`; a name bound
/// to something other than an aggregate fails with `InvalidListener`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerProviderBootstrapper {
    keys: Vec<String>,
}

impl ListenerProviderBootstrapper {
    /// Attach exactly the given listener services.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Attach the [`DEFAULT_LISTENERS`], then `extra`; repeated names are
    /// attached once.
    pub fn with_defaults<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: Vec<String> = DEFAULT_LISTENERS.iter().map(|k| k.to_string()).collect();
        for key in extra {
            let key = key.into();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        Self { keys }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl Bootstrapper for ListenerProviderBootstrapper {
    fn bootstrap(&self, app: &mut Application) -> Result<()> {
        for key in &self.keys {
            let aggregate = app.services().listener_aggregate(key)?;
            let handles = app.events_mut().attach_aggregate(aggregate, DEFAULT_PRIORITY);
            tracing::debug!("Attached '{}' ({} listeners)", key, handles.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_then_extra_without_duplicates() {
        let provider =
            ListenerProviderBootstrapper::with_defaults(["AuditListener", keys::VIEW_MANAGER]);
        assert_eq!(provider.keys().len(), 6);
        assert_eq!(provider.keys()[0], keys::ROUTE_LISTENER);
        assert_eq!(provider.keys()[5], "AuditListener");
    }

    #[test]
    fn test_new_uses_caller_keys_only() {
        let provider = ListenerProviderBootstrapper::new(["AuditListener"]);
        assert_eq!(provider.keys(), &["AuditListener".to_string()]);
    }

    #[test]
    fn test_chain_builder() {
        let chain = BootstrapperChain::new()
            .with(|_: &mut Application| -> Result<()> { Ok(()) })
            .with(ListenerProviderBootstrapper::new(Vec::<String>::new()));
        assert_eq!(chain.len(), 2);
        assert!(BootstrapperChain::default().is_empty());
    }
}
