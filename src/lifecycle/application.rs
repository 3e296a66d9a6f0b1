//! Application Lifecycle
//!
//! Drives one request through the stages of the MVC lifecycle.

use super::{Bootstrapper, BootstrapperChain, ListenerProviderBootstrapper};
use crate::config::ApplicationConfig;
use crate::controller::{Controller, ControllerManager};
use crate::di::{ServiceLocator, keys};
use crate::error::Result;
use crate::event::{ActionResult, ErrorKind, EventManager, MvcEvent, MvcFailure, MvcStage};
use crate::exception::default_error_response;
use crate::http::{HttpRequest, HttpResponse};
use crate::listener::{DispatchListener, HttpMethodListener, RouteListener};
use crate::router::Router;
use crate::send::SendResponseListener;
use crate::view::{ViewManager, ViewModel};
use std::sync::Arc;

/// The MVC application.
///
/// Owns the service locator, the event manager and the router. After
/// [`bootstrap`](Self::bootstrap) the application is only read, so it can
/// be shared behind an `Arc` and [`run`](Self::run) concurrently.
///
/// # Example
///
/// ```rust,ignore
/// use stagehand::prelude::*;
///
/// let mut router = HttpRouter::new();
/// router.add_route("home", "/", &[("controller", "index")])?;
///
/// let app = Application::builder()
///     .router(router)
///     .controller("index", |_| Ok(ActionController::new().action("index", |_| Ok(ActionResult::Empty))))
///     .init()?;
///
/// let response = app.run(request)?;
/// ```
pub struct Application {
    services: Arc<ServiceLocator>,
    events: EventManager<MvcEvent>,
    config: Arc<ApplicationConfig>,
    router: Option<Arc<dyn Router>>,
    bootstrappers: BootstrapperChain,
    bootstrapped: bool,
}

impl Application {
    /// Create a new application builder
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn services(&self) -> &Arc<ServiceLocator> {
        &self.services
    }

    pub fn events(&self) -> &EventManager<MvcEvent> {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventManager<MvcEvent> {
        &mut self.events
    }

    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    pub fn router(&self) -> Option<&Arc<dyn Router>> {
        self.router.as_ref()
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    /// Attach the default listeners and `extra_listeners`, run the
    /// registered bootstrappers, then trigger the `bootstrap` stage.
    ///
    /// Calling it again is a no-op. A failed bootstrap clears the
    /// listener registry, so a retry starts from an empty manager.
    pub fn bootstrap(&mut self, extra_listeners: &[&str]) -> Result<()> {
        if self.bootstrapped {
            tracing::warn!("Application already bootstrapped");
            return Ok(());
        }
        tracing::info!("Bootstrapping application...");

        if let Err(e) = self.attach_and_bootstrap(extra_listeners) {
            tracing::error!("Bootstrap failed, clearing listeners: {}", e);
            self.events = EventManager::new();
            return Err(e);
        }

        self.bootstrapped = true;
        tracing::info!("Application bootstrap complete");
        Ok(())
    }

    fn attach_and_bootstrap(&mut self, extra_listeners: &[&str]) -> Result<()> {
        ListenerProviderBootstrapper::with_defaults(extra_listeners.iter().copied())
            .bootstrap(self)?;

        let chain = std::mem::take(&mut self.bootstrappers);
        let outcome = chain.bootstrap(self);
        self.bootstrappers = chain;
        outcome?;

        let mut event = self.create_event(HttpRequest::default());
        event.set_name(MvcStage::Bootstrap);
        self.events.trigger(MvcStage::Bootstrap, &mut event)?;
        Ok(())
    }

    fn create_event(&self, request: HttpRequest) -> MvcEvent {
        MvcEvent::new(request, Arc::clone(&self.services))
            .with_router(self.router.clone())
            .with_view_model(ViewModel::new().with_template(self.config.layout_template.as_str()))
    }

    /// Run one request through route, dispatch, render and finish.
    ///
    /// Routing and dispatch failures never surface here; they are answered
    /// by the error stages. Errors from `dispatch.error`, `render.error` and
    /// `finish` listeners are returned.
    pub fn run(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut event = self.create_event(request);
        let span = tracing::info_span!(
            "request",
            id = %event.request_id(),
            method = %event.request().method(),
            uri = %event.request().uri(),
        );
        let _enter = span.enter();

        if let Some(response) = self.trigger_short_circuit(MvcStage::Route, &mut event) {
            return self.complete(event, response);
        }

        if !event.is_error() {
            if let Some(response) = self.trigger_short_circuit(MvcStage::Dispatch, &mut event) {
                return self.complete(event, response);
            }
        }

        if event.is_error() {
            if let Some(response) = self.trigger_dispatch_error(&mut event)? {
                return self.complete(event, response);
            }
        }

        if event.result().is_some_and(ActionResult::is_response) {
            if let Some(ActionResult::Response(response)) = event.take_result() {
                return self.complete(event, response);
            }
        }

        if let Some(response) = self.trigger_render(&mut event)? {
            return self.complete(event, response);
        }

        self.finish(event)
    }

    /// Trigger a stage that may be ended by a full response.
    ///
    /// Listener errors are recorded on the event as `error-exception`.
    fn trigger_short_circuit(&self, stage: MvcStage, event: &mut MvcEvent) -> Option<HttpResponse> {
        event.set_name(stage);
        tracing::debug!("Triggering '{}'", stage);

        match self
            .events
            .trigger_until(stage, event, ActionResult::is_response)
        {
            Ok(responses) => {
                if !responses.stopped() {
                    return None;
                }
                match responses.into_last() {
                    Some(ActionResult::Response(response)) => {
                        tracing::debug!("'{}' short-circuited with {}", stage, response.status());
                        Some(response)
                    }
                    _ => None,
                }
            }
            Err(e) => {
                tracing::error!("Listener failed during '{}': {}", stage, e);
                let failure = exception_failure(event, e.to_string());
                event.set_error(failure);
                None
            }
        }
    }

    fn trigger_dispatch_error(&self, event: &mut MvcEvent) -> Result<Option<HttpResponse>> {
        event.set_name(MvcStage::DispatchError);
        tracing::debug!("Triggering '{}'", MvcStage::DispatchError);

        let responses =
            self.events
                .trigger_until(MvcStage::DispatchError, event, ActionResult::is_response)?;
        match responses.into_last() {
            Some(ActionResult::Response(response)) => return Ok(Some(response)),
            Some(result) => event.set_result(result),
            None => {}
        }

        if event.result().is_none() {
            if let Some(failure) = event.error() {
                return Ok(Some(default_error_response(failure)));
            }
        }
        Ok(None)
    }

    fn trigger_render(&self, event: &mut MvcEvent) -> Result<Option<HttpResponse>> {
        event.set_name(MvcStage::Render);
        tracing::debug!("Triggering '{}'", MvcStage::Render);

        let Err(e) = self.events.trigger(MvcStage::Render, event) else {
            return Ok(None);
        };

        tracing::error!("Rendering failed: {}", e);
        let failure = exception_failure(event, e.to_string());
        event.set_error(failure.clone());
        event.set_name(MvcStage::RenderError);

        let responses = self.events.trigger(MvcStage::RenderError, event)?;
        if responses.is_empty() {
            return Ok(Some(default_error_response(&failure)));
        }
        match responses.into_last() {
            Some(ActionResult::Response(response)) => Ok(Some(response)),
            _ => Ok(None),
        }
    }

    fn complete(&self, mut event: MvcEvent, response: HttpResponse) -> Result<HttpResponse> {
        event.set_response(response);
        self.finish(event)
    }

    fn finish(&self, mut event: MvcEvent) -> Result<HttpResponse> {
        event.set_name(MvcStage::Finish);
        self.events.trigger(MvcStage::Finish, &mut event)?;
        tracing::debug!("Finished with status {}", event.response().status());
        Ok(event.into_response())
    }
}

fn exception_failure(event: &MvcEvent, message: String) -> MvcFailure {
    let failure = MvcFailure::new(ErrorKind::Exception, message);
    match event.controller_name() {
        Some(controller) => failure.with_controller(controller),
        None => failure,
    }
}

/// Builder for Application
pub struct ApplicationBuilder {
    services: ServiceLocator,
    config: Option<ApplicationConfig>,
    router: Option<Arc<dyn Router>>,
    controllers: ControllerManager,
    bootstrappers: BootstrapperChain,
    listeners: Vec<String>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            services: ServiceLocator::new(),
            config: None,
            router: None,
            controllers: ControllerManager::new(),
            bootstrappers: BootstrapperChain::new(),
            listeners: Vec::new(),
        }
    }

    /// Start from an existing service locator
    pub fn services(mut self, services: ServiceLocator) -> Self {
        self.services = services;
        self
    }

    /// Register a service instance
    pub fn service<T: 'static + Send + Sync>(mut self, name: impl Into<String>, instance: T) -> Self {
        self.services.set(name, instance);
        self
    }

    pub fn config(mut self, config: ApplicationConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn router(mut self, router: impl Router + 'static) -> Self {
        self.router = Some(Arc::new(router));
        self
    }

    /// Register a controller factory
    pub fn controller<C, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        C: Controller + 'static,
        F: Fn(&ServiceLocator) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        self.controllers.register(name, factory);
        self
    }

    /// Add a bootstrapper, run after the listener services are attached
    pub fn bootstrapper(mut self, bootstrapper: impl Bootstrapper + 'static) -> Self {
        self.bootstrappers.add(bootstrapper);
        self
    }

    /// Name an extra listener aggregate service to attach at bootstrap
    pub fn listener(mut self, key: impl Into<String>) -> Self {
        self.listeners.push(key.into());
        self
    }

    /// Build the application without bootstrapping it
    ///
    /// Registers the configuration, the controller manager and the default
    /// listener services unless the locator already has them.
    pub fn build(self) -> Result<Application> {
        let mut services = self.services;

        match self.config {
            Some(config) => {
                services.set(keys::CONFIG, config);
            }
            None if !services.has(keys::CONFIG) => {
                services.set(keys::CONFIG, ApplicationConfig::default());
            }
            None => {}
        }
        let config = services.get::<ApplicationConfig>(keys::CONFIG)?;

        if !services.has(keys::CONTROLLER_MANAGER) {
            services.set(keys::CONTROLLER_MANAGER, self.controllers);
        } else if !self.controllers.names().is_empty() {
            tracing::warn!("A ControllerManager service is registered; builder controllers are ignored");
        }

        if !services.has(keys::ROUTE_LISTENER) {
            services.set_listener_aggregate(keys::ROUTE_LISTENER, RouteListener);
        }
        if !services.has(keys::DISPATCH_LISTENER) {
            services.set_listener_aggregate(keys::DISPATCH_LISTENER, DispatchListener);
        }
        if !services.has(keys::HTTP_METHOD_LISTENER) {
            services.set_listener_aggregate(
                keys::HTTP_METHOD_LISTENER,
                HttpMethodListener::new(
                    config.http_method_listener,
                    config.allowed_methods.iter().cloned(),
                ),
            );
        }
        if !services.has(keys::VIEW_MANAGER) {
            services.set_aggregate_factory(keys::VIEW_MANAGER, ViewManager::from_services);
        }
        if !services.has(keys::SEND_RESPONSE_LISTENER) {
            services.set_aggregate_factory(
                keys::SEND_RESPONSE_LISTENER,
                SendResponseListener::from_services,
            );
        }

        tracing::info!("Application built with {} services", services.len());

        Ok(Application {
            services: Arc::new(services),
            events: EventManager::new(),
            config,
            router: self.router,
            bootstrappers: self.bootstrappers,
            bootstrapped: false,
        })
    }

    /// Build and bootstrap the application
    pub fn init(self) -> Result<Application> {
        let listeners = self.listeners.clone();
        let mut app = self.build()?;
        let extra: Vec<&str> = listeners.iter().map(String::as_str).collect();
        app.bootstrap(&extra)?;
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ActionController;
    use crate::router::HttpRouter;
    use axum::body::Bytes;
    use crate::error::MvcError;
    use axum::http::{Request, StatusCode};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn builder() -> ApplicationBuilder {
        let mut router = HttpRouter::new();
        router
            .add_route("home", "/", &[("controller", "index")])
            .unwrap();

        Application::builder()
            .router(router)
            .controller("index", |_| {
                Ok(ActionController::new().action("index", |_| {
                    Ok(ViewModel::new()
                        .with_template("layout/layout")
                        .with_variable("content", "home")
                        .into())
                }))
            })
    }

    fn app() -> Application {
        builder().init().unwrap()
    }

    fn get(uri: &str) -> HttpRequest {
        Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_build_registers_defaults() {
        let app = Application::builder().build().unwrap();
        for key in super::super::DEFAULT_LISTENERS {
            assert!(app.services().has(key), "missing {}", key);
        }
        assert!(app.services().has(keys::CONFIG));
        assert!(!app.is_bootstrapped());
    }

    #[test]
    fn test_run_renders_page() {
        let response = app().run(get("/")).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), &Bytes::from_static(b"home"));
    }

    #[test]
    fn test_unmatched_route_is_404_page() {
        let response = app().run(get("/nowhere")).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = String::from_utf8(response.body().to_vec()).unwrap();
        assert!(body.contains("Page not found."));
    }

    #[test]
    fn test_bootstrap_twice_is_noop() {
        let mut app = app();
        let count = app.events().listener_count(MvcStage::Route);
        app.bootstrap(&[]).unwrap();
        assert_eq!(app.events().listener_count(MvcStage::Route), count);
    }

    #[test]
    fn test_failed_bootstrap_can_be_retried() {
        let failed = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&failed);
        let mut app = builder()
            .bootstrapper(move |_: &mut Application| -> Result<()> {
                if seen.swap(true, Ordering::SeqCst) {
                    Ok(())
                } else {
                    Err(MvcError::config("cache not ready"))
                }
            })
            .build()
            .unwrap();

        assert!(app.bootstrap(&[]).is_err());
        assert!(!app.is_bootstrapped());
        assert_eq!(app.events().listener_count(MvcStage::Route), 0);

        app.bootstrap(&[]).unwrap();
        let fresh = app_priorities(&self::app());
        assert_eq!(app_priorities(&app), fresh);
        assert_eq!(app.run(get("/")).unwrap().status(), StatusCode::OK);
    }

    fn app_priorities(app: &Application) -> Vec<Vec<i32>> {
        [MvcStage::Route, MvcStage::Dispatch, MvcStage::Render, MvcStage::Finish]
            .into_iter()
            .map(|stage| app.events().priorities(stage))
            .collect()
    }
}
