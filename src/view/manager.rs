use super::listeners::{create_view_model, inject_template, inject_view_model};
use super::{
    DefaultRenderingStrategy, ExceptionStrategy, Renderer, RouteNotFoundStrategy,
    TemplateMapRenderer,
};
use crate::config::ApplicationConfig;
use crate::di::{ServiceLocator, keys};
use crate::error::Result;
use crate::event::{EventManager, ListenerAggregate, ListenerHandle, MvcEvent, MvcStage};
use std::sync::Arc;

/// Wires the view listeners and rendering strategies into the lifecycle.
///
/// | stage          | priority | listener                          |
/// |----------------|----------|-----------------------------------|
/// | dispatch       | -80      | create view model                 |
/// | dispatch       | -90      | prepare not-found model           |
/// | dispatch       | -90      | inject template                   |
/// | dispatch       | -100     | inject view model                 |
/// | dispatch.error | 1        | detect not-found, exception model |
/// | dispatch.error | -90      | prepare not-found model           |
/// | dispatch.error | -100     | inject view model                 |
/// | render         | -10000   | default rendering strategy        |
/// | render.error   | 1        | exception strategy                |
pub struct ViewManager {
    rendering: DefaultRenderingStrategy,
    not_found: RouteNotFoundStrategy,
    exception: ExceptionStrategy,
}

impl ViewManager {
    pub fn new(config: &ApplicationConfig, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            rendering: DefaultRenderingStrategy::new(Arc::clone(&renderer)),
            not_found: RouteNotFoundStrategy::new(
                config.not_found_template.as_str(),
                config.display_not_found_reason,
            ),
            exception: ExceptionStrategy::new(
                config.exception_template.as_str(),
                config.display_exceptions,
                renderer,
            ),
        }
    }

    /// Build from the `config` service and the optional `ViewRenderer`
    /// service; without one, the built-in template map is used.
    pub fn from_services(services: &ServiceLocator) -> Result<Self> {
        let config = services.get::<ApplicationConfig>(keys::CONFIG)?;
        let renderer: Arc<dyn Renderer> = if services.has(keys::VIEW_RENDERER) {
            services
                .get::<Arc<dyn Renderer>>(keys::VIEW_RENDERER)?
                .as_ref()
                .clone()
        } else {
            Arc::new(TemplateMapRenderer::with_defaults(
                &config.layout_template,
                &config.not_found_template,
                &config.exception_template,
            ))
        };
        Ok(Self::new(&config, renderer))
    }
}

impl ListenerAggregate for ViewManager {
    fn attach(
        self: Arc<Self>,
        events: &mut EventManager<MvcEvent>,
        _priority: i32,
    ) -> Vec<ListenerHandle> {
        let mut handles = Vec::with_capacity(10);

        handles.push(events.attach(MvcStage::Dispatch, create_view_model, -80));

        let this = Arc::clone(&self);
        handles.push(events.attach(
            MvcStage::Dispatch,
            move |event| this.not_found.prepare_not_found_model(event),
            -90,
        ));
        handles.push(events.attach(MvcStage::Dispatch, inject_template, -90));
        handles.push(events.attach(MvcStage::Dispatch, inject_view_model, -100));

        let this = Arc::clone(&self);
        handles.push(events.attach(
            MvcStage::DispatchError,
            move |event| this.not_found.detect_not_found(event),
            1,
        ));
        let this = Arc::clone(&self);
        handles.push(events.attach(
            MvcStage::DispatchError,
            move |event| this.exception.prepare_exception_model(event),
            1,
        ));
        let this = Arc::clone(&self);
        handles.push(events.attach(
            MvcStage::DispatchError,
            move |event| this.not_found.prepare_not_found_model(event),
            -90,
        ));
        handles.push(events.attach(MvcStage::DispatchError, inject_view_model, -100));

        let this = Arc::clone(&self);
        handles.push(events.attach(
            MvcStage::Render,
            move |event| this.rendering.render(event),
            -10000,
        ));

        let this = self;
        handles.push(events.attach(
            MvcStage::RenderError,
            move |event| this.exception.render_error(event),
            1,
        ));

        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ActionResult, ErrorKind, MvcFailure};
    use axum::body::Bytes;
    use axum::http::{Request, StatusCode};

    fn event() -> MvcEvent {
        let request = Request::builder().uri("/").body(Bytes::new()).unwrap();
        MvcEvent::new(request, Arc::new(ServiceLocator::new()))
            .with_view_model(super::super::ViewModel::new().with_template("layout/layout"))
    }

    fn manager(config: ApplicationConfig) -> (EventManager<MvcEvent>, usize) {
        let renderer = Arc::new(TemplateMapRenderer::with_defaults(
            &config.layout_template,
            &config.not_found_template,
            &config.exception_template,
        ));
        let mut events = EventManager::<MvcEvent>::new();
        let handles = events.attach_aggregate(Arc::new(ViewManager::new(&config, renderer)), 1);
        (events, handles.len())
    }

    #[test]
    fn test_attaches_all_listeners() {
        let (events, count) = manager(ApplicationConfig::default());
        assert_eq!(count, 10);
        assert_eq!(events.priorities(MvcStage::Dispatch), vec![-80, -90, -90, -100]);
        assert_eq!(events.priorities(MvcStage::DispatchError), vec![1, 1, -90, -100]);
    }

    #[test]
    fn test_not_found_page_with_reason() {
        let config = ApplicationConfig {
            display_not_found_reason: true,
            ..ApplicationConfig::default()
        };
        let (events, _) = manager(config);
        let mut event = event();
        event.set_error(MvcFailure::new(ErrorKind::RouterNoMatch, "no route"));

        events.trigger(MvcStage::DispatchError, &mut event).unwrap();
        events.trigger(MvcStage::Render, &mut event).unwrap();

        assert_eq!(event.response().status(), StatusCode::NOT_FOUND);
        let body = String::from_utf8(event.response().body().to_vec()).unwrap();
        assert!(body.contains("Page not found."));
        assert!(body.contains("error-router-no-match"));
    }

    #[test]
    fn test_exception_page_hides_details_by_default() {
        let (events, _) = manager(ApplicationConfig::default());
        let mut event = event();
        event.set_error(
            MvcFailure::new(ErrorKind::Exception, "database is down").with_controller("album"),
        );

        events.trigger(MvcStage::DispatchError, &mut event).unwrap();
        assert!(event.result().and_then(ActionResult::as_model).is_some());
        events.trigger(MvcStage::Render, &mut event).unwrap();

        assert_eq!(event.response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = String::from_utf8(event.response().body().to_vec()).unwrap();
        assert!(body.contains("An error occurred"));
        assert!(!body.contains("database is down"));
    }

    #[test]
    fn test_render_error_writes_error_page() {
        let config = ApplicationConfig {
            display_exceptions: true,
            ..ApplicationConfig::default()
        };
        let (events, _) = manager(config);
        let mut event = event();
        event.set_error(MvcFailure::new(ErrorKind::Exception, "template missing"));

        let results = events.trigger(MvcStage::RenderError, &mut event).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(event.response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = String::from_utf8(event.response().body().to_vec()).unwrap();
        assert!(body.contains("template missing"));
    }
}
