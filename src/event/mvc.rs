use super::Event;
use crate::di::ServiceLocator;
use crate::http::{HttpRequest, HttpResponse};
use crate::router::{RouteMatch, Router};
use crate::view::ViewModel;
use axum::http::StatusCode;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Named points of the request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
pub enum MvcStage {
    #[strum(serialize = "bootstrap")]
    Bootstrap,
    #[strum(serialize = "route")]
    Route,
    #[strum(serialize = "dispatch")]
    Dispatch,
    #[strum(serialize = "dispatch.error")]
    DispatchError,
    #[strum(serialize = "render")]
    Render,
    #[strum(serialize = "render.error")]
    RenderError,
    #[strum(serialize = "finish")]
    Finish,
}

/// Classification of a failure recorded on the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
pub enum ErrorKind {
    #[strum(serialize = "error-router-no-match")]
    RouterNoMatch,
    #[strum(serialize = "error-controller-not-found")]
    ControllerNotFound,
    #[strum(serialize = "error-controller-invalid")]
    ControllerInvalid,
    #[strum(serialize = "error-controller-cannot-dispatch")]
    ControllerCannotDispatch,
    #[strum(serialize = "error-exception")]
    Exception,
}

impl ErrorKind {
    /// Failures answered with a 404 rather than a 500.
    pub fn is_not_found(self) -> bool {
        !matches!(self, ErrorKind::Exception)
    }

    pub fn status(self) -> StatusCode {
        if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// A failure recorded during routing, dispatching or rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MvcFailure {
    kind: ErrorKind,
    message: String,
    controller: Option<String>,
}

impl MvcFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            controller: None,
        }
    }

    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn controller(&self) -> Option<&str> {
        self.controller.as_deref()
    }
}

impl fmt::Display for MvcFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.controller {
            Some(controller) => write!(f, "{} ({}): {}", self.kind, controller, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// What a controller or listener hands back.
#[derive(Debug)]
pub enum ActionResult {
    /// A complete response; ends routing and dispatching early.
    Response(HttpResponse),
    /// A view model for the render stage.
    Model(ViewModel),
    /// Plain variables, turned into a view model after dispatch.
    Data(Map<String, Value>),
    /// Nothing; an empty view model is created after dispatch.
    Empty,
}

impl ActionResult {
    pub fn is_response(&self) -> bool {
        matches!(self, ActionResult::Response(_))
    }

    pub fn as_model(&self) -> Option<&ViewModel> {
        match self {
            ActionResult::Model(model) => Some(model),
            _ => None,
        }
    }
}

impl From<HttpResponse> for ActionResult {
    fn from(response: HttpResponse) -> Self {
        ActionResult::Response(response)
    }
}

impl From<ViewModel> for ActionResult {
    fn from(model: ViewModel) -> Self {
        ActionResult::Model(model)
    }
}

impl From<Map<String, Value>> for ActionResult {
    fn from(data: Map<String, Value>) -> Self {
        ActionResult::Data(data)
    }
}

/// The event carried through every stage of one request.
pub struct MvcEvent {
    name: MvcStage,
    target: String,
    request: HttpRequest,
    response: HttpResponse,
    route_match: Option<RouteMatch>,
    result: Option<ActionResult>,
    view_model: ViewModel,
    error: Option<MvcFailure>,
    params: HashMap<String, Value>,
    propagation_stopped: bool,
    request_id: Uuid,
    services: Arc<ServiceLocator>,
    router: Option<Arc<dyn Router>>,
    pub(crate) forward_depth: usize,
}

impl MvcEvent {
    pub fn new(request: HttpRequest, services: Arc<ServiceLocator>) -> Self {
        Self {
            name: MvcStage::Bootstrap,
            target: "application".to_string(),
            request,
            response: HttpResponse::default(),
            route_match: None,
            result: None,
            view_model: ViewModel::new(),
            error: None,
            params: HashMap::new(),
            propagation_stopped: false,
            request_id: Uuid::new_v4(),
            services,
            router: None,
            forward_depth: 0,
        }
    }

    pub fn with_router(mut self, router: Option<Arc<dyn Router>>) -> Self {
        self.router = router;
        self
    }

    pub fn with_view_model(mut self, model: ViewModel) -> Self {
        self.view_model = model;
        self
    }

    pub fn name(&self) -> MvcStage {
        self.name
    }

    pub fn set_name(&mut self, name: MvcStage) {
        self.name = name;
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut HttpRequest {
        &mut self.request
    }

    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut HttpResponse {
        &mut self.response
    }

    pub fn set_response(&mut self, response: HttpResponse) {
        self.response = response;
    }

    pub fn into_response(self) -> HttpResponse {
        self.response
    }

    pub fn route_match(&self) -> Option<&RouteMatch> {
        self.route_match.as_ref()
    }

    pub fn route_match_mut(&mut self) -> Option<&mut RouteMatch> {
        self.route_match.as_mut()
    }

    pub fn set_route_match(&mut self, route_match: Option<RouteMatch>) {
        self.route_match = route_match;
    }

    pub fn result(&self) -> Option<&ActionResult> {
        self.result.as_ref()
    }

    pub fn result_mut(&mut self) -> Option<&mut ActionResult> {
        self.result.as_mut()
    }

    pub fn set_result(&mut self, result: ActionResult) {
        self.result = Some(result);
    }

    pub fn take_result(&mut self) -> Option<ActionResult> {
        self.result.take()
    }

    pub fn view_model(&self) -> &ViewModel {
        &self.view_model
    }

    pub fn view_model_mut(&mut self) -> &mut ViewModel {
        &mut self.view_model
    }

    pub fn set_view_model(&mut self, model: ViewModel) {
        self.view_model = model;
    }

    pub fn error(&self) -> Option<&MvcFailure> {
        self.error.as_ref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn set_error(&mut self, error: MvcFailure) {
        self.error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn params_map(&self) -> &HashMap<String, Value> {
        &self.params
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn services(&self) -> &Arc<ServiceLocator> {
        &self.services
    }

    pub fn router(&self) -> Option<&Arc<dyn Router>> {
        self.router.as_ref()
    }

    /// Name of the matched controller, if routing got that far.
    pub fn controller_name(&self) -> Option<&str> {
        self.route_match.as_ref().and_then(|m| m.param("controller"))
    }
}

impl Event for MvcEvent {
    type Outcome = ActionResult;

    fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    fn stop_propagation(&mut self, flag: bool) {
        self.propagation_stopped = flag;
    }
}

impl fmt::Debug for MvcEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MvcEvent")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("uri", self.request.uri())
            .field("status", &self.response.status())
            .field("route_match", &self.route_match)
            .field("error", &self.error)
            .field("request_id", &self.request_id)
            .finish()
    }
}
