use thiserror::Error;

pub type Result<T> = std::result::Result<T, MvcError>;

#[derive(Debug, Error)]
pub enum MvcError {
    #[error("Service not found: {name}")]
    ServiceNotFound { name: String },

    #[error("Failed to downcast service: {name}")]
    DowncastFailed { name: String },

    #[error("Service '{name}' is not a listener aggregate")]
    InvalidListener { name: String },

    #[error("Controller not found: {name}")]
    ControllerNotFound { name: String },

    #[error("Controller '{name}' is not dispatchable")]
    ControllerInvalid { name: String },

    #[error("Routing error: {message}")]
    Route { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MvcError {
    pub fn route(message: impl Into<String>) -> Self {
        Self::Route {
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for MvcError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            MvcError::ControllerNotFound { .. } => axum::http::StatusCode::NOT_FOUND,
            MvcError::Route { .. } => axum::http::StatusCode::NOT_FOUND,
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
