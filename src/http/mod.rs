//! HTTP message types used by the lifecycle.
//!
//! Requests and responses are the `http` crate types re-exported by axum with
//! fully buffered bodies, so listeners can inspect and rewrite them
//! synchronously.

mod parser;

pub use parser::{
    MediaRange, encode_path, encode_path_segment, parse_accept, parse_query_string,
    percent_decode, percent_decode_path,
};

use axum::body::Bytes;
use axum::http::{HeaderValue, Request, Response, StatusCode, header};

/// Incoming request with a buffered body.
pub type HttpRequest = Request<Bytes>;

/// Outgoing response with a buffered body.
pub type HttpResponse = Response<Bytes>;

/// Build a response with the given status and plain text body.
pub fn text_response(status: StatusCode, body: impl Into<String>) -> HttpResponse {
    let mut response = Response::new(Bytes::from(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Build an empty response carrying only a status code.
pub fn empty_response(status: StatusCode) -> HttpResponse {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

/// Return the value of a header as a string slice, if present and valid.
pub fn header_str<'a, B>(request: &'a Request<B>, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}
