use crate::http::{HttpRequest, header_str, parse_accept};
use crate::view::{ModelKind, ViewModel};
use axum::http::header;

/// Chooses a view model kind from the request's `Accept` header.
///
/// Media ranges are tried by quality, then specificity, then header order;
/// for each range the criteria are tried in registration order.
#[derive(Debug, Clone)]
pub struct AcceptableViewModelSelector {
    criteria: Vec<(ModelKind, Vec<String>)>,
    fallback: ModelKind,
}

impl Default for AcceptableViewModelSelector {
    fn default() -> Self {
        Self::new()
            .with(ModelKind::Json, ["application/json", "application/javascript"])
            .with(ModelKind::View, ["text/html", "application/xhtml+xml"])
    }
}

impl AcceptableViewModelSelector {
    /// An empty selector falling back to [`ModelKind::View`].
    pub fn new() -> Self {
        Self {
            criteria: Vec::new(),
            fallback: ModelKind::View,
        }
    }

    pub fn with<I, S>(mut self, kind: ModelKind, mimes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.criteria
            .push((kind, mimes.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_fallback(mut self, kind: ModelKind) -> Self {
        self.fallback = kind;
        self
    }

    /// The kind and the concrete mime type that matched, if any.
    pub fn match_request(&self, request: &HttpRequest) -> Option<(ModelKind, &str)> {
        let accept = header_str(request, header::ACCEPT.as_str())?;

        for range in parse_accept(accept) {
            for (kind, mimes) in &self.criteria {
                if let Some(mime) = mimes.iter().find(|mime| range.matches(mime)) {
                    return Some((*kind, mime.as_str()));
                }
            }
        }
        None
    }

    pub fn select(&self, request: &HttpRequest) -> ModelKind {
        self.match_request(request)
            .map_or(self.fallback, |(kind, _)| kind)
    }

    pub fn view_model(&self, request: &HttpRequest) -> ViewModel {
        ViewModel::of_kind(self.select(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::Request;

    fn request(accept: Option<&str>) -> HttpRequest {
        let mut builder = Request::builder().uri("/");
        if let Some(accept) = accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        builder.body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_json_preferred_by_quality() {
        let selector = AcceptableViewModelSelector::default();
        let request = request(Some("text/html;q=0.5, application/json"));
        assert_eq!(
            selector.match_request(&request),
            Some((ModelKind::Json, "application/json"))
        );
        assert!(selector.view_model(&request).is_terminal());
    }

    #[test]
    fn test_wildcard_uses_first_criterion() {
        let selector = AcceptableViewModelSelector::new()
            .with(ModelKind::View, ["text/html"])
            .with(ModelKind::Json, ["application/json"]);
        assert_eq!(selector.select(&request(Some("*/*"))), ModelKind::View);
        assert_eq!(
            selector.select(&request(Some("application/*"))),
            ModelKind::Json
        );
    }

    #[test]
    fn test_missing_or_unmatched_header_falls_back() {
        let selector = AcceptableViewModelSelector::default().with_fallback(ModelKind::Json);
        assert_eq!(selector.select(&request(None)), ModelKind::Json);
        assert_eq!(selector.select(&request(Some("image/png"))), ModelKind::Json);
        assert_eq!(selector.select(&request(Some("text/html;q=0"))), ModelKind::Json);
    }
}
