use super::{RouteMatch, Router};
use crate::error::{MvcError, Result};
use crate::http::{HttpRequest, encode_path, encode_path_segment, percent_decode_path};
use matchit::{Match, Router as InnerRouter};
use std::collections::HashMap;

struct RouteDefinition {
    name: String,
    path: String,
    defaults: HashMap<String, String>,
}

/// Path router backed by `matchit`.
///
/// Paths use matchit syntax (`/album/{id}`, `/files/{*path}`); defaults
/// usually carry the `controller` and `action` parameters.
///
/// # Example
/// ```rust,ignore
/// let mut router = HttpRouter::new();
/// router.add_route("album", "/album/{id}", &[("controller", "album"), ("action", "view")])?;
/// ```
pub struct HttpRouter {
    matcher: InnerRouter<usize>,
    routes: Vec<RouteDefinition>,
    by_name: HashMap<String, usize>,
}

impl Default for HttpRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRouter {
    pub fn new() -> Self {
        Self {
            matcher: InnerRouter::new(),
            routes: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn add_route(
        &mut self,
        name: impl Into<String>,
        path: impl Into<String>,
        defaults: &[(&str, &str)],
    ) -> Result<&mut Self> {
        let name = name.into();
        let path = path.into();

        if self.by_name.contains_key(&name) {
            return Err(MvcError::route(format!("route '{}' is already defined", name)));
        }

        let index = self.routes.len();
        self.matcher
            .insert(path.clone(), index)
            .map_err(|e| MvcError::route(format!("{}: {}", path, e)))?;

        self.by_name.insert(name.clone(), index);
        self.routes.push(RouteDefinition {
            name,
            path,
            defaults: defaults
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        Ok(self)
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}

impl Router for HttpRouter {
    fn route(&self, request: &HttpRequest) -> Option<RouteMatch> {
        let Match { value, params } = self.matcher.at(request.uri().path()).ok()?;
        let route = &self.routes[*value];

        let mut matched = route.defaults.clone();
        for (key, value) in params.iter() {
            matched.insert(key.to_string(), percent_decode_path(value).into_owned());
        }

        Some(RouteMatch::new(route.name.clone(), matched))
    }

    fn assemble(&self, name: &str, params: &HashMap<String, String>) -> Result<String> {
        let index = self
            .by_name
            .get(name)
            .ok_or_else(|| MvcError::route(format!("route '{}' not found", name)))?;
        let route = &self.routes[*index];

        let mut url = String::with_capacity(route.path.len());
        let mut rest = route.path.as_str();

        while let Some(start) = rest.find('{') {
            url.push_str(&rest[..start]);
            let end = rest[start..]
                .find('}')
                .map(|offset| start + offset)
                .ok_or_else(|| MvcError::route(format!("malformed route path '{}'", route.path)))?;

            let placeholder = &rest[start + 1..end];
            let catch_all = placeholder.starts_with('*');
            let key = placeholder.trim_start_matches('*');
            let value = params
                .get(key)
                .or_else(|| route.defaults.get(key))
                .ok_or_else(|| {
                    MvcError::route(format!("missing parameter '{}' for route '{}'", key, name))
                })?;
            if catch_all {
                url.push_str(&encode_path(value));
            } else {
                url.push_str(&encode_path_segment(value));
            }
            rest = &rest[end + 1..];
        }
        url.push_str(rest);

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::Request;

    fn request(uri: &str) -> HttpRequest {
        Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    fn router() -> HttpRouter {
        let mut router = HttpRouter::new();
        router
            .add_route("home", "/", &[("controller", "index"), ("action", "index")])
            .unwrap()
            .add_route(
                "album",
                "/album/{id}",
                &[("controller", "album"), ("action", "view")],
            )
            .unwrap();
        router
    }

    #[test]
    fn test_route_merges_defaults_and_captures() {
        let matched = router().route(&request("/album/a%20b")).unwrap();
        assert_eq!(matched.route_name(), "album");
        assert_eq!(matched.param("controller"), Some("album"));
        assert_eq!(matched.param("id"), Some("a b"));
    }

    #[test]
    fn test_no_match() {
        assert!(router().route(&request("/missing/path")).is_none());
    }

    #[test]
    fn test_assemble() {
        let router = router();
        let params = HashMap::from([("id".to_string(), "42".to_string())]);
        assert_eq!(router.assemble("album", &params).unwrap(), "/album/42");
        assert_eq!(router.assemble("home", &HashMap::new()).unwrap(), "/");
        assert!(router.assemble("album", &HashMap::new()).is_err());
        assert!(router.assemble("nope", &HashMap::new()).is_err());
    }

    #[test]
    fn test_assembled_url_routes_back_to_same_match() {
        let router = router();
        let matched = router.route(&request("/album/a%2Fb%20c")).unwrap();
        assert_eq!(matched.param("id"), Some("a/b c"));

        let url = router.assemble("album", matched.params()).unwrap();
        assert_eq!(url, "/album/a%2Fb%20c");
        assert_eq!(router.route(&request(&url)), Some(matched));

        let params = HashMap::from([("id".to_string(), "caf\u{e9}+1".to_string())]);
        let url = router.assemble("album", &params).unwrap();
        assert_eq!(url, "/album/caf%C3%A9+1");
        assert_eq!(
            router.route(&request(&url)).unwrap().param("id"),
            Some("caf\u{e9}+1")
        );
    }

    #[test]
    fn test_catch_all_keeps_separators() {
        let mut router = HttpRouter::new();
        router.add_route("files", "/files/{*path}", &[]).unwrap();
        let params = HashMap::from([("path".to_string(), "docs/read me.txt".to_string())]);

        let url = router.assemble("files", &params).unwrap();
        assert_eq!(url, "/files/docs/read%20me.txt");
        assert_eq!(
            router.route(&request(&url)).unwrap().param("path"),
            Some("docs/read me.txt")
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut router = router();
        assert!(router.add_route("home", "/other", &[]).is_err());
    }
}
