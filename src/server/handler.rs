//! Mock handlers: request-matching rules with canned responses.

use axum::http::{Method, StatusCode};
use serde::Serialize;

/// Canned response returned when a handler matches.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![("content-type".into(), "text/plain".into())],
            body: body.into().into_bytes(),
        }
    }

    /// JSON body with a 200 status. Panics on unserializable fixture values,
    /// which is a test-authoring bug rather than a runtime condition.
    pub fn json<T: Serialize>(value: &T) -> Self {
        let body = serde_json::to_vec(value).expect("serialize mock response body");
        Self {
            status: StatusCode::OK,
            headers: vec![("content-type".into(), "application/json".into())],
            body,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// One request-matching rule: method + exact path.
#[derive(Debug, Clone)]
pub struct MockHandler {
    pub method: Method,
    pub path: String,
    pub response: MockResponse,
}

impl MockHandler {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            response: MockResponse::status(StatusCode::OK),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn respond(mut self, response: MockResponse) -> Self {
        self.response = response;
        self
    }

    pub(crate) fn matches(&self, method: &Method, path: &str) -> bool {
        self.method == *method && self.path == path
    }

    /// `"METHOD path"`, used by isolation assertions and log lines.
    pub fn signature(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// The mutable handler collection behind a mock server: suite-level defaults
/// plus the currently active set. Reset restores the active set to the
/// defaults, which is what guarantees cross-test isolation.
#[derive(Debug, Default)]
pub(crate) struct HandlerSet {
    defaults: Vec<MockHandler>,
    active: Vec<MockHandler>,
}

impl HandlerSet {
    pub(crate) fn new(defaults: Vec<MockHandler>) -> Self {
        let active = defaults.clone();
        Self { defaults, active }
    }

    /// Register a per-test override. Most recent registration wins, so a stub
    /// shadows a default for the same method and path.
    pub(crate) fn stub(&mut self, handler: MockHandler) {
        self.active.insert(0, handler);
    }

    pub(crate) fn reset(&mut self) {
        self.active = self.defaults.clone();
    }

    pub(crate) fn find(&self, method: &Method, path: &str) -> Option<&MockHandler> {
        self.active.iter().find(|h| h.matches(method, path))
    }

    pub(crate) fn route_signatures(&self) -> Vec<String> {
        self.active.iter().map(MockHandler::signature).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_shadows_default_until_reset() {
        let mut set = HandlerSet::new(vec![
            MockHandler::get("/todos").respond(MockResponse::text("default"))
        ]);
        set.stub(MockHandler::get("/todos").respond(MockResponse::text("override")));

        let matched = set.find(&Method::GET, "/todos").unwrap();
        assert_eq!(matched.response.body, b"override".to_vec());

        set.reset();
        let matched = set.find(&Method::GET, "/todos").unwrap();
        assert_eq!(matched.response.body, b"default".to_vec());
    }

    #[test]
    fn reset_restores_default_structure() {
        let mut set = HandlerSet::new(vec![MockHandler::get("/todos"), MockHandler::post("/todos")]);
        let pristine = set.route_signatures();

        set.stub(MockHandler::get("/extra"));
        assert_ne!(set.route_signatures(), pristine);

        set.reset();
        assert_eq!(set.route_signatures(), pristine);
        assert_eq!(pristine, vec!["GET /todos", "POST /todos"]);
    }

    #[test]
    fn matching_is_method_and_path_exact() {
        let set = HandlerSet::new(vec![MockHandler::get("/todos")]);
        assert!(set.find(&Method::GET, "/todos").is_some());
        assert!(set.find(&Method::POST, "/todos").is_none());
        assert!(set.find(&Method::GET, "/todos/1").is_none());
    }
}
