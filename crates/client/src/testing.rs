//! In-memory connection for tests.
//!
//! # Example
//!
//! ```ignore
//! use restmap_client::testing::MockConnection;
//! use serde_json::json;
//!
//! let mock = MockConnection::new()
//!     .respond("users.search", 200, json!({"data": [{"id": "1"}]}))
//!     .respond_when("users.view", json!({"id": "1"}), 200, json!({"id": "1"}));
//! ```

use {
    crate::{http::ApiRouter, ApiResponse, ClientError, Connection, Method, Params},
    async_trait::async_trait,
    serde_json::Value,
    std::sync::{Mutex, MutexGuard},
    url::Url,
};

pub const MOCK_BASE_URL: &str = "http://mock.test";

#[derive(Debug, Clone)]
enum Reply {
    Respond(ApiResponse),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Stub {
    route: String,
    when: Option<Params>,
    reply: Reply,
}

impl Stub {
    fn matches(&self, route: &str, params: &Params) -> bool {
        self.route == route
            && self.when.as_ref().map_or(true, |expected| {
                expected.iter().all(|(k, v)| params.get(k) == Some(v))
            })
    }
}

/// A request captured by [`MockConnection`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub route: String,
    pub params: Params,
    pub body: Option<Value>,
}

/// Canned responses keyed by route name. Conditional stubs (`respond_when`)
/// win over plain ones; a route with no matching stub answers 404 with an
/// empty body.
#[derive(Debug)]
pub struct MockConnection {
    router: ApiRouter,
    stubs: Mutex<Vec<Stub>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn as_params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        Value::Null => Params::new(),
        other => panic!("expected a JSON object of parameters, got {other}"),
    }
}

impl MockConnection {
    pub fn new() -> Self {
        let base = Url::parse(MOCK_BASE_URL).unwrap_or_else(|e| panic!("bad mock base: {e}"));
        Self::with_router(ApiRouter::new(base))
    }

    pub fn with_router(router: ApiRouter) -> Self {
        Self {
            router,
            stubs: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Register a path template so `route()` can build URLs for log output.
    pub fn with_route(mut self, name: impl Into<String>, template: &str) -> Self {
        self.router.add(name, template);
        self
    }

    pub fn respond(self, route: impl Into<String>, status: u16, body: Value) -> Self {
        self.stub(route.into(), None, Reply::Respond(ApiResponse::json_body(status, &body)))
    }

    /// Respond only when every key of `when` equals the request parameter.
    pub fn respond_when(
        self,
        route: impl Into<String>,
        when: Value,
        status: u16,
        body: Value,
    ) -> Self {
        self.stub(
            route.into(),
            Some(as_params(when)),
            Reply::Respond(ApiResponse::json_body(status, &body)),
        )
    }

    pub fn respond_raw(self, route: impl Into<String>, response: ApiResponse) -> Self {
        self.stub(route.into(), None, Reply::Respond(response))
    }

    /// Make every request to `route` fail at the transport level.
    pub fn fail(self, route: impl Into<String>, message: impl Into<String>) -> Self {
        self.stub(route.into(), None, Reply::Fail(message.into()))
    }

    fn stub(self, route: String, when: Option<Params>, reply: Reply) -> Self {
        lock(&self.stubs).push(Stub { route, when, reply });
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    pub fn requests_for(&self, route: &str) -> Vec<RecordedRequest> {
        lock(&self.requests)
            .iter()
            .filter(|r| r.route == route)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Panics unless some request hit `route` with parameters equal to `params`.
    pub fn assert_route_called(&self, route: &str, params: Value) {
        let expected = as_params(params);
        let requests = self.requests();
        assert!(
            requests
                .iter()
                .any(|r| r.route == route && r.params == expected),
            "expected a request to `{route}` with {expected:?}, got {requests:#?}"
        );
    }

    fn reply_for(&self, route: &str, params: &Params) -> Reply {
        let stubs = lock(&self.stubs);
        stubs
            .iter()
            .filter(|s| s.when.is_some())
            .chain(stubs.iter().filter(|s| s.when.is_none()))
            .find(|s| s.matches(route, params))
            .map(|s| s.reply.clone())
            .unwrap_or_else(|| Reply::Respond(ApiResponse::new(404, "")))
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn router(&self) -> &ApiRouter {
        &self.router
    }

    async fn send(
        &self,
        method: Method,
        route: &str,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        lock(&self.requests).push(RecordedRequest {
            method,
            route: route.to_string(),
            params: params.clone(),
            body: body.cloned(),
        });
        match self.reply_for(route, params) {
            Reply::Respond(response) => Ok(response),
            Reply::Fail(message) => Err(ClientError::Other(message)),
        }
    }
}
