//! The transport seam every higher layer talks through.

use {
    crate::{http::ApiRouter, ApiResponse, ClientError},
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::{fmt, sync::Arc},
};

/// Ordered request parameters. Keys matching a route placeholder fill the
/// path, everything else is sent as the query string.
pub type Params = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A configured HTTP transport addressed by route name.
///
/// Implementations never retry: a failed exchange is reported once and the
/// caller decides what to do with it.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Router used to turn route names into URLs.
    fn router(&self) -> &ApiRouter;

    /// Resolve a named route with parameters to a full URL.
    fn route(&self, name: &str, params: &Params) -> Result<String, ClientError> {
        self.router().url(name, params)
    }

    async fn send(
        &self,
        method: Method,
        route: &str,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError>;

    async fn get(&self, route: &str, params: &Params) -> Result<ApiResponse, ClientError> {
        self.send(Method::Get, route, params, None).await
    }

    async fn post(
        &self,
        route: &str,
        params: &Params,
        body: &Value,
    ) -> Result<ApiResponse, ClientError> {
        self.send(Method::Post, route, params, Some(body)).await
    }

    async fn put(
        &self,
        route: &str,
        params: &Params,
        body: &Value,
    ) -> Result<ApiResponse, ClientError> {
        self.send(Method::Put, route, params, Some(body)).await
    }

    async fn delete(&self, route: &str, params: &Params) -> Result<ApiResponse, ClientError> {
        self.send(Method::Delete, route, params, None).await
    }
}

#[async_trait]
impl<C: Connection + ?Sized> Connection for Arc<C> {
    fn router(&self) -> &ApiRouter {
        (**self).router()
    }

    fn route(&self, name: &str, params: &Params) -> Result<String, ClientError> {
        (**self).route(name, params)
    }

    async fn send(
        &self,
        method: Method,
        route: &str,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        (**self).send(method, route, params, body).await
    }
}
