//! reqwest-backed [`Connection`] implementation

use {
    super::{ApiResponse, ApiRouter},
    crate::{ClientError, Connection, ConnectionConfig, Method, Params},
    async_trait::async_trait,
    reqwest::{
        header::{HeaderMap, HeaderName, HeaderValue},
        Client,
    },
    serde_json::Value,
    std::collections::HashMap,
    tap::TapFallible,
    tracing::{debug, error, instrument},
};

#[derive(Clone, Debug)]
pub struct HttpConnection {
    pub(crate) http: Client,
    router: ApiRouter,
    config: ConnectionConfig,
}

impl HttpConnection {
    /// Create a connection for `config`. Route names are resolved through
    /// `router`, whose base URL is replaced by `config.base_url`.
    pub fn new(config: ConnectionConfig, router: ApiRouter) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::Config(format!("invalid header name `{name}`: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::Config(format!("invalid header value: {e}")))?;
            headers.insert(name, value);
        }

        let mut builder = Client::builder()
            .timeout(config.timeout_duration())
            .default_headers(headers);
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        let router = rebase(router, &config);
        Ok(Self {
            http: builder.build()?,
            router,
            config,
        })
    }

    /// Connection configured from `RESTMAP_*` environment variables.
    pub fn from_env(router: ApiRouter) -> Result<Self, ClientError> {
        Self::new(ConnectionConfig::from_env()?, router)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

fn rebase(router: ApiRouter, config: &ConnectionConfig) -> ApiRouter {
    if router.base() == &config.base_url {
        return router;
    }
    let mut rebased = ApiRouter::new(config.base_url.clone());
    rebased.extend_from(&router);
    rebased
}

#[async_trait]
impl Connection for HttpConnection {
    fn router(&self) -> &ApiRouter {
        &self.router
    }

    #[instrument(
        name = "restmap.http.send",
        skip(self, params, body),
        fields(method = %method, route = route),
        err
    )]
    async fn send(
        &self,
        method: Method,
        route: &str,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        let url = self.route(route, params)?;
        debug!("{} {}", method, url);

        let mut request = self.http.request(method.into(), &url);
        if let (Some(user), Some(pass)) = (&self.config.user, &self.config.pass) {
            request = request.basic_auth(user, Some(pass));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let res = request
            .send()
            .await
            .tap_err(|e| error!("request to {} failed: {}", url, e))?;

        let status = res.status().as_u16();
        let headers: HashMap<String, String> = res
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = res.text().await?;
        debug!("{} {} -> {} ({} bytes)", method, url, status, text.len());

        let mut response = ApiResponse::new(status, text);
        for (name, value) in headers {
            response = response.with_header(name, value);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn routes_resolve_against_configured_base() {
        let config = ConnectionConfig::parse("https://prod.example.com/api").unwrap();
        let router = ApiRouter::parse("http://placeholder")
            .unwrap()
            .route("users.view", "/users/{id}");
        let connection = HttpConnection::new(config, router).unwrap();

        let mut params = Params::new();
        params.insert("id".into(), json!("42"));
        params.insert("include".into(), json!("account"));
        assert_eq!(
            connection.route("users.view", &params).unwrap(),
            "https://prod.example.com/api/users/42?include=account"
        );
    }

    #[test]
    fn rejects_invalid_default_header() {
        let config = ConnectionConfig::parse("https://api.test")
            .unwrap()
            .header("bad header", "x");
        let err = HttpConnection::new(config, ApiRouter::parse("https://api.test").unwrap())
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
