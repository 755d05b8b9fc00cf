//! Request logging decorator for any [`Connection`]

use {
    crate::{http::ApiRouter, ApiResponse, ClientError, Connection, Method, Params},
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::{collections::VecDeque, sync::Arc, time::Instant},
    tokio::sync::Mutex,
    tracing::{error, info},
};

/// One exchange as seen by [`LoggingConnection`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub timestamp: DateTime<Utc>,
    pub method: Method,
    pub route: String,
    /// Resolved URL, absent when routing itself failed
    pub url: Option<String>,
    pub status: Option<u16>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl RequestLogEntry {
    fn new(method: Method, route: &str, url: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            method,
            route: route.to_string(),
            url,
            status: None,
            duration_ms: 0,
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn to_log_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json + "\n",
            Err(e) => {
                error!("Failed to serialize request log entry: {}", e);
                format!("{{\"error\": \"serialization failed: {}\"}}\n", e)
            }
        }
    }
}

/// Entries kept by [`LoggingConnection::new`].
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Wraps a connection and records every request it sends, emitting one
/// `info!` line per exchange. Only the most recent `capacity` entries are
/// kept for inspection; older ones are dropped.
#[derive(Clone)]
pub struct LoggingConnection<C> {
    inner: C,
    capacity: usize,
    entries: Arc<Mutex<VecDeque<RequestLogEntry>>>,
}

impl<C: Connection> LoggingConnection<C> {
    pub fn new(inner: C) -> Self {
        Self::with_capacity(inner, DEFAULT_LOG_CAPACITY)
    }

    /// A capacity of zero logs without keeping anything.
    pub fn with_capacity(inner: C, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub async fn entries(&self) -> Vec<RequestLogEntry> {
        self.entries.lock().await.iter().cloned().collect()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    async fn record(&self, entry: RequestLogEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().await;
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}

#[async_trait]
impl<C: Connection> Connection for LoggingConnection<C> {
    fn router(&self) -> &ApiRouter {
        self.inner.router()
    }

    fn route(&self, name: &str, params: &Params) -> Result<String, ClientError> {
        self.inner.route(name, params)
    }

    async fn send(
        &self,
        method: Method,
        route: &str,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        let mut entry = RequestLogEntry::new(method, route, self.inner.route(route, params).ok());
        let started = Instant::now();
        let result = self.inner.send(method, route, params, body).await;
        entry.duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => {
                entry.status = Some(response.status());
                info!(
                    "{} {} -> {} in {}ms",
                    method,
                    entry.url.as_deref().unwrap_or(route),
                    response.status(),
                    entry.duration_ms
                );
            }
            Err(e) => {
                entry.error = Some(e.to_string());
                error!(
                    "{} {} failed after {}ms: {}",
                    method,
                    entry.url.as_deref().unwrap_or(route),
                    entry.duration_ms,
                    e
                );
            }
        }

        self.record(entry).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConnection;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn records_status_and_errors() {
        let mock = MockConnection::new()
            .with_route("users.search", "/users")
            .respond("users.search", 200, json!([]))
            .fail("users.view", "connection reset");
        let logged = LoggingConnection::new(mock);

        logged.get("users.search", &Params::new()).await.unwrap();
        assert!(logged.get("users.view", &Params::new()).await.is_err());

        let entries = logged.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status, Some(200));
        assert_eq!(entries[0].url.as_deref(), Some("http://mock.test/users"));
        assert!(entries[0].succeeded());
        assert!(!entries[1].succeeded());
        assert!(entries[1].to_log_line().contains("connection reset"));
    }

    #[tokio::test]
    async fn keeps_only_the_most_recent_entries() {
        let mock = MockConnection::new()
            .respond("users.view", 200, json!({}))
            .respond("users.search", 200, json!([]));
        let logged = LoggingConnection::with_capacity(mock, 2);

        logged.get("users.view", &Params::new()).await.unwrap();
        logged.get("users.search", &Params::new()).await.unwrap();
        logged.get("users.search", &Params::new()).await.unwrap();

        let routes: Vec<_> = logged.entries().await.into_iter().map(|e| e.route).collect();
        assert_eq!(routes, vec!["users.search", "users.search"]);
        assert_eq!(logged.inner().request_count(), 3);

        let silent = LoggingConnection::with_capacity(MockConnection::new(), 0);
        silent.get("users.view", &Params::new()).await.unwrap();
        assert!(silent.entries().await.is_empty());
    }
}
