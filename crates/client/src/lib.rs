//! HTTP transport for restmap.
//!
//! A [`Connection`] sends requests addressed by *route name*; an
//! [`ApiRouter`] turns names like `users.view` into URLs from path
//! templates, placing unused parameters in a bracket-notation query string.
//!
//! # Example
//!
//! ```ignore
//! use restmap_client::*;
//!
//! let router = ApiRouter::parse("https://api.example.com")?
//!     .route("users.search", "/users")
//!     .route("users.view", "/users/{id}");
//! let connection = LoggingConnection::new(HttpConnection::from_env(router)?);
//!
//! let mut params = Params::new();
//! params.insert("id".into(), "42".into());
//! let response = connection.get("users.view", &params).await?;
//! ```

mod config;
mod connection;
mod err;
pub mod http;
mod log;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use {
    config::*,
    connection::*,
    err::*,
    http::{encode_query, value_to_param, ApiResponse, ApiRouter, HttpConnection, RouteTemplate},
    log::*,
};
