/// Errors raised by the transport layer: routing, URL construction,
/// HTTP exchange and body decoding.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no route named `{0}` has been registered")]
    UnknownRoute(String),

    #[error("route `{route}` requires a value for `{param}`")]
    MissingRouteParameter { route: String, param: String },

    #[error("invalid url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("failed to decode response body: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid connection configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// True for failures that happened before or while talking to the server,
    /// as opposed to configuration or routing mistakes on our side.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Http(_) | ClientError::Other(_))
    }
}
