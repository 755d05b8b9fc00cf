use {
    crate::query::{CompositeKind, Operator, QueryState},
    restmap_client::ClientError,
};

pub type OrmResult<T> = Result<T, OrmError>;

/// A query cannot be expressed in the target dialect. Raised before any
/// request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("{encoder} encoder does not support operator `{operator}` (field `{field}`)")]
    UnsupportedOperator {
        encoder: &'static str,
        field: String,
        operator: Operator,
    },

    #[error("{encoder} encoder does not support {kind} conditions")]
    UnsupportedComposite {
        encoder: &'static str,
        kind: CompositeKind,
    },

    #[error("{encoder} encoder cannot filter on `{field}`: the parameter is taken by the query itself")]
    ReservedField { encoder: &'static str, field: String },

    #[error("{encoder} encoder cannot paginate: {reason}")]
    InvalidPagination {
        encoder: &'static str,
        reason: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum OrmError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("could not find a record for {class} with {key} and {id}")]
    NotFound {
        class: String,
        key: String,
        id: String,
    },

    #[error("could not match any records for {class}")]
    NoResults {
        class: String,
        query: Box<QueryState>,
    },

    #[error("relationship `{relationship}` on {model} cannot use {related}: {reason}")]
    RelationshipConfiguration {
        model: String,
        relationship: String,
        related: String,
        reason: String,
    },

    #[error("request to `{route}` for {class} failed: {source}")]
    Transport {
        class: String,
        route: String,
        #[source]
        source: ClientError,
    },

    #[error("model `{0}` is not registered")]
    UnknownModel(String),

    #[error("{model} has no `{operation}` route")]
    UnknownRoute { model: String, operation: String },

    #[error("connection `{0}` is not registered")]
    UnknownConnection(String),

    #[error("{model} has no relationship named `{relationship}`")]
    UnknownRelationship { model: String, relationship: String },

    #[error("could not decode response for {class}: {source}")]
    Decode {
        class: String,
        #[source]
        source: ClientError,
    },

    #[error("cannot cast `{attribute}` on {model}: {reason}")]
    Cast {
        model: String,
        attribute: String,
        reason: String,
    },

    #[error("invalid {class} action: {}", .failures.join("; "))]
    InvalidAction { class: String, failures: Vec<String> },

    #[error("{action} of {class} {id} answered with status {status}")]
    ActionFailed {
        class: String,
        action: &'static str,
        id: String,
        status: u16,
    },
}

impl OrmError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, OrmError::NotFound { .. } | OrmError::NoResults { .. })
    }
}
