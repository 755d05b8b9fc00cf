//! Translation of a [`QueryState`] into the parameter map of one REST dialect.
//!
//! Three dialects are built in and selected through [`Dialect`]; anything
//! else implements [`QueryEncoder`] and is wrapped in [`Encoder::Custom`].
//!
//! | dialect | filters | pagination | sort key |
//! |---|---|---|---|
//! | `JsonApi` | `filter[field]`, EQ and IN only | `page[number]`, `page[size]` | `sort` |
//! | `Simple` | `field=op:value` | `page`, `per_page` | `order` |
//! | `OpenStack` | `field=op:value` | `limit`, `offset` | `sort` |

mod common;
mod json_api;
mod open_stack;
mod simple;

pub use {json_api::JsonApiEncoder, open_stack::OpenStackEncoder, simple::SimpleEncoder};

use {
    crate::{error::EncodingError, query::QueryState},
    serde::{Deserialize, Serialize},
    std::{fmt, sync::Arc},
};

/// Encoded request parameters, in insertion order.
pub type EncodedQuery = restmap_client::Params;

pub trait QueryEncoder: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Fails with [`EncodingError`] when the state uses an operator or
    /// composite the dialect cannot express. Never partially encodes.
    fn encode(&self, state: &QueryState) -> Result<EncodedQuery, EncodingError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderOptions {
    /// Snake-case every segment of every include path.
    #[serde(default)]
    pub snake_case_includes: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    #[default]
    JsonApi,
    Simple,
    OpenStack,
}

#[derive(Debug, Clone)]
pub enum Encoder {
    JsonApi(JsonApiEncoder),
    Simple(SimpleEncoder),
    OpenStack(OpenStackEncoder),
    Custom(Arc<dyn QueryEncoder>),
}

impl Encoder {
    pub fn for_dialect(dialect: Dialect, options: EncoderOptions) -> Self {
        match dialect {
            Dialect::JsonApi => Encoder::JsonApi(JsonApiEncoder::new(options)),
            Dialect::Simple => Encoder::Simple(SimpleEncoder::new(options)),
            Dialect::OpenStack => Encoder::OpenStack(OpenStackEncoder::new(options)),
        }
    }

    pub fn custom(encoder: impl QueryEncoder + 'static) -> Self {
        Encoder::Custom(Arc::new(encoder))
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::for_dialect(Dialect::default(), EncoderOptions::default())
    }
}

impl From<Dialect> for Encoder {
    fn from(dialect: Dialect) -> Self {
        Self::for_dialect(dialect, EncoderOptions::default())
    }
}

impl QueryEncoder for Encoder {
    fn name(&self) -> &'static str {
        match self {
            Encoder::JsonApi(e) => e.name(),
            Encoder::Simple(e) => e.name(),
            Encoder::OpenStack(e) => e.name(),
            Encoder::Custom(e) => e.name(),
        }
    }

    fn encode(&self, state: &QueryState) -> Result<EncodedQuery, EncodingError> {
        match self {
            Encoder::JsonApi(e) => e.encode(state),
            Encoder::Simple(e) => e.encode(state),
            Encoder::OpenStack(e) => e.encode(state),
            Encoder::Custom(e) => e.encode(state),
        }
    }
}
