//! Everything needed to declare models and run queries.
//!
//! ```ignore
//! use restmap_orm::prelude::*;
//! ```

pub use crate::{
    decoder::{JsonDecoder, Record, ResponseDecoder},
    encoder::{Dialect, Encoder, EncoderOptions, QueryEncoder},
    error::{EncodingError, OrmError, OrmResult},
    locator::{Criteria, EntityLocator},
    manager::Manager,
    model::{AttributeValue, Cast, Collection, Entity, ModelSchema, Relation},
    persistence::{ActionPersister, CreateAction, DestroyAction, UpdateAction},
    query::{and, eq, gt, gte, in_, like, lt, lte, neq, not_in, or, Direction, ModelQuery, Node, Operator},
    relations::{BelongsTo, HasMany},
};

pub use restmap_client::{ApiRouter, Connection, ConnectionConfig, HttpConnection, LoggingConnection};
pub use std::sync::Arc;
