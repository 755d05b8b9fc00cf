//! ActiveRecord-style mapping of REST resources onto entity graphs.
//!
//! Models are described once with a [`ModelSchema`] and registered on a
//! [`Manager`]. Queries are built with [`ModelQuery`] or [`EntityLocator`],
//! encoded into the dialect the remote API speaks, sent through a
//! [`restmap_client::Connection`] and hydrated into [`Entity`] values.
//! Relationships named in include paths are resolved in batches: embedded
//! data costs no request, everything else at most one request per
//! relationship and batch.
//!
//! # Example
//!
//! ```ignore
//! use restmap_orm::prelude::*;
//!
//! let manager = Manager::builder()
//!     .connection(Arc::new(HttpConnection::from_env(router)?))
//!     .model(
//!         ModelSchema::model("User")
//!             .route("search", "users.search")
//!             .route("view", "users.view")
//!             .belongs_to("account", BelongsTo::new("Account")),
//!     )
//!     .model(ModelSchema::model("Account").route("view", "accounts.view"))
//!     .build()?;
//!
//! let users = manager
//!     .locator("User")?
//!     .with(["account"])
//!     .find_by([("email", "a@example.com")], &[], None, None)
//!     .await?;
//! let account = users[0].one("account");
//! ```

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod locator;
pub mod manager;
pub mod mapper;
pub mod model;
pub mod persistence;
pub mod prelude;
pub mod query;
pub mod relations;

pub use {
    decoder::{flatten_records, JsonDecoder, Record, ResponseDecoder},
    encoder::{Dialect, Encoder, EncoderOptions, QueryEncoder},
    error::{EncodingError, OrmError, OrmResult},
    locator::{Criteria, EntityLocator},
    manager::{Manager, ManagerBuilder, DEFAULT_CONNECTION},
    mapper::ObjectMapper,
    model::{AttributeValue, Cast, Collection, Entity, ModelKind, ModelSchema, Relation},
    persistence::{ActionPersister, ApiAction, CreateAction, DestroyAction, UpdateAction},
    query::{ModelQuery, QueryState},
    relations::{BelongsTo, HasMany, RelationResolver, Relationship},
};

#[cfg(feature = "testing")]
pub use restmap_client::testing;
