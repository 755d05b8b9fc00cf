//! Static description of a remote resource.

use {
    super::Cast,
    crate::{
        decoder::{JsonDecoder, ResponseDecoder},
        encoder::{Dialect, Encoder, EncoderOptions},
        error::{OrmError, OrmResult},
        relations::Relationship,
    },
    derive_getters::Getters,
    std::{collections::HashMap, sync::Arc},
};

pub const SEARCH_ROUTE: &str = "search";
pub const VIEW_ROUTE: &str = "view";
pub const CREATE_ROUTE: &str = "create";
pub const UPDATE_ROUTE: &str = "update";
pub const DESTROY_ROUTE: &str = "destroy";

/// Models have identity and routes; value objects are only ever embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Model,
    ValueObject,
}

/// Immutable per-model configuration, built with [`ModelSchema::model`] or
/// [`ModelSchema::value_object`].
///
/// # Example
///
/// ```ignore
/// let users = ModelSchema::model("User")
///     .route("search", "users.search")
///     .route("view", "users.view")
///     .cast("id", Cast::Uuid)
///     .belongs_to("account", BelongsTo::new("Account"))
///     .has_many("posts", HasMany::new("Post").index_by("id"))
///     .build();
/// ```
#[derive(Debug, Clone, Getters)]
pub struct ModelSchema {
    name: String,
    kind: ModelKind,
    primary_key: String,
    connection: Option<String>,
    /// Operation (`search`, `view`, ...) to route name
    routes: HashMap<String, String>,
    /// Includes added to every query for this model
    includes: Vec<String>,
    relationships: HashMap<String, Relationship>,
    casts: HashMap<String, Cast>,
    encoder: Encoder,
    decoder: Arc<dyn ResponseDecoder>,
}

impl ModelSchema {
    pub fn model(name: impl Into<String>) -> ModelSchemaBuilder {
        ModelSchemaBuilder::new(name.into(), ModelKind::Model)
    }

    pub fn value_object(name: impl Into<String>) -> ModelSchemaBuilder {
        ModelSchemaBuilder::new(name.into(), ModelKind::ValueObject)
    }

    pub fn is_value_object(&self) -> bool {
        self.kind == ModelKind::ValueObject
    }

    pub fn route_for(&self, operation: &str) -> OrmResult<&str> {
        self.routes
            .get(operation)
            .map(String::as_str)
            .ok_or_else(|| OrmError::UnknownRoute {
                model: self.name.clone(),
                operation: operation.to_string(),
            })
    }

    pub fn has_route(&self, operation: &str) -> bool {
        self.routes.contains_key(operation)
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.get(name)
    }

    /// True when `key` holds embedded data of a declared relationship.
    pub fn is_relationship_key(&self, key: &str) -> bool {
        self.relationships.values().any(|r| r.attribute_key() == key)
    }
}

pub struct ModelSchemaBuilder {
    schema: ModelSchema,
}

impl ModelSchemaBuilder {
    fn new(name: String, kind: ModelKind) -> Self {
        Self {
            schema: ModelSchema {
                name,
                kind,
                primary_key: "id".to_string(),
                connection: None,
                routes: HashMap::new(),
                includes: Vec::new(),
                relationships: HashMap::new(),
                casts: HashMap::new(),
                encoder: Encoder::default(),
                decoder: Arc::new(JsonDecoder),
            },
        }
    }

    pub fn primary_key(mut self, key: impl Into<String>) -> Self {
        self.schema.primary_key = key.into();
        self
    }

    /// Named connection to use instead of the manager's default.
    pub fn connection(mut self, name: impl Into<String>) -> Self {
        self.schema.connection = Some(name.into());
        self
    }

    pub fn route(mut self, operation: impl Into<String>, route: impl Into<String>) -> Self {
        self.schema.routes.insert(operation.into(), route.into());
        self
    }

    pub fn include<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema.includes.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn relationship(mut self, name: impl Into<String>, relationship: impl Into<Relationship>) -> Self {
        let name = name.into();
        let relationship = relationship.into().named(&name);
        self.schema.relationships.insert(name, relationship);
        self
    }

    pub fn belongs_to(self, name: impl Into<String>, relationship: crate::relations::BelongsTo) -> Self {
        self.relationship(name, relationship)
    }

    pub fn has_many(self, name: impl Into<String>, relationship: crate::relations::HasMany) -> Self {
        self.relationship(name, relationship)
    }

    pub fn cast(mut self, attribute: impl Into<String>, cast: Cast) -> Self {
        self.schema.casts.insert(attribute.into(), cast);
        self
    }

    pub fn dialect(self, dialect: Dialect) -> Self {
        self.encoder(Encoder::for_dialect(dialect, EncoderOptions::default()))
    }

    pub fn encoder(mut self, encoder: Encoder) -> Self {
        self.schema.encoder = encoder;
        self
    }

    pub fn decoder(mut self, decoder: impl ResponseDecoder + 'static) -> Self {
        self.schema.decoder = Arc::new(decoder);
        self
    }

    pub fn build(self) -> ModelSchema {
        self.schema
    }
}

impl From<ModelSchemaBuilder> for ModelSchema {
    fn from(builder: ModelSchemaBuilder) -> Self {
        builder.build()
    }
}
