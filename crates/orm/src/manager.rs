//! The context every operation runs in: connections plus model schemas.
//!
//! There is no global instance; build one and pass it where it is needed.
//!
//! # Example
//!
//! ```ignore
//! let manager = Manager::builder()
//!     .connection(Arc::new(HttpConnection::from_env(router)?))
//!     .model(ModelSchema::model("User").route("search", "users.search"))
//!     .build()?;
//!
//! let users = manager.locator("User")?.find_all().await?;
//! ```

use {
    crate::{
        error::{OrmError, OrmResult},
        locator::EntityLocator,
        mapper::ObjectMapper,
        model::{Cast, ModelKind, ModelSchema},
        persistence::ActionPersister,
        query::ModelQuery,
        relations::{RelationResolver, Relationship},
    },
    restmap_client::Connection,
    std::{collections::HashMap, fmt, sync::Arc},
    tracing::debug,
};

pub const DEFAULT_CONNECTION: &str = "default";

pub struct Manager {
    connections: HashMap<String, Arc<dyn Connection>>,
    models: HashMap<String, Arc<ModelSchema>>,
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("connections", &self.connections.keys().collect::<Vec<_>>())
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Manager {
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::default()
    }

    pub fn connection(&self, name: &str) -> OrmResult<&Arc<dyn Connection>> {
        self.connections
            .get(name)
            .ok_or_else(|| OrmError::UnknownConnection(name.to_string()))
    }

    pub fn connection_for(&self, schema: &ModelSchema) -> OrmResult<&Arc<dyn Connection>> {
        self.connection(schema.connection().as_deref().unwrap_or(DEFAULT_CONNECTION))
    }

    pub fn model(&self, name: &str) -> OrmResult<&Arc<ModelSchema>> {
        self.models
            .get(name)
            .ok_or_else(|| OrmError::UnknownModel(name.to_string()))
    }

    pub fn query(&self, model: &str) -> OrmResult<ModelQuery<'_>> {
        Ok(ModelQuery::new(self, self.model(model)?.clone()))
    }

    pub fn locator(&self, model: &str) -> OrmResult<EntityLocator<'_>> {
        Ok(EntityLocator::new(self, self.model(model)?.clone()))
    }

    pub fn persister(&self) -> ActionPersister<'_> {
        ActionPersister::new(self)
    }

    pub fn mapper(&self) -> ObjectMapper<'_> {
        ObjectMapper::new(self)
    }

    pub fn resolver(&self) -> RelationResolver<'_> {
        RelationResolver::new(self)
    }
}

#[derive(Default)]
pub struct ManagerBuilder {
    connections: HashMap<String, Arc<dyn Connection>>,
    models: Vec<ModelSchema>,
}

impl ManagerBuilder {
    /// Register the default connection.
    pub fn connection(self, connection: Arc<dyn Connection>) -> Self {
        self.named_connection(DEFAULT_CONNECTION, connection)
    }

    pub fn named_connection(mut self, name: impl Into<String>, connection: Arc<dyn Connection>) -> Self {
        self.connections.insert(name.into(), connection);
        self
    }

    pub fn model(mut self, schema: impl Into<ModelSchema>) -> Self {
        self.models.push(schema.into());
        self
    }

    /// Validate every schema against the others and freeze the context.
    ///
    /// Fails on unknown related models or connections and on relationships
    /// that involve a value object where an identity is needed.
    pub fn build(self) -> OrmResult<Manager> {
        let kinds: HashMap<&str, ModelKind> = self
            .models
            .iter()
            .map(|m| (m.name().as_str(), *m.kind()))
            .collect();

        for schema in &self.models {
            validate(schema, &kinds, &self.connections)?;
        }

        debug!(
            "manager ready: {} connection(s), {} model(s)",
            self.connections.len(),
            self.models.len()
        );
        Ok(Manager {
            connections: self.connections,
            models: self
                .models
                .into_iter()
                .map(|m| (m.name().clone(), Arc::new(m)))
                .collect(),
        })
    }
}

fn validate(
    schema: &ModelSchema,
    kinds: &HashMap<&str, ModelKind>,
    connections: &HashMap<String, Arc<dyn Connection>>,
) -> OrmResult<()> {
    if schema.kind() == &ModelKind::Model {
        let connection = schema.connection().as_deref().unwrap_or(DEFAULT_CONNECTION);
        if !connections.contains_key(connection) {
            return Err(OrmError::UnknownConnection(connection.to_string()));
        }
    }

    for (name, relationship) in schema.relationships() {
        let related = relationship.related();
        let related_kind = kinds
            .get(related)
            .ok_or_else(|| OrmError::UnknownModel(related.to_string()))?;
        let reason = match relationship {
            Relationship::BelongsTo(_) if *related_kind == ModelKind::ValueObject => {
                Some("value objects have no identity to belong to")
            }
            Relationship::HasMany(_) if schema.is_value_object() => {
                Some("value objects cannot own children")
            }
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(OrmError::RelationshipConfiguration {
                model: schema.name().clone(),
                relationship: name.clone(),
                related: related.to_string(),
                reason: reason.to_string(),
            });
        }
    }

    for cast in schema.casts().values() {
        if let Cast::ValueObject(model) = cast {
            if !kinds.contains_key(model.as_str()) {
                return Err(OrmError::UnknownModel(model.clone()));
            }
        }
    }
    Ok(())
}
