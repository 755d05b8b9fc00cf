//! Hydration of decoded records into entities.

use {
    crate::{
        decoder::Record,
        error::{OrmError, OrmResult},
        manager::Manager,
        model::{AttributeValue, Cast, Entity, ModelSchema},
    },
    serde_json::Value,
    std::{collections::HashMap, sync::Arc},
    tracing::trace,
};

/// Builds entities from records, applying each schema's casts. Relationship
/// keys are kept in the raw record only; resolving them is the resolver's job.
#[derive(Debug, Clone, Copy)]
pub struct ObjectMapper<'m> {
    manager: &'m Manager,
}

impl<'m> ObjectMapper<'m> {
    pub fn new(manager: &'m Manager) -> Self {
        Self { manager }
    }

    pub fn hydrate(&self, schema: &Arc<ModelSchema>, record: Record) -> OrmResult<Entity> {
        let mut attributes = HashMap::with_capacity(record.len());
        for (key, value) in &record {
            if schema.is_relationship_key(key) {
                continue;
            }
            let attribute = match (schema.casts().get(key), value) {
                (Some(_), Value::Null) | (None, _) => AttributeValue::Raw(value.clone()),
                (Some(cast), value) => self.cast(schema, key, cast, value)?,
            };
            attributes.insert(key.clone(), attribute);
        }
        Ok(Entity::hydrated(schema.clone(), record, attributes))
    }

    pub fn hydrate_all(&self, schema: &Arc<ModelSchema>, records: Vec<Record>) -> OrmResult<Vec<Entity>> {
        let entities = records
            .into_iter()
            .map(|record| self.hydrate(schema, record))
            .collect::<OrmResult<Vec<_>>>()?;
        trace!("hydrated {} {} entities", entities.len(), schema.name());
        Ok(entities)
    }

    fn cast(
        &self,
        schema: &ModelSchema,
        attribute: &str,
        cast: &Cast,
        value: &Value,
    ) -> OrmResult<AttributeValue> {
        let failed = |reason: String| OrmError::Cast {
            model: schema.name().clone(),
            attribute: attribute.to_string(),
            reason,
        };
        match cast {
            Cast::ValueObject(model) => {
                let object_schema = self.manager.model(model)?;
                match value {
                    Value::Object(map) => self
                        .hydrate(object_schema, map.clone())
                        .map(|entity| AttributeValue::Object(Box::new(entity))),
                    other => Err(failed(format!("expected an object for {model}, got {other}"))),
                }
            }
            other => other.apply(value).map_err(failed),
        }
    }
}
