use {
    super::{AttributeValue, Collection, ModelSchema},
    crate::{
        decoder::Record,
        error::{OrmError, OrmResult},
        manager::Manager,
    },
    restmap_client::value_to_param,
    serde::de::DeserializeOwned,
    serde_json::Value,
    std::{collections::HashMap, sync::Arc},
};

/// A resolved relationship slot.
#[derive(Debug, Clone)]
pub enum Relation {
    One(Option<Box<Entity>>),
    Many(Collection),
}

impl Relation {
    pub fn as_one(&self) -> Option<&Entity> {
        match self {
            Relation::One(entity) => entity.as_deref(),
            Relation::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&Collection> {
        match self {
            Relation::Many(collection) => Some(collection),
            Relation::One(_) => None,
        }
    }

    fn entities_mut(&mut self) -> Vec<&mut Entity> {
        match self {
            Relation::One(Some(entity)) => vec![entity.as_mut()],
            Relation::One(None) => Vec::new(),
            Relation::Many(collection) => collection.iter_mut().collect(),
        }
    }
}

/// A hydrated instance of a [`ModelSchema`].
///
/// Keeps the raw record it was built from, including embedded relationship
/// data, alongside the cast attributes and any resolved relationship slots.
#[derive(Debug, Clone)]
pub struct Entity {
    schema: Arc<ModelSchema>,
    raw: Record,
    attributes: HashMap<String, AttributeValue>,
    relations: HashMap<String, Relation>,
    exists: bool,
}

impl Entity {
    /// A new, unsaved instance with no attributes.
    pub fn new(schema: Arc<ModelSchema>) -> Self {
        Self {
            schema,
            raw: Record::new(),
            attributes: HashMap::new(),
            relations: HashMap::new(),
            exists: false,
        }
    }

    pub(crate) fn hydrated(
        schema: Arc<ModelSchema>,
        raw: Record,
        attributes: HashMap<String, AttributeValue>,
    ) -> Self {
        Self {
            schema,
            raw,
            attributes,
            relations: HashMap::new(),
            exists: true,
        }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn model(&self) -> &str {
        self.schema.name()
    }

    /// Whether this entity was loaded from the remote API.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn raw(&self) -> &Record {
        &self.raw
    }

    pub fn raw_value(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    pub(crate) fn set_raw(&mut self, key: &str, value: Value) {
        self.raw.insert(key.to_string(), value);
    }

    pub fn get(&self, attribute: &str) -> Option<&AttributeValue> {
        self.attributes.get(attribute)
    }

    /// Deserialize the raw value of `attribute`. Missing and null values are
    /// `None`.
    pub fn get_typed<T: DeserializeOwned>(&self, attribute: &str) -> OrmResult<Option<T>> {
        match self.raw.get(attribute) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| OrmError::Cast {
                    model: self.model().to_string(),
                    attribute: attribute.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn id(&self) -> Option<&Value> {
        self.raw
            .get(self.schema.primary_key())
            .filter(|v| !v.is_null())
    }

    /// Primary key in its URL form.
    pub fn id_string(&self) -> Option<String> {
        self.id().map(value_to_param).filter(|s| !s.is_empty())
    }

    // ========================================================================
    // Relationships
    // ========================================================================

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    pub fn set_relation(&mut self, name: impl Into<String>, relation: Relation) {
        self.relations.insert(name.into(), relation);
    }

    /// The related entity of a resolved belongs-to slot.
    pub fn one(&self, name: &str) -> Option<&Entity> {
        self.relations.get(name).and_then(Relation::as_one)
    }

    /// The children of a resolved has-many slot.
    pub fn many(&self, name: &str) -> Option<&Collection> {
        self.relations.get(name).and_then(Relation::as_many)
    }

    pub(crate) fn related_entities_mut(&mut self, name: &str) -> Vec<&mut Entity> {
        self.relations
            .get_mut(name)
            .map(Relation::entities_mut)
            .unwrap_or_default()
    }

    /// Resolve `name` (a relationship or dot-path) if it is not loaded yet and
    /// return its slot. Loading an already resolved slot sends no request.
    pub async fn load(&mut self, name: &str, manager: &Manager) -> OrmResult<&Relation> {
        let head = name.split('.').next().unwrap_or(name).trim();
        if self.schema.relationship(head).is_none() {
            return Err(OrmError::UnknownRelationship {
                model: self.model().to_string(),
                relationship: head.to_string(),
            });
        }
        manager.resolver().load(self, name).await?;
        self.relations
            .get(head)
            .ok_or_else(|| OrmError::UnknownRelationship {
                model: self.schema.name().clone(),
                relationship: head.to_string(),
            })
    }

    /// Raw record with resolved relationships rendered in place.
    pub fn to_json(&self) -> Value {
        let mut out = self.raw.clone();
        for (name, relation) in &self.relations {
            let key = self
                .schema
                .relationship(name)
                .map(|r| r.attribute_key().to_string())
                .unwrap_or_else(|| name.clone());
            let value = match relation {
                Relation::One(Some(entity)) => entity.to_json(),
                Relation::One(None) => Value::Null,
                Relation::Many(children) => Value::Array(children.iter().map(Entity::to_json).collect()),
            };
            out.insert(key, value);
        }
        Value::Object(out)
    }
}
