use super::Entity;

/// Ordered entities, optionally keyed. Setting an existing key replaces the
/// entity in place.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    entries: Vec<(Option<String>, Entity)>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: Entity) {
        self.entries.push((None, entity));
    }

    pub fn set(&mut self, key: impl Into<String>, entity: Entity) {
        let key = key.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.as_deref() == Some(key.as_str()))
        {
            Some(slot) => slot.1 = entity,
            None => self.entries.push((Some(key), entity)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_deref() == Some(key))
            .map(|(_, e)| e)
    }

    pub fn first(&self) -> Option<&Entity> {
        self.entries.first().map(|(_, e)| e)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = Option<&str>> {
        self.entries.iter().map(|(k, _)| k.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entries.iter().map(|(_, e)| e)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entries.iter_mut().map(|(_, e)| e)
    }

    pub fn into_vec(self) -> Vec<Entity> {
        self.entries.into_iter().map(|(_, e)| e).collect()
    }
}

impl IntoIterator for Collection {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

impl FromIterator<Entity> for Collection {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|e| (None, e)).collect(),
        }
    }
}
