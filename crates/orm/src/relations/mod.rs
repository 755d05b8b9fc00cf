//! Relationship declarations and their batch resolution.
//!
//! Resolution is driven by include paths. For each (batch, relationship)
//! pair the resolver:
//! 1. decodes embedded data found under the relationship's attribute key
//!    without any request;
//! 2. otherwise issues at most one request for every entity still missing
//!    data, unless the relationship is non-lazy;
//! 3. recurses into nested include paths on the related entities.

mod belongs_to;
mod has_many;
mod resolver;

pub use resolver::RelationResolver;

/// The child side: this entity carries the related entity's identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BelongsTo {
    related: String,
    attribute_key: Option<String>,
    identity_key: Option<String>,
    null_on_not_found: bool,
    lazy: bool,
}

impl BelongsTo {
    pub fn new(related: impl Into<String>) -> Self {
        Self {
            related: related.into(),
            attribute_key: None,
            identity_key: None,
            null_on_not_found: true,
            lazy: true,
        }
    }

    /// Key holding embedded related data. Defaults to the relationship name.
    pub fn attribute_key(mut self, key: impl Into<String>) -> Self {
        self.attribute_key = Some(key.into());
        self
    }

    /// Key holding the related identifier. Defaults to `<attribute_key>_id`.
    pub fn identity_key(mut self, key: impl Into<String>) -> Self {
        self.identity_key = Some(key.into());
        self
    }

    /// When nothing matches, leave the slot empty (`true`, the default) or
    /// fill it with a new unsaved instance (`false`).
    pub fn null_on_not_found(mut self, null: bool) -> Self {
        self.null_on_not_found = null;
        self
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn related(&self) -> &str {
        &self.related
    }

    pub fn key(&self) -> &str {
        self.attribute_key.as_deref().unwrap_or_default()
    }

    pub fn identity(&self) -> String {
        self.identity_key
            .clone()
            .unwrap_or_else(|| format!("{}_id", self.key()))
    }

    pub fn is_null_on_not_found(&self) -> bool {
        self.null_on_not_found
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }
}

/// The parent side: the remote API lists children when the parent is
/// fetched with the relationship included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasMany {
    related: String,
    attribute_key: Option<String>,
    index_by: Option<String>,
    lazy: bool,
}

impl HasMany {
    pub fn new(related: impl Into<String>) -> Self {
        Self {
            related: related.into(),
            attribute_key: None,
            index_by: None,
            lazy: true,
        }
    }

    /// Key holding embedded children. Defaults to the relationship name.
    pub fn attribute_key(mut self, key: impl Into<String>) -> Self {
        self.attribute_key = Some(key.into());
        self
    }

    /// Key children by this attribute; later duplicates overwrite earlier ones.
    pub fn index_by(mut self, attribute: impl Into<String>) -> Self {
        self.index_by = Some(attribute.into());
        self
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn related(&self) -> &str {
        &self.related
    }

    pub fn key(&self) -> &str {
        self.attribute_key.as_deref().unwrap_or_default()
    }

    pub fn indexed_by(&self) -> Option<&str> {
        self.index_by.as_deref()
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relationship {
    BelongsTo(BelongsTo),
    HasMany(HasMany),
}

impl Relationship {
    pub fn related(&self) -> &str {
        match self {
            Relationship::BelongsTo(r) => r.related(),
            Relationship::HasMany(r) => r.related(),
        }
    }

    pub fn attribute_key(&self) -> &str {
        match self {
            Relationship::BelongsTo(r) => r.key(),
            Relationship::HasMany(r) => r.key(),
        }
    }

    /// Fill the attribute key with the relationship name when unset.
    pub(crate) fn named(self, name: &str) -> Self {
        match self {
            Relationship::BelongsTo(mut r) => {
                r.attribute_key.get_or_insert_with(|| name.to_string());
                Relationship::BelongsTo(r)
            }
            Relationship::HasMany(mut r) => {
                r.attribute_key.get_or_insert_with(|| name.to_string());
                Relationship::HasMany(r)
            }
        }
    }
}

impl From<BelongsTo> for Relationship {
    fn from(r: BelongsTo) -> Self {
        Relationship::BelongsTo(r)
    }
}

impl From<HasMany> for Relationship {
    fn from(r: HasMany) -> Self {
        Relationship::HasMany(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keys_default_from_relationship_name() {
        let Relationship::BelongsTo(account) = Relationship::from(BelongsTo::new("Account")).named("account") else {
            panic!("expected belongs-to");
        };
        assert_eq!(account.key(), "account");
        assert_eq!(account.identity(), "account_id");
        assert!(account.is_null_on_not_found());

        let custom = BelongsTo::new("Account")
            .attribute_key("owner")
            .identity_key("owner_uuid");
        assert_eq!(Relationship::from(custom).named("account").attribute_key(), "owner");
    }
}
