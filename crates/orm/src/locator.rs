//! Repository-style lookups for one model.

use {
    crate::{
        error::{OrmError, OrmResult},
        manager::Manager,
        model::{Entity, ModelSchema},
        query::{
            in_, CompositeExpression, Direction, ModelQuery, Node, Pagination, DEFAULT_PAGE_SIZE,
        },
    },
    serde_json::Value,
    std::sync::Arc,
    tracing::instrument,
};

/// Search criteria: field/value pairs combined with AND (sequence values
/// become IN), or a caller-supplied expression tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    filters: Option<CompositeExpression>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match `field` against `value`; a sequence matches any of its items.
    pub fn field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let node: Node = match value.into() {
            Value::Array(items) => in_(field, items).into(),
            scalar => crate::query::eq(field, scalar).into(),
        };
        self.filters
            .get_or_insert_with(|| CompositeExpression::and(Vec::<Node>::new()))
            .push(node);
        self
    }

    pub fn matching(filters: CompositeExpression) -> Self {
        Self {
            filters: Some(filters),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.as_ref().map_or(true, CompositeExpression::is_empty)
    }

    pub fn into_filters(self) -> Option<CompositeExpression> {
        self.filters
    }
}

impl From<CompositeExpression> for Criteria {
    fn from(filters: CompositeExpression) -> Self {
        Self::matching(filters)
    }
}

impl<K, V> From<Vec<(K, V)>> for Criteria
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs
            .into_iter()
            .fold(Criteria::new(), |criteria, (k, v)| criteria.field(k, v))
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Criteria
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs
            .into_iter()
            .fold(Criteria::new(), |criteria, (k, v)| criteria.field(k, v))
    }
}

fn pagination(limit: Option<u64>, offset: Option<u64>) -> Option<Pagination> {
    match (limit, offset) {
        (None, None) => None,
        (limit, offset) => Some(Pagination::Offset {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: offset.unwrap_or(0),
        }),
    }
}

/// Finds entities of one model. Transport failures are logged with the
/// route and model and returned as is; nothing is retried.
///
/// # Example
///
/// ```ignore
/// let users = manager.locator("User")?.with(["account"]);
/// let user = users.find_or_fail("42").await?;
/// let admins = users
///     .find_by([("role", "admin")], &[("created", Direction::Desc)], Some(10), None)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct EntityLocator<'m> {
    manager: &'m Manager,
    schema: Arc<ModelSchema>,
    includes: Vec<String>,
}

impl<'m> EntityLocator<'m> {
    pub(crate) fn new(manager: &'m Manager, schema: Arc<ModelSchema>) -> Self {
        Self {
            manager,
            schema,
            includes: Vec::new(),
        }
    }

    /// Eager-load these include paths on every lookup.
    pub fn with<I, S>(mut self, includes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes.extend(includes.into_iter().map(Into::into));
        self
    }

    fn query(&self) -> ModelQuery<'m> {
        ModelQuery::new(self.manager, self.schema.clone()).include(&self.includes)
    }

    fn search(
        &self,
        criteria: Criteria,
        order_by: &[(&str, Direction)],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> ModelQuery<'m> {
        let mut query = self.query().filter(criteria.into_filters());
        for (field, direction) in order_by {
            query = query.order_by(*field, *direction);
        }
        match pagination(limit, offset) {
            Some(Pagination::Offset { limit, offset }) => query.limit(limit).offset(offset),
            _ => query,
        }
    }

    /// `None` when the API has no record with this primary key.
    #[instrument(name = "restmap.locator.find", skip(self, id), fields(model = %self.schema.name()), err)]
    pub async fn find(&self, id: impl Into<Value>) -> OrmResult<Option<Entity>> {
        self.query().find(id).await
    }

    #[instrument(name = "restmap.locator.find_or_fail", skip(self, id), fields(model = %self.schema.name()), err)]
    pub async fn find_or_fail(&self, id: impl Into<Value>) -> OrmResult<Entity> {
        self.query().find_or_fail(id).await
    }

    /// Matching entities; empty when nothing matches.
    #[instrument(
        name = "restmap.locator.find_by",
        skip(self, criteria, order_by),
        fields(model = %self.schema.name()),
        err
    )]
    pub async fn find_by(
        &self,
        criteria: impl Into<Criteria>,
        order_by: &[(&str, Direction)],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> OrmResult<Vec<Entity>> {
        self.search(criteria.into(), order_by, limit, offset)
            .fetch()
            .await
    }

    /// Like [`find_by`](Self::find_by) but fails with `NoResults` when
    /// nothing matches.
    pub async fn find_by_or_fail(
        &self,
        criteria: impl Into<Criteria>,
        order_by: &[(&str, Direction)],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> OrmResult<Vec<Entity>> {
        self.search(criteria.into(), order_by, limit, offset)
            .fetch_or_fail()
            .await
    }

    /// First match, fetched with a limit of one.
    #[instrument(
        name = "restmap.locator.find_one_by",
        skip(self, criteria, order_by),
        fields(model = %self.schema.name()),
        err
    )]
    pub async fn find_one_by(
        &self,
        criteria: impl Into<Criteria>,
        order_by: &[(&str, Direction)],
    ) -> OrmResult<Option<Entity>> {
        self.search(criteria.into(), order_by, Some(1), None)
            .first()
            .await
    }

    pub async fn find_one_by_or_fail(
        &self,
        criteria: impl Into<Criteria>,
        order_by: &[(&str, Direction)],
    ) -> OrmResult<Entity> {
        let criteria = criteria.into();
        let query = self.search(criteria, order_by, Some(1), None);
        let state = query.state().clone();
        query.first().await?.ok_or_else(|| OrmError::NoResults {
            class: self.schema.name().clone(),
            query: Box::new(state),
        })
    }

    pub async fn find_all(&self) -> OrmResult<Vec<Entity>> {
        self.find_by(Criteria::new(), &[], None, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn criteria_pairs_become_and_of_eq_and_in() {
        let criteria = Criteria::from([("email", json!("a@example.com")), ("id", json!(["1", "2"]))]);
        let filters = criteria.into_filters().unwrap();
        assert!(filters.is_and());
        let rendered: Vec<_> = filters
            .leaves()
            .iter()
            .map(|e| (e.field().to_string(), e.to_query_string()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("email".to_string(), "a@example.com".to_string()),
                ("id".to_string(), "in:1,2".to_string())
            ]
        );
    }

    #[test]
    fn pagination_defaults() {
        assert_eq!(pagination(None, None), None);
        assert_eq!(pagination(Some(5), None), Some(Pagination::Offset { limit: 5, offset: 0 }));
        assert_eq!(
            pagination(None, Some(60)),
            Some(Pagination::Offset { limit: DEFAULT_PAGE_SIZE, offset: 60 })
        );
        assert!(Criteria::new().is_empty());
    }
}
