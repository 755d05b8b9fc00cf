//! Fluent, single-use query against one model.

use {
    super::{in_, CompositeExpression, Direction, Expression, Node, Operator, Pagination, QueryState},
    crate::{
        decoder::{Record, DEFAULT_ACCEPTED_STATUS},
        encoder::QueryEncoder,
        error::{OrmError, OrmResult},
        manager::Manager,
        model::{Entity, ModelSchema, SEARCH_ROUTE, VIEW_ROUTE},
    },
    restmap_client::{value_to_param, Connection, Params},
    serde_json::Value,
    std::sync::Arc,
    tracing::{debug, error, instrument, trace},
};

/// Page size used when an offset or marker is given without a limit.
pub const DEFAULT_PAGE_SIZE: u64 = 30;

/// Builds one [`QueryState`] and sends it. Terminal operations consume the
/// builder, so a state is never reused after its request.
///
/// A query whose only filter is an EQ on the primary key goes to the model's
/// `view` route when it has one; every other query goes to `search`.
///
/// # Example
///
/// ```ignore
/// let admins = manager
///     .query("User")?
///     .where_eq("role", "admin")
///     .order_by("created", Direction::Desc)
///     .page(1, 20)
///     .include(["account"])
///     .fetch()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct ModelQuery<'m> {
    manager: &'m Manager,
    schema: Arc<ModelSchema>,
    state: QueryState,
}

impl<'m> ModelQuery<'m> {
    pub(crate) fn new(manager: &'m Manager, schema: Arc<ModelSchema>) -> Self {
        let mut state = QueryState::new();
        for path in schema.includes() {
            state.add_include(path);
        }
        Self {
            manager,
            schema,
            state,
        }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn into_state(self) -> QueryState {
        self.state
    }

    // ========================================================================
    // Filters
    // ========================================================================

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_field(field, Operator::Eq, value)
    }

    pub fn where_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_expr(in_(field, values))
    }

    pub fn where_field(self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.where_expr(Expression::new(field, operator, value))
    }

    /// AND an expression or composite onto the filter.
    pub fn where_expr(mut self, node: impl Into<Node>) -> Self {
        self.state.add_filter(node);
        self
    }

    /// OR an expression or composite with everything filtered so far.
    pub fn or_where(mut self, node: impl Into<Node>) -> Self {
        self.state.or_filter(node);
        self
    }

    pub fn where_primary_key(self, id: impl Into<Value>) -> Self {
        let key = self.schema.primary_key().clone();
        self.where_eq(key, id)
    }

    pub fn where_primary_key_in<I, V>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let key = self.schema.primary_key().clone();
        self.where_in(key, ids)
    }

    pub(crate) fn filter(mut self, filters: Option<CompositeExpression>) -> Self {
        if let Some(filters) = filters {
            if !filters.is_empty() {
                self.state.add_filter(filters);
            }
        }
        self
    }

    // ========================================================================
    // Ordering, pagination, includes
    // ========================================================================

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.state.add_sort(field, direction);
        self
    }

    pub fn page(mut self, page: u64, per_page: u64) -> Self {
        self.state
            .set_pagination(Some(Pagination::Page { page, per_page }));
        self
    }

    /// Keeps an existing offset or marker.
    pub fn limit(mut self, limit: u64) -> Self {
        let pagination = match self.state.pagination().cloned() {
            Some(Pagination::Marker { marker, .. }) => Pagination::Marker { limit, marker },
            Some(Pagination::Offset { offset, .. }) => Pagination::Offset { limit, offset },
            _ => Pagination::Offset { limit, offset: 0 },
        };
        self.state.set_pagination(Some(pagination));
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        let limit = self.current_limit();
        self.state
            .set_pagination(Some(Pagination::Offset { limit, offset }));
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        let limit = self.current_limit();
        self.state.set_pagination(Some(Pagination::Marker {
            limit,
            marker: marker.into(),
        }));
        self
    }

    fn current_limit(&self) -> u64 {
        self.state
            .pagination()
            .map(Pagination::limit)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn include<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            self.state.add_include(path);
        }
        self
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// The primary key value when this query is a single-record lookup.
    fn primary_key_lookup(&self) -> Option<&Value> {
        let filters = self.state.filters()?;
        match filters.parts() {
            [Node::Expr(expr)]
                if filters.is_and()
                    && expr.operator() == Operator::Eq
                    && expr.field() == self.schema.primary_key()
                    && !matches!(expr.value(), Value::Null | Value::Array(_) | Value::Object(_)) =>
            {
                Some(expr.value())
            }
            _ => None,
        }
    }

    /// Route name and encoded parameters. Encoding happens here, before any
    /// request is made.
    fn target(&self) -> OrmResult<(String, Params)> {
        let encoder = self.schema.encoder();
        if let (Some(id), Some(view)) = (self.primary_key_lookup(), self.schema.routes().get(VIEW_ROUTE)) {
            let mut lookup = QueryState::new();
            for path in self.state.includes() {
                lookup.add_include(path);
            }
            let mut params = encoder.encode(&lookup)?;
            params.insert(
                self.schema.primary_key().clone(),
                Value::String(value_to_param(id)),
            );
            return Ok((view.clone(), params));
        }
        let route = self.schema.route_for(SEARCH_ROUTE)?.to_string();
        Ok((route, encoder.encode(&self.state)?))
    }

    async fn request(&self) -> OrmResult<Vec<Record>> {
        let class = self.schema.name();
        let (route, params) = self.target()?;
        let connection = self.manager.connection_for(&self.schema)?;
        debug!("{} -> {} {:?}", class, route, params);

        let response = connection.get(&route, &params).await.map_err(|source| {
            error!(
                class = %class,
                route = %route,
                url = ?connection.route(&route, &params).ok(),
                "request failed: {}",
                source
            );
            OrmError::Transport {
                class: class.clone(),
                route: route.clone(),
                source,
            }
        })?;

        let records = self
            .schema
            .decoder()
            .decode(&response, DEFAULT_ACCEPTED_STATUS)
            .map_err(|source| OrmError::Decode {
                class: class.clone(),
                source,
            })?;
        trace!(
            "{} {} -> status {}, {} record(s)",
            class,
            route,
            response.status(),
            records.len()
        );
        Ok(records)
    }

    /// Decoded records, without hydration or relationship resolution.
    #[instrument(name = "restmap.query.fetch_raw", skip(self), fields(model = %self.schema.name()), err)]
    pub async fn fetch_raw(self) -> OrmResult<Vec<Record>> {
        self.request().await
    }

    /// Hydrated entities with every include resolved.
    #[instrument(name = "restmap.query.fetch", skip(self), fields(model = %self.schema.name()), err)]
    pub async fn fetch(self) -> OrmResult<Vec<Entity>> {
        let records = self.request().await?;
        let mut entities = self.manager.mapper().hydrate_all(&self.schema, records)?;
        let includes = self.state.include_tree();
        if !includes.is_empty() && !entities.is_empty() {
            self.manager
                .resolver()
                .resolve(&mut entities, &includes)
                .await?;
        }
        Ok(entities)
    }

    /// Fails with `NoResults` when nothing matches.
    pub async fn fetch_or_fail(self) -> OrmResult<Vec<Entity>> {
        let class = self.schema.name().clone();
        let state = self.state.clone();
        let entities = self.fetch().await?;
        if entities.is_empty() {
            return Err(OrmError::NoResults {
                class,
                query: Box::new(state),
            });
        }
        Ok(entities)
    }

    /// First match. Adds a limit of one unless the query already paginates
    /// or is a primary key lookup.
    pub async fn first(mut self) -> OrmResult<Option<Entity>> {
        if self.state.pagination().is_none() && self.primary_key_lookup().is_none() {
            self.state
                .set_pagination(Some(Pagination::Offset { limit: 1, offset: 0 }));
        }
        Ok(self.fetch().await?.into_iter().next())
    }

    pub async fn first_or_fail(self) -> OrmResult<Entity> {
        let class = self.schema.name().clone();
        let state = self.state.clone();
        self.first().await?.ok_or_else(|| OrmError::NoResults {
            class,
            query: Box::new(state),
        })
    }

    pub async fn find(self, id: impl Into<Value>) -> OrmResult<Option<Entity>> {
        self.where_primary_key(id).first().await
    }

    /// Fails with `NotFound` when no record has this primary key.
    pub async fn find_or_fail(self, id: impl Into<Value>) -> OrmResult<Entity> {
        let id = id.into();
        let class = self.schema.name().clone();
        let key = self.schema.primary_key().clone();
        let shown = value_to_param(&id);
        self.find(id).await?.ok_or(OrmError::NotFound {
            class,
            key,
            id: shown,
        })
    }
}
