use {
    super::{belongs_to, has_many, Relationship},
    crate::{error::OrmResult, manager::Manager, model::Entity, query::IncludePath},
    futures_util::future::{BoxFuture, FutureExt},
    tracing::trace,
};

/// Resolves include trees over batches of entities, one relationship level
/// at a time, awaiting each request before the next.
#[derive(Debug, Clone, Copy)]
pub struct RelationResolver<'m> {
    manager: &'m Manager,
}

impl<'m> RelationResolver<'m> {
    pub fn new(manager: &'m Manager) -> Self {
        Self { manager }
    }

    /// Resolve every path of `includes` on all `entities`. Paths naming no
    /// declared relationship are skipped.
    pub async fn resolve(&self, entities: &mut [Entity], includes: &[IncludePath]) -> OrmResult<()> {
        let batch: Vec<&mut Entity> = entities.iter_mut().collect();
        self.resolve_paths(batch, includes).await
    }

    /// Resolve one relationship (or dot-path) on a single entity.
    pub async fn load(&self, entity: &mut Entity, path: &str) -> OrmResult<()> {
        let includes = IncludePath::parse_all(&[path]);
        self.resolve_paths(vec![entity], &includes).await
    }

    fn resolve_paths<'a>(
        &'a self,
        mut batch: Vec<&'a mut Entity>,
        paths: &'a [IncludePath],
    ) -> BoxFuture<'a, OrmResult<()>> {
        async move {
            for path in paths {
                let level: Vec<&mut Entity> = batch.iter_mut().map(|e| &mut **e).collect();
                self.resolve_path(level, path).await?;
            }
            Ok(())
        }
        .boxed()
    }

    fn resolve_path<'a>(
        &'a self,
        mut batch: Vec<&'a mut Entity>,
        path: &'a IncludePath,
    ) -> BoxFuture<'a, OrmResult<()>> {
        async move {
            let Some(schema) = batch.first().map(|e| e.schema().clone()) else {
                return Ok(());
            };
            let Some(relationship) = schema.relationship(&path.name).cloned() else {
                trace!("{} has no relationship `{}`, include skipped", schema.name(), path.name);
                return Ok(());
            };

            let nested = path.nested_paths();
            match &relationship {
                Relationship::BelongsTo(rel) => {
                    belongs_to::resolve(self.manager, &path.name, rel, &mut batch, &nested).await?
                }
                Relationship::HasMany(rel) => {
                    has_many::resolve(self.manager, &schema, &path.name, rel, &mut batch, &nested)
                        .await?
                }
            }

            if !path.nested.is_empty() {
                let children: Vec<&mut Entity> = batch
                    .into_iter()
                    .flat_map(|e| e.related_entities_mut(&path.name))
                    .collect();
                if !children.is_empty() {
                    self.resolve_paths(children, &path.nested).await?;
                }
            }
            Ok(())
        }
        .boxed()
    }
}
