use {
    super::HasMany,
    crate::{
        decoder::{flatten_records, Record},
        error::OrmResult,
        manager::Manager,
        mapper::ObjectMapper,
        model::{Collection, Entity, ModelSchema, Relation, SEARCH_ROUTE},
    },
    itertools::Itertools,
    restmap_client::value_to_param,
    serde_json::Value,
    std::{collections::HashMap, sync::Arc},
    tracing::debug,
};

fn build_collection(
    mapper: &ObjectMapper<'_>,
    related: &Arc<ModelSchema>,
    index_by: Option<&str>,
    data: Value,
) -> OrmResult<Collection> {
    let mut collection = Collection::new();
    for record in flatten_records(data) {
        let child = mapper.hydrate(related, record)?;
        match index_by {
            Some(key) => {
                let index = child.raw_value(key).map(value_to_param).unwrap_or_default();
                collection.set(index, child);
            }
            None => collection.push(child),
        }
    }
    Ok(collection)
}

/// Fill the `name` slot of every unresolved parent.
///
/// Embedded lists are hydrated directly. Otherwise, for lazy relationships,
/// the parents are fetched again by primary key with `name` (and its nested
/// paths) as includes, in one request, and the children are read from the
/// attribute key of each returned parent record. Without a `search` route
/// the parents are fetched one `view` request at a time.
pub(super) async fn resolve(
    manager: &Manager,
    parent_schema: &Arc<ModelSchema>,
    name: &str,
    relation: &HasMany,
    parents: &mut [&mut Entity],
    nested: &[String],
) -> OrmResult<()> {
    let related = manager.model(relation.related())?.clone();
    let mapper = manager.mapper();
    let attribute_key = relation.key();

    let mut pending = Vec::new();
    for (idx, parent) in parents.iter_mut().enumerate() {
        if parent.is_loaded(name) {
            continue;
        }
        let embedded = parent
            .raw_value(attribute_key)
            .filter(|v| matches!(v, Value::Object(_) | Value::Array(_)))
            .cloned();
        match embedded {
            Some(data) => {
                let children = build_collection(&mapper, &related, relation.indexed_by(), data)?;
                parent.set_relation(name, Relation::Many(children));
            }
            None => pending.push(idx),
        }
    }

    if pending.is_empty() {
        return Ok(());
    }
    if !relation.is_lazy() {
        for idx in pending {
            parents[idx].set_relation(name, Relation::Many(Collection::new()));
        }
        return Ok(());
    }

    let keyed: Vec<(usize, Option<String>)> = pending
        .iter()
        .map(|&idx| (idx, parents[idx].id_string()))
        .collect();
    let ids: Vec<String> = keyed.iter().filter_map(|(_, k)| k.clone()).unique().collect();

    let mut includes = vec![name.to_string()];
    includes.extend(nested.iter().map(|path| format!("{name}.{path}")));
    let found = fetch(manager, parent_schema, &ids, &includes).await?;
    debug!(
        "{}.{}: children fetched for {} of {} parent(s)",
        parent_schema.name(),
        name,
        found.len(),
        ids.len()
    );

    for (idx, key) in keyed {
        let parent = &mut parents[idx];
        let data = key
            .and_then(|k| found.get(&k))
            .and_then(|record| record.get(attribute_key))
            .filter(|v| matches!(v, Value::Object(_) | Value::Array(_)))
            .cloned();
        let children = match data {
            Some(data) => {
                parent.set_raw(attribute_key, data.clone());
                build_collection(&mapper, &related, relation.indexed_by(), data)?
            }
            None => Collection::new(),
        };
        parent.set_relation(name, Relation::Many(children));
    }
    Ok(())
}

async fn fetch(
    manager: &Manager,
    parent_schema: &Arc<ModelSchema>,
    ids: &[String],
    includes: &[String],
) -> OrmResult<HashMap<String, Record>> {
    let mut found = HashMap::new();
    if ids.len() > 1 && parent_schema.has_route(SEARCH_ROUTE) {
        let records = manager
            .query(parent_schema.name())?
            .include(includes)
            .where_primary_key_in(ids.iter().cloned())
            .fetch_raw()
            .await?;
        for record in records {
            if let Some(key) = record.get(parent_schema.primary_key()).map(value_to_param) {
                found.entry(key).or_insert(record);
            }
        }
        return Ok(found);
    }

    // no search route: one lookup per parent
    for id in ids {
        let records = manager
            .query(parent_schema.name())?
            .include(includes)
            .where_primary_key(id.clone())
            .fetch_raw()
            .await?;
        let record = parent_schema.decoder().object(&records);
        if !record.is_empty() {
            found.insert(id.clone(), record);
        }
    }
    Ok(found)
}
