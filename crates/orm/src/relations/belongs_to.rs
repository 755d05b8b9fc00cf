use {
    super::BelongsTo,
    crate::{
        decoder::{flatten_records, Record},
        error::OrmResult,
        manager::Manager,
        model::{Entity, ModelSchema, Relation, SEARCH_ROUTE},
    },
    itertools::Itertools,
    restmap_client::value_to_param,
    serde_json::Value,
    std::{collections::HashMap, sync::Arc},
    tracing::debug,
};

fn missing(relation: &BelongsTo, related: &Arc<ModelSchema>) -> Relation {
    if relation.is_null_on_not_found() {
        Relation::One(None)
    } else {
        Relation::One(Some(Box::new(Entity::new(related.clone()))))
    }
}

/// Fill the `name` slot of every unresolved parent.
///
/// Embedded objects are hydrated directly. The rest are looked up with one
/// request keyed by their distinct identifiers: the `view` route for a single
/// identifier, an IN filter on the related primary key otherwise. A related
/// model without a `search` route gets one `view` request per identifier.
pub(super) async fn resolve(
    manager: &Manager,
    name: &str,
    relation: &BelongsTo,
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
                let slot = match flatten_records(data).into_iter().next() {
                    Some(record) => Relation::One(Some(Box::new(mapper.hydrate(&related, record)?))),
                    None => missing(relation, &related),
                };
                parent.set_relation(name, slot);
            }
            None => pending.push(idx),
        }
    }

    if pending.is_empty() {
        return Ok(());
    }
    if !relation.is_lazy() {
        for idx in pending {
            parents[idx].set_relation(name, missing(relation, &related));
        }
        return Ok(());
    }

    let identity_key = relation.identity();
    let keyed: Vec<(usize, Option<String>)> = pending
        .iter()
        .map(|&idx| {
            let key = parents[idx]
                .raw_value(&identity_key)
                .map(value_to_param)
                .filter(|k| !k.is_empty());
            (idx, key)
        })
        .collect();
    let ids: Vec<String> = keyed.iter().filter_map(|(_, k)| k.clone()).unique().collect();

    let found = fetch(manager, &related, &ids, nested).await?;
    debug!(
        "{}.{}: {} of {} identifier(s) matched",
        parents.first().map(|p| p.model()).unwrap_or_default(),
        name,
        found.len(),
        ids.len()
    );

    for (idx, key) in keyed {
        let parent = &mut parents[idx];
        match key.and_then(|k| found.get(&k)) {
            Some(record) => {
                parent.set_raw(attribute_key, Value::Object(record.clone()));
                let child = mapper.hydrate(&related, record.clone())?;
                parent.set_relation(name, Relation::One(Some(Box::new(child))));
            }
            None => parent.set_relation(name, missing(relation, &related)),
        }
    }
    Ok(())
}

async fn fetch(
    manager: &Manager,
    related: &Arc<ModelSchema>,
    ids: &[String],
    nested: &[String],
) -> OrmResult<HashMap<String, Record>> {
    let mut found = HashMap::new();
    if ids.len() > 1 && related.has_route(SEARCH_ROUTE) {
        let records = manager
            .query(related.name())?
            .include(nested)
            .where_primary_key_in(ids.iter().cloned())
            .fetch_raw()
            .await?;
        for record in records {
            if let Some(key) = record.get(related.primary_key()).map(value_to_param) {
                found.entry(key).or_insert(record);
            }
        }
        return Ok(found);
    }

    // no search route: one lookup per identifier
    for id in ids {
        let records = manager
            .query(related.name())?
            .include(nested)
            .where_primary_key(id.clone())
            .fetch_raw()
            .await?;
        if let Some(record) = records.into_iter().next() {
            found.insert(id.clone(), record);
        }
    }
    Ok(found)
}
