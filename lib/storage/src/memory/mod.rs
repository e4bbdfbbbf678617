//! The in-memory adapter, evaluating find-options directly against the stored entities.

mod frame;
mod matcher;

use crate::adapter::QueryAdapter;
use crate::error::AdapterError;
use async_trait::async_trait;
use frame::Framer;
use matcher::Matcher;
use rdf_entity_model::vocab::{dcterms, xsd};
use rdf_entity_model::{
    Entity, FindOptions, FindOptionsOrder, OrderDirection, Properties, TypedLiteral, Value,
    ValueTerm, ID_KEY, TYPE_KEY,
};
use rdf_entity_sparql::QueryBuildError;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;

/// Holds entities in a map keyed by their id.
///
/// Matches the semantics of the SPARQL adapter, except for `gt`, `gte`, `lt` and `lte` which are not supported.
#[derive(Debug, Default)]
pub struct MemoryQueryAdapter {
    entities: RwLock<BTreeMap<String, Entity>>,
    set_timestamps: bool,
}

impl MemoryQueryAdapter {
    /// Creates an adapter holding `entities`.
    pub fn new(entities: impl IntoIterator<Item = Entity>) -> Self {
        let entities = entities
            .into_iter()
            .map(|entity| (entity.id.clone(), entity))
            .collect();
        Self {
            entities: RwLock::new(entities),
            set_timestamps: false,
        }
    }

    /// Stamps `dcterms:created` and `dcterms:modified` on every write.
    #[must_use]
    pub fn with_timestamps(mut self, set_timestamps: bool) -> Self {
        self.set_timestamps = set_timestamps;
        self
    }

    /// The number of stored entities.
    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }
}

#[async_trait]
impl QueryAdapter for MemoryQueryAdapter {
    async fn find_all(&self, options: &FindOptions) -> Result<Vec<Entity>, AdapterError> {
        let entities = self.entities.read().await;
        let matcher = Matcher::new(&entities);
        let mut matched = Vec::new();
        for entity in entities.values() {
            if matcher.matches(entity, options)? {
                matched.push(entity);
            }
        }
        if let Some(order) = &options.order {
            sort(&mut matched, order);
        }
        let page = matched
            .into_iter()
            .skip(options.offset.unwrap_or(0))
            .take(options.limit.unwrap_or(usize::MAX))
            .collect::<Vec<_>>();
        Framer::new(matcher).frame(&page, options)
    }

    async fn exists(&self, options: &FindOptions) -> Result<bool, AdapterError> {
        Ok(self.count(options).await? > 0)
    }

    async fn count(&self, options: &FindOptions) -> Result<usize, AdapterError> {
        let entities = self.entities.read().await;
        let matcher = Matcher::new(&entities);
        let mut count = 0;
        for entity in entities.values() {
            if matcher.matches(entity, options)? {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn save_all(&self, entities: Vec<Entity>) -> Result<Vec<Entity>, AdapterError> {
        let now = self.set_timestamps.then(now).transpose()?;
        let mut stored = self.entities.write().await;
        let mut saved = Vec::with_capacity(entities.len());
        for mut entity in entities {
            entity.properties = entity
                .properties
                .into_iter()
                .map(|(field, value)| (field, as_stored(value)))
                .collect();
            if let Some(now) = &now {
                entity
                    .properties
                    .entry(dcterms::CREATED.as_str().to_owned())
                    .or_insert_with(|| now.clone());
                entity
                    .properties
                    .insert(dcterms::MODIFIED.as_str().to_owned(), now.clone());
            }
            debug!(id = %entity.id, "Saving entity");
            stored.insert(entity.id.clone(), entity.clone());
            saved.push(entity);
        }
        Ok(saved)
    }

    async fn update_all(
        &self,
        ids: &[String],
        attributes: &Properties,
    ) -> Result<(), AdapterError> {
        let now = self.set_timestamps.then(now).transpose()?;
        let mut stored = self.entities.write().await;
        if let Some(missing) = ids.iter().find(|id| !stored.contains_key(*id)) {
            return Err(AdapterError::not_found(missing.clone()));
        }
        for id in ids {
            let Some(entity) = stored.get_mut(id) else {
                continue;
            };
            debug!(%id, "Updating entity");
            for (field, value) in attributes {
                if field == TYPE_KEY {
                    entity.types = types(value)?;
                } else if matches!(value, Value::Array(values) if values.is_empty()) {
                    entity.properties.remove(field);
                } else {
                    entity
                        .properties
                        .insert(field.clone(), as_stored(value.clone()));
                }
            }
            if let Some(now) = &now {
                entity
                    .properties
                    .insert(dcterms::MODIFIED.as_str().to_owned(), now.clone());
            }
        }
        Ok(())
    }

    async fn destroy_entities(&self, entities: Vec<Entity>) -> Result<Vec<Entity>, AdapterError> {
        let ids = entities.iter().map(|e| e.id.clone()).collect::<Vec<_>>();
        self.delete(&ids).await?;
        Ok(entities)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), AdapterError> {
        let mut stored = self.entities.write().await;
        if let Some(missing) = ids.iter().find(|id| !stored.contains_key(*id)) {
            return Err(AdapterError::not_found(missing.clone()));
        }
        for id in ids {
            debug!(%id, "Deleting entity");
            stored.remove(id);
        }
        Ok(())
    }

    async fn destroy_all(&self) -> Result<(), AdapterError> {
        debug!("Deleting all entities");
        self.entities.write().await.clear();
        Ok(())
    }
}

/// Sorts like `ORDER BY` over optional keys: entities without a value come first in ascending order.
///
/// An entity with several values is ordered by its smallest value ascending, and by its largest value descending.
fn sort(entities: &mut [&Entity], order: &FindOptionsOrder) {
    let keys = entities
        .iter()
        .map(|entity| {
            order
                .iter()
                .map(|(field, direction)| sort_key(entity, field, direction))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let mut indexed = keys.into_iter().zip(entities.iter().copied()).collect::<Vec<_>>();
    indexed.sort_by(|(a, _), (b, _)| {
        a.iter()
            .zip(b)
            .zip(order.iter())
            .map(|((a, b), (_, direction))| {
                let ordering = compare_keys(a.as_ref(), b.as_ref());
                match direction {
                    OrderDirection::Asc => ordering,
                    OrderDirection::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    for (slot, (_, entity)) in entities.iter_mut().zip(indexed) {
        *slot = entity;
    }
}

fn sort_key(entity: &Entity, field: &str, direction: OrderDirection) -> Option<ValueTerm> {
    if field == ID_KEY {
        return Some(ValueTerm::Resource(entity.id.clone()));
    }
    let terms: Vec<ValueTerm> = if field == TYPE_KEY {
        entity.types.iter().cloned().map(ValueTerm::Resource).collect()
    } else {
        entity
            .values(field)
            .into_iter()
            .filter_map(ValueTerm::from_stored_value)
            .collect()
    };
    match direction {
        OrderDirection::Asc => terms.into_iter().min_by(ValueTerm::compare),
        OrderDirection::Desc => terms.into_iter().max_by(ValueTerm::compare),
    }
}

fn compare_keys(a: Option<&ValueTerm>, b: Option<&ValueTerm>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.compare(b),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

/// Embedded entities are stored as references, their own properties belong to their own entry.
fn as_stored(value: Value) -> Value {
    match value {
        Value::Entity(entity) => Value::Reference(entity.id),
        Value::Array(values) => Value::Array(values.into_iter().map(as_stored).collect()),
        Value::List(values) => Value::List(values.into_iter().map(as_stored).collect()),
        Value::Node(mut node) => {
            node.properties = node
                .properties
                .into_iter()
                .map(|(field, value)| (field, as_stored(value)))
                .collect();
            Value::Node(node)
        }
        value => value,
    }
}

fn types(value: &Value) -> Result<Vec<String>, AdapterError> {
    value
        .values()
        .into_iter()
        .map(|value| match value {
            Value::String(type_) => Ok(type_.clone()),
            value => value
                .id()
                .map(str::to_owned)
                .ok_or_else(|| AdapterError::from(QueryBuildError::unsupported_value(TYPE_KEY))),
        })
        .collect()
}

fn now() -> Result<Value, AdapterError> {
    let now = OffsetDateTime::now_utc().format(&Rfc3339)?;
    Ok(TypedLiteral::new(now, xsd::DATE_TIME.as_str()).into())
}
