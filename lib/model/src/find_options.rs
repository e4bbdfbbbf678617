use crate::error::ModelError;
use crate::operator::{is_operator, FindOperator};
use crate::value::Value;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A structured query over entities.
///
/// The same options are understood by every adapter. Graph adapters compile them to a query, the in-memory adapter
/// evaluates them directly.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "JsonValue")]
pub struct FindOptions {
    pub r#where: Option<FindOptionsWhere>,
    pub order: Option<FindOptionsOrder>,
    pub relations: Option<FindOptionsRelations>,
    pub select: Option<FindOptionsSelect>,
    /// Full-text search. Only supported by adapters with a search service.
    pub search: Option<String>,
    /// Whether `search` also matches the properties of the entities reachable through `relations`.
    pub search_relations: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Returns every resource of the result as a flat entity instead of framing nested documents.
    pub skip_framing: bool,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_where(mut self, r#where: FindOptionsWhere) -> Self {
        self.r#where = Some(r#where);
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: FindOptionsOrder) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub fn with_relations(mut self, relations: FindOptionsRelations) -> Self {
        self.relations = Some(relations);
        self
    }

    #[must_use]
    pub fn with_select(mut self, select: FindOptionsSelect) -> Self {
        self.select = Some(select);
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>, search_relations: bool) -> Self {
        self.search = Some(search.into());
        self.search_relations = search_relations;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_skip_framing(mut self, skip_framing: bool) -> Self {
        self.skip_framing = skip_framing;
        self
    }

    pub fn from_json(json: &JsonValue) -> Result<Self, ModelError> {
        let map = as_object(json, "find options")?;
        let search = match map.get("search") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(search)) => Some(search.clone()),
            Some(_) => return Err(ModelError::invalid_document("\"search\" must be a string")),
        };
        Ok(Self {
            r#where: optional(map, "where", FindOptionsWhere::from_json)?,
            order: optional(map, "order", FindOptionsOrder::from_json)?,
            relations: optional(map, "relations", FindOptionsRelations::from_json)?,
            select: optional(map, "select", FindOptionsSelect::from_json)?,
            search,
            search_relations: flag(map, "searchRelations")?,
            limit: optional(map, "limit", |v| count(v, "limit"))?,
            offset: optional(map, "offset", |v| count(v, "offset"))?,
            skip_framing: flag(map, "skipFraming")?,
        })
    }
}

impl TryFrom<JsonValue> for FindOptions {
    type Error = ModelError;

    fn try_from(json: JsonValue) -> Result<Self, Self::Error> {
        Self::from_json(&json)
    }
}

/// Field constraints. Every entry must hold for an entity to match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptionsWhere(BTreeMap<String, WhereValue>);

/// The constraint on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereValue {
    Value(Value),
    /// Every element must match.
    Array(Vec<WhereValue>),
    /// Constraints on the entity the field points to.
    Nested(FindOptionsWhere),
    Operator(FindOperator),
}

impl FindOptionsWhere {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<WhereValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&WhereValue> {
        self.0.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WhereValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json(json: &JsonValue) -> Result<Self, ModelError> {
        as_object(json, "where")?
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(field, value)| Ok((field.clone(), WhereValue::from_json(value)?)))
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

impl WhereValue {
    pub fn is_operator(&self) -> bool {
        matches!(self, Self::Operator(_))
    }

    fn from_json(json: &JsonValue) -> Result<Self, ModelError> {
        match json {
            json if is_operator(json) => FindOperator::from_json(json).map(Self::Operator),
            JsonValue::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<_, _>>()
                .map(Self::Array),
            JsonValue::Object(map) if map.contains_key("@value") || map.contains_key("@list") => {
                Value::from_json_object(map).map(Self::Value)
            }
            JsonValue::Object(_) => FindOptionsWhere::from_json(json).map(Self::Nested),
            json => Value::from_json(json).map(Self::Value),
        }
    }
}

impl From<Value> for WhereValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<FindOperator> for WhereValue {
    fn from(operator: FindOperator) -> Self {
        Self::Operator(operator)
    }
}

impl From<FindOptionsWhere> for WhereValue {
    fn from(nested: FindOptionsWhere) -> Self {
        Self::Nested(nested)
    }
}

impl From<&str> for WhereValue {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}

impl From<String> for WhereValue {
    fn from(value: String) -> Self {
        Self::Value(value.into())
    }
}

impl From<i64> for WhereValue {
    fn from(value: i64) -> Self {
        Self::Value(value.into())
    }
}

impl From<i32> for WhereValue {
    fn from(value: i32) -> Self {
        Self::Value(value.into())
    }
}

impl From<bool> for WhereValue {
    fn from(value: bool) -> Self {
        Self::Value(value.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl FromStr for OrderDirection {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" | "ASC" => Ok(Self::Asc),
            "desc" | "DESC" => Ok(Self::Desc),
            s => Err(ModelError::invalid_document(format!(
                "invalid order direction \"{s}\""
            ))),
        }
    }
}

/// Ordering keys, most significant first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptionsOrder(Vec<(String, OrderDirection)>);

impl FindOptionsOrder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.0.push((field.into(), direction));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, OrderDirection)> {
        self.0.iter().map(|(field, direction)| (field.as_str(), *direction))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json(json: &JsonValue) -> Result<Self, ModelError> {
        as_object(json, "order")?
            .iter()
            .map(|(field, direction)| match direction {
                JsonValue::String(direction) => Ok((field.clone(), direction.parse()?)),
                _ => Err(ModelError::invalid_document(
                    "order directions must be strings",
                )),
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

/// The related entities to embed into each result, keyed by predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptionsRelations(BTreeMap<String, RelationValue>);

#[derive(Debug, Clone, PartialEq)]
pub enum RelationValue {
    Include(bool),
    Nested(FindOptionsRelations),
    /// Only [`FindOperator::InverseRelation`] is meaningful here.
    Operator(FindOperator),
}

impl FindOptionsRelations {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<RelationValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RelationValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json(json: &JsonValue) -> Result<Self, ModelError> {
        as_object(json, "relations")?
            .iter()
            .map(|(field, value)| {
                let value = match value {
                    JsonValue::Bool(include) => RelationValue::Include(*include),
                    value if is_operator(value) => {
                        RelationValue::Operator(FindOperator::from_json(value)?)
                    }
                    value @ JsonValue::Object(_) => {
                        RelationValue::Nested(FindOptionsRelations::from_json(value)?)
                    }
                    _ => {
                        return Err(ModelError::invalid_document(
                            "relations must be booleans, objects or operators",
                        ))
                    }
                };
                Ok((field.clone(), value))
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

impl From<bool> for RelationValue {
    fn from(include: bool) -> Self {
        Self::Include(include)
    }
}

impl From<FindOptionsRelations> for RelationValue {
    fn from(nested: FindOptionsRelations) -> Self {
        Self::Nested(nested)
    }
}

impl From<FindOperator> for RelationValue {
    fn from(operator: FindOperator) -> Self {
        Self::Operator(operator)
    }
}

/// The properties to keep from each result, keyed by predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptionsSelect(BTreeMap<String, SelectValue>);

#[derive(Debug, Clone, PartialEq)]
pub enum SelectValue {
    Include(bool),
    Nested(FindOptionsSelect),
}

impl FindOptionsSelect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects each of `fields` without nesting.
    pub fn fields<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self(
            fields
                .into_iter()
                .map(|field| (field.into(), SelectValue::Include(true)))
                .collect(),
        )
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: SelectValue) -> Self {
        self.0.insert(field.into(), value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SelectValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, field: &str) -> Option<&SelectValue> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json(json: &JsonValue) -> Result<Self, ModelError> {
        match json {
            JsonValue::Array(fields) => fields
                .iter()
                .map(|field| match field {
                    JsonValue::String(field) => Ok(field.clone()),
                    _ => Err(ModelError::invalid_document("selected fields must be strings")),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::fields),
            json => as_object(json, "select")?
                .iter()
                .map(|(field, value)| {
                    let value = match value {
                        JsonValue::Bool(include) => SelectValue::Include(*include),
                        value => SelectValue::Nested(FindOptionsSelect::from_json(value)?),
                    };
                    Ok((field.clone(), value))
                })
                .collect::<Result<_, _>>()
                .map(Self),
        }
    }
}

fn as_object<'a>(
    json: &'a JsonValue,
    what: &str,
) -> Result<&'a Map<String, JsonValue>, ModelError> {
    json.as_object()
        .ok_or_else(|| ModelError::invalid_document(format!("\"{what}\" must be an object")))
}

fn optional<T>(
    map: &Map<String, JsonValue>,
    key: &str,
    parse: impl FnOnce(&JsonValue) -> Result<T, ModelError>,
) -> Result<Option<T>, ModelError> {
    match map.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => parse(value).map(Some),
    }
}

fn flag(map: &Map<String, JsonValue>, key: &str) -> Result<bool, ModelError> {
    match map.get(key) {
        None | Some(JsonValue::Null) => Ok(false),
        Some(JsonValue::Bool(flag)) => Ok(*flag),
        Some(_) => Err(ModelError::invalid_document(format!(
            "\"{key}\" must be a boolean"
        ))),
    }
}

fn count(json: &JsonValue, key: &str) -> Result<usize, ModelError> {
    json.as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            ModelError::invalid_document(format!("\"{key}\" must be a non-negative integer"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_complete_request() -> Result<(), ModelError> {
        let options: FindOptions = serde_json::from_value(json!({
            "where": {
                "type": "https://example.com/File",
                "https://example.com/integration": { "https://example.com/name": "Box" },
                "https://example.com/size": { "type": "operator", "operator": "gt", "value": 3 },
            },
            "order": { "https://example.com/name": "DESC", "id": "asc" },
            "relations": {
                "https://example.com/integration": true,
                "folders": {
                    "type": "operator",
                    "operator": "inverseRelation",
                    "value": { "resolvedName": "https://example.com/parent" },
                },
            },
            "select": ["https://example.com/name"],
            "search": "report",
            "searchRelations": true,
            "limit": 10,
            "offset": 5,
        }))
        .map_err(|e| ModelError::InvalidDocument(e.to_string()))?;

        let r#where = options.r#where.unwrap_or_default();
        assert_eq!(r#where.len(), 3);
        assert_eq!(
            r#where.get("https://example.com/integration"),
            Some(&WhereValue::Nested(
                FindOptionsWhere::new().with("https://example.com/name", "Box")
            ))
        );
        assert!(r#where
            .get("https://example.com/size")
            .is_some_and(WhereValue::is_operator));
        assert_eq!(
            options.order.unwrap_or_default().iter().collect::<Vec<_>>(),
            vec![
                ("https://example.com/name", OrderDirection::Desc),
                ("id", OrderDirection::Asc)
            ]
        );
        assert_eq!(
            options
                .relations
                .unwrap_or_default()
                .iter()
                .map(|(field, _)| field)
                .collect::<Vec<_>>(),
            vec!["folders", "https://example.com/integration"]
        );
        assert!(options.search_relations);
        assert_eq!((options.limit, options.offset), (Some(10), Some(5)));
        assert!(!options.skip_framing);
        Ok(())
    }

    #[test]
    fn typed_literals_are_values_not_nested_constraints() -> Result<(), ModelError> {
        let r#where = FindOptionsWhere::from_json(&json!({
            "https://example.com/label": { "@value": "Bericht", "@language": "de" },
        }))?;
        assert!(matches!(
            r#where.get("https://example.com/label"),
            Some(WhereValue::Value(Value::Literal(_)))
        ));
        Ok(())
    }

    #[test]
    fn rejects_unknown_order_directions() {
        let result = FindOptionsOrder::from_json(&json!({ "id": "up" }));
        assert!(matches!(result, Err(ModelError::InvalidDocument(_))));
    }
}
