use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};
use std::collections::BTreeMap;

/// The reserved key holding the identifier of an entity.
pub const ID_KEY: &str = "id";
/// The reserved key holding the type(s) of an entity.
pub const TYPE_KEY: &str = "type";

const VALUE_KEYWORD: &str = "@value";
const DATATYPE_KEYWORD: &str = "@type";
const LANGUAGE_KEYWORD: &str = "@language";
const LIST_KEYWORD: &str = "@list";

/// The properties of an entity or of an anonymous node, keyed by predicate.
pub type Properties = BTreeMap<String, Value>;

/// An identified, typed document whose own triples live in the named graph of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JsonValue", into = "JsonValue")]
pub struct Entity {
    pub id: String,
    pub types: Vec<String>,
    pub properties: Properties,
}

impl Entity {
    /// Creates an entity without types or properties.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            types: Vec::new(),
            properties: Properties::new(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.types.push(type_.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, predicate: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(predicate.into(), value.into());
        self
    }

    pub fn get(&self, predicate: &str) -> Option<&Value> {
        self.properties.get(predicate)
    }

    /// Returns every value of `predicate`, flattening multi-valued properties.
    pub fn values(&self, predicate: &str) -> Vec<&Value> {
        self.properties
            .get(predicate)
            .map(Value::values)
            .unwrap_or_default()
    }

    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        map.insert(ID_KEY.to_owned(), JsonValue::String(self.id.clone()));
        if let Some(types) = types_to_json(&self.types) {
            map.insert(TYPE_KEY.to_owned(), types);
        }
        properties_to_json(&self.properties, &mut map);
        JsonValue::Object(map)
    }

    pub fn from_json(json: &JsonValue) -> Result<Self, ModelError> {
        match json {
            JsonValue::Object(map) => Self::from_json_object(map),
            _ => Err(ModelError::invalid_document("an entity must be a JSON object")),
        }
    }

    fn from_json_object(map: &Map<String, JsonValue>) -> Result<Self, ModelError> {
        let Some(JsonValue::String(id)) = map.get(ID_KEY) else {
            return Err(ModelError::invalid_document(
                "an entity requires a string \"id\"",
            ));
        };
        Ok(Self {
            id: id.clone(),
            types: types_from_json(map.get(TYPE_KEY))?,
            properties: properties_from_json(map)?,
        })
    }
}

impl TryFrom<JsonValue> for Entity {
    type Error = ModelError;

    fn try_from(json: JsonValue) -> Result<Self, Self::Error> {
        Self::from_json(&json)
    }
}

impl From<Entity> for JsonValue {
    fn from(entity: Entity) -> Self {
        entity.to_json()
    }
}

/// An anonymous (blank) node nested inside an entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub types: Vec<String>,
    pub properties: Properties,
}

impl Node {
    #[must_use]
    pub fn with_property(mut self, predicate: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(predicate.into(), value.into());
        self
    }

    fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        if let Some(types) = types_to_json(&self.types) {
            map.insert(TYPE_KEY.to_owned(), types);
        }
        properties_to_json(&self.properties, &mut map);
        JsonValue::Object(map)
    }
}

/// A literal with an explicit datatype or language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypedLiteral {
    pub value: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl TypedLiteral {
    pub fn new(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn new_language_tagged(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    fn from_json_object(map: &Map<String, JsonValue>) -> Result<Self, ModelError> {
        let value = match map.get(VALUE_KEYWORD) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            Some(JsonValue::Bool(b)) => b.to_string(),
            _ => {
                return Err(ModelError::invalid_document(
                    "\"@value\" must be a string, number or boolean",
                ))
            }
        };
        Ok(Self {
            value,
            datatype: optional_string(map, DATATYPE_KEYWORD)?,
            language: optional_string(map, LANGUAGE_KEYWORD)?,
        })
    }

    fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        map.insert(VALUE_KEYWORD.to_owned(), JsonValue::String(self.value.clone()));
        if let Some(datatype) = &self.datatype {
            map.insert(DATATYPE_KEYWORD.to_owned(), JsonValue::String(datatype.clone()));
        }
        if let Some(language) = &self.language {
            map.insert(LANGUAGE_KEYWORD.to_owned(), JsonValue::String(language.clone()));
        }
        JsonValue::Object(map)
    }
}

/// The value of an entity property.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Literal(TypedLiteral),
    /// A link to another entity, `{ "id": ... }`.
    Reference(String),
    /// Another entity embedded in this document. Persisted as a reference only.
    Entity(Box<Entity>),
    /// An anonymous node, persisted as a blank node subtree.
    Node(Box<Node>),
    /// An ordered RDF list.
    List(Vec<Value>),
    /// Several values for the same predicate.
    Array(Vec<Value>),
}

impl Value {
    pub fn reference(id: impl Into<String>) -> Self {
        Self::Reference(id.into())
    }

    /// Returns the identifier this value points to, if it is a reference or an embedded entity.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Reference(id) => Some(id),
            Self::Entity(entity) => Some(&entity.id),
            _ => None,
        }
    }

    /// Returns the individual values, flattening (nested) arrays.
    pub fn values(&self) -> Vec<&Value> {
        match self {
            Self::Array(values) => values.iter().flat_map(Value::values).collect(),
            value => vec![value],
        }
    }

    pub fn from_json(json: &JsonValue) -> Result<Self, ModelError> {
        match json {
            JsonValue::Null => Err(ModelError::invalid_document("null is not a value")),
            JsonValue::Bool(b) => Ok(Self::Boolean(*b)),
            JsonValue::Number(n) => Ok(number_value(n)),
            JsonValue::String(s) => Ok(Self::String(s.clone())),
            JsonValue::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<_, _>>()
                .map(Self::Array),
            JsonValue::Object(map) => Self::from_json_object(map),
        }
    }

    pub(crate) fn from_json_object(map: &Map<String, JsonValue>) -> Result<Self, ModelError> {
        if map.contains_key(VALUE_KEYWORD) {
            return TypedLiteral::from_json_object(map).map(Self::Literal);
        }
        if let Some(list) = map.get(LIST_KEYWORD) {
            return match list {
                JsonValue::Array(items) => items
                    .iter()
                    .map(Self::from_json)
                    .collect::<Result<_, _>>()
                    .map(Self::List),
                item => Ok(Self::List(vec![Self::from_json(item)?])),
            };
        }
        match map.get(ID_KEY) {
            Some(JsonValue::String(id)) if map.len() == 1 => Ok(Self::Reference(id.clone())),
            Some(_) => Entity::from_json_object(map).map(|e| Self::Entity(Box::new(e))),
            None => Ok(Self::Node(Box::new(Node {
                types: types_from_json(map.get(TYPE_KEY))?,
                properties: properties_from_json(map)?,
            }))),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Boolean(b) => JsonValue::Bool(*b),
            Self::Integer(i) => JsonValue::Number((*i).into()),
            Self::Double(d) => Number::from_f64(*d).map_or_else(
                || TypedLiteral::new(d.to_string(), crate::vocab::xsd::DOUBLE.as_str()).to_json(),
                JsonValue::Number,
            ),
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Literal(literal) => literal.to_json(),
            Self::Reference(id) => {
                let mut map = Map::new();
                map.insert(ID_KEY.to_owned(), JsonValue::String(id.clone()));
                JsonValue::Object(map)
            }
            Self::Entity(entity) => entity.to_json(),
            Self::Node(node) => node.to_json(),
            Self::List(items) => {
                let mut map = Map::new();
                map.insert(
                    LIST_KEYWORD.to_owned(),
                    JsonValue::Array(items.iter().map(Value::to_json).collect()),
                );
                JsonValue::Object(map)
            }
            Self::Array(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<TypedLiteral> for Value {
    fn from(value: TypedLiteral) -> Self {
        Self::Literal(value)
    }
}

impl From<Entity> for Value {
    fn from(value: Entity) -> Self {
        Self::Entity(Box::new(value))
    }
}

impl From<Node> for Value {
    fn from(value: Node) -> Self {
        Self::Node(Box::new(value))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

fn number_value(number: &Number) -> Value {
    match number.as_i64() {
        Some(i) => Value::Integer(i),
        None => Value::Double(number.as_f64().unwrap_or(f64::NAN)),
    }
}

fn optional_string(
    map: &Map<String, JsonValue>,
    key: &str,
) -> Result<Option<String>, ModelError> {
    match map.get(key) {
        None => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ModelError::invalid_document(format!(
            "\"{key}\" must be a string"
        ))),
    }
}

pub(crate) fn types_from_json(json: Option<&JsonValue>) -> Result<Vec<String>, ModelError> {
    match json {
        None => Ok(Vec::new()),
        Some(JsonValue::String(t)) => Ok(vec![t.clone()]),
        Some(JsonValue::Array(types)) => types
            .iter()
            .map(|t| match t {
                JsonValue::String(t) => Ok(t.clone()),
                _ => Err(ModelError::invalid_document("types must be strings")),
            })
            .collect(),
        Some(_) => Err(ModelError::invalid_document(
            "\"type\" must be a string or an array of strings",
        )),
    }
}

fn types_to_json(types: &[String]) -> Option<JsonValue> {
    match types {
        [] => None,
        [single] => Some(JsonValue::String(single.clone())),
        types => Some(JsonValue::Array(
            types.iter().cloned().map(JsonValue::String).collect(),
        )),
    }
}

fn properties_from_json(map: &Map<String, JsonValue>) -> Result<Properties, ModelError> {
    map.iter()
        .filter(|(key, value)| key.as_str() != ID_KEY && key.as_str() != TYPE_KEY && !value.is_null())
        .map(|(key, value)| Ok((key.clone(), Value::from_json(value)?)))
        .collect()
}

fn properties_to_json(properties: &Properties, map: &mut Map<String, JsonValue>) {
    for (predicate, value) in properties {
        map.insert(predicate.clone(), value.to_json());
    }
}
