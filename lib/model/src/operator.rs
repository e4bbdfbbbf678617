use crate::error::{ModelError, UnsupportedOperatorError};
use crate::find_options::FindOptionsRelations;
use crate::value::Value;
use serde_json::Value as JsonValue;

/// A tagged comparison or combinator usable in place of a literal in a where-clause.
#[derive(Debug, Clone, PartialEq)]
pub enum FindOperator {
    Equal(Operand),
    /// Matches everything the operand does not match, including subjects without any value.
    Not(Operand),
    In(Vec<Value>),
    GreaterThan(Value),
    GreaterThanOrEqual(Value),
    LessThan(Value),
    LessThanOrEqual(Value),
    /// Matches the operand against the subjects pointing *to* the entity through the predicate.
    Inverse(Operand),
    InverseRelation(InverseRelation),
}

/// The operand of [`FindOperator::Equal`], [`FindOperator::Not`] and [`FindOperator::Inverse`].
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    Operator(Box<FindOperator>),
}

/// Traverses `resolved_name` backwards, i.e. from the objects to the subjects of the predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseRelation {
    pub resolved_name: String,
    pub relations: Option<FindOptionsRelations>,
}

impl FindOperator {
    pub fn equal(operand: impl Into<Operand>) -> Self {
        Self::Equal(operand.into())
    }

    pub fn not(operand: impl Into<Operand>) -> Self {
        Self::Not(operand.into())
    }

    pub fn in_values<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::In(values.into_iter().map(Into::into).collect())
    }

    pub fn gt(value: impl Into<Value>) -> Self {
        Self::GreaterThan(value.into())
    }

    pub fn gte(value: impl Into<Value>) -> Self {
        Self::GreaterThanOrEqual(value.into())
    }

    pub fn lt(value: impl Into<Value>) -> Self {
        Self::LessThan(value.into())
    }

    pub fn lte(value: impl Into<Value>) -> Self {
        Self::LessThanOrEqual(value.into())
    }

    pub fn inverse(operand: impl Into<Operand>) -> Self {
        Self::Inverse(operand.into())
    }

    pub fn inverse_relation(
        resolved_name: impl Into<String>,
        relations: Option<FindOptionsRelations>,
    ) -> Self {
        Self::InverseRelation(InverseRelation {
            resolved_name: resolved_name.into(),
            relations,
        })
    }

    /// The tag of the operator as it appears in serialized find-options.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Equal(_) => "equal",
            Self::Not(_) => "not",
            Self::In(_) => "in",
            Self::GreaterThan(_) => "gt",
            Self::GreaterThanOrEqual(_) => "gte",
            Self::LessThan(_) => "lt",
            Self::LessThanOrEqual(_) => "lte",
            Self::Inverse(_) => "inverse",
            Self::InverseRelation(_) => "inverseRelation",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Equal(_) => "Equal",
            Self::Not(_) => "Not",
            Self::In(_) => "In",
            Self::GreaterThan(_) => "GreaterThan",
            Self::GreaterThanOrEqual(_) => "GreaterThanOrEqual",
            Self::LessThan(_) => "LessThan",
            Self::LessThanOrEqual(_) => "LessThanOrEqual",
            Self::Inverse(_) => "Inverse",
            Self::InverseRelation(_) => "InverseRelation",
        }
    }

    /// The error for using this operator where it is not supported.
    pub fn unsupported(&self) -> UnsupportedOperatorError {
        UnsupportedOperatorError::Operator(self.tag())
    }

    /// The error for nesting this operator inside `parent` where that is not supported.
    pub fn unsupported_in(&self, parent: &FindOperator) -> UnsupportedOperatorError {
        UnsupportedOperatorError::SubOperator {
            parent: parent.name(),
            operator: self.tag(),
        }
    }

    /// Parses `{ "type": "operator", "operator": "<tag>", "value": ... }`.
    pub fn from_json(json: &JsonValue) -> Result<Self, ModelError> {
        let Some(tag) = json.get("operator").and_then(JsonValue::as_str) else {
            return Err(ModelError::invalid_document("an operator requires an \"operator\" tag"));
        };
        let value = json.get("value").unwrap_or(&JsonValue::Null);
        match tag {
            "equal" => Ok(Self::Equal(Operand::from_json(value)?)),
            "not" => Ok(Self::Not(Operand::from_json(value)?)),
            "in" => match value {
                JsonValue::Array(values) => values
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<_, _>>()
                    .map(Self::In),
                _ => Err(ModelError::invalid_document("\"in\" requires an array")),
            },
            "gt" => Ok(Self::GreaterThan(Value::from_json(value)?)),
            "gte" => Ok(Self::GreaterThanOrEqual(Value::from_json(value)?)),
            "lt" => Ok(Self::LessThan(Value::from_json(value)?)),
            "lte" => Ok(Self::LessThanOrEqual(Value::from_json(value)?)),
            "inverse" => Ok(Self::Inverse(Operand::from_json(value)?)),
            "inverseRelation" => {
                let Some(resolved_name) = value.get("resolvedName").and_then(JsonValue::as_str)
                else {
                    return Err(ModelError::invalid_document(
                        "\"inverseRelation\" requires a \"resolvedName\"",
                    ));
                };
                let relations = value
                    .get("relations")
                    .map(FindOptionsRelations::from_json)
                    .transpose()?;
                Ok(Self::inverse_relation(resolved_name, relations))
            }
            tag => Err(ModelError::invalid_document(format!(
                "unknown operator \"{tag}\""
            ))),
        }
    }
}

impl Operand {
    fn from_json(json: &JsonValue) -> Result<Self, ModelError> {
        if is_operator(json) {
            FindOperator::from_json(json).map(Self::from)
        } else {
            Value::from_json(json).map(Self::Value)
        }
    }
}

impl From<FindOperator> for Operand {
    fn from(operator: FindOperator) -> Self {
        Self::Operator(Box::new(operator))
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

macro_rules! operand_from_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Operand {
                fn from(value: $t) -> Self {
                    Self::Value(value.into())
                }
            }
        )*
    };
}

operand_from_value!(bool, i32, i64, f64, &str, String);

/// Returns whether a JSON value is a serialized [`FindOperator`] rather than a literal.
pub fn is_operator(json: &JsonValue) -> bool {
    json.get("type").and_then(JsonValue::as_str) == Some("operator")
        && json.get("operator").is_some_and(JsonValue::is_string)
}
