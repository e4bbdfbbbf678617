use crate::error::ModelError;
use crate::value::{TypedLiteral, Value};
use crate::vocab::{rdf, xsd};
use oxiri::Iri;
use oxrdf::{Literal, NamedNode, Term};
use std::cmp::Ordering;

/// The canonical term a [`Value`] stands for.
///
/// Both the graph-query compiler and the in-memory matcher compare values through this type, which is what keeps the
/// two backends in agreement on literal equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueTerm {
    Resource(String),
    Literal {
        value: String,
        datatype: String,
        language: Option<String>,
    },
}

impl ValueTerm {
    pub fn literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// Resolves a value given in a where-clause.
    ///
    /// A string is a resource if and only if it parses as an absolute IRI.
    pub fn from_where_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if is_absolute_iri(s) => Some(Self::Resource(s.clone())),
            value => Self::from_stored_value(value),
        }
    }

    /// Resolves a value held by an entity. Plain strings are always literals.
    pub fn from_stored_value(value: &Value) -> Option<Self> {
        match value {
            Value::Boolean(b) => Some(Self::literal(b.to_string(), xsd::BOOLEAN.as_str())),
            Value::Integer(i) => Some(Self::literal(i.to_string(), xsd::INTEGER.as_str())),
            Value::Double(d) => Some(double_term(*d)),
            Value::String(s) => Some(Self::literal(s.clone(), xsd::STRING.as_str())),
            Value::Literal(literal) => Some(Self::from(literal)),
            Value::Reference(id) => Some(Self::Resource(id.clone())),
            Value::Entity(entity) => Some(Self::Resource(entity.id.clone())),
            Value::Node(_) | Value::List(_) | Value::Array(_) => None,
        }
    }

    pub fn to_rdf_term(&self) -> Result<Term, ModelError> {
        match self {
            Self::Resource(iri) => named_node(iri).map(Term::from),
            Self::Literal {
                value,
                language: Some(language),
                ..
            } => Literal::new_language_tagged_literal(value.as_str(), language.as_str())
                .map(Term::from)
                .map_err(|_| ModelError::InvalidLanguageTag {
                    tag: language.clone(),
                }),
            Self::Literal {
                value, datatype, ..
            } => Ok(Literal::new_typed_literal(value.as_str(), named_node(datatype)?).into()),
        }
    }

    /// Returns the numeric value of numeric literals.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Literal {
                value, datatype, ..
            } if is_numeric_datatype(datatype) => value.parse().ok(),
            _ => None,
        }
    }

    /// The lexical form of the term.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Resource(iri) => iri,
            Self::Literal { value, .. } => value,
        }
    }

    /// Orders terms the way graph-query `ORDER BY` does for the cases entities use: numbers numerically, everything
    /// else by lexical form.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => self.as_str().cmp(other.as_str()),
        }
    }
}

impl From<&TypedLiteral> for ValueTerm {
    fn from(literal: &TypedLiteral) -> Self {
        match (&literal.language, &literal.datatype) {
            (Some(language), _) => Self::Literal {
                value: literal.value.clone(),
                datatype: rdf::LANG_STRING.as_str().to_owned(),
                language: Some(language.to_ascii_lowercase()),
            },
            (None, Some(datatype)) => Self::literal(literal.value.clone(), datatype.clone()),
            (None, None) => Self::literal(literal.value.clone(), xsd::STRING.as_str()),
        }
    }
}

/// Parses `iri` into a [`NamedNode`].
pub fn named_node(iri: &str) -> Result<NamedNode, ModelError> {
    NamedNode::new(iri).map_err(|error| ModelError::InvalidIri {
        iri: iri.to_owned(),
        error,
    })
}

pub fn is_absolute_iri(s: &str) -> bool {
    Iri::parse(s).is_ok()
}

fn double_term(d: f64) -> ValueTerm {
    if !d.is_finite() {
        let lexical = if d.is_nan() {
            "NaN"
        } else if d > 0.0 {
            "INF"
        } else {
            "-INF"
        };
        return ValueTerm::literal(lexical, xsd::DOUBLE.as_str());
    }
    if d.fract() == 0.0 && d.abs() < 9.0e15 {
        return ValueTerm::literal(integral_lexical(d), xsd::INTEGER.as_str());
    }
    ValueTerm::literal(d.to_string(), xsd::DECIMAL.as_str())
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Only called for integral values within the i64 range"
)]
fn integral_lexical(d: f64) -> String {
    (d as i64).to_string()
}

fn is_numeric_datatype(datatype: &str) -> bool {
    [
        xsd::INTEGER,
        xsd::DECIMAL,
        xsd::DOUBLE,
        xsd::FLOAT,
        xsd::INT,
        xsd::LONG,
        xsd::SHORT,
        xsd::NON_NEGATIVE_INTEGER,
        xsd::POSITIVE_INTEGER,
    ]
    .iter()
    .any(|numeric| numeric.as_str() == datatype)
}
