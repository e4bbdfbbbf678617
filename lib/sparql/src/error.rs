use rdf_entity_model::{ModelError, UnsupportedOperatorError};
use thiserror::Error;

/// An error raised while compiling find-options or entity writes into SPARQL.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QueryBuildError {
    #[error(transparent)]
    Operator(#[from] UnsupportedOperatorError),
    /// An id, type or predicate is not an IRI, or a literal is malformed.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// The value of `field` has no SPARQL term (e.g. a list used as a where value).
    #[error("Unsupported value for field \"{field}\"")]
    UnsupportedValue { field: String },
    /// `field` cannot be used in this position (e.g. a nested where on `id`).
    #[error("Unsupported field \"{field}\"")]
    UnsupportedField { field: String },
    /// Full-text search requires a dialect with a search service.
    #[error("Full-text search is not supported by this SPARQL dialect")]
    UnsupportedSearch,
}

impl QueryBuildError {
    pub fn unsupported_value(field: &str) -> Self {
        Self::UnsupportedValue {
            field: field.to_owned(),
        }
    }

    pub fn unsupported_field(field: &str) -> Self {
        Self::UnsupportedField {
            field: field.to_owned(),
        }
    }
}
