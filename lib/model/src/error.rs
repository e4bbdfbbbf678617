use oxrdf::IriParseError;
use thiserror::Error;

/// An error raised while building or converting model values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A value that must identify a resource is not an absolute IRI.
    #[error("Invalid IRI '{iri}': {error}")]
    InvalidIri {
        /// The IRI itself.
        iri: String,
        /// The parsing error.
        #[source]
        error: IriParseError,
    },
    /// A language-tagged literal carries a malformed tag.
    #[error("Invalid language tag '{tag}'")]
    InvalidLanguageTag {
        /// The offending tag.
        tag: String,
    },
    /// A JSON document does not have the shape of an entity or of find-options.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl ModelError {
    pub(crate) fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }
}

/// An operator was used in a position where it has no meaning.
///
/// Raised by every consumer of find-options (the query compiler and the in-memory matcher).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UnsupportedOperatorError {
    #[error("Unsupported operator \"{0}\"")]
    Operator(&'static str),
    #[error("Unsupported {parent} sub operator \"{operator}\"")]
    SubOperator {
        parent: &'static str,
        operator: &'static str,
    },
}
