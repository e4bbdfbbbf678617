use oxttl::TurtleParseError;
use rdf_entity_model::{ModelError, UnsupportedOperatorError};
use rdf_entity_sparql::QueryBuildError;
use sparesults::QueryResultsParseError;
use std::error::Error;

/// A failure of the transport to the SPARQL endpoint.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EndpointError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("The endpoint answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Results(#[from] QueryResultsParseError),
    #[error(transparent)]
    Triples(#[from] TurtleParseError),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync>),
}

/// An error returned by a [`QueryAdapter`](crate::QueryAdapter).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AdapterError {
    #[error(transparent)]
    Build(#[from] QueryBuildError),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error(transparent)]
    Operator(#[from] UnsupportedOperatorError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Entity with id {id} does not exist")]
    NotFound { id: String },
    #[error("Invalid query results: {0}")]
    InvalidResults(String),
    #[error(transparent)]
    Timestamp(#[from] time::error::Format),
}

impl AdapterError {
    pub(crate) fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}
