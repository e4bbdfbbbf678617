use crate::error::EndpointError;
use async_trait::async_trait;
use oxttl::NTriplesParser;
use rdf_entity_model::Triple;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use sparesults::{
    QueryResultsFormat, QueryResultsParser, QuerySolution, ReaderQueryResultsParserOutput,
};
use std::fmt::{Debug, Formatter};
use tracing::trace;

const RESULTS_JSON: &str = "application/sparql-results+json";
const N_TRIPLES: &str = "application/n-triples";

/// A SPARQL 1.1 endpoint answering queries and updates.
///
/// Implementations return the complete, buffered answer. Errors are reported verbatim and never retried.
#[async_trait]
pub trait SparqlEndpoint: Send + Sync {
    /// Evaluates a `SELECT` query.
    async fn select(&self, query: &str) -> Result<Vec<QuerySolution>, EndpointError>;

    /// Evaluates a `CONSTRUCT` query.
    async fn construct(&self, query: &str) -> Result<Vec<Triple>, EndpointError>;

    /// Evaluates an `ASK` query.
    async fn ask(&self, query: &str) -> Result<bool, EndpointError>;

    /// Executes an update request.
    async fn update(&self, update: &str) -> Result<(), EndpointError>;
}

/// Talks to a remote endpoint with the SPARQL 1.1 protocol.
///
/// Queries and updates are sent as URL-encoded form posts. Solutions are requested as SPARQL JSON results, and
/// constructed graphs as N-Triples.
#[derive(Clone)]
pub struct HttpSparqlEndpoint {
    client: Client,
    query_url: String,
    update_url: String,
}

impl HttpSparqlEndpoint {
    /// Creates an endpoint that sends both queries and updates to `endpoint_url`.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        let query_url = endpoint_url.into();
        Self {
            client: Client::new(),
            update_url: query_url.clone(),
            query_url,
        }
    }

    #[must_use]
    pub fn with_update_url(mut self, update_url: impl Into<String>) -> Self {
        self.update_url = update_url.into();
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn post(
        &self,
        url: &str,
        field: &'static str,
        body: &str,
        accept: Option<&'static str>,
    ) -> Result<Vec<u8>, EndpointError> {
        trace!(url, "Sending {field} request");
        let mut request = self.client.post(url).form(&[(field, body)]);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        let response = checked(request.send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl Debug for HttpSparqlEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSparqlEndpoint")
            .field("query_url", &self.query_url)
            .field("update_url", &self.update_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SparqlEndpoint for HttpSparqlEndpoint {
    async fn select(&self, query: &str) -> Result<Vec<QuerySolution>, EndpointError> {
        let body = self
            .post(&self.query_url, "query", query, Some(RESULTS_JSON))
            .await?;
        let solutions = parse_solutions(&body)?;
        trace!(rows = solutions.len(), "Received solutions");
        Ok(solutions)
    }

    async fn construct(&self, query: &str) -> Result<Vec<Triple>, EndpointError> {
        let body = self
            .post(&self.query_url, "query", query, Some(N_TRIPLES))
            .await?;
        let triples = NTriplesParser::new()
            .for_reader(body.as_slice())
            .collect::<Result<Vec<_>, _>>()?;
        trace!(triples = triples.len(), "Received triples");
        Ok(triples)
    }

    async fn ask(&self, query: &str) -> Result<bool, EndpointError> {
        let body = self
            .post(&self.query_url, "query", query, Some(RESULTS_JSON))
            .await?;
        match parser_output(&body)? {
            ReaderQueryResultsParserOutput::Boolean(result) => Ok(result),
            ReaderQueryResultsParserOutput::Solutions(_) => Err(EndpointError::Other(
                "Expected a boolean answer, got solutions".into(),
            )),
        }
    }

    async fn update(&self, update: &str) -> Result<(), EndpointError> {
        self.post(&self.update_url, "update", update, None).await?;
        Ok(())
    }
}

async fn checked(response: Response) -> Result<Response, EndpointError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    Err(EndpointError::Status {
        status: status.as_u16(),
        body,
    })
}

fn parser_output(body: &[u8]) -> Result<ReaderQueryResultsParserOutput<&[u8]>, EndpointError> {
    Ok(QueryResultsParser::from_format(QueryResultsFormat::Json).for_reader(body)?)
}

fn parse_solutions(body: &[u8]) -> Result<Vec<QuerySolution>, EndpointError> {
    match parser_output(body)? {
        ReaderQueryResultsParserOutput::Solutions(solutions) => {
            Ok(solutions.collect::<Result<Vec<_>, _>>()?)
        }
        ReaderQueryResultsParserOutput::Boolean(_) => Err(EndpointError::Other(
            "Expected solutions, got a boolean answer".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_solutions() -> Result<(), EndpointError> {
        let body = br#"{
            "head": { "vars": ["count"] },
            "results": { "bindings": [
                { "count": { "type": "literal", "value": "3", "datatype": "http://www.w3.org/2001/XMLSchema#integer" } }
            ] }
        }"#;
        let solutions = parse_solutions(body)?;
        assert_eq!(solutions.len(), 1);
        let count = solutions[0].get("count").map(ToString::to_string);
        assert_eq!(
            count.as_deref(),
            Some("\"3\"^^<http://www.w3.org/2001/XMLSchema#integer>")
        );
        Ok(())
    }

    #[test]
    fn boolean_is_not_a_solution_sequence() {
        let body = br#"{ "head": {}, "boolean": true }"#;
        assert!(matches!(
            parse_solutions(body),
            Err(EndpointError::Other(_))
        ));
    }

    #[test]
    fn debug_hides_the_client() {
        let endpoint = HttpSparqlEndpoint::new("http://localhost:9999/sparql")
            .with_update_url("http://localhost:9999/update");
        insta::assert_snapshot!(format!("{endpoint:?}"), @r#"HttpSparqlEndpoint { query_url: "http://localhost:9999/sparql", update_url: "http://localhost:9999/update", .. }"#);
    }
}
