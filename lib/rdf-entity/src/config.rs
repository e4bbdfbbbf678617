//! Opens a [`QueryAdapter`] from a JSON configuration.
//!
//! ```json
//! { "type": "sparql", "endpointUrl": "http://localhost:7878/query", "updateUrl": "http://localhost:7878/update" }
//! ```

use crate::error::ConfigError;
use rdf_entity_model::Entity;
use rdf_entity_sparql::SparqlDialect;
use rdf_entity_storage::{HttpSparqlEndpoint, MemoryQueryAdapter, QueryAdapter, SparqlQueryAdapter};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Selects and configures the backend of an adapter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AdapterConfig {
    /// Keeps the entities in memory.
    Memory {
        /// The initial entities, for example the class hierarchy.
        #[serde(default, alias = "schemas")]
        entities: Vec<Entity>,
        #[serde(default)]
        set_timestamps: bool,
    },
    /// A SPARQL 1.1 endpoint.
    Sparql {
        endpoint_url: Option<String>,
        /// Defaults to `endpoint_url`.
        update_url: Option<String>,
        #[serde(default)]
        set_timestamps: bool,
    },
    /// A Blazegraph endpoint, enabling full-text search.
    Blazegraph {
        endpoint_url: Option<String>,
        update_url: Option<String>,
        #[serde(default)]
        set_timestamps: bool,
    },
}

impl AdapterConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Memory { .. } => "memory",
            Self::Sparql { .. } => "sparql",
            Self::Blazegraph { .. } => "blazegraph",
        }
    }
}

/// Creates the adapter described by `config`.
pub fn open_adapter(config: AdapterConfig) -> Result<Box<dyn QueryAdapter>, ConfigError> {
    debug!("Opening {} adapter", config.name());
    let dialect = config.name();
    match config {
        AdapterConfig::Memory {
            entities,
            set_timestamps,
        } => Ok(Box::new(
            MemoryQueryAdapter::new(entities).with_timestamps(set_timestamps),
        )),
        AdapterConfig::Sparql {
            endpoint_url,
            update_url,
            set_timestamps,
        } => Ok(sparql_adapter(
            SparqlDialect::Standard,
            endpoint_url.ok_or(ConfigError::MissingEndpointUrl { dialect })?,
            update_url,
            set_timestamps,
        )),
        AdapterConfig::Blazegraph {
            endpoint_url,
            update_url,
            set_timestamps,
        } => Ok(sparql_adapter(
            SparqlDialect::Blazegraph,
            endpoint_url.ok_or(ConfigError::MissingEndpointUrl { dialect })?,
            update_url,
            set_timestamps,
        )),
    }
}

fn sparql_adapter(
    dialect: SparqlDialect,
    endpoint_url: String,
    update_url: Option<String>,
    set_timestamps: bool,
) -> Box<dyn QueryAdapter> {
    let mut endpoint = HttpSparqlEndpoint::new(endpoint_url);
    if let Some(update_url) = update_url {
        endpoint = endpoint.with_update_url(update_url);
    }
    Box::new(SparqlQueryAdapter::new(Arc::new(endpoint), dialect).with_timestamps(set_timestamps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_entity_model::FindOptions;

    #[test]
    fn parses_a_graph_configuration() -> Result<(), ConfigError> {
        let config = AdapterConfig::from_json(
            r#"{ "type": "blazegraph", "endpointUrl": "http://localhost:9999/blazegraph/sparql", "setTimestamps": true }"#,
        )?;
        assert_eq!(
            config,
            AdapterConfig::Blazegraph {
                endpoint_url: Some("http://localhost:9999/blazegraph/sparql".to_owned()),
                update_url: None,
                set_timestamps: true,
            }
        );
        Ok(())
    }

    #[test]
    fn missing_endpoint_url_is_an_error() -> Result<(), ConfigError> {
        let config = AdapterConfig::from_json(r#"{ "type": "sparql" }"#)?;
        let error = open_adapter(config).err().map(|e| e.to_string());
        assert_eq!(
            error.as_deref(),
            Some("The sparql adapter requires an endpointUrl")
        );
        Ok(())
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(matches!(
            AdapterConfig::from_json(r#"{ "type": "fuseki" }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[tokio::test]
    async fn memory_adapter_is_seeded_with_schemas() -> Result<(), Box<dyn std::error::Error>> {
        let config = AdapterConfig::from_json(
            r#"{
                "type": "memory",
                "schemas": [
                    { "id": "https://example.com/File", "type": "http://www.w3.org/2000/01/rdf-schema#Class" },
                    { "id": "https://example.com/Folder", "type": "http://www.w3.org/2000/01/rdf-schema#Class" }
                ]
            }"#,
        )?;
        let adapter = open_adapter(config)?;
        assert_eq!(adapter.count(&FindOptions::new()).await?, 2);
        Ok(())
    }
}
