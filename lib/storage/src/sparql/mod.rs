//! The adapter persisting entities in a SPARQL endpoint, one named graph per entity.

mod materialize;

use crate::adapter::QueryAdapter;
use crate::endpoint::SparqlEndpoint;
use crate::error::AdapterError;
use async_trait::async_trait;
use materialize::materialize;
use rdf_entity_model::{Entity, FindOptions, NamedNode, Properties, Term, Triple};
use rdf_entity_sparql::{
    EntityQuery, EntityUpdateBuilder, SparqlDialect, COUNT_VARIABLE, ENTITY_VARIABLE,
};
use sparesults::QuerySolution;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

/// Compiles every operation into a single SPARQL query or update for the endpoint.
///
/// Ordered queries returning more than one entity, and queries embedding related entities, first select the matching
/// ids and then fetch exactly these entities. All other queries fetch the entities with one `CONSTRUCT`.
#[derive(Clone)]
pub struct SparqlQueryAdapter {
    endpoint: Arc<dyn SparqlEndpoint>,
    dialect: SparqlDialect,
    set_timestamps: bool,
}

impl SparqlQueryAdapter {
    pub fn new(endpoint: Arc<dyn SparqlEndpoint>, dialect: SparqlDialect) -> Self {
        Self {
            endpoint,
            dialect,
            set_timestamps: false,
        }
    }

    /// Stamps `dcterms:created` and `dcterms:modified` on every write.
    #[must_use]
    pub fn with_timestamps(mut self, set_timestamps: bool) -> Self {
        self.set_timestamps = set_timestamps;
        self
    }

    pub fn dialect(&self) -> SparqlDialect {
        self.dialect
    }

    /// Runs a `SELECT` query as is.
    pub async fn execute_raw_query(&self, query: &str) -> Result<Vec<QuerySolution>, AdapterError> {
        debug!("Executing query: {query}");
        Ok(self.endpoint.select(query).await?)
    }

    /// Runs a `CONSTRUCT` query as is.
    pub async fn execute_raw_constructed_query(
        &self,
        query: &str,
    ) -> Result<Vec<Triple>, AdapterError> {
        debug!("Executing query: {query}");
        Ok(self.endpoint.construct(query).await?)
    }

    /// Runs an update as is.
    pub async fn execute_raw_update(&self, update: &str) -> Result<(), AdapterError> {
        debug!("Executing update: {update}");
        Ok(self.endpoint.update(update).await?)
    }

    /// The ordered ids of the current page.
    async fn select_ids(&self, query: &EntityQuery) -> Result<Vec<NamedNode>, AdapterError> {
        let solutions = self
            .execute_raw_query(&query.entity_selection_query().to_string())
            .await?;
        Ok(solutions
            .iter()
            .filter_map(|solution| match solution.get(ENTITY_VARIABLE) {
                Some(Term::NamedNode(id)) => Some(id.clone()),
                _ => None,
            })
            .collect())
    }
}

impl Debug for SparqlQueryAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparqlQueryAdapter")
            .field("dialect", &self.dialect)
            .field("set_timestamps", &self.set_timestamps)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl QueryAdapter for SparqlQueryAdapter {
    async fn find_all(&self, options: &FindOptions) -> Result<Vec<Entity>, AdapterError> {
        let query = EntityQuery::build(self.dialect, options)?;
        if query.requires_pre_selection() {
            debug!("Pre-selecting the matching entities");
            let mut ids = self.select_ids(&query).await?;
            if !query.is_ordered() {
                ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            }
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let triples = self
                .execute_raw_constructed_query(&query.construct_query_for(&ids).to_string())
                .await?;
            materialize(triples, options, Some(&ids))
        } else {
            debug!("Fetching the entities directly");
            let triples = self
                .execute_raw_constructed_query(&query.construct_query().to_string())
                .await?;
            materialize(triples, options, None)
        }
    }

    async fn exists(&self, options: &FindOptions) -> Result<bool, AdapterError> {
        let query = EntityQuery::build(self.dialect, options)?.ask_query().to_string();
        debug!("Executing query: {query}");
        Ok(self.endpoint.ask(&query).await?)
    }

    async fn count(&self, options: &FindOptions) -> Result<usize, AdapterError> {
        let query = EntityQuery::build(self.dialect, options)?.count_query();
        let solutions = self.execute_raw_query(&query.to_string()).await?;
        let count = solutions
            .first()
            .and_then(|solution| solution.get(COUNT_VARIABLE));
        match count {
            Some(Term::Literal(count)) => count.value().parse().map_err(|_| {
                AdapterError::InvalidResults(format!("{count} is not a valid count"))
            }),
            Some(term) => Err(AdapterError::InvalidResults(format!(
                "{term} is not a valid count"
            ))),
            None => Ok(0),
        }
    }

    async fn save_all(&self, entities: Vec<Entity>) -> Result<Vec<Entity>, AdapterError> {
        let update = EntityUpdateBuilder::new(self.set_timestamps).build_save(&entities)?;
        if !update.is_empty() {
            self.execute_raw_update(&update.to_string()).await?;
        }
        Ok(entities)
    }

    async fn update_all(
        &self,
        ids: &[String],
        attributes: &Properties,
    ) -> Result<(), AdapterError> {
        let update = EntityUpdateBuilder::new(self.set_timestamps).build_update(ids, attributes)?;
        if update.is_empty() {
            return Ok(());
        }
        self.execute_raw_update(&update.to_string()).await
    }

    async fn destroy_entities(&self, entities: Vec<Entity>) -> Result<Vec<Entity>, AdapterError> {
        let update = EntityUpdateBuilder::build_delete(entities.iter().map(|e| e.id.as_str()))?;
        if !update.is_empty() {
            self.execute_raw_update(&update.to_string()).await?;
        }
        Ok(entities)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), AdapterError> {
        let update = EntityUpdateBuilder::build_delete(ids.iter().map(String::as_str))?;
        if update.is_empty() {
            return Ok(());
        }
        self.execute_raw_update(&update.to_string()).await
    }

    async fn destroy_all(&self) -> Result<(), AdapterError> {
        self.execute_raw_update(&EntityUpdateBuilder::build_delete_all().to_string())
            .await
    }
}
