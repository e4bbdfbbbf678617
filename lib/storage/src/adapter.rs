use crate::error::AdapterError;
use async_trait::async_trait;
use rdf_entity_model::{Entity, FindOptions, FindOptionsWhere, Properties};

/// Persists entities and answers find-options queries about them.
///
/// Every adapter interprets find-options the same way, so that callers may swap the backend without changing results.
#[async_trait]
pub trait QueryAdapter: Send + Sync {
    /// Returns the first entity matching `options`, if any.
    async fn find(&self, options: &FindOptions) -> Result<Option<Entity>, AdapterError> {
        let options = options.clone().with_limit(1);
        Ok(self.find_all(&options).await?.into_iter().next())
    }

    /// Returns the first entity matching `where`, if any.
    async fn find_by(&self, r#where: &FindOptionsWhere) -> Result<Option<Entity>, AdapterError> {
        self.find(&FindOptions::new().with_where(r#where.clone()))
            .await
    }

    /// Returns every entity matching `options`, in the requested order.
    async fn find_all(&self, options: &FindOptions) -> Result<Vec<Entity>, AdapterError>;

    /// Returns every entity matching `where`.
    async fn find_all_by(
        &self,
        r#where: &FindOptionsWhere,
    ) -> Result<Vec<Entity>, AdapterError> {
        self.find_all(&FindOptions::new().with_where(r#where.clone()))
            .await
    }

    /// Returns whether any entity matches `options`.
    async fn exists(&self, options: &FindOptions) -> Result<bool, AdapterError>;

    /// Counts the entities matching `options`, ignoring limit and offset.
    async fn count(&self, options: &FindOptions) -> Result<usize, AdapterError>;

    /// Inserts `entity` or replaces the stored entity with the same id.
    async fn save(&self, entity: Entity) -> Result<Entity, AdapterError> {
        let mut saved = self.save_all(vec![entity]).await?;
        saved
            .pop()
            .ok_or_else(|| AdapterError::InvalidResults("Nothing was saved".to_owned()))
    }

    /// Inserts or replaces all `entities` at once.
    async fn save_all(&self, entities: Vec<Entity>) -> Result<Vec<Entity>, AdapterError>;

    /// Replaces the values of the given attributes of the entity `id`.
    async fn update(&self, id: &str, attributes: &Properties) -> Result<(), AdapterError> {
        self.update_all(&[id.to_owned()], attributes).await
    }

    /// Replaces the values of the given attributes of every entity in `ids`.
    ///
    /// Attributes set to an empty array are removed. Other attributes keep their values.
    async fn update_all(&self, ids: &[String], attributes: &Properties)
        -> Result<(), AdapterError>;

    /// Removes `entity`.
    async fn destroy(&self, entity: Entity) -> Result<Entity, AdapterError> {
        let mut destroyed = self.destroy_entities(vec![entity]).await?;
        destroyed
            .pop()
            .ok_or_else(|| AdapterError::InvalidResults("Nothing was destroyed".to_owned()))
    }

    /// Removes all `entities` at once.
    async fn destroy_entities(&self, entities: Vec<Entity>) -> Result<Vec<Entity>, AdapterError>;

    /// Removes the entities with the given ids.
    async fn delete(&self, ids: &[String]) -> Result<(), AdapterError>;

    /// Removes every entity.
    async fn destroy_all(&self) -> Result<(), AdapterError>;
}
