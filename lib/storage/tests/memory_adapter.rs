use rdf_entity_model::vocab::{dcterms, rdfs};
use rdf_entity_model::{
    Entity, FindOperator, FindOptions, FindOptionsOrder, FindOptionsRelations, FindOptionsSelect,
    FindOptionsWhere, OrderDirection, Properties, SelectValue, Value, TYPE_KEY,
};
use rdf_entity_storage::{AdapterError, MemoryQueryAdapter, QueryAdapter};

const FILE: &str = "https://example.com/File";
const INTEGRATION: &str = "https://example.com/Integration";
const NAME: &str = "https://example.com/name";
const INTEGRATION_FIELD: &str = "https://example.com/integration";
const SIZE: &str = "https://example.com/size";
const RANK: &str = "https://example.com/rank";

fn id(name: &str) -> String {
    format!("https://example.com/data/{name}")
}

fn files_and_box() -> MemoryQueryAdapter {
    MemoryQueryAdapter::new([
        Entity::new(id("A")).with_type(FILE),
        Entity::new(id("B"))
            .with_type(FILE)
            .with_property(INTEGRATION_FIELD, Value::reference(id("Box"))),
        Entity::new(id("Box"))
            .with_type(INTEGRATION)
            .with_property(NAME, "Box"),
    ])
}

fn ranked() -> MemoryQueryAdapter {
    MemoryQueryAdapter::new([
        Entity::new(id("first"))
            .with_type(FILE)
            .with_property(RANK, 1)
            .with_property(SIZE, vec![10, 20, 30]),
        Entity::new(id("second")).with_type(FILE).with_property(RANK, 2),
        Entity::new(id("third"))
            .with_type(FILE)
            .with_property(RANK, 3)
            .with_property(SIZE, 5),
    ])
}

fn ids(entities: &[Entity]) -> Vec<String> {
    entities.iter().map(|entity| entity.id.clone()).collect()
}

fn by_rank() -> FindOptions {
    FindOptions::new().with_order(FindOptionsOrder::new().with(RANK, OrderDirection::Asc))
}

#[tokio::test]
async fn test_find_by_nested_where() {
    let adapter = files_and_box();
    let options = FindOptions::new().with_where(
        FindOptionsWhere::new()
            .with(TYPE_KEY, FILE)
            .with(INTEGRATION_FIELD, FindOptionsWhere::new().with(NAME, "Box")),
    );

    let found = adapter.find(&options).await.unwrap();

    assert_eq!(found.map(|entity| entity.id), Some(id("B")));
}

#[tokio::test]
async fn test_find_without_match_is_none() {
    let adapter = files_and_box();
    let r#where = FindOptionsWhere::new().with(NAME, "Dropbox");

    assert_eq!(adapter.find_by(&r#where).await.unwrap(), None);
    assert!(adapter.find_all_by(&r#where).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_subclass_closure() {
    let adapter = MemoryQueryAdapter::new([
        Entity::new("https://example.com/A")
            .with_property(rdfs::SUB_CLASS_OF.as_str(), Value::reference("https://example.com/B")),
        Entity::new("https://example.com/B")
            .with_property(rdfs::SUB_CLASS_OF.as_str(), Value::reference("https://example.com/C")),
        Entity::new(id("instance")).with_type("https://example.com/A"),
    ]);
    let options = FindOptions::new()
        .with_where(FindOptionsWhere::new().with(TYPE_KEY, "https://example.com/C"));

    let found = adapter.find_all(&options).await.unwrap();

    assert_eq!(ids(&found), [id("instance")]);
}

#[tokio::test]
async fn test_pagination() {
    let adapter = ranked();

    let first = adapter.find_all(&by_rank().with_limit(1)).await.unwrap();
    let rest = adapter.find_all(&by_rank().with_offset(1)).await.unwrap();
    let second = adapter
        .find_all(&by_rank().with_offset(1).with_limit(1))
        .await
        .unwrap();

    assert_eq!(ids(&first), [id("first")]);
    assert_eq!(ids(&rest), [id("second"), id("third")]);
    assert_eq!(ids(&second), [id("second")]);
}

#[tokio::test]
async fn test_order_puts_missing_values_first() {
    let adapter = ranked();
    let ascending =
        FindOptions::new().with_order(FindOptionsOrder::new().with(SIZE, OrderDirection::Asc));
    let descending =
        FindOptions::new().with_order(FindOptionsOrder::new().with(SIZE, OrderDirection::Desc));

    let ascending = adapter.find_all(&ascending).await.unwrap();
    let descending = adapter.find_all(&descending).await.unwrap();

    assert_eq!(ids(&ascending), [id("second"), id("third"), id("first")]);
    assert_eq!(ids(&descending), [id("first"), id("third"), id("second")]);
}

#[tokio::test]
async fn test_operator_truth_table() {
    let adapter = ranked();
    let matching = |operator: FindOperator| {
        FindOptions::new().with_where(FindOptionsWhere::new().with(SIZE, operator))
    };

    let equal = adapter.find_all(&matching(FindOperator::equal(10))).await.unwrap();
    let in_values = adapter
        .find_all(&matching(FindOperator::in_values([10, 40])))
        .await
        .unwrap();
    let not_in = adapter
        .find_all(&matching(FindOperator::not(FindOperator::in_values([10, 40]))))
        .await
        .unwrap();
    let not_equal = adapter.find_all(&matching(FindOperator::not(50))).await.unwrap();

    assert_eq!(ids(&equal), [id("first")]);
    assert_eq!(ids(&in_values), [id("first")]);
    assert_eq!(ids(&not_in), [id("second"), id("third")]);
    assert_eq!(ids(&not_equal), [id("first"), id("second"), id("third")]);
}

#[tokio::test]
async fn test_range_operators_are_unsupported() {
    let adapter = ranked();
    let options = FindOptions::new().with_where(FindOptionsWhere::new().with(RANK, FindOperator::lt(3)));

    let error = adapter.find_all(&options).await.unwrap_err();

    assert!(matches!(error, AdapterError::Operator(_)));
    assert_eq!(error.to_string(), "Unsupported operator \"lt\"");
}

#[tokio::test]
async fn test_count_and_exists_ignore_pagination() {
    let adapter = ranked();
    let options = FindOptions::new()
        .with_where(FindOptionsWhere::new().with(TYPE_KEY, FILE))
        .with_limit(1);

    assert_eq!(adapter.count(&options).await.unwrap(), 3);
    assert!(adapter.exists(&options).await.unwrap());
    assert!(!adapter
        .exists(&FindOptions::new().with_where(FindOptionsWhere::new().with(TYPE_KEY, INTEGRATION)))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_relations_embed_the_related_entity() {
    let adapter = files_and_box();
    let options = FindOptions::new()
        .with_where(FindOptionsWhere::new().with(TYPE_KEY, FILE))
        .with_relations(FindOptionsRelations::new().with(INTEGRATION_FIELD, true));

    let found = adapter.find_all(&options).await.unwrap();

    assert_eq!(ids(&found), [id("A"), id("B")]);
    let Some(Value::Entity(integration)) = found[1].get(INTEGRATION_FIELD) else {
        panic!("the integration is not embedded: {:?}", found[1]);
    };
    assert_eq!(integration.get(NAME), Some(&Value::from("Box")));
}

#[tokio::test]
async fn test_inverse_relation_is_added_under_its_alias() {
    let adapter = files_and_box();
    let options = FindOptions::new()
        .with_where(FindOptionsWhere::new().with(TYPE_KEY, INTEGRATION))
        .with_relations(FindOptionsRelations::new().with(
            "files",
            FindOperator::inverse_relation(INTEGRATION_FIELD, None),
        ));

    let found = adapter.find_all(&options).await.unwrap();

    assert_eq!(ids(&found), [id("Box")]);
    let Some(Value::Entity(file)) = found[0].get("files") else {
        panic!("the files are not embedded: {:?}", found[0]);
    };
    assert_eq!(file.id, id("B"));
}

#[tokio::test]
async fn test_select_projects_properties() {
    let adapter = ranked();
    let options = by_rank()
        .with_limit(1)
        .with_select(FindOptionsSelect::new().with(RANK, SelectValue::Include(true)));

    let found = adapter.find_all(&options).await.unwrap();

    assert_eq!(
        found,
        [Entity::new(id("first")).with_type(FILE).with_property(RANK, 1)]
    );
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let adapter = files_and_box();

    let direct = adapter
        .find_all(&FindOptions::new().with_search("box", false))
        .await
        .unwrap();
    let through_relations = adapter
        .find_all(
            &FindOptions::new()
                .with_where(FindOptionsWhere::new().with(TYPE_KEY, FILE))
                .with_relations(FindOptionsRelations::new().with(INTEGRATION_FIELD, true))
                .with_search("BOX", true),
        )
        .await
        .unwrap();

    assert_eq!(ids(&direct), [id("Box")]);
    assert_eq!(ids(&through_relations), [id("B")]);
}

#[tokio::test]
async fn test_save_replaces_the_entity() {
    let adapter = ranked();
    let replacement = Entity::new(id("first")).with_type(FILE).with_property(RANK, 7);

    adapter.save(replacement.clone()).await.unwrap();
    adapter.save(replacement.clone()).await.unwrap();

    let found = adapter
        .find_by(&FindOptionsWhere::new().with("id", id("first")))
        .await
        .unwrap();
    assert_eq!(found, Some(replacement));
    assert_eq!(adapter.len().await, 3);
}

#[tokio::test]
async fn test_save_stores_embedded_entities_as_references() {
    let adapter = MemoryQueryAdapter::default();
    let embedded = Entity::new(id("Box")).with_property(NAME, "Box");

    let saved = adapter
        .save(Entity::new(id("B")).with_property(INTEGRATION_FIELD, embedded))
        .await
        .unwrap();

    assert_eq!(saved.get(INTEGRATION_FIELD), Some(&Value::reference(id("Box"))));
    assert_eq!(adapter.len().await, 1);
}

#[tokio::test]
async fn test_save_sets_timestamps() {
    let adapter = MemoryQueryAdapter::default().with_timestamps(true);
    let created = Value::from(rdf_entity_model::TypedLiteral::new(
        "2020-01-01T00:00:00Z",
        "http://www.w3.org/2001/XMLSchema#dateTime",
    ));

    let saved = adapter
        .save(Entity::new(id("A")).with_property(dcterms::CREATED.as_str(), created.clone()))
        .await
        .unwrap();

    assert_eq!(saved.get(dcterms::CREATED.as_str()), Some(&created));
    assert!(matches!(
        saved.get(dcterms::MODIFIED.as_str()),
        Some(Value::Literal(literal)) if literal.datatype.as_deref() == Some("http://www.w3.org/2001/XMLSchema#dateTime")
    ));
}

#[tokio::test]
async fn test_update_keeps_other_attributes() {
    let adapter = ranked();
    let attributes = Properties::from([
        (RANK.to_owned(), Value::from(9)),
        (SIZE.to_owned(), Value::Array(Vec::new())),
    ]);

    adapter.update(&id("first"), &attributes).await.unwrap();

    let found = adapter
        .find_by(&FindOptionsWhere::new().with("id", id("first")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.types, [FILE]);
    assert_eq!(found.get(RANK), Some(&Value::from(9)));
    assert_eq!(found.get(SIZE), None);
}

#[tokio::test]
async fn test_update_of_unknown_entity_fails() {
    let adapter = ranked();
    let attributes = Properties::from([(RANK.to_owned(), Value::from(9))]);

    let error = adapter
        .update_all(&[id("first"), id("missing")], &attributes)
        .await
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "Entity with id https://example.com/data/missing does not exist"
    );
    let first = adapter.find_by(&FindOptionsWhere::new().with("id", id("first"))).await.unwrap();
    assert_eq!(first.and_then(|e| e.get(RANK).cloned()), Some(Value::from(1)));
}

#[tokio::test]
async fn test_destroy() {
    let adapter = ranked();

    let destroyed = adapter.destroy(Entity::new(id("first"))).await.unwrap();
    assert_eq!(destroyed.id, id("first"));
    assert_eq!(adapter.len().await, 2);

    let error = adapter.destroy(Entity::new(id("first"))).await.unwrap_err();
    assert!(matches!(error, AdapterError::NotFound { .. }));

    adapter.delete(&[id("second")]).await.unwrap();
    assert_eq!(adapter.len().await, 1);

    adapter.destroy_all().await.unwrap();
    assert!(adapter.is_empty().await);
}
