use rdf_entity_model::{
    FindOperator, FindOptions, FindOptionsOrder, FindOptionsRelations, FindOptionsSelect,
    FindOptionsWhere, NamedNode, OrderDirection, SelectValue,
};
use rdf_entity_sparql::{EntityQuery, QueryBuildError, SparqlDialect};
use spargebra::Query;
use std::error::Error;

const FILE: &str = "https://example.com/File";
const NAME: &str = "https://example.com/name";

fn build(options: &FindOptions) -> Result<EntityQuery, QueryBuildError> {
    EntityQuery::build(SparqlDialect::Standard, options)
}

fn assert_valid(query: &str) {
    if let Err(error) = Query::parse(query, None) {
        panic!("invalid query: {error}\n{query}");
    }
}

#[test]
fn test_find_by_id_binds_the_subject() -> Result<(), Box<dyn Error>> {
    let options = FindOptions::new()
        .with_where(FindOptionsWhere::new().with("id", "https://example.com/file/1"));
    let query = build(&options)?;
    assert!(!query.requires_pre_selection());

    let construct = query.construct_query().to_string();
    assert_valid(&construct);
    insta::assert_snapshot!(construct, @r"
    CONSTRUCT {
      ?subject ?predicate ?object .
    } WHERE {
      VALUES ?entity { <https://example.com/file/1> }
      GRAPH ?entity {
        ?subject ?predicate ?object .
      }
    }
    ");
    Ok(())
}

#[test]
fn test_pinned_ids_must_be_stored_to_be_counted() -> Result<(), Box<dyn Error>> {
    let options = FindOptions::new().with_where(
        FindOptionsWhere::new().with("id", FindOperator::in_values(["https://example.com/file/1"])),
    );
    let query = build(&options)?;

    let ask = query.ask_query().to_string();
    assert_valid(&ask);
    insta::assert_snapshot!(ask, @r"
    ASK WHERE {
      VALUES ?entity { <https://example.com/file/1> }
      GRAPH ?entity {
        ?entity ?predicate ?object .
      }
    }
    ");

    let count = query.count_query().to_string();
    assert_valid(&count);
    assert!(count.contains("GRAPH ?entity {"));
    Ok(())
}

#[test]
fn test_related_entities_are_pre_selected() -> Result<(), Box<dyn Error>> {
    let relations = FindOptions::new()
        .with_where(FindOptionsWhere::new().with("type", FILE))
        .with_relations(FindOptionsRelations::new().with("https://example.com/knows", true))
        .with_limit(1);
    assert!(build(&relations)?.requires_pre_selection());

    let nested_select = FindOptions::new().with_select(
        FindOptionsSelect::fields([NAME]).with(
            "https://example.com/knows",
            SelectValue::Nested(FindOptionsSelect::fields([NAME])),
        ),
    );
    assert!(build(&nested_select)?.requires_pre_selection());

    let flat_select = FindOptions::new().with_select(FindOptionsSelect::fields([NAME]));
    assert!(!build(&flat_select)?.requires_pre_selection());
    Ok(())
}

#[test]
fn test_nested_where_and_type_closure() -> Result<(), Box<dyn Error>> {
    let options = FindOptions::new().with_where(
        FindOptionsWhere::new().with("type", FILE).with(
            "https://example.com/integration",
            FindOptionsWhere::new().with(NAME, "Box"),
        ),
    );

    let construct = build(&options)?.construct_query().to_string();
    assert_valid(&construct);
    insta::assert_snapshot!(construct, @r#"
    CONSTRUCT {
      ?subject ?predicate ?object .
    } WHERE {
      ?entity <https://example.com/integration> ?c1 .
      ?c1 <https://example.com/name> "Box" .
      ?entity <http://www.w3.org/1999/02/22-rdf-syntax-ns#type>/<http://www.w3.org/2000/01/rdf-schema#subClassOf>* <https://example.com/File> .
      GRAPH ?entity {
        ?subject ?predicate ?object .
      }
    }
    "#);
    Ok(())
}

#[test]
fn test_ordered_pages_are_pre_selected() -> Result<(), Box<dyn Error>> {
    let options = FindOptions::new()
        .with_where(FindOptionsWhere::new().with("type", FILE))
        .with_order(FindOptionsOrder::new().with(NAME, OrderDirection::Desc))
        .with_limit(2)
        .with_offset(1);
    let query = build(&options)?;
    assert!(query.requires_pre_selection());

    let selection = query.entity_selection_query().to_string();
    assert_valid(&selection);
    insta::assert_snapshot!(selection, @r"
    SELECT DISTINCT ?entity WHERE {
      ?entity <http://www.w3.org/1999/02/22-rdf-syntax-ns#type>/<http://www.w3.org/2000/01/rdf-schema#subClassOf>* <https://example.com/File> .
      OPTIONAL {
        ?entity <https://example.com/name> ?c1 .
      }
    }
    ORDER BY DESC(?c1)
    LIMIT 2
    OFFSET 1
    ");

    let ids = [
        NamedNode::new("https://example.com/file/2")?,
        NamedNode::new("https://example.com/file/3")?,
    ];
    let construct = query.construct_query_for(&ids).to_string();
    assert_valid(&construct);
    insta::assert_snapshot!(construct, @r"
    CONSTRUCT {
      ?subject ?predicate ?object .
    } WHERE {
      VALUES ?entity { <https://example.com/file/2> <https://example.com/file/3> }
      GRAPH ?entity {
        ?subject ?predicate ?object .
      }
    }
    ");
    Ok(())
}

#[test]
fn test_single_ordered_result_uses_a_sub_select() -> Result<(), Box<dyn Error>> {
    let options = FindOptions::new()
        .with_order(FindOptionsOrder::new().with(NAME, OrderDirection::Asc))
        .with_limit(1);
    let query = build(&options)?;
    assert!(!query.requires_pre_selection());

    let construct = query.construct_query().to_string();
    assert_valid(&construct);
    insta::assert_snapshot!(construct, @r"
    CONSTRUCT {
      ?subject ?predicate ?object .
    } WHERE {
      {
        SELECT DISTINCT ?entity WHERE {
          GRAPH ?entity {
            ?entity ?c1 ?c2 .
          }
          OPTIONAL {
            ?entity <https://example.com/name> ?c3 .
          }
        }
        ORDER BY ?c3
        LIMIT 1
      }
      GRAPH ?entity {
        ?subject ?predicate ?object .
      }
    }
    ");
    Ok(())
}

#[test]
fn test_operators_on_fields_and_ids() -> Result<(), Box<dyn Error>> {
    let options = FindOptions::new().with_where(
        FindOptionsWhere::new()
            .with("https://example.com/size", FindOperator::in_values([1, 4]))
            .with(
                "https://example.com/tag",
                FindOperator::not(FindOperator::equal("draft")),
            )
            .with("https://example.com/score", FindOperator::gte(3))
            .with(
                "id",
                FindOperator::not(FindOperator::in_values(["https://example.com/a"])),
            ),
    );

    let count = build(&options)?.count_query().to_string();
    assert_valid(&count);
    insta::assert_snapshot!(count, @r#"
    SELECT (COUNT(DISTINCT ?entity) AS ?count) WHERE {
      ?entity <https://example.com/score> ?c1 .
      ?entity <https://example.com/size> ?c2 .
      VALUES ?c2 { "1"^^<http://www.w3.org/2001/XMLSchema#integer> "4"^^<http://www.w3.org/2001/XMLSchema#integer> }
      FILTER(?c1 >= "3"^^<http://www.w3.org/2001/XMLSchema#integer>)
      FILTER(NOT EXISTS { ?entity <https://example.com/tag> ?c3 . FILTER(?c3 = "draft") })
      FILTER(?entity NOT IN (<https://example.com/a>))
    }
    "#);
    Ok(())
}

#[test]
fn test_excluded_type_still_binds_the_entity() -> Result<(), Box<dyn Error>> {
    let options = FindOptions::new().with_where(
        FindOptionsWhere::new().with("type", FindOperator::not("https://example.com/Folder")),
    );

    let ask = build(&options)?.ask_query().to_string();
    assert_valid(&ask);
    insta::assert_snapshot!(ask, @r"
    ASK WHERE {
      GRAPH ?entity {
        ?entity ?c1 ?c2 .
      }
      FILTER(NOT EXISTS { ?entity <http://www.w3.org/1999/02/22-rdf-syntax-ns#type>/<http://www.w3.org/2000/01/rdf-schema#subClassOf>* <https://example.com/Folder> . })
    }
    ");
    Ok(())
}

#[test]
fn test_search_over_relations() -> Result<(), Box<dyn Error>> {
    let options = FindOptions::new()
        .with_where(FindOptionsWhere::new().with("type", FILE))
        .with_relations(
            FindOptionsRelations::new()
                .with("https://example.com/integration", true)
                .with(
                    "folders",
                    FindOperator::inverse_relation("https://example.com/contains", None),
                ),
        )
        .with_search("report", true);

    let query = EntityQuery::build(SparqlDialect::Blazegraph, &options)?;
    assert!(query.requires_pre_selection());
    let construct = query.construct_query().to_string();
    assert_valid(&construct);
    insta::assert_snapshot!(construct, @r#"
    CONSTRUCT {
      ?subject ?predicate ?object .
      ?c3 ?c4 ?c5 .
      ?c7 ?c8 ?c9 .
    } WHERE {
      ?entity <http://www.w3.org/1999/02/22-rdf-syntax-ns#type>/<http://www.w3.org/2000/01/rdf-schema#subClassOf>* <https://example.com/File> .
      ?entity (!(<http://www.w3.org/1999/02/22-rdf-syntax-ns#nil>)|^<https://example.com/contains>/!(<http://www.w3.org/1999/02/22-rdf-syntax-ns#nil>)|<https://example.com/integration>/!(<http://www.w3.org/1999/02/22-rdf-syntax-ns#nil>)) ?c1 .
      SERVICE <http://www.bigdata.com/rdf/search#search> {
        ?c1 <http://www.bigdata.com/rdf/search#search> "report" .
      }
      GRAPH ?entity {
        ?subject ?predicate ?object .
      }
      OPTIONAL {
        ?entity ^<https://example.com/contains> ?c2 .
        GRAPH ?c2 {
          ?c3 ?c4 ?c5 .
        }
      }
      OPTIONAL {
        ?entity <https://example.com/integration> ?c6 .
        GRAPH ?c6 {
          ?c7 ?c8 ?c9 .
        }
      }
    }
    "#);
    Ok(())
}

#[test]
fn test_search_requires_the_full_text_dialect() {
    let options = FindOptions::new().with_search("report", false);
    assert!(matches!(
        build(&options),
        Err(QueryBuildError::UnsupportedSearch)
    ));
}

#[test]
fn test_select_replaces_the_graph_dump() -> Result<(), Box<dyn Error>> {
    let options = FindOptions::new()
        .with_where(FindOptionsWhere::new().with("id", "https://example.com/file/1"))
        .with_select(FindOptionsSelect::fields([NAME]));

    let construct = build(&options)?.construct_query().to_string();
    assert_valid(&construct);
    insta::assert_snapshot!(construct, @r"
    CONSTRUCT {
      ?entity <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> ?c1 .
      ?entity <https://example.com/name> ?c2 .
    } WHERE {
      VALUES ?entity { <https://example.com/file/1> }
      OPTIONAL {
        ?entity <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> ?c1 .
      }
      OPTIONAL {
        ?entity <https://example.com/name> ?c2 .
      }
    }
    ");
    Ok(())
}

#[test]
fn test_unsupported_operators_are_named() {
    let error = |r#where: FindOptionsWhere| {
        build(&FindOptions::new().with_where(r#where))
            .map(|_| ())
            .map_err(|e| e.to_string())
    };

    assert_eq!(
        error(FindOptionsWhere::new().with(
            NAME,
            FindOperator::inverse_relation("https://example.com/contains", None)
        )),
        Err("Unsupported operator \"inverseRelation\"".to_owned())
    );
    assert_eq!(
        error(FindOptionsWhere::new().with("type", FindOperator::gt(1))),
        Err("Unsupported operator \"gt\"".to_owned())
    );
    assert_eq!(
        error(FindOptionsWhere::new().with(NAME, FindOperator::not(FindOperator::not("x")))),
        Err("Unsupported Not sub operator \"not\"".to_owned())
    );
}

#[test]
fn test_compilations_do_not_share_variables() -> Result<(), Box<dyn Error>> {
    let options = FindOptions::new()
        .with_where(FindOptionsWhere::new().with(NAME, FindOperator::gt(1)));
    let first = build(&options)?.count_query().to_string();
    let second = build(&options)?.count_query().to_string();
    assert_eq!(first, second);
    assert!(first.contains("?c1"));
    Ok(())
}
