use rdf_entity_model::{Entity, Node, Properties, Value};
use rdf_entity_sparql::EntityUpdateBuilder;
use spargebra::Update;
use std::error::Error;

const FILE_1: &str = "https://example.com/file/1";

fn assert_valid(update: &str) {
    if let Err(error) = Update::parse(update, None) {
        panic!("invalid update: {error}\n{update}");
    }
}

fn report() -> Entity {
    Entity::new(FILE_1)
        .with_type("https://example.com/File")
        .with_property("https://example.com/name", "report.pdf")
        .with_property(
            "https://example.com/tags",
            Value::List(vec!["a".into(), "b".into()]),
        )
        .with_property(
            "https://example.com/owner",
            Node::default().with_property("https://example.com/name", "Ada"),
        )
}

#[test]
fn test_save_replaces_the_entity_graph() -> Result<(), Box<dyn Error>> {
    let update = EntityUpdateBuilder::new(false)
        .build_save(&[report()])?
        .to_string();
    assert_valid(&update);
    insta::assert_snapshot!(update, @r#"
    CLEAR SILENT GRAPH <https://example.com/file/1> ;
    INSERT DATA {
      GRAPH <https://example.com/file/1> {
        <https://example.com/file/1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://example.com/File> .
        <https://example.com/file/1> <https://example.com/name> "report.pdf" .
        <https://example.com/file/1> <https://example.com/owner> _:b1 .
        _:b1 <https://example.com/name> "Ada" .
        <https://example.com/file/1> <https://example.com/tags> _:b2 .
        _:b2 <http://www.w3.org/1999/02/22-rdf-syntax-ns#first> "a" .
        _:b2 <http://www.w3.org/1999/02/22-rdf-syntax-ns#rest> _:b3 .
        _:b3 <http://www.w3.org/1999/02/22-rdf-syntax-ns#first> "b" .
        _:b3 <http://www.w3.org/1999/02/22-rdf-syntax-ns#rest> <http://www.w3.org/1999/02/22-rdf-syntax-ns#nil> .
      }
    }
    "#);
    Ok(())
}

#[test]
fn test_save_stamps_timestamps() -> Result<(), Box<dyn Error>> {
    let entity = Entity::new(FILE_1).with_property(
        "http://purl.org/dc/terms/modified",
        "2020-01-01T00:00:00Z",
    );
    let update = EntityUpdateBuilder::new(true)
        .build_save(&[entity])?
        .to_string();
    assert_valid(&update);
    insta::assert_snapshot!(update, @r"
    CLEAR SILENT GRAPH <https://example.com/file/1> ;
    INSERT DATA {
      GRAPH <https://example.com/file/1> {
      }
    } ;
    INSERT {
      GRAPH <https://example.com/file/1> {
        <https://example.com/file/1> <http://purl.org/dc/terms/created> ?now .
        <https://example.com/file/1> <http://purl.org/dc/terms/modified> ?now .
      }
    }
    WHERE {
      BIND(NOW() AS ?now)
    }
    ");
    Ok(())
}

#[test]
fn test_update_only_touches_the_given_attributes() -> Result<(), Box<dyn Error>> {
    let mut attributes = Properties::new();
    attributes.insert("https://example.com/name".to_owned(), "new.pdf".into());
    attributes.insert("https://example.com/tags".to_owned(), Value::Array(Vec::new()));

    let update = EntityUpdateBuilder::new(false)
        .build_update(&[FILE_1.to_owned()], &attributes)?
        .to_string();
    assert_valid(&update);
    insta::assert_snapshot!(update, @r#"
    DELETE {
      GRAPH <https://example.com/file/1> {
        <https://example.com/file/1> <https://example.com/name> ?c1 .
      }
    }
    INSERT {
      GRAPH <https://example.com/file/1> {
        <https://example.com/file/1> <https://example.com/name> "new.pdf" .
      }
    }
    USING <https://example.com/file/1>
    WHERE {
      OPTIONAL {
        <https://example.com/file/1> <https://example.com/name> ?c1 .
      }
    } ;
    DELETE WHERE {
      GRAPH <https://example.com/file/1> {
        <https://example.com/file/1> <https://example.com/tags> ?c2 .
      }
    }
    "#);
    Ok(())
}

#[test]
fn test_update_writes_anonymous_nodes_once() -> Result<(), Box<dyn Error>> {
    let mut attributes = Properties::new();
    attributes.insert(
        "https://example.com/owner".to_owned(),
        Node::default()
            .with_property("https://example.com/name", "Ada")
            .into(),
    );
    attributes.insert("https://example.com/tag".to_owned(), "z".into());

    let update = EntityUpdateBuilder::new(false)
        .build_update(&[FILE_1.to_owned()], &attributes)?
        .to_string();
    assert_valid(&update);
    insta::assert_snapshot!(update, @r#"
    DELETE {
      GRAPH <https://example.com/file/1> {
        <https://example.com/file/1> <https://example.com/owner> ?c1 .
        <https://example.com/file/1> <https://example.com/tag> ?c2 .
      }
    }
    INSERT {
      GRAPH <https://example.com/file/1> {
        <https://example.com/file/1> <https://example.com/tag> "z" .
      }
    }
    USING <https://example.com/file/1>
    WHERE {
      OPTIONAL {
        <https://example.com/file/1> <https://example.com/owner> ?c1 .
      }
      OPTIONAL {
        <https://example.com/file/1> <https://example.com/tag> ?c2 .
      }
    } ;
    INSERT DATA {
      GRAPH <https://example.com/file/1> {
        <https://example.com/file/1> <https://example.com/owner> _:b1 .
        _:b1 <https://example.com/name> "Ada" .
      }
    }
    "#);
    Ok(())
}

#[test]
fn test_update_of_many_entities_with_timestamps() -> Result<(), Box<dyn Error>> {
    let mut attributes = Properties::new();
    attributes.insert("https://example.com/size".to_owned(), 3.into());
    let ids = [FILE_1.to_owned(), "https://example.com/file/2".to_owned()];

    let update = EntityUpdateBuilder::new(true)
        .build_update(&ids, &attributes)?
        .to_string();
    assert_valid(&update);
    assert_eq!(update.matches("USING <").count(), 2);
    assert_eq!(update.matches("BIND(NOW() AS ?now)").count(), 2);
    assert!(update.contains("<https://example.com/file/2> <http://purl.org/dc/terms/modified> ?c4 ."));
    Ok(())
}

#[test]
fn test_delete_drops_graphs() -> Result<(), Box<dyn Error>> {
    let update =
        EntityUpdateBuilder::build_delete([FILE_1, "https://example.com/file/2"])?.to_string();
    assert_valid(&update);
    insta::assert_snapshot!(update, @r"
    DROP SILENT GRAPH <https://example.com/file/1> ;
    DROP SILENT GRAPH <https://example.com/file/2>
    ");

    let update = EntityUpdateBuilder::build_delete_all().to_string();
    assert_valid(&update);
    assert_eq!(update, "DROP SILENT ALL");
    Ok(())
}

#[test]
fn test_invalid_ids_are_rejected() {
    let result = EntityUpdateBuilder::new(false).build_save(&[Entity::new("file 1")]);
    assert!(result.is_err());
}
