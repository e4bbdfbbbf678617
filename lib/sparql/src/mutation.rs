use crate::algebra::{
    Expression, GraphPattern, GraphTemplate, TermPattern, TriplePattern, Update,
    UpdateOperation,
};
use crate::compiler::predicate;
use crate::error::QueryBuildError;
use crate::variable_generator::{BlankNodeGenerator, VariableGenerator};
use rdf_entity_model::vocab::{dcterms, rdf};
use rdf_entity_model::{
    named_node, Entity, NamedNode, Properties, Term, Value, ValueTerm, Variable, TYPE_KEY,
};
use tracing::trace;

const NOW_VARIABLE: &str = "now";

/// Compiles entity writes into a single SPARQL update request.
///
/// Each entity lives in the named graph of the same name, so replacing or deleting an entity only touches that graph.
#[derive(Debug, Default)]
pub struct EntityUpdateBuilder {
    set_timestamps: bool,
    variables: VariableGenerator,
    blank_nodes: BlankNodeGenerator,
}

impl EntityUpdateBuilder {
    /// With `set_timestamps`, writes stamp `dcterms:created` and `dcterms:modified` with the time of the update.
    pub fn new(set_timestamps: bool) -> Self {
        Self {
            set_timestamps,
            ..Self::default()
        }
    }

    /// Replaces each entity graph with the triples of the entity.
    pub fn build_save(mut self, entities: &[Entity]) -> Result<Update, QueryBuildError> {
        let mut operations = Vec::new();
        for entity in entities {
            let graph = named_node(&entity.id)?;
            operations.push(UpdateOperation::Clear {
                graph: graph.clone(),
            });
            let triples = self.entity_triples(&graph, entity)?;
            operations.push(UpdateOperation::InsertData {
                data: vec![GraphTemplate {
                    graph: graph.clone(),
                    triples,
                }],
            });
            if self.set_timestamps {
                let created = !entity
                    .properties
                    .contains_key(dcterms::CREATED.as_str());
                operations.push(timestamps(graph, created));
            }
        }
        trace!(entities = entities.len(), "Compiled save");
        Ok(Update { operations })
    }

    /// Replaces the values of `attributes` on each entity, leaving every other predicate untouched.
    ///
    /// An attribute set to an empty array is removed. Anonymous nodes and lists are written by a separate
    /// `INSERT DATA`, as the blank nodes of an `INSERT` template are instantiated once per solution.
    pub fn build_update(
        mut self,
        ids: &[String],
        attributes: &Properties,
    ) -> Result<Update, QueryBuildError> {
        let mut operations = Vec::new();
        for id in ids {
            let graph = named_node(id)?;
            let subject = Term::from(graph.clone());
            let mut delete = Vec::new();
            let mut insert = Vec::new();
            let mut anonymous = Vec::new();
            let mut patterns = Vec::new();
            let mut removals = Vec::new();
            for (field, value) in attributes {
                let predicate = predicate(field)?;
                let old = TriplePattern::new(
                    graph.clone(),
                    predicate.clone(),
                    self.variables.next_variable(),
                );
                if matches!(value, Value::Array(values) if values.is_empty()) {
                    removals.push(UpdateOperation::DeleteWhere {
                        patterns: vec![GraphTemplate {
                            graph: graph.clone(),
                            triples: vec![old],
                        }],
                    });
                    continue;
                }
                delete.push(old.clone());
                patterns.push(GraphPattern::Optional(vec![old.into()]));
                let mut triples = Vec::new();
                if field == TYPE_KEY {
                    type_triples(&subject, value, &mut triples)?;
                } else {
                    self.property_triples(field, &subject, &predicate, value, &mut triples)?;
                }
                let (blank, ground): (Vec<_>, Vec<_>) =
                    triples.into_iter().partition(has_blank_node);
                insert.extend(ground);
                anonymous.extend(blank);
            }
            if self.set_timestamps {
                let old = TriplePattern::new(
                    graph.clone(),
                    dcterms::MODIFIED.into_owned(),
                    self.variables.next_variable(),
                );
                delete.push(old.clone());
                patterns.push(GraphPattern::Optional(vec![old.into()]));
                insert.push(TriplePattern::new(
                    graph.clone(),
                    dcterms::MODIFIED.into_owned(),
                    now(),
                ));
                patterns.push(GraphPattern::Bind {
                    expression: Expression::Now,
                    variable: now(),
                });
            }
            if !delete.is_empty() || !insert.is_empty() {
                operations.push(UpdateOperation::DeleteInsert {
                    delete: template(&graph, delete),
                    insert: template(&graph, insert),
                    using: Some(graph.clone()),
                    patterns,
                });
            }
            if !anonymous.is_empty() {
                operations.push(UpdateOperation::InsertData {
                    data: template(&graph, anonymous),
                });
            }
            operations.extend(removals);
        }
        trace!(entities = ids.len(), "Compiled update");
        Ok(Update { operations })
    }

    /// Drops the graph of each entity.
    pub fn build_delete<'a>(
        ids: impl IntoIterator<Item = &'a str>,
    ) -> Result<Update, QueryBuildError> {
        let operations = ids
            .into_iter()
            .map(|id| {
                Ok(UpdateOperation::Drop {
                    graph: named_node(id)?,
                })
            })
            .collect::<Result<_, QueryBuildError>>()?;
        Ok(Update { operations })
    }

    /// Drops every graph.
    pub fn build_delete_all() -> Update {
        Update {
            operations: vec![UpdateOperation::DropAll],
        }
    }

    fn entity_triples(
        &mut self,
        graph: &NamedNode,
        entity: &Entity,
    ) -> Result<Vec<TriplePattern>, QueryBuildError> {
        let subject = Term::from(graph.clone());
        let mut triples = Vec::new();
        for type_ in &entity.types {
            triples.push(TriplePattern::new(
                subject.clone(),
                rdf::TYPE.into_owned(),
                named_node(type_)?,
            ));
        }
        for (field, value) in &entity.properties {
            if self.set_timestamps && field == dcterms::MODIFIED.as_str() {
                continue;
            }
            self.property_triples(field, &subject, &named_node(field)?, value, &mut triples)?;
        }
        Ok(triples)
    }

    fn property_triples(
        &mut self,
        field: &str,
        subject: &Term,
        predicate: &NamedNode,
        value: &Value,
        triples: &mut Vec<TriplePattern>,
    ) -> Result<(), QueryBuildError> {
        for value in value.values() {
            let mut nested = Vec::new();
            let object = self.object(field, value, &mut nested)?;
            triples.push(TriplePattern::new(
                subject.clone(),
                predicate.clone(),
                object,
            ));
            triples.extend(nested);
        }
        Ok(())
    }

    /// The term standing for `value`. Anonymous nodes and lists add their own triples to `triples`.
    fn object(
        &mut self,
        field: &str,
        value: &Value,
        triples: &mut Vec<TriplePattern>,
    ) -> Result<Term, QueryBuildError> {
        match value {
            Value::Node(node) => {
                let subject = Term::from(self.blank_nodes.next_blank_node());
                for type_ in &node.types {
                    triples.push(TriplePattern::new(
                        subject.clone(),
                        rdf::TYPE.into_owned(),
                        named_node(type_)?,
                    ));
                }
                for (field, value) in &node.properties {
                    self.property_triples(field, &subject, &named_node(field)?, value, triples)?;
                }
                Ok(subject)
            }
            Value::List(items) => self.list(field, items, triples),
            Value::Array(_) => Err(QueryBuildError::unsupported_value(field)),
            value => {
                let term = ValueTerm::from_stored_value(value)
                    .ok_or_else(|| QueryBuildError::unsupported_value(field))?;
                Ok(term.to_rdf_term()?)
            }
        }
    }

    /// An `rdf:first`/`rdf:rest` chain terminated by `rdf:nil`.
    fn list(
        &mut self,
        field: &str,
        items: &[Value],
        triples: &mut Vec<TriplePattern>,
    ) -> Result<Term, QueryBuildError> {
        let cells = items
            .iter()
            .map(|_| Term::from(self.blank_nodes.next_blank_node()))
            .collect::<Vec<_>>();
        let nil = Term::from(rdf::NIL.into_owned());
        let rests = cells.iter().skip(1).chain(std::iter::once(&nil));
        for ((cell, rest), item) in cells.iter().zip(rests).zip(items) {
            let mut nested = Vec::new();
            let first = self.object(field, item, &mut nested)?;
            triples.push(TriplePattern::new(
                cell.clone(),
                rdf::FIRST.into_owned(),
                first,
            ));
            triples.push(TriplePattern::new(
                cell.clone(),
                rdf::REST.into_owned(),
                rest.clone(),
            ));
            triples.extend(nested);
        }
        Ok(cells.into_iter().next().unwrap_or(nil))
    }
}

fn type_triples(
    subject: &Term,
    value: &Value,
    triples: &mut Vec<TriplePattern>,
) -> Result<(), QueryBuildError> {
    for value in value.values() {
        let type_ = match value {
            Value::String(type_) => type_.as_str(),
            value => value
                .id()
                .ok_or_else(|| QueryBuildError::unsupported_value(TYPE_KEY))?,
        };
        triples.push(TriplePattern::new(
            subject.clone(),
            rdf::TYPE.into_owned(),
            named_node(type_)?,
        ));
    }
    Ok(())
}

/// Stamps the entity graph with the time of the update, bound once with `NOW()`.
fn timestamps(graph: NamedNode, created: bool) -> UpdateOperation {
    let mut triples = Vec::new();
    if created {
        triples.push(TriplePattern::new(
            graph.clone(),
            dcterms::CREATED.into_owned(),
            now(),
        ));
    }
    triples.push(TriplePattern::new(
        graph.clone(),
        dcterms::MODIFIED.into_owned(),
        now(),
    ));
    UpdateOperation::DeleteInsert {
        delete: Vec::new(),
        insert: vec![GraphTemplate { graph, triples }],
        using: None,
        patterns: vec![GraphPattern::Bind {
            expression: Expression::Now,
            variable: now(),
        }],
    }
}

fn has_blank_node(triple: &TriplePattern) -> bool {
    [&triple.subject, &triple.object]
        .into_iter()
        .any(|term| matches!(term, TermPattern::Term(Term::BlankNode(_))))
}

fn template(graph: &NamedNode, triples: Vec<TriplePattern>) -> Vec<GraphTemplate> {
    if triples.is_empty() {
        Vec::new()
    } else {
        vec![GraphTemplate {
            graph: graph.clone(),
            triples,
        }]
    }
}

fn now() -> Variable {
    Variable::new_unchecked(NOW_VARIABLE)
}
