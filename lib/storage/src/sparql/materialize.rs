//! Frames the flat triples of a `CONSTRUCT` answer into entity documents.

use crate::error::AdapterError;
use rdf_entity_model::vocab::{rdf, xsd};
use rdf_entity_model::{
    BlankNode, Entity, FindOperator, FindOptions, FindOptionsRelations, FindOptionsSelect, Literal,
    NamedNode, Node, Properties, RelationValue, SelectValue, Subject, Term, Triple, TypedLiteral,
    Value,
};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Rebuilds the entities of a query answer.
///
/// With `selected` ids (pre-selection), exactly those entities are returned in that order. Otherwise, the answer
/// holds no related entities and every named subject is returned, sorted by id.
pub(crate) fn materialize(
    triples: Vec<Triple>,
    options: &FindOptions,
    selected: Option<&[NamedNode]>,
) -> Result<Vec<Entity>, AdapterError> {
    let graph = ResultGraph::new(triples);
    let framer = Framer { graph: &graph };
    if options.skip_framing {
        return Ok(framer.flat(selected));
    }

    let frame = Frame::for_options(options)?;
    let roots = match selected {
        Some(ids) => ids
            .iter()
            .filter(|id| graph.contains(&Subject::from((*id).clone())))
            .cloned()
            .collect(),
        None => framer.roots(),
    };
    Ok(roots
        .iter()
        .map(|id| framer.entity(id, &frame, &mut Vec::new()))
        .collect())
}

/// The deduplicated statements of an answer, grouped by subject.
struct ResultGraph {
    subjects: Vec<Subject>,
    statements: HashMap<Subject, Vec<(NamedNode, Term)>>,
}

impl ResultGraph {
    fn new(triples: Vec<Triple>) -> Self {
        let mut seen = HashSet::new();
        let mut subjects = Vec::new();
        let mut statements = HashMap::<_, Vec<_>>::new();
        for triple in triples {
            if !seen.insert(triple.clone()) {
                continue;
            }
            let statements = match statements.entry(triple.subject) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    subjects.push(entry.key().clone());
                    entry.insert(Vec::new())
                }
            };
            statements.push((triple.predicate, triple.object));
        }
        Self {
            subjects,
            statements,
        }
    }

    fn contains(&self, subject: &Subject) -> bool {
        self.statements.contains_key(subject)
    }

    fn statements(&self, subject: &Subject) -> &[(NamedNode, Term)] {
        self.statements
            .get(subject)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn objects<'a>(
        &'a self,
        subject: &Subject,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.statements(subject)
            .iter()
            .filter(move |(p, _)| p.as_str() == predicate)
            .map(|(_, object)| object)
    }

    fn named_subjects(&self) -> impl Iterator<Item = &NamedNode> {
        self.subjects.iter().filter_map(|subject| {
            if let Subject::NamedNode(node) = subject {
                Some(node)
            } else {
                None
            }
        })
    }

    /// The named subjects with a `predicate` statement pointing to `object`.
    fn sources(&self, predicate: &str, object: &NamedNode) -> Vec<NamedNode> {
        let object = Term::from(object.clone());
        self.named_subjects()
            .filter(|source| {
                self.objects(&Subject::from((*source).clone()), predicate)
                    .any(|o| *o == object)
            })
            .cloned()
            .collect()
    }
}

/// The related entities to embed, derived from the relations or the nested selections of a query.
#[derive(Debug, Default)]
struct Frame {
    forward: BTreeMap<String, Frame>,
    inverse: Vec<InverseFrame>,
}

#[derive(Debug)]
struct InverseFrame {
    alias: String,
    predicate: String,
    frame: Frame,
}

impl Frame {
    fn for_options(options: &FindOptions) -> Result<Self, AdapterError> {
        match (&options.select, &options.relations) {
            (Some(select), _) => Ok(Self::from_select(select)),
            (None, Some(relations)) => Self::from_relations(relations),
            (None, None) => Ok(Self::default()),
        }
    }

    fn from_relations(relations: &FindOptionsRelations) -> Result<Self, AdapterError> {
        let mut frame = Self::default();
        for (field, value) in relations.iter() {
            match value {
                RelationValue::Include(false) => {}
                RelationValue::Include(true) => {
                    frame.forward.insert(field.to_owned(), Self::default());
                }
                RelationValue::Nested(nested) => {
                    frame
                        .forward
                        .insert(field.to_owned(), Self::from_relations(nested)?);
                }
                RelationValue::Operator(FindOperator::InverseRelation(inverse)) => {
                    frame.inverse.push(InverseFrame {
                        alias: field.to_owned(),
                        predicate: inverse.resolved_name.clone(),
                        frame: inverse
                            .relations
                            .as_ref()
                            .map(Self::from_relations)
                            .transpose()?
                            .unwrap_or_default(),
                    });
                }
                RelationValue::Operator(operator) => return Err(operator.unsupported().into()),
            }
        }
        Ok(frame)
    }

    fn from_select(select: &FindOptionsSelect) -> Self {
        let forward = select
            .iter()
            .filter_map(|(field, value)| match value {
                SelectValue::Nested(nested) => Some((field.to_owned(), Self::from_select(nested))),
                SelectValue::Include(_) => None,
            })
            .collect();
        Self {
            forward,
            inverse: Vec::new(),
        }
    }
}

struct Framer<'a> {
    graph: &'a ResultGraph,
}

impl Framer<'_> {
    /// Every named subject as an entity of its own, pre-selected ids first.
    fn flat(&self, selected: Option<&[NamedNode]>) -> Vec<Entity> {
        let selected = selected.unwrap_or_default();
        let mut rest = self
            .graph
            .named_subjects()
            .filter(|subject| !selected.contains(*subject))
            .collect::<Vec<_>>();
        rest.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        selected
            .iter()
            .filter(|id| self.graph.contains(&Subject::from((*id).clone())))
            .chain(rest)
            .map(|id| self.entity(id, &Frame::default(), &mut Vec::new()))
            .collect()
    }

    fn roots(&self) -> Vec<NamedNode> {
        let mut roots = self.graph.named_subjects().cloned().collect::<Vec<_>>();
        roots.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        roots
    }

    fn entity(&self, id: &NamedNode, frame: &Frame, path: &mut Vec<Subject>) -> Entity {
        let subject = Subject::from(id.clone());
        path.push(subject.clone());
        let (types, mut properties) = self.description(&subject, path);
        for (predicate, nested) in &frame.forward {
            if let Some(value) = properties.remove(predicate) {
                let value = self.embed(value, nested, path);
                properties.insert(predicate.clone(), value);
            }
        }
        for inverse in &frame.inverse {
            let mut sources = Vec::new();
            for source in self.graph.sources(&inverse.predicate, id) {
                if !path.contains(&Subject::from(source.clone())) {
                    sources.push(Value::from(self.entity(&source, &inverse.frame, path)));
                }
            }
            if !sources.is_empty() {
                properties.insert(inverse.alias.clone(), single_or_array(sources));
            }
        }
        path.pop();
        Entity {
            id: id.as_str().to_owned(),
            types,
            properties,
        }
    }

    /// Replaces references to entities of the answer by the entities themselves.
    fn embed(&self, value: Value, frame: &Frame, path: &mut Vec<Subject>) -> Value {
        match value {
            Value::Reference(id) => {
                let target = NamedNode::new_unchecked(id);
                let subject = Subject::from(target.clone());
                if self.graph.contains(&subject) && !path.contains(&subject) {
                    Value::from(self.entity(&target, frame, path))
                } else {
                    Value::Reference(target.into_string())
                }
            }
            Value::Array(values) => Value::Array(
                values
                    .into_iter()
                    .map(|value| self.embed(value, frame, path))
                    .collect(),
            ),
            value => value,
        }
    }

    /// The types and properties of `subject`. Types and multiple values are sorted.
    fn description(&self, subject: &Subject, path: &mut Vec<Subject>) -> (Vec<String>, Properties) {
        let mut types = Vec::new();
        let mut statements = BTreeMap::<&str, Vec<&Term>>::new();
        for (predicate, object) in self.graph.statements(subject) {
            if predicate.as_ref() == rdf::TYPE {
                if let Term::NamedNode(type_) = object {
                    types.push(type_.as_str().to_owned());
                    continue;
                }
            }
            statements.entry(predicate.as_str()).or_default().push(object);
        }
        types.sort();

        let mut properties = Properties::new();
        for (predicate, mut objects) in statements {
            objects.sort_by_cached_key(|object| object.to_string());
            let values = objects
                .into_iter()
                .filter_map(|object| self.value(object, path))
                .collect::<Vec<_>>();
            if !values.is_empty() {
                properties.insert(predicate.to_owned(), single_or_array(values));
            }
        }
        (types, properties)
    }

    fn value(&self, object: &Term, path: &mut Vec<Subject>) -> Option<Value> {
        if let Term::Literal(literal) = object {
            return Some(literal_value(literal));
        }
        if let Term::NamedNode(node) = object {
            if node.as_ref() == rdf::NIL {
                return Some(Value::List(Vec::new()));
            }
            return Some(Value::Reference(node.as_str().to_owned()));
        }
        if let Term::BlankNode(node) = object {
            return Some(self.blank_node(node, path));
        }
        None
    }

    /// Inlines an anonymous node, or the list it starts.
    fn blank_node(&self, node: &BlankNode, path: &mut Vec<Subject>) -> Value {
        let subject = Subject::from(node.clone());
        if path.contains(&subject) {
            return Value::Node(Box::default());
        }
        if self
            .graph
            .objects(&subject, rdf::FIRST.as_str())
            .next()
            .is_some()
        {
            return Value::List(self.list(subject, path));
        }
        path.push(subject.clone());
        let (types, properties) = self.description(&subject, path);
        path.pop();
        Value::Node(Box::new(Node { types, properties }))
    }

    fn list(&self, head: Subject, path: &mut Vec<Subject>) -> Vec<Value> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut cell = Some(head);
        while let Some(current) = cell.take() {
            if !visited.insert(current.clone()) {
                break;
            }
            if let Some(first) = self.graph.objects(&current, rdf::FIRST.as_str()).next() {
                items.extend(self.value(first, path));
            }
            cell = match self.graph.objects(&current, rdf::REST.as_str()).next() {
                Some(Term::BlankNode(next)) => Some(Subject::from(next.clone())),
                _ => None,
            };
        }
        items
    }
}

/// Maps the datatypes produced when writing entities back to plain values.
fn literal_value(literal: &Literal) -> Value {
    let value = literal.value();
    if let Some(language) = literal.language() {
        return TypedLiteral::new_language_tagged(value, language).into();
    }
    let datatype = literal.datatype();
    let plain = if datatype == xsd::STRING {
        Some(Value::from(value))
    } else if datatype == xsd::INTEGER {
        value.parse().ok().map(Value::Integer)
    } else if datatype == xsd::DECIMAL || datatype == xsd::DOUBLE {
        value.parse().ok().map(Value::Double)
    } else if datatype == xsd::BOOLEAN {
        match value {
            "true" | "1" => Some(Value::Boolean(true)),
            "false" | "0" => Some(Value::Boolean(false)),
            _ => None,
        }
    } else {
        None
    };
    plain.unwrap_or_else(|| TypedLiteral::new(value, datatype.as_str()).into())
}

fn single_or_array(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        if let Some(value) = values.pop() {
            return value;
        }
    }
    Value::Array(values)
}
