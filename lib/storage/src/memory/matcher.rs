use crate::error::AdapterError;
use rdf_entity_model::vocab::rdfs;
use rdf_entity_model::{
    Entity, FindOperator, FindOptions, FindOptionsRelations, FindOptionsWhere, Node, Operand,
    RelationValue, Value, ValueTerm, WhereValue, ID_KEY, TYPE_KEY,
};
use rdf_entity_sparql::QueryBuildError;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// Evaluates find-options against the entities held in memory.
///
/// Values are compared through [`ValueTerm`], like the graph query compiler does, so both backends agree on which
/// literals are equal. Range comparisons are not supported.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Matcher<'a> {
    entities: &'a BTreeMap<String, Entity>,
}

/// One step along a relation of an entity.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Relation<'r> {
    /// Follows the references held by the relation field.
    Forward {
        nested: Option<&'r FindOptionsRelations>,
    },
    /// Collects the entities referencing the entity through `predicate`.
    Inverse {
        predicate: &'r str,
        nested: Option<&'r FindOptionsRelations>,
    },
}

impl Relation<'_> {
    pub(crate) fn nested(&self) -> Option<&FindOptionsRelations> {
        match self {
            Self::Forward { nested } | Self::Inverse { nested, .. } => *nested,
        }
    }
}

/// Interprets one entry of a relation tree. Excluded relations are `None`.
pub(crate) fn relation<'r>(
    field: &str,
    value: &'r RelationValue,
) -> Result<Option<Relation<'r>>, AdapterError> {
    if field == ID_KEY || field == TYPE_KEY {
        return Err(QueryBuildError::unsupported_field(field).into());
    }
    let relation = match value {
        RelationValue::Include(false) => None,
        RelationValue::Include(true) => Some(Relation::Forward { nested: None }),
        RelationValue::Nested(nested) => Some(Relation::Forward {
            nested: Some(nested),
        }),
        RelationValue::Operator(FindOperator::InverseRelation(inverse)) => {
            Some(Relation::Inverse {
                predicate: &inverse.resolved_name,
                nested: inverse.relations.as_ref(),
            })
        }
        RelationValue::Operator(operator) => return Err(operator.unsupported().into()),
    };
    Ok(relation)
}

impl<'a> Matcher<'a> {
    pub(crate) fn new(entities: &'a BTreeMap<String, Entity>) -> Self {
        Self { entities }
    }

    pub(crate) fn get(&self, id: &str) -> Option<&'a Entity> {
        self.entities.get(id)
    }

    /// Whether `entity` satisfies the where-clause and the full-text search of `options`.
    pub(crate) fn matches(&self, entity: &Entity, options: &FindOptions) -> Result<bool, AdapterError> {
        let mut matched = match &options.r#where {
            Some(r#where) => self.matches_where(entity, r#where)?,
            None => true,
        };
        if let Some(search) = &options.search {
            let relations = options
                .relations
                .as_ref()
                .filter(|_| options.search_relations);
            matched &= self.matches_search(entity, &search.to_lowercase(), relations)?;
        }
        Ok(matched)
    }

    /// The entities `relation` leads to from `entity`.
    pub(crate) fn targets(&self, entity: &Entity, field: &str, relation: &Relation<'_>) -> Vec<&'a Entity> {
        match relation {
            Relation::Forward { .. } => entity
                .values(field)
                .into_iter()
                .filter_map(Value::id)
                .filter_map(|id| self.entities.get(id))
                .collect(),
            Relation::Inverse { predicate, .. } => self.sources(predicate, &entity.id).collect(),
        }
    }

    /// `types` and all their super classes, following `rdfs:subClassOf` between the stored class entities.
    pub(crate) fn type_closure(&self, types: &[String]) -> BTreeSet<String> {
        let mut closure = BTreeSet::new();
        let mut pending = types.to_vec();
        while let Some(type_) = pending.pop() {
            if closure.contains(&type_) {
                continue;
            }
            if let Some(class) = self.entities.get(&type_) {
                pending.extend(
                    class
                        .values(rdfs::SUB_CLASS_OF.as_str())
                        .into_iter()
                        .filter_map(Value::id)
                        .map(str::to_owned),
                );
            }
            closure.insert(type_);
        }
        closure
    }

    fn matches_where(&self, entity: &Entity, r#where: &FindOptionsWhere) -> Result<bool, AdapterError> {
        // Every field is evaluated so that unsupported operators are reported regardless of the data.
        let mut matched = true;
        for (field, value) in r#where.iter() {
            matched &= match field {
                ID_KEY => self.matches_id(entity, value)?,
                TYPE_KEY => self.matches_type(entity, &self.type_closure(&entity.types), value)?,
                field => self.matches_property(entity, field, value)?,
            };
        }
        Ok(matched)
    }

    fn matches_id(&self, entity: &Entity, value: &WhereValue) -> Result<bool, AdapterError> {
        let is = |value: &Value| Ok::<_, AdapterError>(resource(ID_KEY, value)? == entity.id);
        let is_any = |values: &[Value]| {
            Ok::<_, AdapterError>(resources(ID_KEY, values)?.contains(&entity.id.as_str()))
        };
        match value {
            WhereValue::Value(value) => is(value),
            WhereValue::Array(items) => {
                let mut matched = true;
                for item in items {
                    matched &= self.matches_id(entity, item)?;
                }
                Ok(matched)
            }
            WhereValue::Nested(_) => Err(QueryBuildError::unsupported_field(ID_KEY).into()),
            WhereValue::Operator(operator) => match operator {
                FindOperator::Equal(Operand::Value(value)) => is(value),
                FindOperator::In(values) => is_any(values),
                FindOperator::Not(Operand::Value(value)) => Ok(!is(value)?),
                FindOperator::Not(Operand::Operator(inner)) => match inner.as_ref() {
                    FindOperator::Equal(Operand::Value(value)) => Ok(!is(value)?),
                    FindOperator::In(values) => Ok(!is_any(values)?),
                    inner => Err(inner.unsupported_in(operator).into()),
                },
                FindOperator::Equal(Operand::Operator(inner)) => {
                    Err(inner.unsupported_in(operator).into())
                }
                operator => Err(operator.unsupported().into()),
            },
        }
    }

    fn matches_type(
        &self,
        entity: &Entity,
        closure: &BTreeSet<String>,
        value: &WhereValue,
    ) -> Result<bool, AdapterError> {
        let has = |value: &Value| -> Result<bool, AdapterError> {
            let mut matched = true;
            for value in value.values() {
                matched &= closure.contains(resource(TYPE_KEY, value)?);
            }
            Ok(matched)
        };
        let has_any = |values: &[Value]| -> Result<bool, AdapterError> {
            Ok(resources(TYPE_KEY, values)?
                .into_iter()
                .any(|type_| closure.contains(type_)))
        };
        match value {
            WhereValue::Value(value) => has(value),
            WhereValue::Array(items) => {
                let mut matched = true;
                for item in items {
                    matched &= self.matches_type(entity, closure, item)?;
                }
                Ok(matched)
            }
            WhereValue::Nested(_) => Err(QueryBuildError::unsupported_field(TYPE_KEY).into()),
            WhereValue::Operator(operator) => match operator {
                FindOperator::Equal(Operand::Value(value)) => has(value),
                FindOperator::In(values) => has_any(values),
                FindOperator::Not(Operand::Value(value)) => Ok(!has(value)?),
                FindOperator::Not(Operand::Operator(inner)) => match inner.as_ref() {
                    FindOperator::Equal(Operand::Value(value)) => Ok(!has(value)?),
                    FindOperator::In(values) => Ok(!has_any(values)?),
                    inner => Err(inner.unsupported_in(operator).into()),
                },
                // The entity is one of the classes of the given instance.
                FindOperator::Inverse(Operand::Value(value)) => {
                    let instance = resource(TYPE_KEY, value)?;
                    Ok(self.entities.get(instance).is_some_and(|instance| {
                        self.type_closure(&instance.types).contains(&entity.id)
                    }))
                }
                FindOperator::Equal(Operand::Operator(inner))
                | FindOperator::Inverse(Operand::Operator(inner)) => {
                    Err(inner.unsupported_in(operator).into())
                }
                operator => Err(operator.unsupported().into()),
            },
        }
    }

    fn matches_property(
        &self,
        entity: &Entity,
        field: &str,
        value: &WhereValue,
    ) -> Result<bool, AdapterError> {
        let stored = entity.values(field);
        match value {
            WhereValue::Value(value) => {
                let mut matched = true;
                for value in value.values() {
                    matched &= contains(&stored, &term(field, value)?);
                }
                Ok(matched)
            }
            WhereValue::Array(items) => {
                let mut matched = true;
                for item in items {
                    matched &= self.matches_property(entity, field, item)?;
                }
                Ok(matched)
            }
            WhereValue::Nested(nested) => {
                let mut matched = false;
                for value in stored {
                    if let Some(related) = self.resolve(value) {
                        matched |= self.matches_where(&related, nested)?;
                    }
                }
                Ok(matched)
            }
            WhereValue::Operator(operator) => self.matches_operator(entity, field, &stored, operator),
        }
    }

    fn matches_operator(
        &self,
        entity: &Entity,
        field: &str,
        stored: &[&Value],
        operator: &FindOperator,
    ) -> Result<bool, AdapterError> {
        match operator {
            FindOperator::Equal(Operand::Value(value)) => Ok(contains(stored, &term(field, value)?)),
            FindOperator::In(values) => {
                let terms = terms(field, values)?;
                Ok(terms.iter().any(|term| contains(stored, term)))
            }
            // Also matches entities without any value for the field.
            FindOperator::Not(Operand::Value(value)) => Ok(!contains(stored, &term(field, value)?)),
            FindOperator::Not(Operand::Operator(inner)) => match inner.as_ref() {
                inner @ (FindOperator::Equal(Operand::Value(_)) | FindOperator::In(_)) => {
                    Ok(!self.matches_operator(entity, field, stored, inner)?)
                }
                inner if is_range(inner) => Err(inner.unsupported().into()),
                inner => Err(inner.unsupported_in(operator).into()),
            },
            FindOperator::Inverse(Operand::Value(value)) => {
                let ValueTerm::Resource(source) = term(field, value)? else {
                    return Err(QueryBuildError::unsupported_value(field).into());
                };
                Ok(self
                    .entities
                    .get(&source)
                    .is_some_and(|source| references(source, field, &entity.id)))
            }
            FindOperator::Inverse(Operand::Operator(inner)) => {
                let accepted = match inner.as_ref() {
                    FindOperator::Equal(Operand::Value(value)) => vec![term(field, value)?],
                    FindOperator::In(values) => terms(field, values)?,
                    inner if is_range(inner) => return Err(inner.unsupported().into()),
                    inner => return Err(inner.unsupported_in(operator).into()),
                };
                Ok(self
                    .sources(field, &entity.id)
                    .any(|source| accepted.contains(&ValueTerm::Resource(source.id.clone()))))
            }
            FindOperator::Equal(Operand::Operator(inner)) => {
                Err(inner.unsupported_in(operator).into())
            }
            operator => Err(operator.unsupported().into()),
        }
    }

    /// Matches the lowercase `needle` against the literals of the entity, and of its related entities with `relations`.
    fn matches_search(
        &self,
        entity: &Entity,
        needle: &str,
        relations: Option<&FindOptionsRelations>,
    ) -> Result<bool, AdapterError> {
        if entity
            .properties
            .values()
            .flat_map(Value::values)
            .any(|value| mentions(value, needle))
        {
            return Ok(true);
        }
        let Some(relations) = relations else {
            return Ok(false);
        };
        for (field, value) in relations.iter() {
            let Some(relation) = relation(field, value)? else {
                continue;
            };
            for target in self.targets(entity, field, &relation) {
                if self.matches_search(target, needle, relation.nested())? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// The entities holding a reference to `id` in `field`.
    fn sources<'s>(&'s self, field: &'s str, id: &'s str) -> impl Iterator<Item = &'a Entity> + 's {
        self.entities
            .values()
            .filter(move |source| references(source, field, id))
    }

    /// The entity a where-clause nested below a field is matched against.
    fn resolve<'v>(&self, value: &'v Value) -> Option<Cow<'v, Entity>>
    where
        'a: 'v,
    {
        match value {
            Value::Reference(id) => Some(
                self.entities
                    .get(id)
                    .map_or_else(|| Cow::Owned(Entity::new(id.clone())), Cow::Borrowed),
            ),
            Value::Entity(entity) => Some(
                self.entities
                    .get(&entity.id)
                    .map_or(Cow::Borrowed(entity.as_ref()), Cow::Borrowed),
            ),
            Value::Node(node) => Some(Cow::Owned(anonymous(node))),
            _ => None,
        }
    }
}

fn anonymous(node: &Node) -> Entity {
    Entity {
        id: String::new(),
        types: node.types.clone(),
        properties: node.properties.clone(),
    }
}

fn references(source: &Entity, field: &str, id: &str) -> bool {
    source
        .values(field)
        .into_iter()
        .any(|value| value.id() == Some(id))
}

fn contains(stored: &[&Value], term: &ValueTerm) -> bool {
    stored
        .iter()
        .filter_map(|value| ValueTerm::from_stored_value(value))
        .any(|stored| stored == *term)
}

fn mentions(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(text) => text.to_lowercase().contains(needle),
        Value::Literal(literal) => literal.value.to_lowercase().contains(needle),
        _ => false,
    }
}

fn is_range(operator: &FindOperator) -> bool {
    matches!(
        operator,
        FindOperator::GreaterThan(_)
            | FindOperator::GreaterThanOrEqual(_)
            | FindOperator::LessThan(_)
            | FindOperator::LessThanOrEqual(_)
    )
}

fn term(field: &str, value: &Value) -> Result<ValueTerm, AdapterError> {
    ValueTerm::from_where_value(value)
        .ok_or_else(|| QueryBuildError::unsupported_value(field).into())
}

fn terms(field: &str, values: &[Value]) -> Result<Vec<ValueTerm>, AdapterError> {
    values
        .iter()
        .flat_map(Value::values)
        .map(|value| term(field, value))
        .collect()
}

/// A value naming a resource: an id or a type.
fn resource<'v>(field: &str, value: &'v Value) -> Result<&'v str, AdapterError> {
    match value {
        Value::String(iri) => Ok(iri.as_str()),
        value => value
            .id()
            .ok_or_else(|| QueryBuildError::unsupported_value(field).into()),
    }
}

fn resources<'v>(field: &str, values: &'v [Value]) -> Result<Vec<&'v str>, AdapterError> {
    values
        .iter()
        .flat_map(Value::values)
        .map(|value| resource(field, value))
        .collect()
}
