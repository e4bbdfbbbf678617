use crate::algebra::{Expression, GraphPattern, PropertyPath};
use crate::compiler::PatternCompiler;
use crate::error::QueryBuildError;
use rdf_entity_model::{
    named_node, FindOperator, FindOptionsWhere, NamedNode, Operand, Term, Value, ValueTerm,
    Variable, WhereValue, ID_KEY, TYPE_KEY,
};

/// The constraints of a where-clause, kept apart so the compiled group reads VALUES, triples, filters.
#[derive(Debug, Default)]
struct WhereParts {
    values: Vec<GraphPattern>,
    triples: Vec<GraphPattern>,
    filters: Vec<GraphPattern>,
}

impl WhereParts {
    fn into_patterns(self) -> Vec<GraphPattern> {
        let mut patterns = self.values;
        patterns.extend(self.triples);
        patterns.extend(self.filters);
        patterns
    }
}

impl PatternCompiler {
    pub(super) fn compile_where(
        &mut self,
        subject: &Variable,
        r#where: Option<&FindOptionsWhere>,
    ) -> Result<Vec<GraphPattern>, QueryBuildError> {
        let mut parts = WhereParts::default();
        if let Some(r#where) = r#where {
            self.where_parts(subject, r#where, &mut parts)?;
        }
        // The subject must still be bound to an entity, i.e. to a named graph with at least one statement.
        if parts.triples.is_empty() && parts.values.is_empty() {
            let predicate = self.variables.next_variable();
            let object = self.variables.next_variable();
            parts.triples.push(GraphPattern::Graph {
                name: subject.into(),
                patterns: vec![GraphPattern::triple(subject, predicate, object)],
            });
        }
        Ok(parts.into_patterns())
    }

    fn where_parts(
        &mut self,
        subject: &Variable,
        r#where: &FindOptionsWhere,
        parts: &mut WhereParts,
    ) -> Result<(), QueryBuildError> {
        let only_field = r#where.len() == 1;
        for (field, value) in r#where.iter() {
            match field {
                ID_KEY => id_constraint(subject, value, only_field, parts)?,
                TYPE_KEY => self.type_constraint(subject, value, parts)?,
                field => self.field_constraint(subject, field, value, parts)?,
            }
        }
        Ok(())
    }

    fn type_constraint(
        &mut self,
        subject: &Variable,
        value: &WhereValue,
        parts: &mut WhereParts,
    ) -> Result<(), QueryBuildError> {
        match value {
            WhereValue::Value(value) => {
                for value in value.values() {
                    parts.triples.push(GraphPattern::triple(
                        subject,
                        PropertyPath::type_path(),
                        resource(TYPE_KEY, value)?,
                    ));
                }
            }
            WhereValue::Array(items) => {
                for item in items {
                    self.type_constraint(subject, item, parts)?;
                }
            }
            WhereValue::Nested(_) => return Err(QueryBuildError::unsupported_field(TYPE_KEY)),
            WhereValue::Operator(operator) => match operator {
                FindOperator::Equal(Operand::Value(value)) => {
                    self.type_constraint(subject, &WhereValue::Value(value.clone()), parts)?;
                }
                FindOperator::In(values) => {
                    let class = self.variables.next_variable();
                    parts.triples.push(GraphPattern::triple(
                        subject,
                        PropertyPath::type_path(),
                        &class,
                    ));
                    parts.filters.push(GraphPattern::Filter(Expression::is_in(
                        &class,
                        resources(TYPE_KEY, values)?,
                    )));
                }
                FindOperator::Not(operand) => {
                    let excluded = self.excluded_types(subject, operand, operator)?;
                    parts.filters.push(GraphPattern::filter_not_exists(excluded));
                }
                FindOperator::Inverse(Operand::Value(value)) => {
                    parts.triples.push(GraphPattern::triple(
                        subject,
                        PropertyPath::type_path().reverse(),
                        resource(TYPE_KEY, value)?,
                    ));
                }
                FindOperator::Equal(Operand::Operator(inner))
                | FindOperator::Inverse(Operand::Operator(inner)) => {
                    return Err(inner.unsupported_in(operator).into())
                }
                operator => return Err(operator.unsupported().into()),
            },
        }
        Ok(())
    }

    /// The patterns a subject must not match for `Not(operand)` on its type.
    fn excluded_types(
        &mut self,
        subject: &Variable,
        operand: &Operand,
        parent: &FindOperator,
    ) -> Result<Vec<GraphPattern>, QueryBuildError> {
        let value = match operand {
            Operand::Value(value) => value,
            Operand::Operator(inner) => match inner.as_ref() {
                FindOperator::Equal(Operand::Value(value)) => value,
                FindOperator::In(values) => {
                    let class = self.variables.next_variable();
                    return Ok(vec![
                        GraphPattern::triple(subject, PropertyPath::type_path(), &class),
                        GraphPattern::Filter(Expression::is_in(
                            &class,
                            resources(TYPE_KEY, values)?,
                        )),
                    ]);
                }
                inner => return Err(inner.unsupported_in(parent).into()),
            },
        };
        Ok(vec![GraphPattern::triple(
            subject,
            PropertyPath::type_path(),
            resource(TYPE_KEY, value)?,
        )])
    }

    fn field_constraint(
        &mut self,
        subject: &Variable,
        field: &str,
        value: &WhereValue,
        parts: &mut WhereParts,
    ) -> Result<(), QueryBuildError> {
        let predicate = named_node(field)?;
        match value {
            WhereValue::Value(value) => {
                for value in value.values() {
                    parts.triples.push(GraphPattern::triple(
                        subject,
                        predicate.clone(),
                        term(field, value)?,
                    ));
                }
            }
            WhereValue::Array(items) => {
                for item in items {
                    self.field_constraint(subject, field, item, parts)?;
                }
            }
            WhereValue::Nested(nested) => {
                let related = self.variables.next_variable();
                parts
                    .triples
                    .push(GraphPattern::triple(subject, predicate, &related));
                self.where_parts(&related, nested, parts)?;
            }
            WhereValue::Operator(operator) => {
                self.operator_constraint(subject, field, predicate, operator, parts)?;
            }
        }
        Ok(())
    }

    fn operator_constraint(
        &mut self,
        subject: &Variable,
        field: &str,
        predicate: NamedNode,
        operator: &FindOperator,
        parts: &mut WhereParts,
    ) -> Result<(), QueryBuildError> {
        match operator {
            FindOperator::In(values) => {
                let object = self.variables.next_variable();
                parts
                    .triples
                    .push(GraphPattern::triple(subject, predicate, &object));
                parts.triples.push(GraphPattern::Values {
                    variable: object,
                    values: terms(field, values)?,
                });
            }
            // NOT EXISTS also matches subjects without any value for the field.
            FindOperator::Not(operand) => {
                let object = self.variables.next_variable();
                let condition = match operand {
                    Operand::Value(value) => Expression::equal(&object, term(field, value)?),
                    Operand::Operator(inner) => comparison(&object, field, inner)?
                        .ok_or_else(|| inner.unsupported_in(operator))?,
                };
                parts.filters.push(GraphPattern::filter_not_exists(vec![
                    GraphPattern::triple(subject, predicate, &object),
                    GraphPattern::Filter(condition),
                ]));
            }
            FindOperator::Inverse(Operand::Value(value)) => {
                let Term::NamedNode(related) = term(field, value)? else {
                    return Err(QueryBuildError::unsupported_value(field));
                };
                parts
                    .triples
                    .push(GraphPattern::triple(related, predicate, subject));
            }
            FindOperator::Inverse(Operand::Operator(inner)) => {
                let related = self.variables.next_variable();
                parts
                    .triples
                    .push(GraphPattern::triple(&related, predicate, subject));
                match inner.as_ref() {
                    FindOperator::In(values) => parts.triples.push(GraphPattern::Values {
                        variable: related,
                        values: terms(field, values)?,
                    }),
                    inner => {
                        let condition = comparison(&related, field, inner)?
                            .ok_or_else(|| inner.unsupported_in(operator))?;
                        parts.filters.push(GraphPattern::Filter(condition));
                    }
                }
            }
            FindOperator::Equal(Operand::Operator(inner)) => {
                return Err(inner.unsupported_in(operator).into())
            }
            operator => {
                let object = self.variables.next_variable();
                let condition = comparison(&object, field, operator)?
                    .ok_or_else(|| operator.unsupported())?;
                parts
                    .triples
                    .push(GraphPattern::triple(subject, predicate, &object));
                parts.filters.push(GraphPattern::Filter(condition));
            }
        }
        Ok(())
    }
}

fn id_constraint(
    subject: &Variable,
    value: &WhereValue,
    only_field: bool,
    parts: &mut WhereParts,
) -> Result<(), QueryBuildError> {
    match value {
        WhereValue::Value(value) => id_equal(subject, value, only_field, parts)?,
        WhereValue::Array(items) => {
            for item in items {
                id_constraint(subject, item, only_field, parts)?;
            }
        }
        WhereValue::Nested(_) => return Err(QueryBuildError::unsupported_field(ID_KEY)),
        WhereValue::Operator(operator) => match operator {
            FindOperator::Equal(Operand::Value(value)) => {
                id_equal(subject, value, only_field, parts)?;
            }
            FindOperator::In(values) => parts.values.push(GraphPattern::Values {
                variable: subject.clone(),
                values: resources(ID_KEY, values)?,
            }),
            FindOperator::Not(operand) => {
                let condition = match operand {
                    Operand::Value(value) => {
                        Expression::not_equal(subject, Term::from(resource(ID_KEY, value)?))
                    }
                    Operand::Operator(inner) => match inner.as_ref() {
                        FindOperator::Equal(Operand::Value(value)) => {
                            Expression::not_equal(subject, Term::from(resource(ID_KEY, value)?))
                        }
                        FindOperator::In(values) => {
                            Expression::not_in(subject, resources(ID_KEY, values)?)
                        }
                        inner => return Err(inner.unsupported_in(operator).into()),
                    },
                };
                parts.filters.push(GraphPattern::Filter(condition));
            }
            FindOperator::Equal(Operand::Operator(inner)) => {
                return Err(inner.unsupported_in(operator).into())
            }
            operator => return Err(operator.unsupported().into()),
        },
    }
    Ok(())
}

/// Pins the subject with VALUES when the id is the only constraint, and filters it otherwise.
fn id_equal(
    subject: &Variable,
    value: &Value,
    only_field: bool,
    parts: &mut WhereParts,
) -> Result<(), QueryBuildError> {
    let id = Term::from(resource(ID_KEY, value)?);
    if only_field {
        parts.values.push(GraphPattern::Values {
            variable: subject.clone(),
            values: vec![id],
        });
    } else {
        parts
            .filters
            .push(GraphPattern::Filter(Expression::equal(subject, id)));
    }
    Ok(())
}

/// The filter expression of a comparison operator, or `None` for other operators.
fn comparison(
    variable: &Variable,
    field: &str,
    operator: &FindOperator,
) -> Result<Option<Expression>, QueryBuildError> {
    let (build, value): (fn(Box<Expression>, Box<Expression>) -> Expression, _) = match operator {
        FindOperator::Equal(Operand::Value(value)) => (Expression::Equal, value),
        FindOperator::GreaterThan(value) => (Expression::Greater, value),
        FindOperator::GreaterThanOrEqual(value) => (Expression::GreaterOrEqual, value),
        FindOperator::LessThan(value) => (Expression::Less, value),
        FindOperator::LessThanOrEqual(value) => (Expression::LessOrEqual, value),
        FindOperator::In(values) => {
            return Ok(Some(Expression::is_in(variable, terms(field, values)?)))
        }
        _ => return Ok(None),
    };
    Ok(Some(build(
        Box::new(variable.into()),
        Box::new(term(field, value)?.into()),
    )))
}

/// Resolves a where value to a term. Strings are resources if they are absolute IRIs.
fn term(field: &str, value: &Value) -> Result<Term, QueryBuildError> {
    let term = ValueTerm::from_where_value(value)
        .ok_or_else(|| QueryBuildError::unsupported_value(field))?;
    Ok(term.to_rdf_term()?)
}

fn terms(field: &str, values: &[Value]) -> Result<Vec<Term>, QueryBuildError> {
    values
        .iter()
        .flat_map(Value::values)
        .map(|value| term(field, value))
        .collect()
}

/// Resolves a value that must identify a resource: an id or a type.
fn resource(field: &str, value: &Value) -> Result<NamedNode, QueryBuildError> {
    let iri = match value {
        Value::String(iri) => iri.as_str(),
        value => value
            .id()
            .ok_or_else(|| QueryBuildError::unsupported_value(field))?,
    };
    Ok(named_node(iri)?)
}

fn resources(field: &str, values: &[Value]) -> Result<Vec<Term>, QueryBuildError> {
    values
        .iter()
        .flat_map(Value::values)
        .map(|value| resource(field, value).map(Term::from))
        .collect()
}
