use crate::algebra::{GraphPattern, PropertyPath, TriplePattern};
use crate::compiler::{predicate, PatternCompiler};
use crate::error::QueryBuildError;
use rdf_entity_model::vocab::rdf;
use rdf_entity_model::{
    named_node, FindOperator, FindOptionsRelations, FindOptionsSelect, NamedNode, RelationValue,
    SelectValue, Variable, ID_KEY, TYPE_KEY,
};

impl PatternCompiler {
    /// Fetches the named graph of every related entity, collecting the graph dump triples into `selection`.
    pub(super) fn compile_relations(
        &mut self,
        subject: &Variable,
        relations: &FindOptionsRelations,
        selection: &mut Vec<TriplePattern>,
    ) -> Result<Vec<GraphPattern>, QueryBuildError> {
        let mut patterns = Vec::new();
        for (field, value) in relations.iter() {
            let Some((path, nested)) = relation_step(field, value)? else {
                continue;
            };
            let related = self.variables.next_variable();
            let dump = TriplePattern::new(
                self.variables.next_variable(),
                self.variables.next_variable(),
                self.variables.next_variable(),
            );
            selection.push(dump.clone());

            let mut optional = vec![
                GraphPattern::triple(subject, path, &related),
                GraphPattern::Graph {
                    name: (&related).into(),
                    patterns: vec![dump.into()],
                },
            ];
            if let Some(nested) = nested {
                optional.extend(self.compile_relations(&related, nested, selection)?);
            }
            patterns.push(GraphPattern::Optional(optional));
        }
        Ok(patterns)
    }

    /// Projects the selected properties. At the root, `rdf:type` is always selected unless `type` is given.
    pub(super) fn compile_select(
        &mut self,
        subject: &Variable,
        select: &FindOptionsSelect,
        template: &mut Vec<TriplePattern>,
        root: bool,
    ) -> Result<Vec<GraphPattern>, QueryBuildError> {
        let mut patterns = Vec::new();
        if root && select.get(TYPE_KEY).is_none() {
            patterns.push(self.select_property(
                subject,
                rdf::TYPE.into_owned(),
                None,
                template,
            )?);
        }
        for (field, value) in select.iter() {
            let nested = match value {
                SelectValue::Include(false) => continue,
                SelectValue::Include(true) => None,
                SelectValue::Nested(nested) => Some(nested),
            };
            if field == ID_KEY {
                continue;
            }
            patterns.push(self.select_property(subject, predicate(field)?, nested, template)?);
        }
        Ok(patterns)
    }

    fn select_property(
        &mut self,
        subject: &Variable,
        predicate: NamedNode,
        nested: Option<&FindOptionsSelect>,
        template: &mut Vec<TriplePattern>,
    ) -> Result<GraphPattern, QueryBuildError> {
        let object = self.variables.next_variable();
        let triple = TriplePattern::new(subject, predicate, &object);
        template.push(triple.clone());
        let mut optional = vec![GraphPattern::Triple(triple)];
        if let Some(nested) = nested {
            optional.extend(self.compile_select(&object, nested, template, false)?);
        }
        Ok(GraphPattern::Optional(optional))
    }
}

/// The path from an entity to the entities of one relation, and the relations nested below it.
///
/// Returns `None` for excluded relations.
pub(super) fn relation_step<'a>(
    field: &str,
    value: &'a RelationValue,
) -> Result<Option<(PropertyPath, Option<&'a FindOptionsRelations>)>, QueryBuildError> {
    if field == ID_KEY || field == TYPE_KEY {
        return Err(QueryBuildError::unsupported_field(field));
    }
    let step = match value {
        RelationValue::Include(false) => None,
        RelationValue::Include(true) => Some((named_node(field)?.into(), None)),
        RelationValue::Nested(nested) => Some((named_node(field)?.into(), Some(nested))),
        RelationValue::Operator(FindOperator::InverseRelation(inverse)) => Some((
            PropertyPath::from(named_node(&inverse.resolved_name)?).reverse(),
            inverse.relations.as_ref(),
        )),
        RelationValue::Operator(operator) => return Err(operator.unsupported().into()),
    };
    Ok(step)
}
