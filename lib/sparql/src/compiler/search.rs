use crate::algebra::{GraphPattern, PropertyPath};
use crate::compiler::relations::relation_step;
use crate::compiler::{PatternCompiler, SparqlDialect};
use crate::error::QueryBuildError;
use rdf_entity_model::vocab::bds;
use rdf_entity_model::{FindOptionsRelations, Literal, Variable};

impl PatternCompiler {
    /// Links the subject to a literal matched by the full-text service.
    ///
    /// With `relations`, the literal may also belong to any entity reachable through them.
    pub(super) fn compile_search(
        &mut self,
        subject: &Variable,
        text: &str,
        relations: Option<&FindOptionsRelations>,
    ) -> Result<Vec<GraphPattern>, QueryBuildError> {
        if self.dialect != SparqlDialect::Blazegraph {
            return Err(QueryBuildError::UnsupportedSearch);
        }
        let matched = self.variables.next_variable();
        let mut paths = vec![PropertyPath::any()];
        if let Some(relations) = relations {
            relation_paths(relations, None, &mut paths)?;
        }
        let path = if paths.len() == 1 {
            PropertyPath::any()
        } else {
            PropertyPath::Alternative(paths)
        };
        Ok(vec![
            GraphPattern::triple(subject, path, &matched),
            GraphPattern::Service {
                name: bds::SEARCH.into_owned(),
                patterns: vec![GraphPattern::triple(
                    &matched,
                    bds::SEARCH.into_owned(),
                    Literal::new_simple_literal(text),
                )],
            },
        ])
    }
}

/// Every relation path, at every depth, followed by any predicate of the related entity.
fn relation_paths(
    relations: &FindOptionsRelations,
    prefix: Option<&PropertyPath>,
    paths: &mut Vec<PropertyPath>,
) -> Result<(), QueryBuildError> {
    for (field, value) in relations.iter() {
        let Some((step, nested)) = relation_step(field, value)? else {
            continue;
        };
        let path = match prefix {
            Some(prefix) => prefix.clone().then(step),
            None => step,
        };
        paths.push(path.clone().then(PropertyPath::any()));
        if let Some(nested) = nested {
            relation_paths(nested, Some(&path), paths)?;
        }
    }
    Ok(())
}
