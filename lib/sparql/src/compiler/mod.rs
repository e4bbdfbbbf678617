//! Lowers find-options into SPARQL graph pattern fragments.

mod relations;
mod search;
mod where_clause;

use crate::algebra::{GraphPattern, OrderExpression, TriplePattern};
use crate::error::QueryBuildError;
use crate::variable_generator::VariableGenerator;
use rdf_entity_model::vocab::rdf;
use rdf_entity_model::{
    named_node, FindOptions, FindOptionsOrder, NamedNode, OrderDirection, Variable, ID_KEY,
    TYPE_KEY,
};

/// The flavour of SPARQL spoken by the endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SparqlDialect {
    /// Plain SPARQL 1.1. Full-text search is not available.
    #[default]
    Standard,
    /// SPARQL 1.1 with Blazegraph's `bds:search` full-text service.
    Blazegraph,
}

/// The fragments compiled from one find-options object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledPatterns {
    /// Required patterns: where-clause constraints and the full-text search.
    pub where_patterns: Vec<GraphPattern>,
    /// Optional patterns binding the ordering keys.
    pub order_patterns: Vec<GraphPattern>,
    /// The ordering terms, in the order of the requested keys.
    pub orders: Vec<OrderExpression>,
    /// Optional patterns fetching the named graphs of related entities.
    pub relation_patterns: Vec<GraphPattern>,
    /// The graph dump patterns of all relations, at every nesting level.
    pub selection_triples: Vec<TriplePattern>,
    /// The projection replacing the dump of the entity graph, if a `select` was given.
    pub select: Option<SelectPatterns>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectPatterns {
    pub patterns: Vec<GraphPattern>,
    pub template: Vec<TriplePattern>,
}

/// Compiles the find-options of a single query.
///
/// A compiler is consumed by [`PatternCompiler::compile`], so the fresh variables of two queries never interfere.
#[derive(Debug)]
pub struct PatternCompiler {
    dialect: SparqlDialect,
    variables: VariableGenerator,
}

impl PatternCompiler {
    pub fn new(dialect: SparqlDialect) -> Self {
        Self {
            dialect,
            variables: VariableGenerator::new(),
        }
    }

    pub fn compile(
        mut self,
        subject: &Variable,
        options: &FindOptions,
    ) -> Result<CompiledPatterns, QueryBuildError> {
        let mut compiled = CompiledPatterns {
            where_patterns: self.compile_where(subject, options.r#where.as_ref())?,
            ..CompiledPatterns::default()
        };
        if let Some(search) = &options.search {
            let relations = options
                .relations
                .as_ref()
                .filter(|_| options.search_relations);
            let patterns = self.compile_search(subject, search, relations)?;
            compiled.where_patterns.extend(patterns);
        }
        if let Some(order) = &options.order {
            self.compile_order(subject, order, &mut compiled)?;
        }
        if let Some(select) = &options.select {
            let mut template = Vec::new();
            let patterns = self.compile_select(subject, select, &mut template, true)?;
            compiled.select = Some(SelectPatterns { patterns, template });
        } else if let Some(relations) = &options.relations {
            compiled.relation_patterns =
                self.compile_relations(subject, relations, &mut compiled.selection_triples)?;
        }
        Ok(compiled)
    }

    fn compile_order(
        &mut self,
        subject: &Variable,
        order: &FindOptionsOrder,
        compiled: &mut CompiledPatterns,
    ) -> Result<(), QueryBuildError> {
        for (field, direction) in order.iter() {
            let key = if field == ID_KEY {
                subject.clone()
            } else {
                let key = self.variables.next_variable();
                compiled
                    .order_patterns
                    .push(GraphPattern::Optional(vec![GraphPattern::triple(
                        subject,
                        predicate(field)?,
                        &key,
                    )]));
                key
            };
            compiled.orders.push(match direction {
                OrderDirection::Asc => OrderExpression::Asc(key),
                OrderDirection::Desc => OrderExpression::Desc(key),
            });
        }
        Ok(())
    }
}

/// The predicate a field is stored under. `type` is `rdf:type`.
pub(crate) fn predicate(field: &str) -> Result<NamedNode, QueryBuildError> {
    if field == TYPE_KEY {
        Ok(rdf::TYPE.into_owned())
    } else {
        Ok(named_node(field)?)
    }
}
