use crate::algebra::{
    AskQuery, ConstructQuery, GraphPattern, Projection, SelectQuery, TriplePattern,
};
use crate::compiler::{CompiledPatterns, PatternCompiler, SparqlDialect};
use crate::error::QueryBuildError;
use rdf_entity_model::{FindOptions, FindOptionsSelect, NamedNode, SelectValue, Term, Variable};
use tracing::trace;

/// The variable bound to the matched entities.
pub const ENTITY_VARIABLE: &str = "entity";
/// The variable holding the result of count queries.
pub const COUNT_VARIABLE: &str = "count";

const SUBJECT_VARIABLE: &str = "subject";
const PREDICATE_VARIABLE: &str = "predicate";
const OBJECT_VARIABLE: &str = "object";

/// A compiled find-options object, ready to be turned into the queries of either execution strategy.
///
/// Without ordering, or when a single entity is requested, the entities are fetched *directly* by one `CONSTRUCT`.
/// Otherwise, the ordered ids are *pre-selected* first and bound with `VALUES` in a second `CONSTRUCT`. Ordering
/// keys are optional and possibly multi-valued, so combining them with the graph dump in one query would break
/// `LIMIT` and `OFFSET`.
///
/// Queries embedding related entities are always pre-selected: their answer also holds the graphs of the related
/// entities, which may match the query themselves.
#[derive(Debug, Clone)]
pub struct EntityQuery {
    patterns: CompiledPatterns,
    embeds_related: bool,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl EntityQuery {
    pub fn build(dialect: SparqlDialect, options: &FindOptions) -> Result<Self, QueryBuildError> {
        let patterns = PatternCompiler::new(dialect).compile(&entity_variable(), options)?;
        let embeds_related = !patterns.relation_patterns.is_empty()
            || options.select.as_ref().is_some_and(selects_related);
        let query = Self {
            patterns,
            embeds_related,
            limit: options.limit,
            offset: options.offset,
        };
        trace!(
            pre_selection = query.requires_pre_selection(),
            "Compiled entity query"
        );
        Ok(query)
    }

    pub fn patterns(&self) -> &CompiledPatterns {
        &self.patterns
    }

    pub fn requires_pre_selection(&self) -> bool {
        self.embeds_related || (!self.patterns.orders.is_empty() && self.limit != Some(1))
    }

    pub fn is_ordered(&self) -> bool {
        !self.patterns.orders.is_empty()
    }

    /// `SELECT DISTINCT ?entity` in the requested order, limit and offset.
    pub fn entity_selection_query(&self) -> SelectQuery {
        let mut patterns = self.patterns.where_patterns.clone();
        patterns.extend(self.patterns.order_patterns.iter().cloned());
        SelectQuery {
            distinct: true,
            projection: vec![Projection::Variable(entity_variable())],
            patterns,
            order: self.patterns.orders.clone(),
            limit: self.limit,
            offset: self.offset,
        }
    }

    /// The `CONSTRUCT` of the direct strategy.
    pub fn construct_query(&self) -> ConstructQuery {
        let paginated =
            self.limit.is_some() || self.offset.is_some() || !self.patterns.orders.is_empty();
        let patterns = if paginated {
            vec![GraphPattern::SubSelect(Box::new(
                self.entity_selection_query(),
            ))]
        } else {
            self.patterns.where_patterns.clone()
        };
        self.expand(patterns)
    }

    /// The `CONSTRUCT` of the pre-selection strategy, for the ids returned by the selection query.
    pub fn construct_query_for(&self, ids: &[NamedNode]) -> ConstructQuery {
        self.expand(vec![GraphPattern::Values {
            variable: entity_variable(),
            values: ids.iter().cloned().map(Term::from).collect(),
        }])
    }

    pub fn ask_query(&self) -> AskQuery {
        AskQuery {
            patterns: self.stored_entity_patterns(),
        }
    }

    /// Counts the distinct matching entities, ignoring limit and offset.
    pub fn count_query(&self) -> SelectQuery {
        SelectQuery {
            distinct: false,
            projection: vec![Projection::CountDistinct {
                variable: entity_variable(),
                alias: Variable::new_unchecked(COUNT_VARIABLE),
            }],
            patterns: self.stored_entity_patterns(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// The where patterns, requiring the graph of `?entity` when they only bind it with `VALUES`.
    fn stored_entity_patterns(&self) -> Vec<GraphPattern> {
        let mut patterns = self.patterns.where_patterns.clone();
        let bound = patterns.iter().any(|pattern| {
            matches!(
                pattern,
                GraphPattern::Triple(_)
                    | GraphPattern::Graph { .. }
                    | GraphPattern::Service { .. }
                    | GraphPattern::SubSelect(_)
            )
        });
        if !bound {
            patterns.push(GraphPattern::Graph {
                name: entity_variable().into(),
                patterns: vec![GraphPattern::triple(
                    entity_variable(),
                    Variable::new_unchecked(PREDICATE_VARIABLE),
                    Variable::new_unchecked(OBJECT_VARIABLE),
                )],
            });
        }
        patterns
    }

    /// Adds the entity graph dump (or the projection) and the relations to `patterns`.
    fn expand(&self, mut patterns: Vec<GraphPattern>) -> ConstructQuery {
        let mut template = Vec::new();
        if let Some(select) = &self.patterns.select {
            patterns.extend(select.patterns.iter().cloned());
            template.extend(select.template.iter().cloned());
        } else {
            let dump = TriplePattern::new(
                Variable::new_unchecked(SUBJECT_VARIABLE),
                Variable::new_unchecked(PREDICATE_VARIABLE),
                Variable::new_unchecked(OBJECT_VARIABLE),
            );
            template.push(dump.clone());
            patterns.push(GraphPattern::Graph {
                name: entity_variable().into(),
                patterns: vec![dump.into()],
            });
        }
        patterns.extend(self.patterns.relation_patterns.iter().cloned());
        template.extend(self.patterns.selection_triples.iter().cloned());
        ConstructQuery { template, patterns }
    }
}

fn selects_related(select: &FindOptionsSelect) -> bool {
    select
        .iter()
        .any(|(_, value)| matches!(value, SelectValue::Nested(_)))
}

pub(crate) fn entity_variable() -> Variable {
    Variable::new_unchecked(ENTITY_VARIABLE)
}
