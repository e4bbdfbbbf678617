use crate::algebra::pattern::{write_group, GraphPattern, Layout, TriplePattern};
use rdf_entity_model::Variable;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Variable(Variable),
    /// `(COUNT(DISTINCT ?variable) AS ?alias)`
    CountDistinct { variable: Variable, alias: Variable },
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(variable) => write!(f, "{variable}"),
            Self::CountDistinct { variable, alias } => {
                write!(f, "(COUNT(DISTINCT {variable}) AS {alias})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderExpression {
    Asc(Variable),
    Desc(Variable),
}

impl fmt::Display for OrderExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc(variable) => write!(f, "{variable}"),
            Self::Desc(variable) => write!(f, "DESC({variable})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub distinct: bool,
    pub projection: Vec<Projection>,
    pub patterns: Vec<GraphPattern>,
    pub order: Vec<OrderExpression>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl SelectQuery {
    pub(crate) fn write(&self, f: &mut fmt::Formatter<'_>, layout: Layout) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        for projection in &self.projection {
            write!(f, "{projection} ")?;
        }
        f.write_str("WHERE ")?;
        write_group(f, &self.patterns, layout)?;
        if !self.order.is_empty() {
            layout.line_break(f)?;
            f.write_str("ORDER BY")?;
            for order in &self.order {
                write!(f, " {order}")?;
            }
        }
        if let Some(limit) = self.limit {
            layout.line_break(f)?;
            write!(f, "LIMIT {limit}")?;
        }
        if let Some(offset) = self.offset {
            layout.line_break(f)?;
            write!(f, "OFFSET {offset}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, Layout::Block(0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructQuery {
    pub template: Vec<TriplePattern>,
    pub patterns: Vec<GraphPattern>,
}

impl fmt::Display for ConstructQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CONSTRUCT {")?;
        for triple in &self.template {
            write!(f, "\n  {triple}")?;
        }
        f.write_str("\n} WHERE ")?;
        write_group(f, &self.patterns, Layout::Block(0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskQuery {
    pub patterns: Vec<GraphPattern>,
}

impl fmt::Display for AskQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ASK WHERE ")?;
        write_group(f, &self.patterns, Layout::Block(0))
    }
}
