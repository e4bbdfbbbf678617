use crate::algebra::expression::Expression;
use crate::algebra::path::PropertyPath;
use crate::algebra::query::SelectQuery;
use rdf_entity_model::{BlankNode, Literal, NamedNode, Term, Variable};
use std::fmt;

/// The subject or object of a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermPattern {
    Term(Term),
    Variable(Variable),
}

impl fmt::Display for TermPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term(term) => write!(f, "{term}"),
            Self::Variable(variable) => write!(f, "{variable}"),
        }
    }
}

impl From<Term> for TermPattern {
    fn from(term: Term) -> Self {
        Self::Term(term)
    }
}

impl From<NamedNode> for TermPattern {
    fn from(node: NamedNode) -> Self {
        Self::Term(node.into())
    }
}

impl From<BlankNode> for TermPattern {
    fn from(node: BlankNode) -> Self {
        Self::Term(node.into())
    }
}

impl From<Literal> for TermPattern {
    fn from(literal: Literal) -> Self {
        Self::Term(literal.into())
    }
}

impl From<Variable> for TermPattern {
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl From<&Variable> for TermPattern {
    fn from(variable: &Variable) -> Self {
        Self::Variable(variable.clone())
    }
}

/// The predicate of a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerbPattern {
    Variable(Variable),
    Path(PropertyPath),
}

impl fmt::Display for VerbPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(variable) => write!(f, "{variable}"),
            Self::Path(path) => write!(f, "{path}"),
        }
    }
}

impl From<PropertyPath> for VerbPattern {
    fn from(path: PropertyPath) -> Self {
        Self::Path(path)
    }
}

impl From<NamedNode> for VerbPattern {
    fn from(node: NamedNode) -> Self {
        Self::Path(PropertyPath::NamedNode(node))
    }
}

impl From<Variable> for VerbPattern {
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriplePattern {
    pub subject: TermPattern,
    pub predicate: VerbPattern,
    pub object: TermPattern,
}

impl TriplePattern {
    pub fn new(
        subject: impl Into<TermPattern>,
        predicate: impl Into<VerbPattern>,
        object: impl Into<TermPattern>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// An element of a SPARQL group graph pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphPattern {
    Triple(TriplePattern),
    Optional(Vec<GraphPattern>),
    Filter(Expression),
    Values {
        variable: Variable,
        values: Vec<Term>,
    },
    Graph {
        name: TermPattern,
        patterns: Vec<GraphPattern>,
    },
    Service {
        name: NamedNode,
        patterns: Vec<GraphPattern>,
    },
    SubSelect(Box<SelectQuery>),
    Bind {
        expression: Expression,
        variable: Variable,
    },
}

impl GraphPattern {
    pub fn triple(
        subject: impl Into<TermPattern>,
        predicate: impl Into<VerbPattern>,
        object: impl Into<TermPattern>,
    ) -> Self {
        Self::Triple(TriplePattern::new(subject, predicate, object))
    }

    pub fn filter_not_exists(patterns: Vec<GraphPattern>) -> Self {
        Self::Filter(Expression::NotExists(patterns))
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, layout: Layout) -> fmt::Result {
        match self {
            Self::Triple(triple) => write!(f, "{triple}"),
            Self::Optional(patterns) => {
                f.write_str("OPTIONAL ")?;
                write_group(f, patterns, layout)
            }
            Self::Filter(expression) => write!(f, "FILTER({expression})"),
            Self::Values { variable, values } => {
                write!(f, "VALUES {variable} {{")?;
                for value in values {
                    write!(f, " {value}")?;
                }
                f.write_str(" }")
            }
            Self::Graph { name, patterns } => {
                write!(f, "GRAPH {name} ")?;
                write_group(f, patterns, layout)
            }
            Self::Service { name, patterns } => {
                write!(f, "SERVICE {name} ")?;
                write_group(f, patterns, layout)
            }
            Self::SubSelect(query) => {
                f.write_str("{")?;
                let inner = layout.nested();
                inner.line_break(f)?;
                query.write(f, inner)?;
                layout.line_break(f)?;
                f.write_str("}")
            }
            Self::Bind {
                expression,
                variable,
            } => write!(f, "BIND({expression} AS {variable})"),
        }
    }
}

impl From<TriplePattern> for GraphPattern {
    fn from(triple: TriplePattern) -> Self {
        Self::Triple(triple)
    }
}

/// The triples to insert into or delete from one named graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphTemplate {
    pub graph: NamedNode,
    pub triples: Vec<TriplePattern>,
}

impl GraphTemplate {
    pub(crate) fn write(&self, f: &mut fmt::Formatter<'_>, layout: Layout) -> fmt::Result {
        write!(f, "GRAPH {} {{", self.graph)?;
        let inner = layout.nested();
        for triple in &self.triples {
            inner.line_break(f)?;
            write!(f, "{triple}")?;
        }
        layout.line_break(f)?;
        f.write_str("}")
    }
}

/// How nested groups are laid out: one element per line with two-space indentation, or on a single line.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Layout {
    Block(usize),
    Inline,
}

impl Layout {
    pub(crate) fn nested(self) -> Self {
        match self {
            Self::Block(depth) => Self::Block(depth + 1),
            Self::Inline => Self::Inline,
        }
    }

    pub(crate) fn line_break(self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block(depth) => write!(f, "\n{:width$}", "", width = depth * 2),
            Self::Inline => f.write_str(" "),
        }
    }
}

pub(crate) fn write_group(
    f: &mut fmt::Formatter<'_>,
    patterns: &[GraphPattern],
    layout: Layout,
) -> fmt::Result {
    f.write_str("{")?;
    let inner = layout.nested();
    for pattern in patterns {
        inner.line_break(f)?;
        pattern.write(f, inner)?;
    }
    layout.line_break(f)?;
    f.write_str("}")
}

pub(crate) fn write_inline_group(f: &mut fmt::Formatter<'_>, patterns: &[GraphPattern]) -> fmt::Result {
    write_group(f, patterns, Layout::Inline)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Group(Vec<GraphPattern>);

    impl fmt::Display for Group {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write_group(f, &self.0, Layout::Block(0))
        }
    }

    #[test]
    fn nested_groups_are_indented() {
        let entity = Variable::new_unchecked("entity");
        let name = NamedNode::new_unchecked("https://example.com/name");
        let value = Variable::new_unchecked("c1");
        let group = Group(vec![
            GraphPattern::Optional(vec![GraphPattern::triple(
                &entity,
                name.clone(),
                &value,
            )]),
            GraphPattern::filter_not_exists(vec![
                GraphPattern::triple(&entity, name, &value),
                GraphPattern::Filter(Expression::equal(
                    &value,
                    Term::from(Literal::new_simple_literal("x")),
                )),
            ]),
        ]);
        assert_eq!(
            group.to_string(),
            "{\n  OPTIONAL {\n    ?entity <https://example.com/name> ?c1 .\n  }\n  FILTER(NOT EXISTS { ?entity <https://example.com/name> ?c1 . FILTER(?c1 = \"x\") })\n}"
        );
    }
}
