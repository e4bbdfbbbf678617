use crate::algebra::pattern::{write_inline_group, GraphPattern};
use rdf_entity_model::{Term, Variable};
use std::fmt;

/// The subset of SPARQL expressions used in `FILTER` and `BIND`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Variable(Variable),
    Term(Term),
    Equal(Box<Expression>, Box<Expression>),
    NotEqual(Box<Expression>, Box<Expression>),
    Greater(Box<Expression>, Box<Expression>),
    GreaterOrEqual(Box<Expression>, Box<Expression>),
    Less(Box<Expression>, Box<Expression>),
    LessOrEqual(Box<Expression>, Box<Expression>),
    In(Box<Expression>, Vec<Expression>),
    NotIn(Box<Expression>, Vec<Expression>),
    NotExists(Vec<GraphPattern>),
    Now,
}

impl Expression {
    pub fn equal(left: impl Into<Self>, right: impl Into<Self>) -> Self {
        Self::Equal(Box::new(left.into()), Box::new(right.into()))
    }

    pub fn not_equal(left: impl Into<Self>, right: impl Into<Self>) -> Self {
        Self::NotEqual(Box::new(left.into()), Box::new(right.into()))
    }

    pub fn is_in(left: impl Into<Self>, values: impl IntoIterator<Item = Term>) -> Self {
        Self::In(
            Box::new(left.into()),
            values.into_iter().map(Self::Term).collect(),
        )
    }

    pub fn not_in(left: impl Into<Self>, values: impl IntoIterator<Item = Term>) -> Self {
        Self::NotIn(
            Box::new(left.into()),
            values.into_iter().map(Self::Term).collect(),
        )
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl From<&Variable> for Expression {
    fn from(variable: &Variable) -> Self {
        Self::Variable(variable.clone())
    }
}

impl From<Term> for Expression {
    fn from(term: Term) -> Self {
        Self::Term(term)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(variable) => write!(f, "{variable}"),
            Self::Term(term) => write!(f, "{term}"),
            Self::Equal(a, b) => write!(f, "{a} = {b}"),
            Self::NotEqual(a, b) => write!(f, "{a} != {b}"),
            Self::Greater(a, b) => write!(f, "{a} > {b}"),
            Self::GreaterOrEqual(a, b) => write!(f, "{a} >= {b}"),
            Self::Less(a, b) => write!(f, "{a} < {b}"),
            Self::LessOrEqual(a, b) => write!(f, "{a} <= {b}"),
            Self::In(a, values) => {
                write!(f, "{a} IN (")?;
                write_list(f, values)?;
                f.write_str(")")
            }
            Self::NotIn(a, values) => {
                write!(f, "{a} NOT IN (")?;
                write_list(f, values)?;
                f.write_str(")")
            }
            Self::NotExists(patterns) => {
                f.write_str("NOT EXISTS ")?;
                write_inline_group(f, patterns)
            }
            Self::Now => f.write_str("NOW()"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[Expression]) -> fmt::Result {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}
