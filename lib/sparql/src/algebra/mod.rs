//! An explicit AST for the subset of SPARQL 1.1 the entity layer generates, together with its serializer.

mod expression;
mod path;
mod pattern;
mod query;
mod update;

pub use expression::Expression;
pub use path::PropertyPath;
pub use pattern::{GraphPattern, GraphTemplate, TermPattern, TriplePattern, VerbPattern};
pub use query::{AskQuery, ConstructQuery, OrderExpression, Projection, SelectQuery};
pub use update::{Update, UpdateOperation};
