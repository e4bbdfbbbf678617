//! Compiles find-options into SPARQL queries and entity writes into SPARQL updates.
//!
//! Every entity is stored in the named graph whose name is the id of the entity. The generated text only depends on
//! the input, which makes it usable as a compatibility surface.

pub mod algebra;
mod compiler;
mod entity_query;
mod error;
mod mutation;
mod variable_generator;

pub use compiler::{CompiledPatterns, PatternCompiler, SelectPatterns, SparqlDialect};
pub use entity_query::{EntityQuery, COUNT_VARIABLE, ENTITY_VARIABLE};
pub use error::QueryBuildError;
pub use mutation::EntityUpdateBuilder;
pub use variable_generator::{BlankNodeGenerator, VariableGenerator};
