mod error;
mod find_options;
mod operator;
mod term;
mod value;
pub mod vocab;

pub use error::*;
pub use find_options::*;
pub use operator::*;
pub use term::*;
pub use value::*;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::{
    BlankNode, BlankNodeRef, IriParseError, Literal, LiteralRef, NamedNode, NamedNodeRef,
    NamedOrBlankNode, Subject, Term, TermRef, Triple, TripleRef, Variable, VariableRef,
};
