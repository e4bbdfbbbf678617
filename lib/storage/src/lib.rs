//! Query adapters persisting entities either in a SPARQL endpoint or in memory.
//!
//! All adapters implement [`QueryAdapter`] and accept the same find-options. The [`MemoryQueryAdapter`] evaluates them
//! directly against its entities and serves as the reference for the [`SparqlQueryAdapter`].

mod adapter;
mod endpoint;
mod error;
pub mod memory;
pub mod sparql;

pub use adapter::QueryAdapter;
pub use endpoint::{HttpSparqlEndpoint, SparqlEndpoint};
pub use error::{AdapterError, EndpointError};
pub use memory::MemoryQueryAdapter;
pub use sparql::SparqlQueryAdapter;
