#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod config;
pub mod error;

pub mod model {
    pub use rdf_entity_model::*;
}

pub mod sparql {
    pub use rdf_entity_sparql::*;
}

pub mod storage {
    pub use rdf_entity_storage::*;
}
