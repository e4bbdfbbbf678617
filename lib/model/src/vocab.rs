//! Vocabularies used when mapping entities to triples.

pub use oxrdf::vocab::{rdf, rdfs, xsd};

pub mod dcterms {
    //! [Dublin Core terms](https://www.dublincore.org/specifications/dublin-core/dcmi-terms/) used for timestamps.
    use oxrdf::NamedNodeRef;

    /// Date of creation of the resource.
    pub const CREATED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/created");
    /// Date on which the resource was changed.
    pub const MODIFIED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/modified");
}

pub mod bds {
    //! The [Blazegraph full-text search](https://github.com/blazegraph/database/wiki/FullTextSearch) vocabulary.
    use oxrdf::NamedNodeRef;

    /// Both the name of the search service and the predicate binding the search text.
    pub const SEARCH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.bigdata.com/rdf/search#search");
}
