use rdf_entity_model::vocab::{rdf, rdfs};
use rdf_entity_model::NamedNode;
use std::fmt;

/// A [SPARQL property path](https://www.w3.org/TR/sparql11-query/#propertypaths).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyPath {
    NamedNode(NamedNode),
    Reverse(Box<PropertyPath>),
    Sequence(Vec<PropertyPath>),
    Alternative(Vec<PropertyPath>),
    ZeroOrMore(Box<PropertyPath>),
    NegatedPropertySet(Vec<NamedNode>),
}

impl PropertyPath {
    /// `rdf:type/rdfs:subClassOf*`, i.e. the instance-of relation including every super class.
    pub fn type_path() -> Self {
        Self::Sequence(vec![
            rdf::TYPE.into_owned().into(),
            Self::ZeroOrMore(Box::new(rdfs::SUB_CLASS_OF.into_owned().into())),
        ])
    }

    /// Matches every predicate.
    ///
    /// Written as a negated property set over `rdf:nil`, which is never used as a predicate.
    pub fn any() -> Self {
        Self::NegatedPropertySet(vec![rdf::NIL.into_owned()])
    }

    #[must_use]
    pub fn reverse(self) -> Self {
        Self::Reverse(Box::new(self))
    }

    /// Appends `next` to this path.
    #[must_use]
    pub fn then(self, next: PropertyPath) -> Self {
        match self {
            Self::Sequence(mut elements) => {
                elements.push(next);
                Self::Sequence(elements)
            }
            path => Self::Sequence(vec![path, next]),
        }
    }

    fn is_atomic(&self) -> bool {
        matches!(self, Self::NamedNode(_) | Self::NegatedPropertySet(_))
    }

    fn fmt_element(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence(_) => write!(f, "({self})"),
            path => write!(f, "{path}"),
        }
    }
}

impl From<NamedNode> for PropertyPath {
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(node) => write!(f, "{node}"),
            Self::Reverse(path) if path.is_atomic() => write!(f, "^{path}"),
            Self::Reverse(path) => write!(f, "^({path})"),
            Self::Sequence(elements) => {
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str("/")?;
                    }
                    element.fmt_element(f)?;
                }
                Ok(())
            }
            Self::Alternative(alternatives) => {
                f.write_str("(")?;
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{alternative}")?;
                }
                f.write_str(")")
            }
            Self::ZeroOrMore(path) if path.is_atomic() => write!(f, "{path}*"),
            Self::ZeroOrMore(path) => write!(f, "({path})*"),
            Self::NegatedPropertySet(nodes) => {
                f.write_str("!(")?;
                for (i, node) in nodes.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{node}")?;
                }
                f.write_str(")")
            }
        }
    }
}
