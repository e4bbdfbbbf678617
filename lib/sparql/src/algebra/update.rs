use crate::algebra::pattern::{write_group, GraphPattern, GraphTemplate, Layout};
use rdf_entity_model::NamedNode;
use std::fmt;

/// A single operation of a SPARQL update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOperation {
    /// `CLEAR SILENT GRAPH <graph>`
    Clear { graph: NamedNode },
    /// `DROP SILENT GRAPH <graph>`
    Drop { graph: NamedNode },
    /// `DROP SILENT ALL`
    DropAll,
    InsertData { data: Vec<GraphTemplate> },
    DeleteWhere { patterns: Vec<GraphTemplate> },
    /// `DELETE { .. } INSERT { .. } USING <g> WHERE { .. }`. Empty templates are omitted.
    DeleteInsert {
        delete: Vec<GraphTemplate>,
        insert: Vec<GraphTemplate>,
        using: Option<NamedNode>,
        patterns: Vec<GraphPattern>,
    },
}

impl fmt::Display for UpdateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear { graph } => write!(f, "CLEAR SILENT GRAPH {graph}"),
            Self::Drop { graph } => write!(f, "DROP SILENT GRAPH {graph}"),
            Self::DropAll => f.write_str("DROP SILENT ALL"),
            Self::InsertData { data } => {
                f.write_str("INSERT DATA ")?;
                write_templates(f, data)
            }
            Self::DeleteWhere { patterns } => {
                f.write_str("DELETE WHERE ")?;
                write_templates(f, patterns)
            }
            Self::DeleteInsert {
                delete,
                insert,
                using,
                patterns,
            } => {
                if !delete.is_empty() {
                    f.write_str("DELETE ")?;
                    write_templates(f, delete)?;
                    f.write_str("\n")?;
                }
                if !insert.is_empty() {
                    f.write_str("INSERT ")?;
                    write_templates(f, insert)?;
                    f.write_str("\n")?;
                }
                if let Some(using) = using {
                    writeln!(f, "USING {using}")?;
                }
                f.write_str("WHERE ")?;
                write_group(f, patterns, Layout::Block(0))
            }
        }
    }
}

/// A SPARQL update request. All operations are sent, and applied, together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Update {
    pub operations: Vec<UpdateOperation>,
}

impl Update {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, operation) in self.operations.iter().enumerate() {
            if i > 0 {
                f.write_str(" ;\n")?;
            }
            write!(f, "{operation}")?;
        }
        Ok(())
    }
}

fn write_templates(f: &mut fmt::Formatter<'_>, templates: &[GraphTemplate]) -> fmt::Result {
    f.write_str("{")?;
    let layout = Layout::Block(1);
    for template in templates {
        layout.line_break(f)?;
        template.write(f, layout)?;
    }
    f.write_str("\n}")
}
