//! # Schema Store
//!
//! In-memory representation of a relational schema: table definitions plus
//! foreign-key relationships, loaded once from the JSON description produced
//! by the offline extraction tool.
//!
//! The JSON contract has two top-level fields:
//!
//! ```json
//! {
//!   "tables": {
//!     "projects": [ {"column": "id", "type": "int"}, ... ],
//!     "tasks":    [ {"column": "id", "type": "int"}, ... ]
//!   },
//!   "relationships": [
//!     { "child_table": "tasks", "child_column": "project_id",
//!       "parent_table": "projects", "parent_column": "id" }
//!   ]
//! }
//! ```
//!
//! Field names and nesting are load-bearing; they are the sole contract with
//! the extractor. Table order follows the JSON document order (serde_json is
//! built with `preserve_order`), and that order is what the similarity index
//! is built against, so a vector's position in the index always identifies
//! its table.
//!
//! A [`SchemaGraph`] is immutable after load. Schema changes are handled by
//! loading a fresh graph and swapping it into the retriever, never by
//! mutating a live one.

use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SqlSeerError};

/// One table definition: its name and column names in extraction order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub name: String,
    pub columns: Vec<String>,
}

impl TableDescription {
    /// Render the canonical one-line document used for semantic indexing:
    /// `"Table <name>: columns <c1>, <c2>, ..."`.
    pub fn document(&self) -> String {
        format!("Table {}: columns {}", self.name, self.columns.join(", "))
    }
}

/// A directed foreign-key edge: `child_table.child_column` references
/// `parent_table.parent_column`. Stored directionally, used symmetrically by
/// the relationship expander.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub child_table: String,
    pub child_column: String,
    pub parent_table: String,
    pub parent_column: String,
}

#[derive(Debug, Deserialize)]
struct ColumnEntry {
    column: String,
    #[serde(rename = "type")]
    #[allow(dead_code)]
    column_type: String,
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    tables: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

/// The full loaded schema: an ordered table list with a name lookup, plus
/// the relationship edges in extraction order.
#[derive(Debug)]
pub struct SchemaGraph {
    tables: Vec<TableDescription>,
    by_name: HashMap<String, usize>,
    relationships: Vec<Relationship>,
}

impl SchemaGraph {
    /// Load a schema description from a JSON file.
    ///
    /// Fails with [`SqlSeerError::SchemaLoad`] if the file is missing,
    /// unreadable, malformed, or inconsistent (see [`Self::from_json`]).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SqlSeerError::SchemaLoad(format!("cannot read {}: {e}", path.display()))
        })?;
        let graph = Self::from_json(&content)?;
        debug!(
            tables = graph.tables.len(),
            relationships = graph.relationships.len(),
            "schema loaded from {}",
            path.display()
        );
        Ok(graph)
    }

    /// Parse a schema description from a JSON string.
    ///
    /// Every relationship endpoint is validated against the tables map at
    /// load time; an edge naming an unknown table fails the whole load
    /// rather than surfacing later during expansion. An empty tables map is
    /// rejected as well: the index carries one vector per table, so a graph
    /// with no tables can never serve a retrieval.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawSchema = serde_json::from_str(content)
            .map_err(|e| SqlSeerError::SchemaLoad(format!("invalid schema JSON: {e}")))?;

        if raw.tables.is_empty() {
            return Err(SqlSeerError::SchemaLoad(
                "schema defines no tables; nothing to index".to_string(),
            ));
        }

        let mut tables = Vec::with_capacity(raw.tables.len());
        let mut by_name = HashMap::with_capacity(raw.tables.len());
        for (name, value) in raw.tables {
            let entries: Vec<ColumnEntry> = serde_json::from_value(value).map_err(|e| {
                SqlSeerError::SchemaLoad(format!("invalid columns for table `{name}`: {e}"))
            })?;
            let columns = entries.into_iter().map(|c| c.column).collect();
            by_name.insert(name.clone(), tables.len());
            tables.push(TableDescription { name, columns });
        }

        for rel in &raw.relationships {
            for endpoint in [&rel.child_table, &rel.parent_table] {
                if !by_name.contains_key(endpoint.as_str()) {
                    return Err(SqlSeerError::SchemaLoad(format!(
                        "relationship {}.{} -> {}.{} references unknown table `{endpoint}`",
                        rel.child_table, rel.child_column, rel.parent_table, rel.parent_column
                    )));
                }
            }
        }

        Ok(Self {
            tables,
            by_name,
            relationships: raw.relationships,
        })
    }

    /// Tables in document order. This order defines index positions.
    pub fn tables(&self) -> &[TableDescription] {
        &self.tables
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&TableDescription> {
        self.by_name.get(name).map(|&i| &self.tables[i])
    }

    /// Relationship edges in extraction order.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Number of tables in the graph.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_SCHEMA: &str = r#"{
        "tables": {
            "projects": [
                {"column": "id", "type": "int"},
                {"column": "project_name", "type": "varchar"}
            ],
            "tasks": [
                {"column": "id", "type": "int"},
                {"column": "project_id", "type": "int"},
                {"column": "title", "type": "varchar"}
            ]
        },
        "relationships": [
            {
                "child_table": "tasks",
                "child_column": "project_id",
                "parent_table": "projects",
                "parent_column": "id"
            }
        ]
    }"#;

    #[test]
    fn parses_tables_in_document_order() {
        let graph = SchemaGraph::from_json(SAMPLE_SCHEMA).unwrap();
        let names: Vec<&str> = graph.tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["projects", "tasks"]);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn renders_canonical_documents() {
        let graph = SchemaGraph::from_json(SAMPLE_SCHEMA).unwrap();
        let tasks = graph.table("tasks").unwrap();
        assert_eq!(
            tasks.document(),
            "Table tasks: columns id, project_id, title"
        );
    }

    #[test]
    fn keeps_column_extraction_order() {
        let graph = SchemaGraph::from_json(SAMPLE_SCHEMA).unwrap();
        let projects = graph.table("projects").unwrap();
        assert_eq!(projects.columns, ["id", "project_name"]);
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_SCHEMA.as_bytes()).unwrap();
        let graph = SchemaGraph::load(file.path()).unwrap();
        assert_eq!(graph.relationships().len(), 1);
    }

    #[test]
    fn missing_file_is_a_schema_load_error() {
        let err = SchemaGraph::load("non/existent/schema.json").unwrap_err();
        assert!(matches!(err, SqlSeerError::SchemaLoad(_)));
    }

    #[test]
    fn malformed_json_is_a_schema_load_error() {
        let err = SchemaGraph::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SqlSeerError::SchemaLoad(_)));
    }

    #[test]
    fn relationship_to_unknown_table_fails_load() {
        let schema = r#"{
            "tables": {
                "tasks": [{"column": "id", "type": "int"}]
            },
            "relationships": [
                {
                    "child_table": "tasks",
                    "child_column": "project_id",
                    "parent_table": "projects",
                    "parent_column": "id"
                }
            ]
        }"#;
        let err = SchemaGraph::from_json(schema).unwrap_err();
        match err {
            SqlSeerError::SchemaLoad(msg) => assert!(msg.contains("projects")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_tables_map_is_a_schema_load_error() {
        let err = SchemaGraph::from_json(r#"{"tables": {}}"#).unwrap_err();
        match err {
            SqlSeerError::SchemaLoad(msg) => assert!(msg.contains("no tables")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_relationships_field_defaults_to_empty() {
        let schema = r#"{"tables": {"t": [{"column": "id", "type": "int"}]}}"#;
        let graph = SchemaGraph::from_json(schema).unwrap();
        assert!(graph.relationships().is_empty());
    }
}
