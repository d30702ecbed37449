//! # Schema retriever
//!
//! Ties the loaded [`SchemaGraph`], its rendered document list, and the
//! [`FlatIndex`] built over those documents into one immutable snapshot, and
//! answers the two retrieval questions the pipeline needs:
//!
//! - which table is the closest semantic match for a question, and
//! - which tables are one foreign-key hop away from it.
//!
//! The three snapshot parts are built in a single pass over the graph's
//! table order, so an index position always identifies both a document and
//! its source table. Reloading a schema swaps the whole snapshot behind an
//! `RwLock<Arc<_>>`; a request that started on the old snapshot finishes on
//! the old snapshot.

use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::{
    error::{Result, SqlSeerError},
    schema::SchemaGraph,
    vector_store::{FlatIndex, SentenceEncoder},
};

/// One retrieval hit: a document, its corpus position, and its similarity
/// score. Ephemeral, per-request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDoc {
    pub position: usize,
    pub document: String,
    pub score: f32,
}

/// Tables one foreign-key hop from `main_table`, in relationship-list order.
///
/// An edge counts regardless of direction: if `main_table` is the child the
/// parent is returned, and vice versa. Duplicate edges yield duplicate
/// entries; nothing is deduplicated.
pub fn expand<'a>(main_table: &str, graph: &'a SchemaGraph) -> Vec<&'a str> {
    let mut related = Vec::new();
    for rel in graph.relationships() {
        if rel.child_table == main_table {
            related.push(rel.parent_table.as_str());
        } else if rel.parent_table == main_table {
            related.push(rel.child_table.as_str());
        }
    }
    related
}

/// Immutable (graph, documents, index) triple. Never rebuilt piecewise.
struct Snapshot {
    graph: SchemaGraph,
    documents: Vec<String>,
    index: FlatIndex,
}

impl Snapshot {
    /// Render documents and build the index in one pass over table order.
    fn build(encoder: &SentenceEncoder, graph: SchemaGraph) -> Result<Self> {
        let documents: Vec<String> = graph.tables().iter().map(|t| t.document()).collect();
        let vectors = encoder.encode_batch(&documents)?;
        let index = FlatIndex::build(vectors)?;
        Ok(Self {
            graph,
            documents,
            index,
        })
    }

    /// Context string for the table at `position`: its own document followed
    /// by one document per related table, newline-joined, expansion order.
    fn context_at(&self, position: usize) -> Result<String> {
        let main_table = &self.graph.tables()[position].name;
        let mut lines = vec![self.documents[position].clone()];
        for related in expand(main_table, &self.graph) {
            let table = self
                .graph
                .table(related)
                .ok_or_else(|| SqlSeerError::UnknownRelatedTable(related.to_string()))?;
            lines.push(table.document());
        }
        Ok(lines.join("\n"))
    }
}

/// Retrieval service: one encoder, one swappable snapshot.
///
/// Built explicitly at startup and shared read-only across requests. The
/// encoder is fixed for the retriever's lifetime so document and query
/// vectors always come from the same model configuration.
pub struct SchemaRetriever {
    encoder: SentenceEncoder,
    state: RwLock<Arc<Snapshot>>,
}

impl SchemaRetriever {
    /// Build a retriever over `graph`, embedding every table document.
    pub fn new(encoder: SentenceEncoder, graph: SchemaGraph) -> Result<Self> {
        let snapshot = Snapshot::build(&encoder, graph)?;
        info!(tables = snapshot.documents.len(), "schema index built");
        Ok(Self {
            encoder,
            state: RwLock::new(Arc::new(snapshot)),
        })
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        self.state
            .read()
            .expect("retriever state lock poisoned")
            .clone()
    }

    /// Replace the schema, rebuilding documents and index together.
    ///
    /// In-flight requests keep the snapshot they started with.
    pub fn reload(&self, graph: SchemaGraph) -> Result<()> {
        let snapshot = Snapshot::build(&self.encoder, graph)?;
        info!(tables = snapshot.documents.len(), "schema index reloaded");
        *self.state.write().expect("retriever state lock poisoned") = Arc::new(snapshot);
        Ok(())
    }

    /// Top-`k` table documents for a question, best first.
    pub fn retrieve(&self, question: &str, k: usize) -> Result<Vec<RetrievedDoc>> {
        let snapshot = self.snapshot();
        let query = self.encoder.encode(question)?;
        let hits = snapshot.index.search(&query, k)?;
        debug!(?hits, "retrieval hits for question");
        Ok(hits
            .into_iter()
            .map(|(position, score)| RetrievedDoc {
                position,
                document: snapshot.documents[position].clone(),
                score,
            })
            .collect())
    }

    /// Top-`k` hits plus the grounding context of the best hit, from a
    /// single question encoding against a single snapshot.
    ///
    /// The context is always expanded from the top-1 match; a wider `k`
    /// only widens the returned hit list.
    pub fn retrieve_with_context(
        &self,
        question: &str,
        k: usize,
    ) -> Result<(Vec<RetrievedDoc>, String)> {
        let snapshot = self.snapshot();
        let query = self.encoder.encode(question)?;
        let hits = snapshot.index.search(&query, k)?;
        debug!(?hits, "retrieval hits for question");
        let context = snapshot.context_at(hits[0].0)?;
        let docs = hits
            .into_iter()
            .map(|(position, score)| RetrievedDoc {
                position,
                document: snapshot.documents[position].clone(),
                score,
            })
            .collect();
        Ok((docs, context))
    }

    /// The grounding context for a question: the top-1 table's document plus
    /// the documents of every table one foreign-key hop away.
    pub fn related_context(&self, question: &str) -> Result<String> {
        let (_, context) = self.retrieve_with_context(question, 1)?;
        Ok(context)
    }
}
