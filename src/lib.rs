//! # sqlseer (library root)
//!
//! Schema-aware retrieval-augmented generation for natural-language → SQL.
//!
//! The pipeline, leaves first:
//! - [`schema`]: the in-memory schema store loaded from the extractor's JSON
//!   description.
//! - [`vector_store`]: the MiniLM sentence encoder (Candle) and the exact
//!   inner-product index over table documents.
//! - [`retriever`]: top-k table retrieval plus one-hop foreign-key expansion
//!   into a grounding context string.
//! - [`prompt`]: the fixed instruction template.
//! - [`api`]: the non-streaming generation call and SQL sanitization.
//!
//! Control flow for one question:
//!
//! ```text
//! question -> encode -> top-1 table match -> foreign-key expansion
//!          -> context string -> prompt -> generation backend -> one-line SQL
//! ```
//!
//! The encoder and index are built once at startup and then only read;
//! nothing in the request path mutates them. Swapping in a new schema goes
//! through [`retriever::SchemaRetriever::reload`], which replaces the whole
//! (graph, documents, index) triple at once.

use std::error::Error;

use directories::ProjectDirs;

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod prompt;
pub mod retriever;
pub mod schema;
pub mod vector_store;

/// Return the per-platform configuration directory used by sqlseer.
///
/// This uses [`directories::ProjectDirs`] with the application triple
/// `("com", "sqlseer", "sqlseer")`, so you get the right place on each OS
/// (e.g. `~/.config/sqlseer` on Linux via XDG).
///
/// The directory is **not** created by this function; callers that need it
/// should create it with `fs::create_dir_all`.
///
/// # Errors
/// Returns an error if the platform configuration directory cannot be
/// determined.
pub fn config_dir() -> Result<std::path::PathBuf, Box<dyn Error>> {
    let proj_dirs = ProjectDirs::from("com", "sqlseer", "sqlseer")
        .ok_or("Unable to determine config directory")?;
    Ok(proj_dirs.config_dir().to_path_buf())
}
