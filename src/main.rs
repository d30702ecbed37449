//! Main module for the sqlseer CLI application.
//!
//! This module provides the main function and auxiliary functionality for
//! the CLI: command parsing, configuration loading, pipeline wiring, and
//! dispatch to the appropriate subcommand.
//!
//! # Examples
//!
//! Asking for SQL:
//!
//! ```sh
//! sqlseer ask "list all task titles for project Alpha"
//! ```
//!
//! Initializing the configuration and a sample schema:
//!
//! ```sh
//! sqlseer init
//! ```

use std::{env, error::Error, fs};

use clap::Parser;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use sqlseer::{
    api, commands,
    config::{self, SqlSeerConfig},
    config_dir,
    prompt::compose_prompt,
    retriever::SchemaRetriever,
    schema::SchemaGraph,
    vector_store::SentenceEncoder,
};

static TRACING: OnceCell<()> = OnceCell::new();

fn main() -> Result<(), Box<dyn Error>> {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt::init();
    });
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run())
}

/// Main asynchronous function of the sqlseer CLI application.
///
/// Loads configuration, parses command-line arguments, and executes the
/// appropriate command.
async fn run() -> Result<(), Box<dyn Error>> {
    let cli = commands::Cli::parse();

    match cli.command {
        commands::Commands::Ask {
            question,
            schema,
            show_context,
        } => {
            let config = config::load_config(config_path()?.to_str().ok_or("bad config path")?)?;
            debug!("config loaded: {:?}", config);

            let schema_path = schema.unwrap_or_else(|| config.schema_path.clone());
            let graph = SchemaGraph::load(&schema_path)?;

            info!("loading sentence embedding model");
            let encoder = SentenceEncoder::load()?;
            let retriever = SchemaRetriever::new(encoder, graph)?;

            let (hits, context) = retriever.retrieve_with_context(&question, config.top_k)?;
            for hit in &hits {
                debug!(score = hit.score, "candidate: {}", hit.document);
            }
            if show_context {
                eprintln!("{context}\n");
            }

            let prompt = compose_prompt(&question, &context);
            let sql = api::generate_sql(&config, &prompt).await?;
            println!("{sql}");
        }
        commands::Commands::Init => {
            debug!("initializing configuration");
            init()?;
        }
    }

    Ok(())
}

/// Resolve the config file path: `SQLSEER_CONFIG` if set, otherwise
/// `config.yaml` in the platform config directory.
fn config_path() -> Result<std::path::PathBuf, Box<dyn Error>> {
    if let Ok(path) = env::var("SQLSEER_CONFIG") {
        return Ok(path.into());
    }
    Ok(config_dir()?.join("config.yaml"))
}

/// Initializes the application's configuration and a sample schema.
///
/// Creates the configuration directory, a starter `config.yaml`, and a
/// `schema.json` matching the extractor contract so the pipeline can be
/// tried immediately.
fn init() -> Result<(), Box<dyn Error>> {
    let config_dir = config_dir()?;
    info!("creating config directory: {}", config_dir.display());
    fs::create_dir_all(&config_dir)?;

    let schema_path = config_dir.join("schema.json");
    info!("creating sample schema: {}", schema_path.display());
    let sample_schema = r#"{
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
}
"#;
    fs::write(&schema_path, sample_schema)?;

    let config_path = config_dir.join("config.yaml");
    info!("creating config file: {}", config_path.display());
    let config = SqlSeerConfig {
        api_base: "http://localhost:11434/v1".to_string(),
        api_key: "CHANGEME".to_string(),
        model: "llama3".to_string(),
        schema_path: schema_path.to_string_lossy().to_string(),
        max_tokens: 512,
        request_timeout_secs: 30,
        top_k: 1,
    };
    let config_yaml = serde_yaml::to_string(&config)?;
    fs::write(config_path, config_yaml)?;

    Ok(())
}
