//! # Generation client
//!
//! This module handles the single call to the OpenAI-compatible generation
//! backend and the normalization of its raw answer into a one-line SQL
//! string.
//!
//! The call is non-streaming: the pipeline waits for the complete response,
//! bounded by the configured request timeout. The sanitization steps are
//! part of the contract, applied in this exact order:
//!
//! 1. strip ```` ```sql ```` / ```` ``` ```` fence markers (marker tokens
//!    only, not other fence variants),
//! 2. replace line breaks with spaces,
//! 3. collapse whitespace runs into single spaces,
//! 4. trim.
//!
//! No SQL validation happens here; a cleaned string that merely looks like
//! SQL is the whole promise.

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs,
    },
};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::timeout;
use tracing::debug;

use crate::{
    config::SqlSeerConfig,
    error::{Result, SqlSeerError},
};

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Creates a client for the configured OpenAI-compatible backend.
fn create_client(config: &SqlSeerConfig) -> Client<OpenAIConfig> {
    let openai_config = OpenAIConfig::new()
        .with_api_key(config.api_key.clone())
        .with_api_base(config.api_base.clone());
    Client::with_config(openai_config)
}

/// Normalize a raw backend response into a single-line SQL string.
///
/// Idempotent: applying it to an already-clean single-line string returns
/// the same string.
pub fn sanitize_sql(raw: &str) -> String {
    let without_fences = raw.replace("```sql", "").replace("```", "");
    let single_line = without_fences.replace(['\n', '\r'], " ");
    WHITESPACE_RUN
        .replace_all(&single_line, " ")
        .trim()
        .to_string()
}

/// Send `prompt` to the generation backend and return the sanitized SQL.
///
/// # Errors
/// - [`SqlSeerError::GenerationTimeout`] if the backend does not answer
///   within `config.request_timeout()`.
/// - [`SqlSeerError::GenerationBackend`] if the backend is unreachable or
///   returns a non-success status.
/// - [`SqlSeerError::EmptyGeneration`] if the response carries no usable
///   text.
pub async fn generate_sql(config: &SqlSeerConfig, prompt: &str) -> Result<String> {
    let client = create_client(config);

    let user_message = ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
        content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
        name: None,
    });

    let request = CreateChatCompletionRequestArgs::default()
        .max_tokens(config.max_tokens)
        .model(config.model.clone())
        .stream(false)
        .messages(vec![user_message])
        .build()?;

    debug!(model = %config.model, "sending generation request");

    let request_timeout = config.request_timeout();
    let response = timeout(request_timeout, client.chat().create(request))
        .await
        .map_err(|_| SqlSeerError::GenerationTimeout(request_timeout))??;

    let mut response_string = String::new();
    for chat_choice in &response.choices {
        if let Some(ref content) = chat_choice.message.content {
            response_string.push_str(content);
        }
    }

    if response_string.trim().is_empty() {
        return Err(SqlSeerError::EmptyGeneration);
    }

    Ok(sanitize_sql(&response_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn mock_config(api_base: String, timeout_secs: u64) -> SqlSeerConfig {
        SqlSeerConfig {
            api_base,
            api_key: "test".to_string(),
            model: "llama3".to_string(),
            schema_path: "schema.json".to_string(),
            max_tokens: 256,
            request_timeout_secs: timeout_secs,
            top_k: 1,
        }
    }

    fn completion_body(content: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 0,
            "model": "llama3",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    #[test]
    fn sanitize_strips_sql_fence() {
        assert_eq!(
            sanitize_sql("```sql\nSELECT * FROM tasks\n```"),
            "SELECT * FROM tasks"
        );
    }

    #[test]
    fn sanitize_flattens_multiline_sql() {
        let raw = "SELECT t.title\nFROM tasks t\r\n  JOIN projects p ON p.id = t.project_id";
        assert_eq!(
            sanitize_sql(raw),
            "SELECT t.title FROM tasks t JOIN projects p ON p.id = t.project_id"
        );
    }

    #[test]
    fn sanitize_collapses_whitespace_runs() {
        assert_eq!(sanitize_sql("SELECT   *\t FROM   tasks"), "SELECT * FROM tasks");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let clean = "SELECT p.project_name FROM projects p";
        assert_eq!(sanitize_sql(clean), clean);
        assert_eq!(sanitize_sql(&sanitize_sql(clean)), clean);
    }

    #[tokio::test]
    async fn generate_sql_cleans_fenced_response() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200)
                    .json_body(completion_body(json!("```sql\nSELECT * FROM tasks\n```")));
            })
            .await;

        let config = mock_config(server.base_url(), 5);
        let sql = generate_sql(&config, "prompt").await.unwrap();

        mock.assert_async().await;
        assert_eq!(sql, "SELECT * FROM tasks");
    }

    #[tokio::test]
    async fn generate_sql_empty_content_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(completion_body(json!("")));
            })
            .await;

        let config = mock_config(server.base_url(), 5);
        let err = generate_sql(&config, "prompt").await.unwrap_err();
        assert!(matches!(err, SqlSeerError::EmptyGeneration));
    }

    #[tokio::test]
    async fn generate_sql_backend_error_is_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(400).json_body(json!({
                    "error": {
                        "message": "model not found",
                        "type": "invalid_request_error",
                        "param": null,
                        "code": null
                    }
                }));
            })
            .await;

        let config = mock_config(server.base_url(), 5);
        let err = generate_sql(&config, "prompt").await.unwrap_err();
        assert!(matches!(err, SqlSeerError::GenerationBackend(_)));
    }

    #[tokio::test]
    async fn generate_sql_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200)
                    .delay(std::time::Duration::from_secs(3))
                    .json_body(completion_body(json!("SELECT 1")));
            })
            .await;

        let config = mock_config(server.base_url(), 1);
        let err = generate_sql(&config, "prompt").await.unwrap_err();
        assert!(matches!(err, SqlSeerError::GenerationTimeout(_)));
    }
}
