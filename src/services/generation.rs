//! Answer-generation capability and the Anthropic-backed client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::models::GenerationConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Produces an answer to `query`, conditioned on `context` when non-empty.
///
/// An empty context slice means ungrounded generation; implementations must
/// not treat it as an error.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, query: &str, context: &[String]) -> Result<String, GenerationError>;
}

/// Build the user-turn prompt for grounded or ungrounded generation.
///
/// With context, the retrieved chunks are presented as the user's own notes
/// and the model is told to answer from them; without, the query passes
/// through unchanged.
pub fn answer_prompt(query: &str, context: &[String]) -> String {
    if context.is_empty() {
        return query.to_string();
    }

    let notes = context.join("\n\n---\n\n");
    format!(
        "You are a personal assistant answering from the user's saved notes.\n\
         Ground your answer in the notes below; if they do not cover the \
         question, say so and answer from general knowledge.\n\n\
         Notes:\n{notes}\n\nQuestion: {query}"
    )
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Anthropic messages-API client.
#[derive(Debug, Clone)]
pub struct AnthropicGenerator {
    client: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    api_key: String,
}

impl AnthropicGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .resolve_api_key()
            .ok_or(GenerationError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
        })
    }
}

#[async_trait]
impl Generator for AnthropicGenerator {
    async fn generate(&self, query: &str, context: &[String]) -> Result<String, GenerationError> {
        let url = format!("{}/v1/messages", self.base_url);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: answer_prompt(query, context),
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ServerError(format!(
                "status {status}: {body}"
            )));
        }

        let messages_response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let answer = messages_response
            .content
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string();

        if answer.is_empty() {
            return Err(GenerationError::InvalidResponse(
                "response contained no text".to_string(),
            ));
        }

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ungrounded_prompt_is_bare_query() {
        assert_eq!(answer_prompt("what is rust?", &[]), "what is rust?");
    }

    #[test]
    fn test_grounded_prompt_contains_all_chunks() {
        let context = vec!["first note".to_string(), "second note".to_string()];
        let prompt = answer_prompt("what did I save?", &context);
        assert!(prompt.contains("first note"));
        assert!(prompt.contains("second note"));
        assert!(prompt.contains("what did I save?"));
    }

    #[test]
    fn test_client_creation() {
        let config = GenerationConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        assert!(AnthropicGenerator::new(&config).is_ok());
    }
}
