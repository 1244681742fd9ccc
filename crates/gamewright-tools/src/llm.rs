use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use gamewright_core::config::ModelConfig;
use gamewright_core::error::{GamewrightError, Result};
use gamewright_core::traits::{AgentExecutor, AgentRequest};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Agent executor backed by an OpenAI-compatible chat-completions endpoint.
///
/// One request per unit of work, non-streaming: the role becomes the system
/// message, upstream context and task inputs fold into the user message.
pub struct LlmExecutor {
    config: ModelConfig,
    http: Client,
}

impl LlmExecutor {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequestMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Fold a request's context and inputs into one user message.
fn build_user_message(request: &AgentRequest) -> String {
    let mut message = String::new();

    if !request.context.is_empty() {
        message.push_str("## Context\n\n");
        for (i, text) in request.context.iter().enumerate() {
            message.push_str(&format!("### Upstream output {}\n{}\n\n", i + 1, text));
        }
        message.push_str("---\n\n");
    }

    if !request.inputs.is_empty() {
        message.push_str("## Inputs\n\n");
        for (key, value) in &request.inputs {
            message.push_str(&format!("**{}**: {}\n", key, value));
        }
        message.push('\n');
    }

    message.push_str(&request.goal);
    message
}

impl AgentExecutor for LlmExecutor {
    fn execute(&self, request: AgentRequest) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let api_key = self
                .config
                .api_key
                .clone()
                .ok_or_else(|| GamewrightError::MissingCredential("chat model".into()))?;

            let url = self
                .config
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_API_URL.to_string());

            let body = ChatRequest {
                model: self.config.model_id.clone(),
                messages: vec![
                    ChatRequestMessage {
                        role: "system".into(),
                        content: format!("You are {}.", request.role),
                    },
                    ChatRequestMessage {
                        role: "user".into(),
                        content: build_user_message(&request),
                    },
                ],
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            };

            debug!(role = %request.role, model = %self.config.model_id, "Chat request");

            let resp = self
                .http
                .post(&url)
                .bearer_auth(&api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| GamewrightError::Upstream {
                    service: "chat".into(),
                    message: e.to_string(),
                })?;

            let status = resp.status();
            if !status.is_success() {
                let detail = resp.text().await.unwrap_or_default();
                return Err(GamewrightError::Upstream {
                    service: "chat".into(),
                    message: format!("HTTP {}: {}", status.as_u16(), detail),
                });
            }

            let parsed: ChatResponse = resp.json().await.map_err(|e| GamewrightError::Upstream {
                service: "chat".into(),
                message: e.to_string(),
            })?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| GamewrightError::Upstream {
                    service: "chat".into(),
                    message: "response contained no content".into(),
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_includes_context_and_inputs() {
        let request = AgentRequest::new("Lead Game Designer", "Expand the concept.")
            .with_context(vec!["previous design notes".into()])
            .with_input("Storyline", "A hero's journey");

        let message = build_user_message(&request);
        assert!(message.contains("## Context"));
        assert!(message.contains("previous design notes"));
        assert!(message.contains("**Storyline**: A hero's journey"));
        assert!(message.ends_with("Expand the concept."));
    }

    #[test]
    fn test_user_message_bare_goal() {
        let request = AgentRequest::new("QA Lead", "Review the game.");
        assert_eq!(build_user_message(&request), "Review the game.");
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let executor = LlmExecutor::new(ModelConfig::default());
        let err = executor
            .execute(AgentRequest::new("role", "goal"))
            .await
            .unwrap_err();
        assert!(matches!(err, GamewrightError::MissingCredential(_)));
    }
}
