use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_API_BASE;
use crate::error::{MemoryBankError, Result};

use super::invoker::{AgentCallResult, AgentInvoker, AgentPrompt};
use super::AgentRole;

/// Runtime configuration for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct AgentClientConfig {
    pub endpoint: String,
    pub api_key: String,
}

impl AgentClientConfig {
    pub fn new(api_key: impl Into<String>, api_base: Option<&str>) -> Self {
        Self {
            endpoint: api_base.unwrap_or(DEFAULT_API_BASE).to_string(),
            api_key: api_key.into(),
        }
    }
}

/// Minimal chat message for chat-completions payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Token usage returned by chat-completions endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

pub struct AgentClient {
    config: AgentClientConfig,
    http: reqwest::Client,
}

impl AgentClient {
    pub fn new(config: AgentClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build().map_err(|e| {
            MemoryBankError::AgentInvocation(format!("failed to build agent http client: {}", e))
        })?;

        Ok(Self { config, http })
    }

    fn chat_completions_url(&self) -> String {
        let endpoint = self.config.endpoint.trim().trim_end_matches('/');
        if endpoint.ends_with("/chat/completions") {
            endpoint.to_string()
        } else if endpoint.ends_with("/v1") {
            format!("{}/chat/completions", endpoint)
        } else {
            format!("{}/v1/chat/completions", endpoint)
        }
    }
}

#[async_trait]
impl AgentInvoker for AgentClient {
    async fn invoke(
        &self,
        role: AgentRole,
        prompt: &AgentPrompt,
        model: &str,
        timeout: Duration,
    ) -> Result<AgentCallResult> {
        let url = self.chat_completions_url();
        let payload = ChatCompletionsRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage::system(prompt.instructions.clone()),
                ChatMessage::user(prompt.input.clone()),
            ],
            stream: Some(false),
        };

        tracing::debug!(agent = %role, %url, "sending chat completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .timeout(timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MemoryBankError::AgentTimeout(timeout.as_secs())
                } else {
                    MemoryBankError::AgentInvocation(format!(
                        "request failed (agent={}, model={}): {}",
                        role, model, e
                    ))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                MemoryBankError::AgentTimeout(timeout.as_secs())
            } else {
                MemoryBankError::AgentInvocation(format!("failed to read response body: {}", e))
            }
        })?;

        if !status.is_success() {
            return Err(MemoryBankError::AgentInvocation(format!(
                "endpoint returned HTTP {}: {}",
                status,
                truncate_for_error(&body)
            )));
        }

        let parsed: ChatCompletionsResponse = serde_json::from_str(&body).map_err(|e| {
            MemoryBankError::AgentInvocation(format!(
                "invalid JSON from endpoint: {} (body={})",
                e,
                truncate_for_error(&body)
            ))
        })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            MemoryBankError::AgentInvocation("response had no choices".to_string())
        })?;

        let markdown = choice
            .message
            .content
            .and_then(ChatContent::into_text)
            .ok_or_else(|| {
                MemoryBankError::AgentInvocation(
                    "response had empty message content".to_string(),
                )
            })?;

        let usage = parsed.usage.unwrap_or_default();
        let total_tokens = if usage.total_tokens > 0 {
            usage.total_tokens
        } else {
            usage.prompt_tokens + usage.completion_tokens
        };

        Ok(AgentCallResult {
            markdown,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens,
        })
    }
}

fn truncate_for_error(value: &str) -> String {
    const LIMIT: usize = 400;
    match value.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<ChatContent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ChatContentPart>),
}

impl ChatContent {
    fn into_text(self) -> Option<String> {
        let text = match self {
            ChatContent::Text(text) => text.trim().to_string(),
            ChatContent::Parts(parts) => parts
                .into_iter()
                .filter_map(|p| p.text)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ChatContentPart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn completion_body(content: &str) -> String {
        serde_json::json!({
            "choices": [
                {
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }
            ],
            "usage": { "prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150 }
        })
        .to_string()
    }

    async fn spawn_mock_agent_server(responses: Vec<(u16, String)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.expect("accept");
                let mut buf = vec![0_u8; 65536];
                let _ = socket.read(&mut buf).await;

                let response = format!(
                    "HTTP/1.1 {} MOCK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{}/v1", addr)
    }

    fn client_for(endpoint: String) -> AgentClient {
        AgentClient::new(AgentClientConfig {
            endpoint,
            api_key: "test-token".to_string(),
        })
        .expect("agent client")
    }

    fn prompt() -> AgentPrompt {
        AgentPrompt {
            instructions: "write a brief".to_string(),
            input: "PROJECT ANALYSIS CONTEXT".to_string(),
        }
    }

    #[tokio::test]
    async fn test_invoke_returns_markdown_and_usage() {
        let endpoint =
            spawn_mock_agent_server(vec![(200, completion_body("# Project Brief\n\nHello"))]).await;
        let client = client_for(endpoint);

        let result = client
            .invoke(
                AgentRole::ProjectBrief,
                &prompt(),
                "gpt-4.1-mini",
                Duration::from_secs(5),
            )
            .await
            .expect("invoke");

        assert_eq!(result.markdown, "# Project Brief\n\nHello");
        assert_eq!(result.prompt_tokens, 120);
        assert_eq!(result.completion_tokens, 30);
        assert_eq!(result.total_tokens, 150);
    }

    #[tokio::test]
    async fn test_invoke_reports_http_errors() {
        let endpoint = spawn_mock_agent_server(vec![(
            401,
            r#"{"error":{"message":"invalid api key"}}"#.to_string(),
        )])
        .await;
        let client = client_for(endpoint);

        let err = client
            .invoke(AgentRole::Progress, &prompt(), "gpt-4.1-mini", Duration::from_secs(5))
            .await
            .expect_err("401 must fail");

        match err {
            MemoryBankError::AgentInvocation(msg) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("invalid api key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_invoke_rejects_empty_content() {
        let endpoint = spawn_mock_agent_server(vec![(200, completion_body("   "))]).await;
        let client = client_for(endpoint);

        let err = client
            .invoke(AgentRole::Progress, &prompt(), "gpt-4.1-mini", Duration::from_secs(5))
            .await
            .expect_err("empty content must fail");

        assert!(err.to_string().contains("empty message content"));
    }

    #[tokio::test]
    async fn test_invoke_reports_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let client = client_for(format!("http://{}/v1", addr));
        let err = client
            .invoke(
                AgentRole::Progress,
                &prompt(),
                "gpt-4.1-mini",
                Duration::from_millis(200),
            )
            .await
            .expect_err("must time out");

        assert!(matches!(err, MemoryBankError::AgentTimeout(_)));
    }

    #[test]
    fn test_chat_completions_url_normalization() {
        let cases = [
            ("https://api.openai.com/v1", "https://api.openai.com/v1/chat/completions"),
            ("https://api.openai.com/v1/", "https://api.openai.com/v1/chat/completions"),
            ("http://localhost:8317", "http://localhost:8317/v1/chat/completions"),
            (
                "http://proxy.local/v1/chat/completions",
                "http://proxy.local/v1/chat/completions",
            ),
        ];
        for (endpoint, expected) in cases {
            let client = client_for(endpoint.to_string());
            assert_eq!(client.chat_completions_url(), expected);
        }
    }

    #[test]
    fn test_content_parts_are_joined() {
        let content: ChatContent = serde_json::from_value(serde_json::json!([
            {"type": "text", "text": "# Title"},
            {"type": "text", "text": "body"}
        ]))
        .unwrap();
        assert_eq!(content.into_text().as_deref(), Some("# Title\nbody"));
    }
}
