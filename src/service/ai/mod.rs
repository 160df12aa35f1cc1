//! ai module: OpenAI-compatible chat-completions client.
//! - All language-model HTTP I/O stays here; the orchestrator only sees the ports.
//! - Errors are mapped to the port error types at the trait boundary.

use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::shared::config::{self, AiConfig};
use crate::shared::entities::{ChatMessage, PartialPharmacyProfile, Role};
use crate::shared::error::ai::{ExtractionError, ReplyError};
use crate::shared::ports::ai::{AiFuture, ExtractionPort, ReplyContext, ReplyPort};

pub mod extraction;
mod prompt;
pub mod reply;

pub use extraction::{parse_extraction_json, LeadExtractor};
pub use reply::build_system_prompt;

const REPLY_MAX_TOKENS: u32 = 500;
const REPLY_TEMPERATURE: f32 = 0.7;
const EXTRACTION_MAX_TOKENS: u32 = 200;
const EXTRACTION_TEMPERATURE: f32 = 0.1;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize, Clone)]
struct CompletionMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

/// Chat-completions client used for both reply generation and field extraction.
#[derive(Clone)]
pub struct OpenAiClient {
    config: AiConfig,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(config: AiConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    pub fn from_env() -> Self {
        extraction::init_extraction_prompt();
        reply::init_reply_prompt();
        Self::new(config::ai_config().clone(), config::timeouts().ai_http)
    }

    pub fn is_configured(&self) -> bool {
        self.config.openai_api_key.is_some()
    }

    async fn complete(
        &self,
        model: &str,
        messages: Vec<CompletionMessage>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Option<String>> {
        let api_key = self
            .config
            .openai_api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OPENAI_API_KEY not set"))?;
        let client = http_client(self.timeout)?;
        let url = format!("{}/chat/completions", self.config.openai_base_url);
        let req = ChatCompletionRequest {
            model,
            messages,
            max_tokens,
            temperature,
        };

        let resp = client
            .post(&url)
            .bearer_auth(api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        let body_text = resp.text().await?;
        log::debug!(
            "[ai] model={} status={} body_len={}",
            model,
            status,
            body_text.len()
        );

        if !status.is_success() {
            anyhow::bail!("chat completion HTTP error {}: {}", status, body_text);
        }

        let body: ChatCompletionResponse = serde_json::from_str(&body_text)?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }

    async fn generate(&self, context: ReplyContext) -> Result<String, ReplyError> {
        if !self.is_configured() {
            return Err(ReplyError::NotConfigured);
        }
        let messages = reply_messages(&build_system_prompt(&context), &context.transcript);
        let answer = self
            .complete(
                &self.config.chat_model,
                messages,
                REPLY_MAX_TOKENS,
                REPLY_TEMPERATURE,
            )
            .await
            .map_err(|e| ReplyError::GenerationFailed(e.to_string()))?;
        match answer {
            Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => Err(ReplyError::EmptyResponse),
        }
    }

    async fn extract(&self, utterance: String) -> Result<PartialPharmacyProfile, ExtractionError> {
        if !self.is_configured() {
            return Err(ExtractionError::NotConfigured);
        }
        let messages = vec![CompletionMessage {
            role: "user".to_string(),
            content: Some(extraction::extraction_prompt(&utterance)),
        }];
        let answer = self
            .complete(
                &self.config.extraction_model,
                messages,
                EXTRACTION_MAX_TOKENS,
                EXTRACTION_TEMPERATURE,
            )
            .await
            .map_err(|e| ExtractionError::RequestFailed(e.to_string()))?;
        parse_extraction_json(answer.as_deref().unwrap_or("{}"))
    }
}

fn reply_messages(system_prompt: &str, transcript: &[ChatMessage]) -> Vec<CompletionMessage> {
    let mut messages = Vec::with_capacity(transcript.len() + 1);
    messages.push(CompletionMessage {
        role: "system".to_string(),
        content: Some(system_prompt.to_string()),
    });
    for msg in transcript {
        messages.push(CompletionMessage {
            role: role_name(msg.role).to_string(),
            content: Some(msg.content.clone()),
        });
    }
    messages
}

impl ReplyPort for OpenAiClient {
    fn generate_reply(&self, context: ReplyContext) -> AiFuture<Result<String, ReplyError>> {
        let client = self.clone();
        Box::pin(async move { client.generate(context).await })
    }
}

impl ExtractionPort for OpenAiClient {
    fn extract_fields(
        &self,
        utterance: String,
    ) -> AiFuture<Result<PartialPharmacyProfile, ExtractionError>> {
        let client = self.clone();
        Box::pin(async move { client.extract(utterance).await })
    }
}
