//! OpenAI-compatible chat completions formatter

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Formatter, FormatterError, build_prompt, non_empty};

const TEMPERATURE: f32 = 0.4;
const MAX_TOKENS: u32 = 512;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// `POST {base_url}/chat/completions`
pub struct OpenAiFormatter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiFormatter {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Formatter for OpenAiFormatter {
    async fn format(&self, raw: &str) -> Result<String, FormatterError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(raw),
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FormatterError::Status { status, body });
        }

        let data: ChatResponse = resp
            .json()
            .await
            .map_err(|e| FormatterError::Malformed(e.to_string()))?;

        let text = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);
        non_empty(text.as_deref())
    }

    fn provider(&self) -> &'static str {
        "openai"
    }
}
