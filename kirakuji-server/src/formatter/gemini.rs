//! Google Generative Language `generateContent` formatter

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Formatter, FormatterError, build_prompt, non_empty};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    candidate_count: u32,
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

/// `POST {base_url}/models/{model}:generateContent`
pub struct GeminiFormatter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiFormatter {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// 覆盖 API 地址 (代理 / 测试)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// 第一个候选里第一段非空文本
fn first_text(resp: GenerateResponse) -> Option<String> {
    resp.candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .find(|t| !t.trim().is_empty())
}

#[async_trait]
impl Formatter for GeminiFormatter {
    async fn format(&self, raw: &str) -> Result<String, FormatterError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_prompt(raw)),
                }],
            }],
            generation_config: GenerationConfig {
                candidate_count: 1,
                max_output_tokens: 512,
                temperature: 0.4,
            },
        };

        let resp = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FormatterError::Status { status, body });
        }

        let data: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| FormatterError::Malformed(e.to_string()))?;

        non_empty(first_text(data).as_deref())
    }

    fn provider(&self) -> &'static str {
        "gemini"
    }
}
