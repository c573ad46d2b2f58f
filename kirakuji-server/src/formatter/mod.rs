//! 文本整形 (LLM)
//!
//! 把匿名投稿改写成温和的公开文案。核心流程只依赖 [`Formatter`] trait；
//! 具体提供方：
//!
//! - [`OpenAiFormatter`] - OpenAI 兼容的 chat completions
//! - [`GeminiFormatter`] - Google Generative Language `generateContent`

pub mod gemini;
pub mod openai;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::{Config, ConfigError};

pub use gemini::GeminiFormatter;
pub use openai::OpenAiFormatter;

/// 单次 HTTP 请求超时 (整体时限由调用方另行控制)
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// 编辑提示词，两个提供方共用
const PROMPT_TEMPLATE: &str = "\
あなたは匿名の悩み相談を受け取り、投稿者を肯定しながら穏やかで前向きな 200 字以内の日本語メッセージに整形する編集者です。
- です・ます調で丁寧に書く
- URL や顔文字、箇条書きは禁止
- 余計な前置きは書かず、すぐ本文を書き始める

原文:
";

/// 生成发送给 LLM 的完整提示词
pub fn build_prompt(raw: &str) -> String {
    format!("{}{}", PROMPT_TEMPLATE, raw.trim())
}

/// 整形错误
#[derive(Debug, Error)]
pub enum FormatterError {
    #[error("formatter request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("formatter returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("formatter response malformed: {0}")]
    Malformed(String),

    #[error("formatter returned empty output")]
    EmptyOutput,

    #[error("formatter timed out after {0:?}")]
    Timeout(Duration),
}

/// 文本整形能力
#[async_trait]
pub trait Formatter: Send + Sync {
    /// 改写原文，返回非空文本
    async fn format(&self, raw: &str) -> Result<String, FormatterError>;

    /// 提供方名称 (日志用)
    fn provider(&self) -> &'static str;
}

/// LLM 提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    #[default]
    OpenAi,
    Gemini,
}

impl LlmProvider {
    /// 解析 `LLM_PROVIDER`，未设置或无法识别时回退到 OpenAI
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("gemini") => LlmProvider::Gemini,
            _ => LlmProvider::OpenAi,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Gemini => "gemini",
        }
    }

    /// 对应的 API key 环境变量
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 按配置构建 Formatter
pub fn from_config(config: &Config) -> Result<Arc<dyn Formatter>, ConfigError> {
    let missing = || ConfigError::MissingApiKey(config.llm_provider.api_key_var(), config.llm_provider);
    let formatter: Arc<dyn Formatter> = match config.llm_provider {
        LlmProvider::OpenAi => Arc::new(OpenAiFormatter::new(
            http_client(),
            config.openai_base_url.clone(),
            config.openai_api_key.clone().ok_or_else(missing)?,
            config.openai_model.clone(),
        )),
        LlmProvider::Gemini => Arc::new(GeminiFormatter::new(
            http_client(),
            config.gemini_api_key.clone().ok_or_else(missing)?,
            config.gemini_model.clone(),
        )),
    };
    tracing::info!(provider = formatter.provider(), "Formatter configured");
    Ok(formatter)
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// 清理提供方输出，空白视为错误
fn non_empty(text: Option<&str>) -> Result<String, FormatterError> {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(FormatterError::EmptyOutput),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse_falls_back_to_openai() {
        assert_eq!(LlmProvider::parse(None), LlmProvider::OpenAi);
        assert_eq!(LlmProvider::parse(Some("")), LlmProvider::OpenAi);
        assert_eq!(LlmProvider::parse(Some("claude")), LlmProvider::OpenAi);
        assert_eq!(LlmProvider::parse(Some("openai")), LlmProvider::OpenAi);
        assert_eq!(LlmProvider::parse(Some(" Gemini ")), LlmProvider::Gemini);
    }

    #[test]
    fn test_build_prompt_embeds_trimmed_raw() {
        let prompt = build_prompt("  つらい  \n");
        assert!(prompt.starts_with("あなたは匿名の悩み相談"));
        assert!(prompt.ends_with("原文:\nつらい"));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ok \n")).unwrap(), "ok");
        assert!(matches!(non_empty(Some("  ")), Err(FormatterError::EmptyOutput)));
        assert!(matches!(non_empty(None), Err(FormatterError::EmptyOutput)));
    }

    #[test]
    fn test_from_config_selects_provider() {
        let mut config = Config {
            openai_api_key: Some("sk-test".into()),
            ..Config::default()
        };
        assert_eq!(from_config(&config).unwrap().provider(), "openai");

        config.llm_provider = LlmProvider::Gemini;
        assert!(matches!(
            from_config(&config),
            Err(ConfigError::MissingApiKey("GEMINI_API_KEY", LlmProvider::Gemini))
        ));

        config.gemini_api_key = Some("g-test".into());
        assert_eq!(from_config(&config).unwrap().provider(), "gemini");
    }
}
