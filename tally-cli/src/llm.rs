use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            other => bail!("unknown llm provider '{other}' (expected openai or anthropic)"),
        }
    }

    pub fn key_var(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    pub fn from_section(section: &LlmSection) -> Result<Self> {
        Ok(Self {
            provider: Provider::parse(&section.provider)?,
            model: section.model.clone(),
            temperature: section.temperature,
            max_tokens: section.max_tokens,
        })
    }

    fn api_key(&self) -> Result<String> {
        let var = self.provider.key_var();
        std::env::var(var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .with_context(|| format!("{var} is not set"))
    }
}

/// One-shot completion. Safe to call from inside the CLI's tokio runtime.
pub fn complete(config: &LlmConfig, system: &str, prompt: &str) -> Result<String> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        tokio::task::block_in_place(|| handle.block_on(complete_async(config, system, prompt)))
    } else {
        let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
        rt.block_on(complete_async(config, system, prompt))
    }
}

async fn complete_async(config: &LlmConfig, system: &str, prompt: &str) -> Result<String> {
    let key = config.api_key()?;
    debug!("Requesting narrative from {:?} model {}", config.provider, config.model);
    match config.provider {
        Provider::Anthropic => anthropic_complete(config, &key, system, prompt).await,
        Provider::OpenAI => openai_complete(config, &key, system, prompt).await,
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

async fn anthropic_complete(config: &LlmConfig, key: &str, system: &str, prompt: &str) -> Result<String> {
    #[derive(Serialize)]
    struct Req<'a> {
        model: &'a str,
        max_tokens: u32,
        temperature: f32,
        system: &'a str,
        messages: Vec<Msg<'a>>,
    }

    #[derive(Deserialize)]
    struct Resp {
        content: Vec<ContentBlock>,
    }

    #[derive(Deserialize)]
    struct ContentBlock {
        #[serde(rename = "type")]
        t: String,
        text: Option<String>,
    }

    let body = Req {
        model: &config.model,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        system,
        messages: vec![Msg {
            role: "user",
            content: prompt,
        }],
    };

    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", HeaderValue::from_str(key).context("invalid ANTHROPIC_API_KEY")?);
    headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let resp = reqwest::Client::new()
        .post("https://api.anthropic.com/v1/messages")
        .headers(headers)
        .json(&body)
        .send()
        .await
        .context("anthropic request")?;

    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        bail!("anthropic error: {status} {txt}");
    }

    let out: Resp = resp.json().await.context("parse anthropic response")?;
    let text: String = out
        .content
        .into_iter()
        .filter(|b| b.t == "text")
        .filter_map(|b| b.text)
        .collect();
    Ok(text.trim().to_string())
}

async fn openai_complete(config: &LlmConfig, key: &str, system: &str, prompt: &str) -> Result<String> {
    #[derive(Serialize)]
    struct Req<'a> {
        model: &'a str,
        messages: Vec<Msg<'a>>,
        temperature: f32,
        max_tokens: u32,
    }

    #[derive(Deserialize)]
    struct Resp {
        choices: Vec<Choice>,
    }

    #[derive(Deserialize)]
    struct Choice {
        message: MsgOut,
    }

    #[derive(Deserialize)]
    struct MsgOut {
        content: Option<String>,
    }

    let body = Req {
        model: &config.model,
        messages: vec![
            Msg {
                role: "system",
                content: system,
            },
            Msg {
                role: "user",
                content: prompt,
            },
        ],
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    let resp = reqwest::Client::new()
        .post("https://api.openai.com/v1/chat/completions")
        .header(AUTHORIZATION, format!("Bearer {key}"))
        .json(&body)
        .send()
        .await
        .context("openai request")?;

    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        bail!("openai error: {status} {txt}");
    }

    let out: Resp = resp.json().await.context("parse openai response")?;
    let text = out
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    Ok(text.trim().to_string())
}
