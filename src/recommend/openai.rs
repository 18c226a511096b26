//! OpenAI-compatible chat/image client implementing [`TextGenerator`].

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{prompts, GeneratorError, TextGenerator};
use crate::config::AiConfig;

pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    image_enabled: bool,
    image_model: String,
}

impl OpenAiGenerator {
    pub fn new(cfg: &AiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", cfg.api_key))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            image_enabled: cfg.image_enabled,
            image_model: cfg.image_model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn text(&self, prompt: &str) -> Result<String, GeneratorError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(model = %self.model, "requesting chat completion");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompts::SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let resp = self.client.post(&url).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GeneratorError::Status(status));
        }

        let body: ChatResponse = resp.json().await?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or(GeneratorError::MalformedResponse)
    }

    async fn image_url(&self, prompt: &str) -> Result<String, GeneratorError> {
        if !self.image_enabled {
            return Err(GeneratorError::Disabled);
        }
        let url = format!("{}/v1/images/generations", self.base_url);
        debug!(model = %self.image_model, "requesting image generation");

        let request = ImageRequest {
            model: &self.image_model,
            prompt,
            n: 1,
            size: "1024x1024",
        };

        let resp = self.client.post(&url).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GeneratorError::Status(status));
        }

        let body: ImageResponse = resp.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|d| d.url)
            .ok_or(GeneratorError::MalformedResponse)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator_for(server: &MockServer, image_enabled: bool) -> OpenAiGenerator {
        OpenAiGenerator::new(&AiConfig {
            enabled: true,
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 300,
            temperature: 0.7,
            image_enabled,
            image_model: "dall-e-3".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn extracts_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-3.5-turbo"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "content": "  Strong site.  " } } ]
            })))
            .mount(&server)
            .await;

        let text = generator_for(&server, false).text("prompt").await.unwrap();
        assert_eq!(text, "Strong site.");
    }

    #[tokio::test]
    async fn upstream_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = generator_for(&server, false).text("prompt").await.unwrap_err();
        assert!(matches!(err, GeneratorError::Status(s) if s.as_u16() == 429));
    }

    #[tokio::test]
    async fn empty_choices_are_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let err = generator_for(&server, false).text("prompt").await.unwrap_err();
        assert!(matches!(err, GeneratorError::MalformedResponse));
    }

    #[tokio::test]
    async fn image_generation_disabled_by_default() {
        let server = MockServer::start().await;
        let err = generator_for(&server, false)
            .image_url("prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Disabled));
    }

    #[tokio::test]
    async fn image_generation_returns_first_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [ { "url": "https://img.example/site.png" } ]
            })))
            .mount(&server)
            .await;

        let url = generator_for(&server, true).image_url("prompt").await.unwrap();
        assert_eq!(url, "https://img.example/site.png");
    }
}
