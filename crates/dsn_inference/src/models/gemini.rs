use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use dsn_core::config::InferenceSettings;
use dsn_core::{Error, InferenceModel, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::text::count_sentences;

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateRequest {
    fn new(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 1024,
            },
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

fn language_name(code: &str) -> &str {
    match code {
        "ko" => "Korean",
        "en" => "English",
        "ja" => "Japanese",
        "zh" => "Chinese",
        other => other,
    }
}

/// Google Gemini through the `generateContent` REST endpoint.
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    summary_sentences: usize,
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiModel {
    pub fn new(settings: &InferenceSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Inference("Gemini API key is required".to_string()))?;
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            api_key,
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            summary_sentences: settings.summary_sentences,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn summary_prompt(&self, title: &str, content: &str) -> String {
        format!(
            "다음 기술 글을 정확히 {n}문장으로 요약해주세요. 핵심 내용과 결론을 포함하되 한국어로 답변하세요:\n\n\
             제목: {title}\n\n내용: {content}\n\n요약 (정확히 {n}문장):",
            n = self.summary_sentences,
            title = title,
            content = content,
        )
    }

    fn translation_prompt(text: &str, target: &str) -> String {
        format!(
            "Translate the following technical text into natural {}. \
             Translate technical terms accurately and keep code and symbols unchanged. \
             Output only the translation.\n\n{}",
            language_name(target),
            text
        )
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateRequest::new(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Gemini returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json::<GenerateResponse>()
            .await?
            .text()
            .ok_or_else(|| Error::Inference("Gemini returned an empty response".to_string()))
    }
}

#[async_trait]
impl InferenceModel for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        debug!("Translating {} chars into {}", text.chars().count(), target);
        self.generate(Self::translation_prompt(text, target)).await
    }

    async fn summarize(&self, title: &str, content: &str) -> Result<String> {
        let summary = self.generate(self.summary_prompt(title, content)).await?;
        let sentences = count_sentences(&summary);
        if sentences != self.summary_sentences {
            warn!(
                "Summary has {} sentences instead of {}: {}",
                sentences, self.summary_sentences, title
            );
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(key: Option<&str>) -> InferenceSettings {
        InferenceSettings {
            api_key: key.map(String::from),
            ..InferenceSettings::default()
        }
    }

    #[test]
    fn test_model_requires_api_key() {
        let result = GeminiModel::new(&settings(None));
        assert_eq!(result.unwrap_err().to_string(), "Inference error: Gemini API key is required");
        assert!(GeminiModel::new(&settings(Some("  "))).is_err());
        assert!(GeminiModel::new(&settings(Some("test-key"))).is_ok());
    }

    #[test]
    fn test_debug_redacts_key() {
        let model = GeminiModel::new(&settings(Some("secret-key"))).unwrap();
        let debug = format!("{:?}", model);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("gemini-pro"));
    }

    #[test]
    fn test_endpoint_and_request_shape() {
        let model = GeminiModel::new(&settings(Some("k"))).unwrap();
        assert_eq!(
            model.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );

        let body = serde_json::to_value(GenerateRequest::new("hi".to_string())).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert!(body["generationConfig"]["maxOutputTokens"].is_number());
    }

    #[test]
    fn test_summary_prompt_asks_for_configured_sentences() {
        let model = GeminiModel::new(&settings(Some("k"))).unwrap();
        let prompt = model.summary_prompt("제목", "본문");
        assert!(prompt.contains("정확히 3문장"));
        assert!(prompt.contains("제목: 제목"));
    }

    #[test]
    fn test_response_text_extraction() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":" 첫 문장. "},{"text":"둘째 문장."}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text().as_deref(), Some("첫 문장. 둘째 문장."));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.text().is_none());

        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(blocked.text().is_none());
    }
}
