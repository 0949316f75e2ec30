use crate::config::LlmSettings;
use crate::error::RetailError;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::Duration;

/// Plain text completion. Implementations make one attempt per call.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, RetailError>;
}

/// OpenAI-compatible chat completions client (OpenRouter by default).
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    app_title: String,
}

impl OpenRouterClient {
    pub fn new(settings: &LlmSettings, api_key: impl Into<String>) -> Result<Self, RetailError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(settings.timeout_secs))
                .build()?,
            api_key: api_key.into(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            app_title: settings.app_title.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenRouterClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, RetailError> {
        let url = format!("{}/chat/completions", self.base_url);

        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": max_tokens,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "http://localhost")
            .header("X-Title", &self.app_title)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let err_text = res.text().await.unwrap_or_default();
            log::error!("API Error: {}", err_text);
            return Err(RetailError::Narrative(format!("API Error {status}: {err_text}")));
        }

        let body: Value = res.json().await?;

        let text = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| RetailError::Narrative("No text content returned".into()))?;

        Ok(text.trim().to_string())
    }
}

/// Strips a ```json fence if the model wrapped its answer in one.
pub fn clean_json_block(text: &str) -> String {
    let Some(open) = text.find("```") else {
        return text.trim().to_string();
    };
    let after_fence = &text[open + 3..];
    let body = after_fence.strip_prefix("json").unwrap_or(after_fence);
    let end = body.rfind("```").unwrap_or(body.len());
    body[..end].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_json_block_handles_fences() {
        assert_eq!(clean_json_block("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(clean_json_block("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(clean_json_block("  [] "), "[]");
    }
}
