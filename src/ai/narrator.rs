use super::client::LanguageModel;
use std::sync::Arc;

/// Optional language-model side channel. Every call degrades to a local answer when the
/// model is missing or fails, so numeric results never depend on it.
#[derive(Clone, Default)]
pub struct Narrator {
    model: Option<Arc<dyn LanguageModel>>,
}

impl Narrator {
    pub fn offline() -> Self {
        Self { model: None }
    }

    pub fn with_model(model: Arc<dyn LanguageModel>) -> Self {
        Self { model: Some(model) }
    }

    pub fn is_live(&self) -> bool {
        self.model.is_some()
    }

    /// Model explanation for `stage`, or `fallback` verbatim.
    pub async fn explain(&self, stage: &str, prompt: &str, max_tokens: u32, fallback: String) -> String {
        match self.ask(stage, prompt, max_tokens).await {
            Some(text) if !text.trim().is_empty() => text,
            _ => fallback,
        }
    }

    /// Raw model answer, `None` when offline or on any failure.
    pub async fn ask(&self, stage: &str, prompt: &str, max_tokens: u32) -> Option<String> {
        let model = self.model.as_ref()?;
        match model.complete(prompt, max_tokens).await {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("{stage} narrative unavailable: {e}");
                None
            }
        }
    }
}

impl std::fmt::Debug for Narrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrator").field("live", &self.is_live()).finish()
    }
}
