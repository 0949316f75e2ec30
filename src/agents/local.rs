use super::enrichment::{self, EnrichmentReport, EnrichmentRequest};
use super::forecasting::{self, ForecastReport, ForecastRequest};
use super::gateway::AgentGateway;
use super::pricing::{self, PricingReport, PricingRequest};
use super::replenishment::{self, ReplenishmentReport, ReplenishmentRequest};
use crate::ai::client::OpenRouterClient;
use crate::ai::narrator::Narrator;
use crate::config::Settings;
use crate::core::reference::ReferenceData;
use crate::error::RetailResult;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use std::sync::Arc;

/// All four agents running in-process over shared reference data.
#[derive(Debug, Clone)]
pub struct LocalAgents {
    data: Arc<ReferenceData>,
    narrator: Narrator,
    as_of: Option<NaiveDate>,
}

impl LocalAgents {
    pub fn new(data: Arc<ReferenceData>, narrator: Narrator) -> Self {
        Self { data, narrator, as_of: None }
    }

    /// Pins "today" for event lookahead; otherwise the local date is used per call.
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn from_settings(settings: &Settings) -> RetailResult<Self> {
        let data = match &settings.data_dir {
            Some(dir) => ReferenceData::load(dir)?,
            None => {
                log::info!("Using built-in reference data");
                ReferenceData::builtin()?
            }
        };

        let narrator = match &settings.api_key {
            Some(key) => {
                log::info!(">>> OpenRouter configured ({})", settings.llm.model);
                Narrator::with_model(Arc::new(OpenRouterClient::new(&settings.llm, key.clone())?))
            }
            None => {
                log::warn!("⚠️ OPENROUTER_API_KEY not set, narratives use local templates");
                Narrator::offline()
            }
        };

        let mut agents = Self::new(Arc::new(data), narrator);
        agents.as_of = settings.as_of;
        Ok(agents)
    }

    pub fn data(&self) -> &ReferenceData {
        &self.data
    }

    fn today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[async_trait]
impl AgentGateway for LocalAgents {
    async fn enrich(&self, request: EnrichmentRequest) -> RetailResult<EnrichmentReport> {
        enrichment::run(&self.data, &self.narrator, request).await
    }

    async fn forecast(&self, request: ForecastRequest) -> RetailResult<ForecastReport> {
        forecasting::run(&self.data, &self.narrator, request, self.today()).await
    }

    async fn replenish(&self, request: ReplenishmentRequest) -> RetailResult<ReplenishmentReport> {
        replenishment::run(&self.data, &self.narrator, request).await
    }

    async fn price(&self, request: PricingRequest) -> RetailResult<PricingReport> {
        pricing::run(&self.data, &self.narrator, request).await
    }
}
