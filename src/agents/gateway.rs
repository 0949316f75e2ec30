use super::enrichment::{EnrichmentReport, EnrichmentRequest};
use super::forecasting::{ForecastReport, ForecastRequest};
use super::pricing::{PricingReport, PricingRequest};
use super::replenishment::{ReplenishmentReport, ReplenishmentRequest};
use crate::error::RetailResult;
use async_trait::async_trait;

/// The four agent capabilities the orchestrator drives. Each call is a blocking
/// request/response: a complete report or an error, never a partial result.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    async fn enrich(&self, request: EnrichmentRequest) -> RetailResult<EnrichmentReport>;

    async fn forecast(&self, request: ForecastRequest) -> RetailResult<ForecastReport>;

    async fn replenish(&self, request: ReplenishmentRequest) -> RetailResult<ReplenishmentReport>;

    async fn price(&self, request: PricingRequest) -> RetailResult<PricingReport>;
}
