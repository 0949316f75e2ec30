use crate::agents::enrichment::{EnrichmentRequest, ProductData};
use crate::agents::forecasting::{ForecastReport, ForecastRequest};
use crate::agents::gateway::AgentGateway;
use crate::agents::pricing::PricingRequest;
use crate::agents::replenishment::{DemandSnapshot, EventWindow, ReplenishmentRequest, Volatility};
use crate::core::record::{Stage, StageOutcome, WorkflowRecord, WorkflowRequest};
use crate::error::{RetailError, RetailResult};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;

/// Days of demand a forecast figure covers when converted to a daily rate.
pub const DEMAND_PERIOD_DAYS: f64 = 30.0;

const PIPELINE: [Stage; 4] = [Stage::Enrich, Stage::Forecast, Stage::Replenishment, Stage::Pricing];

#[derive(Clone)]
pub struct Orchestrator {
    agents: Arc<dyn AgentGateway>,
    default_volatility: Volatility,
}

impl Orchestrator {
    pub fn new(agents: Arc<dyn AgentGateway>) -> Self {
        Self { agents, default_volatility: Volatility::default() }
    }

    pub fn with_default_volatility(mut self, volatility: Volatility) -> Self {
        self.default_volatility = volatility;
        self
    }

    /// Enrich → forecast → replenish → price. The first failing stage ends the run;
    /// the record keeps whatever earlier stages produced. A stage that panics yields
    /// a record with status `error` instead of unwinding into the caller.
    pub async fn run_workflow(&self, request: WorkflowRequest) -> WorkflowRecord {
        self.spawn_guarded(request).await
    }

    /// Spawns one workflow on the runtime; the returned future maps a crashed task to an `error` record.
    fn spawn_guarded(&self, request: WorkflowRequest) -> impl Future<Output = WorkflowRecord> + Send + use<> {
        let this = self.clone();
        let fallback = request.clone();
        let handle = tokio::spawn(async move { this.execute(request).await });
        async move {
            match handle.await {
                Ok(record) => record,
                Err(e) => {
                    log::error!("❌ Workflow task failed: {e}");
                    let mut record = WorkflowRecord::new(fallback);
                    record.abort(format!("Workflow task failed: {e}"));
                    record
                }
            }
        }
    }

    async fn execute(&self, request: WorkflowRequest) -> WorkflowRecord {
        let mut record = WorkflowRecord::new(request);
        log::info!("🎯 Starting workflow {} ({})", record.run_id, describe(&record.request));

        for stage in PIPELINE {
            let outcome = match stage {
                Stage::Enrich => self.enrich_stage(&record).await,
                Stage::Forecast => Some(self.forecast_stage(&record).await),
                Stage::Replenishment => Some(self.replenish_stage(&record).await),
                Stage::Pricing => Some(self.pricing_stage(&record).await),
            };

            let Some(outcome) = outcome else {
                log::info!("   ⏭️  {} skipped", stage.label());
                continue;
            };

            record.apply(outcome);
            if record.status.is_failed() {
                log::warn!("⚠️ Workflow stopping at: {}", record.status);
                break;
            }
        }

        log::info!("✅ Workflow {} finished: {}", record.run_id, record.status);
        if let Ok(v) = serde_json::to_value(record.summary()) {
            log::debug!("   Summary: {}", truncate_json(&v));
        }
        record
    }

    pub async fn run_forecast_only(&self, category: &str, days_ahead: u32) -> RetailResult<ForecastReport> {
        self.agents
            .forecast(ForecastRequest { category: category.to_string(), days_ahead })
            .await
    }

    /// One independent workflow per category, run concurrently. Results keep input order.
    pub async fn run_batch(&self, categories: Vec<String>, days_ahead: u32) -> Vec<WorkflowRecord> {
        let requests = categories
            .into_iter()
            .map(|c| WorkflowRequest::for_category(c).with_days_ahead(days_ahead))
            .collect();
        self.run_batch_requests(requests).await
    }

    pub async fn run_batch_requests(&self, requests: Vec<WorkflowRequest>) -> Vec<WorkflowRecord> {
        log::info!("🔄 Running batch workflow for {} requests", requests.len());

        let handles: Vec<_> = requests.into_iter().map(|request| self.spawn_guarded(request)).collect();

        let results = join_all(handles).await;
        log::info!("✅ Batch processing complete");
        results
    }

    async fn enrich_stage(&self, record: &WorkflowRecord) -> Option<StageOutcome> {
        let request = &record.request;
        let Some(product_name) = request.product_name.clone() else {
            if record.resolved_category.is_some() {
                return None;
            }
            return Some(failed(Stage::Enrich, RetailError::invalid("a product name or category is required")));
        };

        log::info!("🔵 STAGE 1: Enrichment for '{product_name}'");
        let mut product_data: ProductData = request.product_data.clone().unwrap_or_default();
        if product_data.category.is_none() {
            product_data.category = request.category.clone();
        }

        let outcome = match self.agents.enrich(EnrichmentRequest { product_name, product_data }).await {
            Ok(report) => StageOutcome::Enriched(report),
            Err(e) => failed(Stage::Enrich, e),
        };
        Some(outcome)
    }

    async fn forecast_stage(&self, record: &WorkflowRecord) -> StageOutcome {
        let Some(category) = record.resolved_category.clone() else {
            return failed(Stage::Forecast, RetailError::invalid("no category resolved"));
        };
        log::info!("🔵 STAGE 2: Forecasting for '{category}'");

        match self
            .agents
            .forecast(ForecastRequest { category, days_ahead: record.request.days_ahead })
            .await
        {
            Ok(report) => StageOutcome::Forecasted(report),
            Err(e) => failed(Stage::Forecast, e),
        }
    }

    async fn replenish_stage(&self, record: &WorkflowRecord) -> StageOutcome {
        let Some(forecast) = &record.forecast else {
            return failed(Stage::Replenishment, RetailError::invalid("no forecast available"));
        };
        log::info!("🔵 STAGE 3: Replenishment Decision");

        let request = ReplenishmentRequest {
            category: forecast.category.clone(),
            forecast: DemandSnapshot {
                forecasted_demand: forecast.final_forecast,
                avg_daily_demand: forecast.final_forecast / DEMAND_PERIOD_DAYS,
                demand_volatility: record.request.demand_volatility.unwrap_or(self.default_volatility),
                event: EventWindow {
                    name: forecast.event.clone(),
                    days_to_event: forecast.days_to_event,
                },
            },
            current_stock: record.request.current_stock,
            in_transit_stock: record.request.in_transit,
            supplier: None,
        };

        match self.agents.replenish(request).await {
            Ok(report) => StageOutcome::Replenished(report),
            Err(e) => failed(Stage::Replenishment, e),
        }
    }

    async fn pricing_stage(&self, record: &WorkflowRecord) -> StageOutcome {
        let (Some(forecast), Some(replenishment)) = (&record.forecast, &record.replenishment) else {
            return failed(Stage::Pricing, RetailError::invalid("forecast and replenishment results are required"));
        };
        log::info!("🔵 STAGE 4: Pricing Strategy");

        let request = PricingRequest {
            category: forecast.category.clone(),
            current_price: record.request.current_price,
            forecasted_demand: forecast.final_forecast,
            inventory_level: Some(replenishment.current_stock as f64),
            target_profit_pct: record.request.target_profit_pct,
        };

        match self.agents.price(request).await {
            Ok(report) => StageOutcome::Priced(report),
            Err(e) => failed(Stage::Pricing, e),
        }
    }
}

fn failed(stage: Stage, error: RetailError) -> StageOutcome {
    let message = error.to_string();
    log::error!("❌ {}", stage.failure_message(&message));
    StageOutcome::Failed { stage, message }
}

fn describe(request: &WorkflowRequest) -> String {
    match (&request.product_name, &request.category) {
        (Some(name), _) => format!("product '{name}'"),
        (None, Some(category)) => format!("category '{category}'"),
        (None, None) => "empty request".to_string(),
    }
}

fn truncate_json(v: &Value) -> String {
    let s = serde_json::to_string(v).unwrap_or_default();
    if s.len() > 300 {
        let cut = (0..=300).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0);
        format!("{}... (len: {})", &s[..cut], s.len())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_json_respects_char_boundaries() {
        let long = Value::String("₹".repeat(200));
        let out = truncate_json(&long);
        assert!(out.contains("... (len:"));
    }

    #[test]
    fn describe_prefers_product_name() {
        let mut req = WorkflowRequest::for_category("tv");
        req.product_name = Some("Sony TV".into());
        assert_eq!(describe(&req), "product 'Sony TV'");
        assert_eq!(describe(&WorkflowRequest::default()), "empty request");
    }
}
