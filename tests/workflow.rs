use async_trait::async_trait;
use chrono::NaiveDate;
use retail_ops::agents::local::LocalAgents;
use retail_ops::agents::pricing::RecommendationType;
use retail_ops::agents::replenishment::{ReorderTiming, StockoutRisk};
use retail_ops::ai::client::LanguageModel;
use retail_ops::ai::narrator::Narrator;
use retail_ops::core::record::{Stage, WorkflowRequest, WorkflowStatus};
use retail_ops::core::reference::ReferenceData;
use retail_ops::{Orchestrator, RetailError};
use std::sync::Arc;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn agents_with(data: ReferenceData, narrator: Narrator) -> LocalAgents {
    LocalAgents::new(Arc::new(data), narrator).with_as_of(as_of())
}

/// Built-in tables with the event calendar emptied.
fn quiet_orchestrator() -> Orchestrator {
    let data = ReferenceData::builtin().unwrap().with_events(vec![]);
    Orchestrator::new(Arc::new(agents_with(data, Narrator::offline())))
}

fn festive_orchestrator() -> Orchestrator {
    let data = ReferenceData::builtin().unwrap();
    Orchestrator::new(Arc::new(agents_with(data, Narrator::offline())))
}

struct Unreachable;

#[async_trait]
impl LanguageModel for Unreachable {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, RetailError> {
        Err(RetailError::Narrative("connection refused".into()))
    }
}

#[tokio::test]
async fn tv_without_event_completes_with_flat_forecast() {
    let record = quiet_orchestrator()
        .run_workflow(WorkflowRequest::for_category("tv"))
        .await;

    assert_eq!(record.status, WorkflowStatus::Completed);
    assert!(record.errors.is_empty());
    assert!(record.enrichment.is_none());

    let forecast = record.forecast.as_ref().unwrap();
    assert_eq!(forecast.base_forecast, 10.0);
    assert_eq!(forecast.final_forecast, forecast.base_forecast);
    assert_eq!(forecast.event_label(), "None");

    let replenishment = record.replenishment.as_ref().unwrap();
    assert_eq!(replenishment.current_stock, 45);
    assert_eq!(replenishment.stock_runway_days, Some(165.0));
    assert_eq!(replenishment.reorder_qty, 0);
    assert_eq!(replenishment.reorder_timing, ReorderTiming::Defer);

    let summary = record.summary();
    assert_eq!(summary.event.as_deref(), Some("None"));
    assert_eq!(summary.status.to_string(), "completed");
}

#[tokio::test]
async fn inventory_three_times_demand_triggers_clearance() {
    let mut request = WorkflowRequest::for_category("tv");
    request.current_stock = Some(30);
    let record = quiet_orchestrator().run_workflow(request).await;

    let pricing = record.pricing.as_ref().unwrap();
    assert_eq!(pricing.inventory_ratio, 3.0);
    assert_eq!(pricing.recommendation_type, RecommendationType::Clearance);
    assert_eq!(pricing.recommended_price, 24360.0);
    assert!(pricing.recommended_price < pricing.current_price);
    assert!(pricing.recommended_price >= pricing.floor_price);
}

#[tokio::test]
async fn short_runway_orders_immediately() {
    let mut request = WorkflowRequest::for_category("tv");
    request.current_stock = Some(2);
    request.in_transit = Some(0);
    let record = quiet_orchestrator().run_workflow(request).await;

    let replenishment = record.replenishment.as_ref().unwrap();
    assert_eq!(replenishment.stock_runway_days, Some(6.0));
    assert_eq!(replenishment.reorder_timing, ReorderTiming::Immediate);
    assert_eq!(replenishment.stockout_risk, StockoutRisk::High);
    assert_eq!(replenishment.reorder_qty, replenishment.minimum_order_quantity);

    let pricing = record.pricing.as_ref().unwrap();
    assert_eq!(pricing.recommendation_type, RecommendationType::Premium);
}

#[tokio::test]
async fn upcoming_festival_lifts_the_forecast() {
    let record = festive_orchestrator()
        .run_workflow(WorkflowRequest::for_category("tv"))
        .await;

    let forecast = record.forecast.as_ref().unwrap();
    assert_eq!(forecast.event.as_deref(), Some("Diwali"));
    assert_eq!(forecast.days_to_event, Some(21));
    assert_eq!(forecast.seasonal_multiplier, 1.6);
    assert_eq!(forecast.historical_surge_factor, 1.35);
    assert_eq!(forecast.final_forecast, 21.6);
    assert_eq!(record.status, WorkflowStatus::Completed);
}

#[tokio::test]
async fn unknown_category_fails_at_forecast() {
    let record = quiet_orchestrator()
        .run_workflow(WorkflowRequest::for_category("garden"))
        .await;

    assert_eq!(record.status, WorkflowStatus::Failed(Stage::Forecast));
    assert_eq!(record.status.to_string(), "failed_forecast");
    assert_eq!(record.errors, vec!["Forecasting: No data found for category 'garden'."]);
    assert!(record.forecast.is_none());
    assert!(record.replenishment.is_none());
    assert!(record.pricing.is_none());
}

#[tokio::test]
async fn empty_request_fails_at_enrichment() {
    let record = quiet_orchestrator().run_workflow(WorkflowRequest::default()).await;
    assert_eq!(record.status, WorkflowStatus::Failed(Stage::Enrich));
    assert_eq!(record.errors.len(), 1);
    assert!(record.errors[0].starts_with("Enrichment: "));
}

#[tokio::test]
async fn product_name_is_enriched_before_forecasting() {
    let record = quiet_orchestrator()
        .run_workflow(WorkflowRequest::for_product("New Samsung 55 inch Smart TV"))
        .await;

    let enrichment = record.enrichment.as_ref().unwrap();
    assert_eq!(enrichment.product_name, "Samsung 55 inch Smart TV");
    assert_eq!(enrichment.category, "electronics");
    assert_eq!(enrichment.brand, "Samsung");
    assert_eq!(record.resolved_category.as_deref(), Some("electronics"));
    assert_eq!(record.forecast.as_ref().unwrap().category, "electronics");
    assert_eq!(record.status, WorkflowStatus::Completed);
}

#[tokio::test]
async fn product_without_signal_lands_in_general() {
    let record = quiet_orchestrator()
        .run_workflow(WorkflowRequest::for_product("Garden Hose"))
        .await;

    assert_eq!(record.enrichment.as_ref().unwrap().category, "general");
    assert_eq!(record.status, WorkflowStatus::Failed(Stage::Forecast));
}

#[tokio::test]
async fn batch_keeps_input_order_and_isolates_failures() {
    let categories = vec!["tv".to_string(), "garden".to_string(), "laptop".to_string()];
    let records = quiet_orchestrator().run_batch(categories, 30).await;

    let seen: Vec<_> = records
        .iter()
        .map(|r| (r.resolved_category.clone().unwrap(), r.status))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("tv".to_string(), WorkflowStatus::Completed),
            ("garden".to_string(), WorkflowStatus::Failed(Stage::Forecast)),
            ("laptop".to_string(), WorkflowStatus::Completed),
        ]
    );
}

#[tokio::test]
async fn repeated_runs_give_identical_numbers() {
    let orchestrator = festive_orchestrator();
    let first = orchestrator.run_workflow(WorkflowRequest::for_category("phone")).await;
    let second = orchestrator.run_workflow(WorkflowRequest::for_category("phone")).await;

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.summary(), second.summary());
    assert_eq!(first.forecast, second.forecast);
}

#[tokio::test]
async fn failing_model_does_not_change_numbers() {
    let offline = festive_orchestrator();
    let data = ReferenceData::builtin().unwrap();
    let failing = Orchestrator::new(Arc::new(agents_with(
        data,
        Narrator::with_model(Arc::new(Unreachable)),
    )));

    let request = WorkflowRequest::for_product("Premium Basmati Rice 5kg pack");
    let a = offline.run_workflow(request.clone()).await;
    let b = failing.run_workflow(request).await;

    assert_eq!(a.summary(), b.summary());
    assert_eq!(
        a.pricing.as_ref().map(|p| &p.narrative),
        b.pricing.as_ref().map(|p| &p.narrative)
    );
}

#[tokio::test]
async fn forecast_only_reports_unknown_category() {
    let orchestrator = quiet_orchestrator();
    let report = orchestrator.run_forecast_only("laptop", 60).await.unwrap();
    assert_eq!(report.days_ahead, 60);

    let err = orchestrator.run_forecast_only("garden", 30).await.unwrap_err();
    assert!(matches!(err, RetailError::UnknownCategory(_)));
}
