use crate::agents::enrichment::{EnrichmentReport, ProductData};
use crate::agents::forecasting::ForecastReport;
use crate::agents::pricing::PricingReport;
use crate::agents::replenishment::{ReplenishmentReport, Volatility};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const DEFAULT_DAYS_AHEAD: u32 = 30;

fn default_days_ahead() -> u32 {
    DEFAULT_DAYS_AHEAD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Enrich,
    Forecast,
    Replenishment,
    Pricing,
}

impl Stage {
    /// Prefix used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Enrich => "Enrichment",
            Stage::Forecast => "Forecasting",
            Stage::Replenishment => "Replenishment",
            Stage::Pricing => "Pricing",
        }
    }

    /// Entry stored in a record's error list, e.g. `Forecasting: No data found ...`.
    pub fn failure_message(self, message: &str) -> String {
        format!("{}: {message}", self.label())
    }

    fn key(self) -> &'static str {
        match self {
            Stage::Enrich => "enrich",
            Stage::Forecast => "forecast",
            Stage::Replenishment => "replenishment",
            Stage::Pricing => "pricing",
        }
    }
}

/// `running → completed`, `running → failed_<stage>`, or `error` for a workflow that never finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed(Stage),
    Error,
}

impl WorkflowStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, WorkflowStatus::Running)
    }

    pub fn is_failed(self) -> bool {
        matches!(self, WorkflowStatus::Failed(_))
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStatus::Running => f.write_str("running"),
            WorkflowStatus::Completed => f.write_str("completed"),
            WorkflowStatus::Failed(stage) => write!(f, "failed_{}", stage.key()),
            WorkflowStatus::Error => f.write_str("error"),
        }
    }
}

impl FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s {
            "running" => WorkflowStatus::Running,
            "completed" => WorkflowStatus::Completed,
            "error" => WorkflowStatus::Error,
            "failed_enrich" => WorkflowStatus::Failed(Stage::Enrich),
            "failed_forecast" => WorkflowStatus::Failed(Stage::Forecast),
            "failed_replenishment" => WorkflowStatus::Failed(Stage::Replenishment),
            "failed_pricing" => WorkflowStatus::Failed(Stage::Pricing),
            other => return Err(format!("unknown workflow status '{other}'")),
        };
        Ok(status)
    }
}

impl From<WorkflowStatus> for String {
    fn from(status: WorkflowStatus) -> Self {
        status.to_string()
    }
}

impl TryFrom<String> for WorkflowStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

/// What the caller asked for. Either a product name (enriched first) or a category is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowRequest {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_data: Option<ProductData>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_days_ahead")]
    pub days_ahead: u32,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub current_stock: Option<u32>,
    #[serde(default)]
    pub in_transit: Option<u32>,
    #[serde(default)]
    pub target_profit_pct: Option<f64>,
    #[serde(default)]
    pub demand_volatility: Option<Volatility>,
}

impl WorkflowRequest {
    pub fn for_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            days_ahead: DEFAULT_DAYS_AHEAD,
            ..Self::default()
        }
    }

    pub fn for_product(product_name: impl Into<String>) -> Self {
        Self {
            product_name: Some(product_name.into()),
            days_ahead: DEFAULT_DAYS_AHEAD,
            ..Self::default()
        }
    }

    pub fn with_days_ahead(mut self, days_ahead: u32) -> Self {
        self.days_ahead = days_ahead;
        self
    }
}

/// The result a single stage hands back to the record.
#[derive(Debug, Clone)]
pub enum StageOutcome {
    Enriched(EnrichmentReport),
    Forecasted(ForecastReport),
    Replenished(ReplenishmentReport),
    Priced(PricingReport),
    Failed { stage: Stage, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub request: WorkflowRequest,
    pub resolved_category: Option<String>,
    pub enrichment: Option<EnrichmentReport>,
    pub forecast: Option<ForecastReport>,
    pub replenishment: Option<ReplenishmentReport>,
    pub pricing: Option<PricingReport>,
    pub errors: Vec<String>,
    pub status: WorkflowStatus,
}

impl WorkflowRecord {
    pub fn new(request: WorkflowRequest) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            resolved_category: request.category.clone(),
            request,
            enrichment: None,
            forecast: None,
            replenishment: None,
            pricing: None,
            errors: Vec::new(),
            status: WorkflowStatus::Running,
        }
    }

    /// Merge one stage's outcome. Terminal records are left untouched.
    pub fn apply(&mut self, outcome: StageOutcome) {
        if self.status.is_terminal() {
            log::warn!("Ignoring stage outcome for finished workflow ({})", self.status);
            return;
        }

        match outcome {
            StageOutcome::Enriched(report) => {
                self.resolved_category = Some(report.category.clone());
                self.enrichment = Some(report);
            }
            StageOutcome::Forecasted(report) => self.forecast = Some(report),
            StageOutcome::Replenished(report) => self.replenishment = Some(report),
            StageOutcome::Priced(report) => {
                self.pricing = Some(report);
                self.status = WorkflowStatus::Completed;
            }
            StageOutcome::Failed { stage, message } => {
                self.errors.push(stage.failure_message(&message));
                self.status = WorkflowStatus::Failed(stage);
            }
        }
    }

    /// Marks a workflow that died without reporting a stage outcome.
    pub fn abort(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.status = WorkflowStatus::Error;
    }

    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary {
            category: self.resolved_category.clone().unwrap_or_default(),
            status: self.status,
            base_forecast: self.forecast.as_ref().map(|f| f.base_forecast),
            final_forecast: self.forecast.as_ref().map(|f| f.final_forecast),
            seasonal_multiplier: self.forecast.as_ref().map(|f| f.seasonal_multiplier),
            event: self.forecast.as_ref().map(|f| f.event_label().to_string()),
            reorder_qty: self.replenishment.as_ref().map(|r| r.reorder_qty),
            reorder_timing: self.replenishment.as_ref().map(|r| r.reorder_timing.to_string()),
            stockout_risk: self.replenishment.as_ref().map(|r| r.stockout_risk.to_string()),
            current_price: self.pricing.as_ref().map(|p| p.current_price),
            recommended_price: self.pricing.as_ref().map(|p| p.recommended_price),
            price_change_pct: self.pricing.as_ref().map(|p| p.price_change_pct),
            recommendation_type: self.pricing.as_ref().map(|p| p.recommendation_type.to_string()),
            errors: self.errors.clone(),
        }
    }
}

/// Flat view of a record, one field per headline number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub category: String,
    pub status: WorkflowStatus,
    pub base_forecast: Option<f64>,
    pub final_forecast: Option<f64>,
    pub seasonal_multiplier: Option<f64>,
    pub event: Option<String>,
    pub reorder_qty: Option<u32>,
    pub reorder_timing: Option<String>,
    pub stockout_risk: Option<String>,
    pub current_price: Option<f64>,
    pub recommended_price: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub recommendation_type: Option<String>,
    pub errors: Vec<String>,
}
