use super::math::round_to;
use crate::ai::narrator::Narrator;
use crate::ai::prompts;
use crate::core::reference::{ReferenceData, SupplierTerms};
use crate::error::{RetailError, RetailResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Multiplier applied to safety stock when an event lands inside the supplier lead time.
pub const EVENT_URGENCY_MULTIPLIER: f64 = 1.2;
/// Runway (days) under which a reorder is due soon even if the lead time is covered.
pub const SOON_RUNWAY_DAYS: f64 = 30.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Low,
    #[default]
    Medium,
    High,
}

impl Volatility {
    pub fn multiplier(self) -> f64 {
        match self {
            Volatility::Low => 1.1,
            Volatility::Medium => 1.25,
            Volatility::High => 1.4,
        }
    }
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Volatility::Low => "low",
            Volatility::Medium => "medium",
            Volatility::High => "high",
        };
        f.write_str(label)
    }
}

impl FromStr for Volatility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Volatility::Low),
            "medium" => Ok(Volatility::Medium),
            "high" => Ok(Volatility::High),
            other => Err(format!("unknown demand volatility '{other}' (expected low, medium or high)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderTiming {
    Immediate,
    Soon,
    Defer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockoutRisk {
    High,
    Medium,
    Low,
}

impl fmt::Display for ReorderTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReorderTiming::Immediate => "immediate",
            ReorderTiming::Soon => "soon",
            ReorderTiming::Defer => "defer",
        })
    }
}

impl fmt::Display for StockoutRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StockoutRisk::High => "high",
            StockoutRisk::Medium => "medium",
            StockoutRisk::Low => "low",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventWindow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub days_to_event: Option<i64>,
}

/// The slice of a forecast the replenishment rules consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DemandSnapshot {
    pub forecasted_demand: f64,
    pub avg_daily_demand: f64,
    #[serde(default)]
    pub demand_volatility: Volatility,
    #[serde(default)]
    pub event: EventWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReplenishmentRequest {
    pub category: String,
    pub forecast: DemandSnapshot,
    #[serde(default)]
    pub current_stock: Option<u32>,
    #[serde(default)]
    pub in_transit_stock: Option<u32>,
    #[serde(default)]
    pub supplier: Option<SupplierTerms>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryPosition {
    pub current_stock: u32,
    pub in_transit_stock: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplenishmentDecision {
    pub volatility_multiplier: f64,
    pub event_multiplier: f64,
    pub effective_stock: u64,
    /// `None` when daily demand is zero and stock never runs out.
    pub stock_runway_days: Option<f64>,
    pub safety_stock: f64,
    pub reorder_qty: u32,
    pub reorder_timing: ReorderTiming,
    pub stockout_risk: StockoutRisk,
    pub explanation_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentReport {
    pub category: String,
    pub current_stock: u32,
    pub in_transit_stock: u32,
    pub effective_stock: u64,
    pub stock_runway_days: Option<f64>,
    pub safety_stock: f64,
    pub reorder_qty: u32,
    pub reorder_timing: ReorderTiming,
    pub stockout_risk: StockoutRisk,
    pub lead_time_days: u32,
    pub minimum_order_quantity: u32,
    pub explanation_factors: Vec<String>,
    pub narrative: String,
}

pub fn decide(
    demand: &DemandSnapshot,
    inventory: InventoryPosition,
    supplier: SupplierTerms,
) -> RetailResult<ReplenishmentDecision> {
    for (name, value) in [
        ("forecasted_demand", demand.forecasted_demand),
        ("avg_daily_demand", demand.avg_daily_demand),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(RetailError::invalid(format!("{name} must be a non-negative number, got {value}")));
        }
    }

    let lead_time = supplier.lead_time_days as f64;
    let mut factors = vec![format!("demand volatility is {}", demand.demand_volatility)];

    // 1. demand risk
    let volatility_multiplier = demand.demand_volatility.multiplier();

    // 2. event urgency
    let event_multiplier = match demand.event.days_to_event {
        Some(days) if (0..=supplier.lead_time_days as i64).contains(&days) => {
            let name = demand.event.name.as_deref().unwrap_or("upcoming event");
            factors.push(format!("festival ({name}) is within supplier lead time"));
            EVENT_URGENCY_MULTIPLIER
        }
        _ => 1.0,
    };

    // 3. runway
    let effective_stock = inventory.current_stock as u64 + inventory.in_transit_stock as u64;
    let stock_runway_days = (demand.avg_daily_demand > 0.0)
        .then(|| round_to(effective_stock as f64 / demand.avg_daily_demand, 1));

    // 4. safety stock
    let safety_stock = (demand.avg_daily_demand * lead_time * volatility_multiplier * event_multiplier).round();

    // 5. reorder quantity
    let shortfall = (demand.forecasted_demand + safety_stock - effective_stock as f64).trunc();
    let mut reorder_qty = shortfall.max(0.0) as u32;
    if reorder_qty > 0 && reorder_qty < supplier.minimum_order_quantity {
        factors.push(format!(
            "order raised from {reorder_qty} to the supplier minimum of {}",
            supplier.minimum_order_quantity
        ));
        reorder_qty = supplier.minimum_order_quantity;
    }

    // 6. timing and risk
    let (reorder_timing, stockout_risk) = match stock_runway_days {
        Some(runway) if runway < lead_time => (ReorderTiming::Immediate, StockoutRisk::High),
        Some(runway) if runway < SOON_RUNWAY_DAYS => (ReorderTiming::Soon, StockoutRisk::Medium),
        _ => (ReorderTiming::Defer, StockoutRisk::Low),
    };
    match stock_runway_days {
        Some(runway) => factors.push(format!("stock runway is {runway} days")),
        None => factors.push("no daily demand, stock runway is unbounded".to_string()),
    }

    Ok(ReplenishmentDecision {
        volatility_multiplier,
        event_multiplier,
        effective_stock,
        stock_runway_days,
        safety_stock,
        reorder_qty,
        reorder_timing,
        stockout_risk,
        explanation_factors: factors,
    })
}

pub async fn run(
    data: &ReferenceData,
    narrator: &Narrator,
    request: ReplenishmentRequest,
) -> RetailResult<ReplenishmentReport> {
    log::info!("📦 Replenishment decision for '{}'", request.category);

    let store = data.profile(&request.category).store;
    let inventory = InventoryPosition {
        current_stock: request.current_stock.unwrap_or(store.current_stock),
        in_transit_stock: request.in_transit_stock.unwrap_or(store.in_transit_stock),
    };
    let supplier = request.supplier.unwrap_or_else(|| data.supplier());

    let decision = decide(&request.forecast, inventory, supplier)?;
    log::debug!(
        "   volatility x{}, event x{}, safety stock {}",
        decision.volatility_multiplier,
        decision.event_multiplier,
        decision.safety_stock
    );

    let timing = decision.reorder_timing.to_string();
    let risk = decision.stockout_risk.to_string();
    let prompt = prompts::replenishment_narrative(decision.reorder_qty, &timing, &risk, &decision.explanation_factors);
    let fallback = format!(
        "Reorder {} units ({timing}, {risk} stockout risk): {}.",
        decision.reorder_qty,
        decision.explanation_factors.join("; ")
    );
    let narrative = narrator.explain("Replenishment", &prompt, 120, fallback).await;

    log::info!("✅ Replenishment: {} units, {}", decision.reorder_qty, timing);

    Ok(ReplenishmentReport {
        category: request.category,
        current_stock: inventory.current_stock,
        in_transit_stock: inventory.in_transit_stock,
        effective_stock: decision.effective_stock,
        stock_runway_days: decision.stock_runway_days,
        safety_stock: decision.safety_stock,
        reorder_qty: decision.reorder_qty,
        reorder_timing: decision.reorder_timing,
        stockout_risk: decision.stockout_risk,
        lead_time_days: supplier.lead_time_days,
        minimum_order_quantity: supplier.minimum_order_quantity,
        explanation_factors: decision.explanation_factors,
        narrative,
    })
}
