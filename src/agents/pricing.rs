use super::math::{ceil_cents, round2};
use crate::ai::narrator::Narrator;
use crate::ai::prompts;
use crate::core::reference::{CategoryProfile, ReferenceData};
use crate::error::{RetailError, RetailResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CLEARANCE_RATIO: f64 = 2.0;
pub const PREMIUM_RATIO: f64 = 0.5;
const CLEARANCE_BASE_PCT: f64 = 8.0;
const CLEARANCE_STEP_PCT: f64 = 5.0;
const PREMIUM_PCT: f64 = 5.0;
const COMPETITOR_DISCOUNT_PCT: f64 = 7.0;
const COMPETITOR_SLIGHT_DISCOUNT_PCT: f64 = 3.0;
const COMPETITOR_INCREASE_PCT: f64 = 4.0;
pub const TARGET_MARGIN_CAP_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Maintain,
    Clearance,
    Premium,
    Discount,
    SlightDiscount,
    Increase,
    TargetMargin,
    Floor,
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecommendationType::Maintain => "maintain",
            RecommendationType::Clearance => "clearance",
            RecommendationType::Premium => "premium",
            RecommendationType::Discount => "discount",
            RecommendationType::SlightDiscount => "slight_discount",
            RecommendationType::Increase => "increase",
            RecommendationType::TargetMargin => "target_margin",
            RecommendationType::Floor => "floor",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PricingRequest {
    pub category: String,
    /// Falls back to the store shelf price.
    #[serde(default)]
    pub current_price: Option<f64>,
    pub forecasted_demand: f64,
    /// Falls back to the store's current stock.
    #[serde(default)]
    pub inventory_level: Option<f64>,
    #[serde(default)]
    pub target_profit_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingReport {
    pub category: String,
    pub current_price: f64,
    pub recommended_price: f64,
    pub price_change_pct: f64,
    pub recommendation_type: RecommendationType,
    pub floor_price: f64,
    pub competitor_price: f64,
    pub inventory_ratio: f64,
    pub elasticity: f64,
    pub expected_demand_change_pct: f64,
    pub expected_revenue_change_pct: f64,
    pub expected_profit_change_pct: f64,
    pub factors: Vec<String>,
    pub narrative: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingInputs {
    pub current_price: f64,
    pub forecasted_demand: f64,
    pub inventory_level: f64,
    pub target_profit_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingDecision {
    pub recommended_price: f64,
    pub price_change_pct: f64,
    pub recommendation_type: RecommendationType,
    pub floor_price: f64,
    pub competitor_price: f64,
    pub inventory_ratio: f64,
    pub expected_demand_change_pct: f64,
    pub expected_revenue_change_pct: f64,
    pub expected_profit_change_pct: f64,
    pub factors: Vec<String>,
}

struct Signal {
    kind: RecommendationType,
    change_pct: f64,
}

pub fn decide(profile: &CategoryProfile, inputs: PricingInputs) -> RetailResult<PricingDecision> {
    let price = inputs.current_price;
    if !price.is_finite() || price <= 0.0 {
        return Err(RetailError::invalid(format!("current_price must be positive, got {price}")));
    }
    for (name, value) in [
        ("forecasted_demand", inputs.forecasted_demand),
        ("inventory_level", inputs.inventory_level),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(RetailError::invalid(format!("{name} must be a non-negative number, got {value}")));
        }
    }
    if let Some(target) = inputs.target_profit_pct.filter(|t| !t.is_finite()) {
        return Err(RetailError::invalid(format!("target_profit_pct must be finite, got {target}")));
    }

    let p = &profile.pricing;
    let cost = price * (1.0 - p.base_margin_pct / 100.0);
    let floor_price = ceil_cents(cost * (1.0 + p.min_margin_pct / 100.0));
    let competitor = profile.competitor_price.unwrap_or(price);
    let inventory_ratio = inputs.inventory_level / inputs.forecasted_demand.max(1.0);

    let mut factors = Vec::new();
    let mut signals = Vec::new();

    if inventory_ratio > CLEARANCE_RATIO {
        let discount = (CLEARANCE_BASE_PCT + CLEARANCE_STEP_PCT * (inventory_ratio - CLEARANCE_RATIO))
            .min(p.max_discount_pct);
        factors.push(format!("excess inventory ({inventory_ratio:.2}x forecast demand)"));
        signals.push(Signal { kind: RecommendationType::Clearance, change_pct: -discount });
    } else if inventory_ratio < PREMIUM_RATIO {
        factors.push(format!("low inventory ({inventory_ratio:.2}x forecast demand)"));
        signals.push(Signal { kind: RecommendationType::Premium, change_pct: PREMIUM_PCT });
    }

    if price > competitor * 1.15 {
        factors.push(format!("priced more than 15% above competitors (₹{competitor})"));
        signals.push(Signal { kind: RecommendationType::Discount, change_pct: -COMPETITOR_DISCOUNT_PCT });
    } else if price > competitor * 1.05 {
        factors.push(format!("priced more than 5% above competitors (₹{competitor})"));
        signals.push(Signal {
            kind: RecommendationType::SlightDiscount,
            change_pct: -COMPETITOR_SLIGHT_DISCOUNT_PCT,
        });
    } else if price < competitor * 0.95 {
        factors.push(format!("priced more than 5% below competitors (₹{competitor})"));
        signals.push(Signal { kind: RecommendationType::Increase, change_pct: COMPETITOR_INCREASE_PCT });
    }

    // Most aggressive signal wins; on a tie the earlier rule is kept.
    let mut chosen: Option<Signal> = None;
    for signal in signals {
        if chosen.as_ref().is_none_or(|best| signal.change_pct.abs() > best.change_pct.abs()) {
            chosen = Some(signal);
        }
    }

    if chosen.is_none() {
        if let Some(target) = inputs.target_profit_pct.filter(|t| *t > p.base_margin_pct) {
            let needed_pct = if target >= 100.0 {
                TARGET_MARGIN_CAP_PCT
            } else {
                (cost / (1.0 - target / 100.0) / price - 1.0) * 100.0
            };
            let increase = needed_pct.min(TARGET_MARGIN_CAP_PCT);
            factors.push(format!("target profit of {target}% above current margin of {}%", p.base_margin_pct));
            chosen = Some(Signal { kind: RecommendationType::TargetMargin, change_pct: increase });
        }
    }

    let Signal { kind, change_pct } = chosen.unwrap_or(Signal {
        kind: RecommendationType::Maintain,
        change_pct: 0.0,
    });

    let (recommendation_type, recommended_price) = {
        let candidate = round2(price * (1.0 + change_pct / 100.0));
        if candidate < floor_price {
            factors.push(format!("price floor of ₹{floor_price} keeps a {}% minimum margin", p.min_margin_pct));
            (RecommendationType::Floor, floor_price)
        } else {
            (kind, candidate)
        }
    };

    let actual_change = (recommended_price - price) / price;
    let demand_change = p.elasticity * actual_change;
    let revenue_change = (1.0 + actual_change) * (1.0 + demand_change) - 1.0;
    let old_unit_profit = price - cost;
    let profit_change = if old_unit_profit > 0.0 {
        (recommended_price - cost) * (1.0 + demand_change) / old_unit_profit - 1.0
    } else {
        0.0
    };

    Ok(PricingDecision {
        recommended_price,
        price_change_pct: round2(actual_change * 100.0),
        recommendation_type,
        floor_price,
        competitor_price: competitor,
        inventory_ratio: round2(inventory_ratio),
        expected_demand_change_pct: round2(demand_change * 100.0),
        expected_revenue_change_pct: round2(revenue_change * 100.0),
        expected_profit_change_pct: round2(profit_change * 100.0),
        factors,
    })
}

pub async fn run(data: &ReferenceData, narrator: &Narrator, request: PricingRequest) -> RetailResult<PricingReport> {
    log::info!("💰 Pricing strategy for '{}'", request.category);

    let profile = data.profile(&request.category);
    let inputs = PricingInputs {
        current_price: request.current_price.unwrap_or(profile.store.price),
        forecasted_demand: request.forecasted_demand,
        inventory_level: request
            .inventory_level
            .unwrap_or(profile.store.current_stock as f64),
        target_profit_pct: request.target_profit_pct,
    };

    let decision = decide(&profile, inputs)?;

    let prompt = prompts::pricing_narrative(
        &request.category,
        inputs.current_price,
        decision.recommended_price,
        &decision.factors,
    );
    let fallback = format!(
        "{} pricing recommended ({}% change).",
        decision.recommendation_type, decision.price_change_pct
    );
    let narrative = narrator.explain("Pricing", &prompt, 120, fallback).await;

    log::info!(
        "✅ Pricing: ₹{} ({})",
        decision.recommended_price,
        decision.recommendation_type
    );

    Ok(PricingReport {
        category: request.category,
        current_price: inputs.current_price,
        recommended_price: decision.recommended_price,
        price_change_pct: decision.price_change_pct,
        recommendation_type: decision.recommendation_type,
        floor_price: decision.floor_price,
        competitor_price: decision.competitor_price,
        inventory_ratio: decision.inventory_ratio,
        elasticity: profile.pricing.elasticity,
        expected_demand_change_pct: decision.expected_demand_change_pct,
        expected_revenue_change_pct: decision.expected_revenue_change_pct,
        expected_profit_change_pct: decision.expected_profit_change_pct,
        factors: decision.factors,
        narrative,
    })
}
