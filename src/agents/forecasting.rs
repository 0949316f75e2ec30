use super::math::{mean, round2};
use crate::ai::narrator::Narrator;
use crate::ai::prompts;
use crate::core::record::DEFAULT_DAYS_AHEAD;
use crate::core::reference::{CalendarEvent, ReferenceData};
use crate::error::{RetailError, RetailResult};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Trailing window of sales rows averaged for the base forecast.
pub const MOVING_AVERAGE_WINDOW: usize = 30;
pub const EVENT_LOOKAHEAD_DAYS: i64 = 180;

fn default_days_ahead() -> u32 {
    DEFAULT_DAYS_AHEAD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastRequest {
    pub category: String,
    /// Advisory only; the moving-average window does not scale with it.
    #[serde(default = "default_days_ahead")]
    pub days_ahead: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub category: String,
    pub days_ahead: u32,
    pub base_forecast: f64,
    pub seasonal_multiplier: f64,
    pub historical_surge_factor: f64,
    pub final_forecast: f64,
    pub event: Option<String>,
    pub days_to_event: Option<i64>,
    pub narrative: String,
}

impl ForecastReport {
    pub fn event_label(&self) -> &str {
        self.event.as_deref().unwrap_or("None")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpcomingEvent<'a> {
    pub name: &'a str,
    pub multiplier: f64,
    pub days_until: i64,
}

/// Numeric part of a forecast, before any narrative.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastFigures {
    pub base: f64,
    pub seasonal: f64,
    pub surge: f64,
    pub final_forecast: f64,
    pub event: Option<String>,
    pub days_to_event: Option<i64>,
}

/// Mean of the last `window` sales rows for `category`, rounded to cents.
pub fn moving_average(data: &ReferenceData, category: &str, window: usize) -> Option<f64> {
    let history: Vec<f64> = data.sales_for(category).collect();
    let start = history.len().saturating_sub(window);
    mean(&history[start..]).map(round2)
}

/// Nearest event dated between `today` and the lookahead horizon. Ties go to the earlier entry.
pub fn upcoming_event(events: &[CalendarEvent], today: NaiveDate) -> Option<UpcomingEvent<'_>> {
    events
        .iter()
        .map(|e| UpcomingEvent {
            name: &e.name,
            multiplier: e.multiplier,
            days_until: (e.date - today).num_days(),
        })
        .filter(|e| (0..=EVENT_LOOKAHEAD_DAYS).contains(&e.days_until))
        .min_by_key(|e| e.days_until)
}

pub fn compute(data: &ReferenceData, category: &str, today: NaiveDate) -> RetailResult<ForecastFigures> {
    let base = moving_average(data, category, MOVING_AVERAGE_WINDOW)
        .ok_or_else(|| RetailError::UnknownCategory(category.to_string()))?;

    let event = upcoming_event(data.events(), today);
    let seasonal = event.map(|e| e.multiplier).unwrap_or(1.0);
    let surge = event
        .and_then(|e| data.surge_factor(e.name, category))
        .unwrap_or(1.0);

    Ok(ForecastFigures {
        base,
        seasonal,
        surge,
        final_forecast: round2(base * seasonal * surge),
        event: event.map(|e| e.name.to_string()),
        days_to_event: event.map(|e| e.days_until),
    })
}

pub async fn run(
    data: &ReferenceData,
    narrator: &Narrator,
    request: ForecastRequest,
    today: NaiveDate,
) -> RetailResult<ForecastReport> {
    log::info!("📊 Forecasting '{}' ({} days ahead)", request.category, request.days_ahead);

    let figures = compute(data, &request.category, today)?;
    let event_label = figures.event.as_deref().unwrap_or("None");

    let prompt = prompts::forecast_narrative(
        &request.category,
        figures.base,
        figures.seasonal,
        figures.surge,
        figures.final_forecast,
        event_label,
    );
    let fallback = format!(
        "Base demand of {} units/day for {} adjusted by a {}x seasonal multiplier ({}) and a {}x historical surge factor gives {} units.",
        figures.base, request.category, figures.seasonal, event_label, figures.surge, figures.final_forecast
    );
    let narrative = narrator.explain("Forecast", &prompt, 180, fallback).await;

    log::info!("✅ Forecast generated: {} units", figures.final_forecast);

    Ok(ForecastReport {
        category: request.category,
        days_ahead: request.days_ahead,
        base_forecast: figures.base,
        seasonal_multiplier: figures.seasonal,
        historical_surge_factor: figures.surge,
        final_forecast: figures.final_forecast,
        event: figures.event,
        days_to_event: figures.days_to_event,
        narrative,
    })
}
