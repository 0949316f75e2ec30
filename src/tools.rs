use crate::agents::enrichment::EnrichmentRequest;
use crate::agents::forecasting::ForecastRequest;
use crate::agents::gateway::AgentGateway;
use crate::agents::pricing::PricingRequest;
use crate::agents::replenishment::ReplenishmentRequest;
use crate::error::{RetailError, RetailResult};
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

pub const ENRICH_PRODUCT: &str = "enrichProduct";
pub const GET_FORECAST: &str = "getForecast";
pub const GET_REPLENISHMENT_DECISION: &str = "getReplenishmentDecision";
pub const GET_PRICING_STRATEGY: &str = "getPricingStrategy";

pub const TOOL_NAMES: [&str; 4] = [ENRICH_PRODUCT, GET_FORECAST, GET_REPLENISHMENT_DECISION, GET_PRICING_STRATEGY];

/// Runs one agent tool over JSON. Failures come back as `{"error": "..."}` rather than `Err`.
pub async fn call_tool(agents: &dyn AgentGateway, name: &str, input: Value) -> Value {
    log::info!("🔧 Tool call: {name}");
    match dispatch(agents, name, unwrap_envelope(input)).await {
        Ok(v) => v,
        Err(e) => {
            log::warn!("Tool '{name}' failed: {e}");
            json!({ "error": e.to_string() })
        }
    }
}

async fn dispatch(agents: &dyn AgentGateway, name: &str, input: Value) -> RetailResult<Value> {
    match name {
        ENRICH_PRODUCT => respond(agents.enrich(parse::<EnrichmentRequest>(input)?).await?),
        GET_FORECAST => respond(agents.forecast(parse::<ForecastRequest>(input)?).await?),
        GET_REPLENISHMENT_DECISION => respond(agents.replenish(parse::<ReplenishmentRequest>(input)?).await?),
        GET_PRICING_STRATEGY => respond(agents.price(parse::<PricingRequest>(input)?).await?),
        other => Err(RetailError::invalid(format!(
            "unknown tool '{other}' (expected one of {})",
            TOOL_NAMES.join(", ")
        ))),
    }
}

/// Callers may send the bare input object or wrap it as `{"input": {...}}`.
fn unwrap_envelope(input: Value) -> Value {
    match input {
        Value::Object(mut map) if map.len() == 1 && map.get("input").is_some_and(Value::is_object) => {
            map.remove("input").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn parse<T: DeserializeOwned>(input: Value) -> RetailResult<T> {
    serde_json::from_value(input).map_err(|e| RetailError::invalid(format!("malformed tool input: {e}")))
}

fn respond<T: Serialize>(report: T) -> RetailResult<Value> {
    Ok(serde_json::to_value(report)?)
}

/// Input schema per tool, with `$ref`s inlined so each entry stands alone.
pub fn tool_schemas() -> RetailResult<Value> {
    let mut tools = Map::new();
    tools.insert(ENRICH_PRODUCT.into(), input_schema::<EnrichmentRequest>()?);
    tools.insert(GET_FORECAST.into(), input_schema::<ForecastRequest>()?);
    tools.insert(GET_REPLENISHMENT_DECISION.into(), input_schema::<ReplenishmentRequest>()?);
    tools.insert(GET_PRICING_STRATEGY.into(), input_schema::<PricingRequest>()?);
    Ok(Value::Object(tools))
}

fn input_schema<T: JsonSchema>() -> RetailResult<Value> {
    let mut root = serde_json::to_value(schema_for!(T))?;
    let definitions = root
        .get("definitions")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    inline_refs(&mut root, &definitions, 0);
    if let Value::Object(map) = &mut root {
        map.remove("$schema");
        map.remove("definitions");
    }
    Ok(root)
}

fn inline_refs(node: &mut Value, definitions: &Map<String, Value>, depth: usize) {
    if depth > 16 {
        return;
    }
    match node {
        Value::Object(map) => {
            if let Some(target) = map.get("$ref").and_then(Value::as_str) {
                let name = target.rsplit('/').next().unwrap_or_default();
                if let Some(def) = definitions.get(name) {
                    *node = def.clone();
                    inline_refs(node, definitions, depth + 1);
                }
                return;
            }
            for child in map.values_mut() {
                inline_refs(child, definitions, depth + 1);
            }
        }
        Value::Array(items) => {
            for item in items {
                inline_refs(item, definitions, depth + 1);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_is_unwrapped_only_when_alone() {
        let wrapped = json!({ "input": { "category": "tv" } });
        assert_eq!(unwrap_envelope(wrapped), json!({ "category": "tv" }));

        let bare = json!({ "input": { "a": 1 }, "category": "tv" });
        assert_eq!(unwrap_envelope(bare.clone()), bare);
    }

    #[test]
    fn schemas_cover_every_tool_without_refs() {
        let schemas = tool_schemas().unwrap();
        for name in TOOL_NAMES {
            assert!(schemas.get(name).is_some(), "missing schema for {name}");
        }
        let text = serde_json::to_string(&schemas).unwrap();
        assert!(!text.contains("$ref"));
        assert!(text.contains("forecasted_demand"));
    }
}
