use crate::ai::client::clean_json_block;
use crate::ai::narrator::Narrator;
use crate::ai::prompts::{self, CATEGORIES};
use crate::core::reference::ReferenceData;
use crate::error::{RetailError, RetailResult};
use regex::Regex;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const FALLBACK_CATEGORY: &str = "general";
pub const MAX_ALTERNATIVES: usize = 3;

const NAME_PREFIXES: [&str; 4] = ["New", "Best", "Premium", "Super"];

const KEYWORD_RULES: [(&[&str], &str); 5] = [
    (&["tv", "television", "screen"], "electronics"),
    (&["laptop", "computer", "notebook"], "electronics"),
    (&["phone", "smartphone", "mobile"], "electronics"),
    (&["detergent", "soap", "shampoo", "pack"], "groceries"),
    (&["shirt", "pants", "dress", "fashion"], "fashion"),
];

static WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*(?:kg|g|lb|oz)\b").expect("static weight pattern")
});
static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*(?:ml|l|oz)\b").expect("static size pattern")
});

/// Attributes the caller already knows. Anything present is passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductData {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnrichmentRequest {
    pub product_name: String,
    #[serde(default)]
    pub product_data: ProductData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Alternative {
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub margin_pct: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    pub product_name: String,
    pub category: String,
    pub brand: String,
    pub description: String,
    pub attributes: BTreeMap<String, Value>,
    pub missing_fields: Vec<String>,
    pub alternatives: Vec<Alternative>,
    pub reasoning: Vec<String>,
    pub narrative: String,
}

/// Trims, collapses whitespace and drops leading marketing words.
pub fn clean_name(name: &str) -> String {
    let mut cleaned = name.split_whitespace().collect::<Vec<_>>().join(" ");
    for prefix in NAME_PREFIXES {
        if let Some(rest) = cleaned.strip_prefix(prefix).and_then(|r| r.strip_prefix(' ')) {
            cleaned = rest.to_string();
        }
    }
    cleaned
}

pub fn keyword_category(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, category)| *category)
        .unwrap_or(FALLBACK_CATEGORY)
}

pub fn guess_brand(name: &str) -> String {
    name.split_whitespace()
        .next()
        .map(title_case)
        .unwrap_or_else(|| "Unknown".to_string())
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn extract_attributes(name: &str, known: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut attributes = known.clone();
    if !attributes.contains_key("weight") {
        if let Some(m) = WEIGHT_RE.find(name) {
            attributes.insert("weight".into(), Value::String(m.as_str().to_string()));
        }
    }
    if !attributes.contains_key("size") {
        if let Some(m) = SIZE_RE.find(name) {
            attributes.insert("size".into(), Value::String(m.as_str().to_string()));
        }
    }
    attributes
}

/// Catalog products in the same category from a different brand, in catalog order.
pub fn catalog_alternatives(data: &ReferenceData, name: &str, category: &str, brand: &str) -> Vec<Alternative> {
    data.catalog()
        .map(|(_, p)| p)
        .filter(|p| p.category == category && !p.name.eq_ignore_ascii_case(name) && !p.brand.eq_ignore_ascii_case(brand))
        .take(MAX_ALTERNATIVES)
        .map(|p| Alternative {
            name: p.name.clone(),
            brand: p.brand.clone(),
            category: p.category.clone(),
            price: Some(p.price),
            margin_pct: Some(p.margin_pct),
            reason: None,
        })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

async fn resolve_category(narrator: &Narrator, name: &str, known: &ProductData, reasoning: &mut Vec<String>) -> String {
    if let Some(category) = non_empty(&known.category) {
        reasoning.push(format!("using existing category: {category}"));
        return category.to_string();
    }

    if let Some(answer) = narrator.ask("Categorization", &prompts::categorize(name), 20).await {
        let answer = answer.trim().to_lowercase();
        let category = if CATEGORIES.contains(&answer.as_str()) {
            answer
        } else {
            FALLBACK_CATEGORY.to_string()
        };
        reasoning.push(format!("LLM categorized as: {category}"));
        return category;
    }

    let category = keyword_category(name).to_string();
    reasoning.push(format!("fallback categorization: {category}"));
    category
}

async fn suggest_alternatives(narrator: &Narrator, name: &str, category: &str, brand: &str) -> Vec<Alternative> {
    let schema = match serde_json::to_string_pretty(&schema_for!(Vec<Alternative>)) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("Alternative schema unavailable: {e}");
            return Vec::new();
        }
    };
    let prompt = prompts::suggest_alternatives(name, category, brand, &schema);
    let Some(answer) = narrator.ask("Alternatives", &prompt, 200).await else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<Alternative>>(&clean_json_block(&answer)) {
        Ok(mut suggestions) => {
            suggestions.truncate(MAX_ALTERNATIVES);
            suggestions
        }
        Err(e) => {
            log::warn!("Ignoring unparseable alternative suggestions: {e}");
            Vec::new()
        }
    }
}

pub async fn run(data: &ReferenceData, narrator: &Narrator, request: EnrichmentRequest) -> RetailResult<EnrichmentReport> {
    log::info!("📋 Enriching product '{}'", request.product_name);

    let name = clean_name(&request.product_name);
    if name.is_empty() {
        return Err(RetailError::invalid("product_name must not be empty"));
    }
    let known = request.product_data;
    let mut reasoning = vec![format!("cleaned product name: '{}' -> '{}'", request.product_name, name)];

    let category = resolve_category(narrator, &name, &known, &mut reasoning).await;

    let brand = non_empty(&known.brand)
        .map(str::to_string)
        .unwrap_or_else(|| guess_brand(&name));

    let description = match non_empty(&known.description) {
        Some(d) => d.to_string(),
        None => narrator
            .ask("Description", &prompts::describe(&name), 60)
            .await
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("Product: {name}")),
    };

    let attributes = extract_attributes(&name, &known.attributes);
    reasoning.push(format!("extracted brand: {brand}, attributes: {} fields", attributes.len()));

    let missing_fields: Vec<String> = [("category", &category), ("brand", &brand), ("description", &description)]
        .into_iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(field, _)| field.to_string())
        .collect();
    if missing_fields.is_empty() {
        reasoning.push("all required fields present".to_string());
    } else {
        reasoning.push(format!("missing fields: {}", missing_fields.join(", ")));
    }

    let mut alternatives = catalog_alternatives(data, &name, &category, &brand);
    if alternatives.is_empty() && narrator.is_live() {
        alternatives = suggest_alternatives(narrator, &name, &category, &brand).await;
    }
    if alternatives.is_empty() {
        reasoning.push("no alternatives found".to_string());
    } else {
        reasoning.push(format!("found {} alternative products", alternatives.len()));
    }

    let prompt = prompts::enrichment_narrative(&name, &category, &brand, &description, &missing_fields, alternatives.len());
    let fallback = format!(
        "Enriched product: {name}. Category: {category}, Brand: {brand}. Found {} alternatives.",
        alternatives.len()
    );
    let narrative = narrator.explain("Enrichment", &prompt, 150, fallback).await;

    log::info!("✅ Enriched: {name} -> {category}");

    Ok(EnrichmentReport {
        product_name: name,
        category,
        brand,
        description,
        attributes,
        missing_fields,
        alternatives,
        reasoning,
        narrative,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::LanguageModel;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct Scripted(&'static str);

    #[async_trait]
    impl LanguageModel for Scripted {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, RetailError> {
            Ok(self.0.to_string())
        }
    }

    fn request(name: &str) -> EnrichmentRequest {
        EnrichmentRequest { product_name: name.into(), product_data: ProductData::default() }
    }

    #[test]
    fn name_cleaning() {
        assert_eq!(clean_name("  New   Best  Samsung   TV "), "Samsung TV");
        assert_eq!(clean_name("Newton Laptop"), "Newton Laptop");
        assert_eq!(clean_name("   "), "");
    }

    #[test]
    fn keyword_fallback_categories() {
        assert_eq!(keyword_category("Samsung 55 inch TV"), "electronics");
        assert_eq!(keyword_category("Surf Excel Detergent 2kg"), "groceries");
        assert_eq!(keyword_category("Levis Shirt"), "fashion");
        assert_eq!(keyword_category("Garden Hose"), FALLBACK_CATEGORY);
    }

    #[test]
    fn brand_is_title_cased_first_word() {
        assert_eq!(guess_brand("samsung tv"), "Samsung");
        assert_eq!(guess_brand("LG OLED"), "Lg");
        assert_eq!(guess_brand(""), "Unknown");
    }

    #[test]
    fn attributes_from_name_do_not_override_known_ones() {
        let attrs = extract_attributes("Surf Excel 2kg Refill 500 ml", &BTreeMap::new());
        assert_eq!(attrs.get("weight"), Some(&json!("2kg")));
        assert_eq!(attrs.get("size"), Some(&json!("500 ml")));

        let mut known = BTreeMap::new();
        known.insert("weight".to_string(), json!("2.2 kg"));
        let attrs = extract_attributes("Surf Excel 2kg", &known);
        assert_eq!(attrs.get("weight"), Some(&json!("2.2 kg")));
    }

    #[test]
    fn alternatives_exclude_same_brand_and_cap_at_three() {
        let data = ReferenceData::builtin().unwrap();
        let alts = catalog_alternatives(&data, "Samsung 55 inch TV", "electronics", "Samsung");
        assert_eq!(alts.len(), MAX_ALTERNATIVES);
        assert!(alts.iter().all(|a| a.brand != "Samsung" && a.category == "electronics"));
        assert_eq!(alts[0].name, "LG 55 inch OLED TV");
    }

    #[tokio::test]
    async fn guessed_brand_matches_catalog_brand_ignoring_case() {
        let data = ReferenceData::builtin().unwrap();
        let report = run(&data, &Narrator::offline(), request("LG 43 inch LED TV")).await.unwrap();
        assert_eq!(report.brand, "Lg");
        assert_eq!(report.category, "electronics");
        assert!(!report.alternatives.is_empty());
        assert!(report.alternatives.iter().all(|a| !a.brand.eq_ignore_ascii_case("LG")));
    }

    #[tokio::test]
    async fn offline_enrichment_of_unknown_product_falls_back_to_general() {
        let data = ReferenceData::builtin().unwrap();
        let report = run(&data, &Narrator::offline(), request("Premium Garden Hose 20m")).await.unwrap();
        assert_eq!(report.product_name, "Garden Hose 20m");
        assert_eq!(report.category, FALLBACK_CATEGORY);
        assert_eq!(report.brand, "Garden");
        assert_eq!(report.description, "Product: Garden Hose 20m");
        assert!(report.alternatives.is_empty());
        assert!(report.missing_fields.is_empty());
    }

    #[tokio::test]
    async fn supplied_fields_pass_through() {
        let data = ReferenceData::builtin().unwrap();
        let mut req = request("Tide Plus Detergent 2kg");
        req.product_data.category = Some("groceries".into());
        req.product_data.brand = Some("Tide".into());
        req.product_data.description = Some("Front-load detergent.".into());
        let report = run(&data, &Narrator::offline(), req).await.unwrap();
        assert_eq!(report.category, "groceries");
        assert_eq!(report.brand, "Tide");
        assert_eq!(report.description, "Front-load detergent.");
        assert_eq!(report.alternatives.len(), 3);
        assert!(report.alternatives.iter().all(|a| a.brand != "Tide"));
        assert!(report.reasoning[1].contains("existing category"));
    }

    #[tokio::test]
    async fn model_answers_outside_the_category_set_become_general() {
        let data = ReferenceData::builtin().unwrap();
        let narrator = Narrator::with_model(Arc::new(Scripted("Outdoor Living")));
        let report = run(&data, &narrator, request("Garden Hose")).await.unwrap();
        assert_eq!(report.category, FALLBACK_CATEGORY);
        assert_eq!(report.description, "Outdoor Living");
        // The scripted reply is not JSON, so no suggestions survive.
        assert!(report.alternatives.is_empty());
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let data = ReferenceData::builtin().unwrap();
        let err = run(&data, &Narrator::offline(), request("   ")).await.unwrap_err();
        assert!(matches!(err, RetailError::InvalidInput(_)));
    }
}
