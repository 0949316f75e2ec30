use crate::error::{RetailError, RetailResult};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

pub const DEFAULT_ELASTICITY: f64 = -1.5;

const SALES_FILE: &str = "sales_history.csv";
const EVENTS_FILE: &str = "events.json";
const SURGE_FILE: &str = "surge_profile.json";
const ELASTICITY_FILE: &str = "price_elasticity.json";
const COMPETITOR_FILE: &str = "competitor_prices.json";
const CATALOG_FILE: &str = "product_catalog.json";
const STORE_FILE: &str = "store_profile.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub category: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub name: String,
    pub date: NaiveDate,
    pub multiplier: f64,
}

#[derive(Deserialize)]
struct EventCalendarFile {
    events: Vec<CalendarEvent>,
}

/// Static pricing parameters for a category. Percentages are whole numbers (18.0 == 18%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingProfile {
    #[serde(default = "default_elasticity")]
    pub elasticity: f64,
    #[serde(default = "default_base_margin")]
    pub base_margin_pct: f64,
    #[serde(default = "default_min_margin")]
    pub min_margin_pct: f64,
    #[serde(default = "default_max_discount")]
    pub max_discount_pct: f64,
}

fn default_elasticity() -> f64 {
    DEFAULT_ELASTICITY
}
fn default_base_margin() -> f64 {
    20.0
}
fn default_min_margin() -> f64 {
    5.0
}
fn default_max_discount() -> f64 {
    15.0
}

impl Default for PricingProfile {
    fn default() -> Self {
        Self {
            elasticity: default_elasticity(),
            base_margin_pct: default_base_margin(),
            min_margin_pct: default_min_margin(),
            max_discount_pct: default_max_discount(),
        }
    }
}

#[derive(Deserialize)]
struct CompetitorEntry {
    competitor_avg_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogProduct {
    pub name: String,
    pub brand: String,
    pub category: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub margin_pct: f64,
}

/// Shelf state of a category in the demo store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoreProfile {
    pub current_stock: u32,
    pub in_transit_stock: u32,
    pub price: f64,
}

impl Default for StoreProfile {
    fn default() -> Self {
        Self { current_stock: 200, in_transit_stock: 50, price: 5000.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SupplierTerms {
    pub lead_time_days: u32,
    pub minimum_order_quantity: u32,
}

impl Default for SupplierTerms {
    fn default() -> Self {
        Self { lead_time_days: 10, minimum_order_quantity: 50 }
    }
}

/// Everything the agents know about one category, with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryProfile {
    pub category: String,
    pub pricing: PricingProfile,
    pub competitor_price: Option<f64>,
    pub store: StoreProfile,
}

/// Read-only reference tables shared by every agent.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    sales: Vec<SalesRecord>,
    events: Vec<CalendarEvent>,
    surge: HashMap<String, HashMap<String, f64>>,
    pricing: HashMap<String, PricingProfile>,
    competitors: HashMap<String, f64>,
    catalog: BTreeMap<String, CatalogProduct>,
    store: HashMap<String, StoreProfile>,
    supplier: SupplierTerms,
}

struct RawSources {
    sales_csv: String,
    events_json: String,
    surge_json: Option<String>,
    elasticity_json: Option<String>,
    competitor_json: Option<String>,
    catalog_json: Option<String>,
    store_json: Option<String>,
}

impl ReferenceData {
    /// Demo dataset compiled into the binary.
    pub fn builtin() -> RetailResult<Self> {
        Self::parse(RawSources {
            sales_csv: include_str!("../../data/sales_history.csv").to_string(),
            events_json: include_str!("../../data/events.json").to_string(),
            surge_json: Some(include_str!("../../data/surge_profile.json").to_string()),
            elasticity_json: Some(include_str!("../../data/price_elasticity.json").to_string()),
            competitor_json: Some(include_str!("../../data/competitor_prices.json").to_string()),
            catalog_json: Some(include_str!("../../data/product_catalog.json").to_string()),
            store_json: Some(include_str!("../../data/store_profile.json").to_string()),
        })
    }

    /// Load the reference files from `dir`. Sales history and the event calendar are required.
    pub fn load(dir: impl AsRef<Path>) -> RetailResult<Self> {
        let dir = dir.as_ref();
        log::info!("Loading reference data from {}", dir.display());

        let data = Self::parse(RawSources {
            sales_csv: read_required(dir, SALES_FILE)?,
            events_json: read_required(dir, EVENTS_FILE)?,
            surge_json: read_optional(dir, SURGE_FILE)?,
            elasticity_json: read_optional(dir, ELASTICITY_FILE)?,
            competitor_json: read_optional(dir, COMPETITOR_FILE)?,
            catalog_json: read_optional(dir, CATALOG_FILE)?,
            store_json: read_optional(dir, STORE_FILE)?,
        })?;

        log::info!(
            "Reference data loaded: {} sales rows, {} events, {} catalog products",
            data.sales.len(),
            data.events.len(),
            data.catalog.len()
        );
        Ok(data)
    }

    fn parse(raw: RawSources) -> RetailResult<Self> {
        let sales = parse_sales_csv(&raw.sales_csv)?;
        let events = parse_json::<EventCalendarFile>(&raw.events_json, EVENTS_FILE)?.events;

        let surge = parse_optional_json(raw.surge_json, SURGE_FILE)?;
        let pricing = parse_optional_json(raw.elasticity_json, ELASTICITY_FILE)?;
        let competitors = parse_optional_json::<HashMap<String, CompetitorEntry>>(raw.competitor_json, COMPETITOR_FILE)?
            .into_iter()
            .map(|(cat, entry)| (cat, entry.competitor_avg_price))
            .collect();
        let catalog = parse_optional_json(raw.catalog_json, CATALOG_FILE)?;
        let store = parse_optional_json(raw.store_json, STORE_FILE)?;

        Ok(Self {
            sales,
            events,
            surge,
            pricing,
            competitors,
            catalog,
            store,
            supplier: SupplierTerms::default(),
        })
    }

    pub fn with_sales(mut self, sales: Vec<SalesRecord>) -> Self {
        self.sales = sales;
        self
    }

    pub fn with_events(mut self, events: Vec<CalendarEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_surge(mut self, event: &str, category: &str, factor: f64) -> Self {
        self.surge
            .entry(event.to_string())
            .or_default()
            .insert(category.to_string(), factor);
        self
    }

    pub fn with_pricing_profile(mut self, category: &str, profile: PricingProfile) -> Self {
        self.pricing.insert(category.to_string(), profile);
        self
    }

    pub fn with_competitor_price(mut self, category: &str, price: f64) -> Self {
        self.competitors.insert(category.to_string(), price);
        self
    }

    pub fn with_catalog_product(mut self, id: &str, product: CatalogProduct) -> Self {
        self.catalog.insert(id.to_string(), product);
        self
    }

    pub fn with_store_profile(mut self, category: &str, profile: StoreProfile) -> Self {
        self.store.insert(category.to_string(), profile);
        self
    }

    pub fn with_supplier(mut self, supplier: SupplierTerms) -> Self {
        self.supplier = supplier;
        self
    }

    /// Sales figures for `category` in file order.
    pub fn sales_for<'a>(&'a self, category: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.sales
            .iter()
            .filter(move |r| r.category == category)
            .map(|r| r.sales)
    }

    /// Distinct categories with sales history, in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for r in &self.sales {
            if !seen.iter().any(|c| c == &r.category) {
                seen.push(r.category.clone());
            }
        }
        seen
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn surge_factor(&self, event: &str, category: &str) -> Option<f64> {
        self.surge.get(event).and_then(|m| m.get(category)).copied()
    }

    pub fn catalog(&self) -> impl Iterator<Item = (&String, &CatalogProduct)> {
        self.catalog.iter()
    }

    pub fn supplier(&self) -> SupplierTerms {
        self.supplier
    }

    pub fn profile(&self, category: &str) -> CategoryProfile {
        CategoryProfile {
            category: category.to_string(),
            pricing: self.pricing.get(category).copied().unwrap_or_default(),
            competitor_price: self.competitors.get(category).copied(),
            store: self.store.get(category).copied().unwrap_or_default(),
        }
    }
}

fn read_required(dir: &Path, name: &str) -> RetailResult<String> {
    let path = dir.join(name);
    fs::read_to_string(&path).map_err(|e| RetailError::DataLoad {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn read_optional(dir: &Path, name: &str) -> RetailResult<Option<String>> {
    let path = dir.join(name);
    if !path.exists() {
        log::warn!("⚠️ {} not found, using an empty table", path.display());
        return Ok(None);
    }
    Ok(Some(fs::read_to_string(&path)?))
}

fn parse_json<T: DeserializeOwned>(text: &str, file: &str) -> RetailResult<T> {
    serde_json::from_str(text).map_err(|e| RetailError::DataLoad {
        file: file.to_string(),
        reason: e.to_string(),
    })
}

fn parse_optional_json<T: DeserializeOwned + Default>(text: Option<String>, file: &str) -> RetailResult<T> {
    match text {
        Some(t) => parse_json(&t, file),
        None => Ok(T::default()),
    }
}

/// `date,category,sales` with a header row.
fn parse_sales_csv(text: &str) -> RetailResult<Vec<SalesRecord>> {
    let bad_row = |line_no: usize, reason: String| RetailError::DataLoad {
        file: SALES_FILE.to_string(),
        reason: format!("line {line_no}: {reason}"),
    };

    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [date, category, sales] = fields.as_slice() else {
            return Err(bad_row(line_no, format!("expected 3 fields, got {}", fields.len())));
        };

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| bad_row(line_no, format!("bad date '{date}': {e}")))?;
        let sales: f64 = sales
            .parse()
            .map_err(|e| bad_row(line_no, format!("bad sales value '{sales}': {e}")))?;

        rows.push(SalesRecord { date, category: category.to_string(), sales });
    }
    Ok(rows)
}
