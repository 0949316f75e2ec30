pub const CATEGORIES: [&str; 8] = [
    "electronics",
    "groceries",
    "fashion",
    "kitchen_appliances",
    "home_appliances",
    "beauty_personal_care",
    "sports_fitness",
    "general",
];

pub fn categorize(product_name: &str) -> String {
    format!(
        r#"
Categorize this product into one of these retail categories:
{}

Product name: {product_name}

Respond with ONLY the category name, nothing else.
"#,
        CATEGORIES.map(|c| format!("- {c}")).join("\n")
    )
}

pub fn describe(product_name: &str) -> String {
    format!(
        "Generate a brief product description (1-2 sentences) for: {product_name}\nBe concise and professional."
    )
}

pub fn suggest_alternatives(product_name: &str, category: &str, brand: &str, schema: &str) -> String {
    format!(
        r#"
Given this product is out of stock, suggest 2-3 alternative products in the same category.
Product: {product_name} (Category: {category}, Brand: {brand})

Respond with ONLY a JSON array matching this schema:
{schema}
"#
    )
}

pub fn enrichment_narrative(
    product_name: &str,
    category: &str,
    brand: &str,
    description: &str,
    missing_fields: &[String],
    alternatives: usize,
) -> String {
    format!(
        r#"
You are a retail catalog expert. Summarize the product enrichment:

Product: {product_name}
Category: {category}
Brand: {brand}
Description: {description}
Missing fields: {}
Alternatives found: {alternatives}

Provide a concise summary (2-3 sentences) of the enrichment work done.
"#,
        missing_fields.join(", ")
    )
}

pub fn forecast_narrative(
    category: &str,
    base: f64,
    seasonal: f64,
    surge: f64,
    final_forecast: f64,
    event: &str,
) -> String {
    format!(
        r#"
You are a senior retail forecasting expert.

Category: {category}
Base Forecast: {base}
Seasonal Multiplier: {seasonal}
Historical Festival Surge Factor: {surge}
Event: {event}
Final Forecast: {final_forecast}

Explain how these factors combined to produce the final forecast.
Keep it short, clear, and store-manager friendly.
"#
    )
}

pub fn replenishment_narrative(reorder_qty: u32, timing: &str, risk: &str, factors: &[String]) -> String {
    format!(
        r#"
You are a retail supply chain expert.

Decision:
- Reorder Quantity: {reorder_qty}
- Timing: {timing}
- Stockout Risk: {risk}

Reasoning factors:
{}

Explain the replenishment decision in clear, store-manager friendly language.
Keep it concise (2-3 sentences).
"#,
        factors.join(", ")
    )
}

pub fn pricing_narrative(category: &str, current: f64, recommended: f64, factors: &[String]) -> String {
    format!(
        r#"
You are a retail pricing expert.

Category: {category}
Current Price: ₹{current}
Recommended Price: ₹{recommended}
Reason: {}

Explain this pricing decision clearly in 2 sentences.
"#,
        factors.join(", ")
    )
}
