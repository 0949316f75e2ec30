use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use retail_ops::agents::enrichment::ProductData;
use retail_ops::agents::local::LocalAgents;
use retail_ops::agents::replenishment::Volatility;
use retail_ops::config::Settings;
use retail_ops::core::record::{WorkflowRequest, DEFAULT_DAYS_AHEAD};
use retail_ops::tools;
use retail_ops::Orchestrator;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "retail-ops", version, about = "Retail operations workflow: enrich, forecast, replenish, price")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full workflow for a category.
    Analyze {
        category: String,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Enrich a product name, then run the workflow on the resolved category.
    #[command(alias = "product")]
    EnrichAnalyze {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        /// Known category, skips categorisation.
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Run independent workflows for several categories concurrently.
    Batch {
        #[arg(required = true, num_args = 1..)]
        categories: Vec<String>,
        #[arg(long, default_value_t = DEFAULT_DAYS_AHEAD)]
        days: u32,
    },
    /// Forecast only, no replenishment or pricing.
    Forecast {
        category: String,
        #[arg(long, default_value_t = DEFAULT_DAYS_AHEAD)]
        days: u32,
    },
    /// Call one agent tool with JSON read from stdin.
    Tool { name: String },
    /// Print the input schema of every tool.
    Tools,
}

#[derive(Args)]
struct Overrides {
    #[arg(long, default_value_t = DEFAULT_DAYS_AHEAD)]
    days: u32,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    stock: Option<u32>,
    #[arg(long)]
    in_transit: Option<u32>,
    /// Target profit margin, in percent.
    #[arg(long)]
    target_margin: Option<f64>,
    #[arg(long)]
    volatility: Option<Volatility>,
}

impl Overrides {
    fn apply(self, mut request: WorkflowRequest) -> WorkflowRequest {
        request.days_ahead = self.days;
        request.current_price = self.price;
        request.current_stock = self.stock;
        request.in_transit = self.in_transit;
        request.target_profit_pct = self.target_margin;
        request.demand_volatility = self.volatility;
        request
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let agents = Arc::new(LocalAgents::from_settings(&settings)?);
    let orchestrator = Orchestrator::new(agents.clone()).with_default_volatility(settings.default_volatility);

    log::info!("🤖 RETAIL-OPS INITIALIZED ({} categories)", agents.data().categories().len());

    match cli.command {
        Command::Analyze { category, overrides } => {
            let request = overrides.apply(WorkflowRequest::for_category(category));
            let record = orchestrator.run_workflow(request).await;
            print_json(&record)?;
        }
        Command::EnrichAnalyze { name, category, brand, overrides } => {
            let mut request = overrides.apply(WorkflowRequest::for_product(name.join(" ")));
            if brand.is_some() {
                request.product_data = Some(ProductData { brand, ..ProductData::default() });
            }
            request.category = category;
            let record = orchestrator.run_workflow(request).await;
            print_json(&record)?;
        }
        Command::Batch { categories, days } => {
            let records = orchestrator.run_batch(categories, days).await;
            let summaries: Vec<_> = records.iter().map(|r| r.summary()).collect();
            print_json(&summaries)?;
        }
        Command::Forecast { category, days } => {
            let report = orchestrator.run_forecast_only(&category, days).await?;
            print_json(&report)?;
        }
        Command::Tool { name } => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            let input: Value = if raw.trim().is_empty() {
                Value::Object(Default::default())
            } else {
                serde_json::from_str(&raw)?
            };
            let output = tools::call_tool(&*agents, &name, input).await;
            print_json(&output)?;
        }
        Command::Tools => {
            print_json(&tools::tool_schemas()?)?;
        }
    }

    Ok(())
}
