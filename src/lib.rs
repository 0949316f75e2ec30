pub mod config;
pub mod error;
pub mod orchestrator;
pub mod tools;

pub mod core {
    pub mod record;
    pub mod reference;
}

pub mod ai {
    pub mod client;
    pub mod narrator;
    pub mod prompts;
}

pub mod agents {
    pub mod enrichment;
    pub mod forecasting;
    pub mod gateway;
    pub mod local;
    pub mod math;
    pub mod pricing;
    pub mod replenishment;
}

pub use error::{RetailError, RetailResult};
pub use orchestrator::Orchestrator;
