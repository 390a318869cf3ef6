pub mod config;
pub mod controller;
mod loop_worker;

pub use config::TelemetryConfig;
pub use controller::TelemetryReporter;
