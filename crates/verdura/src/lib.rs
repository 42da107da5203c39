pub mod config;
pub mod error;
pub mod shipping;
pub mod telemetry;
