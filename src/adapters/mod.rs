//! Concrete adapter implementations for ports.

pub mod console_report_adapter;
pub mod csv_adapter;
pub mod file_config_adapter;
#[cfg(feature = "http")]
pub mod http_oracle;
pub mod replay_oracle;
pub mod timeout_oracle;
