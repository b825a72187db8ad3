//! Port traits for the harness's external collaborators.

pub mod config_port;
pub mod oracle_port;
pub mod price_data_port;
pub mod report_port;
