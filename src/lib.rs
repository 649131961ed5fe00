pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod report;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::clock::{FixedClock, SystemClock};
pub use adapters::http::{BidApiClient, WithTimeout};
pub use adapters::storage::{FileCredentialStore, MemoryCredentialStore};
pub use config::DashboardConfig;
pub use crate::core::dashboard::{Dashboard, DashboardOptions, DashboardView};
pub use domain::model::{BidRecord, DateRange, FetchOutcome, OutcomeKind, Statistics};
pub use utils::error::{DashboardError, Result};
