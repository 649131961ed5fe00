pub mod dashboard;
pub mod date_window;
pub mod normalizer;
pub mod stats;

pub use crate::domain::model::{BidRecord, DateRange, FetchOutcome, QueryWindow, Statistics};
pub use crate::domain::ports::{BidSource, Clock, CredentialStore};
pub use crate::utils::error::Result;
