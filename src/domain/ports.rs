use crate::domain::model::{FetchOutcome, QueryWindow};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// Persistence for the single API credential.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn save(&self, value: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Anything that can answer one bid-announcement query.
#[async_trait]
pub trait BidSource: Send + Sync {
    async fn fetch(&self, credential: &str, window: &QueryWindow) -> FetchOutcome;
}

/// Wall-clock source, read once per aggregation.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}
