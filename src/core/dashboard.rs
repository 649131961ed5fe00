use crate::core::date_window::to_query_window;
use crate::core::normalizer::{normalize_item, normalize_with_report, MalformedItemPolicy};
use crate::core::stats::aggregate;
use crate::domain::model::{
    BidRecord, DateRange, FetchOutcome, OutcomeKind, RawItem, Statistics,
};
use crate::domain::ports::{BidSource, Clock, CredentialStore};
use crate::utils::error::{DashboardError, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use tokio::sync::{watch, RwLock};

pub const NO_RESULTS_MESSAGE: &str = "조회된 입찰공고가 없습니다.";
pub const TRANSPORT_ERROR_MESSAGE: &str = "데이터를 불러오는 중 오류가 발생했습니다.";

/// Everything the presentation layer reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub records: Vec<BidRecord>,
    pub statistics: Statistics,
    pub error: Option<String>,
    pub loading: bool,
    pub last_outcome: Option<OutcomeKind>,
    pub fetched_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardOptions {
    pub malformed_items: MalformedItemPolicy,
}

/// Owns the credential and date range, runs fetch cycles and publishes the
/// resulting view. The only writer of the view.
pub struct Dashboard<S: BidSource, K: CredentialStore, C: Clock> {
    source: S,
    store: K,
    clock: C,
    options: DashboardOptions,
    credential: RwLock<String>,
    range: RwLock<DateRange>,
    view: watch::Sender<DashboardView>,
}

impl<S: BidSource, K: CredentialStore, C: Clock> Dashboard<S, K, C> {
    /// Loads the stored credential once; the range starts at today.
    pub async fn new(source: S, store: K, clock: C, options: DashboardOptions) -> Result<Self> {
        let credential = store.load().await?.unwrap_or_default();
        let range = DateRange::single_day(clock.now().date());
        let (view, _) = watch::channel(DashboardView::default());

        Ok(Self {
            source,
            store,
            clock,
            options,
            credential: RwLock::new(credential),
            range: RwLock::new(range),
            view,
        })
    }

    pub async fn credential(&self) -> String {
        self.credential.read().await.clone()
    }

    /// Persists the credential, then replaces the in-memory copy.
    ///
    /// On a failed save the previous credential stays in effect.
    pub async fn set_credential(&self, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.store.save(&value).await?;
        *self.credential.write().await = value;
        Ok(())
    }

    pub async fn date_range(&self) -> DateRange {
        self.range.read().await.clone()
    }

    pub async fn set_date_range(&self, range: DateRange) {
        *self.range.write().await = range;
    }

    pub fn view(&self) -> DashboardView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.view.subscribe()
    }

    /// Re-aggregates the current records against a fresh "now".
    pub fn statistics_now(&self) -> Statistics {
        let now = self.clock.now();
        aggregate(&self.view.borrow().records, now)
    }

    /// Runs one fetch cycle. Returns `None` when a cycle is already running.
    pub async fn refresh(&self) -> Option<OutcomeKind> {
        let started = self.view.send_if_modified(|view| {
            if view.loading {
                return false;
            }
            view.loading = true;
            view.error = None;
            true
        });
        if !started {
            tracing::debug!("Fetch already in progress; trigger ignored");
            return None;
        }
        let mut guard = LoadingGuard {
            view: &self.view,
            armed: true,
        };

        let credential = self.credential.read().await.clone();
        let window = to_query_window(&*self.range.read().await);
        tracing::info!(
            "Fetching bid announcements {} ~ {}",
            window.begin_timestamp,
            window.end_timestamp
        );

        let outcome = self.source.fetch(&credential, &window).await;
        let (records, error, kind) = self.resolve(outcome);

        let now = self.clock.now();
        let statistics = aggregate(&records, now);
        tracing::info!(
            "Fetch finished: {:?}, {} records ({} urgent, {} closing today)",
            kind,
            statistics.total,
            statistics.urgent,
            statistics.closing_today
        );

        guard.armed = false;
        self.view.send_modify(|view| {
            view.records = records;
            view.statistics = statistics;
            view.error = error;
            view.loading = false;
            view.last_outcome = Some(kind);
            view.fetched_at = Some(now);
        });

        Some(kind)
    }

    fn resolve(&self, outcome: FetchOutcome) -> (Vec<BidRecord>, Option<String>, OutcomeKind) {
        let kind = outcome.kind();
        match outcome {
            FetchOutcome::Success(items) => self.resolve_items(&items),
            FetchOutcome::EmptyResult => (Vec::new(), Some(NO_RESULTS_MESSAGE.to_string()), kind),
            FetchOutcome::DomainError(message) => (Vec::new(), Some(message), kind),
            FetchOutcome::TransportError => {
                (Vec::new(), Some(TRANSPORT_ERROR_MESSAGE.to_string()), kind)
            }
        }
    }

    fn resolve_items(&self, items: &[RawItem]) -> (Vec<BidRecord>, Option<String>, OutcomeKind) {
        let records = match self.options.malformed_items {
            MalformedItemPolicy::Skip => normalize_with_report(items).records,
            MalformedItemPolicy::Abort => {
                let strict: std::result::Result<Vec<_>, _> = items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| normalize_item(index, item))
                    .collect();
                match strict {
                    Ok(records) => records,
                    Err(malformed) => {
                        let err = DashboardError::from(malformed);
                        tracing::warn!("Aborting fetch cycle: {}", err);
                        return (
                            Vec::new(),
                            Some(err.user_friendly_message()),
                            OutcomeKind::MalformedItem,
                        );
                    }
                }
            }
        };

        // Every item was malformed and skipped.
        if records.is_empty() {
            return (
                Vec::new(),
                Some(NO_RESULTS_MESSAGE.to_string()),
                OutcomeKind::EmptyResult,
            );
        }

        (records, None, OutcomeKind::Success)
    }
}

/// Clears `loading` when a fetch cycle is dropped before it completes.
struct LoadingGuard<'a> {
    view: &'a watch::Sender<DashboardView>,
    armed: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!("Fetch cycle cancelled");
            self.view.send_modify(|view| view.loading = false);
        }
    }
}
