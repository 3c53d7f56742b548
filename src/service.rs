//! The query coordinator: load lifecycle, parameter normalization and dispatch to a backend.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::backend::SalesBackend;
use crate::catalog::FilterOptions;
use crate::errors::QueryError;
use crate::query::{PageResult, PagingPolicy, Query, RawQuery};

/// Source of "today" for relative date windows.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// UTC calendar date of the wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Always the same day; for tests and reproducible runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Debug)]
struct ReadyState {
    record_count: usize,
    catalog: FilterOptions,
}

#[derive(Debug)]
enum ServiceState {
    Uninitialized,
    Loading,
    Ready(Arc<ReadyState>),
}

/// Returns the state to `Uninitialized` when a load future is dropped before it finishes.
struct LoadingGuard<'a> {
    state: &'a RwLock<ServiceState>,
    armed: bool,
}

impl LoadingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut st = self.state.write();
        if matches!(*st, ServiceState::Loading) {
            *st = ServiceState::Uninitialized;
            log::warn!("load abandoned before completion; service is uninitialized again");
        }
    }
}

/// Liveness report. Answered in every state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: String,
    pub backend: String,
    pub data_loaded: bool,
    pub record_count: usize,
}

/// Owns one backend and gates it behind `Uninitialized -> Loading -> Ready`.
///
/// The state lock is only held to read or swap the state, never across an `.await`.
pub struct QueryService<B> {
    backend: B,
    clock: Arc<dyn Clock>,
    policy: PagingPolicy,
    state: RwLock<ServiceState>,
}

impl<B: SalesBackend> QueryService<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
            policy: PagingPolicy::default(),
            state: RwLock::new(ServiceState::Uninitialized),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: PagingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.read(), ServiceState::Ready(_))
    }

    /// Load the dataset and the catalog. Returns the record count.
    ///
    /// Idempotent once ready. A call that arrives while another load is running gets `NotReady`;
    /// a failed or cancelled load leaves the service uninitialized so it can be retried.
    pub async fn initialize(&self) -> Result<usize, QueryError> {
        {
            let mut st = self.state.write();
            if let ServiceState::Ready(r) = &*st {
                return Ok(r.record_count);
            }
            if matches!(*st, ServiceState::Loading) {
                return Err(QueryError::NotReady);
            }
            *st = ServiceState::Loading;
        }
        let guard = LoadingGuard { state: &self.state, armed: true };
        let loaded = async {
            let record_count = self.backend.load().await?;
            let catalog = self.backend.filter_options().await?;
            Ok::<_, QueryError>(ReadyState { record_count, catalog })
        }
        .await;
        guard.disarm();
        match loaded {
            Ok(ready) => {
                let n = ready.record_count;
                *self.state.write() = ServiceState::Ready(Arc::new(ready));
                log::info!("{} backend ready with {n} records", self.backend.name());
                Ok(n)
            }
            Err(e) => {
                *self.state.write() = ServiceState::Uninitialized;
                log::error!("{} backend failed to load: {e}", self.backend.name());
                Err(e)
            }
        }
    }

    fn ready(&self) -> Result<Arc<ReadyState>, QueryError> {
        match &*self.state.read() {
            ServiceState::Ready(r) => Ok(Arc::clone(r)),
            _ => Err(QueryError::NotReady),
        }
    }

    /// Normalize raw request parameters against today's date and run them.
    pub async fn query(&self, raw: &RawQuery) -> Result<PageResult, QueryError> {
        let query = raw.normalize(self.policy, self.clock.today());
        self.execute(&query).await
    }

    pub async fn execute(&self, query: &Query) -> Result<PageResult, QueryError> {
        self.ready()?;
        self.backend.execute(query).await.inspect_err(|e| {
            if !e.is_not_ready() {
                log::error!("{} query failed: {e}", self.backend.name());
            }
        })
    }

    pub fn catalog(&self) -> Result<FilterOptions, QueryError> {
        Ok(self.ready()?.catalog.clone())
    }

    #[must_use]
    pub fn health(&self) -> Health {
        let (data_loaded, record_count) = match &*self.state.read() {
            ServiceState::Ready(r) => (true, r.record_count),
            _ => (false, 0),
        };
        Health {
            status: "ok".into(),
            backend: self.backend.name().into(),
            data_loaded,
            record_count,
        }
    }
}
