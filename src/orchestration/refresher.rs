//! Snapshot refresh with latest-request-wins staleness handling.

use crate::datasource::DataSource;
use crate::domain::{ArithmeticError, Address, CollateralType, Position, PositionType, TimeMs};
use crate::engine::PositionComputer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Position types as of one completed refresh. Replaced wholesale, never mutated.
#[derive(Debug, Clone, Default)]
pub struct ContextSnapshot {
    /// Token of the request that produced this snapshot; zero before the first one.
    pub request: u64,
    pub types: Vec<PositionType>,
    pub fetched_at: Option<TimeMs>,
}

impl ContextSnapshot {
    /// An empty type list means the feed has nothing usable.
    pub fn is_available(&self) -> bool {
        !self.types.is_empty()
    }

    pub fn position_type(&self, type_id: &CollateralType) -> Option<&PositionType> {
        self.types.iter().find(|t| &t.type_id == type_id)
    }
}

pub struct ContextRefresher {
    source: Arc<dyn DataSource>,
    computer: PositionComputer,
    issued: AtomicU64,
    current: RwLock<Arc<ContextSnapshot>>,
}

impl ContextRefresher {
    pub fn new(source: Arc<dyn DataSource>, computer: PositionComputer) -> Self {
        Self {
            source,
            computer,
            issued: AtomicU64::new(0),
            current: RwLock::new(Arc::new(ContextSnapshot::default())),
        }
    }

    pub fn computer(&self) -> &PositionComputer {
        &self.computer
    }

    /// The latest applied snapshot.
    pub async fn snapshot(&self) -> Arc<ContextSnapshot> {
        self.current.read().await.clone()
    }

    /// Issue a new request token, superseding every earlier one.
    pub fn begin_request(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish `types` if `request` is still the latest issued and newer than
    /// what is applied. Returns whether the snapshot was replaced.
    pub async fn apply(&self, request: u64, types: Vec<PositionType>) -> bool {
        let latest = self.issued.load(Ordering::SeqCst);
        let mut current = self.current.write().await;
        if request != latest || request <= current.request {
            debug!(
                "Dropping stale refresh {} (latest issued {}, applied {})",
                request, latest, current.request
            );
            return false;
        }
        *current = Arc::new(ContextSnapshot {
            request,
            types,
            fetched_at: Some(TimeMs::now()),
        });
        true
    }

    /// Fetch, compute and publish position types.
    ///
    /// # Errors
    /// Returns an error if the fetched data cannot be computed; the previous
    /// snapshot stays published.
    pub async fn refresh(&self) -> Result<Arc<ContextSnapshot>, ArithmeticError> {
        let request = self.begin_request();
        let types = self.computer.load_types(self.source.as_ref()).await?;
        if self.apply(request, types).await {
            debug!("Applied refresh {}", request);
        }
        Ok(self.snapshot().await)
    }

    /// Positions owned by `owner`, read straight from the feed. `None` while
    /// the feed is failing.
    pub async fn positions(
        &self,
        owner: &Address,
    ) -> Result<Option<Vec<Position>>, ArithmeticError> {
        self.computer
            .load_positions(self.source.as_ref(), owner)
            .await
    }

    /// Refresh on a fixed interval until the task is aborted.
    pub fn spawn(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        info!("Refreshing position types every {:?}", every);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                if let Err(e) = self.refresh().await {
                    error!("Position type refresh failed: {}", e);
                }
            }
        })
    }
}
