//! Order state container.
//!
//! Views dispatch an [`Intent`]. The store folds it into state right away
//! (setting `loading`, clearing `error`), runs the matching gateway call on a
//! spawned task, then folds the resulting [`Outcome`] in. State snapshots are
//! immutable `Arc`s published on a `watch` channel; each action produces a
//! new snapshot.
//!
//! Requests are never cancelled or de-duplicated. When two requests overlap
//! the one that settles last wins, even if it was dispatched first. Each
//! dispatch carries a sequence number so logs show when that happened.

pub mod actions;
pub mod effects;
pub mod reducer;
pub mod selectors;
pub mod state;

pub use actions::{Action, Intent, OrderLookup, Outcome};
pub use selectors::{Selectors, StatusCounts};
pub use state::OrdersState;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{oneshot, watch};
use tracing::Instrument;

use crate::gateway::OrderGateway;

struct StoreInner {
    state: watch::Sender<Arc<OrdersState>>,
    gateway: Arc<dyn OrderGateway>,
    seq: AtomicU64,
    selectors: Selectors,
}

impl StoreInner {
    fn apply(&self, action: &Action) {
        self.state.send_modify(|state| {
            *state = Arc::new(reducer::reduce(state, action));
        });
    }
}

/// Per-session order store.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

/// Handle to one dispatched intent.
#[derive(Debug)]
pub struct Dispatched {
    seq: u64,
    outcome: oneshot::Receiver<Outcome>,
}

impl Dispatched {
    /// Sequence number of this dispatch within its store.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Wait until the outcome has been folded into state.
    ///
    /// Returns `None` only if the effect task was aborted.
    pub async fn settled(self) -> Option<Outcome> {
        self.outcome.await.ok()
    }
}

impl Store {
    /// Empty store backed by `gateway`.
    #[must_use]
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        let (state, _) = watch::channel(Arc::new(OrdersState::default()));
        Self {
            inner: Arc::new(StoreInner {
                state,
                gateway,
                seq: AtomicU64::new(0),
                selectors: Selectors::default(),
            }),
        }
    }

    /// Dispatch an intent.
    ///
    /// The intent is reduced before this returns; the gateway call runs on a
    /// spawned task and its outcome is reduced when it settles. Must be
    /// called from within a tokio runtime.
    pub fn dispatch(&self, intent: Intent) -> Dispatched {
        let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let span = tracing::info_span!("dispatch", seq, action = intent.name());

        span.in_scope(|| {
            tracing::debug!("Intent dispatched");
            self.inner.apply(&Action::Intent(intent.clone()));
        });

        let inner = Arc::clone(&self.inner);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(
            async move {
                let outcome = effects::run(inner.gateway.as_ref(), &intent).await;
                match outcome.error() {
                    Some(error) => tracing::warn!(outcome = outcome.name(), error, "Intent failed"),
                    None => tracing::debug!(outcome = outcome.name(), "Intent settled"),
                }
                inner.apply(&Action::Outcome(outcome.clone()));
                let _ = tx.send(outcome);
            }
            .instrument(span),
        );

        Dispatched { seq, outcome: rx }
    }

    /// Dispatch and wait for the outcome.
    pub async fn dispatch_and_wait(&self, intent: Intent) -> Option<Outcome> {
        self.dispatch(intent).settled().await
    }

    /// The current state snapshot.
    #[must_use]
    pub fn state(&self) -> Arc<OrdersState> {
        Arc::clone(&self.inner.state.borrow())
    }

    /// Receive every future state snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<OrdersState>> {
        self.inner.state.subscribe()
    }

    /// Memoized selectors over this store's snapshots.
    #[must_use]
    pub fn selectors(&self) -> &Selectors {
        &self.inner.selectors
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Store")
            .field("orders", &state.orders.len())
            .field("loading", &state.loading)
            .field("seq", &self.inner.seq.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
