//! Debounced, cancellable recomputation of a position as its inputs change.
//!
//! Every submission takes a new generation ticket. A task only publishes its
//! result while its ticket is still the latest one, so a slow response can never
//! overwrite the outcome of a newer edit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{ApiError, PositionComputer};
use crate::config::Config;
use crate::engine::{ComputeRequest, ComputedPosition};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RecomputeState {
    #[default]
    Idle,
    /// A request is debouncing or in flight.
    Pending { ticket: u64 },
    Ready {
        ticket: u64,
        position: ComputedPosition,
    },
    Failed { ticket: u64, error: ApiError },
}

impl RecomputeState {
    pub fn position(&self) -> Option<&ComputedPosition> {
        match self {
            RecomputeState::Ready { position, .. } => Some(position),
            _ => None,
        }
    }
}

pub struct RecomputeSession {
    computer: Arc<dyn PositionComputer>,
    debounce: Duration,
    generation: Arc<AtomicU64>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
    tx: Arc<watch::Sender<RecomputeState>>,
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Recompute lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

impl RecomputeSession {
    pub fn new(computer: Arc<dyn PositionComputer>, debounce: Duration) -> Self {
        let (tx, _rx) = watch::channel(RecomputeState::Idle);
        Self {
            computer,
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Mutex::new(None),
            tx: Arc::new(tx),
        }
    }

    /// Session using the configured debounce delay.
    pub fn from_config(computer: Arc<dyn PositionComputer>, config: &Config) -> Self {
        Self::new(computer, config.recompute_debounce)
    }

    /// Schedule a recompute after the debounce delay, superseding any earlier one.
    ///
    /// Must be called from within a tokio runtime. Returns the submission's ticket.
    pub fn submit(&self, request: ComputeRequest) -> u64 {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_replace(RecomputeState::Pending { ticket });

        let computer = Arc::clone(&self.computer);
        let generation = Arc::clone(&self.generation);
        let tx = Arc::clone(&self.tx);
        let debounce = self.debounce;

        let handle = tokio::spawn(async move {
            if !debounce.is_zero() {
                tokio::time::sleep(debounce).await;
            }
            if generation.load(Ordering::SeqCst) != ticket {
                return;
            }

            let result = computer.compute(request).await;
            if generation.load(Ordering::SeqCst) != ticket {
                debug!(ticket, "discarding stale recompute result");
                return;
            }

            let state = match result {
                Ok(position) => RecomputeState::Ready { ticket, position },
                Err(ApiError::Cancelled) => return,
                Err(error) => {
                    warn!(ticket, "recompute failed: {}", error);
                    RecomputeState::Failed { ticket, error }
                }
            };
            // Only publish if no newer submission slipped in while matching.
            tx.send_if_modified(|current| {
                if generation.load(Ordering::SeqCst) != ticket {
                    return false;
                }
                *current = state;
                true
            });
        });

        let previous = lock_or_recover(&self.in_flight).replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        ticket
    }

    /// Drop any pending work and return to `Idle`.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = lock_or_recover(&self.in_flight).take() {
            handle.abort();
        }
        self.tx.send_replace(RecomputeState::Idle);
    }

    pub fn current(&self) -> RecomputeState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RecomputeState> {
        self.tx.subscribe()
    }

    /// Wait until the state for `ticket` is no longer pending.
    ///
    /// Returns `Idle` if the session was cancelled, or the newer state if
    /// `ticket` was superseded.
    pub async fn settled(&self, ticket: u64) -> RecomputeState {
        let mut rx = self.subscribe();
        loop {
            {
                let state = rx.borrow_and_update();
                match &*state {
                    RecomputeState::Pending { ticket: t } if *t <= ticket => {}
                    other => return other.clone(),
                }
            }
            if rx.changed().await.is_err() {
                return self.current();
            }
        }
    }
}

impl Drop for RecomputeSession {
    fn drop(&mut self) {
        if let Some(handle) = lock_or_recover(&self.in_flight).take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LocalComputer;
    use crate::domain::Trade;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::sync::atomic::AtomicUsize;

    fn request(exit: rust_decimal::Decimal) -> ComputeRequest {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 9, 15, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 2, 10, 15, 0).unwrap();
        ComputeRequest::new(
            vec![
                Trade::buy(t0, dec!(10).into(), dec!(100).into()),
                Trade::sell(t1, dec!(10).into(), exit.into()),
            ],
            dec!(100).into(),
            dec!(0).into(),
        )
    }

    /// Counts calls and answers the first one slowest.
    struct SlowFirst {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PositionComputer for SlowFirst {
        async fn compute(&self, request: ComputeRequest) -> Result<ComputedPosition, ApiError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = if call == 0 { 200 } else { 10 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(request.compute()?)
        }
    }

    struct AlwaysCancelled;

    #[async_trait]
    impl PositionComputer for AlwaysCancelled {
        async fn compute(&self, _request: ComputeRequest) -> Result<ComputedPosition, ApiError> {
            Err(ApiError::Cancelled)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_submissions() {
        let computer = Arc::new(SlowFirst {
            calls: AtomicUsize::new(0),
        });
        let session = RecomputeSession::new(computer.clone(), Duration::from_millis(300));

        session.submit(request(dec!(110)));
        session.submit(request(dec!(115)));
        let last = session.submit(request(dec!(120)));

        let state = session.settled(last).await;
        assert_eq!(computer.calls.load(Ordering::SeqCst), 1);
        let position = state.position().unwrap();
        assert_eq!(position.net_pnl_amount.to_canonical_string(), "200");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_result_is_discarded() {
        let computer = Arc::new(SlowFirst {
            calls: AtomicUsize::new(0),
        });
        let session = RecomputeSession::new(computer.clone(), Duration::ZERO);

        let first = session.submit(request(dec!(110)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = session.submit(request(dec!(90)));

        let state = session.settled(second).await;
        assert!(matches!(state, RecomputeState::Ready { ticket, .. } if ticket == second));
        assert_eq!(
            state.position().unwrap().net_pnl_amount.to_canonical_string(),
            "-100"
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
        let current = session.current();
        assert!(matches!(current, RecomputeState::Ready { ticket, .. } if ticket == second));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_failure_is_published() {
        let session = RecomputeSession::new(Arc::new(LocalComputer), Duration::ZERO);
        let mut bad = request(dec!(110));
        bad.risk_amount = dec!(0).into();

        let ticket = session.submit(bad);
        match session.settled(ticket).await {
            RecomputeState::Failed { error, .. } => {
                assert_eq!(
                    error.user_message().as_deref(),
                    Some("Risk amount must be greater than zero")
                );
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_result_is_not_reported() {
        let session = RecomputeSession::new(Arc::new(AlwaysCancelled), Duration::ZERO);
        let ticket = session.submit(request(dec!(110)));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(session.current(), RecomputeState::Pending { ticket });
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_returns_to_idle() {
        let session = RecomputeSession::new(Arc::new(LocalComputer), Duration::from_millis(300));
        session.submit(request(dec!(110)));
        session.cancel();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(session.current(), RecomputeState::Idle);
    }
}
