//! Injectable, observable container for the active position filter.

use std::sync::Arc;
use tokio::sync::watch;

use super::{FilterError, PositionFilter};

/// Holds the current [`PositionFilter`] and notifies subscribers on change.
///
/// Cloning yields another handle to the same state; pass it to whatever needs it
/// instead of reaching for a global.
#[derive(Debug, Clone)]
pub struct FilterStore {
    tx: Arc<watch::Sender<PositionFilter>>,
}

impl FilterStore {
    pub fn new(initial: PositionFilter) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current filter.
    pub fn get(&self) -> PositionFilter {
        self.tx.borrow().clone()
    }

    pub fn set(&self, filter: PositionFilter) {
        self.tx.send_replace(filter);
    }

    /// Modify the filter in place; subscribers are notified once.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut PositionFilter),
    {
        self.tx.send_modify(f);
    }

    pub fn reset(&self) {
        self.set(PositionFilter::default());
    }

    pub fn subscribe(&self) -> watch::Receiver<PositionFilter> {
        self.tx.subscribe()
    }

    pub fn to_query_string(&self) -> String {
        self.tx.borrow().to_query_string()
    }

    /// Replace the filter with one parsed from a URL query string.
    ///
    /// # Errors
    /// Leaves the current filter untouched and returns the parse error on bad input.
    pub fn load_query_string(&self, query: &str) -> Result<(), FilterError> {
        let filter = PositionFilter::from_query_string(query)?;
        self.set(filter);
        Ok(())
    }
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new(PositionFilter::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, PositionStatus};

    #[test]
    fn test_get_set_reset() {
        let store = FilterStore::default();
        assert!(store.get().is_empty());

        store.set(PositionFilter {
            direction: Some(Direction::Long),
            ..Default::default()
        });
        assert_eq!(store.get().direction, Some(Direction::Long));

        store.reset();
        assert!(store.get().is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let store = FilterStore::default();
        let handle = store.clone();
        handle.update(|f| f.statuses.push(PositionStatus::Loss));
        assert_eq!(store.get().statuses, vec![PositionStatus::Loss]);
    }

    #[tokio::test]
    async fn test_subscribers_observe_updates() {
        let store = FilterStore::default();
        let mut rx = store.subscribe();

        store.update(|f| f.instrument = Some("TCS".to_string()));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().instrument.as_deref(), Some("TCS"));
    }

    #[test]
    fn test_load_query_string_keeps_state_on_error() {
        let store = FilterStore::default();
        store.load_query_string("direction=short").unwrap();
        assert_eq!(store.get().direction, Some(Direction::Short));

        assert!(store.load_query_string("direction=sideways").is_err());
        assert_eq!(store.get().direction, Some(Direction::Short));
        assert_eq!(store.to_query_string(), "direction=short");
    }
}
