use std::sync::Arc;
use tokio::sync::watch;

/// Bearer token holder shared between the API client and whoever signs the user in.
///
/// Subscribers see sign-outs, including the one the client performs on a 401.
#[derive(Debug, Clone)]
pub struct Session {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl Session {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.sign_in(token);
        session
    }

    pub fn sign_in(&self, token: impl Into<String>) {
        self.tx.send_replace(Some(token.into()));
    }

    pub fn sign_out(&self) {
        self.tx.send_if_modified(|token| token.take().is_some());
    }

    pub fn token(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
