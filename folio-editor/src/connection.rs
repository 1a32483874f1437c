//! Backend connection status

use folio_core::ConnectionState;
use std::sync::Arc;
use tokio::sync::watch;

/// Current link state, pushed by the transport and read by the shell
///
/// Cloning shares the same underlying state.
#[derive(Clone, Debug)]
pub struct ConnectionStatus {
    tx: Arc<watch::Sender<ConnectionState>>,
}

impl ConnectionStatus {
    pub fn new(initial: ConnectionState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.current().is_open()
    }

    /// Record a new state; returns whether it differed from the previous one
    pub fn set(&self, state: ConnectionState) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });

        if changed {
            tracing::debug!("Connection state is now {}", state);
        }
        changed
    }

    /// Observe future state changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::new(ConnectionState::Connecting)
    }
}
