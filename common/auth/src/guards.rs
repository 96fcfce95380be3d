use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::session::TokenStore;

/// Tri-state authentication signal produced by [`AuthGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Pending,
    Authenticated,
    Unauthenticated,
}

/// Delayed session check bound to one mount of a protected view.
///
/// On mount the guard waits for the settle delay, or for the store to report
/// a completed write, whichever comes first, then reads the store once and
/// settles. Dropping the guard before that cancels the pending check; the
/// store is never read and no state is published afterwards.
pub struct AuthGuard {
    state: watch::Receiver<AuthState>,
    task: JoinHandle<()>,
}

impl AuthGuard {
    /// Must be called from within a tokio runtime.
    pub fn mount(store: TokenStore, settle_delay: Duration) -> Self {
        let (sender, state) = watch::channel(AuthState::Pending);
        let mut written = store.subscribe();
        written.borrow_and_update();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = sleep(settle_delay) => {}
                _ = written.changed() => {
                    debug!("session write observed before settle delay elapsed");
                }
            }

            let next = if store.read().is_some() {
                AuthState::Authenticated
            } else {
                AuthState::Unauthenticated
            };
            debug!(state = ?next, "auth guard settled");
            let _ = sender.send(next);
        });

        Self { state, task }
    }

    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.clone()
    }

    /// Wait until the guard leaves `Pending`.
    pub async fn settled(&mut self) -> AuthState {
        let settled = self
            .state
            .wait_for(|state| *state != AuthState::Pending)
            .await
            .map(|state| *state);
        settled.unwrap_or_else(|_| *self.state.borrow())
    }

    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for AuthGuard {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            debug!("auth guard unmounted before settling");
        }
        self.task.abort();
    }
}
