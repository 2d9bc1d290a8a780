use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use super::{Invalidation, Role, SessionListener, SessionState};
use crate::client::AuthenticatedClient;

/// Explicit state machine over [`SessionState`].
///
/// State only changes through the named transitions below. UI code reads
/// [`snapshot`](Self::snapshot) or awaits changes on a receiver from
/// [`watch_state`](Self::watch_state).
///
/// ```text
/// logged out ──set_loading──▶ loading ──identity ok──▶ authenticated
///                                │
///                                └──NO_AUTH / SESSION_EXPIRED──▶ logged out
/// ```
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use bloodlink::auth::FileCredentialStore;
/// use bloodlink::client::AuthenticatedClient;
/// use bloodlink::config::ClientConfig;
/// use bloodlink::session::SessionObserver;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = AuthenticatedClient::new(
///     ClientConfig::from_env()?,
///     Arc::new(FileCredentialStore::new_default()),
/// )?;
/// let session = SessionObserver::attach(&client);
/// session.refresh(&client).await;
/// if !session.snapshot().is_authenticated {
///     // redirect to login
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionObserver {
    state_tx: watch::Sender<SessionState>,
    state_rx: watch::Receiver<SessionState>,
}

impl Default for SessionObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionObserver {
    pub fn new() -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::default());
        Self { state_tx, state_rx }
    }

    /// Create an observer and register it with `client` so executor outcomes
    /// drive its transitions.
    pub fn attach(client: &AuthenticatedClient) -> Arc<Self> {
        let observer = Arc::new(Self::new());
        client.add_listener(observer.clone());
        observer
    }

    pub fn snapshot(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Start an identity fetch. Keeps whatever identity is already known.
    pub fn set_loading(&self) {
        self.state_tx.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });
    }

    pub fn mark_authenticated(&self, role: Role, user: Value) {
        self.state_tx.send_replace(SessionState {
            is_authenticated: true,
            role: Some(role),
            user: Some(user),
            is_loading: false,
            error: None,
        });
    }

    /// Complete a pending fetch as authenticated. No-op unless still loading.
    fn finish_loading(&self, role: Role, user: Value) -> bool {
        self.state_tx.send_if_modified(|state| {
            if !state.is_loading {
                return false;
            }
            *state = SessionState {
                is_authenticated: true,
                role: Some(role),
                user: Some(user),
                is_loading: false,
                error: None,
            };
            true
        })
    }

    /// Move to the logged-out terminal state, dropping cached role and profile.
    ///
    /// Returns `false` (and notifies nobody) if already logged out.
    pub fn mark_logged_out(&self, error: Option<String>) -> bool {
        let changed = self.state_tx.send_if_modified(|state| {
            if state.is_logged_out() {
                return false;
            }
            *state = SessionState {
                error,
                ..SessionState::default()
            };
            true
        });
        if changed {
            tracing::debug!("Session marked logged out");
        }
        changed
    }

    /// Re-fetch the current identity through `client`.
    ///
    /// Terminal auth failures log the session out; other failures only end
    /// the loading state and record the error. A fetch that completes after
    /// the session was invalidated mid-flight is discarded.
    pub async fn refresh(&self, client: &AuthenticatedClient) {
        self.set_loading();
        match client.identity().await {
            Ok(identity) => {
                if !self.finish_loading(identity.role, identity.details) {
                    tracing::debug!("Session changed during identity fetch; result discarded");
                }
            }
            Err(kind) if kind.ends_session() => {
                self.mark_logged_out(Some(kind.to_string()));
            }
            Err(kind) => {
                tracing::debug!(kind = kind.literal(), "Identity fetch failed");
                self.state_tx.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(kind.to_string());
                });
            }
        }
    }
}

impl SessionListener for SessionObserver {
    fn on_invalidated(&self, reason: &Invalidation) {
        self.mark_logged_out(reason.message());
    }

    fn on_signed_in(&self, role: Role, details: &Value) {
        self.mark_authenticated(role, details.clone());
    }
}
