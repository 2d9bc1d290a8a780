//! Client-side view of who is signed in.

pub mod observer;

pub use observer::SessionObserver;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::error::ErrorKind;

/// Account type; selects login endpoints and dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Facility,
    Organiser,
    Admin,
}

/// Immutable snapshot published by [`SessionObserver`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub role: Option<Role>,
    /// Opaque profile record for the signed-in account.
    pub user: Option<Value>,
    /// True only while an identity fetch is in flight.
    pub is_loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    fn is_logged_out(&self) -> bool {
        !self.is_authenticated && self.role.is_none() && self.user.is_none() && !self.is_loading
    }
}

/// Why the executor considers the session over.
#[derive(Debug, Clone, PartialEq)]
pub enum Invalidation {
    /// No credential was stored; nothing was sent.
    MissingCredential,
    /// The backend answered `NO_AUTH` or `SESSION_EXPIRED`.
    Revoked { kind: ErrorKind, status: u16 },
    /// The account logged out explicitly.
    SignedOut,
}

impl Invalidation {
    pub fn message(&self) -> Option<String> {
        match self {
            Self::MissingCredential | Self::SignedOut => None,
            Self::Revoked { kind, .. } => Some(kind.to_string()),
        }
    }
}

/// Receives session events from an [`AuthenticatedClient`](crate::client::AuthenticatedClient).
///
/// Called synchronously from the executor; implementations must not block.
pub trait SessionListener: Send + Sync {
    fn on_invalidated(&self, reason: &Invalidation);

    fn on_signed_in(&self, _role: Role, _details: &Value) {}
}
