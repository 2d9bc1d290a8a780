//! Convenience re-exports for common use.

pub use crate::auth::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use crate::client::{AuthenticatedClient, Method, RequestDescriptor};
pub use crate::config::ClientConfig;
pub use crate::error::ErrorKind;
pub use crate::session::{Role, SessionObserver, SessionState};
