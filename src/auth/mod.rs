//! Bearer credentials and their persistence.

pub mod credential;
pub mod error;
pub mod store;

pub use credential::Credential;
pub use error::StoreError;
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreConfig};
