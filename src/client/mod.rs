//! Backend access: the authenticated executor and the account endpoints built on it.

pub mod account;
pub mod executor;
pub mod http;
pub mod request;

pub use account::{Identity, LoginOutcome};
pub use executor::AuthenticatedClient;
pub use request::{Method, RequestDescriptor};
