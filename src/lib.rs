//! bloodlink — session client for the blood-donation coordination platform.
//!
//! Attaches bearer credentials to backend calls, renews an expired access
//! token exactly once per call, and tears the session down when the backend
//! revokes it. UI layers observe the outcome through a [`session::SessionObserver`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use bloodlink::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AuthenticatedClient::new(
//!     ClientConfig::from_env()?,
//!     Arc::new(FileCredentialStore::new_default()),
//! )?;
//! let session = SessionObserver::attach(&client);
//!
//! client
//!     .login(Role::User, &json!({ "email": "donor@example.org", "password": "hunter2" }))
//!     .await?;
//! let history: serde_json::Value = client
//!     .execute(&RequestDescriptor::get("/api/donation-history/user-1"))
//!     .await?;
//! println!("{history} (signed in: {})", session.snapshot().is_authenticated);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod prelude;
pub mod session;
