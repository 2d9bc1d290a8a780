//! Authenticated request execution with a single transparent token refresh.

use std::sync::{Arc, RwLock};

use reqwest::header::InvalidHeaderValue;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::http::{build_client, json_headers};
use super::request::{Method, RequestDescriptor};
use crate::auth::{Credential, CredentialStore};
use crate::config::ClientConfig;
use crate::error::{classify_body, is_terminal, ConfigError, ErrorKind};
use crate::session::{Invalidation, Role, SessionListener};

/// Success envelope: every 2xx body is `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub(crate) data: T,
}

/// Outcome of a single HTTP round trip that reached the server.
pub(crate) enum Reply {
    Success(String),
    Rejected { kind: ErrorKind, status: u16 },
}

/// Why an execution failed, before it is reduced to an [`ErrorKind`].
///
/// Keeps "never logged in" apart from "server revoked the session" even
/// though both surface as `NoAuth`.
#[derive(Debug)]
pub(crate) enum Failure {
    MissingCredential,
    Rejected { kind: ErrorKind, status: u16 },
    Transport(reqwest::Error),
    InvalidToken(InvalidHeaderValue),
    Decode(String),
}

impl Failure {
    pub(crate) fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential => ErrorKind::NoAuth,
            Self::Rejected { kind, .. } => kind.clone(),
            Self::Transport(_) | Self::InvalidToken(_) | Self::Decode(_) => {
                ErrorKind::UnknownError
            }
        }
    }
}

/// Executes backend calls on behalf of the signed-in account.
///
/// Reads the current [`Credential`] from the store, attaches it as a bearer
/// token, and on `ACCESS_TOKEN_EXPIRED` refreshes it once and retries once.
/// Terminal rejections clear the store and notify registered
/// [`SessionListener`]s.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use bloodlink::auth::MemoryCredentialStore;
/// use bloodlink::client::{AuthenticatedClient, RequestDescriptor};
/// use bloodlink::config::ClientConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = AuthenticatedClient::new(
///     ClientConfig::from_env()?,
///     Arc::new(MemoryCredentialStore::new()),
/// )?;
/// let history: serde_json::Value = client
///     .execute(&RequestDescriptor::get("/api/donation-history/user-1"))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthenticatedClient {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    listeners: RwLock<Vec<Arc<dyn SessionListener>>>,
}

impl AuthenticatedClient {
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ConfigError> {
        let http = build_client(&config)?;
        Ok(Self {
            http,
            config,
            store,
            listeners: RwLock::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Register a listener for sign-in and invalidation events.
    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(listener);
    }

    /// Run `request` with the stored credential and decode the `data` field of the reply.
    ///
    /// At most one refresh and one retry happen per call. Expected failures
    /// are returned as an [`ErrorKind`]; transport and decode problems become
    /// [`ErrorKind::UnknownError`] and leave the store untouched.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: &RequestDescriptor,
    ) -> Result<T, ErrorKind> {
        match self.run(request).await {
            Ok(value) => Ok(value),
            Err(failure) => Err(self.settle(request, failure)),
        }
    }

    async fn run<T: DeserializeOwned>(&self, request: &RequestDescriptor) -> Result<T, Failure> {
        let credential = self.store.get().ok_or(Failure::MissingCredential)?;
        match self.send(request, Some(&credential.access_token)).await? {
            Reply::Success(body) => decode_data(&body),
            Reply::Rejected {
                kind: ErrorKind::AccessTokenExpired,
                ..
            } => {
                tracing::debug!(path = request.path(), "Access token expired; refreshing");
                let renewed = self.refresh(&credential).await?;
                // No second refresh: whatever the retry reports is final.
                match self.send(request, Some(&renewed.access_token)).await? {
                    Reply::Success(body) => decode_data(&body),
                    Reply::Rejected { kind, status } => Err(Failure::Rejected { kind, status }),
                }
            }
            Reply::Rejected { kind, status } => Err(Failure::Rejected { kind, status }),
        }
    }

    /// Exchange the refresh token for a new pair and store it as one unit.
    async fn refresh(&self, current: &Credential) -> Result<Credential, Failure> {
        let request = RequestDescriptor::post(
            self.config.refresh_path.clone(),
            json!({ "refreshToken": current.refresh_token }),
        );
        let body = match self.send(&request, Some(&current.access_token)).await? {
            Reply::Success(body) => body,
            Reply::Rejected { kind, status } => {
                tracing::warn!(status, kind = kind.literal(), "Token refresh rejected");
                return Err(Failure::Rejected { kind, status });
            }
        };
        let renewed: Credential = decode_data(&body)?;
        if !renewed.is_complete() {
            return Err(Failure::Decode(
                "refresh response carried an empty token".to_string(),
            ));
        }
        self.store.set(renewed.clone());
        tracing::debug!("Stored refreshed credential");
        Ok(renewed)
    }

    /// Issue one HTTP call. Only problems that keep a reply from arriving are `Err`.
    pub(crate) async fn send(
        &self,
        request: &RequestDescriptor,
        bearer: Option<&str>,
    ) -> Result<Reply, Failure> {
        let headers = json_headers(bearer).map_err(Failure::InvalidToken)?;
        let url = self.config.url(request.path());
        let mut builder = self
            .http
            .request(request.method().into(), &url)
            .headers(headers);
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        tracing::debug!(method = %request.method(), url = %url, "Sending request");
        let response = builder.send().await.map_err(Failure::Transport)?;
        let status = response.status();
        let text = response.text().await.map_err(Failure::Transport)?;
        if status.is_success() {
            return Ok(Reply::Success(text));
        }
        let status = status.as_u16();
        Ok(Reply::Rejected {
            kind: classify_body(&text, status),
            status,
        })
    }

    /// Reduce a failure to its reported kind, applying session side effects.
    fn settle(&self, request: &RequestDescriptor, failure: Failure) -> ErrorKind {
        let kind = failure.kind();
        match &failure {
            Failure::MissingCredential => {
                tracing::debug!(path = request.path(), "No stored credential");
                self.notify_invalidated(&Invalidation::MissingCredential);
            }
            Failure::Rejected { kind, status } => {
                if is_terminal(kind, *status) {
                    tracing::warn!(
                        path = request.path(),
                        status,
                        kind = kind.literal(),
                        "Session revoked; clearing credential"
                    );
                    self.store.clear();
                }
                if kind.ends_session() {
                    self.notify_invalidated(&Invalidation::Revoked {
                        kind: kind.clone(),
                        status: *status,
                    });
                }
            }
            Failure::Transport(err) => {
                tracing::warn!(path = request.path(), error = %err, "Request failed before reaching the backend");
            }
            Failure::InvalidToken(err) => {
                tracing::warn!(path = request.path(), error = %err, "Stored token is not a valid header value; request not sent");
            }
            Failure::Decode(message) => {
                tracing::warn!(path = request.path(), error = %message, "Undecodable response");
            }
        }
        kind
    }

    pub(crate) fn notify_invalidated(&self, reason: &Invalidation) {
        for listener in self.listeners_snapshot() {
            listener.on_invalidated(reason);
        }
    }

    pub(crate) fn notify_signed_in(&self, role: Role, details: &Value) {
        for listener in self.listeners_snapshot() {
            listener.on_signed_in(role, details);
        }
    }

    fn listeners_snapshot(&self) -> Vec<Arc<dyn SessionListener>> {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Convenience for `execute` with a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: impl Into<String>) -> Result<T, ErrorKind> {
        self.execute(&RequestDescriptor::get(path)).await
    }

    /// Convenience for `execute` with an arbitrary method and JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: impl Into<String>,
        body: Value,
    ) -> Result<T, ErrorKind> {
        self.execute(&RequestDescriptor::new(method, path, Some(body)))
            .await
    }
}

pub(crate) fn decode_data<T: DeserializeOwned>(body: &str) -> Result<T, Failure> {
    serde_json::from_str::<DataEnvelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|err| Failure::Decode(err.to_string()))
}
