//! Login, registration and logout endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::executor::{decode_data, AuthenticatedClient, Failure, Reply};
use super::request::{Method, RequestDescriptor};
use crate::auth::Credential;
use crate::error::ErrorKind;
use crate::session::{Invalidation, Role};

/// Signed-in account returned by a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub role: Role,
    /// The `<role>Details` profile record, or `Null` if the backend omitted it.
    pub details: Value,
}

/// Identity record returned by the session endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub role: Role,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginPayload {
    access_token: String,
    refresh_token: String,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl AuthenticatedClient {
    /// Sign in as `role`. On success the credential pair is stored and
    /// listeners see the new session.
    ///
    /// Login failures (`USERNAME_NOT_FOUND`, `INCORRECT_PASSWORD`, ...) leave
    /// the store untouched.
    pub async fn login<B: Serialize>(
        &self,
        role: Role,
        credentials: &B,
    ) -> Result<LoginOutcome, ErrorKind> {
        let request = anonymous_request(&format!("/api/{role}-login"), credentials)?;
        let body = self.send_anonymous(&request).await?;
        let payload: LoginPayload =
            decode_data(&body).map_err(|failure| log_failure(&request, failure))?;
        let credential = Credential::new(payload.access_token, payload.refresh_token);
        if !credential.is_complete() {
            tracing::warn!(role = %role, "Login response carried an empty token");
            return Err(ErrorKind::UnknownError);
        }
        let mut rest = payload.rest;
        let details = rest.remove(&format!("{role}Details")).unwrap_or(Value::Null);
        self.store().set(credential);
        tracing::debug!(role = %role, "Signed in");
        self.notify_signed_in(role, &details);
        Ok(LoginOutcome { role, details })
    }

    /// Create a new account for `role`. Returns the backend's `data` verbatim.
    pub async fn register<B: Serialize>(
        &self,
        role: Role,
        registration: &B,
    ) -> Result<Value, ErrorKind> {
        let request = anonymous_request(&format!("/api/{role}-register"), registration)?;
        let body = self.send_anonymous(&request).await?;
        decode_data(&body).map_err(|failure| log_failure(&request, failure))
    }

    /// End the current session on the server, then clear the local credential.
    ///
    /// The stored refresh token is sent in the body so the server can revoke it.
    pub async fn logout(&self) -> Result<(), ErrorKind> {
        let body = self
            .store()
            .get()
            .map(|credential| json!({ "refreshToken": credential.refresh_token }));
        self.sign_out(RequestDescriptor::new(Method::Post, "/api/logout", body))
            .await
    }

    /// End every session of this account on the server, then clear the local credential.
    pub async fn logout_all(&self) -> Result<(), ErrorKind> {
        self.sign_out(RequestDescriptor::new(Method::Post, "/api/logout-all", None))
            .await
    }

    /// Fetch the identity behind the stored credential.
    pub async fn identity(&self) -> Result<Identity, ErrorKind> {
        let path = self.config().identity_path.clone();
        self.execute(&RequestDescriptor::get(path)).await
    }

    // An empty store short-circuits in `execute` with `NoAuth`.
    async fn sign_out(&self, request: RequestDescriptor) -> Result<(), ErrorKind> {
        let _: Value = self.execute(&request).await?;
        self.store().clear();
        tracing::debug!(path = request.path(), "Signed out");
        self.notify_invalidated(&Invalidation::SignedOut);
        Ok(())
    }

    async fn send_anonymous(&self, request: &RequestDescriptor) -> Result<String, ErrorKind> {
        match self.send(request, None).await {
            Ok(Reply::Success(body)) => Ok(body),
            Ok(Reply::Rejected { kind, status }) => {
                Err(log_failure(request, Failure::Rejected { kind, status }))
            }
            Err(failure) => Err(log_failure(request, failure)),
        }
    }
}

fn anonymous_request<B: Serialize>(path: &str, body: &B) -> Result<RequestDescriptor, ErrorKind> {
    RequestDescriptor::with_json(Method::Post, path, body).map_err(|err| {
        tracing::warn!(path, error = %err, "Unserializable request body");
        ErrorKind::UnknownError
    })
}

fn log_failure(request: &RequestDescriptor, failure: Failure) -> ErrorKind {
    let kind = failure.kind();
    tracing::debug!(path = request.path(), failure = ?failure, "Unauthenticated request failed");
    kind
}
