use serde::{Deserialize, Serialize};

/// Access/refresh bearer pair issued by the backend at login or refresh.
///
/// Both values are opaque; nothing in the client inspects their contents.
///
/// # Example
/// ```
/// use bloodlink::auth::Credential;
///
/// let credential = Credential::new("access", "refresh");
/// assert!(credential.is_complete());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// A pair missing either token is treated as no credential at all.
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }
}
