#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bloodlink::auth::{Credential, CredentialStore, MemoryCredentialStore};
use bloodlink::client::AuthenticatedClient;
use bloodlink::config::ClientConfig;
use serde_json::{json, Value};
use wiremock::MockServer;

/// Every mutation a [`RecordingStore`] has seen, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    Set(Credential),
    Clear,
}

/// In-memory store that also keeps a log of writes.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryCredentialStore,
    writes: Mutex<Vec<StoreWrite>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(access: &str, refresh: &str) -> Self {
        Self {
            inner: MemoryCredentialStore::with_credential(Credential::new(access, refresh)),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> Vec<StoreWrite> {
        self.writes.lock().expect("store lock poisoned").clone()
    }
}

impl CredentialStore for RecordingStore {
    fn get(&self) -> Option<Credential> {
        self.inner.get()
    }

    fn set(&self, credential: Credential) {
        self.writes
            .lock()
            .expect("store lock poisoned")
            .push(StoreWrite::Set(credential.clone()));
        self.inner.set(credential);
    }

    fn clear(&self) {
        self.writes
            .lock()
            .expect("store lock poisoned")
            .push(StoreWrite::Clear);
        self.inner.clear();
    }
}

pub fn client_for(server: &MockServer, store: Arc<RecordingStore>) -> AuthenticatedClient {
    client_at(&server.uri(), store)
}

pub fn client_at(base_url: &str, store: Arc<RecordingStore>) -> AuthenticatedClient {
    let config = ClientConfig::builder().base_url(base_url).build();
    AuthenticatedClient::new(config, store).expect("build client")
}

/// Time budget for [`client_with_timeout`]; delay a mock past it to fail one step.
pub const SHORT_TIMEOUT: Duration = Duration::from_millis(200);

/// Like [`client_for`], but every request gives up after [`SHORT_TIMEOUT`].
pub fn client_with_timeout(server: &MockServer, store: Arc<RecordingStore>) -> AuthenticatedClient {
    let config = ClientConfig::builder()
        .base_url(server.uri())
        .timeout(SHORT_TIMEOUT)
        .build();
    AuthenticatedClient::new(config, store).expect("build client")
}

/// Base URL of a port nothing is listening on.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

pub fn error_body(message: &str, req_uuid: &str) -> Value {
    json!({ "error": { "message": message, "data": { "req_uuid": req_uuid } } })
}
