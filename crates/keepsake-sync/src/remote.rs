//! Remote entry store client.
//!
//! Durable, network-backed collection storage over a Realtime-Database
//! style REST surface: one document per user at `users/{uid}`, replaced
//! wholesale on every write, plus a `usernames/{name}` secondary index
//! supporting username-based sign-in. A server-sent-events stream provides
//! the realtime subscription: every emission is the full entries
//! collection, superseding local unsynced state (remote wins).

use crate::error::StoreError;
use crate::subscription::{Subscription, FEED_CAPACITY};
use async_trait::async_trait;
use futures::StreamExt;
use keepsake_core::entry::Entry;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// Conservative network timeout; expiry counts as a transport failure and
/// triggers local fallback in the coordinator.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The stored document for one user. The wire field names match what the
/// original web client wrote, so existing documents decode unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
    #[serde(
        rename = "displayName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
}

/// Secondary index record mapping a chosen username to the account it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsernameRecord {
    pub email: String,
    pub uid: String,
    pub username: String,
}

/// The seam the coordinator depends on, so sync behavior is testable
/// without a network.
#[async_trait]
pub trait RemoteEntries: Send + Sync {
    /// `None` means the user has no document yet: explicitly empty but
    /// successful, distinguished from a transport failure.
    async fn read(&self, user_key: &str) -> Result<Option<UserDocument>, StoreError>;

    /// Replace the entire stored document for the user.
    async fn write(&self, user_key: &str, document: &UserDocument) -> Result<(), StoreError>;

    /// Realtime feed of full-collection snapshots: once immediately with
    /// current state, then on every remote change.
    fn subscribe(&self, user_key: &str) -> Subscription;
}

/// The configured-or-not decision, made once from configuration instead of
/// a nullable global handle sprinkled through call sites.
pub enum RemoteBackend {
    Configured(RemoteStore),
    Unconfigured,
}

impl RemoteBackend {
    pub fn from_config(remote: Option<&keepsake_config::config::RemoteConfig>) -> Self {
        match remote {
            Some(cfg) => {
                tracing::info!(project = %cfg.project_id, "remote entry store configured");
                RemoteBackend::Configured(RemoteStore::new(&cfg.database_url, &cfg.api_key))
            }
            None => {
                tracing::info!("remote entry store not configured, using local storage only");
                RemoteBackend::Unconfigured
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    auth_token: String,
}

impl RemoteStore {
    pub fn new(database_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        let mut base_url = database_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
            auth_token: auth_token.into(),
        }
    }

    fn user_url(&self, user_key: &str) -> String {
        format!(
            "{}/users/{}.json?auth={}",
            self.base_url, user_key, self.auth_token
        )
    }

    fn username_url(&self, username: &str) -> String {
        format!(
            "{}/usernames/{}.json?auth={}",
            self.base_url,
            username.to_lowercase(),
            self.auth_token
        )
    }

    /// Look up the account a username maps to. `None` when the name is
    /// unclaimed.
    pub async fn lookup_username(
        &self,
        username: &str,
    ) -> Result<Option<UsernameRecord>, StoreError> {
        let response = self
            .client
            .get(self.username_url(username))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(StoreError::from)?;
        let response = check_status(response)?;
        Ok(response.json().await.map_err(StoreError::from)?)
    }

    /// Claim a username for an account.
    pub async fn register_username(
        &self,
        username: &str,
        record: &UsernameRecord,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.username_url(username))
            .timeout(REQUEST_TIMEOUT)
            .json(record)
            .send()
            .await
            .map_err(StoreError::from)?;
        check_status(response)?;
        Ok(())
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(StoreError::PermissionDenied(format!(
            "remote answered {status}"
        )));
    }
    if !status.is_success() {
        return Err(StoreError::Transport(format!("remote answered {status}")));
    }
    Ok(response)
}

#[async_trait]
impl RemoteEntries for RemoteStore {
    async fn read(&self, user_key: &str) -> Result<Option<UserDocument>, StoreError> {
        let response = self
            .client
            .get(self.user_url(user_key))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(StoreError::from)?;
        let response = check_status(response)?;
        // An absent document is the JSON literal `null`: a legitimate
        // empty result, not a failure.
        Ok(response.json().await.map_err(StoreError::from)?)
    }

    async fn write(&self, user_key: &str, document: &UserDocument) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.user_url(user_key))
            .timeout(REQUEST_TIMEOUT)
            .json(document)
            .send()
            .await
            .map_err(StoreError::from)?;
        check_status(response)?;
        tracing::debug!(user = %user_key, entries = document.entries.len(), "wrote remote document");
        Ok(())
    }

    fn subscribe(&self, user_key: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let store = self.clone();
        let user_key = user_key.to_string();
        let task = tokio::spawn(async move {
            store.run_feed(&user_key, tx).await;
        });
        Subscription::new(rx, task)
    }
}

/// One server-sent event's payload: the changed path and the data now at
/// that path.
#[derive(Debug, Deserialize)]
struct FeedEvent {
    path: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl RemoteStore {
    async fn run_feed(&self, user_key: &str, tx: mpsc::Sender<Vec<Entry>>) {
        // Emit current state first, so a subscriber always starts from the
        // latest full snapshot.
        match self.read(user_key).await {
            Ok(doc) => {
                let entries = doc.map(|d| d.entries).unwrap_or_default();
                if tx.send(entries).await.is_err() {
                    return;
                }
            }
            Err(err) => {
                tracing::warn!(user = %user_key, error = %err, "realtime feed failed to read initial state");
                return;
            }
        }

        let response = match self
            .client
            .get(self.user_url(user_key))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(user = %user_key, status = %r.status(), "realtime feed rejected");
                return;
            }
            Err(err) => {
                tracing::warn!(user = %user_key, error = %err, "realtime feed connection failed");
                return;
            }
        };

        let mut byte_stream = response.bytes_stream();
        let mut line_buffer = String::new();
        let mut event_name = String::new();

        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(err) => {
                    tracing::warn!(user = %user_key, error = %err, "realtime feed stream error");
                    return;
                }
            };
            line_buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = line_buffer.find('\n') {
                let line = line_buffer[..newline].trim().to_string();
                line_buffer = line_buffer[newline + 1..].to_string();

                if let Some(name) = line.strip_prefix("event:") {
                    event_name = name.trim().to_string();
                    continue;
                }
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                if event_name != "put" && event_name != "patch" {
                    continue;
                }
                match self.snapshot_from_event(user_key, data.trim()).await {
                    Some(entries) => {
                        if tx.send(entries).await.is_err() {
                            return;
                        }
                    }
                    None => continue,
                }
            }
        }
    }

    /// Turn one feed event into a full snapshot. A root `put` carries the
    /// whole document; any narrower change triggers a fresh read so the
    /// feed only ever delivers complete collections.
    async fn snapshot_from_event(&self, user_key: &str, data: &str) -> Option<Vec<Entry>> {
        let event: FeedEvent = match serde_json::from_str(data) {
            Ok(e) => e,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring unparseable feed event");
                return None;
            }
        };

        if event.path == "/" {
            if event.data.is_null() {
                return Some(Vec::new());
            }
            match serde_json::from_value::<UserDocument>(event.data) {
                Ok(doc) => return Some(doc.entries),
                Err(err) => {
                    tracing::debug!(error = %err, "root feed event was not a document");
                }
            }
        }

        match self.read(user_key).await {
            Ok(doc) => Some(doc.map(|d| d.entries).unwrap_or_default()),
            Err(err) => {
                tracing::warn!(user = %user_key, error = %err, "re-read after feed event failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header;
    use axum::response::Response;
    use axum::routing::{get, put};
    use axum::{Json, Router};
    use keepsake_core::entry::{EntryDraft, Mood};
    use keepsake_core::journal::Journal;
    use std::sync::{Arc, Mutex};

    fn sample_document() -> UserDocument {
        let mut journal = Journal::new();
        journal
            .create(EntryDraft::text("remote entry").with_mood(Mood::Excited), None)
            .unwrap();
        UserDocument {
            entries: journal.entries().to_vec(),
            last_updated: "2025-03-01T09:00:00Z".to_string(),
            display_name: Some("Alice".to_string()),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn wire_format_matches_the_original_documents() {
        let doc = sample_document();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("lastUpdated").is_some());
        assert!(json.get("displayName").is_some());

        let legacy = serde_json::json!({
            "entries": [],
            "lastUpdated": "2024-12-31T23:59:59Z"
        });
        let parsed: UserDocument = serde_json::from_value(legacy).unwrap();
        assert!(parsed.entries.is_empty());
        assert!(parsed.display_name.is_none());
    }

    #[tokio::test]
    async fn absent_document_reads_as_none_not_an_error() {
        let router = Router::new().route(
            "/users/:rest",
            get(|| async { Json(serde_json::Value::Null) }),
        );
        let base = serve(router).await;

        let store = RemoteStore::new(base, "token");
        assert_eq!(store.read("new-user").await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_returns_the_stored_document() {
        let doc = sample_document();
        let payload = serde_json::to_value(&doc).unwrap();
        let router = Router::new().route(
            "/users/:rest",
            get(move || {
                let payload = payload.clone();
                async move { Json(payload) }
            }),
        );
        let base = serve(router).await;

        let store = RemoteStore::new(base, "token");
        assert_eq!(store.read("alice").await.unwrap(), Some(doc));
    }

    #[tokio::test]
    async fn permission_errors_are_tagged_distinctly() {
        let router = Router::new().route(
            "/users/:rest",
            get(|| async { (axum::http::StatusCode::FORBIDDEN, "denied") }),
        );
        let base = serve(router).await;

        let store = RemoteStore::new(base, "bad-token");
        match store.read("alice").await {
            Err(StoreError::PermissionDenied(_)) => {}
            other => panic!("expected PermissionDenied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_remote_is_a_transport_error() {
        let store = RemoteStore::new("http://127.0.0.1:1", "token");
        match store.read("alice").await {
            Err(StoreError::Transport(_)) => {}
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn write_replaces_the_whole_document() {
        let received: Arc<Mutex<Option<serde_json::Value>>> = Arc::new(Mutex::new(None));
        let sink = received.clone();
        let router = Router::new().route(
            "/users/:rest",
            put(move |Json(body): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = Some(body);
                    Json(serde_json::Value::Null)
                }
            }),
        );
        let base = serve(router).await;

        let store = RemoteStore::new(base, "token");
        let doc = sample_document();
        store.write("alice", &doc).await.unwrap();

        let body = received.lock().unwrap().clone().unwrap();
        assert_eq!(body.get("lastUpdated").unwrap(), "2025-03-01T09:00:00Z");
        assert_eq!(body.get("entries").unwrap().as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn username_index_round_trips() {
        let stored: Arc<Mutex<Option<serde_json::Value>>> = Arc::new(Mutex::new(None));
        let write_sink = stored.clone();
        let read_source = stored.clone();
        let router = Router::new().route(
            "/usernames/:name",
            put(move |Json(body): Json<serde_json::Value>| {
                let sink = write_sink.clone();
                async move {
                    *sink.lock().unwrap() = Some(body);
                    Json(serde_json::Value::Null)
                }
            })
            .get(move || {
                let source = read_source.clone();
                async move {
                    Json(source.lock().unwrap().clone().unwrap_or(serde_json::Value::Null))
                }
            }),
        );
        let base = serve(router).await;

        let store = RemoteStore::new(base, "token");
        assert_eq!(store.lookup_username("Alice").await.unwrap(), None);

        let record = UsernameRecord {
            email: "alice@example.com".to_string(),
            uid: "uid-1".to_string(),
            username: "Alice".to_string(),
        };
        store.register_username("Alice", &record).await.unwrap();
        assert_eq!(store.lookup_username("ALICE").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn subscription_delivers_initial_state_then_root_puts() {
        let doc = sample_document();
        let initial = serde_json::to_value(&doc).unwrap();
        let mut updated = doc.clone();
        updated.entries.clear();
        let event_body = format!(
            "event: put\ndata: {}\n\n",
            serde_json::json!({"path": "/", "data": serde_json::to_value(&updated).unwrap()})
        );

        let router = Router::new().route(
            "/users/:rest",
            get(move |headers: axum::http::HeaderMap| {
                let initial = initial.clone();
                let event_body = event_body.clone();
                async move {
                    let wants_stream = headers
                        .get(header::ACCEPT)
                        .map(|v| v.to_str().unwrap_or_default().contains("event-stream"))
                        .unwrap_or(false);
                    if wants_stream {
                        Response::builder()
                            .header(header::CONTENT_TYPE, "text/event-stream")
                            .body(Body::from(event_body))
                            .unwrap()
                    } else {
                        Response::builder()
                            .header(header::CONTENT_TYPE, "application/json")
                            .body(Body::from(initial.to_string()))
                            .unwrap()
                    }
                }
            }),
        );
        let base = serve(router).await;

        let store = RemoteStore::new(base, "token");
        let mut sub = store.subscribe("alice");

        let first = sub.next_snapshot().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].content, "remote entry");

        let second = sub.next_snapshot().await.unwrap();
        assert!(second.is_empty());

        sub.cancel();
        sub.cancel();
    }
}
