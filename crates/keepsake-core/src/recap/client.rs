//! Client for the recap relay endpoint.
//!
//! Talks to the same-origin relay (`POST /api/generate-recap`); the
//! generation credential never reaches this side. Any failure degrades to
//! the locally synthesized fallback, labeled as such.

use super::prompt::{build_recap_request, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use super::{fallback_recap, RecapOutcome};
use crate::entry::Entry;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum RecapError {
    #[error("recap request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("recap relay returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("recap response had no text content")]
    EmptyResponse,
}

/// Upstream response shape: `{"content": [{"text": ...}]}`.
#[derive(Debug, Deserialize)]
struct RecapResponse {
    #[serde(default)]
    content: Vec<ContentPiece>,
}

#[derive(Debug, Deserialize)]
struct ContentPiece {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone)]
pub struct RecapClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl RecapClient {
    /// `endpoint` is the full relay URL, e.g.
    /// `http://127.0.0.1:8710/api/generate-recap`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Generate a recap for one day.
    ///
    /// Returns `None` when the day has no entries. Never returns an error:
    /// on any failure the deterministic local fallback is substituted and
    /// tagged with the reason.
    pub async fn generate_day_recap(
        &self,
        date: &str,
        entries: &[Entry],
    ) -> Option<RecapOutcome> {
        let request = build_recap_request(&self.model, self.max_tokens, date, entries)?;

        match self.request_recap(&request).await {
            Ok(text) => Some(RecapOutcome::Generated(text)),
            Err(err) => {
                tracing::warn!(%date, error = %err, "recap generation failed, using local fallback");
                let day_entries: Vec<&Entry> =
                    entries.iter().filter(|e| e.date == date).collect();
                Some(RecapOutcome::Fallback {
                    text: fallback_recap(date, &day_entries),
                    reason: err.to_string(),
                })
            }
        }
    }

    async fn request_recap(
        &self,
        request: &super::prompt::RecapRequest,
    ) -> Result<String, RecapError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RecapError::Status { status, body });
        }

        let parsed: RecapResponse = response.json().await?;
        let text = parsed
            .content
            .iter()
            .map(|piece| piece.text.as_str())
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(RecapError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryDraft, Mood};
    use crate::journal::Journal;
    use axum::{routing::post, Json, Router};

    fn day_journal() -> Journal {
        let mut journal = Journal::new();
        journal
            .create(
                EntryDraft::text("morning swim").with_mood(Mood::Happy),
                Some("3/1/2025"),
            )
            .unwrap();
        journal
            .create(
                EntryDraft::text("long phone call").with_mood(Mood::Loved),
                Some("3/1/2025"),
            )
            .unwrap();
        journal
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api/generate-recap")
    }

    #[tokio::test]
    async fn successful_relay_response_is_generated_text() {
        let router = Router::new().route(
            "/api/generate-recap",
            post(|| async {
                Json(serde_json::json!({
                    "content": [{"type": "text", "text": "What a joyful day."}]
                }))
            }),
        );
        let endpoint = serve(router).await;

        let journal = day_journal();
        let outcome = RecapClient::new(endpoint)
            .generate_day_recap("3/1/2025", journal.entries())
            .await
            .unwrap();

        assert_eq!(outcome, RecapOutcome::Generated("What a joyful day.".to_string()));
    }

    #[tokio::test]
    async fn relay_error_degrades_to_labeled_fallback() {
        let router = Router::new().route(
            "/api/generate-recap",
            post(|| async {
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": "API key not configured on server"})),
                )
            }),
        );
        let endpoint = serve(router).await;

        let journal = day_journal();
        let outcome = RecapClient::new(endpoint)
            .generate_day_recap("3/1/2025", journal.entries())
            .await
            .unwrap();

        assert!(outcome.is_fallback());
        // The fallback still tells the user what the day held.
        assert!(outcome.text().contains("2 moments"));
        assert!(outcome.text().contains("(happy)"));
        assert!(outcome.text().contains("(loved)"));
    }

    #[tokio::test]
    async fn unreachable_relay_degrades_to_fallback() {
        // Nothing listens on this port.
        let journal = day_journal();
        let outcome = RecapClient::new("http://127.0.0.1:1/api/generate-recap")
            .generate_day_recap("3/1/2025", journal.entries())
            .await
            .unwrap();
        assert!(outcome.is_fallback());
    }

    #[tokio::test]
    async fn empty_day_produces_no_recap() {
        let journal = day_journal();
        let outcome = RecapClient::new("http://127.0.0.1:1/api/generate-recap")
            .generate_day_recap("9/9/2099", journal.entries())
            .await;
        assert!(outcome.is_none());
    }
}
