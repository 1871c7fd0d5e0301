//! AI-generated day recaps.
//!
//! The recap is a non-critical feature layered over the journal: a failure
//! here must never block or corrupt the journaling workflow. The client
//! talks to the same-origin relay (see `keepsake-api`), which attaches the
//! generation credential server-side. When generation is unavailable, a
//! deterministic summary is synthesized locally from the raw entries and
//! explicitly labeled as such.

pub mod client;
pub mod prompt;

pub use client::{RecapClient, RecapError};
pub use prompt::{build_recap_request, RecapRequest};

use crate::entry::Entry;

/// Lifecycle of one recap request, as tracked by the presentation layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RecapState {
    #[default]
    Idle,
    Requesting,
    Succeeded(String),
    Failed(String),
}

impl RecapState {
    pub fn is_requesting(&self) -> bool {
        matches!(self, RecapState::Requesting)
    }
}

/// Result of a recap attempt.
///
/// The fallback is a distinct variant, never presented as AI output: the
/// caller can (and should) label it as locally generated.
#[derive(Debug, Clone, PartialEq)]
pub enum RecapOutcome {
    Generated(String),
    Fallback { text: String, reason: String },
}

impl RecapOutcome {
    pub fn text(&self) -> &str {
        match self {
            RecapOutcome::Generated(text) => text,
            RecapOutcome::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RecapOutcome::Fallback { .. })
    }
}

const EXCERPT_LEN: usize = 150;

/// Synthesize a summary from the raw entries, with no network involved.
///
/// Deterministic for a given entry list: the day's count, each entry's mood
/// and a bounded excerpt of its text.
pub fn fallback_recap(date: &str, day_entries: &[&Entry]) -> String {
    let noun = if day_entries.len() == 1 {
        "moment"
    } else {
        "moments"
    };
    let mut text = format!(
        "You recorded {} {} on {}.\n",
        day_entries.len(),
        noun,
        date
    );

    for (i, entry) in day_entries.iter().enumerate() {
        let excerpt: String = entry.content.chars().take(EXCERPT_LEN).collect();
        let ellipsis = if entry.content.chars().count() > EXCERPT_LEN {
            "..."
        } else {
            ""
        };
        text.push_str(&format!(
            "\n{}. ({}) {}{}",
            i + 1,
            entry.mood.as_str(),
            excerpt,
            ellipsis
        ));
    }

    text.push_str("\n\nTake a moment to reflect on what these entries tell you about your day.");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryDraft, Mood};
    use crate::journal::Journal;

    #[test]
    fn fallback_names_count_and_moods() {
        let mut journal = Journal::new();
        journal
            .create(
                EntryDraft::text("coffee on the porch").with_mood(Mood::Peaceful),
                Some("3/1/2025"),
            )
            .unwrap();
        journal
            .create(
                EntryDraft::text("finished the draft").with_mood(Mood::Proud),
                Some("3/1/2025"),
            )
            .unwrap();

        let day = journal.entries_for_day("3/1/2025");
        let text = fallback_recap("3/1/2025", &day);

        assert!(text.contains("2 moments"));
        assert!(text.contains("(peaceful)"));
        assert!(text.contains("(proud)"));
        assert!(text.contains("coffee on the porch"));
    }

    #[test]
    fn fallback_truncates_long_content() {
        let mut journal = Journal::new();
        let long = "x".repeat(400);
        journal
            .create(EntryDraft::text(long), Some("3/1/2025"))
            .unwrap();

        let day = journal.entries_for_day("3/1/2025");
        let text = fallback_recap("3/1/2025", &day);
        assert!(text.contains(&format!("{}...", "x".repeat(150))));
        assert!(!text.contains(&"x".repeat(151)));
    }

    #[test]
    fn outcome_exposes_text_and_fallback_flag() {
        let generated = RecapOutcome::Generated("a lovely day".to_string());
        assert!(!generated.is_fallback());
        assert_eq!(generated.text(), "a lovely day");

        let fallback = RecapOutcome::Fallback {
            text: "local".to_string(),
            reason: "relay returned 500".to_string(),
        };
        assert!(fallback.is_fallback());
    }
}
