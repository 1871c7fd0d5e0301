//! Recap prompt assembly.
//!
//! The upstream request shape follows the text-generation service's
//! messages API: model id, max token count, message list. The relay
//! forwards it opaquely; nothing here is persisted with the entries.

use crate::entry::Entry;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Most-recent historical entries included for personalization, by content
/// only.
const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

/// Opaque body POSTed to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecapRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<PromptMessage>,
}

/// Assemble the structured prompt for one day's recap.
///
/// Returns `None` when the day has no entries: there is nothing to recap
/// and no request should be made.
pub fn build_recap_request(
    model: &str,
    max_tokens: u32,
    date: &str,
    entries: &[Entry],
) -> Option<RecapRequest> {
    let day_entries: Vec<&Entry> = entries.iter().filter(|e| e.date == date).collect();
    if day_entries.is_empty() {
        return None;
    }

    let entry_details = day_entries
        .iter()
        .map(|e| {
            let mut detail = format!("Entry at {}:\nMood: {}\nText: {}\n", e.time, e.mood.as_str(), e.content);
            if e.photo.is_some() {
                detail.push_str("[Photo attached]\n");
            }
            if e.audio.is_some() {
                detail.push_str("[Voice note attached]\n");
            }
            detail
        })
        .collect::<Vec<_>>()
        .join("\n---\n");

    let recent_history = entries
        .iter()
        .filter(|e| e.date != date)
        .take(HISTORY_LIMIT)
        .map(|e| e.content.as_str())
        .collect::<Vec<_>>()
        .join(" | ");

    let content = format!(
        "You are a warm, perceptive journaling companion. Using the entries \
         below, write a narrative recap of this person's day.\n\n\
         Today's Date: {date}\n\n\
         TODAY'S ENTRIES:\n{entry_details}\n\n\
         RECENT HISTORY (for context):\n{recent_history}\n\n\
         Cover, in order: a summary of the day (emotions, activities, people, \
         places); any insights or lessons that emerged; recurring themes \
         compared to the recent history; gentle wellness suggestions grounded \
         in their mood; and three to five specific, actionable ideas for the \
         days ahead. Keep the tone encouraging and specific to what they \
         actually wrote."
    );

    Some(RecapRequest {
        model: model.to_string(),
        max_tokens,
        messages: vec![PromptMessage {
            role: "user".to_string(),
            content,
        }],
    })
}
