//! The entry data model.
//!
//! An [`Entry`] is one journaled moment bound to a calendar day. The day key
//! (`date`) is fixed at creation and is not necessarily the creation day: a
//! user may back-fill a past day. `timestamp` is the authoritative ordering
//! key; `time` is display-only.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Mood tag attached to an entry.
///
/// A small well-known set plus a free-form escape hatch. Stored as a plain
/// string; the storage layer never validates against a closed set, so
/// documents written by older clients always decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mood {
    Grateful,
    Happy,
    Peaceful,
    Excited,
    Loved,
    Proud,
    Custom(String),
}

impl Mood {
    pub fn as_str(&self) -> &str {
        match self {
            Mood::Grateful => "grateful",
            Mood::Happy => "happy",
            Mood::Peaceful => "peaceful",
            Mood::Excited => "excited",
            Mood::Loved => "loved",
            Mood::Proud => "proud",
            Mood::Custom(s) => s,
        }
    }
}

impl From<String> for Mood {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "grateful" => Mood::Grateful,
            "happy" => Mood::Happy,
            "peaceful" => Mood::Peaceful,
            "excited" => Mood::Excited,
            "loved" => Mood::Loved,
            "proud" => Mood::Proud,
            _ => Mood::Custom(s),
        }
    }
}

impl From<Mood> for String {
    fn from(mood: Mood) -> Self {
        mood.as_str().to_string()
    }
}

impl Default for Mood {
    fn default() -> Self {
        Mood::Grateful
    }
}

/// One journaled record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique within a user's collection; creation-time-derived.
    pub id: u64,
    /// Free text; may be empty only when a photo or voice note is present.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub mood: Mood,
    /// Encoded image payload (data URL), size-bounded by the capture step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// Encoded voice-note payload (data URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Calendar-day key the entry belongs to (`M/D/YYYY`).
    pub date: String,
    /// Human-readable creation clock time, display only.
    pub time: String,
    /// ISO-8601 creation instant, the authoritative ordering key.
    pub timestamp: String,
}

/// Mutable fields of an entry, as collected from the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryDraft {
    pub content: String,
    pub mood: Mood,
    pub photo: Option<String>,
    pub audio: Option<String>,
}

impl EntryDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = mood;
        self
    }

    pub fn with_photo(mut self, photo: impl Into<String>) -> Self {
        self.photo = Some(photo.into());
        self
    }

    pub fn with_audio(mut self, audio: impl Into<String>) -> Self {
        self.audio = Some(audio.into());
        self
    }

    /// A draft is empty when it has no text, no photo, and no voice note.
    /// This is the only hard validation rule.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty() && self.photo.is_none() && self.audio.is_none()
    }
}

/// Format a calendar day as the day key used throughout the entry model.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Today's day key in local time.
pub fn today_key() -> String {
    date_key(Local::now().date_naive())
}

/// Parse a day key back into a calendar day.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%m/%d/%Y").ok()
}

/// Display clock time for an instant, e.g. `3:42 PM`.
pub fn clock_time(instant: DateTime<Local>) -> String {
    instant.format("%-I:%M %p").to_string()
}

/// Encode raw media bytes as a data URL for embedding in an entry.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Approximate decoded byte length of a data-URL payload.
///
/// Used for quota estimates without decoding the whole payload.
pub fn decoded_media_len(data_url: &str) -> Option<usize> {
    let b64 = data_url.split(";base64,").nth(1)?;
    let padding = b64.bytes().rev().take_while(|&b| b == b'=').count();
    Some((b64.len() / 4 * 3).saturating_sub(padding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_round_trips_through_string() {
        let json = serde_json::to_string(&Mood::Peaceful).unwrap();
        assert_eq!(json, "\"peaceful\"");
        let back: Mood = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Mood::Peaceful);
    }

    #[test]
    fn unknown_mood_is_preserved_as_custom() {
        let mood: Mood = serde_json::from_str("\"melancholy\"").unwrap();
        assert_eq!(mood, Mood::Custom("melancholy".to_string()));
        assert_eq!(serde_json::to_string(&mood).unwrap(), "\"melancholy\"");
    }

    #[test]
    fn draft_emptiness_follows_the_single_validation_rule() {
        assert!(EntryDraft::default().is_empty());
        assert!(EntryDraft::text("   ").is_empty());
        assert!(!EntryDraft::text("sunset walk").is_empty());
        assert!(!EntryDraft::default().with_photo("data:image/jpeg;base64,aGk=").is_empty());
        assert!(!EntryDraft::default().with_audio("data:audio/webm;base64,aGk=").is_empty());
    }

    #[test]
    fn date_key_has_no_zero_padding() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        assert_eq!(date_key(day), "6/9/2025");
        assert_eq!(parse_date_key("6/9/2025"), Some(day));
    }

    #[test]
    fn entry_without_media_serializes_without_media_keys() {
        let entry = Entry {
            id: 1,
            content: "hi".to_string(),
            mood: Mood::Happy,
            photo: None,
            audio: None,
            date: "6/9/2025".to_string(),
            time: "3:42 PM".to_string(),
            timestamp: "2025-06-09T15:42:00Z".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("photo").is_none());
        assert!(json.get("audio").is_none());
    }

    #[test]
    fn data_url_length_estimate_matches_payload() {
        let url = encode_data_url("image/jpeg", b"hello world");
        assert_eq!(decoded_media_len(&url), Some(11));
        assert!(decoded_media_len("not a data url").is_none());
    }
}
