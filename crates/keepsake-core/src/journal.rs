//! The in-memory entry collection and its mutation rules.
//!
//! A [`Journal`] is owned exclusively by the active session. Mutations are
//! synchronous; persistence happens elsewhere, against full snapshots of
//! this collection. Realtime snapshots from another device flow through
//! [`Journal::replace_all`], the same entry point as a normal load, so
//! presentation and persistence never observe divergent intermediate state.

use crate::entry::{clock_time, date_key, parse_date_key, today_key, Entry, EntryDraft};
use chrono::{Datelike, Duration, Local, NaiveDate};
use thiserror::Error;

/// Soft per-day entry cap. Enforced by the caller at the UI trigger, never
/// by the journal or the storage layer.
pub const DAY_CAPACITY: usize = 3;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// The only hard validation rule: a draft must carry text, a photo, or
    /// a voice note.
    #[error("an entry needs some text, a photo, or a voice note")]
    EmptyDraft,
}

/// Per-day summary feeding the week strip presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct DayJar {
    pub label: &'static str,
    pub date: String,
    pub count: usize,
    pub is_today: bool,
}

/// One calendar cell in the month grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthCell {
    pub date: String,
    pub day: u32,
    pub count: usize,
    pub in_month: bool,
}

const DAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// The active session's entry collection.
#[derive(Debug, Default, Clone)]
pub struct Journal {
    entries: Vec<Entry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, most recent first.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the whole collection. Both initial loads and realtime
    /// snapshots from another device go through here.
    pub fn replace_all(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
    }

    /// Create a new entry from a draft.
    ///
    /// `target_date` is the back-fill case: the entry is filed under that
    /// day instead of today. `id`, `timestamp` and `time` are assigned at
    /// the creation instant regardless. The new entry is prepended:
    /// most-recent-first is the presentational convention.
    pub fn create(
        &mut self,
        draft: EntryDraft,
        target_date: Option<&str>,
    ) -> Result<&Entry, ValidationError> {
        if draft.is_empty() {
            return Err(ValidationError::EmptyDraft);
        }

        let now = Local::now();
        let (date, timestamp) = match target_date {
            Some(key) => {
                let instant = parse_date_key(key)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .and_then(|dt| dt.and_local_timezone(Local).single())
                    .unwrap_or(now);
                (key.to_string(), instant.to_rfc3339())
            }
            None => (today_key(), now.to_rfc3339()),
        };

        let entry = Entry {
            id: self.next_id(),
            content: draft.content,
            mood: draft.mood,
            photo: draft.photo,
            audio: draft.audio,
            date,
            time: clock_time(now),
            timestamp,
        };
        self.entries.insert(0, entry);
        Ok(&self.entries[0])
    }

    /// Replace the mutable fields of the matching entry in place. `id`,
    /// `date` and `timestamp` are never touched. Returns false when no
    /// entry matches.
    pub fn update(&mut self, id: u64, draft: EntryDraft) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.content = draft.content;
                entry.mood = draft.mood;
                entry.photo = draft.photo;
                entry.audio = draft.audio;
                true
            }
            None => false,
        }
    }

    /// Remove the matching entry. A no-op on an unknown id, never an error.
    pub fn delete(&mut self, id: u64) {
        self.entries.retain(|e| e.id != id);
    }

    pub fn entries_for_day(&self, date: &str) -> Vec<&Entry> {
        self.entries.iter().filter(|e| e.date == date).collect()
    }

    /// Entries belonging to the seven days starting at `week_start`.
    pub fn entries_for_week(&self, week_start: NaiveDate) -> Vec<&Entry> {
        let keys: Vec<String> = (0..7)
            .map(|i| date_key(week_start + Duration::days(i)))
            .collect();
        self.entries
            .iter()
            .filter(|e| keys.iter().any(|k| *k == e.date))
            .collect()
    }

    pub fn entries_for_month(&self, month: u32, year: i32) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| {
                parse_date_key(&e.date)
                    .map(|d| d.month() == month && d.year() == year)
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn day_count(&self, date: &str) -> usize {
        self.entries.iter().filter(|e| e.date == date).count()
    }

    /// Advisory capacity check consulted by the caller to decide whether a
    /// jar click opens the add form or the day detail view. The journal
    /// itself never refuses a write on this count.
    pub fn day_is_full(&self, date: &str) -> bool {
        self.day_count(date) >= DAY_CAPACITY
    }

    /// Week strip for the week containing `today`, Sunday first.
    pub fn week_jars(&self, today: NaiveDate) -> Vec<DayJar> {
        let sunday = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
        (0..7)
            .map(|i| {
                let day = sunday + Duration::days(i);
                let date = date_key(day);
                DayJar {
                    label: DAY_LABELS[i as usize],
                    count: self.day_count(&date),
                    is_today: day == today,
                    date,
                }
            })
            .collect()
    }

    /// Month grid as full Sunday-to-Saturday weeks, including the leading
    /// and trailing days that belong to adjacent months.
    pub fn month_weeks(&self, month: u32, year: i32) -> Vec<Vec<MonthCell>> {
        let first = match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(d) => d,
            None => return Vec::new(),
        };
        let last = (1..=31)
            .rev()
            .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
            .unwrap_or(first);

        let mut cursor = first - Duration::days(first.weekday().num_days_from_sunday() as i64);
        let mut weeks = Vec::new();
        while cursor <= last {
            let week: Vec<MonthCell> = (0..7)
                .map(|i| {
                    let day = cursor + Duration::days(i);
                    let date = date_key(day);
                    MonthCell {
                        day: day.day(),
                        count: self.day_count(&date),
                        in_month: day.month() == month,
                        date,
                    }
                })
                .collect();
            weeks.push(week);
            cursor += Duration::days(7);
        }
        weeks
    }

    /// Creation-time-derived id, bumped past the current maximum so two
    /// entries created within the same millisecond stay distinct.
    fn next_id(&self) -> u64 {
        let now = Local::now().timestamp_millis() as u64;
        match self.entries.iter().map(|e| e.id).max() {
            Some(max) if now <= max => max + 1,
            _ => now,
        }
    }
}
