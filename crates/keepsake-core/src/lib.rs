//! Core journaling types and logic for keepsake.
//!
//! This crate owns everything that is independent of where entries are
//! persisted:
//!
//! - **Entry model**: the atomic journaled record (text, mood, optional
//!   photo and voice note) bound to a calendar day.
//! - **Journal**: the in-memory collection for the active session and its
//!   mutation rules, including the advisory three-entries-per-day check.
//! - **Session**: the identity contract consumed from the external
//!   authentication collaborator, plus readable auth failure messages.
//! - **Recap**: prompt assembly, the relay client, and the deterministic
//!   local fallback used when generation is unavailable.
//!
//! Persistence lives in `keepsake-sync`; this crate never touches disk or
//! network except through the recap relay client.

pub mod entry;
pub mod journal;
pub mod recap;
pub mod session;

pub use entry::{Entry, EntryDraft, Mood};
pub use journal::{Journal, ValidationError, DAY_CAPACITY};
pub use recap::{RecapOutcome, RecapState};
pub use session::{SessionHandle, UserSession};
