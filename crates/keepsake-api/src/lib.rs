//! HTTP relay for keepsake's recap generation.
//!
//! The browser-side client never sees the text-generation credential: it
//! POSTs an opaque request body to this same-origin relay, which attaches
//! the secret server-side, forwards the body unchanged, and mirrors the
//! upstream status and body back — error payloads included, for
//! diagnostics. Without a credential in its environment the relay fails
//! closed.

pub mod relay;

pub use relay::{serve, RelayConfig, RelayState};
