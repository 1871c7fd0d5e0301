pub use keepsake_config::config;
pub use keepsake_core::{entry, journal, recap, session};
pub use keepsake_sync::{coordinator, error, local, remote, store, subscription};

pub use keepsake_api::relay;
