//! Application layer: session tasks and the registry that owns them

mod actor;
mod handle;
mod manager;

pub use handle::SessionHandle;
pub use manager::SessionManager;

use std::time::Instant;

/// Clock for every session decision. Follows tokio's clock so paused test
/// time applies.
pub(crate) fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}
