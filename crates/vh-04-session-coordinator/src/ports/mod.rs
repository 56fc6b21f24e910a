//! Ports for the Session Coordinator

pub mod inbound;
pub mod outbound;

pub use inbound::SessionApi;
pub use outbound::{CommandRouter, SnapshotStore};
