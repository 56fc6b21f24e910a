//! Ports for the Reward Adjudicator

pub mod inbound;
pub mod outbound;

pub use inbound::RewardApi;
pub use outbound::LedgerSettlement;
