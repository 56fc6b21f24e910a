//! # Vault Heist Test Suite
//!
//! Cross-crate tests that need more than one subsystem at a time.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── scenarios.rs   # Acceptance scenarios through the SessionManager
//!     ├── properties.rs  # Property tests over engines and session rules
//!     └── flows.rs       # Runtime adapters wired end to end
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p vh-tests
//!
//! # By category
//! cargo test -p vh-tests integration::scenarios::
//! cargo test -p vh-tests integration::properties::
//! ```

#![allow(dead_code)]

pub mod integration;
