//! Workspace umbrella crate.
//!
//! Re-exports the Scout client core so host applications can depend on
//! `scout-workspace` and pick a bridge set with one feature flag:
//!
//! - `desktop-shims` (default): reqwest, OS keyring, system browser
//! - `headless`: no bundled bridges; inject them through `ScoutConfig::builder`

#[cfg(any(feature = "desktop-shims", feature = "headless"))]
pub use core_service::*;
