//! # Core Runtime Module
//!
//! Foundational infrastructure shared by the Scout client crates:
//! - Configuration management ([`config::ScoutConfig`])
//! - Logging and tracing infrastructure
//! - Event bus system
//!
//! Every other core crate depends on this one for its configuration, its
//! logging conventions and the events it broadcasts.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{ConfigInfo, Environment, ScoutConfig, ScoutConfigBuilder};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream};
