//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the playback core:
//! - Logging and tracing setup with host sink forwarding
//! - Capability configuration
//! - Lifecycle event bus
//!
//! ## Overview
//!
//! Nothing in here knows about players. `core-playback` builds on these
//! pieces: it logs through `tracing`, takes its bridges from a
//! [`CoreConfig`](config::CoreConfig) and optionally publishes
//! [`CoreEvent`](events::CoreEvent)s.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
