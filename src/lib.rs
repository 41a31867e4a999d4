//! Workspace facade crate.
//!
//! Re-exports the playback core together with its runtime and bridge crates
//! so a host application can depend on `iptv-workspace` alone. The
//! `desktop-shims` feature (default) adds the desktop preference adapters;
//! `sqlite` adds the persistent preference store.

pub use bridge_traits;
pub use core_playback;
pub use core_runtime;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;

pub use core_playback::{PlayerConfig, PlayerManager};
