//! # Desktop Bridge Implementations
//!
//! Preference sources for desktop hosts (macOS, Windows, Linux) and tests.
//!
//! ## Overview
//!
//! - [`InMemoryPreferences`] keeps values in a `watch` channel only. It is the
//!   default preference source injected by `core-runtime` under the
//!   `desktop-shims` feature.
//! - [`SqlitePreferenceStore`] persists values in a SQLite key/value table and
//!   publishes every successful write.
//!
//! ## Feature Flags
//!
//! - `sqlite`: Enable the SQLite-backed store (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::SqlitePreferenceStore;
//! use bridge_traits::PreferenceSource;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SqlitePreferenceStore::open("prefs.db".into()).await.unwrap();
//!     store.set_tunneling(true).await.unwrap();
//!     assert!(store.current().tunneling);
//! }
//! ```

mod memory;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::InMemoryPreferences;

#[cfg(feature = "sqlite")]
pub use sqlite::SqlitePreferenceStore;
