//! Durable key-value storage and per-dataset display preferences.
//!
//! This crate provides:
//! - `kv`: the [`KeyValueStore`] trait with in-memory and SQLite backends
//! - `preferences`: [`PreferenceStore`], per-dataset colormap and value range
//!
//! # Usage
//!
//! ```rust
//! use bwr_prefs::{DatasetPreference, PreferenceStore, SqliteStore};
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! let prefs = PreferenceStore::new(store);
//!
//! assert_eq!(prefs.get("displacement").unwrap(), None);
//! prefs
//!     .set("displacement", &DatasetPreference::new("rdbu_r", -0.1, 0.1))
//!     .unwrap();
//! assert_eq!(prefs.get("displacement").unwrap().unwrap().vmax, 0.1);
//! ```

pub mod kv;
pub mod preferences;
pub mod schema;

pub use kv::{KeyValueStore, MemoryStore, SqliteStore};
pub use preferences::{DatasetPreference, PreferenceStore};
