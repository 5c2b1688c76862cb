//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `loader`: CSV ingestion and cleaning of the source dataset
//! - `models`: linfa-backed candidate classifiers
//! - `fs`: filesystem artifact store with a checksum manifest
//! - `sqlite`: SQLite experiment tracker

pub mod fs;
pub mod loader;
pub mod models;
pub mod sqlite;

pub use fs::{ArtifactError, FsArtifactStore};
pub use loader::{load_and_clean, load_and_clean_from_reader, with_header, DataError};
pub use sqlite::{SqliteTracker, TrackerError};
