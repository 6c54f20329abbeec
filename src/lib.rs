//! Drifter
//!
//! Append-only schema evolution tracking for tabular data sources. Register
//! a source's current columns and drifter reports what changed since the
//! last observation (added, removed, and type-changed columns) while
//! persisting a timestamped version history per source.
//!
//! ## Features
//!
//! - **Recursive type model**: primitive, temporal, and nested
//!   (sequence/struct) column types with nullability
//! - **Structural diffing**: nested type changes surface on the owning column
//! - **Append-only history**: one JSON artifact per source, newest last
//! - **Checksum validation**: SHA256 checksums guard recorded versions
//! - **Corruption recovery**: an unreadable history loads as empty rather
//!   than silently misreporting the baseline
//!
//! ## Example
//!
//! ```no_run
//! use drifter::{Field, SchemaRegistry};
//!
//! # fn main() -> drifter::Result<()> {
//! let registry = SchemaRegistry::open(".drifter");
//! let changes = registry.register("users", || {
//!     Ok(vec![
//!         ("id".to_owned(), Field::Integer { bits: 64, signed: true, nullable: true }),
//!         ("name".to_owned(), Field::String { nullable: true }),
//!     ])
//! })?;
//! if changes.has_changes() {
//!     println!("schema drift: {:?}", changes);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! adapter (per DataFrame library)
//!   └─> Field / Schema          column type model
//!         └─> diff              added / removed / changed
//!               └─> HistoryStore + StorageBackend
//!                     └─> <root>/<source_id>.json
//! ```

pub mod checksum;
pub mod config;
pub mod diff;
pub mod error;
pub mod field;
pub mod registry;
pub mod schema;
pub mod store;

pub use checksum::Checksum;
pub use config::DrifterConfig;
pub use diff::{diff, FieldChange, SchemaChange};
pub use error::{DriftError, Result};
pub use field::Field;
pub use registry::SchemaRegistry;
pub use schema::{History, Schema, SchemaVersion, SCHEMA_FORMAT_VERSION};
pub use store::{FileBackend, HistoryStore, MemoryBackend, StorageBackend};
