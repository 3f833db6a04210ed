//! # Biotica IO
//!
//! The persistence surface of the kernel: the versioned save container,
//! typed load failures, slot storage, and the read-only species ancestry
//! projection. The kernel itself never touches the filesystem; everything
//! that does lives here.

/// Typed load/save errors with CLI exit-code mapping
pub mod error;
/// Species ancestry graph + DOT export
pub mod lineage;
/// The gzipped, schema-versioned save container
pub mod save;
/// Save-slot layout on the local filesystem
pub mod slots;

pub use error::{LoadError, Result};
pub use save::{SaveRecord, MIN_SCHEMA_VERSION, SCHEMA_VERSION};
pub use slots::{SaveStore, DEFAULT_SLOT};
