//! Shared primitive types used across the pipeline.

/// Key of a client row.
pub type ClientId = u32;

/// Key of a case row.
pub type CaseId = u32;

/// Key of a case note row.
pub type NoteId = u32;

/// The canonical run identifier used by the store.
pub type RunId = String;

/// Canonical textual date format for tables and the store.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
