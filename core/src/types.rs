//! Shared primitive types used across the desk.

/// The source-provided customer identifier (e.g. `"C1010"`).
pub type CustomerId = String;

/// Position of a row in the ingested source array.
pub type RowIndex = usize;

/// Name of the operator performing an admin action.
pub type Actor = String;
