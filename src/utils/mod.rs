//! Utility functions and helpers.
//!
//! - [`fields`]: quoting of table fields
//! - [`hash`]: streaming XXH3-128 content hashing
//! - [`paths`]: absolute/relative path resolution and [`paths::RelDir`]
//! - [`time`]: modification-time formatting

/// Field quoting for the table's line format
pub mod fields;
/// Content hashing
pub mod hash;
/// Path manipulation and resolution utilities
pub mod paths;
/// Timestamp formatting
pub mod time;
