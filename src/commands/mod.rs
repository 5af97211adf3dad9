//! The two operations of the binary.
//!
//! A manifest is either absent (uninitialized) or present with a header that
//! matches the invocation. [`update`] creates or refreshes it; [`check`]
//! compares the tree against it and never writes. Both return plain result
//! structs and leave printing to the caller.

/// Compare the tree against the manifest.
pub mod check;
/// Create or refresh the manifest.
pub mod update;
