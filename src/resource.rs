//! Structural safety limits for the class hierarchy.
//!
//! The original sources have no notion of sandboxed resource accounting;
//! the only limits a conforming implementation needs are the ones C3
//! linearization itself relies on to guarantee termination on pathological
//! (but not officially cyclic) hierarchies.

/// Maximum length of any single linearization considered as a merge input.
/// Exceeding this during linearization is reported as
/// [`crate::LinearizationError::InheritanceTooDeep`].
pub const MAX_INHERITANCE_DEPTH: usize = 256;

/// Maximum length of the computed linearization itself. Exceeding this is
/// reported as [`crate::LinearizationError::MroTooLong`].
pub const MAX_MRO_LENGTH: usize = 512;
