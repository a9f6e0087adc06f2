//! Submission checks.
//!
//! Each check module exposes a `check` function that returns findings and
//! leaves reporting to the caller.

pub mod media;
pub mod records;
