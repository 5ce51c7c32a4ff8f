//! Shared plumbing for the `meridian-bins` demo binaries.

pub mod common;
