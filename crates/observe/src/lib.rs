//! Initialization logic for logging that is shared between the binaries.

pub mod tracing;
