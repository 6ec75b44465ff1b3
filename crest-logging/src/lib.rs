//! Logging setup for crest
//!
//! All output goes to stderr so stdout stays reserved for records. The level
//! comes from an explicit override, then `RUST_LOG`, then configuration.

pub mod init;

pub use init::{build_filter, init_logging_from_config};
