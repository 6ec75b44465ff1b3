//! HTTP transport for crest
//!
//! The engine only sees the [`Transport`] trait: a request described as plain
//! data goes in, status line and body bytes come out. [`HttpManager`] is the
//! reqwest-backed implementation. Its redirect policy never follows a hop
//! onto plain HTTP towards a non-local host.

pub mod client;
pub mod config;
pub mod errors;
pub mod types;

// Re-export main types for convenience
pub use client::{HttpManager, Transport};
pub use config::HttpConfig;
pub use errors::HttpError;
pub use types::{HttpMethod, HttpMethodError, HttpRequest, HttpResponse};
