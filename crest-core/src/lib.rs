//! Request/response processing engine for crest
//!
//! The engine binds record fields into a request template, assembles the
//! request (headers, authentication, TLS/HTTPS policy), hands it to a
//! [`crest_http::Transport`] and flattens whatever comes back into rows.
//!
//! [`Engine::run`] drives it in one of two modes:
//! - **generating**: one request from the template as written,
//! - **streaming**: one request per upstream record, with an optional delay
//!   between records.
//!
//! Output is delivered group by group (one group per input record) to a
//! [`RecordSink`], strictly in input order.

pub mod builder;
pub mod controller;
pub mod credentials;
pub mod emitter;
pub mod error;
pub mod parser;
pub mod record;
pub mod substitution;
pub mod template;

// Re-export main types
pub use builder::RequestBuilder;
pub use controller::{Engine, ExecutionMode, ModeKind, OutputGroup, RecordSink, RunSummary};
pub use credentials::{
    CredentialProvider, EnvSessionCredential, NoSessionCredential, StaticSessionCredential,
};
pub use error::{EngineError, EngineResult};
pub use parser::{parse, ParseOptions, ParsedRow, ResponseFormat};
pub use record::{InputRecord, OutputRecord};
pub use substitution::{substitute, substitute_headers, unresolved_tokens};
pub use template::RequestTemplate;
