//! The record loop
//!
//! [`Engine::run`] drives a single invocation. In generating mode the template
//! is sent once as written. In streaming mode every upstream record is
//! substituted into the template, sent, and answered with exactly one
//! [`OutputGroup`] before the next record is pulled. Requests are never
//! overlapped and cancellation is only observed between records, so a group is
//! either delivered whole or not at all.

use crate::builder::RequestBuilder;
use crate::credentials::CredentialProvider;
use crate::emitter::{emit_debug, emit_error, emit_response};
use crate::error::EngineError;
use crate::parser::parse;
use crate::record::{InputRecord, OutputRecord};
use crate::substitution::{substitute, substitute_headers, unresolved_tokens};
use crate::template::RequestTemplate;
use crest_http::Transport;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How the engine obtains its work, chosen once per invocation
pub enum ExecutionMode<S> {
    /// One request from the template, no input records
    Generating,
    /// One request per upstream record
    Streaming(S),
}

impl<S> ExecutionMode<S> {
    pub fn kind(&self) -> ModeKind {
        match self {
            ExecutionMode::Generating => ModeKind::Generating,
            ExecutionMode::Streaming(_) => ModeKind::Streaming,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Generating,
    Streaming,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeKind::Generating => write!(f, "generating"),
            ModeKind::Streaming => write!(f, "streaming"),
        }
    }
}

/// The records produced for one input record (or the single generating run)
#[derive(Debug, Clone, PartialEq)]
pub struct OutputGroup {
    /// Zero-based position of the input record
    pub index: usize,
    pub records: Vec<OutputRecord>,
}

/// Receives output groups in input order
pub trait RecordSink {
    fn accept(&mut self, group: OutputGroup) -> Result<(), EngineError>;
}

impl RecordSink for Vec<OutputGroup> {
    fn accept(&mut self, group: OutputGroup) -> Result<(), EngineError> {
        self.push(group);
        Ok(())
    }
}

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub mode: ModeKind,
    pub records_in: usize,
    pub groups_out: usize,
    /// Output records describing a failure
    pub error_records: usize,
    pub cancelled: bool,
}

impl RunSummary {
    fn new(mode: ModeKind) -> Self {
        Self {
            mode,
            records_in: 0,
            groups_out: 0,
            error_records: 0,
            cancelled: false,
        }
    }
}

struct Processed {
    records: Vec<OutputRecord>,
    failed: bool,
}

impl Processed {
    fn ok(records: Vec<OutputRecord>) -> Self {
        Self {
            records,
            failed: false,
        }
    }

    fn failed(record: OutputRecord) -> Self {
        Self {
            records: vec![record],
            failed: true,
        }
    }
}

/// Request/response engine bound to one template and one transport
pub struct Engine {
    template: RequestTemplate,
    transport: Arc<dyn Transport>,
    builder: RequestBuilder,
}

impl Engine {
    pub fn new(
        template: RequestTemplate,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            template,
            transport,
            builder: RequestBuilder::new(credentials),
        }
    }

    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    /// Run to completion, exhaustion of the input, or cancellation.
    ///
    /// Per-record failures become error records. In generating mode a request
    /// that cannot be built is returned as an error instead.
    pub async fn run<S, K>(
        &self,
        mode: ExecutionMode<S>,
        cancel: &CancellationToken,
        sink: &mut K,
    ) -> Result<RunSummary, EngineError>
    where
        S: Stream<Item = Result<InputRecord, EngineError>> + Unpin,
        K: RecordSink + ?Sized,
    {
        let mut summary = RunSummary::new(mode.kind());
        info!(
            "Starting {} run: {} {}",
            summary.mode, self.template.method, self.template.url
        );

        match mode {
            ExecutionMode::Generating => {
                if cancel.is_cancelled() {
                    summary.cancelled = true;
                } else {
                    let processed = self.process(None).await?;
                    self.deliver(sink, 0, processed, &mut summary)?;
                }
            }
            ExecutionMode::Streaming(mut input) => {
                let mut index = 0;
                loop {
                    if cancel.is_cancelled() {
                        summary.cancelled = true;
                        break;
                    }

                    let next = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            summary.cancelled = true;
                            break;
                        }
                        next = input.next() => next,
                    };
                    let Some(record) = next else {
                        break;
                    };
                    let record = record?;
                    summary.records_in += 1;

                    let processed = match self.process(Some(&record)).await {
                        Ok(processed) => processed,
                        Err(e) => {
                            warn!("Record {} could not be turned into a request: {}", index, e);
                            Processed::failed(emit_error(Some(&record), &e, None))
                        }
                    };
                    self.deliver(sink, index, processed, &mut summary)?;
                    index += 1;

                    if let Some(delay) = self.template.delay {
                        debug!("Waiting {:?} before the next record", delay);
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                summary.cancelled = true;
                                break;
                            }
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
        }

        info!(
            "Finished {} run: {} record(s) in, {} group(s) out, {} error record(s){}",
            summary.mode,
            summary.records_in,
            summary.groups_out,
            summary.error_records,
            if summary.cancelled { ", cancelled" } else { "" }
        );

        Ok(summary)
    }

    fn deliver<K: RecordSink + ?Sized>(
        &self,
        sink: &mut K,
        index: usize,
        processed: Processed,
        summary: &mut RunSummary,
    ) -> Result<(), EngineError> {
        if processed.failed {
            summary.error_records += processed.records.len();
        }
        sink.accept(OutputGroup {
            index,
            records: processed.records,
        })?;
        summary.groups_out += 1;
        Ok(())
    }

    /// Build, send and interpret one request.
    ///
    /// Only request-building failures are returned as errors; everything after
    /// the request exists is folded into the output records.
    async fn process(&self, input: Option<&InputRecord>) -> Result<Processed, EngineError> {
        let (url, data, headers) = self.render(input);
        let request = self
            .builder
            .build(&self.template, &url, data.as_deref(), headers.as_deref())?;

        if self.template.debug {
            debug!("Debug mode, not sending request to {}", url);
            return Ok(Processed::ok(vec![emit_debug(input, &request)]));
        }

        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                let error = EngineError::from(e);
                warn!("Request to {} failed: {}", url, error);
                return Ok(Processed::failed(emit_error(input, &error, None)));
            }
        };

        if !response.is_success() {
            warn!(
                "{} returned HTTP {} {}",
                url, response.status, response.status_text
            );
        }

        match parse(&response, &self.template.parse) {
            Ok(rows) => Ok(Processed::ok(emit_response(input, &url, &response, rows))),
            Err(e) => {
                warn!("Could not parse response from {}: {}", url, e);
                Ok(Processed::failed(emit_error(
                    input,
                    &e,
                    Some(response.status),
                )))
            }
        }
    }

    /// Substitute record fields into url, data and headers
    fn render(&self, input: Option<&InputRecord>) -> (String, Option<String>, Option<String>) {
        let template = &self.template;
        let Some(record) = input else {
            return (
                template.url.clone(),
                template.data.clone(),
                template.headers.clone(),
            );
        };

        let url = substitute(&template.url, record);
        let data = template.data.as_deref().map(|d| substitute(d, record));
        let headers = template
            .headers
            .as_deref()
            .map(|h| substitute_headers(h, record));

        let mut unresolved = unresolved_tokens(&url);
        for part in [&data, &headers].into_iter().flatten() {
            unresolved.extend(unresolved_tokens(part));
        }
        if !unresolved.is_empty() {
            debug!("Tokens left unresolved: {}", unresolved.join(", "));
        }

        (url, data, headers)
    }
}
