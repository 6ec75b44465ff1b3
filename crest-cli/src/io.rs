//! JSON-lines input and output

use crest_core::{EngineError, ExecutionMode, InputRecord, OutputGroup, RecordSink};
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use std::io::Write;
use std::pin::Pin;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub type RecordStream = Pin<Box<dyn Stream<Item = Result<InputRecord, EngineError>>>>;

/// One JSON object per line; blank lines are skipped
pub fn json_lines<R>(reader: R) -> RecordStream
where
    R: AsyncBufRead + Unpin + 'static,
{
    Box::pin(stream::unfold(
        (reader.lines(), 0usize),
        |(mut lines, mut number)| async move {
            loop {
                number += 1;
                let item = match lines.next_line().await {
                    Ok(None) => return None,
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => serde_json::from_str::<Value>(&line)
                        .map_err(|e| EngineError::Input(format!("line {}: {}", number, e)))
                        .and_then(InputRecord::from_json),
                    Err(e) => Err(EngineError::Input(format!("line {}: {}", number, e))),
                };
                return Some((item, (lines, number)));
            }
        },
    ))
}

/// Stream the records, or issue a single request when the input ends before
/// yielding anything
pub async fn select_mode(
    records: Option<RecordStream>,
    cancel: &CancellationToken,
) -> ExecutionMode<RecordStream> {
    let Some(mut records) = records else {
        return ExecutionMode::Generating;
    };

    let first = tokio::select! {
        biased;
        _ = cancel.cancelled() => return ExecutionMode::Streaming(records),
        first = records.next() => first,
    };

    match first {
        Some(first) => {
            ExecutionMode::Streaming(Box::pin(stream::once(async move { first }).chain(records)))
        }
        None => {
            debug!("No input records arrived, issuing a single request");
            ExecutionMode::Generating
        }
    }
}

/// Writes every record as one JSON line, flushing after each group
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn accept(&mut self, group: OutputGroup) -> Result<(), EngineError> {
        let output = |e: std::io::Error| EngineError::Output(e.to_string());
        for record in &group.records {
            serde_json::to_writer(&mut self.writer, record)
                .map_err(|e| EngineError::Output(e.to_string()))?;
            self.writer.write_all(b"\n").map_err(output)?;
        }
        self.writer.flush().map_err(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crest_core::{ModeKind, OutputRecord};

    #[tokio::test]
    async fn test_json_lines_reads_objects_in_order() {
        let input: &'static [u8] = b"{\"id\": 1, \"name\": \"a\"}\n\n{\"id\": 2}\n";
        let records: Vec<_> = json_lines(input).collect().await;

        assert_eq!(records.len(), 2);
        let first = records[0].as_ref().unwrap();
        assert_eq!(first.get("id"), Some("1"));
        assert_eq!(first.get("name"), Some("a"));
        assert_eq!(records[1].as_ref().unwrap().get("id"), Some("2"));
    }

    #[tokio::test]
    async fn test_json_lines_reports_line_numbers() {
        let input: &'static [u8] = b"{\"ok\": true}\nnot json\n";
        let records: Vec<_> = json_lines(input).collect().await;

        match &records[1] {
            Err(EngineError::Input(message)) => assert!(message.starts_with("line 2")),
            other => panic!("expected input error, got {:?}", other),
        }
    }

    #[test]
    fn test_sink_writes_one_line_per_record() {
        let mut first = OutputRecord::new();
        first.insert("status_code", 200);
        let mut second = OutputRecord::new();
        second.insert("crest_error", "transport");

        let mut sink = JsonLinesSink::new(Vec::new());
        sink.accept(OutputGroup {
            index: 0,
            records: vec![first, second],
        })
        .unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "{\"status_code\":200}\n{\"crest_error\":\"transport\"}\n");
    }

    #[tokio::test]
    async fn test_empty_input_falls_back_to_generating() {
        let input: &'static [u8] = b"\n\n";
        let mode = select_mode(Some(json_lines(input)), &CancellationToken::new()).await;
        assert_eq!(mode.kind(), ModeKind::Generating);

        let mode = select_mode(None, &CancellationToken::new()).await;
        assert_eq!(mode.kind(), ModeKind::Generating);
    }

    #[tokio::test]
    async fn test_non_empty_input_keeps_first_record() {
        let input: &'static [u8] = b"{\"id\": 1}\n{\"id\": 2}\n";
        let mode = select_mode(Some(json_lines(input)), &CancellationToken::new()).await;

        let ExecutionMode::Streaming(records) = mode else {
            panic!("expected streaming mode");
        };
        let records: Vec<_> = records.collect().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].as_ref().unwrap().get("id"), Some("1"));
        assert_eq!(records[1].as_ref().unwrap().get("id"), Some("2"));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_record_stays_streaming() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let pending: RecordStream = Box::pin(stream::pending::<Result<InputRecord, EngineError>>());
        let mode = select_mode(Some(pending), &cancel).await;
        assert_eq!(mode.kind(), ModeKind::Streaming);
    }
}
