//! Delimited text bodies (CSV, TSV and friends)

use super::{parse_error, ParsedRow, ResponseFormat};
use crate::error::EngineError;
use csv::{ReaderBuilder, StringRecord};
use serde_json::Value;
use tracing::debug;

/// Delimiters tried when none is configured, in order of preference
pub const CANDIDATES: [char; 4] = [',', '\t', ';', '|'];

/// Lines after the header that take part in sniffing
const SNIFF_SAMPLE: usize = 9;

pub(crate) fn parse_rows(body: &str, delimiter: Option<char>) -> Result<Vec<ParsedRow>, EngineError> {
    let cleaned = body.replace('\0', "");
    let lines = retained_lines(&cleaned);
    if lines.is_empty() {
        return Ok(Vec::new());
    }

    let delimiter = match delimiter {
        Some(explicit) => explicit,
        None => sniff_delimiter(&lines),
    };
    let byte = delimiter_byte(delimiter)
        .ok_or_else(|| parse_error(ResponseFormat::Delimited, format!("unusable delimiter {:?}", delimiter), body))?;

    let text = lines.join("\n");
    let mut reader = ReaderBuilder::new()
        .delimiter(byte)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error(ResponseFormat::Delimited, e.to_string(), body))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_error(ResponseFormat::Delimited, e.to_string(), body))?;
        rows.push(row_from_record(&headers, &record));
    }

    Ok(rows)
}

/// Drop blank lines and `#` comments
fn retained_lines(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .collect()
}

/// Pick the candidate giving the most columns with a consistent count over the sample
fn sniff_delimiter(lines: &[&str]) -> char {
    let header = lines[0];
    let sample = &lines[1..lines.len().min(SNIFF_SAMPLE + 1)];

    let mut consistent: Option<(char, usize)> = None;
    let mut widest = (',', 1);

    for candidate in CANDIDATES {
        let columns = field_count(header, candidate);
        if columns > widest.1 {
            widest = (candidate, columns);
        }
        if columns < 2 {
            continue;
        }

        let agrees = sample
            .iter()
            .all(|line| field_count(line, candidate) == columns);
        if agrees && consistent.is_none_or(|(_, best)| columns > best) {
            consistent = Some((candidate, columns));
        }
    }

    match consistent {
        Some((delimiter, _)) => delimiter,
        None => {
            debug!(
                "No delimiter splits the sample consistently, falling back to {:?}",
                widest.0
            );
            widest.0
        }
    }
}

fn field_count(line: &str, delimiter: char) -> usize {
    let Some(byte) = delimiter_byte(delimiter) else {
        return 0;
    };
    ReaderBuilder::new()
        .delimiter(byte)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(0, |record| record.len())
}

fn delimiter_byte(delimiter: char) -> Option<u8> {
    delimiter.is_ascii().then_some(delimiter as u8)
}

/// Short rows are padded with empty strings; extra fields are dropped
fn row_from_record(headers: &[String], record: &StringRecord) -> ParsedRow {
    headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty())
        .map(|(index, name)| {
            let value = record.get(index).unwrap_or_default();
            (name.clone(), Value::String(value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter(&["a,b,c", "1,2,3"]), ',');
        assert_eq!(sniff_delimiter(&["a\tb", "1\t2"]), '\t');
        assert_eq!(sniff_delimiter(&["a;b;c", "1;2;3"]), ';');
        assert_eq!(sniff_delimiter(&["a|b", "1|2"]), '|');
    }

    #[test]
    fn test_sniff_prefers_consistent_widest() {
        // Semicolons give 3 consistent columns, commas only appear inside one value
        let lines = ["name;price;qty", "apple;1,50;3", "pear;2;1"];
        assert_eq!(sniff_delimiter(&lines), ';');

        // Tie on column count goes to the earlier candidate
        let tie = ["a,b;c", "1,2;3"];
        assert_eq!(sniff_delimiter(&tie), ',');
    }

    #[test]
    fn test_sniff_fallbacks() {
        // Nothing consistent: the widest header wins
        let lines = ["a|b|c", "1|2", "x"];
        assert_eq!(sniff_delimiter(&lines), '|');

        // Single column everywhere: comma
        assert_eq!(sniff_delimiter(&["value", "1"]), ',');
    }

    #[test]
    fn test_parse_with_comments_and_padding() {
        let body = "# generated\nhost,port,proto\n\nweb,443,tcp\n  # trailing comment\ndb,5432\ncache,6379,tcp,extra\n";
        let rows = parse_rows(body, None).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            Value::Object(rows[1].clone()),
            json!({"host": "db", "port": "5432", "proto": ""})
        );
        assert_eq!(rows[2].len(), 3);
        assert_eq!(rows[2]["proto"], json!("tcp"));
    }

    #[test]
    fn test_explicit_delimiter_and_quotes() {
        let body = "id:note\n1:\"a:b\"\n";
        let rows = parse_rows(body, Some(':')).unwrap();
        assert_eq!(rows[0]["note"], json!("a:b"));
    }

    #[test]
    fn test_nul_and_empty_headers() {
        let body = "a,,b\n1\0,x,2\n";
        let rows = parse_rows(body, None).unwrap();
        let columns: Vec<&String> = rows[0].keys().collect();
        assert_eq!(columns, vec!["a", "b"]);
        assert_eq!(rows[0]["a"], json!("1"));
        assert_eq!(rows[0]["b"], json!("2"));
    }

    #[test]
    fn test_only_comments_is_empty() {
        assert!(parse_rows("# nothing\n\n#here\n", None).unwrap().is_empty());
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(parse_rows("a,b,c\n", None).unwrap().is_empty());
    }
}
