//! `$field$` token substitution
//!
//! Tokens are scanned left to right in a single pass. A token is two `$`
//! around a non-empty name without whitespace. Known names are replaced by the
//! record's value, unknown names are left verbatim, and replacement text is
//! never scanned again.

use crate::record::InputRecord;
use serde_json::{Map, Value};

/// Render `template` against `record`
pub fn substitute(template: &str, record: &InputRecord) -> String {
    let mut output = String::with_capacity(template.len());
    scan(template, |piece| match piece {
        Piece::Literal(text) => output.push_str(text),
        Piece::Token(name) => match record.get(name) {
            Some(value) => output.push_str(value),
            None => {
                output.push('$');
                output.push_str(name);
                output.push('$');
            }
        },
    });
    output
}

/// Render each string value of a JSON-object headers template.
///
/// Values are substituted after the template is parsed, so record values
/// containing quotes stay valid JSON. A template that does not parse as a
/// JSON object is substituted as plain text.
pub fn substitute_headers(template: &str, record: &InputRecord) -> String {
    match serde_json::from_str::<Map<String, Value>>(template) {
        Ok(headers) => {
            let rendered: Map<String, Value> = headers
                .into_iter()
                .map(|(name, value)| match value {
                    Value::String(text) => (name, Value::String(substitute(&text, record))),
                    other => (name, other),
                })
                .collect();
            Value::Object(rendered).to_string()
        }
        Err(_) => substitute(template, record),
    }
}

/// Token names that appear in `template`, in order of appearance
pub fn unresolved_tokens(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    scan(template, |piece| {
        if let Piece::Token(name) = piece {
            names.push(name.to_string());
        }
    });
    names
}

enum Piece<'a> {
    Literal(&'a str),
    Token(&'a str),
}

fn scan<'a>(template: &'a str, mut visit: impl FnMut(Piece<'a>)) {
    let mut rest = template;

    while let Some(start) = rest.find('$') {
        visit(Piece::Literal(&rest[..start]));
        let after = &rest[start + 1..];

        match after.find('$') {
            Some(end) if is_token_name(&after[..end]) => {
                visit(Piece::Token(&after[..end]));
                rest = &after[end + 1..];
            }
            Some(_) => {
                // Not a token; the next `$` may still open one
                visit(Piece::Literal("$"));
                rest = after;
            }
            None => {
                visit(Piece::Literal(&rest[start..]));
                rest = "";
            }
        }
    }

    if !rest.is_empty() {
        visit(Piece::Literal(rest));
    }
}

fn is_token_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> InputRecord {
        InputRecord::from(vec![
            ("user", "alice"),
            ("id", "42"),
            ("price", "$9$"),
        ])
    }

    #[test]
    fn test_replaces_known_tokens() {
        assert_eq!(
            substitute("https://api.example.com/users/$user$/items/$id$", &record()),
            "https://api.example.com/users/alice/items/42"
        );
    }

    #[test]
    fn test_unknown_tokens_are_left_verbatim() {
        let template = "https://api.example.com/$tenant$/users/$user$";
        assert_eq!(
            substitute(template, &record()),
            "https://api.example.com/$tenant$/users/alice"
        );
    }

    #[test]
    fn test_template_without_matching_tokens_is_unchanged() {
        let template = r#"{"query": "$missing$", "n": 1}"#;
        assert_eq!(substitute(template, &record()), template);
        assert_eq!(substitute(template, &InputRecord::new()), template);
    }

    #[test]
    fn test_every_occurrence_is_replaced() {
        assert_eq!(substitute("$id$-$id$-$id$", &record()), "42-42-42");
    }

    #[test]
    fn test_incomplete_dollars_are_untouched() {
        assert_eq!(substitute("costs $5", &record()), "costs $5");
        assert_eq!(substitute("$$", &record()), "$$");
        assert_eq!(substitute("a $ b $user$", &record()), "a $ b alice");
        assert_eq!(substitute("trailing $user", &record()), "trailing $user");
    }

    #[test]
    fn test_replacement_is_not_rescanned() {
        // `price` resolves to "$9$", which must not be treated as a token
        let record = InputRecord::from(vec![("price", "$id$"), ("id", "42")]);
        assert_eq!(substitute("p=$price$", &record), "p=$id$");
    }

    #[test]
    fn test_substitution_in_json_body() {
        let template = r#"{"name": "$user$", "amount": "$5 or $id$"}"#;
        assert_eq!(
            substitute(template, &record()),
            r#"{"name": "alice", "amount": "$5 or 42"}"#
        );
    }

    #[test]
    fn test_header_values_are_substituted_as_values() {
        let record = InputRecord::from(vec![("quote", r#"say "hi""#), ("id", "7")]);
        let rendered = substitute_headers(r#"{"X-Note": "$quote$", "X-Id": "$id$", "X-Retry": 2}"#, &record);
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["X-Note"], Value::String(r#"say "hi""#.to_string()));
        assert_eq!(parsed["X-Id"], Value::String("7".to_string()));
        assert_eq!(parsed["X-Retry"], Value::from(2));
    }

    #[test]
    fn test_non_object_headers_fall_back_to_text() {
        let record = InputRecord::from(vec![("id", "7")]);
        assert_eq!(substitute_headers("not json $id$", &record), "not json 7");
    }

    #[test]
    fn test_unresolved_tokens_lists_names() {
        assert_eq!(
            unresolved_tokens("https://x/$a$/$b$?q=$5 now"),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(unresolved_tokens("no tokens here").is_empty());
    }

    #[test]
    fn test_multibyte_text_survives() {
        let record = InputRecord::from(vec![("city", "Zürich")]);
        assert_eq!(substitute("ville=$city$ €$", &record), "ville=Zürich €$");
    }
}
