//! XML bodies: every child of the document element is one row

use super::{pad_rows, parse_error, ParsedRow, ResponseFormat};
use crate::error::EngineError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;

/// Column holding a row element's own text
pub const TEXT_COLUMN: &str = "xml_value";

#[derive(Debug)]
enum Node {
    Text(String),
    Element(Element),
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    content: Vec<Node>,
}

impl Element {
    fn open(start: &BytesStart<'_>, body: &str) -> Result<Self, EngineError> {
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute
                .map_err(|e| parse_error(ResponseFormat::Xml, e.to_string(), body))?;
            let value = attribute
                .unescape_value()
                .map_err(|e| parse_error(ResponseFormat::Xml, e.to_string(), body))?;
            attributes.push((
                String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Default::default()
        })
    }

    fn children(&self) -> impl Iterator<Item = &Element> {
        self.content.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    fn own_text(&self) -> String {
        let pieces: Vec<&str> = self
            .content
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect();
        pieces.join(" ")
    }

    /// All text below this element, in document order
    fn descendant_text(&self) -> String {
        let mut pieces = Vec::new();
        self.collect_text(&mut pieces);
        pieces.join(" ")
    }

    fn collect_text<'a>(&'a self, pieces: &mut Vec<&'a str>) {
        for node in &self.content {
            match node {
                Node::Text(text) => pieces.push(text),
                Node::Element(element) => element.collect_text(pieces),
            }
        }
    }
}

pub(crate) fn parse_rows(body: &str) -> Result<Vec<ParsedRow>, EngineError> {
    let root = read_document(body)?;
    Ok(pad_rows(root.children().map(row_from_element).collect()))
}

fn read_document(body: &str) -> Result<Element, EngineError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| parse_error(ResponseFormat::Xml, e.to_string(), body))?;

        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(parse_error(
                        ResponseFormat::Xml,
                        "content after the document element",
                        body,
                    ));
                }
                stack.push(Element::open(&start, body)?);
            }
            Event::Empty(start) => {
                let element = Element::open(&start, body)?;
                match stack.last_mut() {
                    Some(parent) => parent.content.push(Node::Element(element)),
                    None if root.is_none() => root = Some(element),
                    None => {
                        return Err(parse_error(
                            ResponseFormat::Xml,
                            "content after the document element",
                            body,
                        ))
                    }
                }
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(parse_error(ResponseFormat::Xml, "unbalanced end tag", body));
                };
                match stack.last_mut() {
                    Some(parent) => parent.content.push(Node::Element(element)),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| parse_error(ResponseFormat::Xml, e.to_string(), body))?;
                push_text(&mut stack, &text);
            }
            Event::CData(data) => {
                let raw = data.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&raw));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(parse_error(
            ResponseFormat::Xml,
            format!("element <{}> is never closed", open.name),
            body,
        ));
    }

    root.ok_or_else(|| parse_error(ResponseFormat::Xml, "no document element", body))
}

fn push_text(stack: &mut [Element], text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if let Some(current) = stack.last_mut() {
        current.content.push(Node::Text(text.to_string()));
    }
}

fn row_from_element(element: &Element) -> ParsedRow {
    let mut row = ParsedRow::new();

    for (name, value) in &element.attributes {
        append(&mut row, format!("{}_{}", element.name, name), value);
    }

    let own = element.own_text();
    if !own.is_empty() {
        row.insert(TEXT_COLUMN.to_string(), Value::String(own));
    }

    for child in element.children() {
        append(&mut row, child.name.clone(), &child.descendant_text());
        for (name, value) in &child.attributes {
            append(&mut row, format!("{}_{}", child.name, name), value);
        }
    }

    row
}

/// Repeated columns within a row are joined with newlines
fn append(row: &mut ParsedRow, column: String, value: &str) {
    match row.get_mut(&column) {
        Some(Value::String(existing)) => {
            existing.push('\n');
            existing.push_str(value);
        }
        _ => {
            row.insert(column, Value::String(value.to_string()));
        }
    }
}
