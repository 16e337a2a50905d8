//! Decoding of classified sources into [`CanonicalArtifact`]s.
//!
//! Only the fields needed to route and identify an artifact are extracted;
//! the rest of the document travels untouched in the payload.

use crate::error::DecodeError;
use crate::types::{
    file_name_of, parse_comma_list, ArtifactFormat, ArtifactSource, CanonicalArtifact,
    Classification, Payload, TargetKind,
};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::LazyLock;

/// Lines of a script body searched for a category header.
const SCRIPT_HEADER_LINES: usize = 15;

static SCRIPT_CATEGORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:#|//|--|;)\s*categor(?:y|ies)\s*:\s*(.+?)\s*$").expect("valid regex")
});

/// Decodes a classified source.
pub fn decode(
    source: &ArtifactSource,
    classification: &Classification,
) -> Result<CanonicalArtifact, DecodeError> {
    let path = source.relative_path.as_path();
    let text = std::str::from_utf8(&source.bytes)
        .map_err(|_| DecodeError::NotText {
            path: path.to_path_buf(),
        })?
        .trim_start_matches('\u{feff}');

    let decoded = match classification.kind {
        TargetKind::ZabbixTemplate => decode_template(path, text, classification.format)?,
        TargetKind::ZabbixScript => decode_script(source, text, classification.format)?,
        TargetKind::GrafanaDashboard => decode_dashboard(path, text, classification.format)?,
    };

    let mut categories = decoded.categories;
    if let Some(group) = &source.category {
        push_unique(&mut categories, group);
    }

    Ok(CanonicalArtifact {
        kind: classification.kind,
        format: classification.format,
        name: decoded.name,
        key: decoded.key,
        categories,
        payload: decoded.payload,
        source_path: source.relative_path.clone(),
    })
}

struct Decoded {
    name: String,
    key: String,
    categories: Vec<String>,
    payload: Payload,
}

fn push_unique(categories: &mut Vec<String>, candidate: &str) {
    let candidate = candidate.trim();
    if !candidate.is_empty() && !categories.iter().any(|c| c.eq_ignore_ascii_case(candidate)) {
        categories.push(candidate.to_string());
    }
}

/// Parses a structured document into a JSON value regardless of its format.
fn parse_document(path: &Path, text: &str, format: ArtifactFormat) -> Result<Value, DecodeError> {
    match format {
        ArtifactFormat::Json => {
            serde_json::from_str(text).map_err(|e| DecodeError::parse(path, format, e))
        }
        ArtifactFormat::Yaml => {
            serde_yaml::from_str(text).map_err(|e| DecodeError::parse(path, format, e))
        }
        ArtifactFormat::Xml => xml_to_value(text).map_err(|e| DecodeError::parse(path, format, e)),
        ArtifactFormat::Script => Ok(Value::String(text.to_string())),
    }
}

fn non_empty_str<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Returns a list field, treating a lone object as a one-element list.
fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(v @ Value::Object(_)) => vec![v],
        _ => Vec::new(),
    }
}

fn decode_template(path: &Path, text: &str, format: ArtifactFormat) -> Result<Decoded, DecodeError> {
    let doc = parse_document(path, text, format)?;
    let export = doc.get("zabbix_export").ok_or(DecodeError::MissingField {
        path: path.to_path_buf(),
        field: "zabbix_export",
    })?;
    let templates = as_list(export.get("templates"));
    let first = templates.first().ok_or(DecodeError::MissingField {
        path: path.to_path_buf(),
        field: "templates",
    })?;

    let key = non_empty_str(first, "template")
        .or_else(|| non_empty_str(first, "name"))
        .ok_or(DecodeError::MissingField {
            path: path.to_path_buf(),
            field: "template",
        })?
        .to_string();
    let name = non_empty_str(first, "name").unwrap_or(&key).to_string();

    let mut categories = Vec::new();
    for template in &templates {
        for tag in as_list(template.get("tags")) {
            let is_category = non_empty_str(tag, "tag")
                .is_some_and(|t| t.eq_ignore_ascii_case("category"));
            if let (true, Some(value)) = (is_category, non_empty_str(tag, "value")) {
                for c in parse_comma_list(value) {
                    push_unique(&mut categories, &c);
                }
            }
        }
        for group in as_list(template.get("groups")) {
            if let Some(group_name) = non_empty_str(group, "name") {
                push_unique(&mut categories, group_name);
                if let Some((_, leaf)) = group_name.rsplit_once('/') {
                    push_unique(&mut categories, leaf);
                }
            }
        }
    }

    Ok(Decoded {
        name,
        key,
        categories,
        payload: Payload::Document(text.to_string()),
    })
}

fn decode_dashboard(
    path: &Path,
    text: &str,
    format: ArtifactFormat,
) -> Result<Decoded, DecodeError> {
    let doc = parse_document(path, text, format)?;
    // API exports wrap the model as {"dashboard": {...}, "meta": {...}}
    let model = match doc {
        Value::Object(mut outer) => match outer.remove("dashboard") {
            Some(Value::Object(inner)) => inner,
            Some(other) => {
                outer.insert("dashboard".into(), other);
                outer
            }
            None => outer,
        },
        _ => {
            return Err(DecodeError::parse(
                path,
                format,
                "dashboard document is not an object",
            ))
        }
    };
    let field = |name: &str| {
        model
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let title = field("title");
    let key = field("uid")
        .or_else(|| title.clone())
        .ok_or(DecodeError::MissingField {
            path: path.to_path_buf(),
            field: "title",
        })?;
    let name = title.unwrap_or_else(|| key.clone());

    let mut categories = Vec::new();
    for tag in model
        .get("tags")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
    {
        push_unique(&mut categories, tag);
    }

    Ok(Decoded {
        name,
        key,
        categories,
        payload: Payload::Object(model),
    })
}

fn decode_script(
    source: &ArtifactSource,
    text: &str,
    format: ArtifactFormat,
) -> Result<Decoded, DecodeError> {
    let path = source.relative_path.as_path();
    if format == ArtifactFormat::Script {
        let name = file_name_of(&source.path);
        let mut categories = Vec::new();
        for line in text.lines().take(SCRIPT_HEADER_LINES) {
            if let Some(caps) = SCRIPT_CATEGORY.captures(line) {
                for c in parse_comma_list(&caps[1]) {
                    push_unique(&mut categories, &c);
                }
            }
        }
        let mut params = Map::new();
        params.insert("command".into(), Value::String(text.to_string()));
        return Ok(Decoded {
            key: name.clone(),
            name,
            categories,
            payload: Payload::Object(params),
        });
    }

    // structured descriptor: script.create parameters plus a category field
    let doc = parse_document(path, text, format)?;
    let mut params = match doc {
        Value::Object(map) => map,
        _ => {
            return Err(DecodeError::parse(
                path,
                format,
                "script descriptor is not a mapping",
            ))
        }
    };
    // XML descriptors carry a <script> wrapper element
    if params.len() == 1 {
        if let Some(Value::Object(inner)) = params.get("script") {
            params = inner.clone();
        }
    }

    let mut categories = Vec::new();
    for field in ["category", "categories"] {
        match params.remove(field) {
            Some(Value::String(s)) => {
                for c in parse_comma_list(&s) {
                    push_unique(&mut categories, &c);
                }
            }
            Some(Value::Array(items)) => {
                for c in items.iter().filter_map(Value::as_str) {
                    push_unique(&mut categories, c);
                }
            }
            _ => {}
        }
    }

    let name = params
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(DecodeError::MissingField {
            path: path.to_path_buf(),
            field: "name",
        })?
        .to_string();

    Ok(Decoded {
        key: name.clone(),
        name,
        categories,
        payload: Payload::Object(params),
    })
}

#[derive(Debug, Default)]
struct XmlElement {
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

/// Parses XML into a JSON value following the Zabbix export conventions.
///
/// Leaf elements become strings. An element whose children all share one name
/// and whose own name is that name plus `s` (`templates/template`,
/// `groups/group`) becomes an array; any other element becomes an object.
fn xml_to_value(text: &str) -> Result<Value, quick_xml::Error> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = vec![XmlElement::default()];
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(XmlElement {
                name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                ..Default::default()
            }),
            Event::Empty(empty) => {
                let element = XmlElement {
                    name: String::from_utf8_lossy(empty.name().as_ref()).into_owned(),
                    ..Default::default()
                };
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Event::Text(t) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    if let Some(done) = stack.pop() {
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(done);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let document = stack.swap_remove(0);
    let mut root = Map::new();
    for child in document.children {
        let value = element_to_value(&child);
        insert_child(&mut root, child.name, value);
    }
    Ok(Value::Object(root))
}

fn insert_child(map: &mut Map<String, Value>, name: String, value: Value) {
    match map.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(name, value);
        }
    }
}

fn element_to_value(element: &XmlElement) -> Value {
    if element.children.is_empty() {
        return Value::String(element.text.clone());
    }
    let first_name = &element.children[0].name;
    let is_list = element.name == format!("{first_name}s")
        && element.children.iter().all(|c| &c.name == first_name);
    if is_list {
        return Value::Array(element.children.iter().map(element_to_value).collect());
    }
    let mut map = Map::new();
    for child in &element.children {
        insert_child(&mut map, child.name.clone(), element_to_value(child));
    }
    Value::Object(map)
}
