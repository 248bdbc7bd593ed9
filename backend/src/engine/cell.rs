//! Normalization of raw spreadsheet cells.
//!
//! Upload clients wrap values in arbitrarily nested single-element arrays,
//! stringify arrays as JSON, send rich cell objects (hyperlinks, rich text,
//! formula results) and use several spellings of "nothing". [`normalize`]
//! reduces all of that to a [`Normalized`] value, in this order:
//!
//! 1. single-element arrays collapse to their element, repeatedly;
//! 2. strings holding a single-element JSON array collapse to that element;
//! 3. rich cell objects are replaced by their display text;
//! 4. `"null"` and `"[object Object]"` become empty;
//! 5. blank values become empty, which exempts optional cells from every check;
//! 6. `multiple` fields are split on commas into a list.
//!
//! Scalars are finally coerced to the representation of the field datatype.

use crate::engine::type_rules;
use common::model::field::{Datatype, Field};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

const NULL_SENTINELS: [&str; 2] = ["null", "[object Object]"];

static HYPERLINK_FORMULA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^=HYPERLINK\("([^"]+)""#).expect("hyperlink formula pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Empty,
    Scalar(Value),
    List(Vec<Value>),
}

impl Normalized {
    pub fn is_empty(&self) -> bool {
        match self {
            Normalized::Empty => true,
            Normalized::Scalar(_) => false,
            Normalized::List(items) => items.is_empty(),
        }
    }

    /// Elements subject to type and reference checks.
    pub fn elements(&self) -> &[Value] {
        match self {
            Normalized::Empty => &[],
            Normalized::Scalar(value) => std::slice::from_ref(value),
            Normalized::List(items) => items,
        }
    }

    /// Value written to `filled_data`.
    pub fn into_stored(self) -> Value {
        match self {
            Normalized::Empty => Value::Null,
            Normalized::Scalar(value) => value,
            Normalized::List(items) => Value::Array(items),
        }
    }
}

pub fn normalize(raw: &Value, field: &Field) -> Normalized {
    let value = collapse_arrays(raw.clone());
    let value = collapse_json_string(value, field.datatype);
    let value = extract_rich(value, field.datatype);

    if is_blank(&value) {
        return if field.multiple {
            Normalized::List(Vec::new())
        } else {
            Normalized::Empty
        };
    }

    if field.multiple {
        let items = split_multiple(value)
            .into_iter()
            .map(|item| type_rules::coerce(field.datatype, item))
            .collect();
        Normalized::List(items)
    } else {
        Normalized::Scalar(type_rules::coerce(field.datatype, value))
    }
}

/// Blank after trimming, one of the null sentinels, or an empty array.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.is_empty() || NULL_SENTINELS.contains(&trimmed)
        }
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn collapse_arrays(mut value: Value) -> Value {
    while let Value::Array(items) = &mut value {
        if items.len() != 1 {
            break;
        }
        match items.pop() {
            Some(inner) => value = inner,
            None => break,
        }
    }
    value
}

fn collapse_json_string(value: Value, datatype: Datatype) -> Value {
    let Value::String(text) = &value else {
        return value;
    };
    let trimmed = text.trim();
    if !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
        return value;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) if items.len() == 1 => collapse_arrays(Value::Array(items)),
        // A date range is the one datatype whose scalar is itself a list.
        Ok(Value::Array(items)) if datatype == Datatype::DateRange => Value::Array(items),
        _ => value,
    }
}

fn extract_rich(value: Value, datatype: Datatype) -> Value {
    match value {
        Value::Object(map) => rich_cell_text(&map, datatype),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| extract_rich(item, datatype))
                .collect(),
        ),
        Value::String(text) if datatype == Datatype::Link => {
            match HYPERLINK_FORMULA_RE.captures(text.trim()) {
                Some(caps) => Value::String(caps[1].to_string()),
                None => Value::String(text),
            }
        }
        other => other,
    }
}

/// Display text of a document cell object. Objects with no recognizable
/// property are kept as their JSON text so nothing structured is stored.
fn rich_cell_text(map: &Map<String, Value>, datatype: Datatype) -> Value {
    if datatype == Datatype::Link {
        if let Some(Value::String(target)) = map.get("hyperlink") {
            return Value::String(target.clone());
        }
    }
    if let Some(text) = map.get("text") {
        match text {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => return text.clone(),
            Value::Object(inner) => return rich_cell_text(inner, datatype),
            _ => {}
        }
    }
    if let Some(Value::Array(parts)) = map.get("richText") {
        let joined: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();
        return Value::String(joined);
    }
    for key in ["result", "hyperlink", "value"] {
        match map.get(key) {
            Some(Value::Object(inner)) => return rich_cell_text(inner, datatype),
            Some(Value::Null) | None => {}
            Some(found) => return found.clone(),
        }
    }
    Value::String(Value::Object(map.clone()).to_string())
}

fn split_multiple(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::String(text) => text
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty() && !NULL_SENTINELS.contains(part))
            .map(|part| Value::String(part.to_string()))
            .collect(),
        Value::Number(n) => vec![Value::String(n.to_string())],
        Value::Array(items) => items.into_iter().flat_map(split_multiple).collect(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(datatype: Datatype, required: bool, multiple: bool) -> Field {
        Field {
            name: "campo".to_string(),
            datatype,
            required,
            multiple,
            validate_with: None,
            comment: None,
        }
    }

    #[test]
    fn nested_single_arrays_collapse_before_coercion() {
        let f = field(Datatype::ShortText, true, false);
        assert_eq!(normalize(&json!([[["7"]]]), &f), Normalized::Scalar(json!("7")));

        let f = field(Datatype::Integer, true, false);
        assert_eq!(normalize(&json!([[["7"]]]), &f), Normalized::Scalar(json!(7)));
    }

    #[test]
    fn json_array_strings_collapse() {
        let f = field(Datatype::Integer, true, false);
        assert_eq!(normalize(&json!("[\"2\"]"), &f), Normalized::Scalar(json!(2)));
        assert_eq!(normalize(&json!("[[\"2\"]]"), &f), Normalized::Scalar(json!(2)));
        // Not a single-element array: left alone for the type check to reject.
        assert_eq!(
            normalize(&json!("[1,2]"), &f),
            Normalized::Scalar(json!("[1,2]"))
        );

        let range = field(Datatype::DateRange, true, false);
        assert_eq!(
            normalize(&json!("[\"2024-01-01\",\"2024-02-01\"]"), &range),
            Normalized::Scalar(json!(["2024-01-01", "2024-02-01"]))
        );
    }

    #[test]
    fn rich_cells_yield_their_text() {
        let text = field(Datatype::ShortText, true, false);
        let link = field(Datatype::Link, true, false);
        let cell = json!({"text": "Sitio", "hyperlink": "https://example.org"});

        assert_eq!(normalize(&cell, &text), Normalized::Scalar(json!("Sitio")));
        assert_eq!(
            normalize(&cell, &link),
            Normalized::Scalar(json!("https://example.org"))
        );
        assert_eq!(
            normalize(&json!({"richText": [{"text": "Hola "}, {"text": "mundo"}]}), &text),
            Normalized::Scalar(json!("Hola mundo"))
        );
        assert_eq!(
            normalize(&json!({"formula": "A1+1", "result": 4}), &text),
            Normalized::Scalar(json!("4"))
        );
        assert_eq!(
            normalize(&json!({"unexpected": true}), &text),
            Normalized::Scalar(json!("{\"unexpected\":true}"))
        );
        assert_eq!(
            normalize(&json!("=HYPERLINK(\"https://a.org/x\",\"ver\")"), &link),
            Normalized::Scalar(json!("https://a.org/x"))
        );
    }

    #[test]
    fn sentinels_and_blanks_are_empty() {
        let f = field(Datatype::Integer, false, false);
        for raw in [json!(null), json!("null"), json!("  "), json!("[object Object]"), json!([])] {
            assert_eq!(normalize(&raw, &f), Normalized::Empty, "{raw}");
        }
    }

    #[test]
    fn multiple_fields_split_on_commas() {
        let f = field(Datatype::ShortText, false, true);
        assert_eq!(
            normalize(&json!("a, b,c"), &f),
            Normalized::List(vec![json!("a"), json!("b"), json!("c")])
        );
        assert_eq!(normalize(&json!("solo"), &f), Normalized::List(vec![json!("solo")]));
        assert_eq!(normalize(&json!(""), &f), Normalized::List(vec![]));
        assert_eq!(normalize(&json!(null), &f), Normalized::List(vec![]));
        assert_eq!(
            normalize(&json!(["a,b", "c"]), &f),
            Normalized::List(vec![json!("a"), json!("b"), json!("c")])
        );

        let numbers = field(Datatype::Integer, true, true);
        assert_eq!(
            normalize(&json!("1, 2"), &numbers),
            Normalized::List(vec![json!(1), json!(2)])
        );
        assert_eq!(normalize(&json!(5), &numbers), Normalized::List(vec![json!(5)]));
    }

    #[test]
    fn stored_form_of_each_variant() {
        assert_eq!(Normalized::Empty.into_stored(), Value::Null);
        assert_eq!(Normalized::List(vec![]).into_stored(), json!([]));
        assert_eq!(Normalized::Scalar(json!(3)).into_stored(), json!(3));
    }
}
