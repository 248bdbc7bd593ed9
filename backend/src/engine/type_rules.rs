//! Per-datatype coercion and checks for a single scalar cell.
//!
//! [`coerce`] moves a spreadsheet value into the representation the datatype is
//! stored with (numeric strings become numbers, numbers become text for textual
//! datatypes). [`check`] then decides whether the coerced value is admissible.
//! Both are pure and never look at emptiness: empty cells are settled by the
//! column validator before any of this runs.

use common::model::field::Datatype;
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::LazyLock;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

pub const SHORT_TEXT_MAX: usize = 60;
pub const LONG_TEXT_MAX: usize = 800;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+$").expect("link pattern is valid"));

pub fn coerce(datatype: Datatype, value: Value) -> Value {
    match datatype {
        Datatype::Integer => match &value {
            Value::String(s) => parse_integer(s).map(Value::from).unwrap_or(value),
            Value::Number(n) if n.as_i64().is_none() && n.as_u64().is_none() => n
                .as_f64()
                .and_then(integral)
                .map(Value::from)
                .unwrap_or(value),
            _ => value,
        },
        Datatype::Decimal | Datatype::Percentage => match &value {
            Value::String(s) => match s.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => parse_decimal(s)
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(value),
            },
            _ => value,
        },
        Datatype::ShortText | Datatype::LongText | Datatype::Link => match value {
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            other => other,
        },
        Datatype::Boolean | Datatype::Date | Datatype::DateRange => value,
    }
}

/// Checks one coerced value, returning the reason it is not admissible.
pub fn check(datatype: Datatype, value: &Value) -> Result<(), &'static str> {
    let valid = match datatype {
        Datatype::Integer => match value {
            Value::Number(n) => {
                n.as_i64().is_some() || n.as_u64().is_some() || n.as_f64().and_then(integral).is_some()
            }
            Value::String(s) => parse_integer(s).is_some(),
            _ => false,
        },
        Datatype::Decimal => as_decimal(value).is_some(),
        Datatype::Percentage => as_decimal(value).is_some_and(|n| (0.0..=100.0).contains(&n)),
        Datatype::ShortText => text_within(value, SHORT_TEXT_MAX),
        Datatype::LongText => text_within(value, LONG_TEXT_MAX),
        Datatype::Boolean => value.is_boolean(),
        Datatype::Date => value.as_str().and_then(parse_date).is_some(),
        Datatype::DateRange => match value.as_array() {
            Some(items) if items.len() == 2 => items
                .iter()
                .all(|item| item.as_str().and_then(parse_date).is_some()),
            _ => false,
        },
        Datatype::Link => value.as_str().is_some_and(|s| LINK_RE.is_match(s)),
    };

    if valid { Ok(()) } else { Err(message(datatype)) }
}

pub fn message(datatype: Datatype) -> &'static str {
    match datatype {
        Datatype::Integer => "El valor no es un entero.",
        Datatype::Decimal => "El valor no es un decimal.",
        Datatype::Percentage => "El valor no es un porcentaje válido (0-100).",
        Datatype::ShortText => "El valor no es un texto corto (máximo 60 caracteres).",
        Datatype::LongText => "El valor no es un texto largo (máximo 800 caracteres).",
        Datatype::Boolean => "El valor no es un booleano (true/false).",
        Datatype::Date => "El valor no es una fecha válida.",
        Datatype::DateRange => {
            "El valor no es un rango de fechas válido (Fecha Inicial y Fecha Final)."
        }
        Datatype::Link => "El valor no es un enlace válido.",
    }
}

/// Accepts ISO dates, RFC 3339 timestamps, naive ISO date-times,
/// `YYYY/MM/DD` and `DD/MM/YYYY`.
pub fn parse_date(text: &str) -> Option<Date> {
    let text = text.trim();
    if let Ok(ts) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(ts.date());
    }
    if let Ok(ts) = PrimitiveDateTime::parse(
        text,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(ts.date());
    }
    if let Ok(ts) = PrimitiveDateTime::parse(
        text,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Some(ts.date());
    }
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .or_else(|_| Date::parse(text, format_description!("[year]/[month]/[day]")))
        .or_else(|_| Date::parse(text, format_description!("[day]/[month]/[year]")))
        .ok()
}

fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>()
        .ok()
        .or_else(|| parse_decimal(text).and_then(integral))
}

fn parse_decimal(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

fn as_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

fn text_within(value: &Value, max: usize) -> bool {
    value.as_str().is_some_and(|s| s.chars().count() <= max)
}
