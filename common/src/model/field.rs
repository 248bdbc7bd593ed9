//! Field definitions and the closed set of datatypes a template column can declare.
//!
//! Datatypes travel over the wire with the display names the administrative
//! screens use ("Entero", "Texto Corto", ...). Parsing goes through
//! [`Datatype::from_str`], so a template carrying a name outside the closed
//! set fails to deserialize with [`DatatypeError::Unknown`] instead of being
//! silently accepted without a type check.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Datatype {
    Integer,
    Decimal,
    Percentage,
    ShortText,
    LongText,
    Boolean,
    Date,
    DateRange,
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatatypeError {
    #[error("tipo de dato desconocido: '{0}'")]
    Unknown(String),
}

impl Datatype {
    pub const ALL: [Datatype; 9] = [
        Datatype::Integer,
        Datatype::Decimal,
        Datatype::Percentage,
        Datatype::ShortText,
        Datatype::LongText,
        Datatype::Boolean,
        Datatype::Date,
        Datatype::DateRange,
        Datatype::Link,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Datatype::Integer => "Entero",
            Datatype::Decimal => "Decimal",
            Datatype::Percentage => "Porcentaje",
            Datatype::ShortText => "Texto Corto",
            Datatype::LongText => "Texto Largo",
            Datatype::Boolean => "True/False",
            Datatype::Date => "Fecha",
            Datatype::DateRange => "Fecha Inicial / Fecha Final",
            Datatype::Link => "Link",
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Datatype {
    type Err = DatatypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Datatype::ALL
            .into_iter()
            .find(|d| d.as_str() == trimmed)
            .ok_or_else(|| DatatypeError::Unknown(trimmed.to_string()))
    }
}

impl TryFrom<String> for Datatype {
    type Error = DatatypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Datatype> for String {
    fn from(value: Datatype) -> Self {
        value.as_str().to_string()
    }
}

/// One column of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub datatype: Datatype,
    #[serde(default)]
    pub required: bool,
    /// The cell holds a comma separated set of values.
    #[serde(default)]
    pub multiple: bool,
    /// `"<Validator> - <Column>"` or one of the reserved directory names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datatype_names_round_trip_through_json() {
        for datatype in Datatype::ALL {
            let json = serde_json::to_string(&datatype).unwrap();
            let back: Datatype = serde_json::from_str(&json).unwrap();
            assert_eq!(back, datatype);
        }
    }

    #[test]
    fn unknown_datatype_is_an_explicit_error() {
        let err = "Moneda".parse::<Datatype>().unwrap_err();
        assert_eq!(err, DatatypeError::Unknown("Moneda".to_string()));

        let field = serde_json::from_str::<Field>(r#"{"name":"x","datatype":"Moneda"}"#);
        assert!(field.unwrap_err().to_string().contains("Moneda"));
    }

    #[test]
    fn field_flags_default_to_false() {
        let field: Field = serde_json::from_str(r#"{"name":"edad","datatype":"Entero"}"#).unwrap();
        assert!(!field.required);
        assert!(!field.multiple);
        assert!(field.validate_with.is_none());
    }
}
