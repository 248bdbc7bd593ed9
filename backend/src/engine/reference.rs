//! Resolution of a field's `validate_with` reference into the set of values a
//! cell may take.
//!
//! Three reserved names point at the identity directories instead of a
//! validator table: `Funcionarios` (organization members), `Estudiantes`
//! (students, by code when the column is `Código`, by identification
//! otherwise) and `Participantes` (members and students together).

use common::model::field::Datatype;
use common::model::validator::{REFERENCE_SEPARATOR, ReferenceOption, ValidatorTable};
use serde_json::{Number, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MEMBERS: &str = "Funcionarios";
pub const STUDENTS: &str = "Estudiantes";
pub const PARTICIPANTS: &str = "Participantes";
pub const STUDENT_CODE_COLUMN: &str = "Código";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudentKey {
    Code,
    Identification,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    Members,
    Students(StudentKey),
    Participants,
    Table { table: String, column: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceParseError {
    #[error("la referencia de validación está vacía")]
    Empty,
    #[error("la referencia '{0}' debe tener la forma '<Validador> - <Columna>'")]
    Malformed(String),
}

/// Misconfigured or unreachable references. These are attributed to the
/// template configuration, never to the submitted cells.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error(transparent)]
    Malformed(#[from] ReferenceParseError),
    #[error("Tabla de validación no encontrada: {0}")]
    TableNotFound(String),
    #[error("Columna '{column}' no encontrada en la tabla: {table}")]
    ColumnNotFound { table: String, column: String },
    #[error("no fue posible consultar la referencia '{reference}': {reason}")]
    Source { reference: String, reason: String },
}

impl FromStr for Reference {
    type Err = ReferenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ReferenceParseError::Empty);
        }
        let (name, column) = match trimmed.split_once(REFERENCE_SEPARATOR) {
            Some((name, column)) => (name.trim(), Some(column.trim())),
            None => (trimmed, None),
        };

        match name {
            MEMBERS => Ok(Reference::Members),
            STUDENTS if column == Some(STUDENT_CODE_COLUMN) => {
                Ok(Reference::Students(StudentKey::Code))
            }
            STUDENTS => Ok(Reference::Students(StudentKey::Identification)),
            PARTICIPANTS => Ok(Reference::Participants),
            _ => match column {
                Some(column) if !name.is_empty() && !column.is_empty() => Ok(Reference::Table {
                    table: name.to_string(),
                    column: column.to_string(),
                }),
                _ => Err(ReferenceParseError::Malformed(trimmed.to_string())),
            },
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Members => write!(f, "{MEMBERS}{REFERENCE_SEPARATOR}Identificación"),
            Reference::Students(StudentKey::Code) => {
                write!(f, "{STUDENTS}{REFERENCE_SEPARATOR}{STUDENT_CODE_COLUMN}")
            }
            Reference::Students(StudentKey::Identification) => {
                write!(f, "{STUDENTS}{REFERENCE_SEPARATOR}Identificación")
            }
            Reference::Participants => {
                write!(f, "{PARTICIPANTS}{REFERENCE_SEPARATOR}Identificación")
            }
            Reference::Table { table, column } => {
                write!(f, "{table}{REFERENCE_SEPARATOR}{column}")
            }
        }
    }
}

/// The directory-backed options, offered ahead of validator table columns.
pub fn reserved_options() -> Vec<ReferenceOption> {
    [
        (Reference::Members, Datatype::Integer),
        (Reference::Students(StudentKey::Code), Datatype::ShortText),
        (Reference::Students(StudentKey::Identification), Datatype::ShortText),
        (Reference::Participants, Datatype::ShortText),
    ]
    .into_iter()
    .map(|(reference, datatype)| ReferenceOption {
        name: reference.to_string(),
        datatype,
    })
    .collect()
}

/// Where reference data comes from: validator tables and identity directories.
pub trait ReferenceSource {
    type Error: fmt::Display;

    fn validator_table(&self, name: &str) -> Result<Option<ValidatorTable>, Self::Error>;
    fn member_identifications(&self) -> Result<Vec<String>, Self::Error>;
    fn student_codes(&self) -> Result<Vec<String>, Self::Error>;
    fn student_identifications(&self) -> Result<Vec<String>, Self::Error>;
}

/// Admissible values of a referenced column, compared numerically when most of
/// the column is numeric and as trimmed text otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllowList {
    numeric: bool,
    keys: HashSet<String>,
}

impl AllowList {
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let values: Vec<&Value> = values.into_iter().filter(|v| !v.is_null()).collect();
        let numbers = values.iter().filter(|v| v.is_number()).count();
        let numeric = numbers * 2 > values.len();
        let keys = values
            .into_iter()
            .filter_map(|v| membership_key(v, numeric))
            .collect();
        Self { numeric, keys }
    }

    pub fn from_text(values: impl IntoIterator<Item = String>) -> Self {
        let keys = values
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        Self {
            numeric: false,
            keys,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, candidate: &Value) -> bool {
        membership_key(candidate, self.numeric).is_some_and(|key| self.keys.contains(&key))
    }
}

pub fn resolve<S: ReferenceSource>(
    source: &S,
    reference: &Reference,
) -> Result<AllowList, LookupError> {
    let unreachable = |err: S::Error| LookupError::Source {
        reference: reference.to_string(),
        reason: err.to_string(),
    };

    match reference {
        Reference::Members => Ok(AllowList::from_text(
            source.member_identifications().map_err(unreachable)?,
        )),
        Reference::Students(StudentKey::Code) => {
            Ok(AllowList::from_text(source.student_codes().map_err(unreachable)?))
        }
        Reference::Students(StudentKey::Identification) => Ok(AllowList::from_text(
            source.student_identifications().map_err(unreachable)?,
        )),
        Reference::Participants => {
            let mut all = source.student_identifications().map_err(unreachable)?;
            all.extend(source.member_identifications().map_err(unreachable)?);
            Ok(AllowList::from_text(all))
        }
        Reference::Table { table, column } => {
            let found = source
                .validator_table(table)
                .map_err(unreachable)?
                .ok_or_else(|| LookupError::TableNotFound(table.clone()))?;
            let target = found
                .column(column)
                .ok_or_else(|| LookupError::ColumnNotFound {
                    table: found.name.clone(),
                    column: column.clone(),
                })?;
            Ok(AllowList::from_values(&target.values))
        }
    }
}

fn membership_key(value: &Value, numeric: bool) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(number_key(n)),
        Value::String(s) => {
            let trimmed = s.trim();
            if numeric {
                if let Some(n) = trimmed.parse::<f64>().ok().filter(|n| n.is_finite()) {
                    return Some(float_key(n));
                }
            }
            Some(trimmed.to_string())
        }
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn number_key(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(float_key).unwrap_or_else(|| n.to_string())
    }
}

fn float_key(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::MemorySource;
    use serde_json::json;

    #[test]
    fn parses_reserved_and_table_references() {
        assert_eq!("Funcionarios - Identificación".parse(), Ok(Reference::Members));
        assert_eq!(
            "Estudiantes - Código".parse(),
            Ok(Reference::Students(StudentKey::Code))
        );
        assert_eq!(
            "Estudiantes - Identificación".parse(),
            Ok(Reference::Students(StudentKey::Identification))
        );
        assert_eq!("Participantes".parse(), Ok(Reference::Participants));
        assert_eq!(
            "Maestria - Codigo".parse(),
            Ok(Reference::Table {
                table: "Maestria".to_string(),
                column: "Codigo".to_string()
            })
        );
        assert_eq!(
            "Maestria".parse::<Reference>(),
            Err(ReferenceParseError::Malformed("Maestria".to_string()))
        );
    }

    #[test]
    fn numeric_columns_match_text_candidates() {
        let allow = AllowList::from_values(&[json!(101), json!(202), json!("303")]);
        assert!(allow.is_numeric());
        assert!(allow.contains(&json!("101")));
        assert!(allow.contains(&json!(" 202 ")));
        assert!(allow.contains(&json!(303.0)));
        assert!(!allow.contains(&json!("404")));
    }

    #[test]
    fn text_columns_match_numeric_candidates() {
        let allow = AllowList::from_values(&[json!("A1"), json!(" 77 "), json!("B2")]);
        assert!(!allow.is_numeric());
        assert!(allow.contains(&json!(77)));
        assert!(allow.contains(&json!("A1 ")));
        assert!(!allow.contains(&json!("a1")));
    }

    #[test]
    fn missing_table_and_missing_column_are_distinct() {
        let source = MemorySource::default().with_table("Maestria", "Nombre", vec![json!("MBA")]);

        let missing_table = Reference::Table {
            table: "Doctorado".to_string(),
            column: "Codigo".to_string(),
        };
        assert_eq!(
            resolve(&source, &missing_table),
            Err(LookupError::TableNotFound("Doctorado".to_string()))
        );

        let missing_column = Reference::Table {
            table: "Maestria".to_string(),
            column: "Codigo".to_string(),
        };
        assert_eq!(
            resolve(&source, &missing_column),
            Err(LookupError::ColumnNotFound {
                table: "Maestria".to_string(),
                column: "Codigo".to_string()
            })
        );
    }

    #[test]
    fn participants_are_members_and_students() {
        let source = MemorySource {
            members: vec!["1001".to_string()],
            students: vec![("S-1".to_string(), "2002".to_string())],
            ..MemorySource::default()
        };
        let allow = resolve(&source, &Reference::Participants).unwrap();
        assert!(allow.contains(&json!(1001)));
        assert!(allow.contains(&json!("2002")));
        assert!(!allow.contains(&json!("S-1")));

        let codes = resolve(&source, &Reference::Students(StudentKey::Code)).unwrap();
        assert!(codes.contains(&json!("S-1")));
    }

    #[test]
    fn reserved_options_render_with_separator() {
        let names: Vec<_> = reserved_options().into_iter().map(|o| o.name).collect();
        assert_eq!(
            names,
            vec![
                "Funcionarios - Identificación",
                "Estudiantes - Código",
                "Estudiantes - Identificación",
                "Participantes - Identificación"
            ]
        );
    }
}
