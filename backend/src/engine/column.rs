//! Validation of one template field against its column of normalized cells.
//!
//! Every row is evaluated and every defect is reported; nothing short-circuits
//! across rows. Within a row:
//!
//! - an empty cell of an optional field is skipped entirely;
//! - an empty cell of a required field yields exactly one "empty" error;
//! - otherwise each element is type-checked and, when the field has a
//!   reference, tested against the resolved allow-list.

use crate::engine::cell::Normalized;
use crate::engine::reference::{AllowList, LookupError};
use crate::engine::type_rules;
use common::model::field::Field;
use common::model::report::{ColumnErrors, ErrorClass, NO_VALUE, RowError};
use log::error;
use serde_json::Value;

/// What the field's reference admits.
#[derive(Debug, Clone, Copy)]
pub enum Admissible<'a> {
    /// The field has no reference.
    Any,
    Within(&'a AllowList),
    /// The reference could not be resolved; the column cannot be validated.
    Unresolved(&'a LookupError),
}

pub fn validate_column(field: &Field, cells: &[Normalized], admissible: Admissible<'_>) -> ColumnErrors {
    let reference = field.validate_with.as_deref().unwrap_or_default();

    if let Admissible::Unresolved(lookup) = admissible {
        error!(
            "lookup configuration error on column '{}' ({}): {}",
            field.name, reference, lookup
        );
        return ColumnErrors {
            column: field.name.clone(),
            class: ErrorClass::Lookup,
            errors: vec![RowError {
                register: None,
                value: if reference.is_empty() { NO_VALUE.to_string() } else { reference.to_string() },
                message: lookup.to_string(),
            }],
        };
    }

    let mut errors = Vec::new();
    for (index, cell) in cells.iter().enumerate() {
        let register = index + 1;

        if cell.is_empty() {
            if field.required {
                errors.push(RowError {
                    register: Some(register),
                    value: NO_VALUE.to_string(),
                    message: format!(
                        "Valor vacío encontrado en la columna {}, fila {}",
                        field.name, register
                    ),
                });
            }
            continue;
        }

        for element in cell.elements() {
            if let Err(reason) = type_rules::check(field.datatype, element) {
                errors.push(RowError {
                    register: Some(register),
                    value: display(element),
                    message: format!(
                        "Valor inválido encontrado en la columna {}, fila {}: {}",
                        field.name, register, reason
                    ),
                });
            }
        }

        if let Admissible::Within(allow) = admissible {
            for element in cell.elements() {
                if !allow.contains(element) {
                    errors.push(RowError {
                        register: Some(register),
                        value: display(element),
                        message: format!(
                            "Valor de la columna {}, fila {} no fue encontrado en la validación: {}",
                            field.name, register, reference
                        ),
                    });
                }
            }
        }
    }

    ColumnErrors {
        column: field.name.clone(),
        class: ErrorClass::Content,
        errors,
    }
}

/// Text used for an offending cell in error reports.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => NO_VALUE.to_string(),
        Value::String(s) if s.is_empty() => NO_VALUE.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cell::normalize;
    use crate::engine::testing::field;
    use common::model::field::Datatype;
    use serde_json::json;

    fn cells(f: &Field, raw: &[Value]) -> Vec<Normalized> {
        raw.iter().map(|v| normalize(v, f)).collect()
    }

    #[test]
    fn optional_empty_cells_skip_type_and_reference_checks() {
        let mut f = field("codigo", Datatype::Integer, false, false);
        f.validate_with = Some("Programas - Codigo".to_string());
        let allow = AllowList::from_values(&[json!(1)]);

        let report = validate_column(
            &f,
            &cells(&f, &[json!(""), json!("null"), json!("   "), json!(null)]),
            Admissible::Within(&allow),
        );
        assert!(report.status());
        assert_eq!(report.class, ErrorClass::Content);
    }

    #[test]
    fn required_empty_cells_raise_exactly_one_error() {
        let mut f = field("codigo", Datatype::Integer, true, false);
        f.validate_with = Some("Programas - Codigo".to_string());
        let allow = AllowList::from_values(&[json!(1)]);

        let report = validate_column(&f, &cells(&f, &[json!(1), json!("")]), Admissible::Within(&allow));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].register, Some(2));
        assert_eq!(report.errors[0].value, NO_VALUE);
        assert!(report.errors[0].message.starts_with("Valor vacío"));
    }

    #[test]
    fn every_row_and_element_is_reported() {
        let f = field("notas", Datatype::Percentage, true, true);
        let report = validate_column(
            &f,
            &cells(&f, &[json!("10, 200"), json!("50"), json!("x, 101")]),
            Admissible::Any,
        );
        let registers: Vec<_> = report.errors.iter().map(|e| e.register).collect();
        assert_eq!(registers, vec![Some(1), Some(3), Some(3)]);
        assert_eq!(report.errors[0].value, "200");
        assert!(!report.status());
    }

    #[test]
    fn reference_misses_name_the_reference() {
        let mut f = field("programa", Datatype::ShortText, true, false);
        f.validate_with = Some("Programas - Nombre".to_string());
        let allow = AllowList::from_values(&[json!("Fisica")]);

        let report = validate_column(
            &f,
            &cells(&f, &[json!("Fisica"), json!("Quimica")]),
            Admissible::Within(&allow),
        );
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].register, Some(2));
        assert!(report.errors[0].message.ends_with("Programas - Nombre"));
    }

    #[test]
    fn unresolved_reference_is_a_lookup_error_for_the_column() {
        let mut f = field("programa", Datatype::ShortText, true, false);
        f.validate_with = Some("Maestria - Codigo".to_string());
        let lookup = LookupError::ColumnNotFound {
            table: "Maestria".to_string(),
            column: "Codigo".to_string(),
        };

        let report = validate_column(&f, &cells(&f, &[json!("x")]), Admissible::Unresolved(&lookup));
        assert_eq!(report.class, ErrorClass::Lookup);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].register, None);
        assert!(report.errors[0].message.contains("Codigo"));
    }
}
