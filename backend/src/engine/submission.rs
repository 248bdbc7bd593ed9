//! Evaluation of a submitted batch against a template.
//!
//! The batch first has to carry the right columns: every required field and
//! nothing the template does not declare. Only then are references resolved
//! (once per distinct `validate_with`) and each field validated. Columns are
//! independent of each other, so they are normalized and validated in
//! parallel.
//!
//! The verdict is either the column table ready to be stored or the reports of
//! every failing column. Nothing here touches storage.

use crate::engine::cell::{Normalized, normalize};
use crate::engine::column::{Admissible, validate_column};
use crate::engine::reference::{AllowList, LookupError, Reference, ReferenceSource, resolve};
use crate::engine::table::{ColumnTable, TableError, column_of, submitted_columns};
use common::model::field::Field;
use common::model::report::{ColumnErrors, ErrorClass, RowError};
use common::requests::Row;
use log::{debug, info};
use rayon::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

const MISSING_COLUMNS: &str = "Columnas faltantes";
const NOT_FOUND: &str = "No encontrada";

/// Submitted columns that do not line up with the template fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMismatch {
    /// Required fields absent from the batch.
    pub missing: Vec<String>,
    /// Batch columns the template does not declare.
    pub unknown: Vec<String>,
    pub submitted: Vec<String>,
    pub declared: Vec<String>,
}

impl ColumnMismatch {
    pub fn report(&self) -> Vec<ColumnErrors> {
        let mut report = Vec::new();
        if !self.missing.is_empty() {
            report.push(ColumnErrors {
                column: MISSING_COLUMNS.to_string(),
                class: ErrorClass::Structural,
                errors: self
                    .missing
                    .iter()
                    .map(|name| RowError {
                        register: Some(1),
                        value: NOT_FOUND.to_string(),
                        message: format!(
                            "La columna '{}' no se encontró en el archivo. Sus columnas actuales: [{}]. Debe ser exactamente: '{}'",
                            name,
                            self.submitted.join(", "),
                            name
                        ),
                    })
                    .collect(),
            });
        }
        for name in &self.unknown {
            report.push(ColumnErrors {
                column: format!("Columna desconocida ({name})"),
                class: ErrorClass::Structural,
                errors: vec![RowError {
                    register: Some(1),
                    value: name.clone(),
                    message: format!(
                        "La columna '{}' no pertenece a esta plantilla. Elimine esta columna. Columnas válidas: [{}]",
                        name,
                        self.declared.join(", ")
                    ),
                }],
            });
        }
        report
    }
}

#[derive(Debug, Error)]
pub enum StructuralError {
    #[error("la carga no contiene filas")]
    NoRows,
    #[error("las columnas del archivo no coinciden con la plantilla")]
    ColumnMismatch(ColumnMismatch),
    #[error(transparent)]
    Table(#[from] TableError),
}

impl StructuralError {
    pub fn report(&self) -> Vec<ColumnErrors> {
        match self {
            StructuralError::ColumnMismatch(mismatch) => mismatch.report(),
            other => vec![ColumnErrors {
                column: String::new(),
                class: ErrorClass::Structural,
                errors: vec![RowError {
                    register: None,
                    value: String::new(),
                    message: other.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted(ColumnTable),
    /// Reports of the failing columns only.
    Rejected(Vec<ColumnErrors>),
}

pub fn check_columns(fields: &[Field], submitted: &[String]) -> Result<(), ColumnMismatch> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|f| f.required && !submitted.contains(&f.name))
        .map(|f| f.name.clone())
        .collect();
    let unknown: Vec<String> = submitted
        .iter()
        .filter(|name| !fields.iter().any(|f| &f.name == *name))
        .cloned()
        .collect();

    if missing.is_empty() && unknown.is_empty() {
        return Ok(());
    }
    Err(ColumnMismatch {
        missing,
        unknown,
        submitted: submitted.to_vec(),
        declared: fields.iter().map(|f| f.name.clone()).collect(),
    })
}

/// Resolves each distinct reference used by `fields` once.
pub fn resolve_references<S: ReferenceSource>(
    fields: &[Field],
    source: &S,
) -> HashMap<String, Result<AllowList, LookupError>> {
    let mut lookups = HashMap::new();
    for raw in fields.iter().filter_map(|f| f.validate_with.as_deref()) {
        if lookups.contains_key(raw) {
            continue;
        }
        let resolved = raw
            .parse::<Reference>()
            .map_err(LookupError::from)
            .and_then(|reference| resolve(source, &reference));
        if let Ok(allow) = &resolved {
            debug!("reference '{}' resolved to {} values", raw, allow.len());
        }
        lookups.insert(raw.to_string(), resolved);
    }
    lookups
}

pub fn evaluate<S: ReferenceSource>(
    fields: &[Field],
    rows: &[Row],
    source: &S,
) -> Result<Verdict, StructuralError> {
    if rows.is_empty() {
        return Err(StructuralError::NoRows);
    }
    check_columns(fields, &submitted_columns(rows)).map_err(StructuralError::ColumnMismatch)?;

    let lookups = resolve_references(fields, source);

    let outcomes: Vec<(ColumnErrors, Vec<Value>)> = fields
        .par_iter()
        .map(|field| {
            let cells: Vec<Normalized> = column_of(rows, &field.name)
                .iter()
                .map(|raw| normalize(raw, field))
                .collect();
            let admissible = match field.validate_with.as_deref().and_then(|r| lookups.get(r)) {
                None => Admissible::Any,
                Some(Ok(allow)) => Admissible::Within(allow),
                Some(Err(lookup)) => Admissible::Unresolved(lookup),
            };
            let report = validate_column(field, &cells, admissible);
            let stored = cells.into_iter().map(Normalized::into_stored).collect();
            (report, stored)
        })
        .collect();

    let failures: Vec<ColumnErrors> = outcomes
        .iter()
        .filter(|(report, _)| !report.status())
        .map(|(report, _)| report.clone())
        .collect();
    if !failures.is_empty() {
        info!(
            "batch of {} rows rejected: {} columns with errors",
            rows.len(),
            failures.len()
        );
        return Ok(Verdict::Rejected(failures));
    }

    let mut table = ColumnTable::new(rows.len());
    for (field, (_, stored)) in fields.iter().zip(outcomes) {
        table.push(field.name.clone(), stored)?;
    }
    Ok(Verdict::Accepted(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{MemorySource, field};
    use common::model::field::Datatype;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Row> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect()
    }

    fn edad_roles() -> Vec<Field> {
        vec![
            field("edad", Datatype::Integer, true, false),
            field("roles", Datatype::ShortText, false, true),
        ]
    }

    #[test]
    fn accepted_batch_keeps_one_value_per_row_in_every_column() {
        let batch = rows(json!([
            {"edad": "30", "roles": "A,B"},
            {"edad": 41, "roles": ""}
        ]));
        let Verdict::Accepted(table) = evaluate(&edad_roles(), &batch, &MemorySource::default()).unwrap() else {
            panic!("batch should be accepted");
        };
        assert_eq!(table.row_count(), 2);
        assert!(table.columns().iter().all(|c| c.values.len() == 2));
        assert_eq!(table.columns()[0].values, vec![json!(30), json!(41)]);
        assert_eq!(table.columns()[1].values, vec![json!(["A", "B"]), json!([])]);
    }

    #[test]
    fn required_empty_cell_is_reported_with_its_register() {
        let batch = rows(json!([
            {"edad": "30", "roles": "A,B"},
            {"edad": "", "roles": ""}
        ]));
        let Verdict::Rejected(report) = evaluate(&edad_roles(), &batch, &MemorySource::default()).unwrap() else {
            panic!("batch should be rejected");
        };
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].column, "edad");
        assert_eq!(report[0].errors.len(), 1);
        assert_eq!(report[0].errors[0].register, Some(2));
    }

    #[test]
    fn errors_from_all_columns_come_back_together() {
        let fields = vec![
            field("a", Datatype::Integer, true, false),
            field("b", Datatype::Boolean, true, false),
            field("c", Datatype::Link, true, false),
        ];
        let batch = rows(json!([
            {"a": "uno", "b": true, "c": "https://ok.org"},
            {"a": 2, "b": "si", "c": "no es enlace"}
        ]));
        let Verdict::Rejected(report) = evaluate(&fields, &batch, &MemorySource::default()).unwrap() else {
            panic!("batch should be rejected");
        };
        let columns: Vec<_> = report.iter().map(|r| r.column.as_str()).collect();
        assert_eq!(columns, vec!["a", "b", "c"]);
    }

    #[test]
    fn missing_required_and_unknown_columns_are_structural() {
        let fields = edad_roles();
        let batch = rows(json!([{"roles": "A", "Edad ": 3}]));
        let Err(StructuralError::ColumnMismatch(mismatch)) =
            evaluate(&fields, &batch, &MemorySource::default())
        else {
            panic!("expected a column mismatch");
        };
        assert_eq!(mismatch.missing, vec!["edad"]);
        assert_eq!(mismatch.unknown, vec!["Edad "]);

        let report = mismatch.report();
        assert_eq!(report.len(), 2);
        assert!(report.iter().all(|r| r.class == ErrorClass::Structural));
        assert!(report[0].errors[0].message.contains("Debe ser exactamente: 'edad'"));
        assert!(report[0].errors[0].message.contains("Sus columnas actuales: [roles, Edad ]"));
    }

    #[test]
    fn optional_columns_may_be_left_out() {
        let batch = rows(json!([{"edad": 5}]));
        let Verdict::Accepted(table) = evaluate(&edad_roles(), &batch, &MemorySource::default()).unwrap() else {
            panic!("batch should be accepted");
        };
        assert_eq!(table.columns()[1].values, vec![json!([])]);
    }

    #[test]
    fn empty_batch_is_structural() {
        assert!(matches!(
            evaluate(&edad_roles(), &[], &MemorySource::default()),
            Err(StructuralError::NoRows)
        ));
    }

    #[test]
    fn lookup_failure_is_confined_to_its_column() {
        let mut programa = field("programa", Datatype::ShortText, true, false);
        programa.validate_with = Some("Maestria - Codigo".to_string());
        let fields = vec![programa, field("edad", Datatype::Integer, true, false)];
        let source = MemorySource::default().with_table("Maestria", "Nombre", vec![json!("MBA")]);
        let batch = rows(json!([{"programa": "MBA", "edad": "x"}]));

        let Verdict::Rejected(report) = evaluate(&fields, &batch, &source).unwrap() else {
            panic!("batch should be rejected");
        };
        assert_eq!(report[0].class, ErrorClass::Lookup);
        assert!(report[0].errors[0].message.contains("'Codigo'"));
        assert_eq!(report[1].class, ErrorClass::Content);
        assert_eq!(report[1].column, "edad");
    }

    #[test]
    fn unreachable_directory_is_a_lookup_error() {
        let mut id = field("id", Datatype::Integer, true, false);
        id.validate_with = Some("Funcionarios - Identificación".to_string());
        let source = MemorySource {
            unreachable: true,
            ..MemorySource::default()
        };
        let batch = rows(json!([{"id": 1}]));
        let Verdict::Rejected(report) = evaluate(&[id], &batch, &source).unwrap() else {
            panic!("batch should be rejected");
        };
        assert_eq!(report[0].class, ErrorClass::Lookup);
    }
}
