use crate::storage::StoreError;
use common::model::validator::ValidatorTable;
use rusqlite::{Connection, OptionalExtension, params};

/// Stores a validator table, replacing one with the same name.
///
/// Callers are expected to have run [`ValidatorTable::check`] first.
pub fn save_validator(conn: &Connection, table: &ValidatorTable) -> Result<(), StoreError> {
    conn.execute(
        r#"
        INSERT INTO validators (name, columns_json)
        VALUES (?1, ?2)
        ON CONFLICT(name) DO UPDATE SET columns_json = excluded.columns_json
        "#,
        params![&table.name, serde_json::to_string(&table.columns)?],
    )?;
    Ok(())
}

pub fn get_validator(conn: &Connection, name: &str) -> Result<Option<ValidatorTable>, StoreError> {
    let columns_json: Option<String> = conn
        .query_row(
            "SELECT columns_json FROM validators WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;

    columns_json
        .map(|json| -> Result<ValidatorTable, StoreError> {
            Ok(ValidatorTable {
                name: name.to_string(),
                columns: serde_json::from_str(&json)?,
            })
        })
        .transpose()
}

pub fn list_validators(conn: &Connection) -> Result<Vec<ValidatorTable>, StoreError> {
    let mut stmt = conn.prepare("SELECT name, columns_json FROM validators ORDER BY name")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(name, json)| -> Result<ValidatorTable, StoreError> {
            Ok(ValidatorTable {
                name,
                columns: serde_json::from_str(&json)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::temp_store;
    use common::model::field::Datatype;
    use common::model::validator::ValidatorColumn;
    use serde_json::json;

    fn programas(codes: Vec<serde_json::Value>) -> ValidatorTable {
        ValidatorTable {
            name: "Programas".to_string(),
            columns: vec![ValidatorColumn {
                name: "Codigo".to_string(),
                datatype: Datatype::Integer,
                is_validator: true,
                values: codes,
            }],
        }
    }

    #[test]
    fn saved_tables_replace_by_name() {
        let (_dir, store) = temp_store();
        let conn = store.connect().unwrap();

        save_validator(&conn, &programas(vec![json!(1)])).unwrap();
        save_validator(&conn, &programas(vec![json!(1), json!(2)])).unwrap();

        let stored = get_validator(&conn, "Programas").unwrap().unwrap();
        assert_eq!(stored.row_count(), 2);
        assert_eq!(list_validators(&conn).unwrap().len(), 1);
        assert!(get_validator(&conn, "Sedes").unwrap().is_none());
    }
}
