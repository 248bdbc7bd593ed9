use crate::storage::{StoreError, format_timestamp, parse_timestamp};
use common::model::report::ValidationLog;
use rusqlite::{Connection, params};

/// Appends a rejection to the validation log. Entries are never updated.
pub fn insert_log(conn: &Connection, log: &ValidationLog) -> Result<(), StoreError> {
    conn.execute(
        r#"
        INSERT INTO validation_logs (published_id, user_json, date, errors_json)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![
            &log.published_template,
            serde_json::to_string(&log.user)?,
            format_timestamp(log.date)?,
            serde_json::to_string(&log.errors)?
        ],
    )?;
    Ok(())
}

/// Log entries of one published template, oldest first.
pub fn logs_for(conn: &Connection, published_id: &str) -> Result<Vec<ValidationLog>, StoreError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT user_json, date, errors_json
        FROM validation_logs
        WHERE published_id = ?1
        ORDER BY id
        "#,
    )?;
    let rows = stmt
        .query_map(params![published_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(user, date, errors)| -> Result<ValidationLog, StoreError> {
            Ok(ValidationLog {
                user: serde_json::from_str(&user)?,
                published_template: published_id.to_string(),
                date: parse_timestamp(&date)?,
                errors: serde_json::from_str(&errors)?,
            })
        })
        .collect()
}
