//! Published templates and the per-dependency data loaded into them.
//!
//! Every write to a published template's loaded data runs in one immediate
//! transaction that also bumps the template's `revision`. Writers pass the
//! revision they read; a different revision at write time means someone else
//! wrote in between and the write is refused with
//! [`StoreError::RevisionMismatch`].

use crate::engine::table::check_filled;
use crate::storage::templates::get_template;
use crate::storage::{StoreError, format_timestamp, parse_day, parse_timestamp};
use common::model::loaded_data::LoadedData;
use common::model::published::PublishedTemplate;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use time::{Date, OffsetDateTime};

/// Publishes a template for `period`. The instance keeps a copy of the template
/// as it is now; later saves of the template do not reach it.
pub fn publish(
    conn: &Connection,
    template_id: &str,
    period: &str,
    deadline: Date,
) -> Result<String, StoreError> {
    let template = get_template(conn, template_id)?;

    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        r#"
        INSERT INTO published_templates (id, template_id, template_json, period, deadline, published_date, revision)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)
        "#,
        params![
            &id,
            template_id,
            serde_json::to_string(&template)?,
            period,
            deadline.to_string(),
            format_timestamp(OffsetDateTime::now_utc())?
        ],
    )?;
    Ok(id)
}

/// Moves the deadline of several instances at once. Returns how many exist.
pub fn update_deadlines(
    conn: &mut Connection,
    published_ids: &[String],
    deadline: Date,
) -> Result<usize, StoreError> {
    let tx = conn.transaction()?;
    let mut updated = 0;
    for id in published_ids {
        updated += tx.execute(
            "UPDATE published_templates SET deadline = ?2 WHERE id = ?1",
            params![id, deadline.to_string()],
        )?;
    }
    tx.commit()?;
    Ok(updated)
}

pub fn get_published(conn: &Connection, published_id: &str) -> Result<PublishedTemplate, StoreError> {
    let row = conn
        .query_row(
            r#"
            SELECT template_json, period, deadline, published_date, revision
            FROM published_templates
            WHERE id = ?1
            "#,
            params![published_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((template, period, deadline, published_date, revision)) = row else {
        return Err(StoreError::NotFound(format!(
            "published template '{published_id}'"
        )));
    };

    Ok(PublishedTemplate {
        id: published_id.to_string(),
        template: serde_json::from_str(&template)?,
        period,
        deadline: parse_day(&deadline)?,
        published_date: parse_timestamp(&published_date)?,
        revision,
        loaded_data: loaded_data(conn, published_id)?,
    })
}

fn loaded_data(conn: &Connection, published_id: &str) -> Result<Vec<LoadedData>, StoreError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT dependency, send_by_json, loaded_date, filled_data_json
        FROM loaded_data
        WHERE published_id = ?1
        ORDER BY slot
        "#,
    )?;
    let rows = stmt
        .query_map(params![published_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(dependency, send_by, loaded_date, filled_data)| -> Result<LoadedData, StoreError> {
            let filled_data: Vec<_> = serde_json::from_str(&filled_data)?;
            check_filled(&filled_data)?;
            Ok(LoadedData {
                dependency,
                send_by: serde_json::from_str(&send_by)?,
                loaded_date: parse_timestamp(&loaded_date)?,
                filled_data,
            })
        })
        .collect()
}

/// Stores `data` as the dependency's submission, replacing any previous one in
/// its slot or appending a new slot. Returns the new revision.
pub fn replace_loaded_data(
    conn: &mut Connection,
    published_id: &str,
    expected_revision: i64,
    data: &LoadedData,
) -> Result<i64, StoreError> {
    check_filled(&data.filled_data)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let revision = checked_revision(&tx, published_id, expected_revision)?;

    let existing_slot: Option<i64> = tx
        .query_row(
            "SELECT slot FROM loaded_data WHERE published_id = ?1 AND dependency = ?2",
            params![published_id, &data.dependency],
            |row| row.get(0),
        )
        .optional()?;
    let slot = match existing_slot {
        Some(slot) => slot,
        None => next_slot(&tx, published_id)?,
    };

    tx.execute(
        r#"
        INSERT INTO loaded_data (published_id, dependency, slot, send_by_json, loaded_date, filled_data_json)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(published_id, dependency) DO UPDATE SET
          send_by_json = excluded.send_by_json,
          loaded_date = excluded.loaded_date,
          filled_data_json = excluded.filled_data_json
        "#,
        params![
            published_id,
            &data.dependency,
            slot,
            serde_json::to_string(&data.send_by)?,
            format_timestamp(data.loaded_date)?,
            serde_json::to_string(&data.filled_data)?
        ],
    )?;

    let new_revision = bump_revision(&tx, published_id, revision)?;
    tx.commit()?;
    Ok(new_revision)
}

/// Records a submission with no rows. Refused if the dependency already has data.
pub fn insert_empty_loaded_data(
    conn: &mut Connection,
    published_id: &str,
    expected_revision: i64,
    data: &LoadedData,
) -> Result<i64, StoreError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let revision = checked_revision(&tx, published_id, expected_revision)?;

    let exists: Option<i64> = tx
        .query_row(
            "SELECT slot FROM loaded_data WHERE published_id = ?1 AND dependency = ?2",
            params![published_id, &data.dependency],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_some() {
        return Err(StoreError::Conflict("Data already exists".to_string()));
    }

    let slot = next_slot(&tx, published_id)?;
    tx.execute(
        r#"
        INSERT INTO loaded_data (published_id, dependency, slot, send_by_json, loaded_date, filled_data_json)
        VALUES (?1, ?2, ?3, ?4, ?5, '[]')
        "#,
        params![
            published_id,
            &data.dependency,
            slot,
            serde_json::to_string(&data.send_by)?,
            format_timestamp(data.loaded_date)?
        ],
    )?;

    let new_revision = bump_revision(&tx, published_id, revision)?;
    tx.commit()?;
    Ok(new_revision)
}

pub fn delete_loaded_data(
    conn: &mut Connection,
    published_id: &str,
    dependency: &str,
) -> Result<i64, StoreError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let revision = current_revision(&tx, published_id)?;

    let deleted = tx.execute(
        "DELETE FROM loaded_data WHERE published_id = ?1 AND dependency = ?2",
        params![published_id, dependency],
    )?;
    if deleted == 0 {
        return Err(StoreError::NotFound(format!(
            "data of '{dependency}' in '{published_id}'"
        )));
    }

    let new_revision = bump_revision(&tx, published_id, revision)?;
    tx.commit()?;
    Ok(new_revision)
}

fn current_revision(tx: &Transaction<'_>, published_id: &str) -> Result<i64, StoreError> {
    tx.query_row(
        "SELECT revision FROM published_templates WHERE id = ?1",
        params![published_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(format!("published template '{published_id}'")))
}

fn checked_revision(
    tx: &Transaction<'_>,
    published_id: &str,
    expected: i64,
) -> Result<i64, StoreError> {
    let actual = current_revision(tx, published_id)?;
    if actual != expected {
        return Err(StoreError::RevisionMismatch { expected, actual });
    }
    Ok(actual)
}

fn next_slot(tx: &Transaction<'_>, published_id: &str) -> Result<i64, StoreError> {
    Ok(tx.query_row(
        "SELECT COALESCE(MAX(slot), -1) + 1 FROM loaded_data WHERE published_id = ?1",
        params![published_id],
        |row| row.get(0),
    )?)
}

fn bump_revision(tx: &Transaction<'_>, published_id: &str, revision: i64) -> Result<i64, StoreError> {
    let new_revision = revision + 1;
    tx.execute(
        "UPDATE published_templates SET revision = ?2 WHERE id = ?1",
        params![published_id, new_revision],
    )?;
    Ok(new_revision)
}
