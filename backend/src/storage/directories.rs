//! The institutional directories: staff members and students.
//!
//! Both are replaced wholesale by an import; there is no per-entry editing.
//! [`SqliteSource`] exposes them, together with the validator tables, to the
//! reference resolver.

use crate::engine::reference::ReferenceSource;
use crate::storage::StoreError;
use crate::storage::validators::get_validator;
use common::model::directory::Student;
use common::model::validator::ValidatorTable;
use rusqlite::{Connection, params};

pub fn replace_members(conn: &mut Connection, identifications: &[String]) -> Result<usize, StoreError> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM members", [])?;
    {
        let mut stmt = tx.prepare("INSERT OR IGNORE INTO members (identification) VALUES (?1)")?;
        for identification in identifications {
            stmt.execute(params![identification.trim()])?;
        }
    }
    let count = tx.query_row("SELECT COUNT(*) FROM members", [], |row| row.get::<_, i64>(0))?;
    tx.commit()?;
    Ok(count as usize)
}

pub fn replace_students(conn: &mut Connection, students: &[Student]) -> Result<usize, StoreError> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM students", [])?;
    {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO students (code, identification) VALUES (?1, ?2)
            ON CONFLICT(code) DO UPDATE SET identification = excluded.identification
            "#,
        )?;
        for student in students {
            stmt.execute(params![student.code.trim(), student.identification.trim()])?;
        }
    }
    let count = tx.query_row("SELECT COUNT(*) FROM students", [], |row| row.get::<_, i64>(0))?;
    tx.commit()?;
    Ok(count as usize)
}

fn text_column(conn: &Connection, sql: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let values = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values)
}

/// Reference data backed by the store.
pub struct SqliteSource<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteSource<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl ReferenceSource for SqliteSource<'_> {
    type Error = StoreError;

    fn validator_table(&self, name: &str) -> Result<Option<ValidatorTable>, StoreError> {
        get_validator(self.conn, name)
    }

    fn member_identifications(&self) -> Result<Vec<String>, StoreError> {
        text_column(self.conn, "SELECT identification FROM members")
    }

    fn student_codes(&self) -> Result<Vec<String>, StoreError> {
        text_column(self.conn, "SELECT code FROM students")
    }

    fn student_identifications(&self) -> Result<Vec<String>, StoreError> {
        text_column(self.conn, "SELECT DISTINCT identification FROM students")
    }
}
