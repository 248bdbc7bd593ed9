use crate::storage::StoreError;
use common::model::template::Template;
use rusqlite::{Connection, OptionalExtension, params};

/// Inserts or updates a template. Published instances keep pointing at it.
pub fn save_template(conn: &Connection, template: &Template) -> Result<(), StoreError> {
    conn.execute(
        r#"
        INSERT INTO templates (id, name, fields_json, producers_json)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(id) DO UPDATE SET
          name = excluded.name,
          fields_json = excluded.fields_json,
          producers_json = excluded.producers_json
        "#,
        params![
            &template.id,
            &template.name,
            serde_json::to_string(&template.fields)?,
            serde_json::to_string(&template.producers)?
        ],
    )?;
    Ok(())
}

pub fn get_template(conn: &Connection, template_id: &str) -> Result<Template, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, name, fields_json, producers_json FROM templates WHERE id = ?1",
            params![template_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((id, name, fields_json, producers_json)) = row else {
        return Err(StoreError::NotFound(format!("template '{template_id}'")));
    };

    // Fails with the offending name if a stored datatype is outside the closed set.
    let fields = serde_json::from_str(&fields_json)?;
    Ok(Template {
        id,
        name,
        fields,
        producers: serde_json::from_str(&producers_json)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::field;
    use crate::storage::test_support::temp_store;
    use common::model::field::Datatype;

    #[test]
    fn saves_and_replaces_templates() {
        let (_dir, store) = temp_store();
        let conn = store.connect().unwrap();

        let mut template = Template {
            id: "t1".to_string(),
            name: "Matriculados".to_string(),
            fields: vec![field("edad", Datatype::Integer, true, false)],
            producers: vec!["D01".to_string()],
        };
        save_template(&conn, &template).unwrap();
        template.fields.push(field("roles", Datatype::ShortText, false, true));
        save_template(&conn, &template).unwrap();

        assert_eq!(get_template(&conn, "t1").unwrap(), template);
        assert!(matches!(
            get_template(&conn, "nope"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn unknown_stored_datatype_surfaces_as_an_error() {
        let (_dir, store) = temp_store();
        let conn = store.connect().unwrap();
        conn.execute(
            "INSERT INTO templates VALUES ('t2', 'x', '[{\"name\":\"a\",\"datatype\":\"Moneda\"}]', '[]')",
            [],
        )
        .unwrap();

        let err = get_template(&conn, "t2").unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
        assert!(err.to_string().contains("Moneda"));
    }
}
