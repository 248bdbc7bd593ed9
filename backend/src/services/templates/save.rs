use crate::engine::reference::Reference;
use crate::services::{run_blocking, ApiError, AppState};
use crate::storage::templates::save_template;
use actix_web::{web, HttpResponse, Responder};
use common::model::template::Template;
use log::info;
use std::collections::HashSet;

pub async fn process(state: web::Data<AppState>, payload: web::Json<Template>) -> impl Responder {
    let template = match check_template(payload.into_inner()) {
        Ok(template) => template,
        Err(e) => return e.response(),
    };
    let id = template.id.clone();
    match run_blocking(&state.store, move |conn| Ok(save_template(conn, &template)?)).await {
        Ok(()) => {
            info!("template '{id}' saved");
            HttpResponse::Ok().body("Template guardado correctamente")
        }
        Err(e) => e.response(),
    }
}

/// Refuses templates the engine could not evaluate and normalizes blank references away.
pub fn check_template(mut template: Template) -> Result<Template, ApiError> {
    if template.id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "El id del template no puede estar vacío".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for field in &mut template.fields {
        if field.name.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Los campos deben tener nombre".to_string(),
            ));
        }
        if !names.insert(field.name.clone()) {
            return Err(ApiError::BadRequest(format!(
                "El campo '{}' está repetido",
                field.name
            )));
        }
        if field.validate_with.as_deref().is_some_and(|r| r.trim().is_empty()) {
            field.validate_with = None;
        }
        if let Some(reference) = &field.validate_with {
            reference
                .parse::<Reference>()
                .map_err(|e| ApiError::BadRequest(format!("Campo '{}': {}", field.name, e)))?;
        }
    }
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::field;
    use common::model::field::Datatype;

    fn template(fields: Vec<common::model::field::Field>) -> Template {
        Template {
            id: "t1".to_string(),
            name: "Matriculados".to_string(),
            fields,
            producers: vec![],
        }
    }

    #[test]
    fn duplicate_field_names_are_refused() {
        let result = check_template(template(vec![
            field("edad", Datatype::Integer, true, false),
            field("edad", Datatype::Decimal, false, false),
        ]));
        assert!(matches!(result, Err(ApiError::BadRequest(m)) if m.contains("edad")));
    }

    #[test]
    fn blank_references_are_dropped_and_malformed_ones_refused() {
        let mut blank = field("programa", Datatype::ShortText, true, false);
        blank.validate_with = Some("  ".to_string());
        let checked = check_template(template(vec![blank])).unwrap();
        assert_eq!(checked.fields[0].validate_with, None);

        let mut malformed = field("programa", Datatype::ShortText, true, false);
        malformed.validate_with = Some("Maestria".to_string());
        assert!(check_template(template(vec![malformed])).is_err());
    }
}
