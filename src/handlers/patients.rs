//! Patient list plus the personal-data edit page.

use super::{blocking, finish, list_page, submit_form, take_flash};
use crate::access::{self, Operation, Resource};
use crate::app::AppState;
use crate::auth::Session;
use crate::db::patients::{NewPatient, PatientPatch, Patients};
use crate::db::{Command, Table};
use crate::error::AppResult;
use crate::forms::{self, Action};
use axum::{
    extract::{Path, State},
    response::Response,
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};
use time::Date;

#[derive(Debug, Default, Deserialize)]
pub struct PatientForm {
    pub action: Option<String>,
    pub fio: Option<String>,
    pub birthdate: Option<String>,
    pub disease_id: Option<String>,
    pub department_id: Option<String>,
    pub id_patient: Option<String>,
}

/// Body of `POST /patients/:id/edit`.
#[derive(Debug, Default, Deserialize)]
pub struct PatientEditForm {
    pub fio: Option<String>,
    pub birthdate: Option<String>,
}

fn birthdate(raw: Option<&str>) -> AppResult<Option<Date>> {
    forms::date("birthdate", raw)
}

fn disease_id(raw: Option<&str>) -> AppResult<Option<i64>> {
    forms::integer("disease_id", raw)
}

fn department_id(raw: Option<&str>) -> AppResult<Option<i64>> {
    forms::integer("department_id", raw)
}

impl PatientForm {
    pub fn into_command(self) -> AppResult<Command<Patients>> {
        let fio = self.fio.as_deref();
        let born = self.birthdate.as_deref();
        let disease = self.disease_id.as_deref();
        let department = self.department_id.as_deref();

        Ok(match forms::action(self.action.as_deref())? {
            Action::Insert => Command::Insert(NewPatient {
                fio: forms::required("fio", forms::text(fio)?)?,
                birthdate: birthdate(born)?,
                disease_id: disease_id(disease)?,
                department_id: department_id(department)?,
            }),
            Action::Update => Command::Update(
                forms::key("id_patient", self.id_patient.as_deref())?,
                PatientPatch {
                    fio: forms::patch_required("fio", fio, forms::text)?,
                    birthdate: forms::patch(born, birthdate)?,
                    disease_id: forms::patch(disease, disease_id)?,
                    department_id: forms::patch(department, department_id)?,
                },
            ),
            Action::Delete => Command::Delete(forms::key("id_patient", self.id_patient.as_deref())?),
        })
    }
}

impl PatientEditForm {
    /// The edit page always submits both fields, so `fio` is mandatory here.
    pub fn into_patch(self) -> AppResult<PatientPatch> {
        Ok(PatientPatch {
            fio: Some(forms::required("fio", forms::text(self.fio.as_deref())?)?),
            birthdate: forms::patch(self.birthdate.as_deref(), birthdate)?,
            ..PatientPatch::default()
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    list_page::<Patients>(&state, &session, jar, Resource::Patients).await
}

pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Form(form): Form<PatientForm>,
) -> AppResult<Response> {
    submit_form(&state, &session, jar, Resource::Patients, || form.into_command()).await
}

pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    access::require(session.role, Resource::Patients, Operation::Write)?;
    let db = state.db.clone();
    let patient = blocking(move || db.get::<Patients>(id)).await?;
    let (jar, flash) = take_flash(jar);

    Ok((
        jar,
        Json(json!({
            "status": "ok",
            "user": session,
            "patient": patient,
            "fields": ["fio", "birthdate"],
            "flash": flash,
        })),
    ))
}

pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    jar: CookieJar,
    Form(form): Form<PatientEditForm>,
) -> AppResult<Response> {
    access::require(session.role, Resource::Patients, Operation::Write)?;
    // Unknown ids answer 404 instead of bouncing back to a page that cannot load
    let db = state.db.clone();
    blocking(move || db.get::<Patients>(id)).await?;

    let outcome = match form.into_patch() {
        Ok(patch) => {
            let db = state.db.clone();
            blocking(move || db.apply(Command::<Patients>::Update(id, patch), &session)).await
        }
        Err(err) => Err(err),
    };
    match outcome {
        Ok(change) => finish(jar, Resource::Patients.path(), Ok(change.describe(Patients::LABEL))),
        Err(err) => finish(jar, &format!("/patients/{id}/edit"), Err(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use time::macros::date;

    #[test]
    fn edit_form_sets_only_personal_fields() {
        let patch = PatientEditForm {
            fio: Some(" Petrova A.S. ".into()),
            birthdate: Some("1985-03-14".into()),
        }
        .into_patch()
        .unwrap();

        assert_eq!(patch.fio.as_deref(), Some("Petrova A.S."));
        assert_eq!(patch.birthdate, Some(Some(date!(1985 - 03 - 14))));
        assert_eq!(patch.disease_id, None);
        assert_eq!(patch.department_id, None);
    }

    #[test]
    fn edit_form_requires_fio() {
        let err = PatientEditForm::default().into_patch().err().unwrap();
        assert!(matches!(err, AppError::Validation(ref m) if m == "fio is required"));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let form = PatientForm {
            action: Some("drop".into()),
            ..PatientForm::default()
        };
        let err = form.into_command().err().unwrap();
        assert_eq!(err.to_string(), "Unknown action: drop");
    }
}
