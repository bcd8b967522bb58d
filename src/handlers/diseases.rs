//! `/diseases` page.

use super::{list_page, submit_form};
use crate::access::Resource;
use crate::app::AppState;
use crate::auth::Session;
use crate::db::diseases::{DiseasePatch, Diseases, NewDisease};
use crate::db::Command;
use crate::error::AppResult;
use crate::forms::{self, Action};
use axum::{extract::State, response::Response, Form, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct DiseaseForm {
    pub action: Option<String>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub department_id: Option<String>,
    pub id_disease: Option<String>,
}

fn department_id(raw: Option<&str>) -> AppResult<Option<i64>> {
    forms::integer("department_id", raw)
}

impl DiseaseForm {
    pub fn into_command(self) -> AppResult<Command<Diseases>> {
        let code = self.code.as_deref();
        let name = self.name.as_deref();
        let department = self.department_id.as_deref();

        Ok(match forms::action(self.action.as_deref())? {
            Action::Insert => Command::Insert(NewDisease {
                code: forms::required("code", forms::text(code)?)?,
                name: forms::required("name", forms::text(name)?)?,
                department_id: department_id(department)?,
            }),
            Action::Update => Command::Update(
                forms::key("id_disease", self.id_disease.as_deref())?,
                DiseasePatch {
                    code: forms::patch_required("code", code, forms::text)?,
                    name: forms::patch_required("name", name, forms::text)?,
                    department_id: forms::patch(department, department_id)?,
                },
            ),
            Action::Delete => Command::Delete(forms::key("id_disease", self.id_disease.as_deref())?),
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    list_page::<Diseases>(&state, &session, jar, Resource::Diseases).await
}

pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Form(form): Form<DiseaseForm>,
) -> AppResult<Response> {
    submit_form(&state, &session, jar, Resource::Diseases, || form.into_command()).await
}
