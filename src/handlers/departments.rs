//! `/departments` page.

use super::{list_page, submit_form};
use crate::access::Resource;
use crate::app::AppState;
use crate::auth::Session;
use crate::db::departments::{DepartmentPatch, Departments, NewDepartment};
use crate::db::Command;
use crate::error::AppResult;
use crate::forms::{self, Action};
use axum::{extract::State, response::Response, Form, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct DepartmentForm {
    pub action: Option<String>,
    pub department_name: Option<String>,
    pub fio_doctor: Option<String>,
    pub id_department: Option<String>,
}

impl DepartmentForm {
    pub fn into_command(self) -> AppResult<Command<Departments>> {
        let name = self.department_name.as_deref();
        let doctor = self.fio_doctor.as_deref();

        Ok(match forms::action(self.action.as_deref())? {
            Action::Insert => Command::Insert(NewDepartment {
                department_name: forms::required("department_name", forms::text(name)?)?,
                fio_doctor: forms::text(doctor)?,
            }),
            Action::Update => Command::Update(
                forms::key("id_department", self.id_department.as_deref())?,
                DepartmentPatch {
                    department_name: forms::patch_required("department_name", name, forms::text)?,
                    fio_doctor: forms::patch(doctor, forms::text)?,
                },
            ),
            Action::Delete => {
                Command::Delete(forms::key("id_department", self.id_department.as_deref())?)
            }
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    list_page::<Departments>(&state, &session, jar, Resource::Departments).await
}

pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Form(form): Form<DepartmentForm>,
) -> AppResult<Response> {
    submit_form(&state, &session, jar, Resource::Departments, || form.into_command()).await
}
