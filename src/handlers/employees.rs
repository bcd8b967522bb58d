//! `/employees` page.

use super::{list_page, submit_form};
use crate::access::Resource;
use crate::app::AppState;
use crate::auth::Session;
use crate::db::employees::{EmployeePatch, Employees, NewEmployee};
use crate::db::Command;
use crate::error::AppResult;
use crate::forms::{self, Action};
use axum::{extract::State, response::Response, Form, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::Value;
use time::Date;

#[derive(Debug, Default, Deserialize)]
pub struct EmployeeForm {
    pub action: Option<String>,
    pub fio: Option<String>,
    pub position: Option<String>,
    pub birthdate: Option<String>,
    pub phnumber: Option<String>,
    pub email: Option<String>,
    pub department_id: Option<String>,
    pub id_employee: Option<String>,
}

fn birthdate(raw: Option<&str>) -> AppResult<Option<Date>> {
    forms::date("birthdate", raw)
}

fn department_id(raw: Option<&str>) -> AppResult<Option<i64>> {
    forms::integer("department_id", raw)
}

impl EmployeeForm {
    pub fn into_command(self) -> AppResult<Command<Employees>> {
        let fio = self.fio.as_deref();
        let position = self.position.as_deref();
        let born = self.birthdate.as_deref();
        let phone = self.phnumber.as_deref();
        let email = self.email.as_deref();
        let department = self.department_id.as_deref();

        Ok(match forms::action(self.action.as_deref())? {
            Action::Insert => Command::Insert(NewEmployee {
                fio: forms::required("fio", forms::text(fio)?)?,
                position: forms::text(position)?,
                birthdate: birthdate(born)?,
                phnumber: forms::text(phone)?,
                email: forms::text(email)?,
                department_id: department_id(department)?,
            }),
            Action::Update => Command::Update(
                forms::key("id_employee", self.id_employee.as_deref())?,
                EmployeePatch {
                    fio: forms::patch_required("fio", fio, forms::text)?,
                    position: forms::patch(position, forms::text)?,
                    birthdate: forms::patch(born, birthdate)?,
                    phnumber: forms::patch(phone, forms::text)?,
                    email: forms::patch(email, forms::text)?,
                    department_id: forms::patch(department, department_id)?,
                },
            ),
            Action::Delete => Command::Delete(forms::key("id_employee", self.id_employee.as_deref())?),
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    list_page::<Employees>(&state, &session, jar, Resource::Employees).await
}

pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Form(form): Form<EmployeeForm>,
) -> AppResult<Response> {
    submit_form(&state, &session, jar, Resource::Employees, || form.into_command()).await
}
