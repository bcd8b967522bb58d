//! `/medications` page: decodes quantities, expiration dates and prices.

use super::{list_page, submit_form};
use crate::access::Resource;
use crate::app::AppState;
use crate::auth::Session;
use crate::db::medications::{MedicationPatch, Medications, NewMedication};
use crate::db::Command;
use crate::error::AppResult;
use crate::forms::{self, Action};
use axum::{extract::State, response::Response, Form, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::Value;
use time::Date;

#[derive(Debug, Default, Deserialize)]
pub struct MedicationForm {
    pub action: Option<String>,
    pub name: Option<String>,
    pub release_form: Option<String>,
    pub registry_form: Option<String>,
    pub quantity: Option<String>,
    pub expiration_date: Option<String>,
    pub price: Option<String>,
    pub disease_id: Option<String>,
    pub id_medication: Option<String>,
}

fn quantity(raw: Option<&str>) -> AppResult<Option<i64>> {
    forms::integer("quantity", raw)
}

fn expiration_date(raw: Option<&str>) -> AppResult<Option<Date>> {
    forms::date("expiration_date", raw)
}

fn price(raw: Option<&str>) -> AppResult<Option<i64>> {
    forms::price("price", raw)
}

fn disease_id(raw: Option<&str>) -> AppResult<Option<i64>> {
    forms::integer("disease_id", raw)
}

impl MedicationForm {
    pub fn into_command(self) -> AppResult<Command<Medications>> {
        let name = self.name.as_deref();
        let release = self.release_form.as_deref();
        let registry = self.registry_form.as_deref();
        let count = self.quantity.as_deref();
        let expires = self.expiration_date.as_deref();
        let cost = self.price.as_deref();
        let disease = self.disease_id.as_deref();

        Ok(match forms::action(self.action.as_deref())? {
            Action::Insert => Command::Insert(NewMedication {
                name: forms::required("name", forms::text(name)?)?,
                release_form: forms::text(release)?,
                registry_form: forms::text(registry)?,
                quantity: quantity(count)?,
                expiration_date: expiration_date(expires)?,
                price: price(cost)?,
                disease_id: disease_id(disease)?,
            }),
            Action::Update => Command::Update(
                forms::key("id_medication", self.id_medication.as_deref())?,
                MedicationPatch {
                    name: forms::patch_required("name", name, forms::text)?,
                    release_form: forms::patch(release, forms::text)?,
                    registry_form: forms::patch(registry, forms::text)?,
                    quantity: forms::patch(count, quantity)?,
                    expiration_date: forms::patch(expires, expiration_date)?,
                    price: forms::patch(cost, price)?,
                    disease_id: forms::patch(disease, disease_id)?,
                },
            ),
            Action::Delete => {
                Command::Delete(forms::key("id_medication", self.id_medication.as_deref())?)
            }
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    list_page::<Medications>(&state, &session, jar, Resource::Medications).await
}

pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Form(form): Form<MedicationForm>,
) -> AppResult<Response> {
    submit_form(&state, &session, jar, Resource::Medications, || form.into_command()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use time::macros::date;

    #[test]
    fn insert_parses_typed_fields() {
        let form = MedicationForm {
            action: Some("insert".into()),
            name: Some("Aspirin".into()),
            quantity: Some("30".into()),
            expiration_date: Some("2027-01-31".into()),
            price: Some("4.5".into()),
            disease_id: Some("".into()),
            ..MedicationForm::default()
        };
        let Command::Insert(new) = form.into_command().unwrap() else {
            panic!("expected insert");
        };
        assert_eq!(new.name, "Aspirin");
        assert_eq!(new.quantity, Some(30));
        assert_eq!(new.expiration_date, Some(date!(2027 - 01 - 31)));
        assert_eq!(new.price, Some(450));
        assert_eq!(new.disease_id, None);
    }

    #[test]
    fn bad_price_is_a_validation_error() {
        let form = MedicationForm {
            action: Some("update".into()),
            id_medication: Some("2".into()),
            price: Some("cheap".into()),
            ..MedicationForm::default()
        };
        let err = form.into_command().err().unwrap();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("price")));
    }

    #[test]
    fn update_only_touches_submitted_fields() {
        let form = MedicationForm {
            action: Some("update".into()),
            id_medication: Some("2".into()),
            quantity: Some("".into()),
            ..MedicationForm::default()
        };
        let Command::Update(2, patch) = form.into_command().unwrap() else {
            panic!("expected update of medication 2");
        };
        assert_eq!(patch.quantity, Some(None));
        assert_eq!(patch.name, None);
        assert_eq!(patch.price, None);
    }
}
