use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use super::{
    MessageResponse, ValidationErrors, session::authenticate, user_login::INVALID_EMAIL,
    user_login::PASSWORD_REQUIRED, valid_email,
};
use crate::{
    api::email::{EmailSender, verification_email},
    auth::{
        AuthService,
        models::{CreatedEmployee, EMPLOYEE_CREATED, EmployeeProfile, EmployeeRegistration},
    },
    error::ErrorBody,
    outcome::Fold,
};

/// Employee onboarding payload. Unknown fields (such as `token` or `_csrf`) are ignored.
#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    #[schema(value_type = String, format = Password)]
    password: SecretString,
    #[serde(default)]
    name: String,
    #[serde(default)]
    lastname: String,
    /// `YYYY-MM-DD` or RFC 3339.
    #[serde(default)]
    birthdate: String,
    #[serde(default)]
    rfc: String,
    #[serde(default)]
    nss: String,
    #[serde(default)]
    address: String,
    /// Number or numeric string.
    #[serde(default)]
    #[schema(value_type = f64)]
    salary: Value,
}

fn parse_birthdate(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|d| d.date_naive()))
}

fn parse_salary(value: &Value) -> Option<f64> {
    let salary = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (salary.is_finite() && salary >= 0.0).then_some(salary)
}

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

impl RegisterRequest {
    fn validate(self) -> Result<EmployeeRegistration, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let birthdate = parse_birthdate(&self.birthdate);
        let salary = parse_salary(&self.salary);

        errors.check(valid_email(&self.email), "email", INVALID_EMAIL);
        errors.check(
            !self.password.expose_secret().is_empty(),
            "password",
            PASSWORD_REQUIRED,
        );
        errors.check(filled(&self.name), "name", "El nombre es obligatorio");
        errors.check(filled(&self.lastname), "lastname", "El apellido es obligatorio");
        errors.check(
            birthdate.is_some(),
            "birthdate",
            "Agregue una fecha de nacimiento valida",
        );
        errors.check(filled(&self.rfc), "rfc", "El RFC es obligatorio");
        errors.check(filled(&self.nss), "nss", "El NSS es obligatorio");
        errors.check(filled(&self.address), "address", "La direccion es obligatoria");
        errors.check(salary.is_some(), "salary", "Agregue un salario valido");

        let (Some(birthdate), Some(salary)) = (birthdate, salary) else {
            return Err(errors);
        };
        errors.finish(|| EmployeeRegistration {
            email: self.email.trim().to_string(),
            password: self.password,
            profile: EmployeeProfile {
                name: self.name.trim().to_string(),
                lastname: self.lastname.trim().to_string(),
                birthdate,
                rfc: self.rfc.trim().to_uppercase(),
                nss: self.nss.trim().to_string(),
                address: self.address.trim().to_string(),
                salary,
            },
        })
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    params(
        ("x-csrf-token" = String, Header, description = "Must echo the csrfToken cookie"),
    ),
    responses(
        (status = 200, description = "Employee created; verification email sent", body = MessageResponse),
        (status = 400, description = "Invalid payload", body = ValidationErrors),
        (status = 401, description = "No admin session", body = ErrorBody),
        (status = 403, description = "Missing or invalid CSRF token"),
        (status = 404, description = "Requesting admin not found", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ErrorBody),
    ),
    tag = "auth"
)]
// axum handler for employee registration
#[instrument(skip_all)]
pub async fn register(
    headers: HeaderMap,
    Extension(service): Extension<Arc<AuthService>>,
    Extension(mailer): Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<RegisterRequest>>,
) -> Response {
    let admin = match authenticate(&headers, &service).await {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };

    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let registration = match request.validate() {
        Ok(registration) => registration,
        Err(errors) => return errors.into_response(),
    };

    let result = service.create_employee(registration, &admin.email).await;

    // The rows are committed at this point; mail goes out after the transaction.
    if let Ok(created) = &result {
        send_verification(&service, mailer.as_ref(), created).await;
    }

    result.fold(
        |_| (StatusCode::OK, Json(MessageResponse::new(EMPLOYEE_CREATED))).into_response(),
        IntoResponse::into_response,
    )
}

async fn send_verification(service: &AuthService, mailer: &dyn EmailSender, created: &CreatedEmployee) {
    let message = verification_email(
        service.config().frontend_base_url(),
        &created.email,
        &created.verification_token,
        &created.temporary_password,
    );
    match mailer.send(&message).await {
        Ok(()) => info!(user_id = %created.user_id, "verification email sent"),
        Err(err) => error!(user_id = %created.user_id, "Failed to send verification email: {err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> RegisterRequest {
        serde_json::from_value(body).unwrap_or_default()
    }

    fn valid_body() -> Value {
        json!({
            "email": "ana@x.com",
            "password": "Temporal123",
            "token": "ignored",
            "name": "Ana",
            "lastname": "Lopez",
            "birthdate": "1990-05-17",
            "rfc": "loaa900517xx1",
            "nss": "12345678901",
            "address": "Av. Reforma 1",
            "salary": 12500
        })
    }

    #[test]
    fn valid_payload_builds_registration() {
        let registration = request(valid_body()).validate();
        let registration = registration.ok();
        assert_eq!(
            registration.as_ref().map(|r| r.profile.rfc.as_str()),
            Some("LOAA900517XX1")
        );
        assert_eq!(
            registration.as_ref().map(|r| r.profile.birthdate),
            NaiveDate::from_ymd_opt(1990, 5, 17)
        );
        assert_eq!(registration.map(|r| r.profile.salary), Some(12_500.0));
    }

    #[test]
    fn rfc3339_birthdate_and_string_salary_are_accepted() {
        let mut body = valid_body();
        body["birthdate"] = json!("1990-05-17T00:00:00Z");
        body["salary"] = json!("9800.50");
        let registration = request(body).validate().ok();
        assert_eq!(registration.map(|r| r.profile.salary), Some(9_800.5));
    }

    #[test]
    fn empty_payload_reports_every_field() {
        let errors = request(json!({})).validate().err().unwrap_or_default();
        let paths: Vec<&str> = errors.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "email", "password", "name", "lastname", "birthdate", "rfc", "nss", "address",
                "salary"
            ]
        );
    }

    #[test]
    fn negative_salary_is_rejected() {
        let mut body = valid_body();
        body["salary"] = json!(-1);
        let errors = request(body).validate().err().unwrap_or_default();
        assert_eq!(errors.errors.len(), 1);
        assert_eq!(errors.errors[0].path, "salary");
    }
}
