//! Self-service registration: the four standard steps and the submit
//! sequence that follows them.

use std::sync::{Arc, Weak};

use serde_json::Value;
use shared::{
    domain::Department,
    error::{ApiException, GENERIC_ERROR_MESSAGE},
    protocol::{LoginRequest, RegisterRequest, Session},
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    api::WorkforceApi,
    navigation::{NavParams, Navigator},
    notice::Notice,
    routes::names,
    session::SessionStore,
    validation::{FieldSchema, FormValues, Rule, StepSchema},
    wizard::{FormStep, MultiStepForm, WizardError},
};

/// Collected for validation only and never sent.
const CONFIRMATION_FIELDS: &[&str] = &["confirmPassword"];

pub fn registration_steps() -> Vec<FormStep> {
    let departments = Department::ALL
        .iter()
        .map(|d| d.as_str().to_string())
        .collect();

    vec![
        FormStep::new(
            "Personal information",
            StepSchema::new()
                .field(FieldSchema::new("firstName").required("First name is required"))
                .field(FieldSchema::new("lastName").required("Last name is required"))
                .field(
                    FieldSchema::new("email")
                        .required("Email is required")
                        .rule(Rule::Email, "Enter a valid email address"),
                )
                .field(
                    FieldSchema::new("phoneNumber")
                        .required("Phone number is required")
                        .rule(Rule::Digits, "Phone number must contain digits only")
                        .rule(Rule::MinLength(10), "Phone number is too short")
                        .rule(Rule::MaxLength(15), "Phone number is too long"),
                ),
        ),
        FormStep::new(
            "Background",
            StepSchema::new()
                .field(FieldSchema::new("gender").required("Gender is required").rule(
                    Rule::OneOf(vec!["male".into(), "female".into()]),
                    "Select a gender",
                ))
                .field(FieldSchema::new("maritalStatus").rule(
                    Rule::OneOf(vec![
                        "single".into(),
                        "married".into(),
                        "divorced".into(),
                        "widowed".into(),
                    ]),
                    "Select a marital status",
                ))
                .field(FieldSchema::new("occupation").required("Occupation is required"))
                .field(FieldSchema::new("placeOfWork")),
        ),
        FormStep::new(
            "Workforce details",
            StepSchema::new()
                .field(
                    FieldSchema::new("birthDay")
                        .required("Date of birth is required")
                        .rule(Rule::Date, "Use the format YYYY-MM-DD"),
                )
                .field(FieldSchema::new("address").rule(Rule::MaxLength(200), "Address is too long"))
                .field(
                    FieldSchema::new("department")
                        .required("Department is required")
                        .rule(Rule::OneOf(departments), "Select a department"),
                )
                .field(FieldSchema::new("campus").required("Campus is required")),
        ),
        FormStep::new(
            "Security",
            StepSchema::new()
                .field(
                    FieldSchema::new("password")
                        .required("Password is required")
                        .rule(Rule::MinLength(6), "Password must be at least 6 characters"),
                )
                .field(
                    FieldSchema::new("confirmPassword")
                        .required("Confirm your password")
                        .rule(Rule::Matches("password".into()), "Passwords do not match"),
                ),
        ),
    ]
}

pub fn registration_form() -> Result<MultiStepForm, WizardError> {
    MultiStepForm::new(registration_steps())
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Form(#[from] WizardError),
    #[error("registration payload is incomplete: {0}")]
    Payload(#[source] serde_json::Error),
    #[error("registration failed: {0}")]
    Registration(#[source] ApiException),
    #[error("sign-in after registration failed: {0}")]
    Login(#[source] ApiException),
    #[error("failed to store session: {0}")]
    Session(#[source] anyhow::Error),
    #[error("the registration screen is gone")]
    Detached,
}

impl SubmitError {
    /// The single message a screen shows for this failure.
    pub fn notice(&self) -> Notice {
        match self {
            SubmitError::Form(WizardError::Invalid { .. }) => {
                Notice::error("Please correct the highlighted fields")
            }
            SubmitError::Form(WizardError::SubmissionInFlight) => {
                Notice::error("Registration is already in progress")
            }
            SubmitError::Registration(err) | SubmitError::Login(err) => Notice::from_api(err),
            _ => Notice::error(GENERIC_ERROR_MESSAGE),
        }
    }
}

/// Runs register, login, store session and navigation strictly in order.
pub struct RegistrationFlow {
    api: Arc<dyn WorkforceApi>,
    sessions: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl RegistrationFlow {
    pub fn new(
        api: Arc<dyn WorkforceApi>,
        sessions: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            sessions,
            navigator,
        }
    }

    /// Submits the form from its last step.
    ///
    /// The form is held weakly: if the owning screen drops it while a
    /// request is pending, the result is not applied to it and no navigation
    /// happens. A session obtained before that point is still stored.
    pub async fn submit(
        &self,
        form: Weak<Mutex<MultiStepForm>>,
        final_data: FormValues,
    ) -> Result<Session, SubmitError> {
        let values = {
            let form = form.upgrade().ok_or(SubmitError::Detached)?;
            let mut guard = form.lock().await;
            guard.begin_submission(final_data)?
        };

        let result = self.run(values).await;

        let Some(form) = form.upgrade() else {
            debug!("registration: screen dropped before completion");
            return result;
        };

        let mut guard = form.lock().await;
        match result {
            Ok(session) => {
                guard.complete_submission()?;
                drop(guard);
                if let Err(err) = self.navigator.navigate(names::HOME, NavParams::new()) {
                    warn!(error = %err, "registration: navigation after sign-in failed");
                }
                Ok(session)
            }
            Err(err) => {
                guard.fail_submission(err.notice().message())?;
                Err(err)
            }
        }
    }

    async fn run(&self, mut values: FormValues) -> Result<Session, SubmitError> {
        for field in CONFIRMATION_FIELDS {
            values.remove(*field);
        }
        let request: RegisterRequest =
            serde_json::from_value(Value::Object(values)).map_err(SubmitError::Payload)?;

        let user = self
            .api
            .register(&request)
            .await
            .map_err(SubmitError::Registration)?;
        info!(user_id = user.id.0, "registration: account created");

        let session = self
            .api
            .login(&LoginRequest {
                email: request.email.clone(),
                password: request.password.clone(),
            })
            .await
            .map_err(SubmitError::Login)?;

        self.sessions
            .store(&session)
            .await
            .map_err(SubmitError::Session)?;
        self.api.set_token(Some(session.token.clone())).await;
        info!(user_id = session.user.id.0, "registration: signed in");
        Ok(session)
    }
}

#[cfg(test)]
#[path = "tests/registration_tests.rs"]
mod tests;
