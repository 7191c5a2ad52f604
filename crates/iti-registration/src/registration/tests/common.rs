use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::registration::definition::FormDefinition;
use crate::registration::domain::{fields, FieldValue, FileRef, FormState, INTENSIVE_CODE_CAMP};
use crate::registration::gateway::{GatewayError, GatewayReceipt, SubmissionGateway};
use crate::registration::notice::{Notification, Notifier};
use crate::registration::options::OptionProvider;
use crate::registration::policy::ConditionalValidationPolicy;
use crate::registration::schema::{StepSchema, FIRST_GRADUATION_YEAR};
use crate::registration::sequencer::RegistrationForm;
use crate::registration::service::{RegistrationService, SessionId, SessionLimits};
use crate::registration::validator::StepValidator;

pub(super) const LAST_STEP: usize = 3;

pub(super) fn validator() -> Arc<StepValidator> {
    let definition = FormDefinition::with_education_schema(StepSchema::EducationDetails {
        graduation_years: FIRST_GRADUATION_YEAR..=2025,
    });
    Arc::new(StepValidator::new(
        Arc::new(definition),
        ConditionalValidationPolicy::default(),
    ))
}

pub(super) fn blank_form() -> RegistrationForm {
    RegistrationForm::new(validator())
}

pub(super) fn personal_fields() -> Vec<(String, FieldValue)> {
    vec![
        (fields::FULL_NAME.to_string(), FieldValue::text("Nour El-Din Ali")),
        (
            fields::PERSONAL_PHOTO.to_string(),
            FieldValue::File(FileRef {
                file_name: "nour.png".to_string(),
                content_type: "image/png".to_string(),
                size_bytes: 81_920,
            }),
        ),
        (fields::MOBILE.to_string(), FieldValue::text("01012345678")),
        (fields::EMAIL.to_string(), FieldValue::text("nour@example.com")),
        (fields::CITY_OF_BIRTH.to_string(), FieldValue::text("Tanta")),
    ]
}

pub(super) fn education_fields(program: &str) -> Vec<(String, FieldValue)> {
    vec![
        (fields::UNIVERSITY.to_string(), FieldValue::text("Tanta University")),
        (
            fields::FACULTY.to_string(),
            FieldValue::text("Faculty of Computers and Information"),
        ),
        (fields::BRANCH.to_string(), FieldValue::text("Smart Village")),
        (
            fields::TRACK_NAME.to_string(),
            FieldValue::text("Open Source Application Development"),
        ),
        (fields::PROGRAM.to_string(), FieldValue::text(program)),
        (fields::ROUND.to_string(), FieldValue::text("Round 2")),
        (fields::ITI_GRADUATION_YEAR.to_string(), FieldValue::Number(2021.0)),
    ]
}

pub(super) fn teaching_fields() -> Vec<(String, FieldValue)> {
    vec![
        (fields::INTERESTED_IN_TEACHING.to_string(), FieldValue::text("yes")),
        (
            fields::PREFERRED_TEACHING_BRANCHES.to_string(),
            FieldValue::List(vec!["Smart Village".to_string()]),
        ),
        (
            fields::PREFERRED_COURSES_TO_TEACH.to_string(),
            FieldValue::List(vec!["Rust".to_string()]),
        ),
        (
            fields::LINKEDIN.to_string(),
            FieldValue::text("https://www.linkedin.com/in/nour"),
        ),
    ]
}

/// Fill every step and walk the form to its last step.
pub(super) fn form_on_last_step() -> RegistrationForm {
    let mut form = blank_form();
    form.set_fields(personal_fields());
    form.set_fields(education_fields(INTENSIVE_CODE_CAMP));
    form.set_fields(teaching_fields());
    for _ in 0..LAST_STEP {
        form.next().expect("schema exists");
    }
    assert_eq!(form.current_step(), LAST_STEP);
    form
}

pub(super) fn receipt() -> GatewayReceipt {
    GatewayReceipt {
        status: 201,
        body: json!({ "id": "registration-1" }),
    }
}

#[derive(Default)]
pub(super) struct RecordingGateway {
    calls: Mutex<Vec<FormState>>,
}

impl RecordingGateway {
    pub(super) fn calls(&self) -> Vec<FormState> {
        self.calls.lock().expect("gateway mutex poisoned").clone()
    }
}

#[async_trait]
impl SubmissionGateway for RecordingGateway {
    async fn create_registration_request(
        &self,
        form: &FormState,
    ) -> Result<GatewayReceipt, GatewayError> {
        self.calls
            .lock()
            .expect("gateway mutex poisoned")
            .push(form.clone());
        Ok(receipt())
    }
}

pub(super) struct FailingGateway {
    pub(super) message: String,
    pub(super) calls: AtomicUsize,
}

impl FailingGateway {
    pub(super) fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SubmissionGateway for FailingGateway {
    async fn create_registration_request(
        &self,
        _form: &FormState,
    ) -> Result<GatewayReceipt, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GatewayError::Transport(self.message.clone()))
    }
}

/// Holds every call until `release` is notified.
#[derive(Default)]
pub(super) struct BlockingGateway {
    pub(super) entered: Notify,
    pub(super) release: Notify,
    pub(super) calls: AtomicUsize,
}

#[async_trait]
impl SubmissionGateway for BlockingGateway {
    async fn create_registration_request(
        &self,
        _form: &FormState,
    ) -> Result<GatewayReceipt, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(receipt())
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
    }
}

pub(super) fn build_service<G>(gateway: Arc<G>) -> (
    Arc<RegistrationService<G, RecordingNotifier>>,
    Arc<RecordingNotifier>,
)
where
    G: SubmissionGateway + 'static,
{
    build_service_with_limits(gateway, SessionLimits::default())
}

pub(super) fn build_service_with_limits<G>(
    gateway: Arc<G>,
    limits: SessionLimits,
) -> (
    Arc<RegistrationService<G, RecordingNotifier>>,
    Arc<RecordingNotifier>,
)
where
    G: SubmissionGateway + 'static,
{
    let notifier = Arc::new(RecordingNotifier::default());
    let options = Arc::new(OptionProvider::bundled().expect("bundled options"));
    let service = Arc::new(
        RegistrationService::new(validator(), options, gateway, notifier.clone())
            .with_limits(limits),
    );
    (service, notifier)
}

/// Fill every step of a session and walk it to the last step.
pub(super) fn session_on_last_step<G>(
    service: &RegistrationService<G, RecordingNotifier>,
) -> SessionId
where
    G: SubmissionGateway + 'static,
{
    let id = service.create_session().session_id;
    service
        .with_session_for_tests(&id, |form| {
            form.set_fields(personal_fields());
            form.set_fields(education_fields(INTENSIVE_CODE_CAMP));
            form.set_fields(teaching_fields());
        })
        .expect("session exists");
    for _ in 0..LAST_STEP {
        service.next(&id).expect("session exists");
    }
    id
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
