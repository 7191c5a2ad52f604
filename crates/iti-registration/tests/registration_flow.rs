//! End-to-end scenarios for the registration flow, driven only through the public API.

mod common {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use iti_registration::registration::{
        ConditionalValidationPolicy, FormDefinition, FormState, GatewayError, GatewayReceipt,
        Notification, Notifier, RegistrationForm, StepSchema, StepValidator, SubmissionGateway,
    };

    pub(super) fn validator() -> Arc<StepValidator> {
        let definition = FormDefinition::with_education_schema(StepSchema::EducationDetails {
            graduation_years: 1993..=2025,
        });
        Arc::new(StepValidator::new(
            Arc::new(definition),
            ConditionalValidationPolicy::default(),
        ))
    }

    pub(super) fn form() -> RegistrationForm {
        RegistrationForm::new(validator())
    }

    #[derive(Default)]
    pub(super) struct ScriptedGateway {
        pub(super) outcomes: Mutex<Vec<Result<GatewayReceipt, GatewayError>>>,
        pub(super) received: Mutex<Vec<FormState>>,
    }

    #[async_trait]
    impl SubmissionGateway for ScriptedGateway {
        async fn create_registration_request(
            &self,
            form: &FormState,
        ) -> Result<GatewayReceipt, GatewayError> {
            self.received
                .lock()
                .expect("gateway mutex poisoned")
                .push(form.clone());
            self.outcomes
                .lock()
                .expect("gateway mutex poisoned")
                .remove(0)
        }
    }

    #[derive(Default)]
    pub(super) struct Inbox(pub(super) Mutex<Vec<Notification>>);

    impl Notifier for Inbox {
        fn notify(&self, notification: Notification) {
            self.0
                .lock()
                .expect("inbox mutex poisoned")
                .push(notification);
        }
    }
}

use common::*;
use serde_json::json;

use iti_registration::registration::{
    fields, FieldValue, FileRef, GatewayError, GatewayReceipt, InputChange, InputValue,
    Notification, SelectOption, StepTransition, SubmitOutcome, INTENSIVE_CODE_CAMP,
};

fn select(value: &str) -> SelectOption {
    SelectOption::new(value, value)
}

fn fill_personal(form: &mut iti_registration::registration::RegistrationForm) {
    form.apply_input(&InputChange::text(fields::FULL_NAME, "Yousef Kamal"));
    form.apply_input(&InputChange::new(
        fields::PERSONAL_PHOTO,
        InputValue::File(Some(FileRef {
            file_name: "yousef.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            size_bytes: 52_000,
        })),
    ));
    form.apply_input(&InputChange::text(fields::MOBILE, "01223456789"));
    form.apply_input(&InputChange::text(fields::EMAIL, "yousef@example.org"));
    form.apply_input(&InputChange::text(fields::CITY_OF_BIRTH, "Giza"));
}

fn fill_education(form: &mut iti_registration::registration::RegistrationForm) {
    form.apply_select(fields::UNIVERSITY, Some(&select("Cairo University")));
    form.apply_select(fields::FACULTY, Some(&select("Faculty of Engineering")));
    form.apply_select(fields::BRANCH, Some(&select("New Capital")));
    form.apply_select(fields::TRACK_NAME, Some(&select("Cloud Architecture")));
    form.apply_select(fields::PROGRAM, Some(&select(INTENSIVE_CODE_CAMP)));
    form.apply_select(fields::ROUND, Some(&select("Round 1")));
    form.apply_input(&InputChange::number(fields::ITI_GRADUATION_YEAR, "2023"));
}

#[test]
fn intake_requirement_follows_program_selection() {
    let mut form = form();
    fill_personal(&mut form);
    assert_eq!(
        form.next().expect("schema exists"),
        StepTransition::Advanced { from: 0, to: 1 }
    );

    fill_education(&mut form);
    form.apply_select(fields::INTAKE, None);
    assert_eq!(
        form.next().expect("schema exists"),
        StepTransition::Advanced { from: 1, to: 2 }
    );

    form.previous();
    form.apply_select(fields::PROGRAM, None);
    let transition = form.next().expect("schema exists");
    assert!(matches!(transition, StepTransition::Blocked { step: 1, .. }));
    assert_eq!(form.errors().get(fields::INTAKE), Some("Intake is required"));
}

#[tokio::test]
async fn failed_submission_can_be_retried_explicitly() {
    let gateway = ScriptedGateway::default();
    gateway.outcomes.lock().expect("mutex").extend([
        Err(GatewayError::Transport("Network Error".to_string())),
        Ok(GatewayReceipt {
            status: 201,
            body: json!({ "id": 7 }),
        }),
    ]);
    let inbox = Inbox::default();

    let mut form = form();
    fill_personal(&mut form);
    form.next().expect("schema exists");
    fill_education(&mut form);
    form.next().expect("schema exists");
    form.apply_input(&InputChange::checkbox(fields::IS_WORK, true));
    form.apply_input(&InputChange::text(fields::JOB_TITLE, "Backend Engineer"));
    form.apply_input(&InputChange::text(fields::COMPANY_NAME, "Valeo"));
    form.apply_input(&InputChange::number(fields::YEARS_OF_EXPERIENCE, "2"));
    form.next().expect("schema exists");
    form.apply_input(&InputChange::text(fields::INTERESTED_IN_TEACHING, "no"));

    let first = form.submit(&gateway, &inbox).await.expect("schema exists");
    assert!(matches!(first, SubmitOutcome::Failed(_)));
    assert_eq!(form.current_step(), 3);
    assert_eq!(
        form.form().get(fields::YEARS_OF_EXPERIENCE),
        Some(&FieldValue::Number(2.0))
    );

    let second = form.submit(&gateway, &inbox).await.expect("schema exists");
    assert!(matches!(second, SubmitOutcome::Submitted(_)));
    assert_eq!(form.current_step(), 0);

    let received = gateway.received.lock().expect("mutex").clone();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0], received[1]);
    assert_eq!(received[1].text(fields::JOB_TITLE), Some("Backend Engineer"));

    let notifications = inbox.0.lock().expect("mutex").clone();
    assert_eq!(
        notifications,
        vec![
            Notification::submitting(),
            Notification::failed("Network Error"),
            Notification::submitting(),
            Notification::submitted(),
        ]
    );
}
