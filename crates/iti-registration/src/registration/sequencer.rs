use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{ErrorState, FieldValue, FormState, SelectOption};
use super::gateway::{GatewayError, GatewayReceipt, SubmissionGateway};
use super::handlers::{apply_input_change, apply_select_change, InputChange};
use super::notice::{Notification, Notifier};
use super::validator::{SchemaLookupError, StepValidator};

/// Result of a `next()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum StepTransition {
    Advanced { from: usize, to: usize },
    /// Validation passed on the last step; the index did not move.
    Stayed { step: usize },
    Blocked { step: usize, error_count: usize },
}

/// Result of a blur validation for the targeted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum BlurOutcome {
    /// The conditional policy excludes the field; errors were left alone.
    Skipped,
    /// The current step does not bind the field; errors were left alone.
    NotOnStep,
    Valid,
    Invalid(String),
}

/// First half of a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionStart {
    /// Form is valid and on the last step; send this snapshot to the gateway.
    Ready(FormState),
    /// Another submission has not settled yet.
    InFlight,
    /// Validation failed; the error state now holds the offending fields.
    Invalid,
    /// Validation passed but the flow is not on its last step.
    NotFinalStep,
}

/// How a submit attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(GatewayReceipt),
    Failed(GatewayError),
    Invalid,
    NotFinalStep,
    AlreadySubmitting,
}

/// Step-gated registration state machine.
///
/// Owns the step index, the form values, the per-field errors and the submission guard. Every
/// mutation of the form goes through this type.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    validator: Arc<StepValidator>,
    initial: FormState,
    form: FormState,
    errors: ErrorState,
    current_step: usize,
    is_submitting: bool,
}

impl RegistrationForm {
    pub fn new(validator: Arc<StepValidator>) -> Self {
        Self::with_initial(validator, FormState::initial())
    }

    /// Start from `initial`; a successful submission resets back to it.
    pub fn with_initial(validator: Arc<StepValidator>, initial: FormState) -> Self {
        Self {
            validator,
            form: initial.clone(),
            initial,
            errors: ErrorState::new(),
            current_step: 0,
            is_submitting: false,
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step_count(&self) -> usize {
        self.validator.step_count()
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 >= self.step_count()
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn validator(&self) -> &StepValidator {
        &self.validator
    }

    pub fn apply_input(&mut self, change: &InputChange) {
        let form = std::mem::take(&mut self.form);
        self.form = apply_input_change(form, change);
    }

    pub fn apply_select(&mut self, field: &str, selected: Option<&SelectOption>) {
        let form = std::mem::take(&mut self.form);
        self.form = apply_select_change(form, selected, field);
    }

    /// Bulk field assignment, e.g. when restoring a draft.
    pub fn set_fields<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (String, FieldValue)>,
    {
        for (field, value) in values {
            self.form.set(field, value);
        }
    }

    /// Validate the current step and advance by one when it passes.
    pub fn next(&mut self) -> Result<StepTransition, SchemaLookupError> {
        let step = self.current_step;
        let errors = self.validator.validate_step(step, &self.form)?;

        if errors.has_errors() {
            let error_count = errors.len();
            debug!(step, error_count, "step advance blocked by validation");
            self.errors = errors;
            return Ok(StepTransition::Blocked { step, error_count });
        }

        self.errors.clear();
        let to = (step + 1).min(self.step_count().saturating_sub(1));
        self.current_step = to;

        if to == step {
            Ok(StepTransition::Stayed { step })
        } else {
            debug!(from = step, to, "advanced registration step");
            Ok(StepTransition::Advanced { from: step, to })
        }
    }

    /// Step back by one without validating; existing errors stay as they are.
    pub fn previous(&mut self) -> usize {
        self.current_step = self.current_step.saturating_sub(1);
        self.current_step
    }

    /// Re-validate the current step with `field` hypothetically set to `candidate` and patch
    /// only that field's message.
    pub fn blur_field(
        &mut self,
        field: &str,
        candidate: FieldValue,
    ) -> Result<BlurOutcome, SchemaLookupError> {
        let step = self.current_step;
        let definition = self.validator.definition().get(step).ok_or(SchemaLookupError {
            step,
            step_count: self.step_count(),
        })?;
        if !definition.binds(field) {
            debug!(step, field, "blur ignored for field outside the current step");
            return Ok(BlurOutcome::NotOnStep);
        }

        if !self
            .validator
            .policy()
            .should_validate_field(field, self.form.program())
        {
            return Ok(BlurOutcome::Skipped);
        }

        let hypothetical = self.form.with(field, candidate);
        let errors = self
            .validator
            .validate_step(step, &hypothetical)?;
        let message = errors.get(field).unwrap_or_default().to_string();
        self.errors.insert(field, message.clone());

        if message.is_empty() {
            Ok(BlurOutcome::Valid)
        } else {
            Ok(BlurOutcome::Invalid(message))
        }
    }

    /// Blur for plain inputs; number inputs validate empty or garbage text as zero.
    pub fn blur_input(&mut self, change: &InputChange) -> Result<BlurOutcome, SchemaLookupError> {
        self.blur_field(&change.name, change.blur_value())
    }

    /// Blur for selects, validating the committed value.
    pub fn blur_select(&mut self, field: &str) -> Result<BlurOutcome, SchemaLookupError> {
        let committed = self.form.get(field).cloned().unwrap_or_default();
        self.blur_field(field, committed)
    }

    /// Take the submission guard and validate the final step.
    ///
    /// Only [`SubmissionStart::Ready`] leaves the guard held; the caller must hand the gateway
    /// result to [`RegistrationForm::finish_submission`].
    pub fn begin_submission(&mut self) -> Result<SubmissionStart, SchemaLookupError> {
        if self.is_submitting {
            warn!(step = self.current_step, "submission already in flight");
            return Ok(SubmissionStart::InFlight);
        }
        self.is_submitting = true;

        let errors = match self.validator.validate_step(self.current_step, &self.form) {
            Ok(errors) => errors,
            Err(err) => {
                self.is_submitting = false;
                return Err(err);
            }
        };

        if errors.has_errors() {
            debug!(
                step = self.current_step,
                error_count = errors.len(),
                "submission blocked by validation"
            );
            self.errors = errors;
            self.is_submitting = false;
            return Ok(SubmissionStart::Invalid);
        }

        if !self.is_last_step() {
            self.is_submitting = false;
            return Ok(SubmissionStart::NotFinalStep);
        }

        Ok(SubmissionStart::Ready(self.form.clone()))
    }

    /// Release the guard and apply the gateway result. Success resets the form.
    pub fn finish_submission(
        &mut self,
        result: Result<GatewayReceipt, GatewayError>,
    ) -> SubmitOutcome {
        self.is_submitting = false;
        match result {
            Ok(receipt) => {
                info!(status = receipt.status, "registration accepted");
                self.reset();
                SubmitOutcome::Submitted(receipt)
            }
            Err(err) => {
                warn!(error = %err, "registration request failed");
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Validate, send and settle in one call.
    pub async fn submit<G, N>(
        &mut self,
        gateway: &G,
        notifier: &N,
    ) -> Result<SubmitOutcome, SchemaLookupError>
    where
        G: SubmissionGateway + ?Sized,
        N: Notifier + ?Sized,
    {
        let snapshot = match self.begin_submission()? {
            SubmissionStart::Ready(snapshot) => snapshot,
            SubmissionStart::InFlight => return Ok(SubmitOutcome::AlreadySubmitting),
            SubmissionStart::Invalid => return Ok(SubmitOutcome::Invalid),
            SubmissionStart::NotFinalStep => return Ok(SubmitOutcome::NotFinalStep),
        };

        notifier.notify(Notification::submitting());
        let result = gateway.create_registration_request(&snapshot).await;
        notify_settled(notifier, &result);
        Ok(self.finish_submission(result))
    }

    fn reset(&mut self) {
        self.form = self.initial.clone();
        self.errors.clear();
        self.current_step = 0;
    }
}

pub(crate) fn notify_settled<N>(notifier: &N, result: &Result<GatewayReceipt, GatewayError>)
where
    N: Notifier + ?Sized,
{
    match result {
        Ok(_) => notifier.notify(Notification::submitted()),
        Err(err) => notifier.notify(Notification::failed(err.to_string())),
    }
}
