use std::sync::Arc;

use super::definition::FormDefinition;
use super::domain::{ErrorState, FormState};
use super::policy::ConditionalValidationPolicy;
use super::schema::ValidationCandidate;

/// Raised when a step index has no schema bound to it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no validation schema bound to step {step} (flow has {step_count} steps)")]
pub struct SchemaLookupError {
    pub step: usize,
    pub step_count: usize,
}

/// Runs the schema of a step against the form, honoring the conditional policy.
#[derive(Debug, Clone)]
pub struct StepValidator {
    definition: Arc<FormDefinition>,
    policy: ConditionalValidationPolicy,
}

impl Default for StepValidator {
    fn default() -> Self {
        Self::new(
            Arc::new(FormDefinition::default()),
            ConditionalValidationPolicy::default(),
        )
    }
}

impl StepValidator {
    pub fn new(definition: Arc<FormDefinition>, policy: ConditionalValidationPolicy) -> Self {
        Self { definition, policy }
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn policy(&self) -> &ConditionalValidationPolicy {
        &self.policy
    }

    pub fn step_count(&self) -> usize {
        self.definition.len()
    }

    /// Validate `form` against the schema of `step`.
    ///
    /// Failing fields come back as entries of the returned [`ErrorState`]; only a missing
    /// schema is an `Err`.
    pub fn validate_step(
        &self,
        step: usize,
        form: &FormState,
    ) -> Result<ErrorState, SchemaLookupError> {
        let definition = self.definition.get(step).ok_or(SchemaLookupError {
            step,
            step_count: self.definition.len(),
        })?;

        let exempt = self.policy.exempt_fields(form);
        let candidate = ValidationCandidate::new(form, &exempt);

        match definition.schema.validate(candidate) {
            Ok(()) => Ok(ErrorState::new()),
            Err(aggregate) => Ok(aggregate
                .inner
                .into_iter()
                .map(|violation| (violation.path, violation.message))
                .collect()),
        }
    }
}
