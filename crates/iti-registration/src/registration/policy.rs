use std::collections::BTreeSet;

use super::domain::{fields, FormState, INTENSIVE_CODE_CAMP, PROFESSIONAL_TRAINING_PROGRAM};

/// Exempts `field` from validation while `program` is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalRule {
    pub field: &'static str,
    pub skipped_for_program: &'static str,
}

/// Decides which fields participate in validation for the selected program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalValidationPolicy {
    rules: Vec<ConditionalRule>,
}

impl Default for ConditionalValidationPolicy {
    fn default() -> Self {
        Self::with_rules(vec![
            ConditionalRule {
                field: fields::ROUND,
                skipped_for_program: PROFESSIONAL_TRAINING_PROGRAM,
            },
            ConditionalRule {
                field: fields::INTAKE,
                skipped_for_program: INTENSIVE_CODE_CAMP,
            },
        ])
    }
}

impl ConditionalValidationPolicy {
    pub fn with_rules(rules: Vec<ConditionalRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ConditionalRule] {
        &self.rules
    }

    /// Every field is validated while no program is selected.
    pub fn should_validate_field(&self, field: &str, program: Option<&str>) -> bool {
        let Some(program) = program.filter(|value| !value.trim().is_empty()) else {
            return true;
        };

        !self
            .rules
            .iter()
            .any(|rule| rule.field == field && rule.skipped_for_program == program)
    }

    /// Fields exempt from validation for the program currently selected in `form`.
    pub fn exempt_fields(&self, form: &FormState) -> BTreeSet<&'static str> {
        let program = form.program();
        self.rules
            .iter()
            .map(|rule| rule.field)
            .filter(|field| !self.should_validate_field(field, program))
            .collect()
    }
}

/// [`ConditionalValidationPolicy::should_validate_field`] under the default rule table.
pub fn should_validate_field(field: &str, program: Option<&str>) -> bool {
    ConditionalValidationPolicy::default().should_validate_field(field, program)
}
