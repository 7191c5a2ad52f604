use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use super::super::domain::{FieldValue, FormState};
use super::Violation;

/// Form values paired with the fields the conditional policy exempted.
#[derive(Debug, Clone, Copy)]
pub struct ValidationCandidate<'a> {
    pub form: &'a FormState,
    pub exempt: &'a BTreeSet<&'static str>,
}

impl<'a> ValidationCandidate<'a> {
    pub fn new(form: &'a FormState, exempt: &'a BTreeSet<&'static str>) -> Self {
        Self { form, exempt }
    }
}

/// Accumulates violations, keeping the first failure per field.
pub(crate) struct Checks<'a> {
    candidate: ValidationCandidate<'a>,
    violations: Vec<Violation>,
}

impl<'a> Checks<'a> {
    pub(crate) fn new(candidate: ValidationCandidate<'a>) -> Self {
        Self {
            candidate,
            violations: Vec::new(),
        }
    }

    pub(crate) fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    pub(crate) fn form(&self) -> &FormState {
        self.candidate.form
    }

    fn skip(&self, field: &str) -> bool {
        self.candidate.exempt.contains(field)
            || self.violations.iter().any(|violation| violation.path == field)
    }

    fn value(&self, field: &str) -> &FieldValue {
        static NULL: FieldValue = FieldValue::Null;
        self.candidate.form.get(field).unwrap_or(&NULL)
    }

    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.violations.push(Violation {
            path: field.to_string(),
            message: message.into(),
        });
    }

    pub(crate) fn required(&mut self, field: &str, message: &str) -> &mut Self {
        if !self.skip(field) && self.value(field).is_blank() {
            self.fail(field, message);
        }
        self
    }

    pub(crate) fn min_chars(&mut self, field: &str, min: usize, message: &str) -> &mut Self {
        if self.skip(field) {
            return self;
        }
        if let FieldValue::Text(value) = self.value(field) {
            if value.trim().chars().count() < min {
                self.fail(field, message);
            }
        }
        self
    }

    pub(crate) fn matches(&mut self, field: &str, pattern: &Regex, message: &str) -> &mut Self {
        if self.skip(field) {
            return self;
        }
        if let FieldValue::Text(value) = self.value(field) {
            let value = value.trim();
            if !value.is_empty() && !pattern.is_match(value) {
                self.fail(field, message);
            }
        }
        self
    }

    pub(crate) fn required_file(&mut self, field: &str, message: &str) -> &mut Self {
        if !self.skip(field) && !matches!(self.value(field), FieldValue::File(_)) {
            self.fail(field, message);
        }
        self
    }

    /// Whole number within `min..=max`; text that does not parse is a type error.
    pub(crate) fn integer_between(
        &mut self,
        field: &str,
        min: i64,
        max: i64,
        label: &str,
    ) -> &mut Self {
        if self.skip(field) {
            return self;
        }
        let parsed = match self.value(field) {
            FieldValue::Null => None,
            FieldValue::Text(raw) if raw.trim().is_empty() => None,
            FieldValue::Number(number) => Some(Some(*number)),
            FieldValue::Text(raw) => Some(raw.trim().parse::<f64>().ok()),
            _ => Some(None),
        };
        let Some(number) = parsed else {
            return self;
        };

        match number {
            None => self.fail(field, format!("{label} must be a number")),
            Some(number) if number.fract() != 0.0 => {
                self.fail(field, format!("{label} must be a whole number"))
            }
            Some(number) if number < min as f64 => {
                self.fail(field, format!("{label} must be at least {min}"))
            }
            Some(number) if number > max as f64 => {
                self.fail(field, format!("{label} must be at most {max}"))
            }
            Some(_) => {}
        }
        self
    }

    pub(crate) fn one_of(&mut self, field: &str, allowed: &[&str], message: &str) -> &mut Self {
        if self.skip(field) {
            return self;
        }
        if let FieldValue::Text(value) = self.value(field) {
            let value = value.trim();
            if !value.is_empty() && !allowed.contains(&value) {
                self.fail(field, message);
            }
        }
        self
    }
}

pub(crate) fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
    })
}

pub(crate) fn egyptian_mobile_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^01[0125][0-9]{8}$").expect("valid mobile regex"))
}

pub(crate) fn linkedin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(https?://)?([a-z]{2,3}\.)?linkedin\.com/.+$").expect("valid linkedin regex")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(form: &FormState, apply: impl FnOnce(&mut Checks<'_>)) -> Vec<Violation> {
        let exempt = BTreeSet::new();
        let mut checks = Checks::new(ValidationCandidate::new(form, &exempt));
        apply(&mut checks);
        checks.into_violations()
    }

    #[test]
    fn first_failure_per_field_wins() {
        let form = FormState::new().with("fullName", FieldValue::text(""));
        let violations = run(&form, |checks| {
            checks
                .required("fullName", "Full name is required")
                .min_chars("fullName", 3, "too short");
        });

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "Full name is required");
    }

    #[test]
    fn exempt_fields_are_never_reported() {
        let form = FormState::new();
        let exempt = BTreeSet::from(["intake"]);
        let mut checks = Checks::new(ValidationCandidate::new(&form, &exempt));
        checks.required("intake", "Intake is required");
        assert!(checks.into_violations().is_empty());
    }

    #[test]
    fn integer_between_reports_type_and_range() {
        let form = FormState::new()
            .with("a", FieldValue::text("abc"))
            .with("b", FieldValue::Number(1.5))
            .with("c", FieldValue::Number(1980.0))
            .with("d", FieldValue::text("2020"));

        let violations = run(&form, |checks| {
            for field in ["a", "b", "c", "d"] {
                checks.integer_between(field, 1993, 2030, "Year");
            }
        });

        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Year must be a number",
                "Year must be a whole number",
                "Year must be at least 1993"
            ]
        );
    }

    #[test]
    fn patterns_accept_expected_shapes() {
        assert!(egyptian_mobile_pattern().is_match("01012345678"));
        assert!(!egyptian_mobile_pattern().is_match("01312345678"));
        assert!(email_pattern().is_match("grad@iti.gov.eg"));
        assert!(!email_pattern().is_match("grad@iti"));
        assert!(linkedin_pattern().is_match("https://www.linkedin.com/in/someone"));
        assert!(!linkedin_pattern().is_match("https://example.com/in/someone"));
    }
}
