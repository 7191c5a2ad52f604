//! Per-step validation schemas.
//!
//! Each step is a tagged [`StepSchema`] variant; the ordered list of variants lives in
//! [`crate::registration::definition::FormDefinition`]. A schema is a pure structural predicate
//! over a [`ValidationCandidate`]: it either accepts the candidate or reports every violated
//! field in one [`AggregateValidationError`].

mod rules;

pub use rules::ValidationCandidate;

use std::ops::RangeInclusive;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::domain::fields;
use rules::{egyptian_mobile_pattern, email_pattern, linkedin_pattern, Checks};

/// Earliest graduation year accepted for ITI alumni.
pub const FIRST_GRADUATION_YEAR: i64 = 1993;
/// Upper bound on declared years of experience.
pub const MAX_YEARS_OF_EXPERIENCE: i64 = 50;

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

/// Every violation produced by one schema run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} field(s) failed validation", inner.len())]
pub struct AggregateValidationError {
    pub inner: Vec<Violation>,
}

/// Validation schema bound to one registration step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepSchema {
    PersonalInformation,
    EducationDetails {
        graduation_years: RangeInclusive<i64>,
    },
    WorkExperience,
    TeachingPreferences,
}

impl StepSchema {
    /// Education schema accepting graduation years up to the current calendar year.
    pub fn education_details() -> Self {
        let current_year = i64::from(chrono::Local::now().year());
        Self::EducationDetails {
            graduation_years: FIRST_GRADUATION_YEAR..=current_year,
        }
    }

    /// Run every rule, collecting all violations rather than stopping at the first.
    pub fn validate(
        &self,
        candidate: ValidationCandidate<'_>,
    ) -> Result<(), AggregateValidationError> {
        let mut checks = Checks::new(candidate);

        match self {
            StepSchema::PersonalInformation => personal_information(&mut checks),
            StepSchema::EducationDetails { graduation_years } => {
                education_details(&mut checks, graduation_years)
            }
            StepSchema::WorkExperience => work_experience(&mut checks),
            StepSchema::TeachingPreferences => teaching_preferences(&mut checks),
        }

        let inner = checks.into_violations();
        if inner.is_empty() {
            Ok(())
        } else {
            Err(AggregateValidationError { inner })
        }
    }
}

fn personal_information(checks: &mut Checks<'_>) {
    checks
        .required(fields::FULL_NAME, "Full name is required")
        .min_chars(
            fields::FULL_NAME,
            3,
            "Full name must be at least 3 characters",
        )
        .required_file(fields::PERSONAL_PHOTO, "Personal photo is required")
        .required(fields::MOBILE, "Mobile number is required")
        .matches(
            fields::MOBILE,
            egyptian_mobile_pattern(),
            "Mobile number must be a valid Egyptian mobile number",
        )
        .required(fields::EMAIL, "Email is required")
        .matches(fields::EMAIL, email_pattern(), "Email must be a valid email")
        .required(fields::CITY_OF_BIRTH, "City of birth is required");
}

fn education_details(checks: &mut Checks<'_>, graduation_years: &RangeInclusive<i64>) {
    checks
        .required(fields::UNIVERSITY, "University is required")
        .required(fields::FACULTY, "Faculty is required")
        .required(fields::BRANCH, "ITI branch is required")
        .required(fields::TRACK_NAME, "Track is required")
        .required(fields::PROGRAM, "Program is required")
        .required(fields::INTAKE, "Intake is required")
        .required(fields::ROUND, "Round is required")
        .required(
            fields::ITI_GRADUATION_YEAR,
            "Graduation year from ITI is required",
        )
        .integer_between(
            fields::ITI_GRADUATION_YEAR,
            *graduation_years.start(),
            *graduation_years.end(),
            "Graduation year",
        );
}

fn work_experience(checks: &mut Checks<'_>) {
    if checks.form().flag(fields::IS_WORK) {
        checks
            .required(fields::JOB_TITLE, "Job title is required")
            .required(fields::COMPANY_NAME, "Company name is required")
            .required(
                fields::YEARS_OF_EXPERIENCE,
                "Years of experience is required",
            )
            .integer_between(
                fields::YEARS_OF_EXPERIENCE,
                0,
                MAX_YEARS_OF_EXPERIENCE,
                "Years of experience",
            );
    }

    if checks.form().flag(fields::IS_FREELANCER) {
        checks.required(
            fields::FREELANCING_GAIN,
            "Freelancing gain is required for freelancers",
        );
    }
}

fn teaching_preferences(checks: &mut Checks<'_>) {
    checks
        .required(
            fields::INTERESTED_IN_TEACHING,
            "Please tell us if you are interested in teaching",
        )
        .one_of(
            fields::INTERESTED_IN_TEACHING,
            &["yes", "no"],
            "Interest in teaching must be yes or no",
        );

    if checks.form().text(fields::INTERESTED_IN_TEACHING) == Some("yes") {
        checks
            .required(
                fields::PREFERRED_TEACHING_BRANCHES,
                "Select at least one branch to teach in",
            )
            .required(
                fields::PREFERRED_COURSES_TO_TEACH,
                "Select at least one course to teach",
            );
    }

    checks.matches(
        fields::LINKEDIN,
        linkedin_pattern(),
        "LinkedIn must be a linkedin.com profile URL",
    );
}
