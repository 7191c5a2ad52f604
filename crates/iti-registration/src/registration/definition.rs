use serde::Serialize;

use super::domain::fields;
use super::schema::StepSchema;

/// Pages of the registration flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStep {
    PersonalInformation,
    EducationDetails,
    WorkExperience,
    TeachingPreferences,
}

impl RegistrationStep {
    pub fn title(&self) -> &'static str {
        match self {
            RegistrationStep::PersonalInformation => "Personal Information",
            RegistrationStep::EducationDetails => "Education Details",
            RegistrationStep::WorkExperience => "Work Experience",
            RegistrationStep::TeachingPreferences => "Teaching Preferences",
        }
    }
}

/// Input widget a field is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Url,
    Number,
    Checkbox,
    File,
    Select,
    MultiSelect,
}

/// Where a select field draws its options from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionSource {
    Universities,
    Faculties,
    Programs,
    Intakes,
    Rounds,
    FreelanceGain,
    Tracks,
    Branches,
}

/// Layout entry for one field of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldLayout {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionSource>,
    /// Select accepts values outside its option list.
    pub creatable: bool,
    /// Checkbox that must be ticked before the field is editable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_by: Option<&'static str>,
}

const fn input(name: &'static str, label: &'static str, kind: FieldKind) -> FieldLayout {
    FieldLayout {
        name,
        label,
        kind,
        options: None,
        creatable: false,
        enabled_by: None,
    }
}

const fn select(name: &'static str, label: &'static str, source: OptionSource) -> FieldLayout {
    FieldLayout {
        name,
        label,
        kind: FieldKind::Select,
        options: Some(source),
        creatable: false,
        enabled_by: None,
    }
}

const fn creatable(mut layout: FieldLayout) -> FieldLayout {
    layout.creatable = true;
    layout
}

const fn enabled_by(mut layout: FieldLayout, toggle: &'static str) -> FieldLayout {
    layout.enabled_by = Some(toggle);
    layout
}

const fn multi(mut layout: FieldLayout) -> FieldLayout {
    layout.kind = FieldKind::MultiSelect;
    layout
}

const PERSONAL_FIELDS: &[FieldLayout] = &[
    input(fields::FULL_NAME, "Full Name", FieldKind::Text),
    input(fields::PERSONAL_PHOTO, "Personal Photo", FieldKind::File),
    input(fields::MOBILE, "Mobile", FieldKind::Tel),
    input(fields::EMAIL, "Email", FieldKind::Email),
    input(fields::CITY_OF_BIRTH, "City of Birth", FieldKind::Text),
];

const EDUCATION_FIELDS: &[FieldLayout] = &[
    creatable(select(
        fields::UNIVERSITY,
        "University",
        OptionSource::Universities,
    )),
    creatable(select(fields::FACULTY, "Faculty", OptionSource::Faculties)),
    select(
        fields::BRANCH,
        "ITI branch you graduated from",
        OptionSource::Branches,
    ),
    select(fields::TRACK_NAME, "Track", OptionSource::Tracks),
    select(fields::PROGRAM, "Program", OptionSource::Programs),
    select(fields::INTAKE, "Intake", OptionSource::Intakes),
    select(fields::ROUND, "Round", OptionSource::Rounds),
    input(
        fields::ITI_GRADUATION_YEAR,
        "Graduation Year From ITI",
        FieldKind::Number,
    ),
];

const WORK_FIELDS: &[FieldLayout] = &[
    enabled_by(
        input(fields::JOB_TITLE, "Job Title", FieldKind::Text),
        fields::IS_WORK,
    ),
    enabled_by(
        input(fields::COMPANY_NAME, "Company Name", FieldKind::Text),
        fields::IS_WORK,
    ),
    enabled_by(
        input(
            fields::YEARS_OF_EXPERIENCE,
            "Years of Experience",
            FieldKind::Number,
        ),
        fields::IS_WORK,
    ),
    enabled_by(
        select(
            fields::FREELANCING_GAIN,
            "Money gained from freelancing",
            OptionSource::FreelanceGain,
        ),
        fields::IS_FREELANCER,
    ),
    input(fields::IS_FREELANCER, "Is Freelancer", FieldKind::Checkbox),
    input(fields::IS_WORK, "Have Work", FieldKind::Checkbox),
];

const TEACHING_FIELDS: &[FieldLayout] = &[
    input(
        fields::INTERESTED_IN_TEACHING,
        "Interested in teaching at ITI",
        FieldKind::Text,
    ),
    multi(select(
        fields::PREFERRED_TEACHING_BRANCHES,
        "Preferred branches to teach in",
        OptionSource::Branches,
    )),
    multi(select(
        fields::PREFERRED_COURSES_TO_TEACH,
        "Preferred courses to teach",
        OptionSource::Tracks,
    )),
    input(fields::LINKEDIN, "LinkedIn Profile", FieldKind::Url),
];

/// One page of the flow: what it shows and how it is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    pub step: RegistrationStep,
    pub layout: &'static [FieldLayout],
    pub schema: StepSchema,
}

impl StepDefinition {
    pub fn title(&self) -> &'static str {
        self.step.title()
    }

    pub fn binds(&self, field: &str) -> bool {
        self.layout.iter().any(|entry| entry.name == field)
    }
}

/// Ordered steps of the registration flow; the position is the step index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDefinition {
    steps: Vec<StepDefinition>,
}

impl Default for FormDefinition {
    fn default() -> Self {
        Self::with_education_schema(StepSchema::education_details())
    }
}

impl FormDefinition {
    pub fn new(steps: Vec<StepDefinition>) -> Self {
        Self { steps }
    }

    /// Standard four-step flow with a caller supplied education schema.
    pub fn with_education_schema(education: StepSchema) -> Self {
        Self::new(vec![
            StepDefinition {
                step: RegistrationStep::PersonalInformation,
                layout: PERSONAL_FIELDS,
                schema: StepSchema::PersonalInformation,
            },
            StepDefinition {
                step: RegistrationStep::EducationDetails,
                layout: EDUCATION_FIELDS,
                schema: education,
            },
            StepDefinition {
                step: RegistrationStep::WorkExperience,
                layout: WORK_FIELDS,
                schema: StepSchema::WorkExperience,
            },
            StepDefinition {
                step: RegistrationStep::TeachingPreferences,
                layout: TEACHING_FIELDS,
                schema: StepSchema::TeachingPreferences,
            },
        ])
    }

    pub fn get(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDefinition> {
        self.steps.iter()
    }
}
