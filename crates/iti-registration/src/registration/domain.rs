use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Program whose cohorts are scheduled by intake rather than by round.
pub const PROFESSIONAL_TRAINING_PROGRAM: &str = "Professional Training Program - (9 Months)";
/// Program whose cohorts are scheduled by round rather than by intake.
pub const INTENSIVE_CODE_CAMP: &str = "Intensive Code Camp - (4 Months)";

/// Field keys bound by the registration steps.
pub mod fields {
    pub const FULL_NAME: &str = "fullName";
    pub const PERSONAL_PHOTO: &str = "personalPhoto";
    pub const MOBILE: &str = "mobile";
    pub const EMAIL: &str = "email";
    pub const CITY_OF_BIRTH: &str = "cityOfBirth";

    pub const UNIVERSITY: &str = "university";
    pub const FACULTY: &str = "faculty";
    pub const BRANCH: &str = "branch";
    pub const TRACK_NAME: &str = "trackName";
    pub const PROGRAM: &str = "program";
    pub const INTAKE: &str = "intake";
    pub const ROUND: &str = "round";
    pub const ITI_GRADUATION_YEAR: &str = "itiGraduationYear";

    pub const IS_WORK: &str = "isWork";
    pub const JOB_TITLE: &str = "jobTitle";
    pub const COMPANY_NAME: &str = "companyName";
    pub const YEARS_OF_EXPERIENCE: &str = "yearsOfExperience";
    pub const IS_FREELANCER: &str = "isFreelancer";
    pub const FREELANCING_GAIN: &str = "freeLancingGain";

    pub const INTERESTED_IN_TEACHING: &str = "interestedInTeaching";
    pub const PREFERRED_TEACHING_BRANCHES: &str = "preferredTeachingBranches";
    pub const PREFERRED_COURSES_TO_TEACH: &str = "preferredCoursesToTeach";
    pub const LINKEDIN: &str = "linkedin";
}

/// Metadata for an uploaded file; the bytes travel separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

/// A single form value as captured from an input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    File(FileRef),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// True for null, empty/whitespace text, and empty lists.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(value) => value.trim().is_empty(),
            FieldValue::List(values) => values.is_empty(),
            FieldValue::Bool(_) | FieldValue::Number(_) | FieldValue::File(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Every user-entered value of the registration flow, keyed by field name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState(BTreeMap<String, FieldValue>);

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank registration with every field the steps bind.
    pub fn initial() -> Self {
        use fields::*;

        let mut state = Self::new();
        for key in [
            FULL_NAME,
            MOBILE,
            EMAIL,
            CITY_OF_BIRTH,
            UNIVERSITY,
            FACULTY,
            BRANCH,
            TRACK_NAME,
            PROGRAM,
            ROUND,
            JOB_TITLE,
            COMPANY_NAME,
            FREELANCING_GAIN,
            INTERESTED_IN_TEACHING,
            LINKEDIN,
        ] {
            state.set(key, FieldValue::text(""));
        }
        state.set(PERSONAL_PHOTO, FieldValue::Null);
        state.set(INTAKE, FieldValue::Null);
        state.set(ITI_GRADUATION_YEAR, FieldValue::Null);
        state.set(YEARS_OF_EXPERIENCE, FieldValue::Number(0.0));
        state.set(IS_WORK, FieldValue::Bool(false));
        state.set(IS_FREELANCER, FieldValue::Bool(false));
        state.set(PREFERRED_TEACHING_BRANCHES, FieldValue::List(Vec::new()));
        state.set(PREFERRED_COURSES_TO_TEACH, FieldValue::List(Vec::new()));
        state
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.0.insert(field.into(), value);
    }

    /// Copy of the state with one key replaced.
    pub fn with(&self, field: &str, value: FieldValue) -> Self {
        let mut next = self.clone();
        next.set(field, value);
        next
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn flag(&self, field: &str) -> bool {
        self.get(field)
            .and_then(FieldValue::as_bool)
            .unwrap_or(false)
    }

    /// The selected program, `None` when unset or blank.
    pub fn program(&self) -> Option<&str> {
        self.text(fields::PROGRAM)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, FieldValue)> for FormState {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Current per-field validation messages; an empty message clears the field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorState(BTreeMap<String, String>);

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// True when any field carries a non-empty message.
    pub fn has_errors(&self) -> bool {
        self.0.values().any(|message| !message.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl FromIterator<(String, String)> for ErrorState {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Option record rendered by select inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}
