use serde::{Deserialize, Serialize};

use super::domain::{FieldValue, FileRef, FormState, SelectOption};

/// Raw value carried by an input event, tagged with the kind of input that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InputValue {
    Text(String),
    /// Number inputs report their raw text; parsing happens on apply.
    Number(String),
    Checkbox(bool),
    File(Option<FileRef>),
    MultiSelect(Vec<String>),
}

/// A single input event: which field changed and to what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputChange {
    pub name: String,
    pub value: InputValue,
}

impl InputChange {
    pub fn new(name: impl Into<String>, value: InputValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, InputValue::Text(value.into()))
    }

    pub fn number(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::new(name, InputValue::Number(raw.into()))
    }

    pub fn checkbox(name: impl Into<String>, checked: bool) -> Self {
        Self::new(name, InputValue::Checkbox(checked))
    }

    /// Value committed to the form state when the change is applied.
    pub fn field_value(&self) -> FieldValue {
        match &self.value {
            InputValue::Text(value) => FieldValue::Text(value.clone()),
            InputValue::Number(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    FieldValue::Null
                } else {
                    match trimmed.parse::<f64>() {
                        Ok(number) if number.is_finite() => FieldValue::Number(number),
                        _ => FieldValue::Text(raw.clone()),
                    }
                }
            }
            InputValue::Checkbox(checked) => FieldValue::Bool(*checked),
            InputValue::File(file) => file
                .clone()
                .map(FieldValue::File)
                .unwrap_or(FieldValue::Null),
            InputValue::MultiSelect(values) => FieldValue::List(values.clone()),
        }
    }

    /// Candidate validated when the input loses focus.
    ///
    /// Number inputs that are empty or not numeric are validated as `0`, which makes a blank
    /// required number look filled in until the step is advanced.
    pub fn blur_value(&self) -> FieldValue {
        match &self.value {
            InputValue::Number(raw) => match raw.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => FieldValue::Number(number),
                _ => FieldValue::Number(0.0),
            },
            _ => self.field_value(),
        }
    }
}

/// Replace the single key named by `change`.
pub fn apply_input_change(mut form: FormState, change: &InputChange) -> FormState {
    form.set(change.name.clone(), change.field_value());
    form
}

/// Store the selected option's value under `field`, or an empty string when cleared.
pub fn apply_select_change(
    mut form: FormState,
    selected: Option<&SelectOption>,
    field: &str,
) -> FormState {
    let value = selected
        .map(|option| option.value.clone())
        .unwrap_or_default();
    form.set(field, FieldValue::Text(value));
    form
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::domain::fields;
    use serde_json::json;

    #[test]
    fn input_change_replaces_only_the_named_key() {
        let form = FormState::initial();
        let before = form.clone();

        let form = apply_input_change(form, &InputChange::text(fields::FULL_NAME, "Omar Said"));

        assert_eq!(form.text(fields::FULL_NAME), Some("Omar Said"));
        for (key, value) in before.iter().filter(|(key, _)| *key != fields::FULL_NAME) {
            assert_eq!(form.get(key), Some(value), "{key} should be untouched");
        }
    }

    #[test]
    fn number_inputs_parse_when_possible() {
        let parsed = InputChange::number(fields::ITI_GRADUATION_YEAR, "2019");
        assert_eq!(parsed.field_value(), FieldValue::Number(2019.0));

        let blank = InputChange::number(fields::ITI_GRADUATION_YEAR, " ");
        assert_eq!(blank.field_value(), FieldValue::Null);

        let garbage = InputChange::number(fields::ITI_GRADUATION_YEAR, "20x9");
        assert_eq!(garbage.field_value(), FieldValue::text("20x9"));
    }

    #[test]
    fn blur_value_zero_fills_numbers() {
        assert_eq!(
            InputChange::number(fields::YEARS_OF_EXPERIENCE, "").blur_value(),
            FieldValue::Number(0.0)
        );
        assert_eq!(
            InputChange::number(fields::YEARS_OF_EXPERIENCE, "abc").blur_value(),
            FieldValue::Number(0.0)
        );
        assert_eq!(
            InputChange::text(fields::JOB_TITLE, "").blur_value(),
            FieldValue::text("")
        );
    }

    #[test]
    fn checkbox_and_file_inputs_map_to_typed_values() {
        let form = apply_input_change(FormState::initial(), &InputChange::checkbox(fields::IS_WORK, true));
        assert!(form.flag(fields::IS_WORK));

        let cleared = InputChange::new(fields::PERSONAL_PHOTO, InputValue::File(None));
        let form = apply_input_change(form, &cleared);
        assert_eq!(form.get(fields::PERSONAL_PHOTO), Some(&FieldValue::Null));
    }

    #[test]
    fn select_change_stores_value_or_empty_string() {
        let option = SelectOption::new("Cairo University", "Cairo University");
        let form = apply_select_change(FormState::initial(), Some(&option), fields::UNIVERSITY);
        assert_eq!(form.text(fields::UNIVERSITY), Some("Cairo University"));

        let form = apply_select_change(form, None, fields::UNIVERSITY);
        assert_eq!(form.text(fields::UNIVERSITY), Some(""));
    }

    #[test]
    fn input_change_wire_format_tags_the_input_kind() {
        let change: InputChange = serde_json::from_value(json!({
            "name": "itiGraduationYear",
            "value": { "kind": "number", "value": "2020" }
        }))
        .expect("input change json");

        assert_eq!(change, InputChange::number(fields::ITI_GRADUATION_YEAR, "2020"));
    }
}
