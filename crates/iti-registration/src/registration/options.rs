use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::definition::{FormDefinition, OptionSource};
use super::domain::SelectOption;

const DEFAULT_CATALOG: &str = include_str!("../../data/select_options.json");
const DEFAULT_DIRECTORY: &str = include_str!("../../data/directory.json");

/// Errors raised while loading option documents.
#[derive(Debug, thiserror::Error)]
pub enum OptionDataError {
    #[error("failed to read option data from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid option data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Static lookup lists keyed by category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptionCatalog {
    #[serde(rename = "Universities", default)]
    pub universities: Vec<SelectOption>,
    #[serde(rename = "faculties", default)]
    pub faculties: Vec<SelectOption>,
    #[serde(rename = "Program", default)]
    pub programs: Vec<SelectOption>,
    #[serde(rename = "intake", default)]
    pub intakes: Vec<SelectOption>,
    #[serde(rename = "Round", default)]
    pub rounds: Vec<SelectOption>,
    #[serde(rename = "FreeLanceGain", default)]
    pub freelance_gain: Vec<SelectOption>,
}

impl OptionCatalog {
    /// Catalog shipped with the crate.
    pub fn bundled() -> Result<Self, OptionDataError> {
        Ok(serde_json::from_str(DEFAULT_CATALOG)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OptionDataError> {
        Ok(serde_json::from_str(&read(path.as_ref())?)?)
    }
}

/// Named record as returned by the branch/track directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRecord {
    pub name: String,
}

/// Dynamically supplied tracks and branches.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BranchesAndTracks {
    #[serde(default)]
    pub tracks: Vec<NamedRecord>,
    #[serde(default)]
    pub branches: Vec<NamedRecord>,
}

impl BranchesAndTracks {
    pub fn bundled() -> Result<Self, OptionDataError> {
        Ok(serde_json::from_str(DEFAULT_DIRECTORY)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OptionDataError> {
        Ok(serde_json::from_str(&read(path.as_ref())?)?)
    }
}

/// Turn named records into options, dropping repeated names but keeping first-seen order.
pub fn options_from_names(records: &[NamedRecord]) -> Vec<SelectOption> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| seen.insert(record.name.as_str()))
        .map(|record| SelectOption::new(record.name.clone(), record.name.clone()))
        .collect()
}

/// Resolves the option list behind each select field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionProvider {
    catalog: OptionCatalog,
    tracks: Vec<SelectOption>,
    branches: Vec<SelectOption>,
}

impl OptionProvider {
    pub fn new(catalog: OptionCatalog, directory: &BranchesAndTracks) -> Self {
        Self {
            catalog,
            tracks: options_from_names(&directory.tracks),
            branches: options_from_names(&directory.branches),
        }
    }

    pub fn bundled() -> Result<Self, OptionDataError> {
        Ok(Self::new(
            OptionCatalog::bundled()?,
            &BranchesAndTracks::bundled()?,
        ))
    }

    pub fn options(&self, source: OptionSource) -> &[SelectOption] {
        match source {
            OptionSource::Universities => &self.catalog.universities,
            OptionSource::Faculties => &self.catalog.faculties,
            OptionSource::Programs => &self.catalog.programs,
            OptionSource::Intakes => &self.catalog.intakes,
            OptionSource::Rounds => &self.catalog.rounds,
            OptionSource::FreelanceGain => &self.catalog.freelance_gain,
            OptionSource::Tracks => &self.tracks,
            OptionSource::Branches => &self.branches,
        }
    }

    /// Options for a field, `None` when the field is not a select.
    pub fn options_for(&self, definition: &FormDefinition, field: &str) -> Option<&[SelectOption]> {
        definition
            .iter()
            .flat_map(|step| step.layout.iter())
            .find(|entry| entry.name == field)
            .and_then(|entry| entry.options)
            .map(|source| self.options(source))
    }

    /// Option lists for every select field in the flow, keyed by field name.
    pub fn by_field(&self, definition: &FormDefinition) -> BTreeMap<&'static str, Vec<SelectOption>> {
        definition
            .iter()
            .flat_map(|step| step.layout.iter())
            .filter_map(|entry| {
                entry
                    .options
                    .map(|source| (entry.name, self.options(source).to_vec()))
            })
            .collect()
    }
}

fn read(path: &Path) -> Result<String, OptionDataError> {
    std::fs::read_to_string(path).map_err(|source| OptionDataError::Io {
        path: path.display().to_string(),
        source,
    })
}
