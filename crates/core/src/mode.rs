//! Generation modes and the per-mode form fields.
//!
//! [`ModeController`] holds the active [`GenerationMode`] together with the
//! fields of *both* modes. Switching modes never touches the other mode's
//! fields: they persist and are simply not displayed or submitted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Tabular mode identifier.
pub const MODE_TABULAR: &str = "tabular";

/// Image mode identifier.
pub const MODE_IMAGE: &str = "image";

/// Maximum length (in characters) of a free-text description.
pub const MAX_DESCRIPTION_LEN: usize = 4_000;

/// Maximum length (in bytes) of pasted sample data.
pub const MAX_SAMPLE_DATA_BYTES: usize = 256 * 1024;

// ---------------------------------------------------------------------------
// GenerationMode
// ---------------------------------------------------------------------------

/// Which generation pipeline is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    #[default]
    Tabular,
    Image,
}

impl GenerationMode {
    /// Parse from the wire name (`"tabular"` / `"image"`).
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            MODE_TABULAR => Ok(Self::Tabular),
            MODE_IMAGE => Ok(Self::Image),
            other => Err(CoreError::Validation(format!(
                "Unknown generation mode '{other}'. Must be one of: {MODE_TABULAR}, {MODE_IMAGE}"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Tabular => MODE_TABULAR,
            Self::Image => MODE_IMAGE,
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Form fields
// ---------------------------------------------------------------------------

/// Fields rendered in tabular mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularFields {
    /// What kind of synthetic data the user is asking for.
    #[serde(default)]
    pub description: String,
    /// Raw pasted sample, typically CSV. Never parsed.
    #[serde(default)]
    pub sample_data: String,
}

/// Fields rendered in image mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFields {
    #[serde(default)]
    pub description: String,
}

/// Snapshot of the fields belonging to the active mode only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ActiveFields {
    Tabular(TabularFields),
    Image(ImageFields),
}

/// Validate a free-text description.
///
/// Empty descriptions are accepted; only the upper bound is enforced so a
/// single request cannot carry an unbounded prompt.
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(CoreError::Validation(format!(
            "Description is {len} characters, maximum is {MAX_DESCRIPTION_LEN}"
        )));
    }
    Ok(())
}

/// Validate pasted sample data. Empty samples are accepted.
pub fn validate_sample_data(sample: &str) -> Result<(), CoreError> {
    if sample.len() > MAX_SAMPLE_DATA_BYTES {
        return Err(CoreError::Validation(format!(
            "Sample data is {} bytes, maximum is {MAX_SAMPLE_DATA_BYTES}",
            sample.len()
        )));
    }
    Ok(())
}

impl TabularFields {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_description(&self.description)?;
        validate_sample_data(&self.sample_data)
    }
}

impl ImageFields {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_description(&self.description)
    }
}

// ---------------------------------------------------------------------------
// ModeController
// ---------------------------------------------------------------------------

/// Holds the active mode and the fields of every mode.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    mode: GenerationMode,
    tabular: TabularFields,
    image: ImageFields,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    /// Switch the active mode. Pure assignment; never fails.
    pub fn set_mode(&mut self, mode: GenerationMode) {
        self.mode = mode;
    }

    pub fn tabular(&self) -> &TabularFields {
        &self.tabular
    }

    pub fn image(&self) -> &ImageFields {
        &self.image
    }

    pub fn set_tabular(&mut self, fields: TabularFields) {
        self.tabular = fields;
    }

    pub fn set_image(&mut self, fields: ImageFields) {
        self.image = fields;
    }

    /// Fields of the active mode, cloned for display.
    pub fn active_fields(&self) -> ActiveFields {
        match self.mode {
            GenerationMode::Tabular => ActiveFields::Tabular(self.tabular.clone()),
            GenerationMode::Image => ActiveFields::Image(self.image.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
