//! Run options.
//!
//! Options are plain serde data so they can live next to a project in a YAML
//! or JSON file. Every field has a default; a file only needs the fields it
//! changes.
//!
//! ```yaml
//! tolerance: 0.1
//! preserve_types: true
//! keep_duplicates: true
//! track_origins: true
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::DEFAULT_ROBUSTNESS;
use crate::error::{DeoverlapError, OptionsError};

/// Output mode, derived from the option flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Points and line strings only; polygons are reduced to their outline.
    Flat,
    /// Geometry kinds are preserved.
    Structured,
    /// Structured, plus per-origin part maps and wholly-removed indices.
    Tracked,
}

impl Mode {
    #[inline]
    pub fn preserves_types(self) -> bool {
        !matches!(self, Mode::Flat)
    }
}

/// Options for one deoverlap run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeoverlapOptions {
    /// Distance within which geometries count as overlapping. Also the
    /// buffer radius of every claim.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Keep geometry kinds instead of flattening to points and lines.
    #[serde(default)]
    pub preserve_types: bool,

    /// Return the removed portions as well as the kept ones.
    #[serde(default)]
    pub keep_duplicates: bool,

    /// Map output parts back to their input index. Requires `preserve_types`.
    #[serde(default)]
    pub track_origins: bool,

    /// Remainder line parts at or below this length are dropped as slivers.
    #[serde(default = "default_min_length")]
    pub min_length: f64,

    /// Remainder polygon parts at or below this area are dropped as slivers.
    #[serde(default = "default_min_area")]
    pub min_area: f64,

    /// Extra growth applied to the claimed region before clipping, so exactly
    /// coincident boundaries clip the same way every time.
    #[serde(default = "default_robustness")]
    pub robustness: f64,
}

fn default_tolerance() -> f64 {
    0.1
}

fn default_min_length() -> f64 {
    1e-9
}

fn default_min_area() -> f64 {
    1e-12
}

fn default_robustness() -> f64 {
    DEFAULT_ROBUSTNESS
}

impl Default for DeoverlapOptions {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            preserve_types: false,
            keep_duplicates: false,
            track_origins: false,
            min_length: default_min_length(),
            min_area: default_min_area(),
            robustness: default_robustness(),
        }
    }
}

impl DeoverlapOptions {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self { tolerance, ..Self::default() }
    }

    pub fn preserve_types(mut self, preserve_types: bool) -> Self {
        self.preserve_types = preserve_types;
        self
    }

    pub fn keep_duplicates(mut self, keep_duplicates: bool) -> Self {
        self.keep_duplicates = keep_duplicates;
        self
    }

    pub fn track_origins(mut self, track_origins: bool) -> Self {
        self.track_origins = track_origins;
        self
    }

    pub fn min_length(mut self, min_length: f64) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }

    pub fn robustness(mut self, robustness: f64) -> Self {
        self.robustness = robustness;
        self
    }

    /// The output mode these flags select.
    ///
    /// Only meaningful once [`validate`](Self::validate) has passed.
    pub fn mode(&self) -> Mode {
        match (self.preserve_types, self.track_origins) {
            (false, _) => Mode::Flat,
            (true, false) => Mode::Structured,
            (true, true) => Mode::Tracked,
        }
    }

    /// Fail-fast checks, run before any geometric work.
    pub fn validate(&self) -> Result<(), DeoverlapError> {
        if self.track_origins && !self.preserve_types {
            return Err(DeoverlapError::InvalidConfiguration(
                "track_origins requires preserve_types".to_string(),
            ));
        }
        // NaN fails this comparison too
        if !(self.tolerance >= 0.0) {
            return Err(DeoverlapError::NegativeTolerance(self.tolerance));
        }
        if !self.tolerance.is_finite() {
            return Err(DeoverlapError::InvalidConfiguration(format!(
                "tolerance must be finite, got {}",
                self.tolerance
            )));
        }
        for (name, value) in [
            ("min_length", self.min_length),
            ("min_area", self.min_area),
            ("robustness", self.robustness),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(DeoverlapError::InvalidConfiguration(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate options from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, OptionsError> {
        let options: Self = serde_yaml::from_str(yaml)?;
        options.validate()?;
        Ok(options)
    }

    /// Parse and validate options from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, OptionsError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_yaml_string(&self) -> Result<String, OptionsError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

// ============================================================================
// TESTS
// ============================================================================
