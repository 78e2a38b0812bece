//! Run configuration: the checked objective ordering and batch settings.
//!
//! Every component receives an [`Objectives`] value. It stores each
//! objective's name, direction and epsilon together, so the three can never
//! drift out of order once constructed.
//!
//! ```
//! use hvconv::{Direction, Objectives};
//!
//! let objectives = Objectives::builder()
//!     .minimize("welfare", 0.1)
//!     .minimize("years_above_threshold", 0.25)
//!     .maximize("welfare_loss_damage", 10.0)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(objectives.len(), 3);
//! assert_eq!(objectives.directions()[2], Direction::Maximize);
//! ```

#[cfg(feature = "serde")]
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Direction;

/// One objective: column name, optimization direction and epsilon resolution.
#[derive(Clone, Debug, PartialEq)]
struct Objective {
    name: String,
    direction: Direction,
    epsilon: f64,
}

/// The validated, ordered set of objectives for one run variant.
///
/// Cached `directions` and `epsilons` slices are derived from the same
/// entries, in the same order, at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Objectives {
    entries: Vec<Objective>,
    directions: Vec<Direction>,
    epsilons: Vec<f64>,
}

impl Objectives {
    /// Start building an objective set.
    #[must_use]
    pub fn builder() -> ObjectivesBuilder {
        ObjectivesBuilder::default()
    }

    /// Build from three parallel lists, as they arrive from a CLI or a
    /// configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the lists differ in length,
    /// are empty, contain a duplicate or empty name, or any epsilon is not
    /// strictly positive and finite.
    pub fn from_lists<S: AsRef<str>>(
        names: &[S],
        directions: &[Direction],
        epsilons: &[f64],
    ) -> Result<Self> {
        if names.len() != directions.len() || names.len() != epsilons.len() {
            return Err(Error::config(format!(
                "{} objectives, {} directions and {} epsilons must have equal length",
                names.len(),
                directions.len(),
                epsilons.len()
            )));
        }
        let mut builder = Self::builder();
        for ((name, &direction), &epsilon) in names.iter().zip(directions).zip(epsilons) {
            builder = builder.objective(name.as_ref(), direction, epsilon);
        }
        builder.build()
    }

    /// Number of objectives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false` for a built set; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Objective names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|o| o.name.as_str()).collect()
    }

    /// Per-objective directions in order.
    #[must_use]
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// Per-objective epsilons in order.
    #[must_use]
    pub fn epsilons(&self) -> &[f64] {
        &self.epsilons
    }
}

/// Fluent builder for [`Objectives`]. Validation happens in [`build`](Self::build).
#[derive(Clone, Debug, Default)]
pub struct ObjectivesBuilder {
    entries: Vec<Objective>,
}

impl ObjectivesBuilder {
    /// Append an objective.
    #[must_use]
    pub fn objective(mut self, name: impl Into<String>, direction: Direction, epsilon: f64) -> Self {
        self.entries.push(Objective {
            name: name.into(),
            direction,
            epsilon,
        });
        self
    }

    /// Append a minimized objective.
    #[must_use]
    pub fn minimize(self, name: impl Into<String>, epsilon: f64) -> Self {
        self.objective(name, Direction::Minimize, epsilon)
    }

    /// Append a maximized objective.
    #[must_use]
    pub fn maximize(self, name: impl Into<String>, epsilon: f64) -> Self {
        self.objective(name, Direction::Maximize, epsilon)
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an empty set, an empty or
    /// duplicate name, or a non-positive or non-finite epsilon.
    pub fn build(self) -> Result<Objectives> {
        if self.entries.is_empty() {
            return Err(Error::config("at least one objective is required"));
        }
        for (i, obj) in self.entries.iter().enumerate() {
            if obj.name.trim().is_empty() {
                return Err(Error::config(format!("objective {i} has an empty name")));
            }
            if self.entries[..i].iter().any(|o| o.name == obj.name) {
                return Err(Error::config(format!(
                    "objective '{}' is listed twice",
                    obj.name
                )));
            }
            if !(obj.epsilon.is_finite() && obj.epsilon > 0.0) {
                return Err(Error::config(format!(
                    "epsilon for '{}' must be positive and finite, got {}",
                    obj.name, obj.epsilon
                )));
            }
        }
        let directions = self.entries.iter().map(|o| o.direction).collect();
        let epsilons = self.entries.iter().map(|o| o.epsilon).collect();
        Ok(Objectives {
            entries: self.entries,
            directions,
            epsilons,
        })
    }
}

/// Batch settings for building reference sets and scoring run files.
///
/// Usually read from a JSON file:
///
/// ```json
/// {
///   "objectives": ["welfare", "years_above_threshold"],
///   "directions": ["min", "max"],
///   "epsilons": [0.1, 0.25],
///   "variants": ["PRIORITARIAN"],
///   "nfe": "150000",
///   "input_dir": "data/archives",
///   "output_dir": "data/convergence_metrics",
///   "reference_set_file": "data/convergence_metrics/PRIORITARIAN_reference_set.csv"
/// }
/// ```
#[cfg(feature = "serde")]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Objective column names, order-significant.
    #[serde(default)]
    pub objectives: Vec<String>,
    /// One direction per objective.
    #[serde(default)]
    pub directions: Vec<Direction>,
    /// One epsilon per objective.
    #[serde(default)]
    pub epsilons: Vec<f64>,
    /// Run-variant identifiers (archive file-name prefixes).
    #[serde(default)]
    pub variants: Vec<String>,
    /// Target NFE as it appears in archive file names.
    #[serde(default)]
    pub nfe: Option<String>,
    /// Directory holding the archive bundles.
    #[serde(default)]
    pub input_dir: Option<PathBuf>,
    /// Directory receiving reference sets and score tables.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Reference set to normalize against; the pooled archive when absent.
    #[serde(default)]
    pub reference_set_file: Option<PathBuf>,
    /// Worker threads; available parallelism when absent.
    #[serde(default)]
    pub threads: Option<usize>,
}

#[cfg(feature = "serde")]
impl RunConfig {
    /// Read a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::Config`] if it is not valid JSON for this shape.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// The validated objective set.
    ///
    /// # Errors
    ///
    /// See [`Objectives::from_lists`].
    pub fn objectives(&self) -> Result<Objectives> {
        Objectives::from_lists(&self.objectives, &self.directions, &self.epsilons)
    }

    /// The input directory, required for every batch operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when unset.
    pub fn input_dir(&self) -> Result<&Path> {
        self.input_dir
            .as_deref()
            .ok_or_else(|| Error::config("input_dir is not set"))
    }

    /// The output directory, required for every batch operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when unset.
    pub fn output_dir(&self) -> Result<&Path> {
        self.output_dir
            .as_deref()
            .ok_or_else(|| Error::config("output_dir is not set"))
    }

    /// The target NFE, required for reference-set builds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when unset or blank.
    pub fn nfe(&self) -> Result<&str> {
        self.nfe
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::config("nfe is not set"))
    }

    /// Check every field needed for a batch before any work starts.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::InvalidConfiguration`] found.
    pub fn validate(&self) -> Result<()> {
        self.objectives()?;
        self.input_dir()?;
        self.output_dir()?;
        if self.variants.is_empty() {
            return Err(Error::config("at least one run variant is required"));
        }
        if self.variants.iter().any(|v| v.trim().is_empty()) {
            return Err(Error::config("variant identifiers must not be empty"));
        }
        if self.threads == Some(0) {
            return Err(Error::config("threads must be at least 1"));
        }
        Ok(())
    }
}
