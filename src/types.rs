//! Core types shared by the sorter, scaler and hypervolume engine.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The direction of optimization for one objective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Smaller values are better.
    #[cfg_attr(feature = "serde", serde(alias = "min"))]
    Minimize,
    /// Larger values are better.
    #[cfg_attr(feature = "serde", serde(alias = "max"))]
    Maximize,
}

impl Direction {
    /// Map `value` into minimization space (negate when maximizing).
    #[must_use]
    pub fn to_minimization(self, value: f64) -> f64 {
        match self {
            Self::Minimize => value,
            Self::Maximize => -value,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Minimize => "min",
            Self::Maximize => "max",
        })
    }
}

impl FromStr for Direction {
    type Err = Error;

    /// Accepts `min`, `minimize`, `max` and `maximize` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" | "minimize" => Ok(Self::Minimize),
            "max" | "maximize" => Ok(Self::Maximize),
            other => Err(Error::config(format!(
                "unknown direction '{other}', expected 'min' or 'max'"
            ))),
        }
    }
}
