//! Min-max normalization fitted once per run.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::population::check_vectors;
use crate::types::Direction;

/// Per-objective min-max scale.
///
/// [`transform`](Self::transform) maps the fitted minimum to 0 and the fitted
/// maximum to 1, linearly, without clamping: values outside the basis range
/// extrapolate below 0 or above 1. A dimension with zero range is only
/// shifted.
///
/// Optimization direction plays no part in scaling.
///
/// ```
/// use hvconv::Scaler;
///
/// let scaler = Scaler::fit(&[vec![0.0, 10.0], vec![2.0, 20.0]]).unwrap();
/// let scaled = scaler.transform(&[vec![1.0, 30.0]]).unwrap();
/// assert_eq!(scaled, vec![vec![0.5, 2.0]]);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Scaler {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl Scaler {
    /// Fit on a basis of objective vectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBasis`] for an empty basis,
    /// [`Error::DimensionMismatch`] for ragged vectors and
    /// [`Error::NonFinite`] for NaN or infinite values.
    pub fn fit(basis: &[Vec<f64>]) -> Result<Self> {
        let first = basis.first().ok_or(Error::EmptyBasis)?;
        check_vectors(basis, first.len())?;

        let mut min = first.clone();
        let mut max = first.clone();
        for v in &basis[1..] {
            for (k, &x) in v.iter().enumerate() {
                min[k] = min[k].min(x);
                max[k] = max[k].max(x);
            }
        }
        Ok(Self { min, max })
    }

    /// Number of objectives this scaler was fitted on.
    #[must_use]
    pub fn dims(&self) -> usize {
        self.min.len()
    }

    /// Fitted per-objective minima.
    #[must_use]
    pub fn min(&self) -> &[f64] {
        &self.min
    }

    /// Fitted per-objective maxima.
    #[must_use]
    pub fn max(&self) -> &[f64] {
        &self.max
    }

    fn scale(&self, k: usize) -> f64 {
        let range = self.max[k] - self.min[k];
        if range > 0.0 { range } else { 1.0 }
    }

    /// Map vectors into the fitted unit hyper-cube.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if a vector's length differs
    /// from [`dims`](Self::dims) and [`Error::NonFinite`] for NaN or
    /// infinite values.
    pub fn transform(&self, vectors: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        check_vectors(vectors, self.dims())?;
        Ok(vectors
            .iter()
            .map(|v| {
                v.iter()
                    .enumerate()
                    .map(|(k, &x)| (x - self.min[k]) / self.scale(k))
                    .collect()
            })
            .collect())
    }

    /// The hypervolume reference corner for the fitted basis, in scaled
    /// coordinates.
    ///
    /// Each coordinate is the worst scaled value of the basis for that
    /// objective: the maximum (1, or 0 for a zero-range dimension) when
    /// minimizing, the minimum (0) when maximizing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `directions` does not
    /// match [`dims`](Self::dims).
    pub fn reference_point(&self, directions: &[Direction]) -> Result<Vec<f64>> {
        if directions.len() != self.dims() {
            return Err(Error::config(format!(
                "{} directions for a scaler fitted on {} objectives",
                directions.len(),
                self.dims()
            )));
        }
        Ok(directions
            .iter()
            .enumerate()
            .map(|(k, dir)| match dir {
                Direction::Minimize => (self.max[k] - self.min[k]) / self.scale(k),
                Direction::Maximize => 0.0,
            })
            .collect())
    }
}
