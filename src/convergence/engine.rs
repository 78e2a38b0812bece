use crate::config::Objectives;
use crate::error::{Error, Result};
use crate::pareto::hypervolume;
use crate::population::check_vectors;
use crate::scaler::Scaler;
use crate::types::Direction;

/// Scores generations against one fixed reference point.
///
/// Build it once per run (after fitting the [`Scaler`]) and share it with
/// every task; it holds no mutable state.
#[derive(Clone, Debug, PartialEq)]
pub struct HypervolumeEngine {
    reference_point: Vec<f64>,
    directions: Vec<Direction>,
}

impl HypervolumeEngine {
    /// Engine with an explicit reference point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the lengths differ or a
    /// coordinate is not finite.
    pub fn new(reference_point: Vec<f64>, directions: Vec<Direction>) -> Result<Self> {
        if reference_point.len() != directions.len() {
            return Err(Error::config(format!(
                "reference point has {} coordinates for {} directions",
                reference_point.len(),
                directions.len()
            )));
        }
        if reference_point.iter().any(|x| !x.is_finite()) {
            return Err(Error::config("reference point must be finite"));
        }
        Ok(Self {
            reference_point,
            directions,
        })
    }

    /// Engine whose reference point is the worst corner of the scaler's
    /// fitted basis.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the scaler was fitted on
    /// a different number of objectives.
    pub fn from_scaler(scaler: &Scaler, objectives: &Objectives) -> Result<Self> {
        let reference_point = scaler.reference_point(objectives.directions())?;
        Self::new(reference_point, objectives.directions().to_vec())
    }

    /// The fixed reference corner.
    #[must_use]
    pub fn reference_point(&self) -> &[f64] {
        &self.reference_point
    }

    /// Hypervolume of one (normalized) generation. Empty generations score 0.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] or [`Error::NonFinite`] for a
    /// malformed vector.
    pub fn score(&self, generation: &[Vec<f64>]) -> Result<f64> {
        check_vectors(generation, self.reference_point.len())?;
        Ok(hypervolume(generation, &self.reference_point, &self.directions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_generation_scores_zero() {
        let engine = HypervolumeEngine::new(vec![1.0, 1.0], vec![Direction::Minimize; 2]).unwrap();
        assert!(engine.score(&[]).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_vector_is_an_error() {
        let engine = HypervolumeEngine::new(vec![1.0, 1.0], vec![Direction::Minimize; 2]).unwrap();
        let err = engine.score(&[vec![0.5, 0.5], vec![0.5]]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { row: 1, .. }));
    }

    #[test]
    fn maximized_objective_uses_lower_reference() {
        let objectives = Objectives::builder()
            .minimize("cost", 0.1)
            .maximize("benefit", 0.1)
            .build()
            .unwrap();
        let basis = vec![vec![0.0, 0.0], vec![10.0, 10.0]];
        let scaler = Scaler::fit(&basis).unwrap();
        let engine = HypervolumeEngine::from_scaler(&scaler, &objectives).unwrap();
        assert_eq!(engine.reference_point(), &[1.0, 0.0]);

        // Cheap and beneficial: box from (0.2, 0.8) to (1, 0) → 0.8 * 0.8.
        let generation = scaler.transform(&[vec![2.0, 8.0]]).unwrap();
        let hv = engine.score(&generation).unwrap();
        assert!((hv - 0.64).abs() < 1e-12);
    }

    #[test]
    fn mismatched_reference_is_rejected() {
        assert!(HypervolumeEngine::new(vec![1.0], vec![Direction::Minimize; 2]).is_err());
        assert!(HypervolumeEngine::new(vec![f64::NAN], vec![Direction::Minimize]).is_err());
    }
}
