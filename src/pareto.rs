//! Pareto analysis: epsilon-dominance sorting and the hypervolume indicator.
//!
//! | Function | Purpose |
//! |---|---|
//! | [`eps_sort`] | Non-dominated subset at a per-objective epsilon resolution |
//! | [`eps_sort_indices`] | Same, returning indices into the input |
//! | [`hypervolume`] | Volume of objective space dominated by a front, bounded by a reference point |
//!
//! # Example
//!
//! ```
//! use hvconv::Direction;
//! use hvconv::pareto::{eps_sort, hypervolume};
//!
//! let solutions = vec![
//!     vec![1.0, 5.0], // Pareto-optimal
//!     vec![5.0, 1.0], // Pareto-optimal
//!     vec![3.0, 3.0], // Pareto-optimal
//!     vec![4.0, 4.0], // Dominated by (3, 3)
//! ];
//! let dirs = [Direction::Minimize, Direction::Minimize];
//!
//! let front = eps_sort(&solutions, &[0.5, 0.5], &dirs).unwrap();
//! assert_eq!(front.len(), 3);
//!
//! let hv = hypervolume(&front, &[6.0, 6.0], &dirs);
//! assert!(hv > 0.0);
//! ```

use crate::error::{Error, Result};
use crate::population::check_vectors;
use crate::types::Direction;

/// Returns `true` if solution `a` Pareto-dominates solution `b`.
///
/// A solution dominates another if it is at least as good in all objectives
/// and strictly better in at least one, respecting the given directions.
pub(crate) fn dominates(a: &[f64], b: &[f64], directions: &[Direction]) -> bool {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len(), directions.len());

    let mut strictly_better = false;
    for ((&av, &bv), dir) in a.iter().zip(b.iter()).zip(directions.iter()) {
        let better = match dir {
            Direction::Minimize => av < bv,
            Direction::Maximize => av > bv,
        };
        let worse = match dir {
            Direction::Minimize => av > bv,
            Direction::Maximize => av < bv,
        };
        if worse {
            return false;
        }
        if better {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Epsilon box of one vector: `floor(v / eps)` per coordinate, plus the
/// squared distance from the vector to the box's ideal corner.
fn epsilon_box(v: &[f64], epsilons: &[f64], directions: &[Direction]) -> (Vec<f64>, f64) {
    let mut index = Vec::with_capacity(v.len());
    let mut dist = 0.0;
    for ((&x, &eps), dir) in v.iter().zip(epsilons).zip(directions) {
        let b = (x / eps).floor();
        let corner = match dir {
            Direction::Minimize => b * eps,
            Direction::Maximize => (b + 1.0) * eps,
        };
        dist += (x - corner).powi(2);
        index.push(b);
    }
    (index, dist)
}

fn check_sort_inputs(vectors: &[Vec<f64>], epsilons: &[f64], directions: &[Direction]) -> Result<()> {
    if epsilons.len() != directions.len() {
        return Err(Error::config(format!(
            "{} epsilons but {} directions",
            epsilons.len(),
            directions.len()
        )));
    }
    if let Some(&eps) = epsilons.iter().find(|e| !(e.is_finite() && **e > 0.0)) {
        return Err(Error::config(format!(
            "epsilons must be positive and finite, got {eps}"
        )));
    }
    if let Some(first) = vectors.first().filter(|v| v.len() != epsilons.len()) {
        return Err(Error::config(format!(
            "{} epsilons for {}-dimensional objective vectors",
            epsilons.len(),
            first.len()
        )));
    }
    check_vectors(vectors, epsilons.len())
}

/// Epsilon non-dominated sorting, returning indices into `vectors`.
///
/// Each vector is assigned an epsilon box (`floor(v / eps)` per objective).
/// A vector is kept only if no other vector's box epsilon-dominates its box.
/// Among vectors sharing a box, the one closest to the box's ideal corner
/// survives; on a tie the first encountered is kept.
///
/// The returned indices are in ascending order.
///
/// # Errors
///
/// Returns [`Error::InvalidConfiguration`] if `epsilons` and `directions`
/// disagree with each other or with the vector dimensionality, or an
/// epsilon is not positive and finite. Returns [`Error::DimensionMismatch`]
/// for ragged input and [`Error::NonFinite`] for NaN or infinite values.
pub fn eps_sort_indices(
    vectors: &[Vec<f64>],
    epsilons: &[f64],
    directions: &[Direction],
) -> Result<Vec<usize>> {
    check_sort_inputs(vectors, epsilons, directions)?;

    // (source index, box index, distance to corner)
    let mut archive: Vec<(usize, Vec<f64>, f64)> = Vec::new();

    for (i, v) in vectors.iter().enumerate() {
        let (boxed, dist) = epsilon_box(v, epsilons, directions);

        let rejected = archive.iter().any(|(_, other, other_dist)| {
            if *other == boxed {
                *other_dist <= dist
            } else {
                dominates(other, &boxed, directions)
            }
        });
        if rejected {
            continue;
        }

        archive.retain(|(_, other, _)| *other != boxed && !dominates(&boxed, other, directions));
        archive.push((i, boxed, dist));
    }

    let mut indices: Vec<usize> = archive.into_iter().map(|(i, _, _)| i).collect();
    indices.sort_unstable();
    Ok(indices)
}

/// Epsilon non-dominated sorting, returning the surviving vectors.
///
/// Every returned vector is an exact copy of one input vector. See
/// [`eps_sort_indices`] for the dominance rules.
///
/// # Errors
///
/// Same as [`eps_sort_indices`].
pub fn eps_sort(
    vectors: &[Vec<f64>],
    epsilons: &[f64],
    directions: &[Direction],
) -> Result<Vec<Vec<f64>>> {
    Ok(eps_sort_indices(vectors, epsilons, directions)?
        .into_iter()
        .map(|i| vectors[i].clone())
        .collect())
}

/// Compute the hypervolume indicator of a set of points.
///
/// The hypervolume is the volume of the objective space dominated by
/// the points and bounded by a reference point. A **higher**
/// hypervolume indicates a better front (closer to the ideal and more
/// spread out). Dominated points may be included; they add nothing.
///
/// `reference_point` should be worse than all points in every
/// objective. Points that do not strictly dominate the reference point
/// are ignored.
///
/// Two objectives use a sort-and-sweep; more use recursive slicing on
/// the last objective.
///
/// # Panics
///
/// Panics (in debug) if dimensions of `front`, `reference_point`, and
/// `directions` are inconsistent.
#[must_use]
pub fn hypervolume(front: &[Vec<f64>], reference_point: &[f64], directions: &[Direction]) -> f64 {
    if front.is_empty() {
        return 0.0;
    }
    let d = reference_point.len();
    debug_assert!(front.iter().all(|p| p.len() == d));
    debug_assert_eq!(d, directions.len());

    let ref_norm: Vec<f64> = reference_point
        .iter()
        .zip(directions)
        .map(|(&v, dir)| dir.to_minimization(v))
        .collect();

    // Normalize to minimize-space and keep only points strictly dominating
    // the reference point.
    let filtered: Vec<Vec<f64>> = front
        .iter()
        .map(|p| {
            p.iter()
                .zip(directions)
                .map(|(&v, dir)| dir.to_minimization(v))
                .collect::<Vec<f64>>()
        })
        .filter(|p| p.iter().zip(&ref_norm).all(|(&pv, &rv)| pv < rv))
        .collect();

    if filtered.is_empty() {
        return 0.0;
    }

    hv_recursive(&filtered, &ref_norm)
}

/// Recursive hypervolume via slicing on the last objective.
///
/// All points are in minimize-space and dominated by `reference`.
fn hv_recursive(points: &[Vec<f64>], reference: &[f64]) -> f64 {
    let d = reference.len();

    // Base case: 1-D hypervolume is just the gap from the best point to ref.
    if d == 1 {
        let min_val = points.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
        return (reference[0] - min_val).max(0.0);
    }

    // Single point: hypervolume is the product of gaps.
    if points.len() == 1 {
        return points[0]
            .iter()
            .zip(reference)
            .map(|(&p, &r)| (r - p).max(0.0))
            .product();
    }

    if d == 2 {
        return hv_2d(points, reference);
    }

    // Sort by last objective ascending.
    let mut sorted: Vec<&Vec<f64>> = points.iter().collect();
    sorted.sort_by(|a, b| a[d - 1].total_cmp(&b[d - 1]));

    let sub_ref = &reference[..d - 1];
    let mut slice_front: Vec<Vec<f64>> = Vec::new();
    let mut result = 0.0;

    for i in 0..sorted.len() {
        // Project onto the first d-1 dimensions, maintaining the
        // non-dominated subset of points[0..=i] incrementally.
        insert_non_dominated(&mut slice_front, &sorted[i][..d - 1]);

        let height = if i + 1 < sorted.len() {
            sorted[i + 1][d - 1] - sorted[i][d - 1]
        } else {
            reference[d - 1] - sorted[i][d - 1]
        };

        if height <= 0.0 {
            continue;
        }

        result += height * hv_recursive(&slice_front, sub_ref);
    }

    result
}

/// Area dominated by 2-D points in minimize-space.
fn hv_2d(points: &[Vec<f64>], reference: &[f64]) -> f64 {
    let mut sorted: Vec<&Vec<f64>> = points.iter().collect();
    sorted.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));

    let mut area = 0.0;
    let mut best_y = reference[1];
    for p in sorted {
        if p[1] < best_y {
            area += (reference[0] - p[0]) * (best_y - p[1]);
            best_y = p[1];
        }
    }
    area
}

/// Add `point` to a minimize-space front unless something in it is at least
/// as good everywhere; evict members `point` weakly dominates.
fn insert_non_dominated(front: &mut Vec<Vec<f64>>, point: &[f64]) {
    let weakly_dominates = |a: &[f64], b: &[f64]| a.iter().zip(b).all(|(x, y)| x <= y);
    if front.iter().any(|q| weakly_dominates(q, point)) {
        return;
    }
    front.retain(|q| !weakly_dominates(point, q));
    front.push(point.to_vec());
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN2: [Direction; 2] = [Direction::Minimize, Direction::Minimize];

    #[test]
    fn test_dominates_basic() {
        assert!(dominates(&[1.0, 1.0], &[2.0, 2.0], &MIN2));
        assert!(!dominates(&[2.0, 2.0], &[1.0, 1.0], &MIN2));
        // Equal does not dominate
        assert!(!dominates(&[1.0, 1.0], &[1.0, 1.0], &MIN2));
    }

    #[test]
    fn test_dominates_maximize() {
        let dirs = [Direction::Maximize, Direction::Minimize];
        // a = (5, 1) vs b = (3, 2): a is better in both
        assert!(dominates(&[5.0, 1.0], &[3.0, 2.0], &dirs));
        assert!(!dominates(&[3.0, 2.0], &[5.0, 1.0], &dirs));
    }

    #[test]
    fn test_eps_sort_drops_dominated() {
        let values = vec![
            vec![1.0, 5.0],
            vec![5.0, 1.0],
            vec![3.0, 3.0],
            vec![4.0, 4.0],
        ];
        let idx = eps_sort_indices(&values, &[0.01, 0.01], &MIN2).unwrap();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn test_eps_sort_one_survivor_per_box() {
        // All three share box (1, 1) at eps 1.0; (1.1, 1.1) is closest to
        // the lower corner (1, 1).
        let values = vec![vec![1.5, 1.5], vec![1.1, 1.1], vec![1.9, 1.2]];
        let idx = eps_sort_indices(&values, &[1.0, 1.0], &MIN2).unwrap();
        assert_eq!(idx, vec![1]);
    }

    #[test]
    fn test_eps_sort_box_tie_keeps_first() {
        let values = vec![vec![0.3, 0.3], vec![0.3, 0.3]];
        let idx = eps_sort_indices(&values, &[1.0, 1.0], &MIN2).unwrap();
        assert_eq!(idx, vec![0]);
    }

    #[test]
    fn test_eps_sort_box_dominance_coarser_than_pareto() {
        // (1.0, 2.9) and (2.5, 2.0) are mutually non-dominated, but at eps
        // 2.0 their boxes are (0, 1) and (1, 1): the first box dominates.
        let values = vec![vec![1.0, 2.9], vec![2.5, 2.0]];
        let idx = eps_sort_indices(&values, &[2.0, 2.0], &MIN2).unwrap();
        assert_eq!(idx, vec![0]);
    }

    #[test]
    fn test_eps_sort_maximize() {
        let dirs = [Direction::Maximize, Direction::Minimize];
        let values = vec![vec![5.0, 1.0], vec![3.0, 2.0], vec![6.0, 3.0]];
        let idx = eps_sort_indices(&values, &[0.1, 0.1], &dirs).unwrap();
        assert_eq!(idx, vec![0, 2]);
    }

    #[test]
    fn test_eps_sort_maximize_prefers_upper_corner() {
        let dirs = [Direction::Maximize];
        let values = vec![vec![0.2], vec![0.9]];
        let idx = eps_sort_indices(&values, &[1.0], &dirs).unwrap();
        assert_eq!(idx, vec![1]);
    }

    #[test]
    fn test_eps_sort_epsilon_length_mismatch() {
        let values = vec![vec![1.0, 2.0, 3.0, 4.0]];
        let dirs = [Direction::Minimize; 3];
        let err = eps_sort(&values, &[0.1, 0.1, 0.1], &dirs).unwrap_err();
        assert!(err.is_configuration(), "got {err}");
    }

    #[test]
    fn test_eps_sort_ragged_input() {
        let values = vec![vec![1.0, 2.0], vec![1.0]];
        let err = eps_sort(&values, &[0.1, 0.1], &MIN2).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { row: 1, .. }));
    }

    #[test]
    fn test_eps_sort_rejects_nan() {
        let values = vec![vec![1.0, f64::NAN]];
        let err = eps_sort(&values, &[0.1, 0.1], &MIN2).unwrap_err();
        assert!(matches!(err, Error::NonFinite { .. }));
    }

    #[test]
    fn test_eps_sort_empty() {
        assert!(eps_sort(&[], &[0.1, 0.1], &MIN2).unwrap().is_empty());
    }

    #[test]
    fn test_hypervolume_2d_minimize() {
        // Front: (1,3), (2,2), (3,1) with ref (4,4), all minimize
        let front = vec![vec![1.0, 3.0], vec![2.0, 2.0], vec![3.0, 1.0]];
        let hv = hypervolume(&front, &[4.0, 4.0], &MIN2);
        // Strip 1: x=[1,2), h=4-3=1 → area=1
        // Strip 2: x=[2,3), h=4-2=2 → area=2
        // Strip 3: x=[3,4], h=4-1=3 → area=3
        // Total = 6
        assert!((hv - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_hypervolume_2d_maximize() {
        // Front: (3,1), (2,2), (1,3) with ref (0,0), all maximize
        let front = vec![vec![3.0, 1.0], vec![2.0, 2.0], vec![1.0, 3.0]];
        let dirs = [Direction::Maximize, Direction::Maximize];
        let hv = hypervolume(&front, &[0.0, 0.0], &dirs);
        // In negate-space: points become (-3,-1),(-2,-2),(-1,-3), ref=(0,0)
        // Same geometry as minimize test above → area = 6
        assert!((hv - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_hypervolume_ignores_dominated_points() {
        let front = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![1.0, 1.0]];
        let hv = hypervolume(&front, &[3.0, 3.0], &MIN2);
        assert!((hv - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_hypervolume_empty_front() {
        let front: Vec<Vec<f64>> = vec![];
        let dirs = [Direction::Minimize];
        assert!(hypervolume(&front, &[1.0], &dirs).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hypervolume_point_at_ref() {
        // Point not strictly better than ref → contributes nothing
        let front = vec![vec![5.0, 5.0]];
        let hv = hypervolume(&front, &[5.0, 5.0], &MIN2);
        assert!(hv.abs() < f64::EPSILON);
    }

    #[test]
    fn test_hypervolume_3d_single_point() {
        let front = vec![vec![1.0, 1.0, 1.0]];
        let dirs = [Direction::Minimize; 3];
        let hv = hypervolume(&front, &[2.0, 2.0, 2.0], &dirs);
        assert!((hv - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_hypervolume_3d_union() {
        // Two unit cubes overlapping in a 0.5 x 1 x 1 slab:
        // [0,1]^3 and [0.5,1.5] x [0,1] x [0,1] relative to ref (2,2,2)
        // expressed as points (1,1,1) and (0.5,1,1) → boxes to (2,2,2)
        // are [1,2]^3 (vol 1) and [0.5,2]x[1,2]x[1,2] (vol 1.5); union 1.5.
        let front = vec![vec![1.0, 1.0, 1.0], vec![0.5, 1.0, 1.0]];
        let dirs = [Direction::Minimize; 3];
        let hv = hypervolume(&front, &[2.0, 2.0, 2.0], &dirs);
        assert!((hv - 1.5).abs() < 1e-10);

        // Staircase: (0,1,1), (1,0,1), (1,1,0) with ref (2,2,2).
        // Each box is 2x1x1 = 2; pairwise overlaps 1x1x1 = 1; triple 1.
        // Union = 3*2 - 3*1 + 1 = 4.
        let front = vec![vec![0.0, 1.0, 1.0], vec![1.0, 0.0, 1.0], vec![1.0, 1.0, 0.0]];
        let hv = hypervolume(&front, &[2.0, 2.0, 2.0], &dirs);
        assert!((hv - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_hypervolume_4d_matches_product_for_single_point() {
        let front = vec![vec![0.25, 0.5, 0.75, 0.0]];
        let dirs = [Direction::Minimize; 4];
        let hv = hypervolume(&front, &[1.0; 4], &dirs);
        assert!((hv - 0.75 * 0.5 * 0.25 * 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_insert_non_dominated_evicts() {
        let mut front = vec![vec![2.0, 2.0], vec![0.0, 5.0]];
        insert_non_dominated(&mut front, &[1.0, 1.0]);
        assert_eq!(front, vec![vec![0.0, 5.0], vec![1.0, 1.0]]);
        insert_non_dominated(&mut front, &[1.0, 1.0]);
        assert_eq!(front.len(), 2);
    }
}
