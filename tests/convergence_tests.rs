//! Properties of the sorter, scaler and hypervolume engine working together.

use std::collections::BTreeMap;

use hvconv::archive::{Archive, MemoryStore};
use hvconv::convergence::{ConvergenceDriver, HypervolumeEngine, ReferenceBasis, WorkerPool};
use hvconv::pareto::{eps_sort, eps_sort_indices, hypervolume};
use hvconv::reference::ReferenceSetBuilder;
use hvconv::{Direction, Error, Objectives, Population, Scaler};

fn two_min(epsilon: f64) -> Objectives {
    Objectives::builder()
        .minimize("a", epsilon)
        .minimize("b", epsilon)
        .build()
        .unwrap()
}

fn unit_square() -> Scaler {
    Scaler::fit(&[vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap()
}

fn random_front(rng: &mut fastrand::Rng, n: usize) -> Vec<Vec<f64>> {
    // Points on the line a + b = 1 are mutually non-dominated.
    (0..n)
        .map(|_| {
            let a = rng.f64();
            vec![a, 1.0 - a]
        })
        .collect()
}

#[test]
fn adding_a_dominating_point_raises_hypervolume() {
    let objectives = two_min(0.1);
    let scaler = unit_square();
    let engine = HypervolumeEngine::from_scaler(&scaler, &objectives).unwrap();
    assert_eq!(engine.reference_point(), &[1.0, 1.0]);

    let g1 = vec![vec![0.2, 0.8], vec![0.5, 0.5]];
    let mut g2 = g1.clone();
    g2.push(vec![0.1, 0.1]);

    let hv1 = engine.score(&scaler.transform(&g1).unwrap()).unwrap();
    let hv2 = engine.score(&scaler.transform(&g2).unwrap()).unwrap();
    // G1: 0.8 * 0.2 + 0.5 * 0.3 = 0.31, G2 is dominated by (0.1, 0.1) alone.
    assert!((hv1 - 0.31).abs() < 1e-12);
    assert!((hv2 - 0.81).abs() < 1e-12);
    assert!(hv2 > hv1);
}

#[test]
fn superset_never_scores_lower() {
    let objectives = two_min(0.05);
    let scaler = unit_square();
    let engine = HypervolumeEngine::from_scaler(&scaler, &objectives).unwrap();
    let mut rng = fastrand::Rng::with_seed(7);

    for _ in 0..20 {
        let a = random_front(&mut rng, 8);
        let mut b = a.clone();
        b.extend(random_front(&mut rng, 4));
        let hv_a = engine.score(&a).unwrap();
        let hv_b = engine.score(&b).unwrap();
        assert!(hv_b >= hv_a - 1e-12, "{hv_b} < {hv_a}");
    }
}

#[test]
fn superset_never_scores_lower_in_higher_dimensions() {
    let mut rng = fastrand::Rng::with_seed(11);
    for directions in [
        vec![Direction::Minimize, Direction::Maximize, Direction::Minimize],
        vec![Direction::Minimize, Direction::Minimize, Direction::Maximize, Direction::Maximize],
    ] {
        // Worst corner of the unit cube in each objective's own sense.
        let reference: Vec<f64> = directions
            .iter()
            .map(|d| match d {
                Direction::Minimize => 1.0,
                Direction::Maximize => 0.0,
            })
            .collect();
        let dims = directions.len();
        for _ in 0..15 {
            let subset: Vec<Vec<f64>> = (0..10).map(|_| (0..dims).map(|_| rng.f64()).collect()).collect();
            let mut superset = subset.clone();
            superset.extend((0..5).map(|_| (0..dims).map(|_| rng.f64()).collect::<Vec<f64>>()));
            let hv_sub = hypervolume(&subset, &reference, &directions);
            let hv_super = hypervolume(&superset, &reference, &directions);
            assert!(hv_sub > 0.0);
            assert!(hv_super >= hv_sub - 1e-12, "{dims}-D: {hv_super} < {hv_sub}");
            assert!(hv_super <= 1.0 + 1e-12);
        }
    }
}

#[test]
fn hypervolume_ignores_row_order() {
    let objectives = Objectives::builder()
        .minimize("a", 0.1)
        .minimize("b", 0.1)
        .maximize("c", 0.1)
        .build()
        .unwrap();
    let mut rng = fastrand::Rng::with_seed(42);
    let rows: Vec<Vec<f64>> = (0..40)
        .map(|_| vec![rng.f64() * 10.0, rng.f64() * 5.0, rng.f64()])
        .collect();

    let scaler = Scaler::fit(&rows).unwrap();
    let engine = HypervolumeEngine::from_scaler(&scaler, &objectives).unwrap();
    let expected = engine.score(&scaler.transform(&rows).unwrap()).unwrap();

    for _ in 0..5 {
        let mut shuffled = rows.clone();
        rng.shuffle(&mut shuffled);
        let hv = engine.score(&scaler.transform(&shuffled).unwrap()).unwrap();
        assert!((hv - expected).abs() < 1e-12);
    }
}

#[test]
fn sorting_a_sorted_set_is_idempotent() {
    let objectives = two_min(0.01);
    let mut rng = fastrand::Rng::with_seed(3);
    let rows: Vec<Vec<f64>> = (0..60).map(|_| vec![rng.f64(), rng.f64()]).collect();

    let once = eps_sort(&rows, objectives.epsilons(), objectives.directions()).unwrap();
    let twice = eps_sort(&once, objectives.epsilons(), objectives.directions()).unwrap();

    let mut a = once.clone();
    let mut b = twice;
    a.sort_by(|x, y| x.partial_cmp(y).unwrap());
    b.sort_by(|x, y| x.partial_cmp(y).unwrap());
    assert_eq!(a, b);
}

#[test]
fn epsilon_length_must_match_dimensionality() {
    let rows = vec![vec![1.0, 2.0, 3.0, 4.0]];
    let err = eps_sort_indices(&rows, &[0.1, 0.1, 0.1], &[Direction::Minimize; 3]).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn reference_set_is_the_non_dominated_union_of_seeds() {
    let objectives = two_min(0.01);
    let final_gen = |rows: Vec<Vec<f64>>| -> Archive {
        [(5000, Population::from_objective_rows(&objectives, rows).unwrap())]
            .into_iter()
            .collect()
    };

    let store = MemoryStore::new();
    store.insert("UTIL_5000_1", final_gen(vec![vec![1.0, 5.0]]));
    store.insert("UTIL_5000_2", final_gen(vec![vec![1.0, 5.0], vec![2.0, 4.0]]));

    let set = ReferenceSetBuilder::new(objectives.clone())
        .build_variant(&store, "UTIL", "5000")
        .unwrap();
    let mut distinct = set.objective_values().to_vec();
    distinct.dedup();
    assert_eq!(distinct, vec![vec![1.0, 5.0], vec![2.0, 4.0]]);
}

#[test]
fn missing_variant_is_left_out_of_the_batch() {
    let objectives = two_min(0.01);
    let store = MemoryStore::new();
    store.insert(
        "EGAL_100_9",
        [(100, Population::from_objective_rows(&objectives, vec![vec![0.5, 0.5]]).unwrap())]
            .into_iter()
            .collect::<Archive>(),
    );

    let sets: BTreeMap<_, _> = ReferenceSetBuilder::new(objectives)
        .build_variants(&store, &["UTIL", "EGAL", "PRIOR"], "100", None)
        .unwrap();
    assert_eq!(sets.len(), 1);
    assert!(sets.contains_key("EGAL"));
}

#[test]
fn driver_matches_direct_engine_scores() {
    let objectives = two_min(0.1);
    let generation = |rows: Vec<Vec<f64>>| Population::from_objective_rows(&objectives, rows).unwrap();
    let mut rng = fastrand::Rng::with_seed(11);

    let mut archive = Archive::new();
    archive.insert(0, generation(vec![vec![1.0, 1.0]]));
    for nfe in (1..=12).map(|k| k * 100) {
        archive.insert(nfe, generation(random_front(&mut rng, 5)));
    }

    let driver = ConvergenceDriver::with_pool(objectives.clone(), WorkerPool::with_threads(3).unwrap());
    let table = driver.run(&archive, &ReferenceBasis::Pooled).unwrap();
    assert_eq!(table.len(), 12);

    let (scaler, engine) = driver.prepare(&archive, &ReferenceBasis::Pooled).unwrap();
    for score in table.scores() {
        let rows = archive.get(score.nfe).unwrap().objective_values();
        let expected = engine.score(&scaler.transform(rows).unwrap()).unwrap();
        assert!((score.hypervolume - expected).abs() < 1e-12, "NFE {}", score.nfe);
    }
}

#[test]
fn malformed_generation_fails_the_whole_run() {
    let objectives = two_min(0.1);
    let driver = ConvergenceDriver::with_pool(objectives.clone(), WorkerPool::with_threads(2).unwrap());
    let one = Objectives::builder().minimize("a", 0.1).build().unwrap();

    let mut archive = Archive::new();
    archive.insert(10, Population::from_objective_rows(&objectives, vec![vec![0.1, 0.2]]).unwrap());
    archive.insert(20, Population::from_objective_rows(&one, vec![vec![0.1]]).unwrap());

    let err = driver.run(&archive, &ReferenceBasis::Pooled).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. } | Error::ColumnMismatch { .. }));
}
