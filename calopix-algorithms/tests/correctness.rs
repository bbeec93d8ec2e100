#![allow(clippy::float_cmp)]
use approx::assert_abs_diff_eq;
use calopix_algorithms::{
    compare, GridBinning, Identity, ReductionConfig, ReductionStrategy, StrategyRegistry,
};
use calopix_core::{HitCloud, ObservableSet, Position};

fn four_hits() -> HitCloud {
    HitCloud::new(
        vec![
            Position::new(0.0, 0.0, 0.0),
            Position::new(10.0, 0.0, 0.0),
            Position::new(0.0, 10.0, 0.0),
            Position::new(0.0, 0.0, 10.0),
        ],
        vec![1.0; 4],
    )
    .unwrap()
}

#[test]
fn test_identity_observables() {
    let reduced = Identity.reduce(&four_hits()).unwrap();
    let obs = ObservableSet::compute(&reduced).unwrap();
    assert_eq!(obs.count, 4);
    assert_abs_diff_eq!(obs.energy_mean, 1.0);
    assert_abs_diff_eq!(obs.energy_std, 0.0);
    assert_abs_diff_eq!(obs.total_energy, 4.0);
    assert_abs_diff_eq!(obs.barycenter.x, 2.5);
    assert_abs_diff_eq!(obs.barycenter.y, 2.5);
    assert_abs_diff_eq!(obs.barycenter.z, 2.5);
}

#[test]
fn test_coarse_grid_collapses_to_mean() {
    let reduced = GridBinning::with_cell_size(100.0)
        .reduce(&four_hits())
        .unwrap();
    assert_eq!(reduced.len(), 1);
    assert_abs_diff_eq!(reduced.total_energy(), 4.0);
    assert_eq!(reduced.positions()[0], Position::new(2.5, 2.5, 2.5));
}

#[test]
fn test_default_registry_on_four_hits() {
    // Seeded so the k-means rows are reproducible; K is capped at 4.
    let config = ReductionConfig::default().with_seed(11);
    let registry = StrategyRegistry::from_config(&config).unwrap();
    let hits = four_hits();

    let report = compare(&hits, &registry, true);
    assert_eq!(report.rows().len(), 7);
    assert_eq!(report.input_hits(), 4);
    assert_eq!(report.failures().count(), 0);
    assert_eq!(report.policy_violations().count(), 0);

    let original = report.row("Original").unwrap().outcome.as_ref().unwrap();
    assert_eq!(original.count, 4);

    // Every hit is 10 away from at least one other, so DBSCAN (eps=30) and
    // mean-shift (bandwidth=30) both see a single group.
    let dbscan = report
        .row("DBSCAN clustering (eps=30, min_samples=1)")
        .unwrap()
        .outcome
        .as_ref()
        .unwrap();
    assert_eq!(dbscan.count, 1);
    assert_abs_diff_eq!(dbscan.total_energy, 4.0);

    let mean_shift = report
        .row("MeanShift clustering (bandwidth=30)")
        .unwrap()
        .outcome
        .as_ref()
        .unwrap();
    assert_eq!(mean_shift.count, 1);
    assert_abs_diff_eq!(mean_shift.barycenter.x, 2.5, epsilon = 1e-9);

    let kmeans = report
        .row("K-means clustering")
        .unwrap()
        .outcome
        .as_ref()
        .unwrap();
    assert_eq!(kmeans.count, 4);
    assert_abs_diff_eq!(kmeans.total_energy, 4.0);
}

#[test]
fn test_parallel_and_sequential_agree() {
    let config = ReductionConfig::default()
        .with_seed(3)
        .with_kmeans_clusters(5);
    let registry = StrategyRegistry::from_config(&config).unwrap();

    let mut positions = Vec::new();
    let mut energies = Vec::new();
    for i in 0..60_u32 {
        let t = f64::from(i);
        positions.push(Position::new(t.sin() * 40.0, t.cos() * 40.0, t * 2.0));
        energies.push(0.001 + f64::from(i % 7) * 1e-4);
    }
    let hits = HitCloud::new(positions, energies).unwrap();

    let parallel = compare(&hits, &registry, true);
    let sequential = compare(&hits, &registry, false);
    for (a, b) in parallel.rows().iter().zip(sequential.rows()) {
        assert_eq!(a.strategy, b.strategy);
        assert_eq!(a.outcome, b.outcome);
    }
}
