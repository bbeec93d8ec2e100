#![allow(
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::unreadable_literal
)]
use approx::assert_relative_eq;
use calopix_algorithms::{
    DbscanClustering, DbscanConfig, DbscanState, GridBinning, GridConfig, KMeansClustering,
    KMeansConfig, ReductionStrategy, NOISE,
};
use calopix_core::{BinningMode, HitCloud, Position};

/// Deterministic pseudo-shower: a dense core plus a diffuse halo, with
/// coordinates on both sides of zero.
fn shower(n: usize) -> HitCloud {
    let mut rng_seed: u64 = 12345;
    let mut rand = || {
        rng_seed = (rng_seed.wrapping_mul(1103515245).wrapping_add(12345)) & 0x7fffffff;
        rng_seed as f64 / f64::from(0x7fffffff_u32)
    };

    let mut positions = Vec::with_capacity(n);
    let mut energies = Vec::with_capacity(n);
    for i in 0..n {
        let spread = if i % 4 == 0 { 300.0 } else { 40.0 };
        positions.push(Position::new(
            (rand() - 0.5) * spread,
            (rand() - 0.5) * spread,
            1800.0 + (rand() - 0.5) * spread,
        ));
        energies.push(rand() * 0.0025);
    }
    HitCloud::new(positions, energies).unwrap()
}

fn kmeans_config(clusters: usize) -> KMeansConfig {
    KMeansConfig {
        clusters,
        restarts: 3,
        seed: Some(2024),
        ..KMeansConfig::default()
    }
}

#[test]
fn test_grid_conserves_energy_for_any_cell_size() {
    let hits = shower(400);
    for cell_size in [0.5, 3.0, 10.0, 20.0, 77.7, 1e4] {
        for mode in [BinningMode::Truncate, BinningMode::Floor] {
            let reduced = GridBinning::new(GridConfig { cell_size, mode })
                .reduce(&hits)
                .unwrap();
            assert!(reduced.len() <= hits.len());
            assert_relative_eq!(
                reduced.total_energy(),
                hits.total_energy(),
                max_relative = 1e-12
            );
        }
    }
}

#[test]
fn test_coarser_grid_never_has_more_points() {
    let hits = shower(400);
    let fine = GridBinning::with_cell_size(10.0).reduce(&hits).unwrap();
    let coarse = GridBinning::with_cell_size(20.0).reduce(&hits).unwrap();
    assert!(coarse.len() <= fine.len());
    assert_relative_eq!(coarse.total_energy(), fine.total_energy(), max_relative = 1e-12);
}

#[test]
fn test_kmeans_3d_conserves_energy() {
    let hits = shower(300);
    let reduced = KMeansClustering::positions(kmeans_config(25))
        .reduce(&hits)
        .unwrap();
    assert!(reduced.len() <= 25);
    assert!(!reduced.is_empty());
    assert_relative_eq!(reduced.total_energy(), hits.total_energy(), max_relative = 1e-12);
}

#[test]
fn test_kmeans_4d_energy_lies_within_member_range() {
    let hits = shower(300);
    let strategy = KMeansClustering::positions_and_energy(kmeans_config(25));
    let fit = strategy.fit(&hits).unwrap();
    let reduced = strategy.reduce(&hits).unwrap();

    let mut ranges = vec![(f64::INFINITY, f64::NEG_INFINITY); 25];
    for (&label, &energy) in fit.labels.iter().zip(hits.energies()) {
        let range = &mut ranges[label as usize];
        range.0 = range.0.min(energy);
        range.1 = range.1.max(energy);
    }
    let populated: Vec<_> = ranges.into_iter().filter(|r| r.0 <= r.1).collect();
    assert_eq!(populated.len(), reduced.len());
    for (&(lo, hi), &energy) in populated.iter().zip(reduced.energies()) {
        assert!(energy >= lo - 1e-15 && energy <= hi + 1e-15);
    }
    // Averaging instead of summing: the total shrinks by roughly the cluster size.
    assert!(reduced.total_energy() < hits.total_energy());
}

#[test]
fn test_kmeans_caps_cluster_count() {
    let hits = shower(12);
    for strategy in [
        KMeansClustering::positions(kmeans_config(150)),
        KMeansClustering::positions_and_energy(kmeans_config(150)),
    ] {
        let reduced = strategy.reduce(&hits).unwrap();
        assert_eq!(reduced.len(), 12);
    }
}

#[test]
fn test_dbscan_drops_only_noise_energy() {
    let hits = shower(400);
    let algo = DbscanClustering::new(DbscanConfig {
        epsilon: 8.0,
        min_points: 4,
        min_cluster_size: 1,
    });
    let mut state = DbscanState::default();
    let mut labels = Vec::new();
    algo.cluster(&hits, &mut state, &mut labels).unwrap();
    let reduced = algo.reduce(&hits).unwrap();

    let noise_energy: f64 = labels
        .iter()
        .zip(hits.energies())
        .filter(|(&l, _)| l == NOISE)
        .map(|(_, e)| e)
        .sum();
    assert!(noise_energy > 0.0, "halo hits should be noise");
    assert!(reduced.total_energy() < hits.total_energy());
    assert_relative_eq!(
        reduced.total_energy() + noise_energy,
        hits.total_energy(),
        max_relative = 1e-12
    );
}

#[test]
fn test_dbscan_without_noise_conserves_energy() {
    let hits = shower(200);
    let reduced = DbscanClustering::new(DbscanConfig {
        epsilon: 5.0,
        min_points: 1,
        min_cluster_size: 1,
    })
    .reduce(&hits)
    .unwrap();
    assert_relative_eq!(reduced.total_energy(), hits.total_energy(), max_relative = 1e-12);
}

#[test]
fn test_dbscan_huge_epsilon_collapses_cloud() {
    let hits = shower(200);
    let reduced = DbscanClustering::new(DbscanConfig {
        epsilon: 1e6,
        min_points: 1,
        min_cluster_size: 1,
    })
    .reduce(&hits)
    .unwrap();
    assert_eq!(reduced.len(), 1);
    assert_relative_eq!(reduced.total_energy(), hits.total_energy(), max_relative = 1e-12);
}
