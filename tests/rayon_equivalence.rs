#![cfg(feature = "rayon")]

mod common;

use common::{anti_diagonal_ridge, paste};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wircpol_masks::kernel::rayon::zncc_scan_full_par;
use wircpol_masks::{
    diagonal_mask, CorrelationPlan, Grid, Kernel, LocateConfig, Locator, ScanParams, ZnccScalar,
};

fn noisy_frame(width: usize, height: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * height)
        .map(|_| rng.random_range(0.0..0.3))
        .collect()
}

#[test]
fn parallel_scan_matches_scalar_scan() {
    let (width, height) = (90, 70);
    let mut frame = noisy_frame(width, height, 11);
    paste(&mut frame, width, &anti_diagonal_ridge(11, 1.2), 11, 40, 25);
    let frame = Grid::new(frame, width, height).unwrap();

    let tpl = Grid::new(anti_diagonal_ridge(11, 1.2), 11, 11).unwrap();
    let weights = diagonal_mask(11, 3).unwrap();
    let plans = [
        CorrelationPlan::from_view(tpl.view()).unwrap(),
        CorrelationPlan::from_masked(tpl.view(), &weights).unwrap(),
    ];
    let params = ScanParams {
        topk: 25,
        min_var_i: 1e-9,
        min_score: 0.1,
    };

    for plan in &plans {
        let seq = ZnccScalar::scan_full(frame.view(), plan, params).unwrap();
        let par = zncc_scan_full_par(frame.view(), plan, params).unwrap();
        assert_eq!(seq.len(), par.len());
        for (a, b) in seq.iter().zip(&par) {
            assert_eq!((a.x, a.y), (b.x, b.y));
            assert!((a.score - b.score).abs() <= 1e-12);
        }
        assert_eq!((seq[0].x, seq[0].y), (40, 25));
    }
}

#[test]
fn parallel_locator_matches_sequential() {
    let (width, height) = (64, 64);
    let mut frame = noisy_frame(width, height, 5);
    paste(&mut frame, width, &anti_diagonal_ridge(9, 1.0), 9, 12, 30);
    let frame = Grid::new(frame, width, height).unwrap();

    let tpl = Grid::new(anti_diagonal_ridge(9, 1.0), 9, 9).unwrap();
    let base = LocateConfig {
        topk: 3,
        nms_radius: 4,
        ..LocateConfig::default()
    };
    let seq = Locator::new(CorrelationPlan::from_view(tpl.view()).unwrap())
        .with_config(base)
        .locate(frame.view())
        .unwrap();
    let par = Locator::new(CorrelationPlan::from_view(tpl.view()).unwrap())
        .with_config(LocateConfig {
            parallel: true,
            ..base
        })
        .locate(frame.view())
        .unwrap();

    let tol = 1e-9;
    assert_eq!(seq.len(), par.len());
    for (a, b) in seq.iter().zip(&par) {
        assert!((a.x - b.x).abs() <= tol);
        assert!((a.y - b.y).abs() <= tol);
        assert!((a.score - b.score).abs() <= tol);
    }
}
