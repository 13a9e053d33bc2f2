// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Property-Based Tests (proptest) for radiant-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for radiant-math using proptest.
//!
//! Covers: wavelength-grid construction and bin lookup invariants, Planck
//! radiance monotonicity, equilibrium-temperature consistency.

use proptest::prelude::*;
use radiant_math::planck::{banded_emission, planck_lambda};
use radiant_math::wavelengths::WavelengthGrid;

proptest! {
    /// Every characteristic wavelength maps back to its own bin.
    #[test]
    fn bin_lookup_roundtrip(
        num_bins in 1usize..128,
        min_exp in -8.0f64..-5.0,
        span in 1.0f64..4.0,
    ) {
        let min = 10f64.powf(min_exp);
        let max = 10f64.powf(min_exp + span);
        let grid = WavelengthGrid::log_uniform(min, max, num_bins).expect("grid");
        for ell in 0..grid.num_bins() {
            prop_assert_eq!(grid.bin(grid.wavelength(ell)), Some(ell));
        }
    }

    /// Bin widths are positive and sum to the full range.
    #[test]
    fn widths_partition_range(
        num_bins in 1usize..128,
        min_exp in -8.0f64..-5.0,
        span in 1.0f64..4.0,
    ) {
        let min = 10f64.powf(min_exp);
        let max = 10f64.powf(min_exp + span);
        let grid = WavelengthGrid::log_uniform(min, max, num_bins).expect("grid");
        let total: f64 = grid.widths().iter().sum();
        prop_assert!(grid.widths().iter().all(|w| *w > 0.0));
        prop_assert!((total - (max - min)).abs() < 1e-9 * max);
    }

    /// Planck radiance increases with temperature at every wavelength.
    #[test]
    fn planck_monotone_in_temperature(
        lambda_exp in -7.0f64..-4.0,
        t in 10.0f64..2000.0,
    ) {
        let lambda = 10f64.powf(lambda_exp);
        let low = planck_lambda(lambda, t);
        let high = planck_lambda(lambda, t * 1.5);
        prop_assert!(high >= low);
        prop_assert!(low >= 0.0);
    }

    /// The banded blackbody emission integral grows with temperature.
    #[test]
    fn banded_emission_monotone(t in 20.0f64..3000.0) {
        let grid = WavelengthGrid::log_uniform(1e-7, 1e-3, 200).expect("grid");
        let sections = vec![1e-21; grid.num_bins()];
        let e_low = banded_emission(&grid, &sections, t);
        let e_high = banded_emission(&grid, &sections, t * 1.2);
        prop_assert!(e_high > e_low);
    }
}
