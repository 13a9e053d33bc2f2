// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Planck Integrals
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Planck spectral radiance and the banded integrals entering the LTE
//! energy-balance equation
//!
//!   ∫ ς_abs(λ) J(λ) dλ = ∫ ς_abs(λ) B(λ,T) dλ
//!
//! evaluated on a wavelength grid as Σ_ℓ ς_ℓ f_ℓ Δλ_ℓ.

use crate::rootfind::bisect;
use crate::wavelengths::WavelengthGrid;
use radiant_types::constants::{C_LIGHT, H_PLANCK, K_BOLTZMANN};
use radiant_types::error::{RadiantError, RadiantResult};

/// Upper cap for the equilibrium-temperature bracket expansion [K].
const T_MAX_K: f64 = 1.0e6;

/// Absolute tolerance of the equilibrium-temperature solve [K].
const T_TOL_K: f64 = 1e-3;

const BISECT_MAX_ITER: usize = 200;

/// Planck spectral radiance B_λ(T) in W / (m^2 m sr). Returns zero for
/// non-positive wavelength or temperature.
pub fn planck_lambda(lambda: f64, temperature: f64) -> f64 {
    if lambda <= 0.0 || temperature <= 0.0 {
        return 0.0;
    }
    let x = H_PLANCK * C_LIGHT / (lambda * K_BOLTZMANN * temperature);
    let prefactor = 2.0 * H_PLANCK * C_LIGHT * C_LIGHT / lambda.powi(5);
    if x > 700.0 {
        // Wien tail; exp(x) would overflow.
        return prefactor * (-x).exp();
    }
    prefactor / x.exp_m1()
}

/// Banded absorption integral Σ_ℓ ς_ℓ J_ℓ Δλ_ℓ.
pub fn banded_absorption(
    grid: &WavelengthGrid,
    sections: &[f64],
    field: &[f64],
) -> RadiantResult<f64> {
    if sections.len() != grid.num_bins() || field.len() != grid.num_bins() {
        return Err(RadiantError::ConfigError(format!(
            "banded absorption requires {} values per band, got sections={} field={}",
            grid.num_bins(),
            sections.len(),
            field.len()
        )));
    }
    let mut total = 0.0;
    for ell in 0..grid.num_bins() {
        total += sections[ell] * field[ell] * grid.width(ell);
    }
    if !total.is_finite() {
        return Err(RadiantError::Numerical(
            "banded absorption integral is non-finite".to_string(),
        ));
    }
    Ok(total)
}

/// Banded emission integral Σ_ℓ ς_ℓ B(λ_ℓ, T) Δλ_ℓ; monotonically
/// increasing in T.
pub fn banded_emission(grid: &WavelengthGrid, sections: &[f64], temperature: f64) -> f64 {
    let mut total = 0.0;
    for ell in 0..grid.num_bins().min(sections.len()) {
        total += sections[ell] * planck_lambda(grid.wavelength(ell), temperature) * grid.width(ell);
    }
    total
}

/// Solves the LTE energy-balance equation for the single-grain equilibrium
/// temperature. Returns zero when the absorbed power vanishes; saturates at
/// an internal cap when the radiation field outpowers any blackbody the grid
/// can resolve.
pub fn equilibrium_temperature(
    grid: &WavelengthGrid,
    sections: &[f64],
    field: &[f64],
) -> RadiantResult<f64> {
    let absorbed = banded_absorption(grid, sections, field)?;
    if absorbed <= 0.0 {
        return Ok(0.0);
    }

    // Expand the upper bracket until the blackbody emission exceeds the
    // absorbed power.
    let mut hi = 1.0;
    while banded_emission(grid, sections, hi) < absorbed {
        hi *= 2.0;
        if hi >= T_MAX_K {
            return Ok(T_MAX_K);
        }
    }

    bisect(
        |t| banded_emission(grid, sections, t) - absorbed,
        0.0,
        hi,
        T_TOL_K,
        BISECT_MAX_ITER,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infrared_grid() -> WavelengthGrid {
        WavelengthGrid::log_uniform(1e-7, 1e-3, 400).expect("valid grid")
    }

    #[test]
    fn test_planck_positive_and_zero_guards() {
        assert!(planck_lambda(5e-7, 5772.0) > 0.0);
        assert_eq!(planck_lambda(-1.0, 100.0), 0.0);
        assert_eq!(planck_lambda(5e-7, 0.0), 0.0);
        // Deep Wien tail must underflow smoothly instead of overflowing.
        let tail = planck_lambda(1e-9, 3.0);
        assert!(tail >= 0.0 && tail.is_finite());
    }

    #[test]
    fn test_planck_peak_near_wien_displacement() {
        // λ_peak T ≈ 2.898e-3 m K
        let t = 300.0;
        let grid = infrared_grid();
        let mut best = (0.0, 0.0);
        for &lam in grid.wavelengths() {
            let b = planck_lambda(lam, t);
            if b > best.1 {
                best = (lam, b);
            }
        }
        let expected = 2.898e-3 / t;
        assert!(
            (best.0 - expected).abs() / expected < 0.05,
            "peak at {} vs Wien {}",
            best.0,
            expected
        );
    }

    #[test]
    fn test_emission_monotone_in_temperature() {
        let grid = infrared_grid();
        let sections = vec![1e-20; grid.num_bins()];
        let e1 = banded_emission(&grid, &sections, 50.0);
        let e2 = banded_emission(&grid, &sections, 100.0);
        let e3 = banded_emission(&grid, &sections, 200.0);
        assert!(e1 < e2 && e2 < e3);
    }

    #[test]
    fn test_equilibrium_temperature_recovers_blackbody() {
        // Embed the grain in its own blackbody field: the solve must return
        // the source temperature.
        let grid = infrared_grid();
        let sections = vec![1e-20; grid.num_bins()];
        for &t_source in &[30.0, 150.0, 900.0] {
            let field: Vec<f64> = grid
                .wavelengths()
                .iter()
                .map(|&lam| planck_lambda(lam, t_source))
                .collect();
            let t = equilibrium_temperature(&grid, &sections, &field).expect("solve");
            assert!(
                (t - t_source).abs() < 0.5,
                "expected {t_source} K, got {t} K"
            );
        }
    }

    #[test]
    fn test_equilibrium_temperature_zero_field() {
        let grid = infrared_grid();
        let sections = vec![1e-20; grid.num_bins()];
        let field = vec![0.0; grid.num_bins()];
        let t = equilibrium_temperature(&grid, &sections, &field).expect("solve");
        assert_eq!(t, 0.0);
    }

    #[test]
    fn test_banded_absorption_shape_guard() {
        let grid = infrared_grid();
        let err = banded_absorption(&grid, &[1.0; 3], &[1.0; 3]).expect_err("shape mismatch");
        match err {
            RadiantError::ConfigError(msg) => assert!(msg.contains("per band")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }
}
