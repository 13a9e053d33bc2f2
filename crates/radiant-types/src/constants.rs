// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Speed of light in vacuum (m/s)
pub const C_LIGHT: f64 = 2.99792458e8;

/// Planck constant (J s)
pub const H_PLANCK: f64 = 6.62607015e-34;

/// Boltzmann constant (J/K)
pub const K_BOLTZMANN: f64 = 1.380649e-23;

/// Proton mass (kg)
pub const M_PROTON: f64 = 1.67262192369e-27;

/// Electron mass (kg)
pub const M_ELECTRON: f64 = 9.1093837015e-31;

/// Thomson scattering cross section (m^2)
pub const SIGMA_THOMSON: f64 = 6.6524587321e-29;

/// Full solid angle factor used by mean-intensity normalization
pub const FOUR_PI: f64 = 4.0 * std::f64::consts::PI;

/// Smallest positive normal double; the luminosity floor below which a
/// peel-off contribution is numerically zero.
pub const SMALLEST_LUMINOSITY: f64 = f64::MIN_POSITIVE;
