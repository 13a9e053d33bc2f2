// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Wavelength Grid
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ordered wavelength bins for the radiation-field table axis.

use radiant_types::config::WavelengthGridConfig;
use radiant_types::error::{RadiantError, RadiantResult};

/// A wavelength grid with `num_bins` contiguous bins delimited by
/// `num_bins + 1` strictly ascending borders. Each bin carries a
/// characteristic wavelength (the geometric mean of its borders) and a width.
#[derive(Debug, Clone)]
pub struct WavelengthGrid {
    borders: Vec<f64>,
    lambdav: Vec<f64>,
    widths: Vec<f64>,
}

impl WavelengthGrid {
    /// Builds a grid from explicit bin borders.
    pub fn from_borders(borders: Vec<f64>) -> RadiantResult<Self> {
        if borders.len() < 2 {
            return Err(RadiantError::ConfigError(format!(
                "wavelength grid requires at least 2 borders, got {}",
                borders.len()
            )));
        }
        if borders.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err(RadiantError::ConfigError(
                "wavelength grid borders must be finite and > 0".to_string(),
            ));
        }
        if borders.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(RadiantError::ConfigError(
                "wavelength grid borders must be strictly ascending".to_string(),
            ));
        }
        let lambdav = borders
            .windows(2)
            .map(|pair| (pair[0] * pair[1]).sqrt())
            .collect();
        let widths = borders.windows(2).map(|pair| pair[1] - pair[0]).collect();
        Ok(WavelengthGrid {
            borders,
            lambdav,
            widths,
        })
    }

    /// Builds a logarithmically uniform grid between `min` and `max`.
    pub fn log_uniform(min: f64, max: f64, num_bins: usize) -> RadiantResult<Self> {
        if !min.is_finite() || min <= 0.0 || !max.is_finite() || max <= min {
            return Err(RadiantError::ConfigError(format!(
                "log-uniform wavelength grid requires 0 < min < max, got [{min}, {max}]"
            )));
        }
        if num_bins == 0 {
            return Err(RadiantError::ConfigError(
                "log-uniform wavelength grid requires num_bins >= 1".to_string(),
            ));
        }
        let ratio = (max / min).ln() / num_bins as f64;
        let borders = (0..=num_bins)
            .map(|i| min * (ratio * i as f64).exp())
            .collect();
        Self::from_borders(borders)
    }

    pub fn from_config(config: &WavelengthGridConfig) -> RadiantResult<Self> {
        config.validate()?;
        Self::log_uniform(
            config.min_wavelength,
            config.max_wavelength,
            config.num_bins,
        )
    }

    pub fn num_bins(&self) -> usize {
        self.lambdav.len()
    }

    /// Characteristic wavelength of bin `ell`.
    pub fn wavelength(&self, ell: usize) -> f64 {
        self.lambdav[ell]
    }

    /// Width of bin `ell`.
    pub fn width(&self, ell: usize) -> f64 {
        self.widths[ell]
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.lambdav
    }

    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    /// Bin index containing `lambda`, or None when the wavelength falls
    /// outside the grid (the upper border is exclusive).
    pub fn bin(&self, lambda: f64) -> Option<usize> {
        if !lambda.is_finite()
            || lambda < self.borders[0]
            || lambda >= self.borders[self.borders.len() - 1]
        {
            return None;
        }
        Some(self.borders.partition_point(|b| *b <= lambda) - 1)
    }
}
