// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::error::{RadiantError, RadiantResult};

/// Options governing medium-system setup and radiation-field tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediumSystemOptions {
    /// Number of random density samples per spatial cell used for the
    /// Monte Carlo mass estimate.
    #[serde(default = "default_num_density_samples")]
    pub num_density_samples: usize,

    /// Hubble-flow expansion rate (1/s); zero disables the expansion
    /// contribution to the perceived wavelength.
    #[serde(default)]
    pub hubble_expansion_rate: f64,

    /// Whether the simulation mode records the radiation field; when true,
    /// a wavelength grid must be configured.
    #[serde(default)]
    pub store_radiation_field: bool,

    /// Radiation-field wavelength grid specification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wavelength_grid: Option<WavelengthGridConfig>,
}

/// Logarithmic wavelength grid specification for the radiation-field table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WavelengthGridConfig {
    /// Shortest border wavelength (m).
    pub min_wavelength: f64,
    /// Longest border wavelength (m).
    pub max_wavelength: f64,
    /// Number of wavelength bins.
    pub num_bins: usize,
}

fn default_num_density_samples() -> usize {
    100
}

impl Default for MediumSystemOptions {
    fn default() -> Self {
        MediumSystemOptions {
            num_density_samples: default_num_density_samples(),
            hubble_expansion_rate: 0.0,
            store_radiation_field: false,
            wavelength_grid: None,
        }
    }
}

impl MediumSystemOptions {
    /// Load from a JSON file.
    pub fn from_file(path: &str) -> RadiantResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&contents)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> RadiantResult<()> {
        if !(10..=1000).contains(&self.num_density_samples) {
            return Err(RadiantError::ConfigError(format!(
                "num_density_samples must be in [10, 1000], got {}",
                self.num_density_samples
            )));
        }
        if !self.hubble_expansion_rate.is_finite() || self.hubble_expansion_rate < 0.0 {
            return Err(RadiantError::ConfigError(format!(
                "hubble_expansion_rate must be finite and >= 0, got {}",
                self.hubble_expansion_rate
            )));
        }
        if self.store_radiation_field && self.wavelength_grid.is_none() {
            return Err(RadiantError::ConfigError(
                "store_radiation_field requires a wavelength_grid".to_string(),
            ));
        }
        if let Some(ref wlg) = self.wavelength_grid {
            wlg.validate()?;
        }
        Ok(())
    }
}

impl WavelengthGridConfig {
    pub fn validate(&self) -> RadiantResult<()> {
        if !self.min_wavelength.is_finite() || self.min_wavelength <= 0.0 {
            return Err(RadiantError::ConfigError(format!(
                "min_wavelength must be finite and > 0, got {}",
                self.min_wavelength
            )));
        }
        if !self.max_wavelength.is_finite() || self.max_wavelength <= self.min_wavelength {
            return Err(RadiantError::ConfigError(format!(
                "max_wavelength must be finite and > min_wavelength, got {}",
                self.max_wavelength
            )));
        }
        if self.num_bins == 0 {
            return Err(RadiantError::ConfigError(
                "wavelength grid requires num_bins >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
