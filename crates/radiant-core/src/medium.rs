// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Transfer Media
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Medium input models: analytic density, bulk-velocity, magnetic-field and
//! temperature fields with an associated material mix.

use std::sync::Arc;

use radiant_types::error::{RadiantError, RadiantResult};
use radiant_types::geometry::Vec3;

use crate::materials::MaterialMix;

/// One transfer medium of the input model. The density distribution and mix
/// are assumed constant after setup.
pub trait Medium: Send + Sync {
    /// Symmetry dimension of the medium geometry: 1, 2 or 3.
    fn dimension(&self) -> usize;

    /// Material mix of this medium.
    fn mix(&self) -> Arc<dyn MaterialMix>;

    /// Material mix at a specific position, for media whose mix varies
    /// spatially. The fundamental material type must not vary.
    fn mix_at(&self, _position: Vec3) -> Arc<dyn MaterialMix> {
        self.mix()
    }

    /// True when the mix returned by [`Medium::mix_at`] depends on position,
    /// forcing per-cell mix storage in the medium system.
    fn has_variable_mix(&self) -> bool {
        false
    }

    /// Number density of the medium at `position` (1/m^3).
    fn number_density(&self, position: Vec3) -> f64;

    /// Bulk velocity of the medium at `position` (m/s).
    fn bulk_velocity(&self, _position: Vec3) -> Vec3 {
        Vec3::ZERO
    }

    /// Magnetic field at `position`, for media that define one (T).
    fn magnetic_field(&self, _position: Vec3) -> Option<Vec3> {
        None
    }

    /// Kinetic temperature at `position`, for media that define one (K).
    fn temperature(&self, _position: Vec3) -> Option<f64> {
        None
    }
}

/// Analytic density profile of a [`GeometricMedium`].
#[derive(Debug, Clone)]
pub enum DensityProfile {
    /// Constant density everywhere.
    Uniform { density: f64 },
    /// Spherically symmetric exponential profile around the origin:
    /// n(r) = central_density * exp(-r / scale_length).
    ExponentialSphere {
        central_density: f64,
        scale_length: f64,
    },
}

impl DensityProfile {
    fn validate(&self) -> RadiantResult<()> {
        match *self {
            DensityProfile::Uniform { density } => {
                if !density.is_finite() || density < 0.0 {
                    return Err(RadiantError::ConfigError(format!(
                        "uniform density must be finite and >= 0, got {density}"
                    )));
                }
            }
            DensityProfile::ExponentialSphere {
                central_density,
                scale_length,
            } => {
                if !central_density.is_finite() || central_density < 0.0 {
                    return Err(RadiantError::ConfigError(format!(
                        "central density must be finite and >= 0, got {central_density}"
                    )));
                }
                if !scale_length.is_finite() || scale_length <= 0.0 {
                    return Err(RadiantError::ConfigError(format!(
                        "scale length must be finite and > 0, got {scale_length}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, position: Vec3) -> f64 {
        match *self {
            DensityProfile::Uniform { density } => density,
            DensityProfile::ExponentialSphere {
                central_density,
                scale_length,
            } => central_density * (-position.norm() / scale_length).exp(),
        }
    }

    fn dimension(&self) -> usize {
        match self {
            DensityProfile::Uniform { .. } => 3,
            DensityProfile::ExponentialSphere { .. } => 1,
        }
    }
}

/// Medium defined by an analytic density profile, a constant bulk velocity
/// and optional constant magnetic-field and temperature values.
pub struct GeometricMedium {
    mix: Arc<dyn MaterialMix>,
    density: DensityProfile,
    velocity: Vec3,
    magnetic_field: Option<Vec3>,
    temperature: Option<f64>,
}

impl GeometricMedium {
    pub fn new(mix: Arc<dyn MaterialMix>, density: DensityProfile) -> RadiantResult<Self> {
        density.validate()?;
        Ok(GeometricMedium {
            mix,
            density,
            velocity: Vec3::ZERO,
            magnetic_field: None,
            temperature: None,
        })
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> RadiantResult<Self> {
        if !velocity.is_finite() {
            return Err(RadiantError::ConfigError(
                "medium bulk velocity must be finite".to_string(),
            ));
        }
        self.velocity = velocity;
        Ok(self)
    }

    pub fn with_magnetic_field(mut self, field: Vec3) -> RadiantResult<Self> {
        if !field.is_finite() {
            return Err(RadiantError::ConfigError(
                "medium magnetic field must be finite".to_string(),
            ));
        }
        self.magnetic_field = Some(field);
        Ok(self)
    }

    pub fn with_temperature(mut self, temperature: f64) -> RadiantResult<Self> {
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(RadiantError::ConfigError(format!(
                "medium temperature must be finite and >= 0, got {temperature}"
            )));
        }
        self.temperature = Some(temperature);
        Ok(self)
    }
}

impl Medium for GeometricMedium {
    fn dimension(&self) -> usize {
        // A nonzero transverse velocity or field breaks the density symmetry.
        if !self.velocity.is_null() || self.magnetic_field.is_some() {
            3
        } else {
            self.density.dimension()
        }
    }

    fn mix(&self) -> Arc<dyn MaterialMix> {
        Arc::clone(&self.mix)
    }

    fn number_density(&self, position: Vec3) -> f64 {
        self.density.evaluate(position)
    }

    fn bulk_velocity(&self, _position: Vec3) -> Vec3 {
        self.velocity
    }

    fn magnetic_field(&self, _position: Vec3) -> Option<Vec3> {
        self.magnetic_field
    }

    fn temperature(&self, _position: Vec3) -> Option<f64> {
        self.temperature
    }
}
