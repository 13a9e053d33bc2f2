// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Material Mixes
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Material-mix capability: per-entity cross sections, scattering-event
//! simulation and peel-off contributions for the supported fundamental
//! material types (dust, electrons, gas).
//!
//! The phase-function factor returned by peel-off uses the mean-one
//! normalization: the average of the factor over all outgoing directions is
//! unity, so an isotropic scatterer contributes exactly 1.

use rand::{Rng, RngCore};
use rand_distr::{Distribution, UnitSphere};

use radiant_math::planck::equilibrium_temperature;
use radiant_math::wavelengths::WavelengthGrid;
use radiant_types::constants::{M_ELECTRON, M_PROTON, SIGMA_THOMSON};
use radiant_types::error::{RadiantError, RadiantResult};
use radiant_types::geometry::{deflected_direction, Vec3};
use radiant_types::packet::{PhotonPacket, StokesVector};

/// Fundamental material type of a medium component. The type is identical
/// across all spatial cells for a given component, even when the mix itself
/// varies per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialType {
    Dust,
    Electron,
    Gas,
}

/// Result of a single mix's peel-off evaluation toward an observer.
#[derive(Debug, Clone, Copy)]
pub struct PeelOffContribution {
    /// Phase-function factor toward the observer (mean-one normalization).
    pub weight: f64,
    /// Medium-frame wavelength after the event when this mix shifts it.
    pub wavelength: Option<f64>,
    /// Stokes contribution when the mix polarizes the outgoing radiation.
    pub stokes: Option<StokesVector>,
}

/// Capability interface of a material mix.
///
/// Cross sections are per entity; opacities are obtained by multiplying with
/// the local number density. The optional photon packet carries context such
/// as the polarization state for mixes that depend on it; the default
/// implementations ignore it and use unpolarized radiation.
pub trait MaterialMix: Send + Sync {
    fn material_type(&self) -> MaterialType;

    /// Mass per entity (kg), converting number density to mass density.
    fn mass(&self) -> f64;

    fn section_abs(&self, lambda: f64) -> f64;

    fn section_sca(&self, lambda: f64) -> f64;

    fn section_ext(&self, lambda: f64) -> f64 {
        self.section_abs(lambda) + self.section_sca(lambda)
    }

    fn opacity_abs(&self, lambda: f64, number_density: f64, _pp: Option<&PhotonPacket>) -> f64 {
        number_density * self.section_abs(lambda)
    }

    fn opacity_sca(&self, lambda: f64, number_density: f64, _pp: Option<&PhotonPacket>) -> f64 {
        number_density * self.section_sca(lambda)
    }

    fn opacity_ext(&self, lambda: f64, number_density: f64, _pp: Option<&PhotonPacket>) -> f64 {
        number_density * self.section_ext(lambda)
    }

    /// Performs a random-walk scattering event: samples a new propagation
    /// direction and updates the packet's direction, medium-frame wavelength
    /// and polarization state. The caller applies the bulk-velocity Doppler
    /// shift to the lab frame afterwards.
    fn perform_scattering(&self, rng: &mut dyn RngCore, lambda: f64, pp: &mut PhotonPacket);

    /// Evaluates the peel-off contribution toward `observer` for a packet
    /// scattering at the given medium-frame wavelength. `pol_reference`
    /// orients the Stokes frame for polarizing mixes.
    fn peel_off(
        &self,
        lambda: f64,
        pp: &PhotonPacket,
        observer: Vec3,
        pol_reference: Vec3,
    ) -> PeelOffContribution;

    /// LTE equilibrium temperature of the material embedded in the given
    /// mean-intensity field. Only meaningful for materials with an
    /// emission/absorption balance (dust); other types report an error.
    fn equilibrium_temperature(
        &self,
        _grid: &WavelengthGrid,
        _mean_intensity: &[f64],
    ) -> RadiantResult<f64> {
        Err(RadiantError::PhysicsViolation(
            "material mix does not define an equilibrium temperature".to_string(),
        ))
    }
}

/// Henyey-Greenstein phase function with mean-one normalization.
pub fn hg_phase(g: f64, cos_theta: f64) -> f64 {
    if g.abs() < 1e-6 {
        return 1.0;
    }
    let denom = 1.0 + g * g - 2.0 * g * cos_theta;
    (1.0 - g * g) / denom.powf(1.5)
}

/// Samples a scattering-angle cosine from the Henyey-Greenstein distribution.
pub fn sample_hg_cos(rng: &mut dyn RngCore, g: f64) -> f64 {
    let u: f64 = rng.gen();
    if g.abs() < 1e-6 {
        return 2.0 * u - 1.0;
    }
    let frac = (1.0 - g * g) / (1.0 - g + 2.0 * g * u);
    ((1.0 + g * g - frac * frac) / (2.0 * g)).clamp(-1.0, 1.0)
}

fn isotropic_direction(rng: &mut dyn RngCore) -> Vec3 {
    let v: [f64; 3] = UnitSphere.sample(rng);
    Vec3::new(v[0], v[1], v[2])
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in mixes
// ═══════════════════════════════════════════════════════════════════════

/// Dust mix with power-law cross sections around a reference wavelength and
/// Henyey-Greenstein scattering.
#[derive(Debug, Clone)]
pub struct DustMix {
    /// Extinction cross section per grain at the reference wavelength (m^2).
    pub reference_section: f64,
    /// Reference wavelength (m).
    pub reference_wavelength: f64,
    /// Power-law index: sections scale as (lambda/lambda_ref)^(-index).
    pub opacity_index: f64,
    /// Scattering albedo, constant over wavelength.
    pub albedo: f64,
    /// Henyey-Greenstein asymmetry parameter g.
    pub asymmetry: f64,
    /// Grain mass (kg).
    pub grain_mass: f64,
}

impl DustMix {
    pub fn new(
        reference_section: f64,
        reference_wavelength: f64,
        opacity_index: f64,
        albedo: f64,
        asymmetry: f64,
        grain_mass: f64,
    ) -> RadiantResult<Self> {
        if !reference_section.is_finite() || reference_section <= 0.0 {
            return Err(RadiantError::ConfigError(format!(
                "dust reference_section must be finite and > 0, got {reference_section}"
            )));
        }
        if !reference_wavelength.is_finite() || reference_wavelength <= 0.0 {
            return Err(RadiantError::ConfigError(format!(
                "dust reference_wavelength must be finite and > 0, got {reference_wavelength}"
            )));
        }
        if !(0.0..=1.0).contains(&albedo) {
            return Err(RadiantError::ConfigError(format!(
                "dust albedo must be in [0, 1], got {albedo}"
            )));
        }
        if !(-1.0..1.0).contains(&asymmetry) {
            return Err(RadiantError::ConfigError(format!(
                "dust asymmetry must be in [-1, 1), got {asymmetry}"
            )));
        }
        if !grain_mass.is_finite() || grain_mass <= 0.0 {
            return Err(RadiantError::ConfigError(format!(
                "dust grain_mass must be finite and > 0, got {grain_mass}"
            )));
        }
        Ok(DustMix {
            reference_section,
            reference_wavelength,
            opacity_index,
            albedo,
            asymmetry,
            grain_mass,
        })
    }

    fn section_at(&self, lambda: f64) -> f64 {
        if lambda <= 0.0 {
            return 0.0;
        }
        self.reference_section * (lambda / self.reference_wavelength).powf(-self.opacity_index)
    }
}

impl MaterialMix for DustMix {
    fn material_type(&self) -> MaterialType {
        MaterialType::Dust
    }

    fn mass(&self) -> f64 {
        self.grain_mass
    }

    fn section_abs(&self, lambda: f64) -> f64 {
        (1.0 - self.albedo) * self.section_at(lambda)
    }

    fn section_sca(&self, lambda: f64) -> f64 {
        self.albedo * self.section_at(lambda)
    }

    fn perform_scattering(&self, rng: &mut dyn RngCore, lambda: f64, pp: &mut PhotonPacket) {
        let cos_theta = sample_hg_cos(rng, self.asymmetry);
        let phi = rng.gen_range(0.0..std::f64::consts::TAU);
        pp.direction = deflected_direction(pp.direction, cos_theta, phi);
        pp.wavelength = lambda;
    }

    fn peel_off(
        &self,
        _lambda: f64,
        pp: &PhotonPacket,
        observer: Vec3,
        _pol_reference: Vec3,
    ) -> PeelOffContribution {
        let cos_theta = pp.direction.dot(observer);
        PeelOffContribution {
            weight: hg_phase(self.asymmetry, cos_theta),
            wavelength: None,
            stokes: None,
        }
    }

    fn equilibrium_temperature(
        &self,
        grid: &WavelengthGrid,
        mean_intensity: &[f64],
    ) -> RadiantResult<f64> {
        let sections: Vec<f64> = grid
            .wavelengths()
            .iter()
            .map(|&lam| self.section_abs(lam))
            .collect();
        equilibrium_temperature(grid, &sections, mean_intensity)
    }
}

/// Free electrons: wavelength-independent Thomson scattering, no absorption.
#[derive(Debug, Clone, Default)]
pub struct ElectronMix;

impl MaterialMix for ElectronMix {
    fn material_type(&self) -> MaterialType {
        MaterialType::Electron
    }

    fn mass(&self) -> f64 {
        M_ELECTRON
    }

    fn section_abs(&self, _lambda: f64) -> f64 {
        0.0
    }

    fn section_sca(&self, _lambda: f64) -> f64 {
        SIGMA_THOMSON
    }

    fn perform_scattering(&self, rng: &mut dyn RngCore, lambda: f64, pp: &mut PhotonPacket) {
        pp.direction = isotropic_direction(rng);
        pp.wavelength = lambda;
    }

    fn peel_off(
        &self,
        _lambda: f64,
        _pp: &PhotonPacket,
        _observer: Vec3,
        _pol_reference: Vec3,
    ) -> PeelOffContribution {
        PeelOffContribution {
            weight: 1.0,
            wavelength: None,
            stokes: None,
        }
    }
}

/// Absorption-dominated gas with a power-law absorption cross section and a
/// kinetic temperature state.
#[derive(Debug, Clone)]
pub struct GasMix {
    /// Absorption cross section per particle at the reference wavelength (m^2).
    pub reference_section: f64,
    /// Reference wavelength (m).
    pub reference_wavelength: f64,
    /// Power-law index of the absorption cross section.
    pub opacity_index: f64,
    /// Particle mass (kg).
    pub particle_mass: f64,
}

impl GasMix {
    pub fn new(
        reference_section: f64,
        reference_wavelength: f64,
        opacity_index: f64,
    ) -> RadiantResult<Self> {
        if !reference_section.is_finite() || reference_section < 0.0 {
            return Err(RadiantError::ConfigError(format!(
                "gas reference_section must be finite and >= 0, got {reference_section}"
            )));
        }
        if !reference_wavelength.is_finite() || reference_wavelength <= 0.0 {
            return Err(RadiantError::ConfigError(format!(
                "gas reference_wavelength must be finite and > 0, got {reference_wavelength}"
            )));
        }
        Ok(GasMix {
            reference_section,
            reference_wavelength,
            opacity_index,
            particle_mass: M_PROTON,
        })
    }
}

impl MaterialMix for GasMix {
    fn material_type(&self) -> MaterialType {
        MaterialType::Gas
    }

    fn mass(&self) -> f64 {
        self.particle_mass
    }

    fn section_abs(&self, lambda: f64) -> f64 {
        if lambda <= 0.0 {
            return 0.0;
        }
        self.reference_section * (lambda / self.reference_wavelength).powf(-self.opacity_index)
    }

    fn section_sca(&self, _lambda: f64) -> f64 {
        0.0
    }

    fn perform_scattering(&self, rng: &mut dyn RngCore, lambda: f64, pp: &mut PhotonPacket) {
        pp.direction = isotropic_direction(rng);
        pp.wavelength = lambda;
    }

    fn peel_off(
        &self,
        _lambda: f64,
        _pp: &PhotonPacket,
        _observer: Vec3,
        _pol_reference: Vec3,
    ) -> PeelOffContribution {
        PeelOffContribution {
            weight: 0.0,
            wavelength: None,
            stokes: None,
        }
    }
}
