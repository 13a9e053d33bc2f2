// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Photon Packet
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Photon packet state carried through the life cycle.
//!
//! A packet is a quantum of radiation with a position, a propagation
//! direction, a wavelength, a luminosity weight, a scattering counter and an
//! optional polarization state. The embedded [`GridPath`] holds the geometric
//! and optical-depth decomposition of the current random-walk leg.

use crate::constants::C_LIGHT;
use crate::error::{RadiantError, RadiantResult};
use crate::geometry::Vec3;
use crate::path::GridPath;

/// Stokes parameters (I, Q, U, V) of a polarized packet.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StokesVector {
    pub i: f64,
    pub q: f64,
    pub u: f64,
    pub v: f64,
}

impl StokesVector {
    pub fn new(i: f64, q: f64, u: f64, v: f64) -> Self {
        StokesVector { i, q, u, v }
    }

    /// Adds `weight` times `other` into this vector; used by peel-off to
    /// combine per-component Stokes contributions.
    pub fn accumulate(&mut self, other: &StokesVector, weight: f64) {
        self.i += weight * other.i;
        self.q += weight * other.q;
        self.u += weight * other.u;
        self.v += weight * other.v;
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhotonPacket {
    /// Current position (m).
    pub position: Vec3,
    /// Unit propagation direction.
    pub direction: Vec3,
    /// Lab-frame wavelength (m).
    pub wavelength: f64,
    /// Luminosity weight (W).
    pub luminosity: f64,
    /// Number of scattering events experienced so far.
    pub num_scatterings: u32,
    /// Polarization state; None for unpolarized transfer.
    pub stokes: Option<StokesVector>,
    /// Decomposed path of the current random-walk leg.
    pub path: GridPath,

    interaction_cell: Option<usize>,
    interaction_distance: f64,
}

impl PhotonPacket {
    /// Launches a new packet. The direction is normalized; a null direction,
    /// a non-positive wavelength or a negative luminosity is a configuration
    /// error.
    pub fn launch(
        position: Vec3,
        direction: Vec3,
        wavelength: f64,
        luminosity: f64,
    ) -> RadiantResult<Self> {
        if !position.is_finite() {
            return Err(RadiantError::ConfigError(
                "packet launch position must be finite".to_string(),
            ));
        }
        let direction = direction.normalized().ok_or_else(|| {
            RadiantError::ConfigError("packet launch direction must be nonzero".to_string())
        })?;
        if !wavelength.is_finite() || wavelength <= 0.0 {
            return Err(RadiantError::ConfigError(format!(
                "packet launch wavelength must be finite and > 0, got {wavelength}"
            )));
        }
        if !luminosity.is_finite() || luminosity < 0.0 {
            return Err(RadiantError::ConfigError(format!(
                "packet launch luminosity must be finite and >= 0, got {luminosity}"
            )));
        }
        Ok(PhotonPacket {
            position,
            direction,
            wavelength,
            luminosity,
            num_scatterings: 0,
            stokes: None,
            path: GridPath::new(),
            interaction_cell: None,
            interaction_distance: 0.0,
        })
    }

    /// Re-initializes this packet as a peel-off of `source` toward
    /// `direction`, at the source's interaction site, with the luminosity
    /// scaled by `weight` and the given lab-frame wavelength. The packet is
    /// ready for detection afterwards.
    pub fn launch_peel_off(
        &mut self,
        source: &PhotonPacket,
        direction: Vec3,
        wavelength: f64,
        weight: f64,
    ) {
        self.position = source.interaction_position().unwrap_or(source.position);
        self.direction = direction;
        self.wavelength = wavelength;
        self.luminosity = source.luminosity * weight;
        self.num_scatterings = source.num_scatterings + 1;
        self.stokes = None;
        self.path.clear();
        self.interaction_cell = None;
        self.interaction_distance = 0.0;
    }

    /// Wavelength perceived by a medium moving with `bulk_velocity`, with an
    /// optional dimensionless expansion shift:
    /// lambda' = lambda / (1 - k.v/c - shift).
    /// A medium receding along the propagation direction (k.v > 0), or an
    /// expanding flow, perceives a longer wavelength.
    pub fn perceived_wavelength(&self, bulk_velocity: Vec3, expansion_shift: f64) -> f64 {
        self.wavelength
            / (1.0 - self.direction.dot(bulk_velocity) / C_LIGHT - expansion_shift)
    }

    /// Lab-frame wavelength of radiation emitted at `wavelength` in the rest
    /// frame of a medium moving with `bulk_velocity`, toward `direction`.
    pub fn shifted_emission_wavelength(
        wavelength: f64,
        direction: Vec3,
        bulk_velocity: Vec3,
    ) -> f64 {
        wavelength * (1.0 - direction.dot(bulk_velocity) / C_LIGHT)
    }

    /// Applies a scattering event: new direction, new lab-frame wavelength,
    /// scattering counter incremented. Position and luminosity are untouched.
    pub fn scatter(&mut self, direction: Vec3, wavelength: f64) {
        self.direction = direction;
        self.wavelength = wavelength;
        self.num_scatterings += 1;
    }

    /// Moves the packet over a distance `s` along its direction.
    pub fn propagate(&mut self, s: f64) {
        self.position += self.direction * s;
    }

    /// Records the interaction point at cumulative path distance `distance`
    /// inside cell `cell`.
    pub fn set_interaction_point(&mut self, cell: usize, distance: f64) {
        self.interaction_cell = Some(cell);
        self.interaction_distance = distance;
    }

    pub fn clear_interaction_point(&mut self) {
        self.interaction_cell = None;
        self.interaction_distance = 0.0;
    }

    /// Cell hosting the current interaction, if one has been determined.
    pub fn interaction_cell(&self) -> Option<usize> {
        self.interaction_cell
    }

    /// Cumulative path distance to the current interaction point.
    pub fn interaction_distance(&self) -> f64 {
        self.interaction_distance
    }

    /// Spatial position of the current interaction point.
    pub fn interaction_position(&self) -> Option<Vec3> {
        self.interaction_cell
            .map(|_| self.position + self.direction * self.interaction_distance)
    }
}
