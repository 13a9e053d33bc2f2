// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Medium System
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The medium system: superposition of one or more transfer media over a
//! spatial grid, with per-cell state, the opacity/scattering engine, and the
//! radiation-field accumulator.
//!
//! Setup estimates the per-cell number densities by Monte Carlo sampling of
//! each medium's analytic density field, aggregates bulk velocity, magnetic
//! field and gas temperature per cell, and merges the partial states computed
//! by cooperating processes through one sum-reduce barrier. All per-cell and
//! per-cell-per-medium arrays are allocated exactly once here and are
//! immutable afterwards; read-only queries are safe for unlimited concurrent
//! use.

use std::sync::Arc;

use rand::{Rng, RngCore};
use rayon::prelude::*;

use radiant_math::wavelengths::WavelengthGrid;
use radiant_types::config::MediumSystemOptions;
use radiant_types::constants::C_LIGHT;
use radiant_types::error::{RadiantError, RadiantResult};
use radiant_types::geometry::Vec3;
use radiant_types::packet::PhotonPacket;

use crate::comm::{balanced_partition, ProcessComm};
use crate::grid::SpatialGrid;
use crate::materials::{MaterialMix, MaterialType};
use crate::medium::Medium;
use crate::radiation_field::RadiationField;

/// State maintained per spatial cell.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CellState {
    pub volume: f64,
    pub velocity: Vec3,
    pub magnetic_field: Vec3,
    /// Mass-weighted aggregate gas temperature; zero without gas.
    pub temperature: f64,
}

/// State maintained per cell and per medium component.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MediumState {
    pub number_density: f64,
    /// Component temperature; zero for media without a temperature field.
    pub temperature: f64,
}

/// Number of doubles packed per cell by the state merge.
const CELL_MERGE_FIELDS: usize = 8;
/// Number of doubles packed per (cell, medium) pair by the state merge.
const MEDIUM_MERGE_FIELDS: usize = 2;

pub struct MediumSystem {
    pub(crate) grid: Arc<dyn SpatialGrid>,
    pub(crate) media: Vec<Arc<dyn Medium>>,
    pub(crate) comm: Arc<dyn ProcessComm>,
    pub(crate) options: MediumSystemOptions,
    pub(crate) num_cells: usize,
    pub(crate) num_media: usize,
    pub(crate) state1: Vec<CellState>,
    pub(crate) state2: Vec<MediumState>,
    /// Indexed on h, or on (m, h) when `mix_per_cell` is set.
    pub(crate) mixes: Vec<Arc<dyn MaterialMix>>,
    pub(crate) mix_per_cell: bool,
    pub(crate) has_moving_media: bool,
    pub(crate) rf: Option<RadiationField>,
}

impl MediumSystem {
    /// Builds the medium system and runs the full setup: local per-cell
    /// state computation for this process's block of cells (parallelized
    /// over a thread pool), followed by the cross-process state merge and
    /// radiation-field table allocation.
    pub fn new(
        grid: Arc<dyn SpatialGrid>,
        media: Vec<Arc<dyn Medium>>,
        options: MediumSystemOptions,
        comm: Arc<dyn ProcessComm>,
    ) -> RadiantResult<Self> {
        options.validate()?;
        if media.is_empty() {
            return Err(RadiantError::ConfigError(
                "medium system requires at least one transfer medium".to_string(),
            ));
        }
        let num_cells = grid.num_cells();
        if num_cells == 0 {
            return Err(RadiantError::ConfigError(
                "medium system requires a grid with at least one cell".to_string(),
            ));
        }
        let num_media = media.len();
        if comm.rank() >= comm.size() {
            return Err(RadiantError::ConfigError(format!(
                "communicator rank {} out of range for size {}",
                comm.rank(),
                comm.size()
            )));
        }

        // One mix per component, or one per cell per component when any
        // medium reports a spatially varying mix.
        let mix_per_cell = media.iter().any(|medium| medium.has_variable_mix());
        let mixes: Vec<Arc<dyn MaterialMix>> = if mix_per_cell {
            (0..num_cells)
                .flat_map(|m| {
                    let center = grid.cell_center(m);
                    media.iter().map(move |medium| medium.mix_at(center))
                })
                .collect()
        } else {
            media.iter().map(|medium| medium.mix()).collect()
        };

        // Local compute: this process owns a contiguous block of cells; the
        // merge barrier below fills in the rest.
        let my_range = balanced_partition(num_cells, comm.size())[comm.rank()].clone();
        let mut state1 = vec![CellState::default(); num_cells];
        let mut state2 = vec![MediumState::default(); num_cells * num_media];
        let computed: Vec<(usize, CellState, Vec<MediumState>, bool)> = my_range
            .into_par_iter()
            .map(|m| {
                let (cell, per_medium, extra_field) = estimate_cell_state(
                    grid.as_ref(),
                    &media,
                    &mixes,
                    mix_per_cell,
                    num_media,
                    options.num_density_samples,
                    m,
                );
                (m, cell, per_medium, extra_field)
            })
            .collect();
        let mut cells_with_extra_field = 0usize;
        for (m, cell, per_medium, extra_field) in computed {
            state1[m] = cell;
            state2[m * num_media..(m + 1) * num_media].copy_from_slice(&per_medium);
            cells_with_extra_field += usize::from(extra_field);
        }
        if cells_with_extra_field > 0 {
            log::warn!(
                "{cells_with_extra_field} cells define a magnetic field in more than one medium; keeping the first"
            );
        }

        let rf = if options.store_radiation_field {
            let wlg_config = options.wavelength_grid.as_ref().ok_or_else(|| {
                RadiantError::ConfigError(
                    "store_radiation_field requires a wavelength_grid".to_string(),
                )
            })?;
            Some(RadiationField::new(
                WavelengthGrid::from_config(wlg_config)?,
                num_cells,
            ))
        } else {
            None
        };

        let mut system = MediumSystem {
            grid,
            media,
            comm,
            options,
            num_cells,
            num_media,
            state1,
            state2,
            mixes,
            mix_per_cell,
            has_moving_media: false,
            rf,
        };
        system.communicate_states()?;
        system.has_moving_media = system.state1.iter().any(|s| !s.velocity.is_null());

        log::info!(
            "medium system ready: {} cells, {} media, {} wavelength bins, mix per cell: {}",
            system.num_cells,
            system.num_media,
            system
                .rf
                .as_ref()
                .map_or(0, |rf| rf.wavelength_grid().num_bins()),
            system.mix_per_cell
        );
        Ok(system)
    }

    /// Merges the cell states initialized in parallel by cooperating
    /// processes: every process contributed a disjoint block of cells, so a
    /// single element-wise sum reconstructs the global state everywhere.
    fn communicate_states(&mut self) -> RadiantResult<()> {
        if self.comm.size() == 1 {
            return Ok(());
        }
        let cell_len = self.num_cells * CELL_MERGE_FIELDS;
        let mut buffer =
            vec![0.0; cell_len + self.num_cells * self.num_media * MEDIUM_MERGE_FIELDS];
        for (m, s) in self.state1.iter().enumerate() {
            let base = m * CELL_MERGE_FIELDS;
            buffer[base] = s.volume;
            buffer[base + 1] = s.velocity.x;
            buffer[base + 2] = s.velocity.y;
            buffer[base + 3] = s.velocity.z;
            buffer[base + 4] = s.magnetic_field.x;
            buffer[base + 5] = s.magnetic_field.y;
            buffer[base + 6] = s.magnetic_field.z;
            buffer[base + 7] = s.temperature;
        }
        for (i, s) in self.state2.iter().enumerate() {
            let base = cell_len + i * MEDIUM_MERGE_FIELDS;
            buffer[base] = s.number_density;
            buffer[base + 1] = s.temperature;
        }

        self.comm.sum_all(&mut buffer)?;

        for (m, s) in self.state1.iter_mut().enumerate() {
            let base = m * CELL_MERGE_FIELDS;
            s.volume = buffer[base];
            s.velocity = Vec3::new(buffer[base + 1], buffer[base + 2], buffer[base + 3]);
            s.magnetic_field = Vec3::new(buffer[base + 4], buffer[base + 5], buffer[base + 6]);
            s.temperature = buffer[base + 7];
        }
        for (i, s) in self.state2.iter_mut().enumerate() {
            let base = cell_len + i * MEDIUM_MERGE_FIELDS;
            s.number_density = buffer[base];
            s.temperature = buffer[base + 1];
        }
        log::debug!("cell states merged across {} processes", self.comm.size());
        Ok(())
    }

    // ── Basic queries ────────────────────────────────────────────────

    /// Dimension of the medium system: the medium with the least symmetry
    /// (highest dimension) determines the result, not the grid.
    pub fn dimension(&self) -> usize {
        self.media
            .iter()
            .map(|medium| medium.dimension())
            .max()
            .unwrap_or(1)
    }

    pub fn grid_dimension(&self) -> usize {
        self.grid.dimension()
    }

    pub fn num_media(&self) -> usize {
        self.num_media
    }

    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    pub fn volume(&self, m: usize) -> f64 {
        self.state1[m].volume
    }

    /// Density-weighted aggregate bulk velocity of the medium in cell `m`.
    pub fn bulk_velocity(&self, m: usize) -> Vec3 {
        self.state1[m].velocity
    }

    /// Magnetic field in cell `m`; the null vector when no medium component
    /// defines one. When more than one component defines a field, the first
    /// component in declaration order wins.
    pub fn magnetic_field(&self, m: usize) -> Vec3 {
        self.state1[m].magnetic_field
    }

    /// Material mix of component `h` in cell `m`.
    pub fn mix(&self, m: usize, h: usize) -> Arc<dyn MaterialMix> {
        Arc::clone(self.mix_ref(m, h))
    }

    pub(crate) fn mix_ref(&self, m: usize, h: usize) -> &Arc<dyn MaterialMix> {
        if self.mix_per_cell {
            &self.mixes[m * self.num_media + h]
        } else {
            &self.mixes[h]
        }
    }

    /// True when at least one medium has the given fundamental type.
    pub fn has_material_type(&self, material_type: MaterialType) -> bool {
        (0..self.num_media).any(|h| self.is_material_type(material_type, h))
    }

    pub fn has_dust(&self) -> bool {
        self.has_material_type(MaterialType::Dust)
    }

    pub fn has_electrons(&self) -> bool {
        self.has_material_type(MaterialType::Electron)
    }

    pub fn has_gas(&self) -> bool {
        self.has_material_type(MaterialType::Gas)
    }

    /// True when component `h` has the given fundamental type. The type is
    /// identical across cells even for spatially varying mixes.
    pub fn is_material_type(&self, material_type: MaterialType, h: usize) -> bool {
        self.mix_ref(0, h).material_type() == material_type
    }

    pub fn is_dust(&self, h: usize) -> bool {
        self.is_material_type(MaterialType::Dust, h)
    }

    pub fn is_electrons(&self, h: usize) -> bool {
        self.is_material_type(MaterialType::Electron, h)
    }

    pub fn is_gas(&self, h: usize) -> bool {
        self.is_material_type(MaterialType::Gas, h)
    }

    pub fn number_density(&self, m: usize, h: usize) -> f64 {
        self.state2[m * self.num_media + h].number_density
    }

    pub fn mass_density(&self, m: usize, h: usize) -> f64 {
        self.number_density(m, h) * self.mix_ref(m, h).mass()
    }

    /// Temperature of component `h` in cell `m`; meaningful only for media
    /// that define a temperature field.
    pub fn temperature(&self, m: usize, h: usize) -> f64 {
        self.state2[m * self.num_media + h].temperature
    }

    /// Mass-weighted average temperature over the gas components in cell
    /// `m`, aggregated at setup; zero when the cell holds no gas.
    pub fn indicative_gas_temperature(&self, m: usize) -> f64 {
        self.state1[m].temperature
    }

    // ── Opacities ────────────────────────────────────────────────────

    pub(crate) fn component_opacity_abs(
        &self,
        lambda: f64,
        m: usize,
        h: usize,
        pp: Option<&PhotonPacket>,
    ) -> f64 {
        self.mix_ref(m, h)
            .opacity_abs(lambda, self.number_density(m, h), pp)
    }

    pub(crate) fn component_opacity_sca(
        &self,
        lambda: f64,
        m: usize,
        h: usize,
        pp: Option<&PhotonPacket>,
    ) -> f64 {
        self.mix_ref(m, h)
            .opacity_sca(lambda, self.number_density(m, h), pp)
    }

    pub(crate) fn component_opacity_ext(
        &self,
        lambda: f64,
        m: usize,
        h: usize,
        pp: Option<&PhotonPacket>,
    ) -> f64 {
        self.mix_ref(m, h)
            .opacity_ext(lambda, self.number_density(m, h), pp)
    }

    /// Absorption opacity summed over the components with the given type,
    /// using default (unpolarized) packet properties.
    pub fn opacity_abs_for_type(&self, lambda: f64, m: usize, material_type: MaterialType) -> f64 {
        (0..self.num_media)
            .filter(|&h| self.is_material_type(material_type, h))
            .map(|h| self.component_opacity_abs(lambda, m, h, None))
            .sum()
    }

    /// Extinction opacity summed over the components with the given type,
    /// using default (unpolarized) packet properties.
    pub fn opacity_ext_for_type(&self, lambda: f64, m: usize, material_type: MaterialType) -> f64 {
        (0..self.num_media)
            .filter(|&h| self.is_material_type(material_type, h))
            .map(|h| self.component_opacity_ext(lambda, m, h, None))
            .sum()
    }

    /// Extinction opacity summed over all components, using default
    /// (unpolarized) packet properties.
    pub fn opacity_ext(&self, lambda: f64, m: usize) -> f64 {
        (0..self.num_media)
            .map(|h| self.component_opacity_ext(lambda, m, h, None))
            .sum()
    }

    // ── Scattering engine ────────────────────────────────────────────

    pub(crate) fn interaction_cell_of(&self, pp: &PhotonPacket) -> RadiantResult<usize> {
        pp.interaction_cell().ok_or_else(|| {
            RadiantError::PhysicsViolation(
                "photon packet has no interaction point in the medium system".to_string(),
            )
        })
    }

    /// Hubble-flow contribution to the perceived-wavelength shift at path
    /// distance `s`.
    pub(crate) fn expansion_shift(&self, s: f64) -> f64 {
        if self.options.hubble_expansion_rate > 0.0 {
            self.options.hubble_expansion_rate * s / C_LIGHT
        } else {
            0.0
        }
    }

    /// Wavelength perceived by the medium in cell `m` for a packet at path
    /// distance `s_mid`, accounting for bulk velocity and expansion.
    pub(crate) fn perceived_wavelength_in_cell(
        &self,
        pp: &PhotonPacket,
        m: usize,
        s_mid: f64,
    ) -> f64 {
        pp.perceived_wavelength(self.state1[m].velocity, self.expansion_shift(s_mid))
    }

    /// Wavelength perceived by the medium at the packet's scattering
    /// interaction point.
    pub fn perceived_wavelength_for_scattering(&self, pp: &PhotonPacket) -> RadiantResult<f64> {
        let m = self.interaction_cell_of(pp)?;
        Ok(self.perceived_wavelength_in_cell(pp, m, pp.interaction_distance()))
    }

    /// Weighted scattering albedo sum_h k_sca / sum_h k_ext at the perceived
    /// wavelength in the packet's interaction cell, with the packet's full
    /// context.
    pub fn albedo_for_scattering(&self, pp: &PhotonPacket) -> RadiantResult<f64> {
        let m = self.interaction_cell_of(pp)?;
        let lambda = self.perceived_wavelength_for_scattering(pp)?;
        let mut sca = 0.0;
        let mut ext = 0.0;
        for h in 0..self.num_media {
            sca += self.component_opacity_sca(lambda, m, h, Some(pp));
            ext += self.component_opacity_ext(lambda, m, h, Some(pp));
        }
        if ext > 0.0 {
            Ok(sca / ext)
        } else {
            Ok(0.0)
        }
    }

    /// Relative scattering weights of the medium components at wavelength
    /// `lambda` in the packet's interaction cell, normalized to unit sum and
    /// written into `weights` (resized to the number of media). Returns
    /// false, leaving the weights unspecified, when every component's
    /// scattering opacity vanishes: the packet does not scatter here.
    pub fn weights_for_scattering(
        &self,
        weights: &mut Vec<f64>,
        lambda: f64,
        pp: &PhotonPacket,
    ) -> bool {
        let m = match pp.interaction_cell() {
            Some(m) => m,
            None => return false,
        };
        weights.resize(self.num_media, 0.0);
        let mut total = 0.0;
        for h in 0..self.num_media {
            let w = self.component_opacity_sca(lambda, m, h, Some(pp));
            weights[h] = w;
            total += w;
        }
        if total > 0.0 {
            for w in weights.iter_mut() {
                *w /= total;
            }
            true
        } else {
            false
        }
    }

    /// Simulates a random-walk scattering event at the packet's interaction
    /// point. The propagation direction, wavelength (Doppler-shifted for the
    /// cell's bulk velocity) and polarization state are updated and the
    /// scattering counter is incremented; position and luminosity are
    /// untouched. With multiple components, the scattering component is
    /// drawn with probability proportional to its scattering opacity.
    pub fn simulate_scattering(
        &self,
        rng: &mut dyn RngCore,
        pp: &mut PhotonPacket,
    ) -> RadiantResult<()> {
        let m = self.interaction_cell_of(pp)?;
        let lambda = self.perceived_wavelength_for_scattering(pp)?;

        let h = if self.num_media == 1 {
            0
        } else {
            let mut weights = Vec::with_capacity(self.num_media);
            if !self.weights_for_scattering(&mut weights, lambda, pp) {
                return Err(RadiantError::ConfigError(
                    "no scattering opacity available in the interaction cell".to_string(),
                ));
            }
            let x: f64 = rng.gen();
            let mut cumulative = 0.0;
            let mut chosen = self.num_media - 1;
            for (h, w) in weights.iter().enumerate() {
                cumulative += w;
                if x < cumulative {
                    chosen = h;
                    break;
                }
            }
            chosen
        };

        // The mix updates direction, medium-frame wavelength and polarization.
        self.mix_ref(m, h).perform_scattering(rng, lambda, pp);

        let v = self.state1[m].velocity;
        let direction = pp.direction;
        let lambda_lab = if v.is_null() {
            pp.wavelength
        } else {
            PhotonPacket::shifted_emission_wavelength(pp.wavelength, direction, v)
        };
        pp.scatter(direction, lambda_lab);
        Ok(())
    }

    /// Computes the peel-off luminosity, polarization and wavelength shift
    /// toward `observer` for a scattering event of `pp`, and launches the
    /// placeholder packet `ppp` ready for detection. Contributions are
    /// weighted by the precomputed per-component scattering weights; when
    /// multiple components shift the wavelength, only the shift of the last
    /// evaluated component is preserved.
    pub fn peel_off_scattering(
        &self,
        lambda: f64,
        weights: &[f64],
        observer: Vec3,
        pol_reference: Vec3,
        pp: &PhotonPacket,
        ppp: &mut PhotonPacket,
    ) -> RadiantResult<()> {
        let m = self.interaction_cell_of(pp)?;
        if weights.len() != self.num_media {
            return Err(RadiantError::ConfigError(format!(
                "peel-off weights length {} does not match {} media",
                weights.len(),
                self.num_media
            )));
        }

        let mut weight_total = 0.0;
        let mut lambda_out = lambda;
        let mut stokes = radiant_types::packet::StokesVector::default();
        let mut any_stokes = false;
        for h in 0..self.num_media {
            let contribution = self.mix_ref(m, h).peel_off(lambda, pp, observer, pol_reference);
            weight_total += weights[h] * contribution.weight;
            if let Some(shifted) = contribution.wavelength {
                lambda_out = shifted;
            }
            if let Some(s) = contribution.stokes {
                stokes.accumulate(&s, weights[h]);
                any_stokes = true;
            }
        }

        let v = self.state1[m].velocity;
        let lambda_lab = if v.is_null() {
            lambda_out
        } else {
            PhotonPacket::shifted_emission_wavelength(lambda_out, observer, v)
        };
        ppp.launch_peel_off(pp, observer, lambda_lab, weight_total);
        if any_stokes {
            ppp.stokes = Some(stokes);
        }
        Ok(())
    }

    /// True when all cross sections are spatially constant and no cell
    /// moves: the perceived wavelength, and therefore every opacity, is
    /// identical along a path, enabling the optimized integrator paths.
    pub(crate) fn constant_section_mode(&self) -> bool {
        !self.mix_per_cell
            && !self.has_moving_media
            && self.options.hubble_expansion_rate == 0.0
    }
}

/// Local per-cell state estimate: Monte Carlo density sampling restricted to
/// the cell extent, density-weighted bulk velocity, magnetic field from the
/// first component defining one, and the mass-weighted gas temperature.
/// The returned flag reports that more than one component defined a field.
fn estimate_cell_state(
    grid: &dyn SpatialGrid,
    media: &[Arc<dyn Medium>],
    mixes: &[Arc<dyn MaterialMix>],
    mix_per_cell: bool,
    num_media: usize,
    num_samples: usize,
    m: usize,
) -> (CellState, Vec<MediumState>, bool) {
    let mut rng = rand::thread_rng();
    let center = grid.cell_center(m);

    let mut per_medium = vec![MediumState::default(); num_media];
    let mut velocity_weighted = Vec3::ZERO;
    let mut density_total = 0.0;
    let mut magnetic_field = Vec3::ZERO;
    let mut fields_defined = 0usize;
    let mut gas_t_weighted = 0.0;
    let mut gas_rho_total = 0.0;

    for (h, medium) in media.iter().enumerate() {
        let mut density_sum = 0.0;
        for _ in 0..num_samples {
            let position = grid.random_position_in_cell(&mut rng, m);
            density_sum += medium.number_density(position);
        }
        let n = density_sum / num_samples as f64;
        let t = medium.temperature(center).unwrap_or(0.0);
        per_medium[h] = MediumState {
            number_density: n,
            temperature: t,
        };

        velocity_weighted += medium.bulk_velocity(center) * n;
        density_total += n;

        if let Some(field) = medium.magnetic_field(center) {
            if fields_defined == 0 {
                magnetic_field = field;
            }
            fields_defined += 1;
        }

        let mix = if mix_per_cell {
            &mixes[m * num_media + h]
        } else {
            &mixes[h]
        };
        if mix.material_type() == MaterialType::Gas {
            let rho = n * mix.mass();
            gas_t_weighted += rho * t;
            gas_rho_total += rho;
        }
    }

    let cell = CellState {
        volume: grid.volume(m),
        velocity: if density_total > 0.0 {
            velocity_weighted * (1.0 / density_total)
        } else {
            Vec3::ZERO
        },
        magnetic_field,
        temperature: if gas_rho_total > 0.0 {
            gas_t_weighted / gas_rho_total
        } else {
            0.0
        },
    };
    (cell, per_medium, fields_defined > 1)
}
