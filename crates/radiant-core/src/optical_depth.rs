// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Optical-Depth Integrators
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Optical-depth integration over a decomposed path, in four variants tuned
//! for different photon-handling regimes: type-filtered diagnostics, the
//! forced-scattering full-path profile, the early-exit interaction search,
//! and the distance-limited peel-off sum.
//!
//! The perceived wavelength (bulk velocity + expansion) and the optimized
//! path for spatially constant cross sections are shared between the three
//! performance-critical variants so forced and non-forced life cycles see
//! identical optical depths.

use radiant_types::constants::SMALLEST_LUMINOSITY;
use radiant_types::geometry::Vec3;
use radiant_types::packet::PhotonPacket;

use crate::materials::MaterialType;
use crate::medium_system::MediumSystem;

/// Per-path extinction evaluator. In constant-section mode the per-component
/// cross sections are looked up once at the packet wavelength; otherwise
/// every cell re-evaluates them at the locally perceived wavelength.
enum ExtinctionEvaluator {
    Constant { sections: Vec<f64> },
    PerCell,
}

impl ExtinctionEvaluator {
    fn k_ext(&self, system: &MediumSystem, pp: &PhotonPacket, m: usize, s_mid: f64) -> f64 {
        match self {
            ExtinctionEvaluator::Constant { sections } => (0..system.num_media)
                .map(|h| system.number_density(m, h) * sections[h])
                .sum(),
            ExtinctionEvaluator::PerCell => {
                let lambda = system.perceived_wavelength_in_cell(pp, m, s_mid);
                (0..system.num_media)
                    .map(|h| system.component_opacity_ext(lambda, m, h, Some(pp)))
                    .sum()
            }
        }
    }
}

impl MediumSystem {
    fn extinction_evaluator(&self, pp: &PhotonPacket) -> ExtinctionEvaluator {
        if self.constant_section_mode() {
            ExtinctionEvaluator::Constant {
                sections: (0..self.num_media)
                    .map(|h| self.mix_ref(0, h).opacity_ext(pp.wavelength, 1.0, Some(pp)))
                    .collect(),
            }
        } else {
            ExtinctionEvaluator::PerCell
        }
    }

    /// Optical depth at `lambda` along the path from `position` in
    /// `direction`, restricted to the medium components with the given
    /// material type. Diagnostic variant: recomputes opacities directly and
    /// is not performance-sensitive.
    pub fn optical_depth_for_path(
        &self,
        position: Vec3,
        direction: Vec3,
        lambda: f64,
        material_type: MaterialType,
    ) -> f64 {
        let mut tau = 0.0;
        for (cell, ds) in self.grid.path_segments(position, direction) {
            if let Some(m) = cell {
                tau += ds * self.opacity_ext_for_type(lambda, m, material_type);
            }
        }
        tau
    }

    /// Computes the cumulative optical depth at the exit of every segment
    /// along the packet's path and stores both the geometry and the optical
    /// depths in the packet. Intended for forced-scattering life cycles.
    ///
    /// The geometric decomposition is stored before any optical-depth
    /// arithmetic runs; the separated sweeps are measurably faster than an
    /// interleaved loop. The optical depth at the entry of the first segment
    /// is zero by definition.
    pub fn set_optical_depths(&self, pp: &mut PhotonPacket) {
        pp.path.clear();
        for (cell, ds) in self.grid.path_segments(pp.position, pp.direction) {
            match cell {
                Some(m) => pp.path.add_segment(m, ds),
                None => pp.path.advance(ds),
            }
        }

        let evaluator = self.extinction_evaluator(pp);
        let mut tau = 0.0;
        for i in 0..pp.path.len() {
            let segment = pp.path.segments()[i];
            let s_mid = segment.s_exit - 0.5 * segment.length;
            tau += segment.length * evaluator.k_ext(self, pp, segment.cell, s_mid);
            pp.path.push_optical_depth(tau);
        }
    }

    /// Walks the packet's path accumulating optical depth until
    /// `tau_target` is reached, interpolates the interaction distance inside
    /// the final segment, stores the interaction point in the packet and
    /// returns true. Returns false, leaving the interaction point untouched,
    /// when the target is never reached: the packet escapes. Intended for
    /// life cycles without forced scattering, where skipping the remainder
    /// of the path is a substantial win in optically thick media.
    pub fn set_interaction_point(&self, pp: &mut PhotonPacket, tau_target: f64) -> bool {
        if !(tau_target >= 0.0) {
            return false;
        }
        let evaluator = self.extinction_evaluator(pp);
        let mut tau_entry = 0.0;
        let mut s_entry = 0.0;
        for (cell, ds) in self.grid.path_segments(pp.position, pp.direction) {
            let m = match cell {
                Some(m) => m,
                None => {
                    s_entry += ds;
                    continue;
                }
            };
            let s_mid = s_entry + 0.5 * ds;
            let tau_segment = ds * evaluator.k_ext(self, pp, m, s_mid);
            let tau_exit = tau_entry + tau_segment;
            if tau_exit >= tau_target {
                let s = if tau_segment > 0.0 {
                    s_entry + ds * (tau_target - tau_entry) / tau_segment
                } else {
                    s_entry
                };
                pp.set_interaction_point(m, s);
                return true;
            }
            tau_entry = tau_exit;
            s_entry += ds;
        }
        false
    }

    /// Optical depth along the packet's path up to the given distance: all
    /// segments whose entry boundary lies before `distance` contribute, any
    /// beyond are skipped. Intended for peel-off packets.
    ///
    /// Returns positive infinity as soon as the accumulated optical depth
    /// exceeds ln(L / L_min), with L the packet weight at the peel-off site
    /// and L_min the smallest representable positive double: beyond that
    /// point the observable contribution is numerically zero and the
    /// remaining sum is meaningless.
    pub fn optical_depth_to_distance(&self, pp: &PhotonPacket, distance: f64) -> f64 {
        let tau_max = if pp.luminosity > 0.0 {
            (pp.luminosity / SMALLEST_LUMINOSITY).ln()
        } else {
            0.0
        };
        let evaluator = self.extinction_evaluator(pp);
        let mut tau = 0.0;
        let mut s_entry = 0.0;
        for (cell, ds) in self.grid.path_segments(pp.position, pp.direction) {
            if s_entry >= distance {
                break;
            }
            if let Some(m) = cell {
                let s_mid = s_entry + 0.5 * ds;
                tau += ds * evaluator.k_ext(self, pp, m, s_mid);
                if tau > tau_max {
                    return f64::INFINITY;
                }
            }
            s_entry += ds;
        }
        tau
    }
}
