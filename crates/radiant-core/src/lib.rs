// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Core Engine
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Medium and radiation-field engine for Monte Carlo radiative transfer.
//!
//! The photon life cycle drives packets through the [`MediumSystem`]:
//! opacity lookup and scattering simulation, optical-depth path integration
//! in forced-scattering, early-exit and peel-off variants, and thread-safe
//! radiation-field accumulation with cross-process synchronization at
//! segment boundaries.

pub mod comm;
pub mod grid;
pub mod materials;
pub mod medium;
pub mod medium_system;
pub mod optical_depth;
pub mod radiation_field;

pub use medium_system::MediumSystem;
