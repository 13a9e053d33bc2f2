// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Radiation Field
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Radiation-field accumulation and derived queries.
//!
//! Three (cell x wavelength) tables are maintained: `rf1` collects the
//! primary-source contribution, `rf2` holds the stable secondary
//! contribution, and `rf2c` is the in-progress secondary accumulation
//! target. Outside an active secondary segment, `rf1 + rf2` is the
//! authoritative radiation field; `rf2c` only exists so secondary emission
//! spectra can be computed from the stable tables while new secondary
//! photons are concurrently shot into `rf2c`.
//!
//! Accumulation is lock-free: every bin is an atomic double updated with a
//! compare-exchange loop, so arbitrarily many worker threads can target the
//! same (m, ell) bin without lost updates. The synchronization barrier sums
//! the tables across cooperating processes once per segment.

use ndarray::Array1;
use std::sync::atomic::{AtomicU64, Ordering};

use radiant_math::wavelengths::WavelengthGrid;
use radiant_types::constants::FOUR_PI;
use radiant_types::error::RadiantResult;

use crate::materials::MaterialType;
use crate::medium_system::MediumSystem;

/// Dense (cell x wavelength) table of atomically updatable doubles.
pub(crate) struct AtomicTable {
    bits: Vec<AtomicU64>,
    num_bins: usize,
}

impl AtomicTable {
    fn new(num_cells: usize, num_bins: usize) -> Self {
        let mut bits = Vec::with_capacity(num_cells * num_bins);
        bits.resize_with(num_cells * num_bins, || AtomicU64::new(0));
        AtomicTable { bits, num_bins }
    }

    fn index(&self, m: usize, ell: usize) -> usize {
        m * self.num_bins + ell
    }

    /// Lock-free add: compare-exchange on the bit pattern until the update
    /// lands. Contention on a single bin stays correct, merely retrying.
    pub(crate) fn add(&self, m: usize, ell: usize, value: f64) {
        let slot = &self.bits[self.index(m, ell)];
        let mut current = slot.load(Ordering::Relaxed);
        loop {
            let updated = (f64::from_bits(current) + value).to_bits();
            match slot.compare_exchange_weak(current, updated, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    pub(crate) fn get(&self, m: usize, ell: usize) -> f64 {
        f64::from_bits(self.bits[self.index(m, ell)].load(Ordering::Relaxed))
    }

    fn clear(&self) {
        for slot in &self.bits {
            slot.store(0, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> Vec<f64> {
        self.bits
            .iter()
            .map(|slot| f64::from_bits(slot.load(Ordering::Relaxed)))
            .collect()
    }

    fn store_all(&self, data: &[f64]) {
        for (slot, &value) in self.bits.iter().zip(data.iter()) {
            slot.store(value.to_bits(), Ordering::Relaxed);
        }
    }
}

/// The three radiation-field tables plus the wavelength grid defining the
/// `ell` axis. Allocated once at setup, cleared at segment boundaries.
pub(crate) struct RadiationField {
    wlg: WavelengthGrid,
    rf1: AtomicTable,
    rf2: Vec<f64>,
    rf2c: AtomicTable,
}

impl RadiationField {
    pub(crate) fn new(wlg: WavelengthGrid, num_cells: usize) -> Self {
        let num_bins = wlg.num_bins();
        RadiationField {
            wlg,
            rf1: AtomicTable::new(num_cells, num_bins),
            rf2: vec![0.0; num_cells * num_bins],
            rf2c: AtomicTable::new(num_cells, num_bins),
        }
    }

    pub(crate) fn wavelength_grid(&self) -> &WavelengthGrid {
        &self.wlg
    }

    fn stable_secondary(&self, m: usize, ell: usize) -> f64 {
        self.rf2[m * self.wlg.num_bins() + ell]
    }
}

impl MediumSystem {
    /// Wavelength grid of the radiation-field tables, when the simulation
    /// mode records the radiation field.
    pub fn radiation_wavelength_grid(&self) -> Option<&WavelengthGrid> {
        self.rf.as_ref().map(|rf| rf.wavelength_grid())
    }

    /// Zeroes radiation-field tables before a packet segment is launched.
    /// With `primary` set, both the primary table and the stable secondary
    /// table are cleared, so their sum is usable even before any secondary
    /// segment ran. Otherwise only the in-progress secondary target is
    /// cleared and the stable tables remain available for concurrent
    /// queries.
    pub fn clear_radiation_field(&mut self, primary: bool) {
        let Some(rf) = self.rf.as_mut() else {
            return;
        };
        if primary {
            rf.rf1.clear();
            rf.rf2.iter_mut().for_each(|v| *v = 0.0);
        } else {
            rf.rf2c.clear();
        }
    }

    /// Adds `lds` (the packet luminosity times the segment length) into the
    /// radiation-field bin for cell `m` and wavelength bin `ell`, into the
    /// primary table or the in-progress secondary target. Thread-safe for
    /// arbitrary concurrent callers, including on the same bin. Indices are
    /// caller-guaranteed to be in range.
    pub fn store_radiation_field(&self, primary: bool, m: usize, ell: usize, lds: f64) {
        let Some(rf) = self.rf.as_ref() else {
            return;
        };
        if primary {
            rf.rf1.add(m, ell, lds);
        } else {
            rf.rf2c.add(m, ell, lds);
        }
    }

    /// Serial barrier: sums the radiation field over all cooperating
    /// processes after a segment completes and before any query. For the
    /// secondary case the reduced in-progress table is copied into the
    /// stable secondary table.
    pub fn communicate_radiation_field(&mut self, primary: bool) -> RadiantResult<()> {
        let Some(rf) = self.rf.as_mut() else {
            return Ok(());
        };
        if primary {
            let mut data = rf.rf1.snapshot();
            self.comm.sum_all(&mut data)?;
            rf.rf1.store_all(&data);
        } else {
            let mut data = rf.rf2c.snapshot();
            self.comm.sum_all(&mut data)?;
            rf.rf2c.store_all(&data);
            rf.rf2.copy_from_slice(&data);
        }
        log::debug!(
            "radiation field synchronized ({} table) across {} processes",
            if primary { "primary" } else { "secondary" },
            self.comm.size()
        );
        Ok(())
    }

    /// Sum of the primary and stable secondary tables at (m, ell); absent
    /// tables read as zero.
    pub(crate) fn radiation_field(&self, m: usize, ell: usize) -> f64 {
        match self.rf.as_ref() {
            Some(rf) => rf.rf1.get(m, ell) + rf.stable_secondary(m, ell),
            None => 0.0,
        }
    }

    /// Mean radiation-field intensity J_lambda per wavelength bin in cell
    /// `m`:
    ///
    ///   J_ell = (L ds)_ell / (4 pi V_m (d lambda)_ell)
    ///
    /// Valid only after the accumulating segment has been synchronized with
    /// [`MediumSystem::communicate_radiation_field`].
    pub fn mean_intensity(&self, m: usize) -> Array1<f64> {
        let Some(rf) = self.rf.as_ref() else {
            return Array1::zeros(0);
        };
        let volume = self.volume(m);
        let wlg = rf.wavelength_grid();
        Array1::from_shape_fn(wlg.num_bins(), |ell| {
            self.radiation_field(m, ell) / (FOUR_PI * volume * wlg.width(ell))
        })
    }

    /// Bolometric luminosity absorbed by dust in cell `m`, from the
    /// synchronized primary plus stable secondary tables.
    pub fn absorbed_dust_luminosity(&self, m: usize) -> f64 {
        let Some(rf) = self.rf.as_ref() else {
            return 0.0;
        };
        let wlg = rf.wavelength_grid();
        (0..wlg.num_bins())
            .map(|ell| {
                self.opacity_abs_for_type(wlg.wavelength(ell), m, MaterialType::Dust)
                    * self.radiation_field(m, ell)
            })
            .sum()
    }

    /// Bolometric luminosity absorbed by dust over the whole domain, from
    /// the primary table alone or the stable secondary table alone.
    pub fn total_absorbed_dust_luminosity(&self, primary: bool) -> f64 {
        let Some(rf) = self.rf.as_ref() else {
            return 0.0;
        };
        let wlg = rf.wavelength_grid();
        let mut total = 0.0;
        for m in 0..self.num_cells {
            for ell in 0..wlg.num_bins() {
                let partial = if primary {
                    rf.rf1.get(m, ell)
                } else {
                    rf.stable_secondary(m, ell)
                };
                total +=
                    self.opacity_abs_for_type(wlg.wavelength(ell), m, MaterialType::Dust) * partial;
            }
        }
        total
    }

    /// Indicative dust temperature of cell `m`: the LTE equilibrium
    /// temperature of each dust component embedded in the cell's radiation
    /// field, averaged over the dust components weighted by mass density.
    /// Returns zero when the cell holds no dust. This is an indicative
    /// quantity, not a physical temperature.
    pub fn indicative_dust_temperature(&self, m: usize) -> RadiantResult<f64> {
        let Some(rf) = self.rf.as_ref() else {
            return Ok(0.0);
        };
        let mean_intensity = self.mean_intensity(m);
        let field = mean_intensity
            .as_slice()
            .map(|s| s.to_vec())
            .unwrap_or_else(|| mean_intensity.to_vec());

        let mut weighted = 0.0;
        let mut total_rho = 0.0;
        for h in 0..self.num_media {
            if !self.is_dust(h) {
                continue;
            }
            let rho = self.mass_density(m, h);
            if rho <= 0.0 {
                continue;
            }
            let t = self
                .mix_ref(m, h)
                .equilibrium_temperature(rf.wavelength_grid(), &field)?;
            weighted += rho * t;
            total_rho += rho;
        }
        if total_rho > 0.0 {
            Ok(weighted / total_rho)
        } else {
            Ok(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{LocalGroup, SerialComm};
    use crate::grid::CartesianGrid;
    use crate::grid::SpatialGrid;
    use crate::materials::DustMix;
    use crate::medium::{DensityProfile, GeometricMedium, Medium};
    use radiant_math::planck::planck_lambda;
    use radiant_types::config::{MediumSystemOptions, WavelengthGridConfig};
    use radiant_types::geometry::Vec3;
    use std::sync::Arc;

    fn unit_cell_grid() -> Arc<dyn SpatialGrid> {
        Arc::new(
            CartesianGrid::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0), 1, 1, 1)
                .expect("valid grid"),
        )
    }

    fn dust_medium(density: f64) -> Arc<dyn Medium> {
        let mix = DustMix::new(1e-12, 5.5e-7, 0.0, 0.5, 0.0, 3e-17).expect("mix");
        Arc::new(
            GeometricMedium::new(Arc::new(mix), DensityProfile::Uniform { density })
                .expect("medium"),
        )
    }

    fn tracking_options(min: f64, max: f64, bins: usize) -> MediumSystemOptions {
        MediumSystemOptions {
            store_radiation_field: true,
            wavelength_grid: Some(WavelengthGridConfig {
                min_wavelength: min,
                max_wavelength: max,
                num_bins: bins,
            }),
            ..MediumSystemOptions::default()
        }
    }

    fn single_bin_system() -> MediumSystem {
        MediumSystem::new(
            unit_cell_grid(),
            vec![dust_medium(1e6)],
            tracking_options(0.5, 1.5, 1),
            Arc::new(SerialComm),
        )
        .expect("setup")
    }

    #[test]
    fn test_mean_intensity_normalization() {
        // One cell of volume 1, one bin of width 1: storing 4*pi yields J=1.
        let mut system = single_bin_system();
        system.clear_radiation_field(true);
        system.store_radiation_field(true, 0, 0, FOUR_PI);
        system.communicate_radiation_field(true).expect("sync");
        let j = system.mean_intensity(0);
        assert_eq!(j.len(), 1);
        assert!(
            (j[0] - 1.0).abs() < 1e-9,
            "expected unit mean intensity, got {}",
            j[0]
        );
    }

    #[test]
    fn test_clear_is_idempotent_and_scoped() {
        let mut system = single_bin_system();
        system.store_radiation_field(true, 0, 0, 2.0);
        system.store_radiation_field(false, 0, 0, 3.0);
        system.communicate_radiation_field(true).expect("sync");
        system.communicate_radiation_field(false).expect("sync");
        assert!((system.radiation_field(0, 0) - 5.0).abs() < 1e-12);

        // Clearing the in-progress secondary target leaves rf1 + rf2 intact.
        system.clear_radiation_field(false);
        assert!((system.radiation_field(0, 0) - 5.0).abs() < 1e-12);

        // Clearing primary zeroes both stable tables; twice stays zero.
        system.clear_radiation_field(true);
        system.clear_radiation_field(true);
        assert_eq!(system.radiation_field(0, 0), 0.0);
        let j = system.mean_intensity(0);
        assert_eq!(j[0], 0.0);
    }

    #[test]
    fn test_secondary_tables_stabilize_on_communicate() {
        let mut system = single_bin_system();
        system.store_radiation_field(false, 0, 0, 7.0);
        // Before the barrier the stable secondary table still reads zero.
        assert_eq!(system.radiation_field(0, 0), 0.0);
        system.communicate_radiation_field(false).expect("sync");
        assert!((system.radiation_field(0, 0) - 7.0).abs() < 1e-12);

        // A new in-progress segment accumulates without disturbing rf2.
        system.clear_radiation_field(false);
        system.store_radiation_field(false, 0, 0, 100.0);
        assert!((system.radiation_field(0, 0) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_concurrent_store_no_lost_updates() {
        let system = Arc::new(single_bin_system());
        let threads = 8;
        let per_thread = 10_000;
        let mut handles = Vec::new();
        for _ in 0..threads {
            let system = Arc::clone(&system);
            handles.push(std::thread::spawn(move || {
                for _ in 0..per_thread {
                    system.store_radiation_field(true, 0, 0, 1.0);
                }
            }));
        }
        for handle in handles {
            handle.join().expect("thread");
        }
        let expected = (threads * per_thread) as f64;
        let stored = match system.rf.as_ref() {
            Some(rf) => rf.rf1.get(0, 0),
            None => 0.0,
        };
        assert_eq!(stored, expected, "atomic adds must not lose updates");
    }

    #[test]
    fn test_absorbed_dust_luminosity() {
        let mut system = single_bin_system();
        system.clear_radiation_field(true);
        system.store_radiation_field(true, 0, 0, 2.0);
        system.communicate_radiation_field(true).expect("sync");

        let wlg = system.radiation_wavelength_grid().expect("grid");
        let k_abs = system.opacity_abs_for_type(wlg.wavelength(0), 0, MaterialType::Dust);
        let expected = k_abs * 2.0;
        assert!((system.absorbed_dust_luminosity(0) - expected).abs() < 1e-15);
        assert!((system.total_absorbed_dust_luminosity(true) - expected).abs() < 1e-15);
        assert_eq!(system.total_absorbed_dust_luminosity(false), 0.0);
    }

    #[test]
    fn test_indicative_dust_temperature_recovers_blackbody() {
        // Fill the radiation field with a 200 K blackbody; a gray dust mix
        // must equilibrate at the same temperature.
        let mut system = MediumSystem::new(
            unit_cell_grid(),
            vec![dust_medium(1e6)],
            tracking_options(1e-7, 1e-3, 200),
            Arc::new(SerialComm),
        )
        .expect("setup");
        let t_source = 200.0;
        system.clear_radiation_field(true);
        {
            let wlg = system.radiation_wavelength_grid().expect("grid");
            let volume = system.volume(0);
            let values: Vec<(usize, f64)> = (0..wlg.num_bins())
                .map(|ell| {
                    let j = planck_lambda(wlg.wavelength(ell), t_source);
                    (ell, j * FOUR_PI * volume * wlg.width(ell))
                })
                .collect();
            for (ell, lds) in values {
                system.store_radiation_field(true, 0, ell, lds);
            }
        }
        system.communicate_radiation_field(true).expect("sync");
        let t = system.indicative_dust_temperature(0).expect("solve");
        assert!(
            (t - t_source).abs() < 1.0,
            "expected ~{t_source} K, got {t} K"
        );
    }

    #[test]
    fn test_indicative_dust_temperature_no_dust_is_zero() {
        let mut system = MediumSystem::new(
            unit_cell_grid(),
            vec![Arc::new(
                GeometricMedium::new(
                    Arc::new(crate::materials::ElectronMix),
                    DensityProfile::Uniform { density: 1e6 },
                )
                .expect("medium"),
            )],
            tracking_options(0.5, 1.5, 1),
            Arc::new(SerialComm),
        )
        .expect("setup");
        system.store_radiation_field(true, 0, 0, 5.0);
        system.communicate_radiation_field(true).expect("sync");
        assert_eq!(system.indicative_dust_temperature(0).expect("solve"), 0.0);
    }

    #[test]
    fn test_untracked_mode_reads_zero() {
        let mut system = MediumSystem::new(
            unit_cell_grid(),
            vec![dust_medium(1e6)],
            MediumSystemOptions::default(),
            Arc::new(SerialComm),
        )
        .expect("setup");
        system.store_radiation_field(true, 0, 0, 5.0);
        system.communicate_radiation_field(true).expect("sync");
        assert_eq!(system.radiation_field(0, 0), 0.0);
        assert_eq!(system.mean_intensity(0).len(), 0);
        assert_eq!(system.absorbed_dust_luminosity(0), 0.0);
    }

    #[test]
    fn test_communicate_sums_across_processes() {
        // Two ranks store different contributions into the same bin; after
        // the barrier both replicas hold the sum.
        let group = LocalGroup::new(2).expect("group");
        let mut handles = Vec::new();
        for rank in 0..2 {
            let comm = group.comm(rank).expect("comm");
            handles.push(std::thread::spawn(move || {
                let mut system = MediumSystem::new(
                    Arc::new(
                        CartesianGrid::new(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0), 2, 1, 1)
                            .expect("grid"),
                    ),
                    vec![dust_medium(1e6)],
                    tracking_options(0.5, 1.5, 1),
                    Arc::new(comm),
                )
                .expect("setup");
                system.store_radiation_field(true, 0, 0, (rank + 1) as f64);
                system.communicate_radiation_field(true).expect("sync");
                system.radiation_field(0, 0)
            }));
        }
        for handle in handles {
            let value = handle.join().expect("thread");
            assert!((value - 3.0).abs() < 1e-12, "1 + 2 across ranks");
        }
    }
}
