// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Spatial Grid
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Spatial-grid interface and a uniform Cartesian reference implementation.
//!
//! The grid tessellates the spatial domain into cells, and decomposes a
//! geometric ray into ordered (cell index, segment length) pairs. The
//! decomposition is exposed as an iterator so optical-depth integrators can
//! abandon a path early without enumerating the remaining segments.

use rand::{Rng, RngCore};

use radiant_types::error::{RadiantError, RadiantResult};
use radiant_types::geometry::Vec3;

pub trait SpatialGrid: Send + Sync {
    /// Symmetry dimension of the grid: 1, 2 or 3.
    fn dimension(&self) -> usize;

    fn num_cells(&self) -> usize;

    /// Volume of cell `m`.
    fn volume(&self, m: usize) -> f64;

    /// Geometric center of cell `m`.
    fn cell_center(&self, m: usize) -> Vec3;

    /// Cell containing `position`, or None outside the domain.
    fn cell_index(&self, position: Vec3) -> Option<usize>;

    /// Uniformly sampled position within cell `m`.
    fn random_position_in_cell(&self, rng: &mut dyn RngCore, m: usize) -> Vec3;

    /// Ordered (cell, segment length) pairs of the ray starting at
    /// `position` along `direction`, until the ray leaves the domain. A
    /// starting point outside the domain produces a leading `(None, gap)`
    /// element covering the stretch up to the domain entry, so cumulative
    /// distances are always measured from `position`.
    fn path_segments<'a>(
        &'a self,
        position: Vec3,
        direction: Vec3,
    ) -> Box<dyn Iterator<Item = (Option<usize>, f64)> + 'a>;
}

/// Uniform Cartesian grid over an axis-aligned box.
#[derive(Debug, Clone)]
pub struct CartesianGrid {
    min: Vec3,
    max: Vec3,
    nx: usize,
    ny: usize,
    nz: usize,
    dx: f64,
    dy: f64,
    dz: f64,
}

impl CartesianGrid {
    pub fn new(min: Vec3, max: Vec3, nx: usize, ny: usize, nz: usize) -> RadiantResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(RadiantError::ConfigError(
                "grid extent must be finite".to_string(),
            ));
        }
        if max.x <= min.x || max.y <= min.y || max.z <= min.z {
            return Err(RadiantError::ConfigError(format!(
                "grid extent must be positive along every axis, got {min:?}..{max:?}"
            )));
        }
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(RadiantError::ConfigError(format!(
                "grid resolution must be >= 1 along every axis, got {nx}x{ny}x{nz}"
            )));
        }
        Ok(CartesianGrid {
            min,
            max,
            nx,
            ny,
            nz,
            dx: (max.x - min.x) / nx as f64,
            dy: (max.y - min.y) / ny as f64,
            dz: (max.z - min.z) / nz as f64,
        })
    }

    fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        (iz * self.ny + iy) * self.nx + ix
    }

    fn indices(&self, m: usize) -> (usize, usize, usize) {
        let ix = m % self.nx;
        let iy = (m / self.nx) % self.ny;
        let iz = m / (self.nx * self.ny);
        (ix, iy, iz)
    }

    fn axis_index(&self, value: f64, origin: f64, spacing: f64, count: usize) -> usize {
        let raw = ((value - origin) / spacing).floor();
        (raw.max(0.0) as usize).min(count - 1)
    }
}

impl SpatialGrid for CartesianGrid {
    fn dimension(&self) -> usize {
        3
    }

    fn num_cells(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    fn volume(&self, _m: usize) -> f64 {
        self.dx * self.dy * self.dz
    }

    fn cell_center(&self, m: usize) -> Vec3 {
        let (ix, iy, iz) = self.indices(m);
        Vec3::new(
            self.min.x + (ix as f64 + 0.5) * self.dx,
            self.min.y + (iy as f64 + 0.5) * self.dy,
            self.min.z + (iz as f64 + 0.5) * self.dz,
        )
    }

    fn cell_index(&self, position: Vec3) -> Option<usize> {
        if position.x < self.min.x
            || position.x >= self.max.x
            || position.y < self.min.y
            || position.y >= self.max.y
            || position.z < self.min.z
            || position.z >= self.max.z
        {
            return None;
        }
        let ix = self.axis_index(position.x, self.min.x, self.dx, self.nx);
        let iy = self.axis_index(position.y, self.min.y, self.dy, self.ny);
        let iz = self.axis_index(position.z, self.min.z, self.dz, self.nz);
        Some(self.index(ix, iy, iz))
    }

    fn random_position_in_cell(&self, rng: &mut dyn RngCore, m: usize) -> Vec3 {
        let (ix, iy, iz) = self.indices(m);
        Vec3::new(
            self.min.x + (ix as f64 + rng.gen::<f64>()) * self.dx,
            self.min.y + (iy as f64 + rng.gen::<f64>()) * self.dy,
            self.min.z + (iz as f64 + rng.gen::<f64>()) * self.dz,
        )
    }

    fn path_segments<'a>(
        &'a self,
        position: Vec3,
        direction: Vec3,
    ) -> Box<dyn Iterator<Item = (Option<usize>, f64)> + 'a> {
        Box::new(CartesianPathIter::new(self, position, direction))
    }
}

/// Amanatides-Woo style voxel traversal over a Cartesian grid.
struct CartesianPathIter<'a> {
    grid: &'a CartesianGrid,
    walk: Option<Walk>,
    entry_gap: Option<f64>,
}

struct Walk {
    ix: isize,
    iy: isize,
    iz: isize,
    step: [isize; 3],
    t: f64,
    t_exit: f64,
    t_max: [f64; 3],
    t_delta: [f64; 3],
}

impl<'a> CartesianPathIter<'a> {
    fn new(grid: &'a CartesianGrid, position: Vec3, direction: Vec3) -> Self {
        let walk = direction
            .normalized()
            .and_then(|dir| Self::start_walk(grid, position, dir));
        let entry_gap = walk.as_ref().and_then(|w| (w.t > 0.0).then_some(w.t));
        CartesianPathIter {
            grid,
            walk,
            entry_gap,
        }
    }

    fn start_walk(grid: &CartesianGrid, position: Vec3, dir: Vec3) -> Option<Walk> {
        // Clip the ray against the domain box (slab method).
        let mut t_entry = 0.0f64;
        let mut t_exit = f64::INFINITY;
        let axes = [
            (position.x, dir.x, grid.min.x, grid.max.x),
            (position.y, dir.y, grid.min.y, grid.max.y),
            (position.z, dir.z, grid.min.z, grid.max.z),
        ];
        for &(p, d, lo, hi) in &axes {
            if d.abs() < f64::EPSILON {
                if p < lo || p >= hi {
                    return None;
                }
            } else {
                let t1 = (lo - p) / d;
                let t2 = (hi - p) / d;
                t_entry = t_entry.max(t1.min(t2));
                t_exit = t_exit.min(t1.max(t2));
            }
        }
        if !t_exit.is_finite() || t_exit <= t_entry {
            return None;
        }

        // Nudge just inside the entry face to pick the starting cell.
        let scale = (grid.max - grid.min).norm();
        let q = position + dir * (t_entry + 1e-12 * scale);
        let ix = grid.axis_index(q.x, grid.min.x, grid.dx, grid.nx) as isize;
        let iy = grid.axis_index(q.y, grid.min.y, grid.dy, grid.ny) as isize;
        let iz = grid.axis_index(q.z, grid.min.z, grid.dz, grid.nz) as isize;

        let step = [
            if dir.x > 0.0 { 1 } else { -1 },
            if dir.y > 0.0 { 1 } else { -1 },
            if dir.z > 0.0 { 1 } else { -1 },
        ];
        let boundary = |i: isize, s: isize, origin: f64, spacing: f64| {
            let edge = if s > 0 { i + 1 } else { i };
            origin + edge as f64 * spacing
        };
        let t_for = |p: f64, d: f64, b: f64| {
            if d.abs() < f64::EPSILON {
                f64::INFINITY
            } else {
                (b - p) / d
            }
        };
        let t_max = [
            t_for(
                position.x,
                dir.x,
                boundary(ix, step[0], grid.min.x, grid.dx),
            ),
            t_for(
                position.y,
                dir.y,
                boundary(iy, step[1], grid.min.y, grid.dy),
            ),
            t_for(
                position.z,
                dir.z,
                boundary(iz, step[2], grid.min.z, grid.dz),
            ),
        ];
        let t_delta = [
            if dir.x.abs() < f64::EPSILON {
                f64::INFINITY
            } else {
                grid.dx / dir.x.abs()
            },
            if dir.y.abs() < f64::EPSILON {
                f64::INFINITY
            } else {
                grid.dy / dir.y.abs()
            },
            if dir.z.abs() < f64::EPSILON {
                f64::INFINITY
            } else {
                grid.dz / dir.z.abs()
            },
        ];

        Some(Walk {
            ix,
            iy,
            iz,
            step,
            t: t_entry,
            t_exit,
            t_max,
            t_delta,
        })
    }
}

impl Iterator for CartesianPathIter<'_> {
    type Item = (Option<usize>, f64);

    fn next(&mut self) -> Option<(Option<usize>, f64)> {
        if let Some(gap) = self.entry_gap.take() {
            return Some((None, gap));
        }
        loop {
            let walk = self.walk.as_mut()?;
            if walk.t >= walk.t_exit {
                self.walk = None;
                return None;
            }
            // Cross the nearest cell boundary.
            let axis = if walk.t_max[0] <= walk.t_max[1] && walk.t_max[0] <= walk.t_max[2] {
                0
            } else if walk.t_max[1] <= walk.t_max[2] {
                1
            } else {
                2
            };
            let t_next = walk.t_max[axis].min(walk.t_exit);
            let ds = t_next - walk.t;
            let cell = self.grid.index(
                walk.ix as usize,
                walk.iy as usize,
                walk.iz as usize,
            );

            walk.t = t_next;
            walk.t_max[axis] += walk.t_delta[axis];
            match axis {
                0 => walk.ix += walk.step[0],
                1 => walk.iy += walk.step[1],
                _ => walk.iz += walk.step[2],
            }
            let inside = walk.ix >= 0
                && walk.iy >= 0
                && walk.iz >= 0
                && (walk.ix as usize) < self.grid.nx
                && (walk.iy as usize) < self.grid.ny
                && (walk.iz as usize) < self.grid.nz;
            if !inside || walk.t >= walk.t_exit {
                self.walk = None;
            }

            if ds > 0.0 {
                return Some((Some(cell), ds));
            }
            if self.walk.is_none() {
                return None;
            }
        }
    }
}
