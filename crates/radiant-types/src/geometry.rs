// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Cartesian 3-vectors for positions, propagation directions, bulk
//! velocities and magnetic fields.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3 { x, y, z }
    }

    pub fn dot(&self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn norm2(&self) -> f64 {
        self.dot(*self)
    }

    pub fn norm(&self) -> f64 {
        self.norm2().sqrt()
    }

    /// Unit vector along self, or None for a (near-)null vector.
    pub fn normalized(&self) -> Option<Vec3> {
        let n = self.norm();
        if n > 0.0 && n.is_finite() {
            Some(*self * (1.0 / n))
        } else {
            None
        }
    }

    pub fn is_null(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Vec3 {
        rhs * self
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Direction obtained by deflecting the unit vector `incoming` over the
/// polar scattering angle with cosine `cos_theta` and azimuth `phi`.
///
/// The azimuth reference is an arbitrary but deterministic vector
/// perpendicular to `incoming`; callers sampling `phi` uniformly do not
/// depend on its orientation.
pub fn deflected_direction(incoming: Vec3, cos_theta: f64, phi: f64) -> Vec3 {
    let cos_theta = cos_theta.clamp(-1.0, 1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    // Pick the coordinate axis least aligned with the incoming direction
    // to construct a stable perpendicular basis.
    let axis = if incoming.x.abs() <= incoming.y.abs() && incoming.x.abs() <= incoming.z.abs() {
        Vec3::new(1.0, 0.0, 0.0)
    } else if incoming.y.abs() <= incoming.z.abs() {
        Vec3::new(0.0, 1.0, 0.0)
    } else {
        Vec3::new(0.0, 0.0, 1.0)
    };
    let u = match incoming.cross(axis).normalized() {
        Some(u) => u,
        None => return incoming,
    };
    let v = incoming.cross(u);

    incoming * cos_theta + (u * phi.cos() + v * phi.sin()) * sin_theta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_algebra() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(-1.0, 0.5, 2.0);
        assert!((a.dot(b) - (-1.0 + 1.0 + 6.0)).abs() < 1e-15);
        let c = a.cross(b);
        assert!(c.dot(a).abs() < 1e-12, "cross product orthogonal to a");
        assert!(c.dot(b).abs() < 1e-12, "cross product orthogonal to b");
        assert!(((a + b) - Vec3::new(0.0, 2.5, 5.0)).norm() < 1e-15);
        assert!(((a - b) - Vec3::new(2.0, 1.5, 1.0)).norm() < 1e-15);
        assert!(((2.0 * a) - Vec3::new(2.0, 4.0, 6.0)).norm() < 1e-15);
    }

    #[test]
    fn test_normalized_unit_length() {
        let v = Vec3::new(3.0, -4.0, 12.0);
        let n = v.normalized().expect("nonzero vector normalizes");
        assert!((n.norm() - 1.0).abs() < 1e-14);
        assert!(Vec3::ZERO.normalized().is_none());
    }

    #[test]
    fn test_deflected_direction_preserves_unit_norm() {
        let k = Vec3::new(0.0, 0.0, 1.0);
        for &(ct, phi) in &[(1.0, 0.0), (-1.0, 1.0), (0.3, 2.5), (0.0, 4.0)] {
            let d = deflected_direction(k, ct, phi);
            assert!(
                (d.norm() - 1.0).abs() < 1e-12,
                "deflected direction must stay unit length, got {}",
                d.norm()
            );
            assert!(
                (d.dot(k) - ct).abs() < 1e-12,
                "polar angle must match requested cosine"
            );
        }
    }

    #[test]
    fn test_deflected_direction_forward_identity() {
        let k = Vec3::new(0.6, 0.0, 0.8);
        let d = deflected_direction(k, 1.0, 1.234);
        assert!((d - k).norm() < 1e-12);
    }
}
