// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Root Finding
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Scalar bracketing root finder for the LTE energy-balance solve.

use radiant_types::error::{RadiantError, RadiantResult};

/// Finds a root of `f` on `[lo, hi]` by bisection. Requires a sign change
/// over the bracket. Terminates when the bracket width drops below `tol`;
/// exceeding `max_iter` is a numerical error.
pub fn bisect(
    mut f: impl FnMut(f64) -> f64,
    mut lo: f64,
    mut hi: f64,
    tol: f64,
    max_iter: usize,
) -> RadiantResult<f64> {
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return Err(RadiantError::Numerical(format!(
            "bisection requires a finite bracket with lo < hi, got [{lo}, {hi}]"
        )));
    }
    if !tol.is_finite() || tol <= 0.0 {
        return Err(RadiantError::Numerical(format!(
            "bisection requires finite tol > 0, got {tol}"
        )));
    }
    let f_lo = f(lo);
    let f_hi = f(hi);
    if !f_lo.is_finite() || !f_hi.is_finite() {
        return Err(RadiantError::Numerical(
            "bisection endpoint evaluation is non-finite".to_string(),
        ));
    }
    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(RadiantError::Numerical(format!(
            "bisection bracket [{lo}, {hi}] has no sign change"
        )));
    }

    let descending = f_lo > 0.0;
    for _ in 0..max_iter {
        let mid = 0.5 * (lo + hi);
        if hi - lo < tol {
            return Ok(mid);
        }
        let f_mid = f(mid);
        if !f_mid.is_finite() {
            return Err(RadiantError::Numerical(format!(
                "bisection evaluation at {mid} is non-finite"
            )));
        }
        if f_mid == 0.0 {
            return Ok(mid);
        }
        // Keep the sub-bracket that still straddles the root.
        if (f_mid > 0.0) == descending {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Err(RadiantError::Numerical(format!(
        "bisection failed to converge within {max_iter} iterations"
    )))
}
