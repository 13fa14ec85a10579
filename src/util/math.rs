//! Angle and rounding helpers shared by the mask builders.

/// Smallest cosine accepted for a tilt correction; steeper tilts are rejected.
pub(crate) const MIN_TILT_COS: f64 = 1e-6;

/// Converts degrees to radians.
pub(crate) fn deg_to_rad(angle_deg: f64) -> f64 {
    angle_deg.to_radians()
}

/// Returns the `1 / cos(angle)` factor by which a tilted band widens per column.
///
/// Returns `None` when the angle is not finite or the trace is (nearly)
/// perpendicular to the columns.
pub(crate) fn tilt_correction(angle_deg: f64) -> Option<f64> {
    if !angle_deg.is_finite() {
        return None;
    }
    let cos = deg_to_rad(angle_deg).cos();
    if cos <= MIN_TILT_COS {
        return None;
    }
    Some(1.0 / cos)
}

/// Clamps a signed index range onto `[0, len - 1]`.
///
/// Returns `None` when the clamped range is empty.
pub(crate) fn clamp_span(lo: i64, hi: i64, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let last = len as i64 - 1;
    let lo = lo.max(0);
    let hi = hi.min(last);
    if lo > hi {
        return None;
    }
    Some((lo as usize, hi as usize))
}
