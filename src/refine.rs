//! Subpixel peak placement from a 3x3 score neighbourhood.

/// Vertex offset of the parabola through `(-1, left)`, `(0, mid)`, `(1, right)`.
///
/// `None` unless the parabola opens downward and its vertex lies within one
/// sample of the middle.
pub(crate) fn parabola_vertex(left: f64, mid: f64, right: f64) -> Option<f64> {
    let curvature = left - 2.0 * mid + right;
    if !curvature.is_finite() || curvature > -1e-12 {
        return None;
    }
    let offset = 0.5 * (left - right) / curvature;
    (offset.abs() <= 1.0).then_some(offset)
}

/// Refines the integer placement `(x, y)` given the scores around it.
///
/// `s[row][col]` holds the score at `(x + col - 1, y + row - 1)`. Each axis is
/// fitted independently; an axis without a usable fit keeps its integer value.
pub(crate) fn refine_subpixel_2d(x: usize, y: usize, s: [[f64; 3]; 3]) -> (f64, f64) {
    let dx = parabola_vertex(s[1][0], s[1][1], s[1][2]).unwrap_or(0.0);
    let dy = parabola_vertex(s[0][1], s[1][1], s[2][1]).unwrap_or(0.0);
    (x as f64 + dx, y as f64 + dy)
}
