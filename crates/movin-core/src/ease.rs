//! Cubic-bezier easing.
//!
//! A segment's ease curve runs from (0,0) to (1,1), shaped by the previous
//! keyframe's out tangent and the next keyframe's in tangent. Evaluation
//! inverts the x component of the curve in closed form and feeds the root
//! through the y component.

use glam::Vec2;
use std::f32::consts::PI;

/// Identity ease. Both control points sit on the diagonal, so y(x) = x.
pub const LINEAR: [Vec2; 2] = [Vec2::new(1.0, 1.0), Vec2::new(0.0, 0.0)];
pub const STRONG_IN_OUT: [Vec2; 2] = [Vec2::new(0.7, 0.0), Vec2::new(0.3, 1.0)];
pub const STRONG_OUT: [Vec2; 2] = [Vec2::new(0.167, 0.167), Vec2::new(0.3, 1.0)];

/// Maps an elapsed-time fraction `t` through the ease curve shaped by the two
/// tangent control points. Returns `None` when the x polynomial has no root
/// in [0,1] (degenerate tangents in real export data); callers treat that as
/// "no visible motion yet" and freeze at the segment's start value.
pub fn cubic_bezier(out_tangent: Vec2, in_tangent: Vec2, t: f32) -> Option<f32> {
    if t <= 0.0 {
        return Some(0.0);
    }
    if t >= 1.0 {
        return Some(1.0);
    }

    let p1 = out_tangent;
    let p2 = in_tangent;

    // x(v) = a v^3 + b v^2 + c v with p0 = (0,0), p3 = (1,1); solve x(v) = t.
    let a = 3.0 * p1.x - 3.0 * p2.x + 1.0;
    let b = -6.0 * p1.x + 3.0 * p2.x;
    let c = 3.0 * p1.x;
    let d = -t;

    let v = solve_cubic(a, b, c, d)?;
    let u = 1.0 - v;
    Some(3.0 * v * u * u * p1.y + 3.0 * v * v * u * p2.y + v * v * v)
}

/// Smallest-effort Cardano solver returning the unique root in [0,1], if any.
fn solve_cubic(a: f32, b: f32, c: f32, d: f32) -> Option<f32> {
    if a == 0.0 {
        return solve_quadratic(b, c, d);
    }
    if d == 0.0 {
        return Some(0.0);
    }

    let b = b / a;
    let c = c / a;
    let d = d / a;
    let q = (3.0 * c - b * b) / 9.0;
    let r = (-27.0 * d + b * (9.0 * c - 2.0 * b * b)) / 54.0;
    let disc = q * q * q + r * r;
    let term1 = b / 3.0;

    if disc > 0.0 {
        // One real root.
        let sq = disc.sqrt();
        let s = signed_cbrt(r + sq);
        let t = signed_cbrt(r - sq);
        in_unit(-term1 + s + t)
    } else if disc == 0.0 {
        // Repeated roots.
        let r13 = signed_cbrt(r);
        in_unit(-term1 + 2.0 * r13).or_else(|| in_unit(-(r13 + term1)))
    } else {
        // Three real roots, trigonometric form.
        let q = -q;
        let theta = (r / (q * q * q).sqrt()).acos();
        let r13 = 2.0 * q.sqrt();
        in_unit(-term1 + r13 * (theta / 3.0).cos())
            .or_else(|| in_unit(-term1 + r13 * ((theta + 2.0 * PI) / 3.0).cos()))
            .or_else(|| in_unit(-term1 + r13 * ((theta + 4.0 * PI) / 3.0).cos()))
    }
}

fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<f32> {
    if a == 0.0 {
        // Degenerate to linear.
        if b == 0.0 {
            return None;
        }
        return in_unit(-c / b);
    }

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    in_unit((-b + sq) / (2.0 * a)).or_else(|| in_unit((-b - sq) / (2.0 * a)))
}

fn signed_cbrt(v: f32) -> f32 {
    if v < 0.0 {
        -(-v).cbrt()
    } else {
        v.cbrt()
    }
}

fn in_unit(v: f32) -> Option<f32> {
    // NaN fails the range check, so degenerate arithmetic ends up as None.
    if (0.0..=1.0).contains(&v) {
        Some(v)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_exact() {
        for ease in [LINEAR, STRONG_IN_OUT, STRONG_OUT] {
            assert_eq!(cubic_bezier(ease[0], ease[1], 0.0), Some(0.0));
            assert_eq!(cubic_bezier(ease[0], ease[1], 1.0), Some(1.0));
            assert_eq!(cubic_bezier(ease[0], ease[1], -0.5), Some(0.0));
            assert_eq!(cubic_bezier(ease[0], ease[1], 1.5), Some(1.0));
        }
    }

    #[test]
    fn linear_preset_is_identity() {
        for i in 1..10 {
            let t = i as f32 / 10.0;
            let v = cubic_bezier(LINEAR[0], LINEAR[1], t).unwrap();
            assert!((v - t).abs() < 1e-3, "t={t} v={v}");
        }
    }

    #[test]
    fn diagonal_thirds_tangents_are_identity() {
        // p1 = (1/3,1/3), p2 = (2/3,2/3) collapses the cubic to a linear
        // x polynomial; the quadratic/linear fallback must still solve it.
        let p1 = Vec2::new(1.0 / 3.0, 1.0 / 3.0);
        let p2 = Vec2::new(2.0 / 3.0, 2.0 / 3.0);
        let v = cubic_bezier(p1, p2, 0.5).unwrap();
        assert!((v - 0.5).abs() < 1e-4);
    }

    #[test]
    fn non_finite_tangents_have_no_root() {
        // Garbage tangents in a document must surface as None, not NaN.
        let bad = Vec2::new(f32::NAN, 0.0);
        assert_eq!(cubic_bezier(bad, Vec2::new(1.0, 1.0), 0.5), None);
        assert_eq!(cubic_bezier(Vec2::new(0.5, 0.0), bad, 0.5), None);
        // Boundary short-circuits still hold even with bad tangents.
        assert_eq!(cubic_bezier(bad, bad, 0.0), Some(0.0));
        assert_eq!(cubic_bezier(bad, bad, 1.0), Some(1.0));
    }

    #[test]
    fn strong_in_out_is_monotonic() {
        let mut prev = 0.0;
        for i in 0..=20 {
            let t = i as f32 / 20.0;
            let v = cubic_bezier(STRONG_IN_OUT[0], STRONG_IN_OUT[1], t).unwrap();
            assert!(v >= prev - 1e-5, "t={t} v={v} prev={prev}");
            prev = v;
        }
        assert!(prev > 0.999);
    }

    #[test]
    fn ease_out_front_loads_motion() {
        let v = cubic_bezier(STRONG_OUT[0], STRONG_OUT[1], 0.5).unwrap();
        assert!(v > 0.6, "expected front-loaded motion, got {v}");
    }
}
