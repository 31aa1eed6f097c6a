//! Math Module
//!
//! Scalar helpers shared by the animation, physics and effect subsystems, and
//! the 4x4 matrices used for model layout and hit testing.
//!
//! - [`easing_sine`]: raised-cosine fade curve used by every fade envelope
//! - [`cardano_algorithm_for_bezier`]: closed-form solve of the Bezier time polynomial
//! - [`direction_to_radian`] / [`radian_to_direction`]: 2D angle helpers for physics
//! - [`Matrix44`], [`ModelMatrix`]: layout transforms

pub mod matrix;

pub use matrix::{Matrix44, ModelMatrix};

use std::f32::consts::PI;

use glam::Vec2;

/// Tolerance used by the root solvers.
pub const EPSILON: f32 = 0.000_01;

/// Clamps `value` into `[min, max]`.
#[inline]
#[must_use]
pub fn range_f32(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Raised-cosine ease: `0.5 - 0.5·cos(π·x)` on `[0, 1]`, clamped outside.
#[inline]
#[must_use]
pub fn easing_sine(value: f32) -> f32 {
    if value < 0.0 {
        return 0.0;
    }
    if value > 1.0 {
        return 1.0;
    }
    0.5 - 0.5 * (value * PI).cos()
}

#[inline]
#[must_use]
pub fn degrees_to_radian(degrees: f32) -> f32 {
    degrees / 180.0 * PI
}

/// Signed angle from `from` to `to`, wrapped into `[-π, π]`.
#[must_use]
pub fn direction_to_radian(from: Vec2, to: Vec2) -> f32 {
    let q1 = to.y.atan2(to.x);
    let q2 = from.y.atan2(from.x);

    let mut ret = q1 - q2;
    while ret < -PI {
        ret += PI * 2.0;
    }
    while ret > PI {
        ret -= PI * 2.0;
    }
    ret
}

/// Unit direction for an angle measured from +Y towards +X.
#[inline]
#[must_use]
pub fn radian_to_direction(angle: f32) -> Vec2 {
    Vec2::new(angle.sin(), angle.cos())
}

/// Normalizes `v` in place unless it is (near) zero length.
#[inline]
pub fn normalize_in_place(v: &mut Vec2) {
    let length = v.length();
    if length > f32::EPSILON {
        *v /= length;
    }
}

/// Cube root that is defined for negative input.
#[must_use]
pub fn cbrt(x: f32) -> f32 {
    if x == 0.0 {
        return 0.0;
    }
    let ret = x.abs().powf(1.0 / 3.0);
    if x < 0.0 { -ret } else { ret }
}

/// Root of `a·x² + b·x + c`, degrading to the linear case when `a ≈ 0`.
#[must_use]
pub fn quadratic_equation(a: f32, b: f32, c: f32) -> f32 {
    if a.abs() < EPSILON {
        if b.abs() < EPSILON {
            return -c;
        }
        return -c / b;
    }
    -(b + (b * b - 4.0 * a * c).sqrt()) / (2.0 * a)
}

/// Solves `a·t³ + b·t² + c·t + d = 0` for the Bezier parameter `t ∈ [0, 1]`.
///
/// Among multiple real roots the first one within 0.51 of 0.5 wins; the
/// branches are tried in a fixed order so results match authored assets.
#[must_use]
pub fn cardano_algorithm_for_bezier(a: f32, b: f32, c: f32, d: f32) -> f32 {
    if a.abs() < EPSILON {
        return range_f32(quadratic_equation(b, c, d), 0.0, 1.0);
    }

    let ba = b / a;
    let ca = c / a;
    let da = d / a;

    let p = (3.0 * ca - ba * ba) / 3.0;
    let p3 = p / 3.0;
    let q = (2.0 * ba * ba * ba - 9.0 * ba * ca + 27.0 * da) / 27.0;
    let q2 = q / 2.0;
    let discriminant = q2 * q2 + p3 * p3 * p3;

    let center = 0.5;
    let threshold = center + 0.01;

    if discriminant < 0.0 {
        let mp3 = -p / 3.0;
        let mp33 = mp3 * mp3 * mp3;
        let r = mp33.sqrt();
        let t = -q / (2.0 * r);
        let cosphi = range_f32(t, -1.0, 1.0);
        let phi = cosphi.acos();
        let crtr = cbrt(r);
        let t1 = 2.0 * crtr;

        let root1 = t1 * (phi / 3.0).cos() - ba / 3.0;
        if (root1 - center).abs() < threshold {
            return range_f32(root1, 0.0, 1.0);
        }

        let root2 = t1 * ((phi + 2.0 * PI) / 3.0).cos() - ba / 3.0;
        if (root2 - center).abs() < threshold {
            return range_f32(root2, 0.0, 1.0);
        }

        let root3 = t1 * ((phi + 4.0 * PI) / 3.0).cos() - ba / 3.0;
        return range_f32(root3, 0.0, 1.0);
    }

    if discriminant == 0.0 {
        let u1 = if q2 < 0.0 { cbrt(-q2) } else { -cbrt(q2) };

        let root1 = 2.0 * u1 - ba / 3.0;
        if (root1 - center).abs() < threshold {
            return range_f32(root1, 0.0, 1.0);
        }

        let root2 = -u1 - ba / 3.0;
        return range_f32(root2, 0.0, 1.0);
    }

    let sd = discriminant.sqrt();
    let u1 = cbrt(sd - q2);
    let v1 = cbrt(sd + q2);
    let root1 = u1 - v1 - ba / 3.0;
    range_f32(root1, 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn easing_sine_endpoints_and_clamp() {
        assert_eq!(easing_sine(-1.0), 0.0);
        assert_eq!(easing_sine(0.0), 0.0);
        assert!(approx(easing_sine(0.5), 0.5));
        assert!(approx(easing_sine(1.0), 1.0));
        assert_eq!(easing_sine(2.0), 1.0);
    }

    #[test]
    fn cbrt_handles_sign() {
        assert!(approx(cbrt(27.0), 3.0));
        assert!(approx(cbrt(-8.0), -2.0));
        assert_eq!(cbrt(0.0), 0.0);
    }

    #[test]
    fn cardano_linear_time_curve() {
        // x(t) = t  =>  a = 0, b = 0, c = 1, d = -x
        assert!(approx(cardano_algorithm_for_bezier(0.0, 0.0, 1.0, -0.25), 0.25));
    }

    #[test]
    fn cardano_solves_cubic_in_unit_range() {
        // (t - 0.3)(t^2 + 1) = t^3 - 0.3t^2 + t - 0.3
        let t = cardano_algorithm_for_bezier(1.0, -0.3, 1.0, -0.3);
        assert!(approx(t, 0.3), "got {t}");
    }

    #[test]
    fn cardano_three_real_roots_prefers_center() {
        // (t + 1)(t - 0.5)(t - 3) = t^3 - 2.5t^2 - 2t + 1.5
        let t = cardano_algorithm_for_bezier(1.0, -2.5, -2.0, 1.5);
        assert!(approx(t, 0.5), "got {t}");
    }

    #[test]
    fn direction_to_radian_wraps() {
        let from = Vec2::new(1.0, 0.0);
        let to = Vec2::new(0.0, 1.0);
        assert!(approx(direction_to_radian(from, to), PI / 2.0));
        assert!(approx(direction_to_radian(to, from), -PI / 2.0));

        let a = Vec2::new(-1.0, 0.01);
        let b = Vec2::new(-1.0, -0.01);
        assert!(direction_to_radian(a, b).abs() < 0.1);
    }

    #[test]
    fn radian_to_direction_is_unit() {
        let d = radian_to_direction(0.0);
        assert!(approx(d.x, 0.0) && approx(d.y, 1.0));
        assert!(approx(radian_to_direction(1.2).length(), 1.0));
    }
}
