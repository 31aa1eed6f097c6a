//! Keyframe curves and segment evaluation.
//!
//! A motion stores every curve's keyframes in one shared point pool. Each
//! segment spans from its `base_point_index` to the next one or three points,
//! depending on its type, and consecutive segments share their boundary point.

use crate::math::cardano_algorithm_for_bezier;
use crate::utils::interner::CubismId;

/// What a curve drives. The declaration order is the composition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CurveTarget {
    /// Model-wide effects (`EyeBlink`, `LipSync`, `Opacity`).
    Model,
    Parameter,
    PartOpacity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentType {
    Linear,
    Bezier,
    Stepped,
    InverseStepped,
}

impl SegmentType {
    /// Decodes the numeric code used in motion3.json.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(SegmentType::Linear),
            1 => Some(SegmentType::Bezier),
            2 => Some(SegmentType::Stepped),
            3 => Some(SegmentType::InverseStepped),
            _ => None,
        }
    }

    /// Points consumed after the shared start point.
    #[must_use]
    pub fn point_count(self) -> usize {
        match self {
            SegmentType::Bezier => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionPoint {
    pub time: f32,
    pub value: f32,
}

impl MotionPoint {
    #[must_use]
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }

    #[inline]
    fn lerp(self, other: MotionPoint, t: f32) -> MotionPoint {
        MotionPoint {
            time: self.time + (other.time - self.time) * t,
            value: self.value + (other.value - self.value) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSegment {
    pub base_point_index: usize,
    pub segment_type: SegmentType,
}

impl MotionSegment {
    /// Index of the segment's final point.
    #[inline]
    #[must_use]
    pub fn end_point_index(&self) -> usize {
        self.base_point_index + self.segment_type.point_count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionCurve {
    pub target: CurveTarget,
    pub id: CubismId,
    /// First keyframe of the curve in the shared point pool.
    pub base_point_index: usize,
    pub base_segment_index: usize,
    pub segment_count: usize,
    /// Per-curve fade-in seconds; negative when the motion-wide fade applies.
    pub fade_in_time: f32,
    /// Per-curve fade-out seconds; negative when the motion-wide fade applies.
    pub fade_out_time: f32,
}

impl MotionCurve {
    #[inline]
    #[must_use]
    pub fn has_own_fade(&self) -> bool {
        self.fade_in_time >= 0.0 || self.fade_out_time >= 0.0
    }
}

// ============================================================================
// Segment evaluators
// ============================================================================

#[must_use]
pub fn linear_evaluate(points: &[MotionPoint], time: f32) -> f32 {
    let span = points[1].time - points[0].time;
    let t = if span > 0.0 { (time - points[0].time) / span } else { 0.0 };
    let t = t.max(0.0);
    points[0].value + (points[1].value - points[0].value) * t
}

/// Bezier with time mapped proportionally onto the curve parameter.
#[must_use]
pub fn bezier_evaluate(points: &[MotionPoint], time: f32) -> f32 {
    let span = points[3].time - points[0].time;
    let t = if span > 0.0 { (time - points[0].time) / span } else { 0.0 };
    de_casteljau(points, t.max(0.0))
}

/// Bezier with the curve parameter solved from the time polynomial.
#[must_use]
pub fn bezier_evaluate_cardano(points: &[MotionPoint], time: f32) -> f32 {
    let x1 = points[0].time;
    let x2 = points[3].time;
    let cx1 = points[1].time;
    let cx2 = points[2].time;

    let a = x2 - 3.0 * cx2 + 3.0 * cx1 - x1;
    let b = 3.0 * cx2 - 6.0 * cx1 + 3.0 * x1;
    let c = 3.0 * cx1 - 3.0 * x1;
    let d = x1 - time;

    let t = cardano_algorithm_for_bezier(a, b, c, d);
    de_casteljau(points, t)
}

fn de_casteljau(points: &[MotionPoint], t: f32) -> f32 {
    let p01 = points[0].lerp(points[1], t);
    let p12 = points[1].lerp(points[2], t);
    let p23 = points[2].lerp(points[3], t);

    let p012 = p01.lerp(p12, t);
    let p123 = p12.lerp(p23, t);

    p012.lerp(p123, t).value
}

#[inline]
#[must_use]
pub fn stepped_evaluate(points: &[MotionPoint], _time: f32) -> f32 {
    points[0].value
}

#[inline]
#[must_use]
pub fn inverse_stepped_evaluate(points: &[MotionPoint], _time: f32) -> f32 {
    points[1].value
}

/// Evaluates one segment whose points start at `points[0]`.
#[must_use]
pub fn evaluate_segment(
    segment_type: SegmentType,
    points: &[MotionPoint],
    time: f32,
    beziers_restricted: bool,
) -> f32 {
    match segment_type {
        SegmentType::Linear => linear_evaluate(points, time),
        SegmentType::Bezier if beziers_restricted => bezier_evaluate(points, time),
        SegmentType::Bezier => bezier_evaluate_cardano(points, time),
        SegmentType::Stepped => stepped_evaluate(points, time),
        SegmentType::InverseStepped => inverse_stepped_evaluate(points, time),
    }
}
