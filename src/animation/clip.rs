use crate::animation::curve::{
    CurveTarget, MotionCurve, MotionPoint, MotionSegment, SegmentType, evaluate_segment,
};
use crate::assets::json::{self, JsonView};
use crate::errors::{CubismError, Result};
use crate::utils::interner::{CubismId, IdManager};

const ASSET: &str = "motion3.json";

/// A user-data event embedded in a motion.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionEvent {
    pub fire_time: f32,
    pub value: String,
}

/// Decoded keyframe data of one motion3.json file.
///
/// Curves are ordered Model, then Parameter, then PartOpacity.
#[derive(Debug, Clone)]
pub struct MotionData {
    pub duration: f32,
    pub fps: f32,
    pub looped: bool,
    pub beziers_restricted: bool,
    /// Motion-wide fade-in from `Meta.FadeInTime`, when present.
    pub fade_in_time: Option<f32>,
    /// Motion-wide fade-out from `Meta.FadeOutTime`, when present.
    pub fade_out_time: Option<f32>,
    pub curves: Vec<MotionCurve>,
    pub segments: Vec<MotionSegment>,
    pub points: Vec<MotionPoint>,
    pub events: Vec<MotionEvent>,
}

impl MotionData {
    pub fn parse(bytes: &[u8], ids: &IdManager) -> Result<Self> {
        let value = json::parse(bytes)?;
        let root = JsonView::new(&value);
        let meta = root.get("Meta");

        let duration = meta.require_f32("Duration", ASSET)?;
        let fps = meta.get("Fps").as_f32_or(30.0);
        let looped = meta.get("Loop").as_bool_or(false);
        let beziers_restricted = meta.get("AreBeziersRestricted").as_bool_or(false);
        let fade_in_time = meta.get("FadeInTime").as_f32();
        let fade_out_time = meta.get("FadeOutTime").as_f32();

        let mut data = MotionData {
            duration,
            fps,
            looped,
            beziers_restricted,
            fade_in_time,
            fade_out_time,
            curves: Vec::new(),
            segments: Vec::new(),
            points: Vec::new(),
            events: Vec::new(),
        };

        for curve in root.get("Curves").items() {
            data.parse_curve(curve, ids)?;
        }
        // Stable: curves of the same target keep document order.
        data.curves.sort_by_key(|c| c.target);

        for event in root.get("UserData").items() {
            let fire_time = event.require_f32("Time", ASSET)?;
            let value = event.get("Value").as_str().unwrap_or_default().to_owned();
            data.events.push(MotionEvent { fire_time, value });
        }

        Ok(data)
    }

    fn parse_curve(&mut self, curve: JsonView<'_>, ids: &IdManager) -> Result<()> {
        let target = match curve.require_str("Target", ASSET)? {
            "Model" => CurveTarget::Model,
            "Parameter" => CurveTarget::Parameter,
            "PartOpacity" => CurveTarget::PartOpacity,
            other => {
                return Err(CubismError::malformed(ASSET, format!("unknown curve target '{other}'")));
            }
        };
        let id = ids.id(curve.require_str("Id", ASSET)?);

        let raw: Vec<f32> = curve.get("Segments").items().filter_map(JsonView::as_f32).collect();
        if raw.len() < 2 {
            return Err(CubismError::malformed(ASSET, "curve without a start point"));
        }

        let base_segment_index = self.segments.len();
        let base_point_index = self.points.len();
        self.points.push(MotionPoint::new(raw[0], raw[1]));

        let mut position = 2;
        while position < raw.len() {
            let code = raw[position] as i64;
            let segment_type = SegmentType::from_code(code).ok_or(CubismError::UnknownSegmentType(code))?;
            let count = segment_type.point_count();
            let end = position + 1 + count * 2;
            if end > raw.len() {
                return Err(CubismError::malformed(ASSET, "truncated segment data"));
            }

            self.segments.push(MotionSegment {
                base_point_index: self.points.len() - 1,
                segment_type,
            });
            for pair in raw[position + 1..end].chunks_exact(2) {
                self.points.push(MotionPoint::new(pair[0], pair[1]));
            }
            position = end;
        }

        self.curves.push(MotionCurve {
            target,
            id,
            base_point_index,
            base_segment_index,
            segment_count: self.segments.len() - base_segment_index,
            fade_in_time: curve.get("FadeInTime").as_f32_or(-1.0),
            fade_out_time: curve.get("FadeOutTime").as_f32_or(-1.0),
        });
        Ok(())
    }

    #[must_use]
    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    /// Evaluates curve `index` at `time` seconds from the motion start.
    ///
    /// Past the last point the final value holds. With `loop_end` set, the
    /// stretch between the last point and `loop_end` blends back toward the
    /// curve's first value so a looping motion wraps without a jump.
    #[must_use]
    pub fn evaluate_curve(&self, index: usize, time: f32, loop_end: Option<f32>) -> f32 {
        let Some(curve) = self.curves.get(index) else {
            return 0.0;
        };
        if curve.segment_count == 0 {
            return self.points[curve.base_point_index].value;
        }

        let segments = &self.segments[curve.base_segment_index..curve.base_segment_index + curve.segment_count];
        for segment in segments {
            let end = segment.end_point_index();
            if self.points[end].time > time {
                return evaluate_segment(
                    segment.segment_type,
                    &self.points[segment.base_point_index..=end],
                    time,
                    self.beziers_restricted,
                );
            }
        }

        let last_segment = segments[segments.len() - 1];
        let last = self.points[last_segment.end_point_index()];
        match loop_end {
            Some(end_time) if time < end_time => {
                let first = self.points[curve.base_point_index];
                let pair = [last, MotionPoint::new(end_time, first.value)];
                match last_segment.segment_type {
                    SegmentType::Stepped | SegmentType::InverseStepped => {
                        evaluate_segment(last_segment.segment_type, &pair, time, true)
                    }
                    _ => evaluate_segment(SegmentType::Linear, &pair, time, true),
                }
            }
            _ => last.value,
        }
    }

    /// Events whose fire time lies in `(before, current]`.
    pub fn events_between(&self, before: f32, current: f32) -> impl Iterator<Item = &str> {
        self.events
            .iter()
            .filter(move |e| e.fire_time > before && e.fire_time <= current)
            .map(|e| e.value.as_str())
    }

    /// Ids of curves with the given target, in composition order.
    pub fn curve_ids(&self, target: CurveTarget) -> impl Iterator<Item = CubismId> + '_ {
        self.curves.iter().filter(move |c| c.target == target).map(|c| c.id)
    }
}
