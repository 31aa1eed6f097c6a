use glam::Vec2;

/// Reference frame rate of the pursuit constants.
const FRAME_RATE: f32 = 30.0;
const EPSILON: f32 = 0.01;
/// Top speed in units per frame.
const MAX_V: f32 = 4.0 / FRAME_RATE;
const TIME_TO_MAX_SPEED: f32 = 0.15;
const FRAME_TO_MAX_SPEED: f32 = TIME_TO_MAX_SPEED * FRAME_RATE;

/// Smoothly follows a drag target in `[-1, 1]²`.
///
/// Accelerates toward the target with bounded acceleration and caps its speed
/// by the distance it can still stop in, so it settles without overshoot.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetPoint {
    target: Vec2,
    face: Vec2,
    velocity: Vec2,
    last_time: f32,
    user_time: f32,
}

impl TargetPoint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, x: f32, y: f32) {
        self.target = Vec2::new(x, y);
    }

    #[must_use]
    pub fn target(&self) -> Vec2 {
        self.target
    }

    #[must_use]
    pub fn x(&self) -> f32 {
        self.face.x
    }

    #[must_use]
    pub fn y(&self) -> f32 {
        self.face.y
    }

    pub fn update(&mut self, delta_seconds: f32) {
        self.user_time += delta_seconds;

        if self.last_time == 0.0 {
            self.last_time = self.user_time;
            return;
        }

        let delta_weight = (self.user_time - self.last_time) * FRAME_RATE;
        self.last_time = self.user_time;

        let max_a = delta_weight * MAX_V / FRAME_TO_MAX_SPEED;

        let delta = self.target - self.face;
        if delta.x.abs() <= EPSILON && delta.y.abs() <= EPSILON {
            return;
        }

        let distance = delta.length();
        let desired = MAX_V * delta / distance;

        let mut accel = desired - self.velocity;
        let a = accel.length();
        if a > max_a {
            accel *= max_a / a;
        }
        self.velocity += accel;

        // Fastest speed from which the follower can still stop at the target.
        let max_v = 0.5 * ((max_a * max_a + 16.0 * max_a * distance - 8.0 * max_a * distance).sqrt() - max_a);
        let current_v = self.velocity.length();
        if current_v > max_v {
            self.velocity *= max_v / current_v;
        }

        self.face += self.velocity;
    }
}
