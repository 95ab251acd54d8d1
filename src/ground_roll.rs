//! Post-landing ball motion: bounces, then a decelerating roll.
//!
//! The bounce loop runs once at construction — vertical speed loses a
//! restitution factor per hop, horizontal speed loses a retention factor —
//! and everything after is analytic: the hops are stored as short
//! constant-horizontal-velocity segments with parabolic height, the roll
//! as a closed-form decelerating line with a quadratic lateral spin
//! correction. `position_at` never integrates.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{G_ACCEL_FPS2, MIN_VELOCITY_THRESHOLD};
use crate::trajectory::TrajectoryRecord;

/// Hop height (ft) below which the ball is considered rolling.
const NEGLIGIBLE_HOP_FT: f64 = 0.05;

/// Safety cap on the bounce loop.
const MAX_BOUNCES: usize = 12;

/// Rolling drag from the air, added on top of surface friction (ft/s²).
const AIR_ROLL_DECEL_FPS2: f64 = 2.0;

/// Lateral curving acceleration per rpm of sidespin (ft/s² per rpm).
const CURVE_ACCEL_PER_RPM: f64 = 1.2e-4;

/// Playing surface under the rolling ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Surface {
    Grass,
    Dirt,
    Turf,
}

impl Surface {
    /// Rolling friction coefficient.
    pub fn friction(&self) -> f64 {
        match self {
            Surface::Grass => 0.25,
            Surface::Dirt => 0.30,
            Surface::Turf => 0.18,
        }
    }

    /// Vertical restitution per bounce.
    pub fn restitution(&self) -> f64 {
        match self {
            Surface::Grass => 0.30,
            Surface::Dirt => 0.40,
            Surface::Turf => 0.45,
        }
    }

    /// Horizontal speed retained per bounce.
    pub fn horizontal_retention(&self) -> f64 {
        match self {
            Surface::Grass => 0.70,
            Surface::Dirt => 0.78,
            Surface::Turf => 0.82,
        }
    }
}

/// One hop: constant horizontal velocity, parabolic height.
#[derive(Debug, Clone, Copy)]
struct HopSegment {
    start_time: f64,
    start_pos: Vector3<f64>,
    horizontal_vel: Vector3<f64>,
    vertical_speed: f64,
    duration: f64,
}

impl HopSegment {
    fn position_at(&self, t: f64) -> (Vector3<f64>, Vector3<f64>) {
        let tau = (t - self.start_time).clamp(0.0, self.duration);
        let z = self.vertical_speed * tau - 0.5 * G_ACCEL_FPS2 * tau * tau;
        let pos = self.start_pos + self.horizontal_vel * tau + Vector3::new(0.0, 0.0, z.max(0.0));
        let vel = self.horizontal_vel
            + Vector3::new(0.0, 0.0, self.vertical_speed - G_ACCEL_FPS2 * tau);
        (pos, vel)
    }
}

/// Analytic descriptor of a ball on the ground.
#[derive(Debug, Clone)]
pub struct GroundRollState {
    hops: Vec<HopSegment>,
    roll_start_time: f64,
    roll_start_pos: Vector3<f64>,
    roll_direction: Vector3<f64>,
    roll_speed_fps: f64,
    decel_fps2: f64,
    /// Signed lateral acceleration perpendicular to the roll direction.
    curve_accel_fps2: f64,
}

impl GroundRollState {
    /// Build from the landing state. `landing_vel` is the full velocity at
    /// ground contact; its vertical component drives the hop loop.
    pub fn from_landing(
        landing_pos: Vector3<f64>,
        landing_vel: Vector3<f64>,
        landing_time: f64,
        surface: Surface,
        sidespin_rpm: f64,
    ) -> Self {
        let e = surface.restitution();
        let retention = surface.horizontal_retention();

        let mut hops = Vec::new();
        let mut time = landing_time;
        let mut pos = Vector3::new(landing_pos.x, landing_pos.y, 0.0);
        let mut h_vel = Vector3::new(landing_vel.x, landing_vel.y, 0.0);
        let mut vz = landing_vel.z.abs() * e;

        for _ in 0..MAX_BOUNCES {
            let hop_height = vz * vz / (2.0 * G_ACCEL_FPS2);
            if hop_height <= NEGLIGIBLE_HOP_FT {
                break;
            }
            h_vel *= retention;
            let duration = 2.0 * vz / G_ACCEL_FPS2;
            hops.push(HopSegment {
                start_time: time,
                start_pos: pos,
                horizontal_vel: h_vel,
                vertical_speed: vz,
                duration,
            });
            pos += h_vel * duration;
            time += duration;
            vz *= e;
        }

        let roll_speed = h_vel.norm();
        let roll_direction = if roll_speed < MIN_VELOCITY_THRESHOLD {
            Vector3::zeros()
        } else {
            h_vel / roll_speed
        };
        let decel = G_ACCEL_FPS2 * surface.friction() + AIR_ROLL_DECEL_FPS2;

        Self {
            hops,
            roll_start_time: time,
            roll_start_pos: pos,
            roll_direction,
            roll_speed_fps: roll_speed,
            decel_fps2: decel,
            curve_accel_fps2: CURVE_ACCEL_PER_RPM * sidespin_rpm,
        }
    }

    /// Build from a completed flight record's final state.
    pub fn from_record(record: &TrajectoryRecord, surface: Surface) -> Self {
        let last = record.final_state();
        Self::from_landing(
            last.pos,
            last.vel,
            last.time,
            surface,
            record.launch.sidespin_rpm,
        )
    }

    pub fn landing_time(&self) -> f64 {
        self.hops
            .first()
            .map(|h| h.start_time)
            .unwrap_or(self.roll_start_time)
    }

    pub fn roll_start_time(&self) -> f64 {
        self.roll_start_time
    }

    /// Absolute time at which the ball stops.
    pub fn stop_time(&self) -> f64 {
        if self.decel_fps2 <= 0.0 {
            return self.roll_start_time;
        }
        self.roll_start_time + self.roll_speed_fps / self.decel_fps2
    }

    pub fn stop_position(&self) -> Vector3<f64> {
        self.position_at(self.stop_time()).0
    }

    /// Position and velocity at absolute time t. Before the landing time
    /// the landing state is returned; after the stop time the ball sits
    /// still at its stop position.
    pub fn position_at(&self, t: f64) -> (Vector3<f64>, Vector3<f64>) {
        for hop in &self.hops {
            if t < hop.start_time + hop.duration {
                return hop.position_at(t);
            }
        }

        let tau_stop = if self.decel_fps2 > 0.0 {
            self.roll_speed_fps / self.decel_fps2
        } else {
            0.0
        };
        let tau = (t - self.roll_start_time).clamp(0.0, tau_stop);

        let dist = self.roll_speed_fps * tau - 0.5 * self.decel_fps2 * tau * tau;
        let speed = (self.roll_speed_fps - self.decel_fps2 * tau).max(0.0);

        let lateral = Vector3::z().cross(&self.roll_direction);
        let lateral_offset = 0.5 * self.curve_accel_fps2 * tau * tau;
        let lateral_speed = self.curve_accel_fps2 * tau;

        let pos = self.roll_start_pos + self.roll_direction * dist + lateral * lateral_offset;
        let vel = if speed > 0.0 {
            self.roll_direction * speed + lateral * lateral_speed
        } else {
            Vector3::zeros()
        };
        (pos, vel)
    }
}
