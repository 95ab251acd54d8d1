//! Fixed-step RK4 integration with signed-distance stop conditions.
//!
//! The integrator is deliberately dumb: it knows nothing about balls,
//! drag, or fields. It advances a 6-component state under a caller-supplied
//! acceleration function until a boundary crossing or the time ceiling,
//! and hands back the raw sample list. The physics lives in the
//! acceleration closure; the geometry lives in the stop condition.

use log::warn;
use nalgebra::Vector3;

use crate::constants::G_ACCEL_FPS2;

/// Position, velocity, and elapsed time at one integration sample.
#[derive(Debug, Clone, Copy)]
pub struct FlightState {
    pub pos: Vector3<f64>,
    pub vel: Vector3<f64>,
    pub time: f64,
}

impl FlightState {
    pub fn new(pos: Vector3<f64>, vel: Vector3<f64>) -> Self {
        Self { pos, vel, time: 0.0 }
    }

    pub fn speed(&self) -> f64 {
        self.vel.norm()
    }
}

/// Integration step size. Coarse trades a few tenths of a foot of landing
/// accuracy for a 5x cheaper flight; fine is the regression reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StepMode {
    Fine,
    Coarse,
}

impl StepMode {
    pub fn dt(&self) -> f64 {
        match self {
            StepMode::Fine => 0.001,
            StepMode::Coarse => 0.005,
        }
    }
}

/// Termination boundary as a signed distance: positive while in flight,
/// the integrator stops on the first sample where it reaches zero or below.
pub enum StopCondition {
    /// Stop when z falls to the given ground level (descending flight).
    GroundLevel(f64),
    /// Stop when x falls to the given plane (pitch toward the plate, -x).
    PlaneX(f64),
    /// Arbitrary signed-distance function.
    Custom(Box<dyn Fn(&FlightState) -> f64 + Send + Sync>),
}

impl StopCondition {
    pub fn ground_level(z_ft: f64) -> Self {
        StopCondition::GroundLevel(z_ft)
    }

    pub fn plane_x(x_ft: f64) -> Self {
        StopCondition::PlaneX(x_ft)
    }

    fn distance(&self, state: &FlightState) -> f64 {
        match self {
            StopCondition::GroundLevel(z) => state.pos.z - z,
            StopCondition::PlaneX(x) => state.pos.x - x,
            StopCondition::Custom(g) => g(state),
        }
    }
}

/// Why integration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StopReason {
    /// The stop condition's signed distance crossed zero; the final sample
    /// is the interpolated crossing point.
    BoundaryReached,
    /// The time ceiling elapsed first; the record is truncated.
    MaxTimeExceeded,
}

/// Ordered integration samples plus the termination cause.
#[derive(Debug, Clone)]
pub struct RawTrajectory {
    pub samples: Vec<FlightState>,
    pub stop_reason: StopReason,
}

impl RawTrajectory {
    pub fn duration(&self) -> f64 {
        self.samples.last().map(|s| s.time).unwrap_or(0.0)
    }

    pub fn final_state(&self) -> &FlightState {
        // samples is never empty: integrate always pushes the initial state
        &self.samples[self.samples.len() - 1]
    }

    /// State at an arbitrary time by linear interpolation between the two
    /// bracketing samples. Clamps to the endpoints outside the record.
    pub fn state_at(&self, time: f64) -> FlightState {
        let first = self.samples[0];
        if time <= first.time {
            return first;
        }
        let last = *self.final_state();
        if time >= last.time {
            return last;
        }
        // binary search for the bracketing pair
        let idx = self
            .samples
            .partition_point(|s| s.time < time)
            .max(1);
        let a = self.samples[idx - 1];
        let b = self.samples[idx];
        let span = b.time - a.time;
        if span <= f64::EPSILON {
            return a;
        }
        let alpha = (time - a.time) / span;
        FlightState {
            pos: a.pos.lerp(&b.pos, alpha),
            vel: a.vel.lerp(&b.vel, alpha),
            time,
        }
    }
}

/// Acceleration from aerodynamics only; gravity is applied here so the
/// closure stays a pure function of the aero model and the air.
fn total_acceleration<F>(aero_accel: &F, state: &FlightState) -> Vector3<f64>
where
    F: Fn(&FlightState) -> Vector3<f64>,
{
    let mut a = aero_accel(state);
    a.z -= G_ACCEL_FPS2;
    a
}

/// Advance one classic RK4 step of size dt.
fn rk4_step<F>(aero_accel: &F, state: &FlightState, dt: f64) -> FlightState
where
    F: Fn(&FlightState) -> Vector3<f64>,
{
    let half = dt * 0.5;

    let a1 = total_acceleration(aero_accel, state);
    let k1_pos = state.vel;
    let k1_vel = a1;

    let s2 = FlightState {
        pos: state.pos + k1_pos * half,
        vel: state.vel + k1_vel * half,
        time: state.time + half,
    };
    let a2 = total_acceleration(aero_accel, &s2);
    let k2_pos = s2.vel;
    let k2_vel = a2;

    let s3 = FlightState {
        pos: state.pos + k2_pos * half,
        vel: state.vel + k2_vel * half,
        time: state.time + half,
    };
    let a3 = total_acceleration(aero_accel, &s3);
    let k3_pos = s3.vel;
    let k3_vel = a3;

    let s4 = FlightState {
        pos: state.pos + k3_pos * dt,
        vel: state.vel + k3_vel * dt,
        time: state.time + dt,
    };
    let a4 = total_acceleration(aero_accel, &s4);
    let k4_pos = s4.vel;
    let k4_vel = a4;

    FlightState {
        pos: state.pos + (k1_pos + 2.0 * k2_pos + 2.0 * k3_pos + k4_pos) * (dt / 6.0),
        vel: state.vel + (k1_vel + 2.0 * k2_vel + 2.0 * k3_vel + k4_vel) * (dt / 6.0),
        time: state.time + dt,
    }
}

/// Interpolate the exact boundary crossing between two samples on the
/// signed distance, the same linear scheme `state_at` uses on time.
fn interpolate_crossing(a: &FlightState, b: &FlightState, g0: f64, g1: f64) -> FlightState {
    let denom = g0 - g1;
    let alpha = if denom.abs() <= f64::EPSILON {
        1.0
    } else {
        (g0 / denom).clamp(0.0, 1.0)
    };
    FlightState {
        pos: a.pos.lerp(&b.pos, alpha),
        vel: a.vel.lerp(&b.vel, alpha),
        time: a.time + alpha * (b.time - a.time),
    }
}

/// Integrate from `initial` under `aero_accel` (aerodynamic acceleration
/// only; gravity is added internally) until the stop condition crosses
/// zero or `max_time_s` elapses.
///
/// The first sample is the initial state at t = 0 relative to itself;
/// sample times are strictly increasing. When the boundary is crossed the
/// final sample is the linearly interpolated crossing point, so e.g. a
/// ground-level stop lands with z equal to the ground within interpolation
/// error of one step.
pub fn integrate<F>(
    initial: FlightState,
    aero_accel: F,
    mode: StepMode,
    max_time_s: f64,
    stop: &StopCondition,
) -> RawTrajectory
where
    F: Fn(&FlightState) -> Vector3<f64>,
{
    let dt = mode.dt();
    let mut samples = Vec::with_capacity((max_time_s / dt).ceil() as usize + 2);

    let mut current = initial;
    let mut g_current = stop.distance(&current);
    samples.push(current);

    // Already at or past the boundary (e.g. launched from ground level
    // moving down): the initial sample is the whole record.
    if g_current <= 0.0 {
        return RawTrajectory {
            samples,
            stop_reason: StopReason::BoundaryReached,
        };
    }

    while current.time < max_time_s {
        let next = rk4_step(&aero_accel, &current, dt);
        let g_next = stop.distance(&next);

        if g_next <= 0.0 {
            let crossing = interpolate_crossing(&current, &next, g_current, g_next);
            if crossing.time > current.time {
                samples.push(crossing);
            } else {
                samples.push(next);
            }
            return RawTrajectory {
                samples,
                stop_reason: StopReason::BoundaryReached,
            };
        }

        samples.push(next);
        current = next;
        g_current = g_next;
    }

    warn!(
        "integration hit the {:.1} s ceiling without reaching the boundary",
        max_time_s
    );
    RawTrajectory {
        samples,
        stop_reason: StopReason::MaxTimeExceeded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn no_aero(_: &FlightState) -> Vector3<f64> {
        Vector3::zeros()
    }

    #[test]
    fn test_pure_gravity_matches_analytic_projectile() {
        // v0 = 80 ft/s at 45°, launched from 3 ft
        let v0 = 80.0 / f64::sqrt(2.0);
        let initial = FlightState::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(v0, 0.0, v0));
        let traj = integrate(
            initial,
            no_aero,
            StepMode::Fine,
            20.0,
            &StopCondition::ground_level(0.0),
        );
        assert_eq!(traj.stop_reason, StopReason::BoundaryReached);

        // z(t) = 3 + v0 t - g t²/2 = 0
        let g = G_ACCEL_FPS2;
        let t_land = (v0 + (v0 * v0 + 2.0 * g * 3.0).sqrt()) / g;
        let x_land = v0 * t_land;

        let last = traj.final_state();
        assert_relative_eq!(last.time, t_land, epsilon = 1e-3);
        assert_relative_eq!(last.pos.x, x_land, epsilon = 0.05);
        assert!(last.pos.z.abs() < 1e-3);
    }

    #[test]
    fn test_samples_strictly_increasing() {
        let initial =
            FlightState::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(50.0, 0.0, 50.0));
        let traj = integrate(
            initial,
            no_aero,
            StepMode::Coarse,
            20.0,
            &StopCondition::ground_level(0.0),
        );
        for pair in traj.samples.windows(2) {
            assert!(pair[1].time > pair[0].time);
        }
        assert_eq!(traj.samples[0].time, 0.0);
    }

    #[test]
    fn test_max_time_truncation_flagged() {
        // Straight up forever against an unreachable plane
        let initial = FlightState::new(Vector3::zeros(), Vector3::new(-10.0, 0.0, 0.0));
        let traj = integrate(
            initial,
            no_aero,
            StepMode::Coarse,
            0.5,
            &StopCondition::plane_x(-1000.0),
        );
        assert_eq!(traj.stop_reason, StopReason::MaxTimeExceeded);
        assert!(traj.duration() >= 0.5 - 1e-9);
    }

    #[test]
    fn test_starting_past_boundary() {
        let initial =
            FlightState::new(Vector3::new(0.0, 0.0, -1.0), Vector3::new(0.0, 0.0, -5.0));
        let traj = integrate(
            initial,
            no_aero,
            StepMode::Fine,
            10.0,
            &StopCondition::ground_level(0.0),
        );
        assert_eq!(traj.samples.len(), 1);
        assert_eq!(traj.stop_reason, StopReason::BoundaryReached);
    }

    #[test]
    fn test_plane_x_stop() {
        // Moving in -x toward a plate plane at x = 1.417
        let initial =
            FlightState::new(Vector3::new(55.5, 0.0, 6.0), Vector3::new(-130.0, 0.0, 0.0));
        let traj = integrate(
            initial,
            no_aero,
            StepMode::Fine,
            5.0,
            &StopCondition::plane_x(1.417),
        );
        assert_eq!(traj.stop_reason, StopReason::BoundaryReached);
        assert_relative_eq!(traj.final_state().pos.x, 1.417, epsilon = 1e-6);
    }

    #[test]
    fn test_state_at_interpolates_and_clamps() {
        let initial =
            FlightState::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(60.0, 0.0, 40.0));
        let traj = integrate(
            initial,
            no_aero,
            StepMode::Coarse,
            20.0,
            &StopCondition::ground_level(0.0),
        );
        let mid = traj.state_at(traj.duration() / 2.0);
        assert!(mid.time > 0.0 && mid.time < traj.duration());
        assert!(mid.pos.x > 0.0);

        let before = traj.state_at(-1.0);
        assert_eq!(before.time, 0.0);
        let after = traj.state_at(traj.duration() + 10.0);
        assert_eq!(after.time, traj.duration());
    }

    #[test]
    fn test_custom_stop_condition() {
        // Stop at the apex: vertical velocity crossing zero
        let initial =
            FlightState::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(40.0, 0.0, 64.348));
        let stop = StopCondition::Custom(Box::new(|s: &FlightState| s.vel.z));
        let traj = integrate(initial, no_aero, StepMode::Fine, 20.0, &stop);
        assert_eq!(traj.stop_reason, StopReason::BoundaryReached);
        // vz0 / g = 2.0 s to apex
        assert_relative_eq!(traj.final_state().time, 2.0, epsilon = 1e-3);
        assert!(traj.final_state().vel.z.abs() < 0.1);
    }

    #[test]
    fn test_coarse_close_to_fine() {
        let initial =
            FlightState::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(90.0, 0.0, 70.0));
        let fine = integrate(
            initial,
            no_aero,
            StepMode::Fine,
            20.0,
            &StopCondition::ground_level(0.0),
        );
        let coarse = integrate(
            initial,
            no_aero,
            StepMode::Coarse,
            20.0,
            &StopCondition::ground_level(0.0),
        );
        let fx = fine.final_state().pos.x;
        let cx = coarse.final_state().pos.x;
        assert!((fx - cx).abs() / fx < 0.02);
    }
}
