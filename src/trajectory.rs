//! Batted-ball and pitch flight simulation.
//!
//! Decomposes launch parameters into an initial state, runs the RK4
//! integrator under the aerodynamic model, and wraps the raw samples in a
//! record that derives every summary scalar from the samples alone — no
//! value on the summary comes from a second simulation pass.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::aerodynamics::AeroModel;
use crate::constants::{
    DEFAULT_CONTACT_HEIGHT_FT, DEFAULT_RELEASE_DISTANCE_FT, DEFAULT_RELEASE_HEIGHT_FT,
    MIN_VELOCITY_THRESHOLD, MPH_TO_FPS, PLATE_PLANE_X_FT,
};
use crate::environment::EnvironmentState;
use crate::integrator::{integrate, FlightState, RawTrajectory, StepMode, StopCondition, StopReason};
use crate::SimError;

/// Flight-time ceiling for a batted ball (s). No real batted ball stays up
/// this long; hitting it means the stop condition never fired.
const MAX_FLIGHT_TIME_S: f64 = 15.0;

/// Flight-time ceiling for a pitch (s).
const MAX_PITCH_TIME_S: f64 = 2.0;

/// Bat-contact launch parameters.
///
/// Spray angle is positive toward the third-base side (+y). Sidespin sign
/// follows the right-hand rule about +z: positive sidespin curves the ball
/// toward -y.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LaunchParams {
    pub exit_velo_mph: f64,
    pub launch_angle_deg: f64,
    pub spray_angle_deg: f64,
    pub backspin_rpm: f64,
    pub sidespin_rpm: f64,
    pub contact_height_ft: f64,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            exit_velo_mph: 90.0,
            launch_angle_deg: 15.0,
            spray_angle_deg: 0.0,
            backspin_rpm: 1500.0,
            sidespin_rpm: 0.0,
            contact_height_ft: DEFAULT_CONTACT_HEIGHT_FT,
        }
    }
}

impl LaunchParams {
    fn validate(&self) -> Result<(), SimError> {
        if !self.exit_velo_mph.is_finite() || self.exit_velo_mph <= 0.0 {
            return Err(SimError::InvalidConfig(
                "exit velocity must be positive and finite".into(),
            ));
        }
        if !self.launch_angle_deg.is_finite()
            || self.launch_angle_deg < -90.0
            || self.launch_angle_deg > 90.0
        {
            return Err(SimError::InvalidConfig(
                "launch angle must be within [-90, 90] degrees".into(),
            ));
        }
        if !self.contact_height_ft.is_finite() || self.contact_height_ft < 0.0 {
            return Err(SimError::InvalidConfig(
                "contact height must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Initial velocity vector (ft/s) from exit velocity and the two angles.
    pub fn initial_velocity(&self) -> Vector3<f64> {
        let speed = self.exit_velo_mph * MPH_TO_FPS;
        let launch = self.launch_angle_deg.to_radians();
        let spray = self.spray_angle_deg.to_radians();
        Vector3::new(
            speed * launch.cos() * spray.cos(),
            speed * launch.cos() * spray.sin(),
            speed * launch.sin(),
        )
    }

    /// Combined spin axis (unit) and magnitude (rpm).
    ///
    /// Backspin spins about ẑ × v̂ₕ (lift points up for positive backspin);
    /// sidespin spins about ẑ. The two are orthogonal, so the combined
    /// magnitude is the root-sum-square.
    pub fn spin(&self) -> (Vector3<f64>, f64) {
        let spray = self.spray_angle_deg.to_radians();
        let heading = Vector3::new(spray.cos(), spray.sin(), 0.0);
        let backspin_axis = Vector3::new(0.0, 0.0, 1.0).cross(&heading);

        let combined = self.backspin_rpm * backspin_axis + self.sidespin_rpm * Vector3::z();
        let magnitude = combined.norm();
        if magnitude < MIN_VELOCITY_THRESHOLD {
            (Vector3::zeros(), 0.0)
        } else {
            (combined / magnitude, magnitude)
        }
    }
}

/// Contact-quality offset of the bat relative to ball center (inches).
/// Positive vertical means the bat hit below center (undercut).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ContactOffset {
    pub vertical_in: f64,
    pub horizontal_in: f64,
}

/// Perturb launch parameters for off-center contact.
///
/// An undercut raises the launch angle and adds backspin while bleeding
/// exit velocity; a horizontal miss pushes the spray angle and adds
/// sidespin. Pure function: the integrator never sees the offset.
pub fn apply_contact_offset(params: &LaunchParams, offset: &ContactOffset) -> LaunchParams {
    let miss_sq =
        offset.vertical_in * offset.vertical_in + offset.horizontal_in * offset.horizontal_in;
    let ev_retention = (1.0 - 0.06 * miss_sq).max(0.4);

    LaunchParams {
        exit_velo_mph: params.exit_velo_mph * ev_retention,
        launch_angle_deg: (params.launch_angle_deg + 11.0 * offset.vertical_in).clamp(-90.0, 90.0),
        spray_angle_deg: params.spray_angle_deg + 5.0 * offset.horizontal_in,
        backspin_rpm: params.backspin_rpm + 750.0 * offset.vertical_in,
        sidespin_rpm: params.sidespin_rpm + 500.0 * offset.horizontal_in,
        contact_height_ft: params.contact_height_ft,
    }
}

/// Pitch release parameters. The ball travels in -x from the release point
/// toward the plate plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PitchParams {
    pub speed_mph: f64,
    pub release_height_ft: f64,
    pub release_side_ft: f64,
    pub release_distance_ft: f64,
    /// Downward release angle (deg); positive aims below horizontal.
    pub vertical_angle_deg: f64,
    /// Horizontal release angle (deg); positive aims toward +y.
    pub horizontal_angle_deg: f64,
    pub spin_rpm: f64,
    /// Spin axis in field coordinates; normalized internally.
    pub spin_axis: Vector3<f64>,
}

impl Default for PitchParams {
    fn default() -> Self {
        // A straight four-seamer: pure backspin for a ball moving in -x
        // is the +y axis flipped, so lift points up.
        Self {
            speed_mph: 93.0,
            release_height_ft: DEFAULT_RELEASE_HEIGHT_FT,
            release_side_ft: 0.0,
            release_distance_ft: DEFAULT_RELEASE_DISTANCE_FT,
            vertical_angle_deg: 3.0,
            horizontal_angle_deg: 0.0,
            spin_rpm: 2300.0,
            spin_axis: Vector3::new(0.0, -1.0, 0.0),
        }
    }
}

/// Summary scalars derived from a flight record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlightSummary {
    pub carry_distance_ft: f64,
    pub flight_time_s: f64,
    pub peak_height_ft: f64,
    pub time_to_peak_s: f64,
    pub final_speed_fps: f64,
    pub landing_x_ft: f64,
    pub landing_y_ft: f64,
    pub landing_spray_angle_deg: f64,
    pub stop_reason: StopReason,
}

/// Complete flight: the raw sample list plus the launch that produced it.
#[derive(Debug, Clone)]
pub struct TrajectoryRecord {
    pub launch: LaunchParams,
    raw: RawTrajectory,
}

impl TrajectoryRecord {
    pub fn samples(&self) -> &[FlightState] {
        &self.raw.samples
    }

    pub fn stop_reason(&self) -> StopReason {
        self.raw.stop_reason
    }

    pub fn flight_time_s(&self) -> f64 {
        self.raw.duration()
    }

    pub fn final_state(&self) -> &FlightState {
        self.raw.final_state()
    }

    /// Interpolated state at time t, clamped to the record.
    pub fn state_at(&self, time: f64) -> FlightState {
        self.raw.state_at(time)
    }

    pub fn landing_point(&self) -> Vector3<f64> {
        self.raw.final_state().pos
    }

    pub fn carry_distance_ft(&self) -> f64 {
        let p = self.landing_point();
        (p.x * p.x + p.y * p.y).sqrt()
    }

    /// Peak height and the sample time it occurred at.
    pub fn peak(&self) -> (f64, f64) {
        let mut best_z = f64::NEG_INFINITY;
        let mut best_t = 0.0;
        for s in &self.raw.samples {
            if s.pos.z > best_z {
                best_z = s.pos.z;
                best_t = s.time;
            }
        }
        (best_z, best_t)
    }

    pub fn summary(&self) -> FlightSummary {
        let last = self.raw.final_state();
        let (peak_height_ft, time_to_peak_s) = self.peak();
        FlightSummary {
            carry_distance_ft: self.carry_distance_ft(),
            flight_time_s: last.time,
            peak_height_ft,
            time_to_peak_s,
            final_speed_fps: last.vel.norm(),
            landing_x_ft: last.pos.x,
            landing_y_ft: last.pos.y,
            landing_spray_angle_deg: last.pos.y.atan2(last.pos.x).to_degrees(),
            stop_reason: self.raw.stop_reason,
        }
    }
}

/// Flight simulator binding an aerodynamic model. One simulator is built
/// per configuration and reused across plays.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrajectorySimulator {
    aero: AeroModel,
}

impl TrajectorySimulator {
    pub fn new(aero: AeroModel) -> Self {
        Self { aero }
    }

    pub fn aero(&self) -> &AeroModel {
        &self.aero
    }

    /// Simulate a batted ball from contact to ground level.
    pub fn simulate_flight(
        &self,
        params: &LaunchParams,
        env: &EnvironmentState,
        mode: StepMode,
    ) -> Result<TrajectoryRecord, SimError> {
        params.validate()?;

        let initial = FlightState::new(
            Vector3::new(0.0, 0.0, params.contact_height_ft),
            params.initial_velocity(),
        );
        let (spin_axis, spin_rpm) = params.spin();
        let rho = env.air_density_slug_ft3();
        let aero = self.aero;

        let raw = integrate(
            initial,
            move |state: &FlightState| aero.acceleration(state.vel, spin_axis, spin_rpm, rho),
            mode,
            MAX_FLIGHT_TIME_S,
            &StopCondition::ground_level(0.0),
        );

        Ok(TrajectoryRecord {
            launch: *params,
            raw,
        })
    }

    /// Simulate a pitch from release to the front plane of the plate.
    pub fn simulate_pitch(
        &self,
        pitch: &PitchParams,
        env: &EnvironmentState,
        mode: StepMode,
    ) -> Result<TrajectoryRecord, SimError> {
        if !pitch.speed_mph.is_finite() || pitch.speed_mph <= 0.0 {
            return Err(SimError::InvalidConfig(
                "pitch speed must be positive and finite".into(),
            ));
        }
        if pitch.release_distance_ft <= PLATE_PLANE_X_FT {
            return Err(SimError::InvalidConfig(
                "pitch release must be behind the plate plane".into(),
            ));
        }

        let speed = pitch.speed_mph * MPH_TO_FPS;
        let down = pitch.vertical_angle_deg.to_radians();
        let side = pitch.horizontal_angle_deg.to_radians();
        let vel = Vector3::new(
            -speed * down.cos() * side.cos(),
            speed * down.cos() * side.sin(),
            -speed * down.sin(),
        );
        let initial = FlightState::new(
            Vector3::new(
                pitch.release_distance_ft,
                pitch.release_side_ft,
                pitch.release_height_ft,
            ),
            vel,
        );

        let axis_norm = pitch.spin_axis.norm();
        let (spin_axis, spin_rpm) = if axis_norm < MIN_VELOCITY_THRESHOLD {
            (Vector3::zeros(), 0.0)
        } else {
            (pitch.spin_axis / axis_norm, pitch.spin_rpm.abs())
        };

        let rho = env.air_density_slug_ft3();
        let aero = self.aero;
        let raw = integrate(
            initial,
            move |state: &FlightState| aero.acceleration(state.vel, spin_axis, spin_rpm, rho),
            mode,
            MAX_PITCH_TIME_S,
            &StopCondition::plane_x(PLATE_PLANE_X_FT),
        );

        Ok(TrajectoryRecord {
            // The launch block is batted-ball shaped; record the pitch as
            // its speed-only equivalent so the summary stays meaningful.
            launch: LaunchParams {
                exit_velo_mph: pitch.speed_mph,
                launch_angle_deg: -pitch.vertical_angle_deg,
                spray_angle_deg: pitch.horizontal_angle_deg,
                backspin_rpm: pitch.spin_rpm,
                sidespin_rpm: 0.0,
                contact_height_ft: pitch.release_height_ft,
            },
            raw,
        })
    }
}
