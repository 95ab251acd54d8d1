//! Baseball flight and fielding physics.
//!
//! Covers the ball from contact (or pitch release) to the glove: RK4
//! aerodynamic flight under drag and Magnus lift, atmospheric density from
//! park conditions, bounce-and-roll ground motion, a fielder movement
//! model, interception solving, and catch-probability resolution. A Monte
//! Carlo batch runner evaluates perturbed flights in parallel.
//!
//! All computation is pure and deterministic given a seed; the library
//! installs no logger and holds no mutable global state.
//!
//! ```
//! use baseball_physics::{
//!     EnvironmentState, LaunchParams, StepMode, TrajectorySimulator,
//! };
//!
//! let sim = TrajectorySimulator::default();
//! let env = EnvironmentState::new(0.0, 70.0, 50.0);
//! let record = sim
//!     .simulate_flight(&LaunchParams::default(), &env, StepMode::Fine)
//!     .unwrap();
//! assert!(record.carry_distance_ft() > 0.0);
//! ```

pub mod aerodynamics;
pub mod catch_probability;
pub mod constants;
pub mod environment;
pub mod fielder;
pub mod ground_roll;
pub mod integrator;
pub mod interception;
pub mod monte_carlo;
pub mod play;
pub mod trajectory;

use thiserror::Error;

/// Configuration and caller-misuse faults. Physical edge cases (truncated
/// flights, unreachable balls) are data on the results, never errors.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("fielder at {0:?} was queried before being positioned")]
    UnsetPosition(fielder::Role),
}

pub use aerodynamics::{AeroForce, AeroModel, DragCurve, LiftModel};
pub use catch_probability::{CatchBands, CatchProbabilityModel};
pub use environment::EnvironmentState;
pub use fielder::{
    time_to_position, FielderAttributes, FielderState, MovementModel, Role, SearchJitter,
};
pub use ground_roll::{GroundRollState, Surface};
pub use integrator::{integrate, FlightState, RawTrajectory, StepMode, StopCondition, StopReason};
pub use interception::{BallPath, HitHardness, InterceptionCandidate, InterceptionSolver};
pub use monte_carlo::{
    run_flight_batch, FieldStats, MonteCarloConfig, MonteCarloResults, PerturbationSpec,
};
pub use play::{resolve_interception, FailureKind, FielderRef, FieldingOutcome, PlayConfig};
pub use trajectory::{
    apply_contact_offset, ContactOffset, FlightSummary, LaunchParams, PitchParams,
    TrajectoryRecord, TrajectorySimulator,
};
