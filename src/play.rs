//! Play resolution: solver + probability model + the outcome roll.
//!
//! This is the surface the orchestrator calls once per batted ball. The
//! rng draw order is fixed — per-fielder search jitter in roster order,
//! then the misplay draw, then the catch roll — so a seeded play replays
//! bit-for-bit.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catch_probability::CatchProbabilityModel;
use crate::fielder::{FielderState, Role};
use crate::interception::{BallPath, InterceptionSolver};
use crate::SimError;

/// Why the play was not converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// No fielder had a candidate within tolerance; nobody touched it.
    OutOfReach,
    /// A fielder got there but the conversion roll failed.
    Muffed,
}

/// Which fielder took the play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FielderRef {
    pub role: Role,
    pub roster_index: usize,
}

/// Resolved result of one batted ball against a defense.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FieldingOutcome {
    pub fielded: bool,
    pub fielder: Option<FielderRef>,
    /// When the ball was (or would have been) at the interception point;
    /// for an untouched ball this is the search horizon.
    pub ball_time_s: f64,
    pub fielder_time_s: Option<f64>,
    pub margin_s: Option<f64>,
    /// Post-misplay probability the roll was made against; 0 when out of
    /// reach.
    pub catch_probability: f64,
    pub failure: Option<FailureKind>,
}

/// Models a play is resolved with; build once, reuse across plays.
#[derive(Debug, Clone, Default)]
pub struct PlayConfig {
    pub solver: InterceptionSolver,
    pub catch_model: CatchProbabilityModel,
}

/// Resolve one ball-in-play against the roster.
///
/// An unreachable ball is a normal outcome, not an error; errors are
/// reserved for caller misuse (e.g. an unpositioned fielder).
pub fn resolve_interception<R: Rng + ?Sized>(
    path: &BallPath,
    roster: &[FielderState],
    exit_velo_mph: f64,
    config: &PlayConfig,
    rng: &mut R,
) -> Result<FieldingOutcome, SimError> {
    let solved = config
        .solver
        .solve_with_jitter(path, roster, exit_velo_mph, rng)?;

    let Some((idx, candidate)) = solved else {
        return Ok(FieldingOutcome {
            fielded: false,
            fielder: None,
            ball_time_s: path.horizon(),
            fielder_time_s: None,
            margin_s: None,
            catch_probability: 0.0,
            failure: Some(FailureKind::OutOfReach),
        });
    };

    let attrs = &roster[idx].attributes;
    let base_p = config.catch_model.probability(&candidate, attrs);
    let effective_p = config.catch_model.apply_misplay(base_p, rng);
    let fielded = rng.gen::<f64>() < effective_p;

    Ok(FieldingOutcome {
        fielded,
        fielder: Some(FielderRef {
            role: roster[idx].role,
            roster_index: idx,
        }),
        ball_time_s: candidate.time,
        fielder_time_s: Some(candidate.fielder_time),
        margin_s: Some(candidate.margin),
        catch_probability: effective_p,
        failure: if fielded { None } else { Some(FailureKind::Muffed) },
    })
}
