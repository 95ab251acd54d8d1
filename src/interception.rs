//! Interception search: who can get to the ball, where, and with how much
//! time to spare.
//!
//! The solver steps along the ball's path at a fixed resolution, asks the
//! movement model what each candidate point costs the fielder, and keeps
//! the best-scoring reachable point. Margin is ball time minus fielder
//! time: positive means the fielder is camped under it, slightly negative
//! means a dive. The search is bounded and sequential per fielder, so a
//! seeded rng stream replays exactly.

use log::debug;
use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{MIN_DIVISION_THRESHOLD, NUMERICAL_TOLERANCE};
use crate::fielder::{FielderState, MovementModel, SearchJitter};
use crate::ground_roll::GroundRollState;
use crate::trajectory::TrajectoryRecord;
use crate::SimError;

/// Search resolution (s).
const DEFAULT_TIME_STEP_S: f64 = 0.05;

/// Worst acceptable margin (s): a late dive, not a jog.
const DEFAULT_TOLERANCE_S: f64 = -0.1;

/// Grace period after an airborne ball lands during which it can still be
/// picked up where it sits (s).
const AIRBORNE_GRACE_S: f64 = 3.0;

/// Cap on how long a rolling ball is chased past its landing (s).
const ROLLING_CHASE_CAP_S: f64 = 6.0;

/// A ball above this height cannot be gloved.
const CATCHABLE_HEIGHT_FT: f64 = 9.0;

/// Stay-home penalty per foot of run on hard-hit grounders (s/ft).
const HARD_RUN_PENALTY_S_PER_FT: f64 = 0.004;

/// Charge-early score weight on weak grounders.
const WEAK_EARLY_WEIGHT_S: f64 = 0.5;

/// Maximum charge-bonus distance credit (ft).
const CHARGE_BONUS_CAP_FT: f64 = 8.0;

/// The ball's path as seen by the solver: a flight record sampled by
/// interpolation, or an analytic ground roll.
pub enum BallPath<'a> {
    Flight(&'a TrajectoryRecord),
    Rolling(&'a GroundRollState),
}

impl BallPath<'_> {
    pub fn is_rolling(&self) -> bool {
        matches!(self, BallPath::Rolling(_))
    }

    /// First searchable time.
    pub fn start_time(&self) -> f64 {
        match self {
            BallPath::Flight(_) => 0.0,
            BallPath::Rolling(roll) => roll.landing_time(),
        }
    }

    /// Last searchable time. Airborne balls get a pickup grace after
    /// landing; rolling balls are chased until they stop or the cap.
    pub fn horizon(&self) -> f64 {
        match self {
            BallPath::Flight(record) => record.flight_time_s() + AIRBORNE_GRACE_S,
            BallPath::Rolling(roll) => {
                roll.stop_time().min(roll.landing_time() + ROLLING_CHASE_CAP_S)
            }
        }
    }

    /// Ball position at absolute time t, clamped to the path's extent.
    pub fn position_at(&self, t: f64) -> Vector3<f64> {
        match self {
            BallPath::Flight(record) => record.state_at(t).pos,
            BallPath::Rolling(roll) => roll.position_at(t).0,
        }
    }
}

/// Hit hardness class, from exit velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitHardness {
    Weak,
    Medium,
    Hard,
}

impl HitHardness {
    pub fn from_exit_velo(exit_velo_mph: f64) -> Self {
        if exit_velo_mph > 90.0 {
            HitHardness::Hard
        } else if exit_velo_mph < 75.0 {
            HitHardness::Weak
        } else {
            HitHardness::Medium
        }
    }
}

/// One reachable point on the ball's path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InterceptionCandidate {
    /// Absolute time the ball is at the point (s).
    pub time: f64,
    pub point: Vector3<f64>,
    /// Seconds for the fielder to be standing there.
    pub fielder_time: f64,
    /// Ball time minus fielder time; negative means arriving late.
    pub margin: f64,
    /// Straight-line run from the fielder's starting spot (ft).
    pub run_distance_ft: f64,
    /// Movement is away from home (past the 120° cone).
    pub moving_backward: bool,
}

/// Time-stepped interception solver.
#[derive(Debug, Clone, Copy)]
pub struct InterceptionSolver {
    movement: MovementModel,
    time_step_s: f64,
    tolerance_s: f64,
}

impl Default for InterceptionSolver {
    fn default() -> Self {
        Self {
            movement: MovementModel::default(),
            time_step_s: DEFAULT_TIME_STEP_S,
            tolerance_s: DEFAULT_TOLERANCE_S,
        }
    }
}

impl InterceptionSolver {
    pub fn new(movement: MovementModel, time_step_s: f64, tolerance_s: f64) -> Result<Self, SimError> {
        if !(time_step_s > 0.0 && time_step_s.is_finite()) {
            return Err(SimError::InvalidConfig(
                "search time step must be positive".into(),
            ));
        }
        Ok(Self {
            movement,
            time_step_s,
            tolerance_s,
        })
    }

    pub fn tolerance_s(&self) -> f64 {
        self.tolerance_s
    }

    /// Best reachable candidate for one fielder, or None if every point on
    /// the path is out of reach (eligibility radius or margin tolerance).
    pub fn solve_for_fielder(
        &self,
        path: &BallPath,
        fielder: &FielderState,
        exit_velo_mph: f64,
        jitter: Option<&SearchJitter>,
    ) -> Result<Option<InterceptionCandidate>, SimError> {
        let start_pos = fielder.position()?;
        let hardness = HitHardness::from_exit_velo(exit_velo_mph);
        let radius = fielder.role.eligibility_radius_ft();

        let t_start = path.start_time();
        let t_end = path.horizon();

        let mut best: Option<(f64, InterceptionCandidate)> = None;
        let mut step = 0usize;
        loop {
            // Ball time is absolute from contact; the fielder has been
            // moving since contact even while the ball was still in the air
            let t = t_start + step as f64 * self.time_step_s;
            if t > t_end + NUMERICAL_TOLERANCE {
                break;
            }
            step += 1;

            let point = path.position_at(t);
            if !path.is_rolling() && point.z > CATCHABLE_HEIGHT_FT {
                continue;
            }

            let delta = Vector3::new(point.x - start_pos.x, point.y - start_pos.y, 0.0);
            let run_distance = delta.norm();
            // Hard eligibility pre-filter, before any scoring
            if run_distance > radius {
                continue;
            }

            let mut fielder_time = self.movement.time_to_reach(fielder, point, jitter)?;

            if path.is_rolling() && hardness == HitHardness::Weak {
                let bonus_ft = charge_bonus_ft(
                    exit_velo_mph,
                    run_distance,
                    fielder.attributes.sprint_speed_fps(),
                    start_pos,
                    point,
                );
                // Distance credit converted through the realized approach
                // speed over this run
                let reaction = (fielder.attributes.reaction_time_s()
                    + jitter.map(|j| j.reaction_delta_s).unwrap_or(0.0))
                .max(0.0);
                let run_time = fielder_time - reaction;
                if bonus_ft > 0.0 && run_time > 0.0 {
                    let approach_speed = run_distance / run_time;
                    fielder_time = (fielder_time - bonus_ft / approach_speed).max(0.0);
                }
            }

            let margin = t - fielder_time;
            if margin < self.tolerance_s {
                continue;
            }

            let candidate = InterceptionCandidate {
                time: t,
                point,
                fielder_time,
                margin,
                run_distance_ft: run_distance,
                moving_backward: is_backward(start_pos, point),
            };
            let score = self.score(&candidate, hardness, path, t_start, t_end);
            match &best {
                Some((best_score, _)) if *best_score >= score => {}
                _ => best = Some((score, candidate)),
            }
        }

        Ok(best.map(|(_, c)| c))
    }

    /// Search the whole roster. On ground balls an infielder with any
    /// acceptable candidate takes the play outright over an outfielder —
    /// an acceptable infield interception always precedes the outfield
    /// chase in time, so the rule can never discard a materially better
    /// outfield play. Within a group the better score wins, ties to the
    /// shorter run.
    pub fn solve(
        &self,
        path: &BallPath,
        roster: &[FielderState],
        exit_velo_mph: f64,
    ) -> Result<Option<(usize, InterceptionCandidate)>, SimError> {
        self.solve_inner(path, roster, exit_velo_mph, |_| None)
    }

    /// As `solve`, with per-fielder jitter drawn from the rng, one draw per
    /// fielder in roster order.
    pub fn solve_with_jitter<R: Rng + ?Sized>(
        &self,
        path: &BallPath,
        roster: &[FielderState],
        exit_velo_mph: f64,
        rng: &mut R,
    ) -> Result<Option<(usize, InterceptionCandidate)>, SimError> {
        let jitters: Vec<SearchJitter> =
            roster.iter().map(|_| SearchJitter::sample(rng)).collect();
        self.solve_inner(path, roster, exit_velo_mph, |i| Some(jitters[i]))
    }

    fn solve_inner(
        &self,
        path: &BallPath,
        roster: &[FielderState],
        exit_velo_mph: f64,
        jitter_for: impl Fn(usize) -> Option<SearchJitter>,
    ) -> Result<Option<(usize, InterceptionCandidate)>, SimError> {
        let hardness = HitHardness::from_exit_velo(exit_velo_mph);
        let mut best: Option<(usize, f64, InterceptionCandidate)> = None;

        for (idx, fielder) in roster.iter().enumerate() {
            let jitter = jitter_for(idx);
            let Some(candidate) =
                self.solve_for_fielder(path, fielder, exit_velo_mph, jitter.as_ref())?
            else {
                continue;
            };
            let score = self.score(
                &candidate,
                hardness,
                path,
                path.start_time(),
                path.horizon(),
            );

            let replace = match &best {
                None => true,
                Some((best_idx, best_score, best_cand)) => {
                    let best_infield = roster[*best_idx].role.is_infield();
                    let this_infield = fielder.role.is_infield();
                    if path.is_rolling() && best_infield != this_infield {
                        this_infield
                    } else if (score - best_score).abs() < 1e-9 {
                        candidate.fielder_time < best_cand.fielder_time
                    } else {
                        score > *best_score
                    }
                }
            };
            if replace {
                best = Some((idx, score, candidate));
            }
        }

        if let Some((idx, _, cand)) = &best {
            debug!(
                "interception: fielder {} takes it at t={:.2}s margin={:.2}s",
                idx, cand.time, cand.margin
            );
        }
        Ok(best.map(|(idx, _, cand)| (idx, cand)))
    }

    /// Candidate desirability. Airborne balls are pure max-margin. Ground
    /// balls fold in the hit hardness: hard hits punish leaving the spot,
    /// weak hits reward charging early, medium blends both at half weight.
    fn score(
        &self,
        candidate: &InterceptionCandidate,
        hardness: HitHardness,
        path: &BallPath,
        t_start: f64,
        t_end: f64,
    ) -> f64 {
        if !path.is_rolling() {
            return candidate.margin;
        }
        let span = (t_end - t_start).max(self.time_step_s);
        let earliness = (t_end - candidate.time).clamp(0.0, span) / span;
        match hardness {
            HitHardness::Hard => {
                candidate.margin - HARD_RUN_PENALTY_S_PER_FT * candidate.run_distance_ft
            }
            HitHardness::Weak => candidate.margin + WEAK_EARLY_WEIGHT_S * earliness,
            HitHardness::Medium => {
                candidate.margin
                    - 0.5 * HARD_RUN_PENALTY_S_PER_FT * candidate.run_distance_ft
                    + 0.5 * WEAK_EARLY_WEIGHT_S * earliness
            }
        }
    }
}

/// Distance credit (ft) for charging a weak grounder: scaled by how soft
/// the hit is, how far the charge runs, and the fielder's speed; capped,
/// and only granted when the move actually closes on home.
fn charge_bonus_ft(
    exit_velo_mph: f64,
    run_distance_ft: f64,
    sprint_speed_fps: f64,
    start: Vector3<f64>,
    target: Vector3<f64>,
) -> f64 {
    let target_r = (target.x * target.x + target.y * target.y).sqrt();
    let start_r = (start.x * start.x + start.y * start.y).sqrt();
    if target_r >= start_r {
        return 0.0;
    }
    let softness = ((75.0 - exit_velo_mph) / 75.0).clamp(0.0, 1.0);
    let reach = (run_distance_ft / 60.0).clamp(0.0, 1.0);
    let speed = (sprint_speed_fps / 27.0).clamp(0.5, 1.5);
    (CHARGE_BONUS_CAP_FT * softness * reach * speed).clamp(0.0, CHARGE_BONUS_CAP_FT)
}

fn is_backward(start: Vector3<f64>, target: Vector3<f64>) -> bool {
    let facing = Vector3::new(-start.x, -start.y, 0.0);
    let delta = Vector3::new(target.x - start.x, target.y - start.y, 0.0);
    let norms = facing.norm() * delta.norm();
    if norms < MIN_DIVISION_THRESHOLD {
        return false;
    }
    let angle = (facing.dot(&delta) / norms).clamp(-1.0, 1.0).acos().to_degrees();
    angle > 120.0
}
