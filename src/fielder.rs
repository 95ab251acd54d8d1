//! Fielders: physical attributes, positioning state, and the movement-time
//! model.
//!
//! Attributes carry physical units only (ft/s, seconds, mph) — whatever
//! rating scale produced them is the caller's business. The movement model
//! is a banded piecewise estimate, not a sprint integrator: three distance
//! bands at distinct fractions of max speed, direction buckets relative to
//! facing home, route efficiency inflating the path, and a first-step
//! burst credit shaving it.

use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::SimError;

/// Distance band edges (ft). Fractions blend linearly across a window
/// around each edge so time-to-reach stays continuous in distance.
const SHORT_BAND_FT: f64 = 30.0;
const LONG_BAND_FT: f64 = 60.0;
const BAND_BLEND_HALF_FT: f64 = 5.0;

/// Direction bucket edges relative to facing-home (deg).
const FORWARD_CONE_DEG: f64 = 60.0;
const BACKWARD_CONE_DEG: f64 = 120.0;

/// Base backward-movement speed fraction, scaled by the player's modifier.
const BACKWARD_BASE_FRACTION: f64 = 0.75;

/// Fixed lateral-movement speed fraction.
const LATERAL_FRACTION: f64 = 0.90;

/// Below this distance the fielder is already there.
const ALREADY_THERE_FT: f64 = 1.0;

/// Physical fielding attributes. All units are physical; no rating scale
/// is assumed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FielderAttributes {
    sprint_speed_fps: f64,
    reaction_time_s: f64,
    route_efficiency: f64,
    arm_strength_mph: f64,
    hands_rating: f64,
    forward_speed_mod: f64,
    backward_speed_mod: f64,
    burst_credit_ft: f64,
}

impl FielderAttributes {
    /// Validated constructor. Route efficiency must sit in [0.85, 0.99],
    /// hands in [0, 1]; speeds and reaction must be plausible for a human.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sprint_speed_fps: f64,
        reaction_time_s: f64,
        route_efficiency: f64,
        arm_strength_mph: f64,
        hands_rating: f64,
        forward_speed_mod: f64,
        backward_speed_mod: f64,
        burst_credit_ft: f64,
    ) -> Result<Self, SimError> {
        if !(10.0..=40.0).contains(&sprint_speed_fps) {
            return Err(SimError::InvalidConfig(
                "sprint speed must be within 10-40 ft/s".into(),
            ));
        }
        if !(0.0..=1.5).contains(&reaction_time_s) {
            return Err(SimError::InvalidConfig(
                "reaction time must be within 0-1.5 s".into(),
            ));
        }
        if !(0.85..=0.99).contains(&route_efficiency) {
            return Err(SimError::InvalidConfig(
                "route efficiency must be within 0.85-0.99".into(),
            ));
        }
        if !(0.0..=1.0).contains(&hands_rating) {
            return Err(SimError::InvalidConfig(
                "hands rating must be within 0-1".into(),
            ));
        }
        if forward_speed_mod <= 0.0 || backward_speed_mod <= 0.0 {
            return Err(SimError::InvalidConfig(
                "speed modifiers must be positive".into(),
            ));
        }
        if !arm_strength_mph.is_finite() || arm_strength_mph < 0.0 {
            return Err(SimError::InvalidConfig(
                "arm strength must be non-negative".into(),
            ));
        }
        Ok(Self {
            sprint_speed_fps,
            reaction_time_s,
            route_efficiency,
            arm_strength_mph,
            hands_rating,
            forward_speed_mod,
            backward_speed_mod,
            burst_credit_ft,
        })
    }

    /// League-average defender.
    pub fn average() -> Self {
        Self {
            sprint_speed_fps: 27.0,
            reaction_time_s: 0.35,
            route_efficiency: 0.92,
            arm_strength_mph: 85.0,
            hands_rating: 0.92,
            forward_speed_mod: 1.0,
            backward_speed_mod: 1.0,
            burst_credit_ft: 2.0,
        }
    }

    pub fn sprint_speed_fps(&self) -> f64 {
        self.sprint_speed_fps
    }

    pub fn reaction_time_s(&self) -> f64 {
        self.reaction_time_s
    }

    pub fn route_efficiency(&self) -> f64 {
        self.route_efficiency
    }

    pub fn arm_strength_mph(&self) -> f64 {
        self.arm_strength_mph
    }

    pub fn hands_rating(&self) -> f64 {
        self.hands_rating
    }

    pub fn forward_speed_mod(&self) -> f64 {
        self.forward_speed_mod
    }

    pub fn backward_speed_mod(&self) -> f64 {
        self.backward_speed_mod
    }

    pub fn burst_credit_ft(&self) -> f64 {
        self.burst_credit_ft
    }
}

impl Default for FielderAttributes {
    fn default() -> Self {
        Self::average()
    }
}

/// Defensive position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Pitcher,
    Catcher,
    FirstBase,
    SecondBase,
    ThirdBase,
    Shortstop,
    LeftField,
    CenterField,
    RightField,
}

impl Role {
    /// Hard eligibility radius (ft) from the fielder's starting spot;
    /// candidates beyond it are filtered before scoring. Battery roles are
    /// tightly capped so they never chase balls into the infielders' range.
    pub fn eligibility_radius_ft(&self) -> f64 {
        match self {
            Role::Pitcher => 40.0,
            Role::Catcher => 60.0,
            Role::FirstBase | Role::ThirdBase => 110.0,
            Role::SecondBase | Role::Shortstop => 130.0,
            Role::LeftField | Role::RightField => 300.0,
            Role::CenterField => 330.0,
        }
    }

    pub fn is_infield(&self) -> bool {
        matches!(
            self,
            Role::Pitcher
                | Role::Catcher
                | Role::FirstBase
                | Role::SecondBase
                | Role::ThirdBase
                | Role::Shortstop
        )
    }

    pub fn is_outfield(&self) -> bool {
        !self.is_infield()
    }
}

/// A fielder on the field: role, attributes, and where they are standing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FielderState {
    pub role: Role,
    pub attributes: FielderAttributes,
    position: Option<Vector3<f64>>,
}

impl FielderState {
    pub fn new(role: Role, attributes: FielderAttributes) -> Self {
        Self {
            role,
            attributes,
            position: None,
        }
    }

    pub fn at(role: Role, attributes: FielderAttributes, position: Vector3<f64>) -> Self {
        Self {
            role,
            attributes,
            position: Some(position),
        }
    }

    pub fn set_position(&mut self, position: Vector3<f64>) {
        self.position = Some(position);
    }

    /// The fielder's current spot; asking before positioning is a caller
    /// bug and fails loudly.
    pub fn position(&self) -> Result<Vector3<f64>, SimError> {
        self.position
            .ok_or_else(|| SimError::UnsetPosition(self.role))
    }
}

/// One-draw-per-search stochastic perturbation of reaction and route.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchJitter {
    pub reaction_delta_s: f64,
    pub route_delta: f64,
}

impl SearchJitter {
    /// Sample a jitter once for a fielder; reused for every candidate time
    /// in the same search so the search stays internally consistent.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        // Unwraps are safe: the std deviations are positive constants.
        let reaction = Normal::new(0.0, 0.025).unwrap();
        let route = Normal::new(0.0, 0.01).unwrap();
        Self {
            reaction_delta_s: reaction.sample(rng),
            route_delta: route.sample(rng),
        }
    }
}

/// Banded movement-time model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MovementModel {
    short_fraction: f64,
    medium_fraction: f64,
    long_fraction: f64,
}

impl Default for MovementModel {
    fn default() -> Self {
        // Short bursts never reach top speed; long runs nearly do
        Self {
            short_fraction: 0.70,
            medium_fraction: 0.85,
            long_fraction: 0.95,
        }
    }
}

impl MovementModel {
    /// Seconds for the fielder to reach `target` from their current spot.
    ///
    /// Reaction time plus banded run time. Sub-foot distances cost nothing
    /// at all — the fielder is already standing there, reaction included.
    pub fn time_to_reach(
        &self,
        fielder: &FielderState,
        target: Vector3<f64>,
        jitter: Option<&SearchJitter>,
    ) -> Result<f64, SimError> {
        let start = fielder.position()?;
        let delta = Vector3::new(target.x - start.x, target.y - start.y, 0.0);
        let distance = delta.norm();
        if distance < ALREADY_THERE_FT {
            return Ok(0.0);
        }

        let attrs = &fielder.attributes;
        let jit = jitter.copied().unwrap_or_default();

        // Direction relative to facing home plate (the origin)
        let facing = Vector3::new(-start.x, -start.y, 0.0);
        let direction_fraction = if facing.norm() < ALREADY_THERE_FT {
            // Standing on the plate: no meaningful facing, treat as forward
            attrs.forward_speed_mod()
        } else {
            let cos = delta.dot(&facing) / (delta.norm() * facing.norm());
            let angle_deg = cos.clamp(-1.0, 1.0).acos().to_degrees();
            if angle_deg < FORWARD_CONE_DEG {
                attrs.forward_speed_mod()
            } else if angle_deg > BACKWARD_CONE_DEG {
                BACKWARD_BASE_FRACTION * attrs.backward_speed_mod()
            } else {
                LATERAL_FRACTION
            }
        };

        let speed_fraction = self.speed_fraction(distance);

        // Route efficiency and burst credit only matter once the fielder
        // actually has to run a route; they fade in across the short-band
        // blend window
        let route = (attrs.route_efficiency() + jit.route_delta).clamp(0.80, 1.0);
        let routed = (distance / route - attrs.burst_credit_ft()).max(ALREADY_THERE_FT);
        let w = ((distance - (SHORT_BAND_FT - BAND_BLEND_HALF_FT))
            / (2.0 * BAND_BLEND_HALF_FT))
            .clamp(0.0, 1.0);
        let effective_distance = distance + w * (routed - distance);

        let speed = attrs.sprint_speed_fps() * speed_fraction * direction_fraction;
        let reaction = (attrs.reaction_time_s() + jit.reaction_delta_s).max(0.0);
        Ok(reaction + effective_distance / speed)
    }

    /// Fraction of max speed for a run of the given length, blended
    /// linearly across the band edges.
    fn speed_fraction(&self, distance: f64) -> f64 {
        let short_lo = SHORT_BAND_FT - BAND_BLEND_HALF_FT;
        let short_hi = SHORT_BAND_FT + BAND_BLEND_HALF_FT;
        let long_lo = LONG_BAND_FT - BAND_BLEND_HALF_FT;
        let long_hi = LONG_BAND_FT + BAND_BLEND_HALF_FT;

        if distance <= short_lo {
            self.short_fraction
        } else if distance < short_hi {
            let t = (distance - short_lo) / (short_hi - short_lo);
            self.short_fraction + t * (self.medium_fraction - self.short_fraction)
        } else if distance <= long_lo {
            self.medium_fraction
        } else if distance < long_hi {
            let t = (distance - long_lo) / (long_hi - long_lo);
            self.medium_fraction + t * (self.long_fraction - self.medium_fraction)
        } else {
            self.long_fraction
        }
    }
}

/// Movement time under the default model with no jitter. Exposed standalone
/// for diagnostics.
pub fn time_to_position(fielder: &FielderState, target: Vector3<f64>) -> Result<f64, SimError> {
    MovementModel::default().time_to_reach(fielder, target, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn shortstop_at(pos: Vector3<f64>) -> FielderState {
        FielderState::at(Role::Shortstop, FielderAttributes::average(), pos)
    }

    #[test]
    fn test_already_there_is_free() {
        let f = shortstop_at(Vector3::new(130.0, 40.0, 0.0));
        let t = time_to_position(&f, Vector3::new(130.3, 40.2, 0.0)).unwrap();
        assert_eq!(t, 0.0);
    }

    #[test]
    fn test_unset_position_fails() {
        let f = FielderState::new(Role::Shortstop, FielderAttributes::average());
        assert!(time_to_position(&f, Vector3::zeros()).is_err());
    }

    #[test]
    fn test_forward_faster_than_backward() {
        let f = shortstop_at(Vector3::new(130.0, 40.0, 0.0));
        // 50 ft toward home vs 50 ft away from home
        let toward = Vector3::new(130.0, 40.0, 0.0)
            + Vector3::new(-130.0, -40.0, 0.0).normalize() * 50.0;
        let away = Vector3::new(130.0, 40.0, 0.0)
            + Vector3::new(130.0, 40.0, 0.0).normalize() * 50.0;
        let t_fwd = time_to_position(&f, toward).unwrap();
        let t_back = time_to_position(&f, away).unwrap();
        assert!(t_fwd < t_back);
    }

    #[test]
    fn test_longer_run_takes_longer() {
        let f = shortstop_at(Vector3::new(130.0, 40.0, 0.0));
        let near = time_to_position(&f, Vector3::new(110.0, 40.0, 0.0)).unwrap();
        let far = time_to_position(&f, Vector3::new(60.0, 40.0, 0.0)).unwrap();
        assert!(far > near);
        assert!(near > 0.0);
    }

    #[test]
    fn test_time_monotone_across_band_edges() {
        // Straight back from home keeps the direction bucket fixed, so
        // time must never dip as the run gets longer, band edges included
        let f = shortstop_at(Vector3::new(100.0, 0.0, 0.0));
        let mut prev = 0.0;
        let mut d = 2.0;
        while d <= 120.0 {
            let t = time_to_position(&f, Vector3::new(100.0 + d, 0.0, 0.0)).unwrap();
            assert!(t >= prev, "time dipped at {d} ft: {t} < {prev}");
            prev = t;
            d += 0.5;
        }
    }

    #[test]
    fn test_better_route_is_faster() {
        let elite = FielderAttributes::new(27.0, 0.35, 0.99, 85.0, 0.92, 1.0, 1.0, 2.0).unwrap();
        let poor = FielderAttributes::new(27.0, 0.35, 0.85, 85.0, 0.92, 1.0, 1.0, 2.0).unwrap();

        let pos = Vector3::new(250.0, 0.0, 0.0);
        let target = Vector3::new(330.0, 30.0, 0.0);
        let t_elite = time_to_position(&FielderState::at(Role::CenterField, elite, pos), target)
            .unwrap();
        let t_poor =
            time_to_position(&FielderState::at(Role::CenterField, poor, pos), target).unwrap();
        assert!(t_elite < t_poor);
    }

    #[test]
    fn test_attribute_validation() {
        assert!(FielderAttributes::new(27.0, 0.35, 0.5, 85.0, 0.9, 1.0, 1.0, 2.0).is_err());
        assert!(FielderAttributes::new(60.0, 0.35, 0.92, 85.0, 0.9, 1.0, 1.0, 2.0).is_err());
        assert!(FielderAttributes::new(27.0, 0.35, 0.92, 85.0, 1.4, 1.0, 1.0, 2.0).is_err());
        assert!(FielderAttributes::new(27.0, 0.35, 0.92, 85.0, 0.9, 1.0, 1.0, 2.0).is_ok());
    }

    #[test]
    fn test_jitter_deterministic_per_seed() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        let ja = SearchJitter::sample(&mut a);
        let jb = SearchJitter::sample(&mut b);
        assert_eq!(ja.reaction_delta_s, jb.reaction_delta_s);
        assert_eq!(ja.route_delta, jb.route_delta);
    }

    #[test]
    fn test_role_eligibility() {
        assert!(Role::Pitcher.eligibility_radius_ft() < Role::Catcher.eligibility_radius_ft());
        assert!(Role::Catcher.eligibility_radius_ft() < Role::Shortstop.eligibility_radius_ft());
        assert!(Role::Shortstop.is_infield());
        assert!(Role::CenterField.is_outfield());
    }
}
