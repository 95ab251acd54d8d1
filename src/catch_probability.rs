//! Catch probability from interception margin, with skill adjustments and
//! the residual misplay draw.
//!
//! The core is a piecewise band table on margin, validated monotone at
//! construction the same way the drag table is. Skill and situation enter
//! afterward in a fixed order: multiplicative adjustments first (hands,
//! distance run, backward movement), then additive bonuses, then a final
//! clamp. The misplay draw is not part of the probability — it is an
//! independent event the play resolver rolls separately.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::fielder::FielderAttributes;
use crate::interception::InterceptionCandidate;
use crate::SimError;

/// Below this margin no catch is possible, exactly.
const DEFAULT_CUTOFF_S: f64 = -1.0;

/// Hands multiplier range: a 0-rated glove costs 15%, a perfect one 3%.
const HANDS_MULT_FLOOR: f64 = 0.85;
const HANDS_MULT_CEIL: f64 = 0.97;

/// Flat penalty for catches made moving away from home.
const BACKWARD_MULT: f64 = 0.85;

/// Chance a routine play is misplayed anyway.
const MISPLAY_RATE: f64 = 0.015;

/// Probability retained when the misplay draw hits.
const MISPLAY_RETENTION: f64 = 0.25;

const FIELDING_ERROR_CAP: f64 = 0.20;
const THROWING_ERROR_CAP: f64 = 0.15;

/// Piecewise margin-to-probability table. Each entry is the band's lower
/// margin bound (s) and its probability; entries are sorted by descending
/// bound and probabilities must be non-increasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchBands {
    bands: Vec<(f64, f64)>,
    cutoff_s: f64,
}

impl CatchBands {
    pub fn new(bands: Vec<(f64, f64)>, cutoff_s: f64) -> Result<Self, SimError> {
        if bands.len() < 8 {
            return Err(SimError::InvalidConfig(
                "catch band table needs at least 8 bands".into(),
            ));
        }
        for pair in bands.windows(2) {
            if pair[1].0 >= pair[0].0 {
                return Err(SimError::InvalidConfig(
                    "catch bands must be sorted by descending margin".into(),
                ));
            }
            if pair[1].1 > pair[0].1 {
                return Err(SimError::InvalidConfig(
                    "catch probability must be non-increasing as margin shrinks".into(),
                ));
            }
        }
        let last = bands[bands.len() - 1];
        if !(0.0..=1.0).contains(&last.1) || !(0.0..=1.0).contains(&bands[0].1) {
            return Err(SimError::InvalidConfig(
                "catch probabilities must be within [0, 1]".into(),
            ));
        }
        if cutoff_s > last.0 {
            return Err(SimError::InvalidConfig(
                "cutoff must not sit above the lowest band bound".into(),
            ));
        }
        Ok(Self { bands, cutoff_s })
    }

    /// Band probability for a margin; exactly 0 below the cutoff.
    pub fn base_probability(&self, margin_s: f64) -> f64 {
        if margin_s < self.cutoff_s {
            return 0.0;
        }
        for &(lower, p) in &self.bands {
            if margin_s >= lower {
                return p;
            }
        }
        // Between the cutoff and the lowest band bound
        self.bands[self.bands.len() - 1].1
    }

    pub fn cutoff_s(&self) -> f64 {
        self.cutoff_s
    }
}

impl Default for CatchBands {
    fn default() -> Self {
        // Ten bands, 0.95 camped-under-it down to 0.02 full-layout dive
        Self {
            bands: vec![
                (2.0, 0.95),
                (1.5, 0.92),
                (1.0, 0.88),
                (0.5, 0.80),
                (0.25, 0.68),
                (0.0, 0.55),
                (-0.25, 0.35),
                (-0.5, 0.18),
                (-0.75, 0.08),
                (-1.0, 0.02),
            ],
            cutoff_s: DEFAULT_CUTOFF_S,
        }
    }
}

/// Catch probability model: bands plus the ordered adjustment pipeline.
#[derive(Debug, Clone, Default)]
pub struct CatchProbabilityModel {
    bands: CatchBands,
}

impl CatchProbabilityModel {
    pub fn new(bands: CatchBands) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &CatchBands {
        &self.bands
    }

    /// Probability of converting the candidate into an out. Pure: the
    /// misplay and error draws live elsewhere.
    ///
    /// Order is fixed: band lookup, hands multiplier, distance-run
    /// multiplier, backward multiplier, then additive difficult/elite
    /// bonuses, then clamp to [0, 1].
    pub fn probability(
        &self,
        candidate: &InterceptionCandidate,
        attrs: &FielderAttributes,
    ) -> f64 {
        let mut p = self.bands.base_probability(candidate.margin);
        if p == 0.0 {
            return 0.0;
        }

        p *= HANDS_MULT_FLOOR + (HANDS_MULT_CEIL - HANDS_MULT_FLOOR) * attrs.hands_rating();
        p *= distance_run_multiplier(candidate.run_distance_ft);
        if candidate.moving_backward {
            p *= BACKWARD_MULT;
        }

        // Skill bonuses only matter on plays that are actually hard
        if (-0.5..0.25).contains(&candidate.margin) {
            p += 0.05 * attrs.hands_rating();
        }
        if candidate.margin < -0.5 {
            let elite = ((attrs.sprint_speed_fps() - 27.0) / 6.0).clamp(0.0, 1.0);
            p += 0.06 * elite;
        }

        p.clamp(0.0, 1.0)
    }

    /// Roll the residual misplay: a small independent chance that even a
    /// routine play collapses into a degraded range.
    pub fn apply_misplay<R: Rng + ?Sized>(&self, probability: f64, rng: &mut R) -> f64 {
        if probability > 0.0 && rng.gen::<f64>() < MISPLAY_RATE {
            probability * MISPLAY_RETENTION
        } else {
            probability
        }
    }

    /// Probability of booting a ball already reached (bobble, in-glove
    /// drop). Capped at 0.20.
    pub fn fielding_error_probability(
        &self,
        candidate: &InterceptionCandidate,
        attrs: &FielderAttributes,
    ) -> f64 {
        let pressure = (-candidate.margin).clamp(0.0, 1.0);
        let p = 0.01
            + 0.06 * (1.0 - attrs.hands_rating())
            + 0.08 * pressure
            + 0.02 * (candidate.run_distance_ft / 90.0).clamp(0.0, 1.0);
        p.min(FIELDING_ERROR_CAP)
    }

    /// Probability the ensuing throw sails. Capped at 0.15.
    pub fn throwing_error_probability(
        &self,
        candidate: &InterceptionCandidate,
        attrs: &FielderAttributes,
        throw_distance_ft: f64,
    ) -> f64 {
        let pressure = (-candidate.margin).clamp(0.0, 1.0);
        let arm = (attrs.arm_strength_mph() / 105.0).clamp(0.0, 1.0);
        let p = 0.008
            + 0.05 * (1.0 - arm)
            + 0.04 * pressure
            + 0.03 * (throw_distance_ft / 250.0).clamp(0.0, 1.0);
        p.min(THROWING_ERROR_CAP)
    }
}

fn distance_run_multiplier(run_distance_ft: f64) -> f64 {
    if run_distance_ft <= 30.0 {
        1.0
    } else if run_distance_ft <= 60.0 {
        0.97
    } else if run_distance_ft <= 90.0 {
        0.93
    } else {
        0.88
    }
}
