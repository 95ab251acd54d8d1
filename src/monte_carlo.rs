//! Monte Carlo batch flight evaluation.
//!
//! Runs N flights with Normal perturbations on the launch parameters and
//! reduces the summaries to per-field statistics. Runs are independent and
//! evaluated in parallel; each run derives its own rng stream from the
//! base seed, so results are reproducible regardless of thread scheduling.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentState;
use crate::integrator::StepMode;
use crate::trajectory::{LaunchParams, TrajectorySimulator};
use crate::SimError;

/// Per-run seed stride (splitmix64 increment) keeping derived streams
/// decorrelated.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Standard deviations of the Normal perturbations applied per run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerturbationSpec {
    pub exit_velo_std_mph: f64,
    pub launch_angle_std_deg: f64,
    pub spray_angle_std_deg: f64,
    pub backspin_std_rpm: f64,
}

impl Default for PerturbationSpec {
    fn default() -> Self {
        Self {
            exit_velo_std_mph: 2.0,
            launch_angle_std_deg: 2.5,
            spray_angle_std_deg: 3.0,
            backspin_std_rpm: 150.0,
        }
    }
}

impl PerturbationSpec {
    fn validate(&self) -> Result<(), SimError> {
        let all = [
            self.exit_velo_std_mph,
            self.launch_angle_std_deg,
            self.spray_angle_std_deg,
            self.backspin_std_rpm,
        ];
        if all.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(SimError::InvalidConfig(
                "perturbation standard deviations must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Batch configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    pub num_runs: usize,
    pub seed: u64,
    pub perturbation: PerturbationSpec,
    pub step_mode: StepMode,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            num_runs: 1000,
            seed: 0,
            perturbation: PerturbationSpec::default(),
            step_mode: StepMode::Coarse,
        }
    }
}

/// Summary statistics for one output field across the batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FieldStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

impl FieldStats {
    fn from_values(values: &mut [f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            mean,
            std_dev: var.sqrt(),
            min: values[0],
            max: values[values.len() - 1],
            p10: percentile(values, 10.0),
            p50: percentile(values, 50.0),
            p90: percentile(values, 90.0),
        }
    }
}

/// Linear-interpolated percentile over a sorted slice.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + frac * (sorted[hi] - sorted[lo])
    }
}

/// Reduced batch output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MonteCarloResults {
    pub num_runs: usize,
    pub carry_distance_ft: FieldStats,
    pub flight_time_s: FieldStats,
    pub peak_height_ft: FieldStats,
    pub landing_spray_deg: FieldStats,
}

/// Run the batch: perturb, simulate in parallel, reduce.
pub fn run_flight_batch(
    simulator: &TrajectorySimulator,
    base: &LaunchParams,
    env: &EnvironmentState,
    config: &MonteCarloConfig,
) -> Result<MonteCarloResults, SimError> {
    if config.num_runs == 0 {
        return Err(SimError::InvalidConfig(
            "monte carlo batch needs at least one run".into(),
        ));
    }
    config.perturbation.validate()?;

    let summaries: Result<Vec<_>, SimError> = (0..config.num_runs)
        .into_par_iter()
        .map(|run| {
            let mut rng = ChaCha8Rng::seed_from_u64(
                config.seed.wrapping_add((run as u64).wrapping_mul(SEED_STRIDE)),
            );
            let params = perturb(base, &config.perturbation, &mut rng);
            let record = simulator.simulate_flight(&params, env, config.step_mode)?;
            Ok(record.summary())
        })
        .collect();
    let summaries = summaries?;

    let mut carry: Vec<f64> = summaries.iter().map(|s| s.carry_distance_ft).collect();
    let mut time: Vec<f64> = summaries.iter().map(|s| s.flight_time_s).collect();
    let mut peak: Vec<f64> = summaries.iter().map(|s| s.peak_height_ft).collect();
    let mut spray: Vec<f64> = summaries.iter().map(|s| s.landing_spray_angle_deg).collect();

    Ok(MonteCarloResults {
        num_runs: config.num_runs,
        carry_distance_ft: FieldStats::from_values(&mut carry),
        flight_time_s: FieldStats::from_values(&mut time),
        peak_height_ft: FieldStats::from_values(&mut peak),
        landing_spray_deg: FieldStats::from_values(&mut spray),
    })
}

fn perturb(base: &LaunchParams, spec: &PerturbationSpec, rng: &mut ChaCha8Rng) -> LaunchParams {
    // Zero std deviations are allowed; Normal::new only fails on negative
    // or non-finite std, which validate() already excluded
    let draw = |std: f64, rng: &mut ChaCha8Rng| -> f64 {
        if std == 0.0 {
            0.0
        } else {
            Normal::new(0.0, std).map(|d| d.sample(rng)).unwrap_or(0.0)
        }
    };
    LaunchParams {
        exit_velo_mph: (base.exit_velo_mph + draw(spec.exit_velo_std_mph, rng)).max(1.0),
        launch_angle_deg: (base.launch_angle_deg + draw(spec.launch_angle_std_deg, rng))
            .clamp(-89.0, 89.0),
        spray_angle_deg: base.spray_angle_deg + draw(spec.spray_angle_std_deg, rng),
        backspin_rpm: (base.backspin_rpm + draw(spec.backspin_std_rpm, rng)).max(0.0),
        sidespin_rpm: base.sidespin_rpm,
        contact_height_ft: base.contact_height_ft,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(config: &MonteCarloConfig) -> MonteCarloResults {
        run_flight_batch(
            &TrajectorySimulator::default(),
            &LaunchParams {
                exit_velo_mph: 100.0,
                launch_angle_deg: 28.0,
                backspin_rpm: 1800.0,
                ..LaunchParams::default()
            },
            &EnvironmentState::typical(),
            config,
        )
        .unwrap()
    }

    #[test]
    fn test_batch_deterministic_per_seed() {
        let config = MonteCarloConfig {
            num_runs: 64,
            seed: 123,
            ..MonteCarloConfig::default()
        };
        let a = batch(&config);
        let b = batch(&config);
        assert_eq!(a.carry_distance_ft.mean, b.carry_distance_ft.mean);
        assert_eq!(a.flight_time_s.p90, b.flight_time_s.p90);
    }

    #[test]
    fn test_stats_bracket_the_reference_flight() {
        let config = MonteCarloConfig {
            num_runs: 200,
            seed: 5,
            ..MonteCarloConfig::default()
        };
        let r = batch(&config);
        // Mean carry near the unperturbed ~400 ft reference
        assert!(r.carry_distance_ft.mean > 370.0 && r.carry_distance_ft.mean < 430.0);
        assert!(r.carry_distance_ft.min <= r.carry_distance_ft.p10);
        assert!(r.carry_distance_ft.p10 <= r.carry_distance_ft.p50);
        assert!(r.carry_distance_ft.p50 <= r.carry_distance_ft.p90);
        assert!(r.carry_distance_ft.p90 <= r.carry_distance_ft.max);
        assert!(r.carry_distance_ft.std_dev > 0.0);
    }

    #[test]
    fn test_zero_std_collapses_spread() {
        let config = MonteCarloConfig {
            num_runs: 16,
            seed: 1,
            perturbation: PerturbationSpec {
                exit_velo_std_mph: 0.0,
                launch_angle_std_deg: 0.0,
                spray_angle_std_deg: 0.0,
                backspin_std_rpm: 0.0,
            },
            ..MonteCarloConfig::default()
        };
        let r = batch(&config);
        assert!(r.carry_distance_ft.std_dev < 1e-9);
        assert_eq!(r.carry_distance_ft.min, r.carry_distance_ft.max);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let config = MonteCarloConfig {
            num_runs: 0,
            ..MonteCarloConfig::default()
        };
        assert!(run_flight_batch(
            &TrajectorySimulator::default(),
            &LaunchParams::default(),
            &EnvironmentState::typical(),
            &config,
        )
        .is_err());
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 50.0), 3.0);
        assert_eq!(percentile(&sorted, 100.0), 5.0);
        assert!((percentile(&sorted, 25.0) - 2.0).abs() < 1e-12);
    }
}
