//! Aerodynamic force model: drag and Magnus lift on a spinning ball.
//!
//! Both forces follow the standard quadratic law F = ½·C·ρ·A·|v|². The drag
//! coefficient is a two-regime function of speed (the drag crisis: a seam-
//! tripped boundary layer cuts Cd sharply above roughly 70 mph) with a
//! linear transition band between the regimes. The lift coefficient grows
//! linearly with spin rate up to a saturation rpm and then with a reduced
//! slope — the kink is two straight segments meeting at the knee, not a
//! smoothed curve, and it is what separates a 380 ft fly from a 400 ft one.
//!
//! Coefficient tables are explicit immutable objects handed to the model at
//! construction; the lazily built default is calibrated against the
//! 100 mph / 28° / 1800 rpm ≈ 400 ft reference carry.

use nalgebra::Vector3;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::constants::{BALL_AREA_FT2, BALL_MASS_SLUG, MIN_VELOCITY_THRESHOLD};
use crate::SimError;

/// Two-regime drag coefficient table with a linear transition band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DragCurve {
    low_speed_cd: f64,
    high_speed_cd: f64,
    transition_start_fps: f64,
    transition_end_fps: f64,
}

/// Default drag curve for a regulation ball.
///
/// Cd 0.50 below 45 ft/s dropping to 0.35 above 105 ft/s. The breakpoints
/// are calibration data, not physics; see `DragCurve::new` to supply a
/// retuned table.
static DEFAULT_DRAG_CURVE: Lazy<DragCurve> = Lazy::new(|| DragCurve {
    low_speed_cd: 0.50,
    high_speed_cd: 0.35,
    transition_start_fps: 45.0,
    transition_end_fps: 105.0,
});

impl DragCurve {
    /// Build a validated drag table.
    ///
    /// Requires positive coefficients, `low_speed_cd >= high_speed_cd`
    /// (drag falls through the crisis), and an increasing transition band.
    pub fn new(
        low_speed_cd: f64,
        high_speed_cd: f64,
        transition_start_fps: f64,
        transition_end_fps: f64,
    ) -> Result<Self, SimError> {
        if low_speed_cd <= 0.0 || high_speed_cd <= 0.0 {
            return Err(SimError::InvalidConfig(
                "drag coefficients must be positive".into(),
            ));
        }
        if low_speed_cd < high_speed_cd {
            return Err(SimError::InvalidConfig(
                "low-speed Cd must not be below high-speed Cd".into(),
            ));
        }
        if transition_end_fps <= transition_start_fps || transition_start_fps < 0.0 {
            return Err(SimError::InvalidConfig(
                "drag transition band must be an increasing speed range".into(),
            ));
        }
        Ok(Self {
            low_speed_cd,
            high_speed_cd,
            transition_start_fps,
            transition_end_fps,
        })
    }

    /// Drag coefficient at a given airspeed (ft/s).
    pub fn cd(&self, speed_fps: f64) -> f64 {
        if speed_fps <= self.transition_start_fps {
            self.low_speed_cd
        } else if speed_fps >= self.transition_end_fps {
            self.high_speed_cd
        } else {
            let t = (speed_fps - self.transition_start_fps)
                / (self.transition_end_fps - self.transition_start_fps);
            self.low_speed_cd + t * (self.high_speed_cd - self.low_speed_cd)
        }
    }
}

impl Default for DragCurve {
    fn default() -> Self {
        *DEFAULT_DRAG_CURVE
    }
}

/// Spin-dependent lift coefficient with a saturation kink.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LiftModel {
    slope_per_rpm: f64,
    saturation_rpm: f64,
    post_saturation_slope: f64,
}

impl LiftModel {
    pub fn new(
        slope_per_rpm: f64,
        saturation_rpm: f64,
        post_saturation_slope: f64,
    ) -> Result<Self, SimError> {
        if slope_per_rpm <= 0.0 || saturation_rpm <= 0.0 {
            return Err(SimError::InvalidConfig(
                "lift slope and saturation rpm must be positive".into(),
            ));
        }
        if post_saturation_slope < 0.0 || post_saturation_slope > slope_per_rpm {
            return Err(SimError::InvalidConfig(
                "post-saturation lift slope must be in [0, pre-saturation slope]".into(),
            ));
        }
        Ok(Self {
            slope_per_rpm,
            saturation_rpm,
            post_saturation_slope,
        })
    }

    /// Lift coefficient at a given spin rate.
    ///
    /// Linear below the saturation rpm, reduced slope beyond it. The two
    /// segments meet exactly at the knee.
    pub fn cl(&self, spin_rpm: f64) -> f64 {
        let rpm = spin_rpm.max(0.0);
        if rpm <= self.saturation_rpm {
            self.slope_per_rpm * rpm
        } else {
            self.slope_per_rpm * self.saturation_rpm
                + self.post_saturation_slope * (rpm - self.saturation_rpm)
        }
    }

    pub fn saturation_rpm(&self) -> f64 {
        self.saturation_rpm
    }
}

impl Default for LiftModel {
    fn default() -> Self {
        // Calibrated with the default drag curve against the reference carry
        Self {
            slope_per_rpm: 1.65e-4,
            saturation_rpm: 2200.0,
            post_saturation_slope: 0.4e-4,
        }
    }
}

/// Drag and lift force vectors (lbf; consistent with slug/ft/s units).
#[derive(Debug, Clone, Copy)]
pub struct AeroForce {
    pub drag: Vector3<f64>,
    pub lift: Vector3<f64>,
}

impl AeroForce {
    pub fn zero() -> AeroForce {
        AeroForce {
            drag: Vector3::zeros(),
            lift: Vector3::zeros(),
        }
    }

    pub fn total(&self) -> Vector3<f64> {
        self.drag + self.lift
    }
}

/// Aerodynamic model combining a drag table and a lift model.
#[derive(Debug, Clone, Copy, Default)]
pub struct AeroModel {
    drag: DragCurve,
    lift: LiftModel,
}

impl AeroModel {
    pub fn new(drag: DragCurve, lift: LiftModel) -> Self {
        Self { drag, lift }
    }

    pub fn drag_curve(&self) -> &DragCurve {
        &self.drag
    }

    pub fn lift_model(&self) -> &LiftModel {
        &self.lift
    }

    /// Drag and Magnus force on the ball.
    ///
    /// Drag acts opposite the velocity; lift acts along v̂ × ŝ where ŝ is
    /// the spin axis. Near-zero velocity, spin rate, or axis magnitude all
    /// yield zero force vectors rather than a division blow-up.
    pub fn force(
        &self,
        velocity_fps: Vector3<f64>,
        spin_axis: Vector3<f64>,
        spin_rpm: f64,
        air_density_slug_ft3: f64,
    ) -> AeroForce {
        let speed = velocity_fps.norm();
        if speed < MIN_VELOCITY_THRESHOLD {
            return AeroForce::zero();
        }

        let dynamic = 0.5 * air_density_slug_ft3 * BALL_AREA_FT2 * speed * speed;
        let velocity_unit = velocity_fps / speed;

        let drag = -dynamic * self.drag.cd(speed) * velocity_unit;

        let axis_norm = spin_axis.norm();
        let lift = if spin_rpm.abs() < MIN_VELOCITY_THRESHOLD
            || axis_norm < MIN_VELOCITY_THRESHOLD
        {
            Vector3::zeros()
        } else {
            let lift_direction = velocity_unit.cross(&(spin_axis / axis_norm));
            dynamic * self.lift.cl(spin_rpm.abs()) * lift_direction
        };

        AeroForce { drag, lift }
    }

    /// Aerodynamic acceleration (force over ball mass), gravity excluded.
    pub fn acceleration(
        &self,
        velocity_fps: Vector3<f64>,
        spin_axis: Vector3<f64>,
        spin_rpm: f64,
        air_density_slug_ft3: f64,
    ) -> Vector3<f64> {
        self.force(velocity_fps, spin_axis, spin_rpm, air_density_slug_ft3)
            .total()
            / BALL_MASS_SLUG
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STANDARD_AIR_DENSITY_SLUG_FT3;

    #[test]
    fn test_drag_curve_regimes() {
        let curve = DragCurve::default();
        assert_eq!(curve.cd(20.0), 0.50);
        assert_eq!(curve.cd(150.0), 0.35);
        // Midpoint of the transition band
        let mid = curve.cd(75.0);
        assert!(mid > 0.35 && mid < 0.50);
        assert!((mid - 0.425).abs() < 1e-9);
    }

    #[test]
    fn test_drag_curve_validation() {
        assert!(DragCurve::new(0.3, 0.5, 45.0, 105.0).is_err());
        assert!(DragCurve::new(0.5, 0.35, 105.0, 45.0).is_err());
        assert!(DragCurve::new(-0.5, 0.35, 45.0, 105.0).is_err());
    }

    #[test]
    fn test_lift_kink_exact() {
        let lift = LiftModel::default();
        let sat = lift.saturation_rpm();
        let below = lift.cl(sat - 1.0);
        let at = lift.cl(sat);
        let above = lift.cl(sat + 1.0);
        // Continuous at the knee
        assert!((at - below) > 0.0);
        assert!((at - below) - (above - at) > 0.0);
        // Slope above the knee is the reduced one, exactly
        assert!(((above - at) - 0.4e-4).abs() < 1e-12);
        assert!(((at - below) - 1.65e-4).abs() < 1e-12);
    }

    #[test]
    fn test_lift_monotone_below_saturation() {
        let lift = LiftModel::default();
        assert!(lift.cl(1000.0) < lift.cl(1500.0));
        assert!(lift.cl(1500.0) < lift.cl(2000.0));
        // Still increasing past the kink, just slower
        assert!(lift.cl(2500.0) < lift.cl(3000.0));
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let model = AeroModel::default();
        let v = Vector3::new(120.0, 0.0, 30.0);
        let force = model.force(v, Vector3::zeros(), 0.0, STANDARD_AIR_DENSITY_SLUG_FT3);
        assert!(force.drag.dot(&v) < 0.0);
        assert_eq!(force.lift.norm(), 0.0);
    }

    #[test]
    fn test_backspin_lifts_up() {
        let model = AeroModel::default();
        // Ball moving +x, backspin axis +y: lift = x̂ × ŷ = ẑ (up)
        let v = Vector3::new(140.0, 0.0, 0.0);
        let axis = Vector3::new(0.0, 1.0, 0.0);
        let force = model.force(v, axis, 1800.0, STANDARD_AIR_DENSITY_SLUG_FT3);
        assert!(force.lift.z > 0.0);
        assert!(force.lift.x.abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs_zero_force() {
        let model = AeroModel::default();
        let rho = STANDARD_AIR_DENSITY_SLUG_FT3;

        let still = model.force(Vector3::zeros(), Vector3::new(0.0, 1.0, 0.0), 2000.0, rho);
        assert_eq!(still.total().norm(), 0.0);

        let no_axis = model.force(Vector3::new(100.0, 0.0, 0.0), Vector3::zeros(), 2000.0, rho);
        assert_eq!(no_axis.lift.norm(), 0.0);
        assert!(no_axis.drag.norm() > 0.0);

        let no_spin =
            model.force(Vector3::new(100.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0), 0.0, rho);
        assert_eq!(no_spin.lift.norm(), 0.0);

        assert!(still.total().iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_force_scales_with_density() {
        let model = AeroModel::default();
        let v = Vector3::new(140.0, 0.0, 0.0);
        let axis = Vector3::new(0.0, 1.0, 0.0);
        let sea = model.force(v, axis, 1800.0, STANDARD_AIR_DENSITY_SLUG_FT3);
        let thin = model.force(v, axis, 1800.0, STANDARD_AIR_DENSITY_SLUG_FT3 * 0.82);
        assert!(thin.drag.norm() < sea.drag.norm());
        assert!(thin.lift.norm() < sea.lift.norm());
    }
}
