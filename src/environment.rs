//! Atmospheric state for a ballpark.
//!
//! Derives barometric pressure and air density from altitude, temperature,
//! and relative humidity. Everything is computed once at construction and
//! never mutated; one `EnvironmentState` is typically built per game and
//! shared read-only across every play.

use serde::{Deserialize, Serialize};

use crate::constants::{FT_TO_M, KG_M3_TO_SLUG_FT3, STANDARD_AIR_DENSITY_SLUG_FT3};

/// Sea-level standard pressure (hPa)
const SEA_LEVEL_PRESSURE_HPA: f64 = 1013.25;

/// Gas constant for dry air (J/(kg·K))
const R_DRY: f64 = 287.05;

/// Gas constant for water vapor (J/(kg·K))
const R_VAPOR: f64 = 461.495;

/// Immutable atmospheric conditions at the park.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnvironmentState {
    altitude_ft: f64,
    temperature_f: f64,
    relative_humidity_pct: f64,
    pressure_hpa: f64,
    air_density_slug_ft3: f64,
}

impl EnvironmentState {
    /// Build the state for a park, deriving pressure and density once.
    ///
    /// Humidity is clamped to 0-100. Temperatures below -40°F are outside
    /// the vapor-pressure fit and are clamped there.
    pub fn new(altitude_ft: f64, temperature_f: f64, relative_humidity_pct: f64) -> Self {
        let humidity = relative_humidity_pct.clamp(0.0, 100.0);
        let temp_f = temperature_f.max(-40.0);
        let pressure_hpa = pressure_at_altitude(altitude_ft);
        let air_density_slug_ft3 = air_density(temp_f, pressure_hpa, humidity);

        Self {
            altitude_ft,
            temperature_f: temp_f,
            relative_humidity_pct: humidity,
            pressure_hpa,
            air_density_slug_ft3,
        }
    }

    /// Sea level, 70°F, 50% humidity — a typical summer evening.
    pub fn typical() -> Self {
        Self::new(0.0, 70.0, 50.0)
    }

    pub fn altitude_ft(&self) -> f64 {
        self.altitude_ft
    }

    pub fn temperature_f(&self) -> f64 {
        self.temperature_f
    }

    pub fn relative_humidity_pct(&self) -> f64 {
        self.relative_humidity_pct
    }

    /// Barometric pressure at field level (hPa).
    pub fn pressure_hpa(&self) -> f64 {
        self.pressure_hpa
    }

    /// Air density at field level (slug/ft³).
    pub fn air_density_slug_ft3(&self) -> f64 {
        self.air_density_slug_ft3
    }

    /// Density relative to the sea-level standard atmosphere.
    pub fn density_ratio(&self) -> f64 {
        self.air_density_slug_ft3 / STANDARD_AIR_DENSITY_SLUG_FT3
    }
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self::typical()
    }
}

/// Standard-atmosphere pressure at altitude using the troposphere
/// barometric formula (valid well past any ballpark elevation).
fn pressure_at_altitude(altitude_ft: f64) -> f64 {
    let altitude_m = altitude_ft.max(0.0) * FT_TO_M;
    SEA_LEVEL_PRESSURE_HPA * (1.0 - 2.25577e-5 * altitude_m).powf(5.25588)
}

/// Saturation vapor pressure over water (hPa), Arden Buck equation.
fn saturation_vapor_pressure(temp_c: f64) -> f64 {
    6.1121 * ((18.678 - temp_c / 234.5) * (temp_c / (257.14 + temp_c))).exp()
}

/// Air density (slug/ft³) from dry-air and water-vapor partial pressures.
fn air_density(temp_f: f64, pressure_hpa: f64, humidity_pct: f64) -> f64 {
    let temp_c = (temp_f - 32.0) / 1.8;
    let temp_k = temp_c + 273.15;

    let vapor_pressure_pa = humidity_pct / 100.0 * saturation_vapor_pressure(temp_c) * 100.0;
    let dry_pressure_pa = (pressure_hpa * 100.0 - vapor_pressure_pa).max(0.0);

    let density_kg_m3 =
        dry_pressure_pa / (R_DRY * temp_k) + vapor_pressure_pa / (R_VAPOR * temp_k);

    density_kg_m3 * KG_M3_TO_SLUG_FT3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sea_level_standard_density() {
        // 59°F dry air at sea level is the 1.225 kg/m³ reference
        let env = EnvironmentState::new(0.0, 59.0, 0.0);
        assert!((env.density_ratio() - 1.0).abs() < 0.005);
        assert!((env.pressure_hpa() - 1013.25).abs() < 0.01);
    }

    #[test]
    fn test_humid_air_less_dense() {
        let dry = EnvironmentState::new(0.0, 80.0, 0.0);
        let humid = EnvironmentState::new(0.0, 80.0, 90.0);
        assert!(humid.air_density_slug_ft3() < dry.air_density_slug_ft3());
    }

    #[test]
    fn test_density_decreases_with_altitude() {
        let sea = EnvironmentState::new(0.0, 70.0, 50.0);
        let mile_high = EnvironmentState::new(5280.0, 70.0, 50.0);
        assert!(mile_high.air_density_slug_ft3() < sea.air_density_slug_ft3());
        // Denver sits around 82-84% of sea-level density
        assert!(mile_high.density_ratio() > 0.78 && mile_high.density_ratio() < 0.88);
    }

    #[test]
    fn test_density_decreases_with_temperature() {
        let cold = EnvironmentState::new(0.0, 40.0, 50.0);
        let hot = EnvironmentState::new(0.0, 95.0, 50.0);
        assert!(hot.air_density_slug_ft3() < cold.air_density_slug_ft3());
    }

    #[test]
    fn test_humidity_clamped() {
        let env = EnvironmentState::new(0.0, 70.0, 250.0);
        assert_eq!(env.relative_humidity_pct(), 100.0);
    }
}
