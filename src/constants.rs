/// Physical constants used in flight and fielding calculations

/// Gravitational acceleration in ft/s²
pub const G_ACCEL_FPS2: f64 = 32.174;

/// Conversion factor: miles per hour to feet per second
pub const MPH_TO_FPS: f64 = 5280.0 / 3600.0;

/// Conversion factor: feet per second to miles per hour
pub const FPS_TO_MPH: f64 = 3600.0 / 5280.0;

/// Conversion factor: revolutions per minute to radians per second
pub const RPM_TO_RAD_S: f64 = 2.0 * std::f64::consts::PI / 60.0;

/// Conversion factor: feet to meters
pub const FT_TO_M: f64 = 0.3048;

/// Conversion factor: kg/m³ to slug/ft³
pub const KG_M3_TO_SLUG_FT3: f64 = 0.00194032;

/// Standard sea-level air density (kg/m³), 15°C dry air at 1013.25 hPa
pub const STANDARD_AIR_DENSITY_KG_M3: f64 = 1.225;

/// Standard sea-level air density (slug/ft³)
pub const STANDARD_AIR_DENSITY_SLUG_FT3: f64 =
    STANDARD_AIR_DENSITY_KG_M3 * KG_M3_TO_SLUG_FT3;

/// Regulation ball mass (slug)
///
/// 5.125 oz = 0.3203 lb, divided by g to get slugs. The official spec
/// allows 5.00-5.25 oz; the midpoint is used everywhere in the force model.
pub const BALL_MASS_SLUG: f64 = 0.3203 / G_ACCEL_FPS2;

/// Regulation ball radius (ft), from a 2.90 in diameter
pub const BALL_RADIUS_FT: f64 = 2.90 / 2.0 / 12.0;

/// Ball cross-sectional area (ft²)
pub const BALL_AREA_FT2: f64 =
    std::f64::consts::PI * BALL_RADIUS_FT * BALL_RADIUS_FT;

/// Default bat-contact height above the ground (ft)
pub const DEFAULT_CONTACT_HEIGHT_FT: f64 = 3.0;

/// Default pitch release distance from the plate along +x (ft)
pub const DEFAULT_RELEASE_DISTANCE_FT: f64 = 55.5;

/// Default pitch release height (ft)
pub const DEFAULT_RELEASE_HEIGHT_FT: f64 = 6.0;

/// Front edge of the plate along +x (ft); pitch flights stop here
pub const PLATE_PLANE_X_FT: f64 = 1.417;

// Numerical stability constants

/// General numerical tolerance for floating point comparisons
pub const NUMERICAL_TOLERANCE: f64 = 1e-9;

/// Minimum threshold for velocity magnitude to avoid division by zero
pub const MIN_VELOCITY_THRESHOLD: f64 = 1e-6;

/// Minimum threshold for preventing division by zero in general calculations
pub const MIN_DIVISION_THRESHOLD: f64 = 1e-12;
