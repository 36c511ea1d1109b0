//! Unit conversions applied once when a flight log is loaded.

pub const MPH_TO_KMH: f64 = 1.60934;
pub const FEET_TO_METERS: f64 = 0.3048;

/// Raw stick range of the remote control hardware.
pub const RC_MIN: i32 = 364;
pub const RC_MAX: i32 = 1684;
pub const RC_CENTER: i32 = 1024;

pub fn mph_to_kmh(mph: f64) -> f64 {
    mph * MPH_TO_KMH
}

pub fn feet_to_meters(feet: f64) -> f64 {
    feet * FEET_TO_METERS
}

/// Normalize a raw stick reading to percent of full deflection, i.e.
/// `(raw - center) / ((max - center) / 100)`.
///
/// The multiplication is done before the division so that the center maps
/// exactly to 0 and full deflection exactly to 100. Readings outside the
/// hardware range are scaled the same way and not clamped.
pub fn rc_percent(raw: i32) -> f64 {
    (f64::from(raw) - f64::from(RC_CENTER)) * 100.0 / f64::from(RC_MAX - RC_CENTER)
}
