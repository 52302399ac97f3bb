//! Feature derivation shared by inference and training.
//!
//! The order of [`FEATURE_NAMES`] and the value of [`PANEL_NOMINAL_POWER_W`]
//! are baked into every trained artifact. Changing either silently
//! invalidates existing models, so artifacts record the names and are
//! rejected at load time on mismatch.

use std::f64::consts::PI;

use pvguard_core::RawSample;
use serde::{Deserialize, Serialize};

/// Nominal voltage of the reference panel.
pub const PANEL_NOMINAL_VOLTAGE_V: f64 = 4.0;
/// Nominal current of the reference panel.
pub const PANEL_NOMINAL_CURRENT_A: f64 = 0.3;
/// Nominal power (V × I) of the reference panel, in watts.
pub const PANEL_NOMINAL_POWER_W: f64 = 1.2;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

pub const FEATURE_COUNT: usize = 5;

/// Feature names in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "temperature_c",
    "humidity_pct",
    "relative_power",
    "time_sin",
    "time_cos",
];

/// Measured power as a fraction of the panel's nominal rating.
pub fn relative_power(power_mw: f64) -> f64 {
    (power_mw / 1000.0) / PANEL_NOMINAL_POWER_W
}

/// Circular time-of-day encoding: `(sin, cos)` of the daily angle.
pub fn time_of_day_encoding(seconds_since_midnight: u32) -> (f64, f64) {
    let frac = f64::from(seconds_since_midnight) / SECONDS_PER_DAY;
    let angle = 2.0 * PI * frac;
    (angle.sin(), angle.cos())
}

/// Fixed-order model input derived from one [`RawSample`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub relative_power: f64,
    pub time_sin: f64,
    pub time_cos: f64,
}

impl FeatureVector {
    /// Derive features from a sample. Out-of-range readings pass through unclamped.
    pub fn derive(sample: &RawSample) -> Self {
        let (time_sin, time_cos) = time_of_day_encoding(sample.seconds_since_midnight());
        Self {
            temperature_c: sample.temperature_c,
            humidity_pct: sample.humidity_pct,
            relative_power: relative_power(sample.power_mw),
            time_sin,
            time_cos,
        }
    }

    /// Values in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.temperature_c,
            self.humidity_pct,
            self.relative_power,
            self.time_sin,
            self.time_cos,
        ]
    }
}
