//! Physical and temporal plausibility rules.
//!
//! Rules are an explicit ordered list of descriptors (predicate + reason).
//! Every rule is evaluated for every sample; none short-circuits another,
//! and the list order is the order reasons appear in the final explanation.

use pvguard_core::RawSample;
use serde::Serialize;
use tracing::debug;

// ── Thresholds ──────────────────────────────────────────────────────

pub const MIN_TEMPERATURE_C: f64 = 0.0;
pub const MAX_TEMPERATURE_C: f64 = 70.0;
pub const MIN_HUMIDITY_PCT: f64 = 0.0;
pub const MAX_HUMIDITY_PCT: f64 = 100.0;
/// Relative power ceiling (120% of nominal).
pub const MAX_RELATIVE_POWER: f64 = 1.2;
/// Night is `hour < NIGHT_END_HOUR || hour > NIGHT_START_HOUR`.
pub const NIGHT_END_HOUR: u32 = 6;
pub const NIGHT_START_HOUR: u32 = 19;
/// Power above this during the night is suspicious, in watts.
pub const NIGHT_POWER_LIMIT_W: f64 = 0.1;
/// Peak-sun window, inclusive on both ends.
pub const PEAK_SUN_HOURS: std::ops::RangeInclusive<u32> = 10..=16;
pub const WARM_TEMPERATURE_C: f64 = 20.0;
pub const MIN_DAYLIGHT_RELATIVE_POWER: f64 = 0.05;

// ── Reasons ─────────────────────────────────────────────────────────

pub const REASON_TEMPERATURE: &str = "Temperature out of physical range.";
pub const REASON_HUMIDITY: &str = "Humidity value is invalid.";
pub const REASON_POWER_CEILING: &str = "Power exceeds physical panel limit.";
pub const REASON_NIGHT_POWER: &str = "Power detected during night time.";
pub const REASON_DAYLIGHT_UNDERPERFORMANCE: &str = "Power too low for daylight and temperature.";

/// Inputs visible to a rule predicate.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub sample: &'a RawSample,
    pub relative_power: f64,
}

/// A single named rule: pure predicate plus the reason reported when it fires.
#[derive(Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub reason: &'static str,
    predicate: fn(&RuleContext<'_>) -> bool,
}

impl Rule {
    pub const fn new(
        id: &'static str,
        reason: &'static str,
        predicate: fn(&RuleContext<'_>) -> bool,
    ) -> Self {
        Self { id, reason, predicate }
    }

    pub fn check(&self, ctx: &RuleContext<'_>) -> RuleVerdict {
        RuleVerdict {
            rule_id: self.id,
            triggered: (self.predicate)(ctx),
            reason: self.reason,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("reason", &self.reason)
            .finish()
    }
}

/// Outcome of one rule for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleVerdict {
    pub rule_id: &'static str,
    pub triggered: bool,
    pub reason: &'static str,
}

// ── Predicates ──────────────────────────────────────────────────────

fn temperature_out_of_range(ctx: &RuleContext<'_>) -> bool {
    let t = ctx.sample.temperature_c;
    t < MIN_TEMPERATURE_C || t > MAX_TEMPERATURE_C
}

fn humidity_invalid(ctx: &RuleContext<'_>) -> bool {
    let h = ctx.sample.humidity_pct;
    h < MIN_HUMIDITY_PCT || h > MAX_HUMIDITY_PCT
}

fn power_above_ceiling(ctx: &RuleContext<'_>) -> bool {
    ctx.relative_power > MAX_RELATIVE_POWER
}

fn power_at_night(ctx: &RuleContext<'_>) -> bool {
    let hour = ctx.sample.hour();
    let night = hour < NIGHT_END_HOUR || hour > NIGHT_START_HOUR;
    night && ctx.sample.power_w() > NIGHT_POWER_LIMIT_W
}

fn daylight_underperformance(ctx: &RuleContext<'_>) -> bool {
    PEAK_SUN_HOURS.contains(&ctx.sample.hour())
        && ctx.sample.temperature_c > WARM_TEMPERATURE_C
        && ctx.relative_power < MIN_DAYLIGHT_RELATIVE_POWER
}

/// The standard rule set, in explanation order.
pub const STANDARD_RULES: [Rule; 5] = [
    Rule::new("temperature_range", REASON_TEMPERATURE, temperature_out_of_range),
    Rule::new("humidity_range", REASON_HUMIDITY, humidity_invalid),
    Rule::new("power_ceiling", REASON_POWER_CEILING, power_above_ceiling),
    Rule::new("night_power", REASON_NIGHT_POWER, power_at_night),
    Rule::new(
        "daylight_underperformance",
        REASON_DAYLIGHT_UNDERPERFORMANCE,
        daylight_underperformance,
    ),
];

// ── Rule engine ─────────────────────────────────────────────────────

/// Evaluates an ordered rule list against one sample.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(STANDARD_RULES.to_vec())
    }
}

impl RuleEngine {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// One verdict per rule, in rule order. All rules always run.
    pub fn evaluate(&self, sample: &RawSample, relative_power: f64) -> Vec<RuleVerdict> {
        let ctx = RuleContext {
            sample,
            relative_power,
        };
        self.rules
            .iter()
            .map(|rule| {
                let verdict = rule.check(&ctx);
                if verdict.triggered {
                    debug!(rule = rule.id, "rule triggered");
                }
                verdict
            })
            .collect()
    }
}

/// Rule-layer verdict: logical OR of every trigger.
pub fn any_triggered(verdicts: &[RuleVerdict]) -> bool {
    verdicts.iter().any(|v| v.triggered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::relative_power;

    fn eval(ts: &str, temp: f64, hum: f64, power_mw: f64) -> Vec<RuleVerdict> {
        let sample = RawSample::parse(ts, temp, hum, power_mw).unwrap();
        RuleEngine::default().evaluate(&sample, relative_power(power_mw))
    }

    fn triggered_ids(verdicts: &[RuleVerdict]) -> Vec<&'static str> {
        verdicts
            .iter()
            .filter(|v| v.triggered)
            .map(|v| v.rule_id)
            .collect()
    }

    #[test]
    fn every_rule_produces_a_verdict() {
        let v = eval("2024-12-01 12:00:00", 35.0, 60.0, 500.0);
        assert_eq!(v.len(), 5);
        assert!(!any_triggered(&v));
    }

    #[test]
    fn temperature_bounds_are_exclusive() {
        assert!(triggered_ids(&eval("2024-12-01 08:00:00", 0.0, 50.0, 300.0)).is_empty());
        assert!(triggered_ids(&eval("2024-12-01 08:00:00", 70.0, 50.0, 300.0)).is_empty());
        assert_eq!(
            triggered_ids(&eval("2024-12-01 08:00:00", -0.1, 50.0, 300.0)),
            vec!["temperature_range"]
        );
        assert_eq!(
            triggered_ids(&eval("2024-12-01 08:00:00", 70.1, 50.0, 300.0)),
            vec!["temperature_range"]
        );
    }

    #[test]
    fn humidity_rule_ignores_time_and_temperature() {
        for ts in ["2024-12-01 03:00:00", "2024-12-01 12:00:00", "2024-12-01 22:00:00"] {
            let v = eval(ts, 10.0, 150.0, 0.0);
            assert!(triggered_ids(&v).contains(&"humidity_range"));
        }
        assert_eq!(
            triggered_ids(&eval("2024-12-01 08:00:00", 25.0, -1.0, 300.0)),
            vec!["humidity_range"]
        );
    }

    #[test]
    fn power_ceiling_is_strict() {
        assert!(triggered_ids(&eval("2024-12-01 08:00:00", 25.0, 50.0, 1400.0)).is_empty());
        assert_eq!(
            triggered_ids(&eval("2024-12-01 08:00:00", 25.0, 50.0, 1500.0)),
            vec!["power_ceiling"]
        );
    }

    #[test]
    fn night_power_window() {
        assert_eq!(
            triggered_ids(&eval("2024-12-01 02:00:00", 15.0, 50.0, 500.0)),
            vec!["night_power"]
        );
        assert_eq!(
            triggered_ids(&eval("2024-12-01 20:00:00", 15.0, 50.0, 500.0)),
            vec!["night_power"]
        );
        // Hours 6 and 19 are daytime.
        assert!(triggered_ids(&eval("2024-12-01 06:00:00", 15.0, 50.0, 500.0)).is_empty());
        assert!(triggered_ids(&eval("2024-12-01 19:59:59", 15.0, 50.0, 500.0)).is_empty());
        // 100 mW is not above the limit.
        assert!(triggered_ids(&eval("2024-12-01 02:00:00", 15.0, 50.0, 100.0)).is_empty());
    }

    #[test]
    fn daylight_underperformance_window() {
        assert_eq!(
            triggered_ids(&eval("2024-12-01 12:00:00", 25.0, 50.0, 10.0)),
            vec!["daylight_underperformance"]
        );
        assert_eq!(
            triggered_ids(&eval("2024-12-01 16:59:00", 25.0, 50.0, 10.0)),
            vec!["daylight_underperformance"]
        );
        assert!(triggered_ids(&eval("2024-12-01 09:59:59", 25.0, 50.0, 10.0)).is_empty());
        assert!(triggered_ids(&eval("2024-12-01 17:00:00", 25.0, 50.0, 10.0)).is_empty());
        // Not warm enough.
        assert!(triggered_ids(&eval("2024-12-01 12:00:00", 20.0, 50.0, 10.0)).is_empty());
        assert!(triggered_ids(&eval("2024-12-01 12:00:00", 25.0, 50.0, 70.0)).is_empty());
    }

    #[test]
    fn rules_are_additive_and_ordered() {
        let v = eval("2024-12-01 02:00:00", 80.0, 120.0, 2000.0);
        assert_eq!(
            triggered_ids(&v),
            vec!["temperature_range", "humidity_range", "power_ceiling", "night_power"]
        );
    }

    #[test]
    fn custom_rule_list_keeps_given_order() {
        let engine = RuleEngine::new(vec![STANDARD_RULES[2], STANDARD_RULES[0]]);
        let sample = RawSample::parse("2024-12-01 08:00:00", 90.0, 50.0, 5000.0).unwrap();
        let v = engine.evaluate(&sample, relative_power(5000.0));
        assert_eq!(triggered_ids(&v), vec!["power_ceiling", "temperature_range"]);
    }

    #[test]
    fn nan_readings_do_not_trigger() {
        let v = eval("2024-12-01 12:00:00", f64::NAN, f64::NAN, 500.0);
        assert!(!any_triggered(&v));
    }
}
