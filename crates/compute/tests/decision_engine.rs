//! End-to-end decision tests driven through the public engine API.

use std::io::Write;
use std::sync::Arc;

use pvguard_compute::fusion::{MODEL_REASON, NORMAL_REASON};
use pvguard_compute::rules::{
    REASON_DAYLIGHT_UNDERPERFORMANCE, REASON_HUMIDITY, REASON_NIGHT_POWER, REASON_POWER_CEILING,
    REASON_TEMPERATURE,
};
use pvguard_compute::scorer::ModelArtifact;
use pvguard_compute::training::{train_from_file, TrainingParams};
use pvguard_compute::{DecisionEngine, FixedScorer, FusionPolicy, ScorerHandle};
use pvguard_core::PvError;

fn engine_with(scorer: FixedScorer) -> DecisionEngine {
    DecisionEngine::new(ScorerHandle::ready(Arc::new(scorer)), FusionPolicy::default())
}

fn scorers() -> Vec<FixedScorer> {
    vec![
        FixedScorer::normal(0.15),
        FixedScorer::normal(-0.3),
        FixedScorer::anomalous(-0.02),
        FixedScorer::anomalous(-0.05),
        FixedScorer::anomalous(-0.4),
    ]
}

// ── Worked examples ─────────────────────────────────────────────────

#[test]
fn midday_healthy_reading_follows_the_model() {
    let quiet = engine_with(FixedScorer::normal(0.12))
        .predict_anomaly("2024-12-01 12:00:00", 35.0, 60.0, 500.0)
        .unwrap();
    assert!(!quiet.is_anomaly);
    assert_eq!(quiet.reason, NORMAL_REASON);

    let flagged = engine_with(FixedScorer::anomalous(-0.2))
        .predict_anomaly("2024-12-01 12:00:00", 35.0, 60.0, 500.0)
        .unwrap();
    assert!(flagged.is_anomaly);
    assert_eq!(flagged.reason, MODEL_REASON);
}

#[test]
fn low_daylight_power_is_anomalous_whatever_the_model_says() {
    for scorer in scorers() {
        let d = engine_with(scorer)
            .predict_anomaly("2024-12-01 12:00:00", 25.0, 50.0, 10.0)
            .unwrap();
        assert!(d.is_anomaly);
        assert!(d.reason.contains(REASON_DAYLIGHT_UNDERPERFORMANCE));
    }
}

#[test]
fn night_power_is_anomalous() {
    let d = engine_with(FixedScorer::normal(0.2))
        .predict_anomaly("2024-12-01 02:00:00", 10.0, 70.0, 500.0)
        .unwrap();
    assert!(d.is_anomaly);
    assert_eq!(d.reason, REASON_NIGHT_POWER);
    assert_eq!(d.anomaly_score, 0.2);
}

#[test]
fn impossible_humidity_is_anomalous_at_any_time() {
    for ts in ["2024-12-01 00:30:00", "2024-12-01 12:00:00", "2024-12-01 18:00:00"] {
        for temp in [-10.0, 15.0, 45.0] {
            let d = engine_with(FixedScorer::normal(0.1))
                .predict_anomaly(ts, temp, 150.0, 0.0)
                .unwrap();
            assert!(d.is_anomaly);
            assert!(d.reason.contains(REASON_HUMIDITY));
        }
    }
}

// ── Properties ──────────────────────────────────────────────────────

#[test]
fn quiet_rules_leave_verdict_to_the_model() {
    let cases = [
        ("2024-12-01 07:00:00", 5.0, 30.0, 10.0),
        ("2024-12-01 12:00:00", 35.0, 80.0, 400.0),
        ("2024-12-01 12:00:00", 18.0, 80.0, 10.0),
        ("2024-12-01 18:30:00", 69.0, 100.0, 1400.0),
    ];
    let policy = FusionPolicy::default();
    for (ts, t, h, p) in cases {
        for scorer in scorers() {
            let d = engine_with(scorer).predict_anomaly(ts, t, h, p).unwrap();
            let model_anomaly = policy.is_model_anomaly(&pvguard_compute::Scorer::score(
                &scorer,
                &pvguard_compute::FeatureVector::derive(
                    &pvguard_core::RawSample::parse(ts, t, h, p).unwrap(),
                ),
            ));
            assert_eq!(d.is_anomaly, model_anomaly, "{} {} {} {}", ts, t, h, p);
        }
    }
}

#[test]
fn decisions_are_deterministic() {
    let engine = engine_with(FixedScorer::anomalous(-0.3));
    let a = engine.predict_anomaly("2024-12-01 21:15:00", 75.0, 101.0, 2000.0).unwrap();
    let b = engine.predict_anomaly("2024-12-01 21:15:00", 75.0, 101.0, 2000.0).unwrap();
    assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
}

#[test]
fn reasons_follow_rule_order() {
    let d = engine_with(FixedScorer::anomalous(-0.3))
        .predict_anomaly("2024-12-01 08:00:00", 90.0, 50.0, 3000.0)
        .unwrap();
    assert_eq!(
        d.reason,
        format!("{} | {} | {}", REASON_TEMPERATURE, REASON_POWER_CEILING, MODEL_REASON)
    );
}

#[test]
fn threshold_boundary_is_strict() {
    let at = engine_with(FixedScorer::anomalous(-0.05))
        .predict_anomaly("2024-12-01 12:00:00", 35.0, 60.0, 500.0)
        .unwrap();
    assert!(!at.is_anomaly);

    let below = engine_with(FixedScorer::anomalous(-0.0500001))
        .predict_anomaly("2024-12-01 12:00:00", 35.0, 60.0, 500.0)
        .unwrap();
    assert!(below.is_anomaly);
}

#[test]
fn score_passes_through_untouched() {
    let score = 0.031_415_926_5;
    for (ts, t, h, p) in [
        ("2024-12-01 12:00:00", 35.0, 60.0, 500.0),
        ("2024-12-01 02:00:00", 80.0, 150.0, 5000.0),
    ] {
        let d = engine_with(FixedScorer::normal(score))
            .predict_anomaly(ts, t, h, p)
            .unwrap();
        assert_eq!(d.anomaly_score.to_bits(), score.to_bits());
    }
}

#[test]
fn bad_timestamp_is_a_request_error() {
    let err = engine_with(FixedScorer::normal(0.1))
        .predict_anomaly("2024-13-45 99:00:00", 25.0, 50.0, 500.0)
        .unwrap_err();
    assert!(matches!(err, PvError::InvalidTimestamp(_)));
}

// ── Trained artifact ────────────────────────────────────────────────

/// A week of synthetic daytime-shaped telemetry in the logger's CSV layout.
fn synthetic_history() -> String {
    let mut out = String::from("Date Time,Temperature(oC),Humidity(%),Power(mW)\n");
    for day in 1..=7 {
        for minute in (0..24 * 60).step_by(15) {
            let hour = minute / 60;
            let min = minute % 60;
            let sun = ((minute as f64 / 1440.0 - 0.25) * std::f64::consts::TAU).sin().max(0.0);
            let power = 900.0 * sun + (day as f64);
            let temp = 15.0 + 15.0 * sun;
            let humidity = 70.0 - 30.0 * sun;
            out.push_str(&format!(
                "2024-06-{:02} {:02}:{:02}:00,{},{},{}\n",
                day, hour, min, temp, humidity, power
            ));
        }
    }
    out
}

#[test]
fn trained_artifact_round_trips_through_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("history.csv");
    std::fs::File::create(&data)
        .unwrap()
        .write_all(synthetic_history().as_bytes())
        .unwrap();
    let model_path = dir.path().join("models").join("isolation_forest.json");

    let params = TrainingParams {
        n_estimators: 50,
        ..TrainingParams::default()
    };
    let summary = train_from_file(&data, &model_path, &params).unwrap();
    assert_eq!(summary.clean_samples, 7 * 96);
    assert_eq!(summary.trees, 50);

    let artifact = ModelArtifact::load(&model_path).unwrap();
    assert_eq!(artifact.n_training_samples, 7 * 96);

    let engine = DecisionEngine::new(ScorerHandle::from_path(&model_path), FusionPolicy::default());
    assert!(!engine.scorer().is_loaded());

    let typical = engine
        .predict_anomaly("2024-06-08 12:00:00", 30.0, 40.0, 905.0)
        .unwrap();
    let absurd = engine
        .predict_anomaly("2024-06-08 03:00:00", 65.0, 5.0, 1400.0)
        .unwrap();
    assert!(engine.scorer().is_loaded());
    assert!(absurd.anomaly_score < typical.anomaly_score);
    assert!(absurd.is_anomaly);
    assert!(absurd.reason.contains(REASON_NIGHT_POWER));
}
