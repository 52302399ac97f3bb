use serde::{Deserialize, Serialize};

use crate::features::FEATURE_COUNT;

/// Per-feature standardization: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: [f64; FEATURE_COUNT],
    pub scale: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    /// Fit on rows using population variance. Constant columns get scale 1.
    pub fn fit(rows: &[[f64; FEATURE_COUNT]]) -> Self {
        let mut mean = [0.0; FEATURE_COUNT];
        let mut scale = [1.0; FEATURE_COUNT];
        if rows.is_empty() {
            return Self { mean, scale };
        }

        let n = rows.len() as f64;
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in mean.iter_mut() {
            *m /= n;
        }

        for i in 0..FEATURE_COUNT {
            let var = rows.iter().map(|r| (r[i] - mean[i]).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            scale[i] = if std <= f64::EPSILON { 1.0 } else { std };
        }

        Self { mean, scale }
    }

    pub fn transform(&self, x: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            out[i] = (x[i] - self.mean[i]) / self.scale[i];
        }
        out
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err("scaler mean contains non-finite values".to_string());
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err("scaler scale must be finite and strictly positive".to_string());
        }
        Ok(())
    }
}
