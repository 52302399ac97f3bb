//! Isolation forest: random axis-aligned partitioning trees.
//!
//! Anomalies are isolated in fewer splits than inliers, so a short average
//! path length across the ensemble marks a point as an outlier. Scoring uses
//! the standard normalization:
//!
//! - `score_samples = -2^(-E[h(x)] / c(max_samples))`
//! - `decision_function = score_samples - offset` (negative = outlier)

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Label;
use crate::features::FEATURE_COUNT;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful BST search over `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Points with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { n_samples: usize },
}

/// One isolation tree stored as a flat node array; node 0 is the root and
/// children always sit at higher indices than their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    pub nodes: Vec<TreeNode>,
}

impl IsolationTree {
    /// Depth of the reached leaf plus the expected remaining depth below it.
    pub fn path_length(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        let mut idx = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[feature] <= threshold { left } else { right };
                    depth += 1.0;
                }
                TreeNode::Leaf { n_samples } => return depth + average_path_length(n_samples),
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = *node
            {
                if feature >= FEATURE_COUNT {
                    return Err(format!("node {} splits on unknown feature {}", idx, feature));
                }
                if threshold.is_nan() {
                    return Err(format!("node {} has a NaN threshold", idx));
                }
                for child in [left, right] {
                    if child <= idx || child >= len {
                        return Err(format!("node {} has invalid child index {}", idx, child));
                    }
                }
            }
        }
        Ok(())
    }

    /// Grow a tree on the given rows until every leaf is isolated or `max_depth` is reached.
    pub fn grow<R: Rng>(
        rows: &[[f64; FEATURE_COUNT]],
        indices: Vec<usize>,
        max_depth: usize,
        rng: &mut R,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow_node(rows, indices, 0, max_depth, rng);
        tree
    }

    fn grow_node<R: Rng>(
        &mut self,
        rows: &[[f64; FEATURE_COUNT]],
        indices: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut R,
    ) -> usize {
        let node_idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            n_samples: indices.len(),
        });

        if depth >= max_depth || indices.len() <= 1 {
            return node_idx;
        }

        // Only features with spread can separate points.
        let candidates: Vec<(usize, f64, f64)> = (0..FEATURE_COUNT)
            .filter_map(|f| {
                let (lo, hi) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                    (lo.min(rows[i][f]), hi.max(rows[i][f]))
                });
                (hi > lo).then_some((f, lo, hi))
            })
            .collect();

        if candidates.is_empty() {
            return node_idx;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            indices.into_iter().partition(|&i| rows[i][feature] <= threshold);

        let left = self.grow_node(rows, left_rows, depth + 1, max_depth, rng);
        let right = self.grow_node(rows, right_rows, depth + 1, max_depth, rng);
        self.nodes[node_idx] = TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        };
        node_idx
    }
}

/// Fitting parameters for [`IsolationForest::fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_samples: usize,
    pub contamination: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    /// Subsample size each tree was grown on.
    pub max_samples: usize,
    /// Subtracted from `score_samples` so the decision boundary sits at 0.
    pub offset: f64,
    pub trees: Vec<IsolationTree>,
}

impl IsolationForest {
    /// Fit on already-scaled rows. Rows must be non-empty.
    pub fn fit<R: Rng>(
        rows: &[[f64; FEATURE_COUNT]],
        params: &ForestParams,
        rng: &mut R,
    ) -> Self {
        let subsample = params.max_samples.min(rows.len()).max(1);
        let max_depth = (subsample.max(2) as f64).log2().ceil() as usize;

        let trees = (0..params.n_estimators)
            .map(|_| {
                let indices = index::sample(rng, rows.len(), subsample).into_vec();
                IsolationTree::grow(rows, indices, max_depth, rng)
            })
            .collect();

        let mut forest = Self {
            max_samples: subsample,
            offset: 0.0,
            trees,
        };

        let mut scores: Vec<f64> = rows.iter().map(|r| forest.score_samples(r)).collect();
        scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        forest.offset = percentile(&scores, params.contamination);
        forest
    }

    /// Negated anomaly score in `[-1, 0)`; lower = more abnormal.
    pub fn score_samples(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let mean_path =
            self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / self.trees.len() as f64;
        let norm = average_path_length(self.max_samples);
        if norm <= 0.0 {
            return -0.5;
        }
        -(2f64.powf(-mean_path / norm))
    }

    pub fn decision_function(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        self.score_samples(x) - self.offset
    }

    pub fn predict(&self, x: &[f64; FEATURE_COUNT]) -> Label {
        Label::from_decision(self.decision_function(x))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        if self.max_samples == 0 {
            return Err("max_samples must be positive".to_string());
        }
        if !self.offset.is_finite() {
            return Err("offset must be finite".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }
}

/// Linear-interpolated quantile of ascending-sorted values; `q` in `[0, 1]`.
pub(crate) fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
