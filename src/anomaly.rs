use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::models::MonthlyTotal;

pub const MIN_ANOMALY_MONTHS: usize = 3;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
const MAX_SAMPLE_SIZE: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct ForestConfig {
    pub trees: usize,
    /// Expected share of anomalous points; sets the decision threshold.
    pub contamination: f64,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: 100,
            contamination: 0.1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
enum Node {
    Split {
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

/// Average path length of an unsuccessful binary-search-tree lookup among `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

fn build_tree(values: Vec<f64>, depth: usize, height_limit: usize, rng: &mut StdRng) -> Node {
    if depth >= height_limit || values.len() <= 1 {
        return Node::Leaf { size: values.len() };
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min >= max {
        return Node::Leaf { size: values.len() };
    }
    let threshold = rng.gen_range(min..max);
    let (left, right): (Vec<f64>, Vec<f64>) = values.into_iter().partition(|v| *v <= threshold);
    Node::Split {
        threshold,
        left: Box::new(build_tree(left, depth + 1, height_limit, rng)),
        right: Box::new(build_tree(right, depth + 1, height_limit, rng)),
    }
}

fn path_length(node: &Node, value: f64) -> f64 {
    let mut node = node;
    let mut depth = 0.0;
    loop {
        match node {
            Node::Leaf { size } => return depth + average_path_length(*size),
            Node::Split {
                threshold,
                left,
                right,
            } => {
                node = if value <= *threshold { left } else { right };
                depth += 1.0;
            }
        }
    }
}

/// Linear-interpolated percentile, `q` in [0, 1].
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Points isolated in fewer random splits than the rest score lower and
/// are reported as anomalous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
    /// Scores strictly below this are anomalous.
    offset: f64,
}

impl IsolationForest {
    pub fn fit(values: &[f64], config: &ForestConfig) -> Result<Self> {
        if values.is_empty() {
            return Err(TrackerError::InsufficientData(
                "isolation forest needs at least one point".to_string(),
            ));
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if values.iter().any(|v| !v.is_finite()) || !(max - min).is_finite() {
            return Err(TrackerError::InvalidInput(
                "values are out of range for the isolation forest".to_string(),
            ));
        }
        let mut rng = StdRng::seed_from_u64(config.seed);
        let sample_size = values.len().min(MAX_SAMPLE_SIZE);
        let height_limit = (sample_size.max(2) as f64).log2().ceil() as usize;

        let trees = (0..config.trees)
            .map(|_| {
                let sample: Vec<f64> = rand::seq::index::sample(&mut rng, values.len(), sample_size)
                    .into_iter()
                    .map(|i| values[i])
                    .collect();
                build_tree(sample, 0, height_limit, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            sample_size,
            offset: 0.0,
        };
        let scores: Vec<f64> = values.iter().map(|v| forest.score(*v)).collect();
        forest.offset = percentile(&scores, config.contamination);
        Ok(forest)
    }

    /// Negated anomaly score in [-1, 0): lower means more isolated.
    pub fn score(&self, value: f64) -> f64 {
        let mean_path = self.trees.iter().map(|t| path_length(t, value)).sum::<f64>()
            / self.trees.len() as f64;
        -(2f64).powf(-mean_path / average_path_length(self.sample_size).max(f64::MIN_POSITIVE))
    }

    pub fn is_anomaly(&self, value: f64) -> bool {
        self.score(value) < self.offset
    }
}

/// Fitted detector together with the monthly series it was fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyModel {
    pub forest: IsolationForest,
    pub months: Vec<MonthlyTotal>,
}

impl AnomalyModel {
    pub fn fit(months: &[MonthlyTotal], config: &ForestConfig) -> Result<Self> {
        if months.len() < MIN_ANOMALY_MONTHS {
            return Err(TrackerError::InsufficientData(format!(
                "not enough monthly points for anomaly detection ({} of {MIN_ANOMALY_MONTHS})",
                months.len()
            )));
        }
        let values: Vec<f64> = months.iter().map(|m| m.total).collect();
        Ok(Self {
            forest: IsolationForest::fit(&values, config)?,
            months: months.to_vec(),
        })
    }

    /// One label per stored month, `true` for anomalous.
    pub fn labels(&self) -> Vec<bool> {
        self.months.iter().map(|m| self.forest.is_anomaly(m.total)).collect()
    }

    pub fn anomalies(&self) -> Vec<MonthlyTotal> {
        self.months
            .iter()
            .zip(self.labels())
            .filter(|(_, anomalous)| *anomalous)
            .map(|(m, _)| m.clone())
            .collect()
    }
}
