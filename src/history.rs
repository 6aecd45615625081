//! Segregation curve: fraction of satisfied agents over time.

use serde::{Deserialize, Serialize};

/// Aggregate satisfaction measured after a given number of steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Cumulative number of steps run when the measurement was taken.
    pub step: usize,
    /// Fraction of agents satisfied with their neighborhood, in `[0, 1]`.
    pub fraction_satisfied: f64,
}

/// Append-only series of checkpoints, ordered by step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegregationHistory {
    checkpoints: Vec<Checkpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub n_checkpoints: usize,
    pub first: f64,
    pub last: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl SegregationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, checkpoint: Checkpoint) {
        debug_assert!(self.last().is_none_or(|last| last.step <= checkpoint.step));
        self.checkpoints.push(checkpoint);
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn last(&self) -> Option<&Checkpoint> {
        self.checkpoints.last()
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Summarize the series, or `None` if nothing was recorded yet.
    pub fn summary(&self) -> Option<HistorySummary> {
        let first = self.checkpoints.first()?.fraction_satisfied;
        let last = self.checkpoints.last()?.fraction_satisfied;

        let mut acc = Accumulator::new();
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for checkpoint in &self.checkpoints {
            let val = checkpoint.fraction_satisfied;
            acc.add(val);
            min = min.min(val);
            max = max.max(val);
        }

        Some(HistorySummary {
            n_checkpoints: self.checkpoints.len(),
            first,
            last,
            min,
            max,
            mean: acc.mean,
            std_dev: acc.std_dev(),
        })
    }
}

/// Running mean and variance (Welford).
struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    fn std_dev(&self) -> f64 {
        if self.n_vals > 1 {
            (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
        } else {
            0.0
        }
    }
}
