//! Scoring predicted errors against injected ones.
//!
//! Within a window, the diff markers of every record are pooled per attributed sample
//! and compared with the injected errors falling inside the window, which are credited
//! through the same attribution table.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::matching::WindowResult;
use crate::noise::InjectedError;
use crate::relatives::{SampleMap, attributed_names};

/// Counts of true errors, predicted errors, and their overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    pub true_errors: usize,
    pub predicted_errors: usize,
    pub overlap: usize,
}

impl ErrorMetrics {
    /// Fraction of predicted errors that are true errors.
    pub fn precision(&self) -> Option<f64> {
        (self.predicted_errors > 0).then(|| self.overlap as f64 / self.predicted_errors as f64)
    }

    /// Fraction of true errors that were predicted.
    pub fn recall(&self) -> Option<f64> {
        (self.true_errors > 0).then(|| self.overlap as f64 / self.true_errors as f64)
    }
}

impl Add for ErrorMetrics {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            true_errors: self.true_errors + other.true_errors,
            predicted_errors: self.predicted_errors + other.predicted_errors,
            overlap: self.overlap + other.overlap,
        }
    }
}

impl AddAssign for ErrorMetrics {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sum for ErrorMetrics {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Metrics for every window plus their total.
#[derive(Debug, Clone, PartialEq)]
pub struct CollateSummary {
    pub per_window: Vec<ErrorMetrics>,
    pub total: ErrorMetrics,
}

///
/// Score one window.
///
/// Predicted markers are de-duplicated per sample; true errors are not, so a site flipped
/// on both haplotypes of a sample counts twice.
///
/// # Arguments
/// - result: the records produced for the window
/// - edits: all injected errors; those outside the window are ignored
/// - attribution: who each flipped sample's errors are credited to, the same table the
///   records were matched with
///
pub fn collate_window(
    result: &WindowResult,
    edits: &[InjectedError],
    attribution: &SampleMap,
) -> ErrorMetrics {
    let mut predicted: HashMap<&str, HashSet<usize>> = HashMap::default();
    for record in &result.records {
        for name in &record.attributed_to {
            predicted
                .entry(name.as_str())
                .or_default()
                .extend(record.diff_markers.iter().copied());
        }
    }

    let mut truth: HashMap<String, Vec<usize>> = HashMap::default();
    for edit in edits.iter().filter(|e| result.window.contains(e.variant_index)) {
        for name in attributed_names(attribution, &edit.sample_name) {
            truth.entry(name).or_default().push(edit.variant_index);
        }
    }

    let mut metrics = ErrorMetrics::default();
    for markers in predicted.values() {
        metrics.predicted_errors += markers.len();
    }
    for (sample, true_errors) in &truth {
        metrics.true_errors += true_errors.len();
        if let Some(markers) = predicted.get(sample.as_str()) {
            metrics.overlap += true_errors.iter().filter(|e| markers.contains(*e)).count();
        }
    }

    metrics
}

///
/// Score every window in parallel and sum the results.
///
pub fn collate_all(
    results: &[WindowResult],
    edits: &[InjectedError],
    attribution: &SampleMap,
) -> CollateSummary {
    let per_window: Vec<ErrorMetrics> = results
        .par_iter()
        .map(|result| collate_window(result, edits, attribution))
        .collect();
    let total: ErrorMetrics = per_window.iter().copied().sum();

    CollateSummary { per_window, total }
}
