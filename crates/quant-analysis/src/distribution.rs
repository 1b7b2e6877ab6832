//! Histogram and Q-Q plot data.

use analysis_core::{AnalysisError, AnalysisResult};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBins {
    /// Bin centres, 4 decimals.
    pub bin_labels: Vec<String>,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QQPlotData {
    pub theoretical: Vec<f64>,
    pub sample: Vec<f64>,
}

/// Equal-width bin edges over `[min, max]`. A zero-width range is widened by
/// 0.5 on each side.
fn bin_edges(min: f64, max: f64, bins: usize) -> Vec<f64> {
    let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
    let step = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| lo + i as f64 * step).collect();
    edges.push(hi);
    edges
}

/// Locate the bin for `x`. Bins are `[e_i, e_{i+1})` except the last, which
/// also includes its right edge.
fn bin_index(x: f64, edges: &[f64]) -> usize {
    let bins = edges.len() - 1;
    let lo = edges[0];
    let hi = edges[bins];
    let mut idx = (((x - lo) / (hi - lo)) * bins as f64).floor() as usize;
    idx = idx.min(bins - 1);
    // Correct for floating point drift against the materialised edges.
    if idx > 0 && x < edges[idx] {
        idx -= 1;
    } else if idx + 1 < bins && x >= edges[idx + 1] {
        idx += 1;
    }
    idx
}

/// Fixed-count histogram whose counts partition every observation.
pub fn histogram(values: &[f64], bins: usize) -> AnalysisResult<HistogramBins> {
    if bins == 0 {
        return Err(AnalysisError::InvalidData(
            "histogram needs at least one bin".to_string(),
        ));
    }
    if values.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "histogram of empty sample".to_string(),
        ));
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let edges = bin_edges(min, max, bins);

    let mut counts = vec![0u64; bins];
    for &x in values {
        counts[bin_index(x, &edges)] += 1;
    }

    let bin_labels = edges
        .windows(2)
        .map(|e| format!("{:.4}", (e[0] + e[1]) / 2.0))
        .collect();

    Ok(HistogramBins { bin_labels, counts })
}

/// Sorted sample against standard-normal quantiles at Hazen plotting
/// positions `(i - 0.5) / n`.
pub fn qq_plot(values: &[f64]) -> AnalysisResult<QQPlotData> {
    if values.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "Q-Q plot of empty sample".to_string(),
        ));
    }
    let standard = Normal::new(0.0, 1.0)
        .map_err(|e| AnalysisError::InvalidData(format!("normal reference: {}", e)))?;

    let mut sample = values.to_vec();
    sample.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sample.len() as f64;
    let theoretical = (1..=sample.len())
        .map(|i| standard.inverse_cdf((i as f64 - 0.5) / n))
        .collect();

    Ok(QQPlotData { theoretical, sample })
}
