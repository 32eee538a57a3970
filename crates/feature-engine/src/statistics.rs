//! Trailing Window Statistics

/// Sample statistics over one trailing window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingStatistics {
    /// Mean value
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
}

impl TrailingStatistics {
    /// Compute statistics over a complete window.
    ///
    /// Returns `None` if the window is empty or holds an undefined value.
    /// A single-value window has an undefined (NaN) standard deviation.
    pub fn compute(window: &[f64]) -> Option<Self> {
        if window.is_empty() || window.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;

        let std_dev = if window.len() > 1 {
            let m2: f64 = window.iter().map(|v| (v - mean) * (v - mean)).sum();
            (m2 / (n - 1.0)).sqrt()
        } else {
            f64::NAN
        };

        Some(Self { mean, std_dev })
    }
}

/// Shift a series forward by `lag` rows: `out[t] = values[t - lag]`
pub fn lagged(values: &[f64], lag: usize) -> Vec<f64> {
    (0..values.len())
        .map(|t| if t >= lag { values[t - lag] } else { f64::NAN })
        .collect()
}

/// Statistics over rows `t + 1 - window ..= t` for every row `t`.
///
/// Only the current and preceding rows are read. Rows without a full
/// window yield `None`.
pub fn rolling(values: &[f64], window: usize) -> Vec<Option<TrailingStatistics>> {
    (0..values.len())
        .map(|t| {
            if window == 0 || t + 1 < window {
                None
            } else {
                TrailingStatistics::compute(&values[t + 1 - window..=t])
            }
        })
        .collect()
}
