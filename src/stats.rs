//! Weighted moment accumulation and the per-wing statistics it yields.

use serde::Serialize;

use crate::error::StatsError;

/// Weighted first and second moments of one wing's glide-angle samples.
///
/// Each flight contributes its samples with the flight's sampling weight.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WingMoments {
    pub sum_av: f64,
    pub sum_sq: f64,
    pub weight: f64,
    pub nb_samples: u64,
    pub nb_flights: u64,
}

impl WingMoments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one flight's samples, weighted by `sampling`.
    pub fn push(&mut self, glide_angles: &[f64], sampling: f64) {
        let sum: f64 = glide_angles.iter().sum();
        let sum_sq: f64 = glide_angles.iter().map(|a| a * a).sum();

        self.sum_av += sum * sampling;
        self.sum_sq += sum_sq * sampling;
        self.weight += sampling * glide_angles.len() as f64;
        self.nb_samples += glide_angles.len() as u64;
        self.nb_flights += 1;
    }

    /// Weighted mean, standard deviation and 95% confidence half-width.
    ///
    /// A variance within the rounding noise of `sum_sq / weight - mean^2`
    /// (see [`variance_tolerance`](Self::variance_tolerance)) is taken as
    /// exactly zero.
    ///
    /// # Errors
    ///
    /// - [`StatsError::ZeroWeight`] when the accumulated weight is zero.
    /// - [`StatsError::NonFinite`] when the mean or variance is NaN or infinite.
    /// - [`StatsError::NegativeVariance`] when the variance is below zero by
    ///   more than the rounding tolerance.
    pub fn finish(&self, wing: i64) -> Result<WingStats, StatsError> {
        if self.weight == 0.0 {
            return Err(StatsError::ZeroWeight { wing });
        }

        let mean = self.sum_av / self.weight;
        let second = self.sum_sq / self.weight;
        let mut variance = second - mean.powi(2);
        if !mean.is_finite() || !variance.is_finite() {
            return Err(StatsError::NonFinite { wing, mean, variance });
        }
        if variance.abs() <= self.variance_tolerance(second) {
            variance = 0.0;
        }
        if variance < 0.0 {
            return Err(StatsError::NegativeVariance { wing, variance });
        }

        let dev_hist = variance.sqrt();
        let confidence = 2.0 * dev_hist / (self.nb_samples as f64).sqrt();

        Ok(WingStats {
            mean,
            dev_hist,
            confidence,
            nb_flights: self.nb_flights,
            nb_samples: self.nb_samples,
            weight: self.weight,
        })
    }

    /// Rounding bound of `second - mean^2`: a few ulps of the second moment,
    /// growing with the number of summed terms.
    pub fn variance_tolerance(&self, second: f64) -> f64 {
        let terms = (32 + self.nb_samples + self.nb_flights) as f64;
        terms * f64::EPSILON * second.abs()
    }

    /// Statistics for a wing [`finish`](Self::finish) rejected.
    ///
    /// `dev_hist` and `confidence` are NaN. The mean is kept whenever the
    /// weight is non-zero, so only [`StatsError::ZeroWeight`] loses it.
    pub fn nan_stats(&self) -> WingStats {
        let mean = if self.weight == 0.0 {
            f64::NAN
        } else {
            self.sum_av / self.weight
        };

        WingStats {
            mean,
            dev_hist: f64::NAN,
            confidence: f64::NAN,
            nb_flights: self.nb_flights,
            nb_samples: self.nb_samples,
            weight: self.weight,
        }
    }
}

/// Aggregated glide-angle performance of one wing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WingStats {
    /// Weighted mean glide angle.
    pub mean: f64,
    /// Weighted standard deviation.
    pub dev_hist: f64,
    /// Half-width of the 95% confidence interval on the mean.
    pub confidence: f64,

    pub nb_flights: u64,
    pub nb_samples: u64,
    pub weight: f64,
}
