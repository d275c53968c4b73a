use crate::spi::error::FitError;
use crate::spi::fit::GammaFit;
use crate::types::month::Month;
use crate::types::observation::{RollingWindowValue, SpiValue};
use crate::types::station::StationSeries;
use log::debug;
use statrs::distribution::{ContinuousCDF, Normal};

/// Probabilities are kept at least this far from 0 and 1 before the probit step,
/// which bounds SPI to roughly ±4.75.
pub const DEFAULT_PROBABILITY_EPSILON: f64 = 1e-6;

/// A cumulative probability that had to be clamped before inversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedProbability {
    pub month: Month,
    /// The probability before clamping.
    pub probability: f64,
}

/// Result of transforming one station's rolling series.
#[derive(Debug, Clone)]
pub struct SpiOutcome {
    pub series: StationSeries<SpiValue>,
    pub fit: GammaFit,
    pub clamped: Vec<ClampedProbability>,
}

/// Fits a station's rolling sums and maps each one to a standard-normal score.
#[derive(Debug, Clone, Copy)]
pub struct SpiTransformer {
    epsilon: f64,
}

impl Default for SpiTransformer {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_PROBABILITY_EPSILON,
        }
    }
}

impl SpiTransformer {
    /// Returns `None` unless `0 < epsilon < 0.5`.
    pub fn new(epsilon: f64) -> Option<Self> {
        (epsilon > 0.0 && epsilon < 0.5).then_some(Self { epsilon })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Computes SPI for every value of `series`, one output row per input row.
    ///
    /// # Errors
    ///
    /// Any [`FitError`] from fitting the gamma distribution. Clamped probabilities are
    /// not errors; they are listed in [`SpiOutcome::clamped`].
    pub fn transform(
        &self,
        series: &StationSeries<RollingWindowValue>,
    ) -> Result<SpiOutcome, FitError> {
        let sums: Vec<f64> = series.records.iter().map(|r| r.total_precip).collect();
        let fit = GammaFit::fit(&sums)?;
        debug!(
            "Station {}: gamma shape {:.4}, scale {:.4}, zero share {:.3}",
            series.code(),
            fit.shape(),
            fit.scale(),
            fit.zero_probability()
        );

        let normal = Normal::new(0.0, 1.0).map_err(|e| FitError::Distribution(e.to_string()))?;
        let mut clamped = Vec::new();
        let values = series
            .records
            .iter()
            .map(|record| {
                let probability = fit.cdf(record.total_precip);
                let bounded = probability.clamp(self.epsilon, 1.0 - self.epsilon);
                if bounded != probability {
                    clamped.push(ClampedProbability {
                        month: record.month,
                        probability,
                    });
                }
                SpiValue {
                    month: record.month,
                    window: record.window,
                    total_precip: record.total_precip,
                    spi: normal.inverse_cdf(bounded),
                }
            })
            .collect();

        Ok(SpiOutcome {
            series: series.derive(values),
            fit,
            clamped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::station::StationInfo;
    use crate::types::window::WindowLength;
    use approx::assert_relative_eq;

    fn rolling(values: &[f64]) -> StationSeries<RollingWindowValue> {
        let window = WindowLength::new(3).unwrap();
        let mut month = Month::new(3, 1990);
        let mut records = Vec::new();
        for &total_precip in values {
            records.push(RollingWindowValue {
                month,
                window,
                total_precip,
            });
            month = month.succ();
        }
        StationSeries::new(StationInfo::new("S"), records)
    }

    #[test]
    fn median_value_maps_close_to_zero() -> Result<(), FitError> {
        let outcome = SpiTransformer::default().transform(&rolling(&[95.0, 97.5, 100.0, 102.5, 105.0]))?;
        let spi: Vec<f64> = outcome.series.records.iter().map(|r| r.spi).collect();

        assert!(spi[2].abs() < 0.05, "middle value SPI was {}", spi[2]);
        assert!(spi.windows(2).all(|w| w[1] > w[0]));
        assert!(spi[0] < -1.0 && spi[4] > 1.0);
        assert!(outcome.clamped.is_empty());
        Ok(())
    }

    #[test]
    fn keeps_keys_and_cardinality() -> Result<(), FitError> {
        let input = rolling(&[31.0, 12.5, 48.0, 22.0, 9.5, 70.25, 40.0]);
        let outcome = SpiTransformer::default().transform(&input)?;

        assert_eq!(outcome.series.len(), input.len());
        for (spi, rolled) in outcome.series.records.iter().zip(&input.records) {
            assert_eq!(spi.month, rolled.month);
            assert_eq!(spi.window, rolled.window);
            assert_eq!(spi.total_precip, rolled.total_precip);
            assert!(spi.spi.is_finite());
        }
        Ok(())
    }

    #[test]
    fn saturated_probability_is_clamped_and_recorded() -> Result<(), FitError> {
        // The outlier's cumulative probability is about 0.992, above 1 - epsilon.
        let transformer = SpiTransformer::new(0.01).unwrap();
        let outcome = transformer.transform(&rolling(&[100.0, 100.5, 101.0, 99.5, 99.0, 100.0, 400.0]))?;

        assert_eq!(outcome.clamped.len(), 1);
        assert_eq!(outcome.clamped[0].month, Month::new(9, 1990));
        let last = outcome.series.records.last().unwrap().spi;
        assert!(last.is_finite());
        assert!(outcome.clamped[0].probability > 0.99);
        assert_relative_eq!(last, 2.326_348, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn degenerate_station_is_an_error() {
        let result = SpiTransformer::default().transform(&rolling(&[12.0]));
        assert!(matches!(result, Err(FitError::Degenerate { .. })));
    }

    #[test]
    fn near_constant_sums_are_rejected_not_scored() {
        let values: Vec<f64> = (0..24).map(|i| 100.0 + (i % 3) as f64 * 1e-6).collect();
        let result = SpiTransformer::default().transform(&rolling(&values));
        assert!(matches!(result, Err(FitError::IllConditioned { .. })));
    }

    #[test]
    fn epsilon_must_be_a_probability_margin() {
        assert!(SpiTransformer::new(0.0).is_none());
        assert!(SpiTransformer::new(0.5).is_none());
        assert!(SpiTransformer::new(1e-9).is_some());
    }
}
