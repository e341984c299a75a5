use ibw_common::Real;
use ndarray::{Array2, ArrayView1, Axis};
use thiserror::Error;
use wave_decoder::TimeSeries;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("No Waves to Aggregate")]
    EmptyInput,
    #[error("Wave {index} has {actual} samples, expected {expected}")]
    LengthMismatch {
        expected: usize,
        index: usize,
        actual: usize,
    },
}

/// The sample-wise mean of several equal-length series.
///
/// Timing and units are those of the first series aggregated.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSeries {
    samples: Vec<Real>,
    sampling_interval: Real,
    start_offset: Real,
    data_units: String,
    time_units: String,
    wave_count: usize,
}

impl AggregateSeries {
    /// Number of series that contributed to the mean.
    pub fn wave_count(&self) -> usize {
        self.wave_count
    }

    pub fn into_samples(self) -> Vec<Real> {
        self.samples
    }
}

impl TimeSeries for AggregateSeries {
    fn samples(&self) -> &[Real] {
        &self.samples
    }

    fn sampling_interval(&self) -> Real {
        self.sampling_interval
    }

    fn start_offset(&self) -> Real {
        self.start_offset
    }

    fn data_units(&self) -> &str {
        &self.data_units
    }

    fn time_units(&self) -> &str {
        &self.time_units
    }
}

/// Averages `waves` position by position.
///
/// Every wave must hold as many samples as the first; the first that does not
/// is reported by its position in `waves` together with its length.
pub fn aggregate<W: TimeSeries>(waves: &[W]) -> Result<AggregateSeries, AggregationError> {
    let first = waves.first().ok_or(AggregationError::EmptyInput)?;
    let expected = first.len();
    if let Some((index, wave)) = waves
        .iter()
        .enumerate()
        .find(|(_, wave)| wave.len() != expected)
    {
        return Err(AggregationError::LengthMismatch {
            expected,
            index,
            actual: wave.len(),
        });
    }

    let mut matrix = Array2::<Real>::zeros((waves.len(), expected));
    for (mut row, wave) in matrix.rows_mut().into_iter().zip(waves) {
        row.assign(&ArrayView1::from(wave.samples()));
    }
    let mean = matrix
        .mean_axis(Axis(0))
        .ok_or(AggregationError::EmptyInput)?;

    Ok(AggregateSeries {
        samples: mean.to_vec(),
        sampling_interval: first.sampling_interval(),
        start_offset: first.start_offset(),
        data_units: first.data_units().to_owned(),
        time_units: first.time_units().to_owned(),
        wave_count: waves.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[derive(Clone)]
    struct Series {
        samples: Vec<Real>,
        interval: Real,
        units: &'static str,
    }

    impl Series {
        fn new(samples: Vec<Real>) -> Self {
            Self {
                samples,
                interval: 0.1,
                units: "mV",
            }
        }
    }

    impl TimeSeries for Series {
        fn samples(&self) -> &[Real] {
            &self.samples
        }

        fn sampling_interval(&self) -> Real {
            self.interval
        }

        fn start_offset(&self) -> Real {
            0.0
        }

        fn data_units(&self) -> &str {
            self.units
        }

        fn time_units(&self) -> &str {
            "s"
        }
    }

    fn ramp(len: usize, slope: Real) -> Series {
        Series::new((0..len).map(|i| i as Real * slope).collect())
    }

    #[test]
    fn mean_of_two() {
        let result = aggregate(&[ramp(5, 1.0), ramp(5, 3.0)]).unwrap();
        assert_eq!(result.samples(), &[0.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(result.wave_count(), 2);
    }

    #[test]
    fn commutative() {
        let a = Series::new(vec![0.1, -7.25, 3.3, 1e-3]);
        let b = Series::new(vec![2.7, 0.4, -1.9, 5e4]);
        let forward = aggregate(&[a.clone(), b.clone()]).unwrap();
        let backward = aggregate(&[b, a]).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn inherits_first_metadata() {
        let mut second = ramp(3, 1.0);
        second.interval = 0.5;
        second.units = "pA";
        let result = aggregate(&[ramp(3, 1.0), second]).unwrap();
        assert_eq!(result.sampling_interval(), 0.1);
        assert_eq!(result.data_units(), "mV");
        assert_eq!(result.time_units(), "s");
        assert_approx_eq!(result.time_at(2), 0.2);
    }

    #[test]
    fn single_wave_is_itself() {
        let result = aggregate(&[ramp(4, 0.5)]).unwrap();
        assert_eq!(result.into_samples(), vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn length_mismatch() {
        assert_eq!(
            aggregate(&[ramp(10, 1.0), ramp(12, 1.0)]),
            Err(AggregationError::LengthMismatch {
                expected: 10,
                index: 1,
                actual: 12
            })
        );
    }

    #[test]
    fn empty_input() {
        let waves: [Series; 0] = [];
        assert_eq!(aggregate(&waves), Err(AggregationError::EmptyInput));
    }

    #[test]
    fn long_series_stay_accurate() {
        let waves: Vec<Series> = (0..8)
            .map(|k| Series::new(vec![1e6 + k as Real * 1e-3; 50_000]))
            .collect();
        let result = aggregate(&waves).unwrap();
        for value in result.samples() {
            assert_approx_eq!(*value, 1e6 + 3.5e-3, 1e-6);
        }
    }
}
