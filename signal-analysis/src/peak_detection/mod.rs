//! Local maxima detection with height, prominence and distance constraints.
//!
//! Candidates are filtered in that order: first by height, then (when enabled)
//! by prominence, and last by distance, so that distance suppression only ever
//! arbitrates between peaks that already qualify on their own.
mod candidates;
mod distance;
mod prominence;

use ibw_common::{Real, SampleIndex};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Parameter {
    #[strum(to_string = "minimum height")]
    MinHeight,
    #[strum(to_string = "minimum prominence")]
    MinProminence,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PeakDetectionError {
    #[error("Sample {index} is {value}, every sample must be finite")]
    InvalidInput { index: SampleIndex, value: Real },
    #[error("Invalid {parameter}: {value}")]
    InvalidParameter { parameter: Parameter, value: Real },
}

/// Constraints a local maximum must satisfy to be reported.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakParameters {
    pub min_height: Real,
    /// Minimum separation in samples between reported peaks, 0 disables.
    pub min_distance: usize,
    /// 0 disables.
    pub min_prominence: Real,
}

impl PeakParameters {
    pub fn new(min_height: Real) -> Self {
        Self {
            min_height,
            min_distance: 0,
            min_prominence: 0.0,
        }
    }

    pub fn with_min_distance(mut self, min_distance: usize) -> Self {
        self.min_distance = min_distance;
        self
    }

    pub fn with_min_prominence(mut self, min_prominence: Real) -> Self {
        self.min_prominence = min_prominence;
        self
    }

    fn validate(&self) -> Result<(), PeakDetectionError> {
        if self.min_height.is_nan() {
            return Err(PeakDetectionError::InvalidParameter {
                parameter: Parameter::MinHeight,
                value: self.min_height,
            });
        }
        if self.min_prominence.is_nan() || self.min_prominence < 0.0 {
            return Err(PeakDetectionError::InvalidParameter {
                parameter: Parameter::MinProminence,
                value: self.min_prominence,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    pub index: SampleIndex,
    pub height: Real,
    /// Only measured when prominence filtering is enabled.
    pub prominence: Option<Real>,
}

/// Peaks in ascending index order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakResult {
    peaks: Vec<Peak>,
}

impl PeakResult {
    pub fn iter(&self) -> std::slice::Iter<'_, Peak> {
        self.peaks.iter()
    }

    pub fn indices(&self) -> Vec<SampleIndex> {
        self.peaks.iter().map(|peak| peak.index).collect()
    }

    pub fn heights(&self) -> Vec<Real> {
        self.peaks.iter().map(|peak| peak.height).collect()
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }
}

impl IntoIterator for PeakResult {
    type Item = Peak;
    type IntoIter = std::vec::IntoIter<Peak>;

    fn into_iter(self) -> Self::IntoIter {
        self.peaks.into_iter()
    }
}

impl<'a> IntoIterator for &'a PeakResult {
    type Item = &'a Peak;
    type IntoIter = std::slice::Iter<'a, Peak>;

    fn into_iter(self) -> Self::IntoIter {
        self.peaks.iter()
    }
}

/// Finds the local maxima of `series` that satisfy `parameters`.
///
/// Series shorter than three samples, and series with no local maximum, give
/// an empty result. Any non-finite sample is rejected before detection starts.
pub fn find_peaks(
    series: &[Real],
    parameters: &PeakParameters,
) -> Result<PeakResult, PeakDetectionError> {
    parameters.validate()?;
    if let Some((index, &value)) = series
        .iter()
        .enumerate()
        .find(|(_, value)| !value.is_finite())
    {
        return Err(PeakDetectionError::InvalidInput { index, value });
    }

    let mut indices: Vec<SampleIndex> = candidates::local_maxima(series)
        .into_iter()
        .filter(|&index| series[index] >= parameters.min_height)
        .collect();

    let mut prominences = None;
    if parameters.min_prominence > 0.0 {
        let measured: Vec<(SampleIndex, Real)> = indices
            .iter()
            .map(|&index| (index, prominence::prominence(series, index)))
            .filter(|&(_, prominence)| prominence >= parameters.min_prominence)
            .collect();
        indices = measured.iter().map(|&(index, _)| index).collect();
        prominences = Some(measured);
    }

    if parameters.min_distance > 0 {
        indices = distance::suppress_close_peaks(series, &indices, parameters.min_distance);
    }

    let prominence_of = |index: SampleIndex| {
        prominences.as_ref().and_then(|measured| {
            measured
                .binary_search_by_key(&index, |&(index, _)| index)
                .ok()
                .and_then(|position| measured.get(position))
                .map(|&(_, prominence)| prominence)
        })
    };
    let peaks = indices
        .into_iter()
        .map(|index| Peak {
            index,
            height: series[index],
            prominence: prominence_of(index),
        })
        .collect();
    Ok(PeakResult { peaks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const KNOWN: [Real; 9] = [0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 5.0, 1.0, 0.0];

    #[test]
    fn known_signal() {
        let result = find_peaks(&KNOWN, &PeakParameters::new(2.0)).unwrap();
        assert_eq!(result.indices(), vec![2, 6]);
        assert_eq!(result.heights(), vec![3.0, 5.0]);
        assert!(result.iter().all(|peak| peak.prominence.is_none()));
    }

    #[test]
    fn height_threshold_is_inclusive() {
        let result = find_peaks(&KNOWN, &PeakParameters::new(3.0)).unwrap();
        assert_eq!(result.indices(), vec![2, 6]);
        let result = find_peaks(&KNOWN, &PeakParameters::new(3.5)).unwrap();
        assert_eq!(result.indices(), vec![6]);
    }

    #[test]
    fn distance_prefers_taller_peak() {
        let parameters = PeakParameters::new(0.0).with_min_distance(5);
        let result = find_peaks(&KNOWN, &parameters).unwrap();
        assert_eq!(result.indices(), vec![6]);
        assert_eq!(result.heights(), vec![5.0]);

        let parameters = PeakParameters::new(2.0).with_min_distance(5);
        assert_eq!(find_peaks(&KNOWN, &parameters).unwrap().indices(), vec![6]);
    }

    #[test]
    fn distance_prefers_leftmost_of_equal_heights() {
        let series = [0.0, 7.0, 0.0, 7.0, 0.0];
        let parameters = PeakParameters::new(1.0).with_min_distance(3);
        assert_eq!(find_peaks(&series, &parameters).unwrap().indices(), vec![1]);
    }

    #[test]
    fn prominence_filter() {
        let series = [0.0, 4.0, 3.5, 3.8, 0.0, 6.0, 0.0];
        let parameters = PeakParameters::new(0.0).with_min_prominence(1.0);
        let result = find_peaks(&series, &parameters).unwrap();
        assert_eq!(result.indices(), vec![1, 5]);
        let prominences: Vec<Real> = result.iter().filter_map(|peak| peak.prominence).collect();
        assert_approx_eq!(prominences[0], 4.0);
        assert_approx_eq!(prominences[1], 6.0);
    }

    #[test]
    fn distance_keeps_taller_prominent_peak() {
        let series = [0.0, 4.0, 3.5, 3.8, 0.0, 6.0, 0.0];
        let parameters = PeakParameters::new(0.0)
            .with_min_prominence(1.0)
            .with_min_distance(5);
        let result = find_peaks(&series, &parameters).unwrap();
        assert_eq!(result.indices(), vec![5]);
        assert_approx_eq!(result.iter().next().unwrap().prominence.unwrap(), 6.0);
    }

    #[test]
    fn prominence_applied_before_distance() {
        // The shoulder at 4 is tall but not prominent. It must not suppress the peak at 1.
        let series = [0.0, 5.0, 0.0, 0.0, 9.0, 8.8, 8.8, 8.8, 8.8, 10.0, 0.0];
        let parameters = PeakParameters::new(0.0)
            .with_min_prominence(1.0)
            .with_min_distance(4);
        let result = find_peaks(&series, &parameters).unwrap();
        assert_eq!(result.indices(), vec![1, 9]);
    }

    #[test]
    fn plateau_detected_once() {
        let series = [0.0, 1.0, 2.0, 2.0, 2.0, 1.0, 0.0];
        let result = find_peaks(&series, &PeakParameters::new(0.0)).unwrap();
        assert_eq!(result.indices(), vec![2]);
    }

    #[test]
    fn degenerate_series_are_empty() {
        let parameters = PeakParameters::new(Real::NEG_INFINITY);
        assert!(find_peaks(&[], &parameters).unwrap().is_empty());
        assert!(find_peaks(&[1.0, 2.0], &parameters).unwrap().is_empty());
        assert!(find_peaks(&[4.0; 100], &parameters).unwrap().is_empty());
        let below = PeakParameters::new(10.0);
        assert!(find_peaks(&KNOWN, &below).unwrap().is_empty());
    }

    #[test]
    fn negative_going_signal() {
        let series = [-65.0, -64.0, -20.0, -64.0, -65.0, -12.0, -66.0];
        let result = find_peaks(&series, &PeakParameters::new(-15.0)).unwrap();
        assert_eq!(result.indices(), vec![5]);
    }

    #[test]
    fn nan_input_rejected() {
        let series = [0.0, 1.0, Real::NAN, 1.0, 0.0];
        let result = find_peaks(&series, &PeakParameters::new(0.0));
        assert!(matches!(
            result,
            Err(PeakDetectionError::InvalidInput { index: 2, value }) if value.is_nan()
        ));
        // rejected even when too short to hold a peak
        assert!(find_peaks(&[Real::NAN], &PeakParameters::new(0.0)).is_err());
    }

    #[test]
    fn invalid_parameters() {
        assert!(matches!(
            find_peaks(&KNOWN, &PeakParameters::new(Real::NAN)),
            Err(PeakDetectionError::InvalidParameter {
                parameter: Parameter::MinHeight,
                ..
            })
        ));
        assert_eq!(
            find_peaks(&KNOWN, &PeakParameters::new(0.0).with_min_prominence(-1.0)),
            Err(PeakDetectionError::InvalidParameter {
                parameter: Parameter::MinProminence,
                value: -1.0
            })
        );
    }

    #[test]
    fn result_properties() {
        let series: Vec<Real> = (0..500)
            .map(|i| ((i * 37) % 101) as Real + (i as Real * 0.3).sin())
            .collect();
        let parameters = PeakParameters::new(40.0).with_min_distance(7);
        let result = find_peaks(&series, &parameters).unwrap();
        assert!(!result.is_empty());
        let indices = result.indices();
        assert!(indices.windows(2).all(|pair| pair[1] >= pair[0] + 7));
        assert!(result.heights().iter().all(|&height| height >= 40.0));
    }
}
