use crate::format::FormatVersion;
use chrono::{DateTime, Utc};
use ibw_common::Real;

/// A uniformly sampled series with a time axis.
///
/// `time_at` is derived from the interval and the start offset and is never stored.
pub trait TimeSeries {
    fn samples(&self) -> &[Real];

    fn sampling_interval(&self) -> Real;

    fn start_offset(&self) -> Real;

    fn data_units(&self) -> &str;

    fn time_units(&self) -> &str;

    fn len(&self) -> usize {
        self.samples().len()
    }

    fn is_empty(&self) -> bool {
        self.samples().is_empty()
    }

    fn time_at(&self, index: usize) -> Real {
        self.start_offset() + index as Real * self.sampling_interval()
    }

    fn times(&self) -> impl Iterator<Item = Real> + '_ {
        (0..self.len()).map(|index| self.time_at(index))
    }

    /// Time spanned from the first to the last sample.
    fn duration(&self) -> Real {
        self.len().saturating_sub(1) as Real * self.sampling_interval()
    }
}

impl<T: TimeSeries> TimeSeries for &T {
    fn samples(&self) -> &[Real] {
        (**self).samples()
    }

    fn sampling_interval(&self) -> Real {
        (**self).sampling_interval()
    }

    fn start_offset(&self) -> Real {
        (**self).start_offset()
    }

    fn data_units(&self) -> &str {
        (**self).data_units()
    }

    fn time_units(&self) -> &str {
        (**self).time_units()
    }
}

/// The data full scale (`SetScale d`) recorded with a wave.
///
/// Igor keeps it as documentation of the expected data range; it is never
/// applied to the stored samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FullScale {
    pub bottom: Real,
    pub top: Real,
}

impl FullScale {
    pub fn contains(&self, value: Real) -> bool {
        (self.bottom.min(self.top)..=self.bottom.max(self.top)).contains(&value)
    }
}

/// A decoded one-dimensional recording. Samples are the stored values, widened to [`Real`].
#[derive(Debug, Clone, PartialEq)]
pub struct Wave {
    name: String,
    samples: Vec<Real>,
    sampling_interval: Real,
    start_offset: Real,
    data_units: String,
    time_units: String,
    note: String,
    full_scale: Option<FullScale>,
    version: FormatVersion,
    created: Option<DateTime<Utc>>,
}

/// Everything but the samples, gathered by the decoder before the wave is built.
#[derive(Debug, Clone)]
pub(crate) struct WaveMetadata {
    pub(crate) name: String,
    pub(crate) sampling_interval: Real,
    pub(crate) start_offset: Real,
    pub(crate) data_units: String,
    pub(crate) time_units: String,
    pub(crate) note: String,
    pub(crate) full_scale: Option<FullScale>,
    pub(crate) version: FormatVersion,
    pub(crate) created: Option<DateTime<Utc>>,
}

impl Wave {
    pub(crate) fn new(samples: Vec<Real>, metadata: WaveMetadata) -> Self {
        Self {
            name: metadata.name,
            samples,
            sampling_interval: metadata.sampling_interval,
            start_offset: metadata.start_offset,
            data_units: metadata.data_units,
            time_units: metadata.time_units,
            note: metadata.note,
            full_scale: metadata.full_scale,
            version: metadata.version,
            created: metadata.created,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn full_scale(&self) -> Option<FullScale> {
        self.full_scale
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn into_samples(self) -> Vec<Real> {
        self.samples
    }
}

impl TimeSeries for Wave {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_range_in_either_order() {
        let full_scale = FullScale {
            bottom: 10.0,
            top: -10.0,
        };
        assert!(full_scale.contains(-10.0));
        assert!(full_scale.contains(3.5));
        assert!(!full_scale.contains(10.5));
    }
}
