//! Analysis of decoded waves: averaging across recordings and spike detection.
mod aggregator;
mod peak_detection;

pub use aggregator::{AggregateSeries, AggregationError, aggregate};
pub use peak_detection::{
    Parameter, Peak, PeakDetectionError, PeakParameters, PeakResult, find_peaks,
};
