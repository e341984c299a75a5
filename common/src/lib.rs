pub mod tracer;

/// Scalar type of every decoded or derived sample value.
pub type Real = f64;

/// Position of a sample within a series.
pub type SampleIndex = usize;
