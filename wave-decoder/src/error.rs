use crate::reader::OutOfBounds;
use ibw_common::Real;
use thiserror::Error;

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Header fields whose declared values are validated before they are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum HeaderField {
    #[strum(to_string = "wfmSize")]
    WaveformSize,
    #[strum(to_string = "noteSize")]
    NoteSize,
    #[strum(to_string = "formulaSize")]
    FormulaSize,
    #[strum(to_string = "dataEUnitsSize")]
    DataUnitsSize,
    #[strum(to_string = "dimEUnitsSize")]
    DimensionUnitsSize,
    #[strum(to_string = "npnts")]
    SampleCount,
    #[strum(to_string = "nDim")]
    Dimension,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedFormatError {
    #[error("Unrecognised Version Marker {0:#06x}")]
    UnknownVersion(u16),
    #[error("Text Waves are not Supported")]
    TextWave,
    #[error("Complex Waves are not Supported (type code {0:#04x})")]
    ComplexWave(i16),
    #[error("Unknown Numeric Type Code {0:#04x}")]
    NumericType(i16),
    #[error("Multi-dimensional Waves are not Supported (dimensions {0:?})")]
    MultiDimensional([i32; 4]),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorruptFileError {
    #[error("Header Checksum Mismatch: words sum to {0:#06x}")]
    ChecksumMismatch(u16),
    #[error("Negative Declared Size {value} in {field}")]
    NegativeSize { field: HeaderField, value: i64 },
    #[error("Declared {field} {declared} differs from the {expected} bytes the header implies")]
    PayloadSizeMismatch {
        field: HeaderField,
        declared: usize,
        expected: usize,
    },
    #[error("Truncated: {required} bytes declared after offset {offset}, {remaining} available")]
    Truncated {
        offset: usize,
        required: usize,
        remaining: usize,
    },
    #[error("Sampling Interval {0} is not Positive and Finite")]
    InvalidSamplingInterval(Real),
    #[error("Start Offset {0} is not Finite")]
    InvalidStartOffset(Real),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("{0}")]
    OutOfBounds(#[from] OutOfBounds),
    #[error("Unsupported Format: {0}")]
    UnsupportedFormat(#[from] UnsupportedFormatError),
    #[error("Corrupt File: {0}")]
    CorruptFile(#[from] CorruptFileError),
    #[error("Wave Declares Zero Samples")]
    EmptyWave,
}

pub type EncodeResult<T> = Result<T, EncodeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Cannot Encode a Wave with no Samples")]
    NoSamples,
    #[error("Wave Name '{name}' exceeds the {capacity} bytes available")]
    NameTooLong { name: String, capacity: usize },
    #[error("Units '{0}' exceed the 3 bytes available before version 5")]
    UnitsTooLong(String),
    #[error("Version 1 Files cannot hold a Note")]
    NoteNotSupported,
    #[error("Section of {0} bytes cannot be Declared in a 32 bit Header Field")]
    SectionTooLarge(usize),
}
