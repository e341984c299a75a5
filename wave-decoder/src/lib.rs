//! Decoding of IGOR binary wave (`.ibw`) files.
//!
//! Versions 1, 2, 3 and 5 of the container are understood, in either byte order.
//! Only one-dimensional real numeric waves are decoded; text, complex and
//! multi-dimensional waves are reported as unsupported. Samples keep the values
//! Igor stored; a data full scale, when present, is reported alongside them.
//!
//! ```ignore
//! let bytes = std::fs::read("recording_000.ibw")?;
//! let wave = wave_decoder::decode(&bytes)?;
//! println!("{} samples every {} {}", wave.len(), wave.sampling_interval(), wave.time_units());
//! ```
mod decoder;
mod error;
mod format;
pub(crate) mod header;
pub(crate) mod note;
mod reader;
mod wave;
mod writer;

pub use decoder::decode;
pub use error::{
    CorruptFileError, DecodeError, DecodeResult, EncodeError, EncodeResult, HeaderField,
    UnsupportedFormatError,
};
pub use format::{FormatVersion, NumericType};
pub use reader::{BinaryReader, Endianness, OutOfBounds};
pub use wave::{FullScale, TimeSeries, Wave};
pub use writer::WaveWriter;
