use crate::error::UnsupportedFormatError;

/// The versions of the IGOR binary wave container that can be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum FormatVersion {
    #[strum(to_string = "IBW v1")]
    V1,
    #[strum(to_string = "IBW v2")]
    V2,
    #[strum(to_string = "IBW v3")]
    V3,
    #[strum(to_string = "IBW v5")]
    V5,
}

impl FormatVersion {
    pub fn from_marker(marker: u16) -> Option<Self> {
        match marker {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            3 => Some(Self::V3),
            5 => Some(Self::V5),
            _ => None,
        }
    }

    pub fn marker(self) -> u16 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
            Self::V5 => 5,
        }
    }

    pub(crate) fn bin_header_size(self) -> usize {
        match self {
            Self::V1 => 8,
            Self::V2 => 16,
            Self::V3 => 20,
            Self::V5 => 64,
        }
    }

    /// Size of the wave header, excluding the placeholder for the first samples.
    pub(crate) fn wave_header_size(self) -> usize {
        match self {
            Self::V1 | Self::V2 | Self::V3 => 110,
            Self::V5 => 320,
        }
    }

    /// Offset of the first sample, which is also the extent of the checksummed region.
    pub(crate) fn data_offset(self) -> usize {
        self.bin_header_size() + self.wave_header_size()
    }

    /// Offset of the checksum field within the binary header.
    pub(crate) fn checksum_offset(self) -> usize {
        match self {
            Self::V1 => 6,
            Self::V2 => 14,
            Self::V3 => 18,
            Self::V5 => 2,
        }
    }

    /// Bytes of padding written between the samples and the first trailing section.
    pub(crate) fn padding(self) -> usize {
        match self {
            Self::V1 | Self::V2 | Self::V3 => 16,
            Self::V5 => 0,
        }
    }

    /// Capacity of the wave name field, including its terminating NUL.
    pub(crate) fn name_capacity(self) -> usize {
        match self {
            Self::V1 | Self::V2 | Self::V3 => 20,
            Self::V5 => 32,
        }
    }
}

const COMPLEX_FLAG: i16 = 0x01;
const UNSIGNED_FLAG: i16 = 0x40;

/// Storage type of the raw samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum NumericType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl NumericType {
    pub fn from_type_code(code: i16) -> Result<Self, UnsupportedFormatError> {
        if code == 0 {
            return Err(UnsupportedFormatError::TextWave);
        }
        if code & COMPLEX_FLAG != 0 {
            return Err(UnsupportedFormatError::ComplexWave(code));
        }
        match code {
            0x02 => Ok(Self::Float32),
            0x04 => Ok(Self::Float64),
            0x08 => Ok(Self::Int8),
            0x10 => Ok(Self::Int16),
            0x20 => Ok(Self::Int32),
            0x80 => Ok(Self::Int64),
            0x48 => Ok(Self::UInt8),
            0x50 => Ok(Self::UInt16),
            0x60 => Ok(Self::UInt32),
            0xC0 => Ok(Self::UInt64),
            _ => Err(UnsupportedFormatError::NumericType(code)),
        }
    }

    pub fn type_code(self) -> i16 {
        match self {
            Self::Float32 => 0x02,
            Self::Float64 => 0x04,
            Self::Int8 => 0x08,
            Self::Int16 => 0x10,
            Self::Int32 => 0x20,
            Self::Int64 => 0x80,
            Self::UInt8 => 0x08 | UNSIGNED_FLAG,
            Self::UInt16 => 0x10 | UNSIGNED_FLAG,
            Self::UInt32 => 0x20 | UNSIGNED_FLAG,
            Self::UInt64 => 0x80 | UNSIGNED_FLAG,
        }
    }

    pub fn byte_width(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn type_codes_round_trip() {
        for numeric_type in NumericType::iter() {
            assert_eq!(
                NumericType::from_type_code(numeric_type.type_code()),
                Ok(numeric_type)
            );
        }
    }

    #[test]
    fn rejected_type_codes() {
        assert_eq!(
            NumericType::from_type_code(0),
            Err(UnsupportedFormatError::TextWave)
        );
        assert_eq!(
            NumericType::from_type_code(0x03),
            Err(UnsupportedFormatError::ComplexWave(0x03))
        );
        assert_eq!(
            NumericType::from_type_code(0x42),
            Err(UnsupportedFormatError::NumericType(0x42))
        );
    }

    #[test]
    fn data_offsets() {
        let offsets: Vec<_> = FormatVersion::iter().map(FormatVersion::data_offset).collect();
        assert_eq!(offsets, vec![118, 126, 130, 384]);
        for version in FormatVersion::iter() {
            assert_eq!(FormatVersion::from_marker(version.marker()), Some(version));
        }
        assert_eq!(FormatVersion::from_marker(4), None);
    }
}
