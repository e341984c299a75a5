//! Parsing of the binary header and wave header that precede the samples.
//!
//! Nothing in here is trusted until it has been checked: the checksum covers
//! both headers, every declared size must be non-negative, and `wfmSize` must
//! agree with the sample count and numeric type.

use crate::{
    error::{CorruptFileError, DecodeError, DecodeResult, HeaderField, UnsupportedFormatError},
    format::{FormatVersion, NumericType},
    reader::{BinaryReader, Endianness},
    wave::FullScale,
};
use ibw_common::Real;

/// The blocks that may follow the samples, in file order for a given version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrailingSection {
    Note,
    Formula,
    DataUnits,
    TimeUnits,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WaveHeader {
    pub(crate) version: FormatVersion,
    pub(crate) endianness: Endianness,
    pub(crate) numeric_type: NumericType,
    pub(crate) sample_count: usize,
    pub(crate) sections: Vec<(TrailingSection, usize)>,
    pub(crate) name: String,
    pub(crate) data_units: String,
    pub(crate) time_units: String,
    pub(crate) sampling_interval: Real,
    pub(crate) start_offset: Real,
    pub(crate) full_scale: Option<FullScale>,
    pub(crate) creation_date: u32,
}

/// The fields of the binary header, common to all versions.
#[derive(Default)]
struct BinHeader {
    waveform_size: usize,
    note_size: usize,
    formula_size: usize,
    data_units_size: usize,
    time_units_size: usize,
}

/// The fields of either wave header layout.
struct WaveFields {
    type_code: i16,
    name: String,
    data_units: String,
    time_units: String,
    sample_count: i32,
    dimensions: [i32; 4],
    sampling_interval: Real,
    start_offset: Real,
    fs_valid: bool,
    top_full_scale: Real,
    bottom_full_scale: Real,
    creation_date: u32,
}

/// Sum of the 16-bit words of `region`, in the given byte order.
pub(crate) fn checksum(region: &[u8], endianness: Endianness) -> u16 {
    region
        .chunks_exact(2)
        .filter_map(|word| <[u8; 2]>::try_from(word).ok())
        .map(|word| match endianness {
            Endianness::Little => u16::from_le_bytes(word),
            Endianness::Big => u16::from_be_bytes(word),
        })
        .fold(0, u16::wrapping_add)
}

fn truncated(offset: usize, required: usize, remaining: usize) -> DecodeError {
    CorruptFileError::Truncated {
        offset,
        required,
        remaining,
    }
    .into()
}

fn read_size(
    reader: &mut BinaryReader<'_>,
    endianness: Endianness,
    field: HeaderField,
) -> DecodeResult<usize> {
    let value = reader.read_i32(endianness)?;
    usize::try_from(value).map_err(|_| {
        CorruptFileError::NegativeSize {
            field,
            value: value.into(),
        }
        .into()
    })
}

/// Reads the version marker, which also determines the byte order of the file.
fn detect_version(reader: &mut BinaryReader<'_>) -> DecodeResult<(FormatVersion, Endianness)> {
    if reader.remaining() < 2 {
        return Err(truncated(reader.position(), 2, reader.remaining()));
    }
    let start = reader.position();
    let marker = reader.read_u16(Endianness::Little)?;
    if let Some(version) = FormatVersion::from_marker(marker) {
        return Ok((version, Endianness::Little));
    }
    reader.seek(start)?;
    let swapped = reader.read_u16(Endianness::Big)?;
    FormatVersion::from_marker(swapped)
        .map(|version| (version, Endianness::Big))
        .ok_or_else(|| UnsupportedFormatError::UnknownVersion(marker).into())
}

fn read_bin_header(
    reader: &mut BinaryReader<'_>,
    version: FormatVersion,
    endianness: Endianness,
) -> DecodeResult<BinHeader> {
    let e = endianness;
    let header = match version {
        FormatVersion::V1 => {
            let waveform_size = read_size(reader, e, HeaderField::WaveformSize)?;
            reader.skip(2)?; // checksum
            BinHeader {
                waveform_size,
                ..Default::default()
            }
        }
        FormatVersion::V2 => {
            let waveform_size = read_size(reader, e, HeaderField::WaveformSize)?;
            let note_size = read_size(reader, e, HeaderField::NoteSize)?;
            reader.skip(4 + 2)?; // pictSize, checksum
            BinHeader {
                waveform_size,
                note_size,
                ..Default::default()
            }
        }
        FormatVersion::V3 => {
            let waveform_size = read_size(reader, e, HeaderField::WaveformSize)?;
            let note_size = read_size(reader, e, HeaderField::NoteSize)?;
            let formula_size = read_size(reader, e, HeaderField::FormulaSize)?;
            reader.skip(4 + 2)?; // pictSize, checksum
            BinHeader {
                waveform_size,
                note_size,
                formula_size,
                ..Default::default()
            }
        }
        FormatVersion::V5 => {
            reader.skip(2)?; // checksum
            let waveform_size = read_size(reader, e, HeaderField::WaveformSize)?;
            let formula_size = read_size(reader, e, HeaderField::FormulaSize)?;
            let note_size = read_size(reader, e, HeaderField::NoteSize)?;
            let data_units_size = read_size(reader, e, HeaderField::DataUnitsSize)?;
            let time_units_size = read_size(reader, e, HeaderField::DimensionUnitsSize)?;
            // remaining dimEUnitsSize, dimLabelsSize[4], sIndicesSize, optionsSize1/2
            reader.skip(12 + 16 + 4 + 8)?;
            BinHeader {
                waveform_size,
                note_size,
                formula_size,
                data_units_size,
                time_units_size,
            }
        }
    };
    Ok(header)
}

fn read_wave_header2(reader: &mut BinaryReader<'_>, e: Endianness) -> DecodeResult<WaveFields> {
    let type_code = reader.read_i16(e)?;
    reader.skip(4)?; // next
    let name = reader.read_fixed_string(20)?;
    reader.skip(2 + 2 + 4)?; // whVersion, srcFolder, fileName
    let data_units = reader.read_fixed_string(4)?;
    let time_units = reader.read_fixed_string(4)?;
    let sample_count = reader.read_i32(e)?;
    reader.skip(2)?; // aModified
    let sampling_interval = reader.read_f64(e)?;
    let start_offset = reader.read_f64(e)?;
    reader.skip(2 + 2)?; // wModified, swModified
    let fs_valid = reader.read_i16(e)? != 0;
    let top_full_scale = reader.read_f64(e)?;
    let bottom_full_scale = reader.read_f64(e)?;
    reader.skip(1 + 1 + 4 + 4)?; // useBits, kindBits, formula, depID
    let creation_date = reader.read_u32(e)?;
    Ok(WaveFields {
        type_code,
        name,
        data_units,
        time_units,
        sample_count,
        dimensions: [sample_count, 0, 0, 0],
        sampling_interval,
        start_offset,
        fs_valid,
        top_full_scale,
        bottom_full_scale,
        creation_date,
    })
}

fn read_wave_header5(reader: &mut BinaryReader<'_>, e: Endianness) -> DecodeResult<WaveFields> {
    reader.skip(4)?; // next
    let creation_date = reader.read_u32(e)?;
    reader.skip(4)?; // modDate
    let sample_count = reader.read_i32(e)?;
    let type_code = reader.read_i16(e)?;
    reader.skip(2 + 6 + 2)?; // dLock, whpad1, whVersion
    let name = reader.read_fixed_string(32)?;
    reader.skip(4 + 4)?; // whpad2, dFolder
    let mut dimensions = [0; 4];
    for dimension in &mut dimensions {
        *dimension = reader.read_i32(e)?;
    }
    let sampling_interval = reader.read_f64(e)?;
    reader.skip(3 * 8)?;
    let start_offset = reader.read_f64(e)?;
    reader.skip(3 * 8)?;
    let data_units = reader.read_fixed_string(4)?;
    let time_units = reader.read_fixed_string(4)?;
    reader.skip(3 * 4)?;
    let fs_valid = reader.read_i16(e)? != 0;
    reader.skip(2)?; // whpad3
    let top_full_scale = reader.read_f64(e)?;
    let bottom_full_scale = reader.read_f64(e)?;
    Ok(WaveFields {
        type_code,
        name,
        data_units,
        time_units,
        sample_count,
        dimensions,
        sampling_interval,
        start_offset,
        fs_valid,
        top_full_scale,
        bottom_full_scale,
        creation_date,
    })
}

impl WaveHeader {
    /// Reads and validates both headers. On success the reader is positioned at the first sample.
    pub(crate) fn read(reader: &mut BinaryReader<'_>) -> DecodeResult<Self> {
        let start = reader.position();
        let (version, endianness) = detect_version(reader)?;

        let mut region = reader.clone();
        region.seek(start)?;
        let region = region
            .read_fixed_bytes(version.data_offset())
            .map_err(|e| truncated(start, version.data_offset(), e.remaining))?;
        let sum = checksum(region, endianness);
        if sum != 0 {
            return Err(CorruptFileError::ChecksumMismatch(sum).into());
        }

        let bin = read_bin_header(reader, version, endianness)?;
        let fields = match version {
            FormatVersion::V1 | FormatVersion::V2 | FormatVersion::V3 => {
                read_wave_header2(reader, endianness)?
            }
            FormatVersion::V5 => read_wave_header5(reader, endianness)?,
        };
        reader.seek(start + version.data_offset())?;

        let numeric_type = NumericType::from_type_code(fields.type_code)?;
        if fields.dimensions.iter().skip(1).any(|&d| d != 0) {
            return Err(UnsupportedFormatError::MultiDimensional(fields.dimensions).into());
        }
        let sample_count =
            usize::try_from(fields.sample_count).map_err(|_| CorruptFileError::NegativeSize {
                field: HeaderField::SampleCount,
                value: fields.sample_count.into(),
            })?;
        if sample_count == 0 {
            return Err(DecodeError::EmptyWave);
        }
        let [rows, ..] = fields.dimensions;
        if rows != 0 && rows != fields.sample_count {
            return Err(CorruptFileError::PayloadSizeMismatch {
                field: HeaderField::Dimension,
                declared: usize::try_from(rows).unwrap_or_default(),
                expected: sample_count,
            }
            .into());
        }

        let expected_size = sample_count
            .checked_mul(numeric_type.byte_width())
            .and_then(|bytes| bytes.checked_add(version.wave_header_size() + version.padding()))
            .ok_or(CorruptFileError::PayloadSizeMismatch {
                field: HeaderField::WaveformSize,
                declared: bin.waveform_size,
                expected: usize::MAX,
            })?;
        if bin.waveform_size != expected_size {
            return Err(CorruptFileError::PayloadSizeMismatch {
                field: HeaderField::WaveformSize,
                declared: bin.waveform_size,
                expected: expected_size,
            }
            .into());
        }

        if !(fields.sampling_interval.is_finite() && fields.sampling_interval > 0.0) {
            return Err(CorruptFileError::InvalidSamplingInterval(fields.sampling_interval).into());
        }
        if !fields.start_offset.is_finite() {
            return Err(CorruptFileError::InvalidStartOffset(fields.start_offset).into());
        }

        let sections = match version {
            FormatVersion::V1 => Vec::new(),
            FormatVersion::V2 => vec![(TrailingSection::Note, bin.note_size)],
            FormatVersion::V3 => vec![
                (TrailingSection::Note, bin.note_size),
                (TrailingSection::Formula, bin.formula_size),
            ],
            FormatVersion::V5 => vec![
                (TrailingSection::Formula, bin.formula_size),
                (TrailingSection::Note, bin.note_size),
                (TrailingSection::DataUnits, bin.data_units_size),
                (TrailingSection::TimeUnits, bin.time_units_size),
            ],
        };

        Ok(WaveHeader {
            version,
            endianness,
            numeric_type,
            sample_count,
            sections,
            name: fields.name,
            data_units: fields.data_units,
            time_units: fields.time_units,
            sampling_interval: fields.sampling_interval,
            start_offset: fields.start_offset,
            full_scale: fields.fs_valid.then_some(FullScale {
                bottom: fields.bottom_full_scale,
                top: fields.top_full_scale,
            }),
            creation_date: fields.creation_date,
        })
    }

    pub(crate) fn data_bytes(&self) -> usize {
        self.sample_count * self.numeric_type.byte_width()
    }

    /// Bytes that must follow the first sample: samples, padding and every trailing section.
    pub(crate) fn required_payload(&self) -> Option<usize> {
        self.sections
            .iter()
            .try_fold(self.data_bytes() + self.version.padding(), |total, (_, size)| {
                total.checked_add(*size)
            })
    }
}
