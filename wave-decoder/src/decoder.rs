use crate::{
    error::{CorruptFileError, DecodeResult},
    format::NumericType,
    header::{TrailingSection, WaveHeader},
    note,
    reader::{BinaryReader, Endianness, OutOfBounds},
    wave::{Wave, WaveMetadata},
};
use chrono::{DateTime, Utc};
use ibw_common::Real;

/// Seconds between the Macintosh epoch (1904-01-01) used by Igor and the Unix epoch.
pub(crate) const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

pub(crate) fn creation_time(mac_seconds: u32) -> Option<DateTime<Utc>> {
    (mac_seconds != 0)
        .then(|| DateTime::from_timestamp(i64::from(mac_seconds) - MAC_EPOCH_OFFSET, 0))
        .flatten()
}

fn read_raw_samples(
    reader: &mut BinaryReader<'_>,
    numeric_type: NumericType,
    count: usize,
    e: Endianness,
) -> Result<Vec<Real>, OutOfBounds> {
    (0..count)
        .map(|_| -> Result<Real, OutOfBounds> {
            Ok(match numeric_type {
                NumericType::Int8 => Real::from(reader.read_i8()?),
                NumericType::UInt8 => Real::from(reader.read_u8()?),
                NumericType::Int16 => Real::from(reader.read_i16(e)?),
                NumericType::UInt16 => Real::from(reader.read_u16(e)?),
                NumericType::Int32 => Real::from(reader.read_i32(e)?),
                NumericType::UInt32 => Real::from(reader.read_u32(e)?),
                NumericType::Int64 => reader.read_i64(e)? as Real,
                NumericType::UInt64 => reader.read_u64(e)? as Real,
                NumericType::Float32 => Real::from(reader.read_f32(e)?),
                NumericType::Float64 => reader.read_f64(e)?,
            })
        })
        .collect()
}

#[derive(Default)]
struct TrailingText {
    note: String,
    data_units: String,
    time_units: String,
}

fn read_trailing_sections(
    reader: &mut BinaryReader<'_>,
    sections: &[(TrailingSection, usize)],
) -> Result<TrailingText, OutOfBounds> {
    let mut text = TrailingText::default();
    for &(section, size) in sections {
        let bytes = reader.read_fixed_bytes(size)?;
        let value = String::from_utf8_lossy(bytes)
            .trim_end_matches(['\0', ' '])
            .to_owned();
        match section {
            TrailingSection::Note => text.note = value,
            TrailingSection::DataUnits => text.data_units = value,
            TrailingSection::TimeUnits => text.time_units = value,
            TrailingSection::Formula => {}
        }
    }
    Ok(text)
}

/// Picks the first non-empty candidate.
fn resolve_units(candidates: [Option<&str>; 3]) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|units| !units.is_empty())
        .unwrap_or_default()
        .to_owned()
}

/// Decodes a complete IGOR binary wave held in memory.
///
/// The buffer is read-only for the duration of the call; the returned [`Wave`]
/// owns copies of everything it needs. A buffer whose declared lengths cannot be
/// satisfied yields [`CorruptFileError::Truncated`] before any sample is read, so
/// a partially populated wave is never produced.
pub fn decode(buffer: &[u8]) -> DecodeResult<Wave> {
    let mut reader = BinaryReader::new(buffer);
    let header = WaveHeader::read(&mut reader)?;

    let offset = reader.position();
    let required = header.required_payload().unwrap_or(usize::MAX);
    if required > reader.remaining() {
        return Err(CorruptFileError::Truncated {
            offset,
            required,
            remaining: reader.remaining(),
        }
        .into());
    }

    let samples = read_raw_samples(
        &mut reader,
        header.numeric_type,
        header.sample_count,
        header.endianness,
    )?;

    reader.skip(header.version.padding())?;
    let trailing = read_trailing_sections(&mut reader, &header.sections)?;

    let data_units = resolve_units([
        Some(trailing.data_units.as_str()),
        Some(header.data_units.as_str()),
        note::data_units(&trailing.note),
    ]);
    let time_units = resolve_units([
        Some(trailing.time_units.as_str()),
        Some(header.time_units.as_str()),
        note::time_units(&trailing.note),
    ]);

    Ok(Wave::new(
        samples,
        WaveMetadata {
            name: header.name,
            sampling_interval: header.sampling_interval,
            start_offset: header.start_offset,
            data_units,
            time_units,
            note: trailing.note,
            full_scale: header.full_scale,
            version: header.version,
            created: creation_time(header.creation_date),
        },
    ))
}
