//! Encoder producing IGOR binary waves that [`decode`](crate::decode) accepts.
//!
//! Used to generate synthetic recordings and to build fixtures for tests.
use crate::{
    decoder::MAC_EPOCH_OFFSET,
    error::{EncodeError, EncodeResult},
    format::{FormatVersion, NumericType},
    header::checksum,
    reader::Endianness,
};
use chrono::{DateTime, Utc};
use ibw_common::Real;

/// Longest units string stored inline in a wave header.
const INLINE_UNITS_CAPACITY: usize = 4;

struct ByteSink {
    bytes: Vec<u8>,
    endianness: Endianness,
}

macro_rules! put_scalar {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            fn $name(&mut self, value: $ty) {
                match self.endianness {
                    Endianness::Little => self.bytes.extend_from_slice(&value.to_le_bytes()),
                    Endianness::Big => self.bytes.extend_from_slice(&value.to_be_bytes()),
                }
            }
        )*
    };
}

impl ByteSink {
    fn new(endianness: Endianness, capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            endianness,
        }
    }

    put_scalar!(
        put_i8 => i8,
        put_u8 => u8,
        put_i16 => i16,
        put_u16 => u16,
        put_i32 => i32,
        put_u32 => u32,
        put_i64 => i64,
        put_u64 => u64,
        put_f32 => f32,
        put_f64 => f64,
    );

    fn put_zeros(&mut self, n: usize) {
        self.bytes.resize(self.bytes.len() + n, 0);
    }

    /// Writes `text` NUL padded to exactly `capacity` bytes. Callers check the length.
    fn put_fixed_string(&mut self, text: &str, capacity: usize) {
        let bytes = text.as_bytes();
        let len = bytes.len().min(capacity);
        self.bytes.extend_from_slice(bytes.get(..len).unwrap_or_default());
        self.put_zeros(capacity - len);
    }

    fn put_text(&mut self, text: &str) {
        self.bytes.extend_from_slice(text.as_bytes());
    }

    fn put_sample(&mut self, numeric_type: NumericType, raw: Real) {
        match numeric_type {
            NumericType::Int8 => self.put_i8(raw.round() as i8),
            NumericType::UInt8 => self.put_u8(raw.round() as u8),
            NumericType::Int16 => self.put_i16(raw.round() as i16),
            NumericType::UInt16 => self.put_u16(raw.round() as u16),
            NumericType::Int32 => self.put_i32(raw.round() as i32),
            NumericType::UInt32 => self.put_u32(raw.round() as u32),
            NumericType::Int64 => self.put_i64(raw.round() as i64),
            NumericType::UInt64 => self.put_u64(raw.round() as u64),
            NumericType::Float32 => self.put_f32(raw as f32),
            NumericType::Float64 => self.put_f64(raw),
        }
    }

    /// Stores the value that makes the header words sum to zero.
    fn seal(mut self, version: FormatVersion) -> Vec<u8> {
        let sum = self
            .bytes
            .get(..version.data_offset())
            .map(|region| checksum(region, self.endianness))
            .unwrap_or_default();
        let value = 0u16.wrapping_sub(sum);
        let encoded = match self.endianness {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        };
        let offset = version.checksum_offset();
        if let Some(field) = self.bytes.get_mut(offset..offset + 2) {
            field.copy_from_slice(&encoded);
        }
        self.bytes
    }
}

fn declared_size(size: usize) -> EncodeResult<i32> {
    i32::try_from(size).map_err(|_| EncodeError::SectionTooLarge(size))
}

/// Units that fit the header are stored there, anything longer goes to an extended section.
fn split_units(units: &str) -> (&str, &str) {
    if units.len() < INLINE_UNITS_CAPACITY {
        (units, "")
    } else {
        ("", units)
    }
}

/// Sizes shared by the binary header and the wave header.
struct Layout<'a> {
    sample_count: i32,
    waveform_size: i32,
    note_size: i32,
    data_units: (&'a str, &'a str),
    time_units: (&'a str, &'a str),
    created: u32,
}

/// Builder for a one-dimensional numeric wave.
#[derive(Debug, Clone)]
pub struct WaveWriter {
    version: FormatVersion,
    endianness: Endianness,
    numeric_type: NumericType,
    name: String,
    sampling_interval: Real,
    start_offset: Real,
    data_units: String,
    time_units: String,
    note: String,
    full_scale: Option<(Real, Real)>,
    created: Option<DateTime<Utc>>,
}

impl WaveWriter {
    pub fn new(version: FormatVersion) -> Self {
        Self {
            version,
            endianness: Endianness::Little,
            numeric_type: NumericType::Float32,
            name: String::new(),
            sampling_interval: 1.0,
            start_offset: 0.0,
            data_units: String::new(),
            time_units: String::new(),
            note: String::new(),
            full_scale: None,
            created: None,
        }
    }

    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    pub fn with_numeric_type(mut self, numeric_type: NumericType) -> Self {
        self.numeric_type = numeric_type;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }

    pub fn with_timing(mut self, sampling_interval: Real, start_offset: Real) -> Self {
        self.sampling_interval = sampling_interval;
        self.start_offset = start_offset;
        self
    }

    pub fn with_units(mut self, data_units: &str, time_units: &str) -> Self {
        self.data_units = data_units.to_owned();
        self.time_units = time_units.to_owned();
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = note.to_owned();
        self
    }

    /// Records a data full scale. It is metadata only and does not change the stored values.
    pub fn with_full_scale(mut self, bottom: Real, top: Real) -> Self {
        self.full_scale = Some((bottom, top));
        self
    }

    pub fn with_creation_date(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Encodes `samples` as stored values. Integer types round to the nearest
    /// value and saturate at the type limits.
    pub fn encode(&self, samples: &[Real]) -> EncodeResult<Vec<u8>> {
        if samples.is_empty() {
            return Err(EncodeError::NoSamples);
        }
        self.write(samples)
    }

    /// A wave declaring zero samples, which the decoder rejects as empty.
    pub fn encode_empty(&self) -> EncodeResult<Vec<u8>> {
        self.write(&[])
    }

    fn write(&self, samples: &[Real]) -> EncodeResult<Vec<u8>> {
        self.validate()?;
        let version = self.version;
        let data_bytes = samples.len() * self.numeric_type.byte_width();
        let (data_units, time_units) = match version {
            FormatVersion::V5 => (split_units(&self.data_units), split_units(&self.time_units)),
            _ => ((self.data_units.as_str(), ""), (self.time_units.as_str(), "")),
        };
        let layout = Layout {
            sample_count: declared_size(samples.len())?,
            waveform_size: declared_size(
                version.wave_header_size() + data_bytes + version.padding(),
            )?,
            note_size: declared_size(self.note.len())?,
            data_units,
            time_units,
            created: self.mac_creation_date(),
        };

        let mut sink = ByteSink::new(
            self.endianness,
            version.data_offset() + data_bytes + version.padding() + self.note.len(),
        );
        self.put_bin_header(&mut sink, &layout)?;
        match version {
            FormatVersion::V5 => self.put_wave_header5(&mut sink, &layout),
            _ => self.put_wave_header2(&mut sink, &layout),
        }

        for &value in samples {
            sink.put_sample(self.numeric_type, value);
        }
        sink.put_zeros(version.padding());

        match version {
            FormatVersion::V1 => {}
            FormatVersion::V2 | FormatVersion::V3 => sink.put_text(&self.note),
            FormatVersion::V5 => {
                sink.put_text(&self.note);
                sink.put_text(layout.data_units.1);
                sink.put_text(layout.time_units.1);
            }
        }
        Ok(sink.seal(version))
    }

    fn validate(&self) -> EncodeResult<()> {
        let capacity = self.version.name_capacity();
        if self.name.len() >= capacity {
            return Err(EncodeError::NameTooLong {
                name: self.name.clone(),
                capacity: capacity - 1,
            });
        }
        if self.version != FormatVersion::V5 {
            if let Some(units) = [&self.data_units, &self.time_units]
                .into_iter()
                .find(|units| units.len() >= INLINE_UNITS_CAPACITY)
            {
                return Err(EncodeError::UnitsTooLong(units.clone()));
            }
        }
        if self.version == FormatVersion::V1 && !self.note.is_empty() {
            return Err(EncodeError::NoteNotSupported);
        }
        Ok(())
    }

    fn mac_creation_date(&self) -> u32 {
        self.created
            .and_then(|created| u32::try_from(created.timestamp() + MAC_EPOCH_OFFSET).ok())
            .unwrap_or_default()
    }

    fn put_bin_header(&self, sink: &mut ByteSink, layout: &Layout<'_>) -> EncodeResult<()> {
        sink.put_u16(self.version.marker());
        match self.version {
            FormatVersion::V1 => {
                sink.put_i32(layout.waveform_size);
                sink.put_u16(0);
            }
            FormatVersion::V2 => {
                sink.put_i32(layout.waveform_size);
                sink.put_i32(layout.note_size);
                sink.put_i32(0); // pictSize
                sink.put_u16(0);
            }
            FormatVersion::V3 => {
                sink.put_i32(layout.waveform_size);
                sink.put_i32(layout.note_size);
                sink.put_i32(0); // formulaSize
                sink.put_i32(0); // pictSize
                sink.put_u16(0);
            }
            FormatVersion::V5 => {
                sink.put_u16(0);
                sink.put_i32(layout.waveform_size);
                sink.put_i32(0); // formulaSize
                sink.put_i32(layout.note_size);
                sink.put_i32(declared_size(layout.data_units.1.len())?);
                sink.put_i32(declared_size(layout.time_units.1.len())?);
                sink.put_zeros(12); // dimEUnitsSize[1..]
                sink.put_zeros(16); // dimLabelsSize
                sink.put_i32(0); // sIndicesSize
                sink.put_i32(0); // options1
                sink.put_i32(0); // options2
            }
        }
        Ok(())
    }

    fn full_scale_fields(&self) -> (i16, Real, Real) {
        match self.full_scale {
            Some((bottom, top)) => (1, top, bottom),
            None => (0, 0.0, 0.0),
        }
    }

    fn put_wave_header2(&self, sink: &mut ByteSink, layout: &Layout<'_>) {
        let (fs_valid, top, bottom) = self.full_scale_fields();
        sink.put_i16(self.numeric_type.type_code());
        sink.put_u32(0); // next
        sink.put_fixed_string(&self.name, self.version.name_capacity());
        sink.put_i16(0); // whVersion
        sink.put_i16(0); // srcFolder
        sink.put_u32(0); // fileName
        sink.put_fixed_string(layout.data_units.0, INLINE_UNITS_CAPACITY);
        sink.put_fixed_string(layout.time_units.0, INLINE_UNITS_CAPACITY);
        sink.put_i32(layout.sample_count);
        sink.put_i16(0); // aModified
        sink.put_f64(self.sampling_interval);
        sink.put_f64(self.start_offset);
        sink.put_i16(0); // wModified
        sink.put_i16(0); // swModified
        sink.put_i16(fs_valid);
        sink.put_f64(top);
        sink.put_f64(bottom);
        sink.put_u8(0); // useBits
        sink.put_u8(0); // kindBits
        sink.put_u32(0); // formula
        sink.put_i32(0); // depID
        sink.put_u32(layout.created);
        sink.put_zeros(2);
        sink.put_u32(layout.created); // modDate
        sink.put_u32(0); // waveNoteH
    }

    fn put_wave_header5(&self, sink: &mut ByteSink, layout: &Layout<'_>) {
        let (fs_valid, top, bottom) = self.full_scale_fields();
        sink.put_u32(0); // next
        sink.put_u32(layout.created);
        sink.put_u32(layout.created); // modDate
        sink.put_i32(layout.sample_count);
        sink.put_i16(self.numeric_type.type_code());
        sink.put_i16(0); // dLock
        sink.put_zeros(6);
        sink.put_i16(1); // whVersion
        sink.put_fixed_string(&self.name, self.version.name_capacity());
        sink.put_i32(0);
        sink.put_u32(0); // dFolder

        sink.put_i32(layout.sample_count);
        sink.put_zeros(12);
        sink.put_f64(self.sampling_interval);
        for _ in 1..4 {
            sink.put_f64(1.0);
        }
        sink.put_f64(self.start_offset);
        sink.put_zeros(24);

        sink.put_fixed_string(layout.data_units.0, INLINE_UNITS_CAPACITY);
        sink.put_fixed_string(layout.time_units.0, INLINE_UNITS_CAPACITY);
        sink.put_zeros(12);
        sink.put_i16(fs_valid);
        sink.put_i16(0);
        sink.put_f64(top);
        sink.put_f64(bottom);

        // handles: dataEUnits, dimEUnits, dimLabels, waveNoteH
        sink.put_zeros(4 + 16 + 16 + 4);
        sink.put_zeros(64); // whUnused
        sink.put_zeros(6); // aModified, wModified, swModified
        sink.put_u8(0); // useBits
        sink.put_u8(0); // kindBits
        sink.put_u32(0); // formula
        sink.put_i32(0); // depID
        sink.put_i16(0);
        sink.put_i16(0); // srcFolder
        sink.put_u32(0); // fileName
        sink.put_u32(0); // sIndices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode, wave::TimeSeries};

    #[test]
    fn headers_have_the_declared_size() {
        for (version, expected) in [
            (FormatVersion::V1, 118 + 12 + 16),
            (FormatVersion::V2, 126 + 12 + 16),
            (FormatVersion::V3, 130 + 12 + 16),
            (FormatVersion::V5, 384 + 12),
        ] {
            let buffer = WaveWriter::new(version).encode(&[1.0, 2.0, 3.0]).unwrap();
            assert_eq!(buffer.len(), expected, "{version}");
        }
    }

    #[test]
    fn header_words_sum_to_zero() {
        for endianness in [Endianness::Little, Endianness::Big] {
            let buffer = WaveWriter::new(FormatVersion::V3)
                .with_endianness(endianness)
                .with_name("trace")
                .encode(&[4.0, 5.0])
                .unwrap();
            assert_eq!(checksum(&buffer[..130], endianness), 0);
        }
    }

    #[test]
    fn integer_samples_round_and_saturate() {
        let buffer = WaveWriter::new(FormatVersion::V2)
            .with_numeric_type(NumericType::Int8)
            .encode(&[1.4, 1.6, -300.0, 300.0])
            .unwrap();
        assert_eq!(
            decode(&buffer).unwrap().samples(),
            &[1.0, 2.0, -128.0, 127.0]
        );
    }

    #[test]
    fn rejected_configurations() {
        assert_eq!(
            WaveWriter::new(FormatVersion::V5).encode(&[]),
            Err(EncodeError::NoSamples)
        );
        assert_eq!(
            WaveWriter::new(FormatVersion::V2)
                .with_name("a_name_longer_than_nineteen")
                .encode(&[0.0]),
            Err(EncodeError::NameTooLong {
                name: "a_name_longer_than_nineteen".to_owned(),
                capacity: 19
            })
        );
        assert_eq!(
            WaveWriter::new(FormatVersion::V3)
                .with_units("volts", "s")
                .encode(&[0.0]),
            Err(EncodeError::UnitsTooLong("volts".to_owned()))
        );
        assert_eq!(
            WaveWriter::new(FormatVersion::V1)
                .with_note("hello")
                .encode(&[0.0]),
            Err(EncodeError::NoteNotSupported)
        );
    }

    #[test]
    fn full_scale_leaves_stored_values_alone() {
        let samples = [-200.0, 0.0, 1500.0];
        let buffer = WaveWriter::new(FormatVersion::V5)
            .with_numeric_type(NumericType::Int16)
            .with_full_scale(-10.0, 10.0)
            .encode(&samples)
            .unwrap();
        let start = FormatVersion::V5.data_offset();
        let stored: Vec<i16> = buffer[start..start + 6]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(stored, vec![-200, 0, 1500]);
        assert_eq!(decode(&buffer).unwrap().samples(), samples.as_slice());
    }
}
