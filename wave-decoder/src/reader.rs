//! A cursor over an in-memory byte buffer.
//!
//! The reader never performs I/O: the caller loads the whole file and hands the
//! bytes over. Every read is bounds checked and advances the cursor by exactly
//! the width of the value read; a failed read leaves the cursor untouched.

use std::mem::size_of;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Endianness {
    #[strum(to_string = "little-endian")]
    Little,
    #[strum(to_string = "big-endian")]
    Big,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Out of Bounds: {requested} bytes requested at position {position}, {remaining} remaining")]
pub struct OutOfBounds {
    pub position: usize,
    pub requested: usize,
    pub remaining: usize,
}

macro_rules! read_scalar {
    ($($(#[$meta:meta])* $name:ident => $ty:ty),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name(&mut self, endianness: Endianness) -> Result<$ty, OutOfBounds> {
                let bytes = self.read_array::<{ size_of::<$ty>() }>()?;
                Ok(match endianness {
                    Endianness::Little => <$ty>::from_le_bytes(bytes),
                    Endianness::Big => <$ty>::from_be_bytes(bytes),
                })
            }
        )*
    };
}

#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of bytes between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    fn out_of_bounds(&self, requested: usize) -> OutOfBounds {
        OutOfBounds {
            position: self.position,
            requested,
            remaining: self.remaining(),
        }
    }

    /// Moves the cursor to an absolute position, which may equal the buffer length.
    pub fn seek(&mut self, position: usize) -> Result<(), OutOfBounds> {
        if position > self.buffer.len() {
            return Err(OutOfBounds {
                position,
                requested: 0,
                remaining: 0,
            });
        }
        self.position = position;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), OutOfBounds> {
        if n > self.remaining() {
            return Err(self.out_of_bounds(n));
        }
        self.position += n;
        Ok(())
    }

    pub fn read_fixed_bytes(&mut self, n: usize) -> Result<&'a [u8], OutOfBounds> {
        let end = self
            .position
            .checked_add(n)
            .ok_or_else(|| self.out_of_bounds(n))?;
        let bytes = self
            .buffer
            .get(self.position..end)
            .ok_or_else(|| self.out_of_bounds(n))?;
        self.position = end;
        Ok(bytes)
    }

    /// Reads `n` bytes as text, truncated at the first NUL and with trailing
    /// padding removed. Bytes that are not valid UTF-8 are replaced.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String, OutOfBounds> {
        let bytes = self.read_fixed_bytes(n)?;
        let text = bytes.split(|&b| b == 0).next().unwrap_or_default();
        Ok(String::from_utf8_lossy(text).trim_end().to_owned())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], OutOfBounds> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_fixed_bytes(N)?);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8, OutOfBounds> {
        Ok(u8::from_le_bytes(self.read_array::<1>()?))
    }

    pub fn read_i8(&mut self) -> Result<i8, OutOfBounds> {
        Ok(i8::from_le_bytes(self.read_array::<1>()?))
    }

    read_scalar! {
        read_u16 => u16,
        read_i16 => i16,
        read_u32 => u32,
        read_i32 => i32,
        read_u64 => u64,
        read_i64 => i64,
        read_f32 => f32,
        read_f64 => f64,
    }
}
