//! Little-endian primitives, LEB128 varints, and length-prefixed strings.
//!
//! Every binary block of a dictionary is written with [`ByteWriter`] and parsed
//! with [`ByteReader`]. Signed values are stored through their raw bit pattern,
//! so `-1i32` takes five bytes as a varint.

use crate::errors::{Result, TremoloError};

const MAX_VARINT64_BYTES: usize = 10;

#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn write_varint32(&mut self, v: u32) {
        self.write_varint64(u64::from(v));
    }

    pub fn write_varint64(&mut self, mut v: u64) {
        while v >= 0x80 {
            self.buf.push((v & 0x7f) as u8 | 0x80);
            v >>= 7;
        }
        self.buf.push(v as u8);
    }

    pub fn write_utf8_string(&mut self, s: &str) -> Result<()> {
        self.write_varint32(u32::try_from(s.len())?);
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    /// Pads zeros until the length becomes a multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) {
        let rem = self.buf.len() % alignment;
        if rem != 0 {
            self.buf.resize(self.buf.len() + alignment - rem, 0);
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    block: &'static str,
}

impl<'a> ByteReader<'a> {
    pub const fn new(data: &'a [u8], block: &'static str) -> Self {
        Self {
            data,
            pos: 0,
            block,
        }
    }

    #[inline(always)]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                TremoloError::malformed_data(
                    self.block,
                    self.pos,
                    format!("{len} bytes requested but {} remain", self.remaining()),
                )
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut arr = [0; N];
        arr.copy_from_slice(self.read_bytes(N)?);
        Ok(arr)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_varint64(&mut self) -> Result<u64> {
        let start = self.pos;
        let mut value = 0u64;
        for i in 0..MAX_VARINT64_BYTES {
            let b = *self.data.get(self.pos).ok_or_else(|| {
                TremoloError::malformed_data(self.block, start, "truncated varint")
            })?;
            self.pos += 1;
            let bits = u64::from(b & 0x7f);
            if i == MAX_VARINT64_BYTES - 1 && bits > 1 {
                return Err(TremoloError::malformed_data(
                    self.block,
                    start,
                    "varint overflows 64 bits",
                ));
            }
            value |= bits << (7 * i);
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(TremoloError::malformed_data(
            self.block,
            start,
            "varint longer than 10 bytes",
        ))
    }

    pub fn read_varint32(&mut self) -> Result<u32> {
        let start = self.pos;
        let value = self.read_varint64()?;
        u32::try_from(value).map_err(|_| {
            TremoloError::malformed_data(self.block, start, "varint overflows 32 bits")
        })
    }

    pub fn read_utf8_string(&mut self) -> Result<&'a str> {
        let start = self.pos;
        let len = self.read_varint32()?;
        let bytes = self.read_bytes(len as usize)?;
        std::str::from_utf8(bytes)
            .map_err(|e| TremoloError::malformed_data(self.block, start, e.to_string()))
    }
}

#[inline(always)]
pub fn le_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

#[inline(always)]
pub fn le_i16(data: &[u8], offset: usize) -> i16 {
    le_u16(data, offset) as i16
}

#[inline(always)]
pub fn le_u32(data: &[u8], offset: usize) -> u32 {
    let mut b = [0; 4];
    b.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(b)
}

/// Computes the UTF-8 length of `units[start..end]` without decoding it.
///
/// A valid surrogate pair counts as one four-byte character. A lone surrogate
/// counts as three bytes.
pub fn count_utf8_bytes(units: &[u16], start: usize, end: usize) -> Result<usize> {
    if start > end {
        return Err(TremoloError::invalid_argument(
            "start",
            format!("start {start} is greater than end {end}"),
        ));
    }
    if end > units.len() {
        return Err(TremoloError::invalid_argument(
            "end",
            format!("end {end} exceeds the length {}", units.len()),
        ));
    }
    let mut len = 0;
    let mut i = start;
    while i < end {
        let u = units[i];
        len += match u {
            0..=0x7f => 1,
            0x80..=0x7ff => 2,
            0xd800..=0xdbff if i + 1 < end && (0xdc00..=0xdfff).contains(&units[i + 1]) => {
                i += 1;
                4
            }
            _ => 3,
        };
        i += 1;
    }
    Ok(len)
}
