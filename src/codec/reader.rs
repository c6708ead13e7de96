// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Binary primitive reader for view-relative offsets.
//!
//! All reads are bounds-checked and little-endian (the raw-file format is
//! little-endian throughout). Every operation returns the decoded value and
//! the number of bytes consumed, so callers chain sequential reads by
//! accumulating a cursor:
//!
//! ```
//! use rawview::codec::ViewReader;
//!
//! let data = [0x2A, 0x00, 0x00, 0x00, 0x10, 0x00];
//! let reader = ViewReader::new(&data);
//! let mut cursor = 0;
//! let (count, n) = reader.read_u32(cursor).unwrap();
//! cursor += n;
//! let (flags, n) = reader.read_u16(cursor).unwrap();
//! cursor += n;
//! assert_eq!((count, flags, cursor), (42, 16, 6));
//! ```

use byteorder::{ByteOrder, LittleEndian};
use bytemuck::Pod;

use crate::core::{Result, ViewError};

/// Maximum element/code-unit count accepted in a counted read.
///
/// Guards against corrupt count prefixes allocating unbounded memory before
/// the bounds check would reject the payload.
pub const MAX_COUNTED_LENGTH: usize = 10_000_000;

/// Bounds-checked little-endian reader over a byte slice.
///
/// Offsets are relative to the slice start, which for a [`View`](crate::region::View)
/// is the view's own base. The reader never mutates shared state; sequencing
/// is entirely the caller's cursor.
#[derive(Debug, Clone, Copy)]
pub struct ViewReader<'a> {
    data: &'a [u8],
}

impl<'a> ViewReader<'a> {
    /// Create a reader over a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Total length of the backing slice.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the backing slice is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes available at and after `offset`.
    #[inline]
    pub fn remaining(&self, offset: usize) -> usize {
        self.data.len().saturating_sub(offset)
    }

    /// Verify that `len` bytes are readable at `offset`.
    #[inline]
    fn check(&self, offset: usize, len: usize) -> Result<()> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| ViewError::out_of_range(len, 0, offset))?;
        if end > self.data.len() {
            return Err(ViewError::out_of_range(
                len,
                self.remaining(offset),
                offset,
            ));
        }
        Ok(())
    }

    /// Read a raw byte range.
    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<(&'a [u8], usize)> {
        self.check(offset, len)?;
        Ok((&self.data[offset..offset + len], len))
    }

    /// Read a u8.
    pub fn read_u8(&self, offset: usize) -> Result<(u8, usize)> {
        self.check(offset, 1)?;
        Ok((self.data[offset], 1))
    }

    /// Read an i8.
    pub fn read_i8(&self, offset: usize) -> Result<(i8, usize)> {
        let (v, n) = self.read_u8(offset)?;
        Ok((v as i8, n))
    }

    /// Read a little-endian u16.
    pub fn read_u16(&self, offset: usize) -> Result<(u16, usize)> {
        self.check(offset, 2)?;
        Ok((LittleEndian::read_u16(&self.data[offset..]), 2))
    }

    /// Read a little-endian i16.
    pub fn read_i16(&self, offset: usize) -> Result<(i16, usize)> {
        let (v, n) = self.read_u16(offset)?;
        Ok((v as i16, n))
    }

    /// Read a little-endian u32.
    pub fn read_u32(&self, offset: usize) -> Result<(u32, usize)> {
        self.check(offset, 4)?;
        Ok((LittleEndian::read_u32(&self.data[offset..]), 4))
    }

    /// Read a little-endian i32.
    pub fn read_i32(&self, offset: usize) -> Result<(i32, usize)> {
        let (v, n) = self.read_u32(offset)?;
        Ok((v as i32, n))
    }

    /// Read a little-endian u64.
    pub fn read_u64(&self, offset: usize) -> Result<(u64, usize)> {
        self.check(offset, 8)?;
        Ok((LittleEndian::read_u64(&self.data[offset..]), 8))
    }

    /// Read a little-endian i64.
    pub fn read_i64(&self, offset: usize) -> Result<(i64, usize)> {
        let (v, n) = self.read_u64(offset)?;
        Ok((v as i64, n))
    }

    /// Read a little-endian IEEE f32.
    pub fn read_f32(&self, offset: usize) -> Result<(f32, usize)> {
        self.check(offset, 4)?;
        Ok((LittleEndian::read_f32(&self.data[offset..]), 4))
    }

    /// Read a little-endian IEEE f64.
    pub fn read_f64(&self, offset: usize) -> Result<(f64, usize)> {
        self.check(offset, 8)?;
        Ok((LittleEndian::read_f64(&self.data[offset..]), 8))
    }

    /// Read a counted array: 4-byte element count followed by `count`
    /// fixed-size elements.
    ///
    /// Consumes `4 + count * size_of::<T>()` bytes. A count of zero yields an
    /// empty vector, never an error. Elements are copied unaligned, so `T`
    /// may be any `Pod` type regardless of the offset's alignment.
    pub fn read_array<T: Pod>(&self, offset: usize) -> Result<(Vec<T>, usize)> {
        let (count, prefix) = self.read_u32(offset)?;
        let count = count as usize;
        if count > MAX_COUNTED_LENGTH {
            return Err(ViewError::out_of_range(
                count,
                self.remaining(offset + prefix),
                offset,
            ));
        }
        let elem_size = std::mem::size_of::<T>();
        let payload = count
            .checked_mul(elem_size)
            .ok_or_else(|| ViewError::out_of_range(count, 0, offset))?;
        self.check(offset + prefix, payload)?;

        let bytes = &self.data[offset + prefix..offset + prefix + payload];
        let mut out = Vec::with_capacity(count);
        for chunk in bytes.chunks_exact(elem_size) {
            out.push(bytemuck::pod_read_unaligned::<T>(chunk));
        }
        Ok((out, prefix + payload))
    }

    /// Read a counted UTF-16 string: 4-byte code-unit count followed by
    /// `count` little-endian 2-byte code units.
    ///
    /// The decoded value is truncated at the first embedded NUL, matching the
    /// legacy C-string semantics of the format. Consumed bytes are always
    /// `4 + count * 2` regardless of truncation.
    pub fn read_utf16_string(&self, offset: usize) -> Result<(String, usize)> {
        let (count, prefix) = self.read_u32(offset)?;
        let count = count as usize;
        if count > MAX_COUNTED_LENGTH {
            return Err(ViewError::out_of_range(
                count,
                self.remaining(offset + prefix),
                offset,
            ));
        }
        let payload = count * 2;
        self.check(offset + prefix, payload)?;

        let bytes = &self.data[offset + prefix..offset + prefix + payload];
        let mut units = vec![0u16; count];
        LittleEndian::read_u16_into(bytes, &mut units);

        // Embedded NUL terminates the logical value.
        let end = units.iter().position(|&u| u == 0).unwrap_or(count);
        let value = String::from_utf16(&units[..end])
            .map_err(|e| ViewError::invalid_utf16(offset + prefix, e.to_string()))?;
        Ok((value, prefix + payload))
    }

    /// Read a fixed-layout struct by copying its byte range.
    ///
    /// `T` must be `#[repr(C)]` and `Pod`; the copy is unaligned-safe.
    /// Variable-length fields must be modeled as separate counted reads.
    pub fn read_struct<T: Pod>(&self, offset: usize) -> Result<(T, usize)> {
        let size = std::mem::size_of::<T>();
        self.check(offset, size)?;
        let value = bytemuck::pod_read_unaligned::<T>(&self.data[offset..offset + size]);
        Ok((value, size))
    }

    /// Read a previous revision of a struct and convert it to the current
    /// layout.
    ///
    /// Only `legacy_size` bytes are consumed; fields beyond the legacy prefix
    /// are zero-filled, which is the default for every `Pod` type. Used for
    /// forward-compatible struct evolution where newer revisions append
    /// fields.
    pub fn read_struct_prefix<T: Pod>(
        &self,
        offset: usize,
        legacy_size: usize,
    ) -> Result<(T, usize)> {
        let size = std::mem::size_of::<T>();
        if legacy_size > size {
            return Err(ViewError::unsupported(format!(
                "legacy prefix of {legacy_size} bytes exceeds struct size {size}"
            )));
        }
        self.check(offset, legacy_size)?;

        let mut buf = vec![0u8; size];
        buf[..legacy_size].copy_from_slice(&self.data[offset..offset + legacy_size]);
        let value = bytemuck::pod_read_unaligned::<T>(&buf);
        Ok((value, legacy_size))
    }
}
