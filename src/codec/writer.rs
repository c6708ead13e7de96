// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Binary primitive writer, the mirror of [`ViewReader`](super::ViewReader).
//!
//! Writes are bounds-checked, little-endian, and offset-based; every
//! operation returns the number of bytes written so callers chain sequential
//! writes by accumulating a cursor. The writer also provides an atomic
//! in-place fetch-add for 4-byte counters embedded in shared memory.
//!
//! The writer operates through a raw base pointer rather than `&mut [u8]`
//! because writable views can alias one shared mapping; callers coordinate
//! concurrent writes externally (see the crate-level concurrency notes).

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

use byteorder::{ByteOrder, LittleEndian};
use bytemuck::Pod;

use crate::core::{Result, ViewError};

/// Bounds-checked little-endian writer over a byte region.
#[derive(Debug)]
pub struct ViewWriter<'a> {
    ptr: *mut u8,
    len: usize,
    _marker: PhantomData<&'a mut [u8]>,
}

impl<'a> ViewWriter<'a> {
    /// Create a writer over an exclusively borrowed byte slice.
    pub fn new(data: &'a mut [u8]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            _marker: PhantomData,
        }
    }

    /// Create a writer over a raw byte region.
    ///
    /// Used by [`View::writer`](crate::region::View::writer), which ties the
    /// lifetime to a borrow of the view so the region cannot be unmapped
    /// while the writer is live.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` bytes for the
    /// lifetime `'a`. Concurrent writers to overlapping ranges must be
    /// coordinated by the caller.
    pub(crate) unsafe fn from_raw_parts(ptr: *mut u8, len: usize) -> Self {
        Self {
            ptr,
            len,
            _marker: PhantomData,
        }
    }

    /// Total length of the writable region.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the writable region is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Verify that `len` bytes are writable at `offset`.
    #[inline]
    fn check(&self, offset: usize, len: usize) -> Result<()> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| ViewError::out_of_range(len, 0, offset))?;
        if end > self.len {
            let available = self.len.saturating_sub(offset);
            return Err(ViewError::out_of_range(len, available, offset));
        }
        Ok(())
    }

    /// Mutable window into the region, after a successful bounds check.
    #[inline]
    fn window(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        self.check(offset, len)?;
        // SAFETY: bounds were checked against self.len, and the constructor
        // guarantees ptr..ptr+len is valid for 'a.
        Ok(unsafe { std::slice::from_raw_parts_mut(self.ptr.add(offset), len) })
    }

    /// Write a raw byte range.
    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<usize> {
        self.window(offset, bytes.len())?.copy_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Write a u8.
    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<usize> {
        self.window(offset, 1)?[0] = value;
        Ok(1)
    }

    /// Write an i8.
    pub fn write_i8(&mut self, offset: usize, value: i8) -> Result<usize> {
        self.write_u8(offset, value as u8)
    }

    /// Write a little-endian u16.
    pub fn write_u16(&mut self, offset: usize, value: u16) -> Result<usize> {
        LittleEndian::write_u16(self.window(offset, 2)?, value);
        Ok(2)
    }

    /// Write a little-endian i16.
    pub fn write_i16(&mut self, offset: usize, value: i16) -> Result<usize> {
        self.write_u16(offset, value as u16)
    }

    /// Write a little-endian u32.
    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<usize> {
        LittleEndian::write_u32(self.window(offset, 4)?, value);
        Ok(4)
    }

    /// Write a little-endian i32.
    pub fn write_i32(&mut self, offset: usize, value: i32) -> Result<usize> {
        self.write_u32(offset, value as u32)
    }

    /// Write a little-endian u64.
    pub fn write_u64(&mut self, offset: usize, value: u64) -> Result<usize> {
        LittleEndian::write_u64(self.window(offset, 8)?, value);
        Ok(8)
    }

    /// Write a little-endian i64.
    pub fn write_i64(&mut self, offset: usize, value: i64) -> Result<usize> {
        self.write_u64(offset, value as u64)
    }

    /// Write a little-endian IEEE f32.
    pub fn write_f32(&mut self, offset: usize, value: f32) -> Result<usize> {
        LittleEndian::write_f32(self.window(offset, 4)?, value);
        Ok(4)
    }

    /// Write a little-endian IEEE f64.
    pub fn write_f64(&mut self, offset: usize, value: f64) -> Result<usize> {
        LittleEndian::write_f64(self.window(offset, 8)?, value);
        Ok(8)
    }

    /// Write a counted array: 4-byte element count followed by the elements.
    ///
    /// Returns `4 + values.len() * size_of::<T>()`. The whole write is
    /// bounds-checked up front so a failed write leaves the count prefix
    /// untouched.
    pub fn write_array<T: Pod>(&mut self, offset: usize, values: &[T]) -> Result<usize> {
        let elem_size = std::mem::size_of::<T>();
        let payload = values
            .len()
            .checked_mul(elem_size)
            .ok_or_else(|| ViewError::out_of_range(values.len(), 0, offset))?;
        self.check(offset, 4 + payload)?;

        self.write_u32(offset, values.len() as u32)?;
        let window = self.window(offset + 4, payload)?;
        for (chunk, value) in window.chunks_exact_mut(elem_size).zip(values) {
            chunk.copy_from_slice(bytemuck::bytes_of(value));
        }
        Ok(4 + payload)
    }

    /// Write a counted UTF-16 string: 4-byte code-unit count followed by the
    /// little-endian code units. No NUL terminator is appended.
    pub fn write_utf16_string(&mut self, offset: usize, value: &str) -> Result<usize> {
        let units: Vec<u16> = value.encode_utf16().collect();
        let payload = units.len() * 2;
        self.check(offset, 4 + payload)?;

        self.write_u32(offset, units.len() as u32)?;
        let window = self.window(offset + 4, payload)?;
        LittleEndian::write_u16_into(&units, window);
        Ok(4 + payload)
    }

    /// Write a fixed-layout struct by copying its bytes.
    pub fn write_struct<T: Pod>(&mut self, offset: usize, value: &T) -> Result<usize> {
        let bytes = bytemuck::bytes_of(value);
        self.write_bytes(offset, bytes)
    }

    /// Atomically add `delta` to the little-endian u32 at `offset`, returning
    /// the previous value.
    ///
    /// This is a hardware fetch-add, usable for lock-free counters embedded
    /// in shared memory where a read-modify-write would race with other
    /// processes. The offset must be 4-byte aligned relative to the mapping
    /// base, which the format guarantees for counter fields.
    pub fn atomic_add_u32(&self, offset: usize, delta: u32) -> Result<u32> {
        self.check(offset, 4)?;
        let addr = self.ptr as usize + offset;
        if addr % std::mem::align_of::<AtomicU32>() != 0 {
            return Err(ViewError::misaligned(
                std::mem::align_of::<AtomicU32>(),
                offset,
            ));
        }
        // SAFETY: the address is in bounds, aligned, and valid for 'a; all
        // concurrent access to this word goes through atomic operations.
        let atom = unsafe { &*(addr as *const AtomicU32) };
        Ok(atom.fetch_add(delta, Ordering::SeqCst))
    }
}
