// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Bounded views over mapped regions.
//!
//! A view is a read (or read/write) window at a byte offset and length
//! within a region. Views hold a strong reference to their region handle,
//! so a view can never outlive the mapping it reads from; many views may
//! share one region. The backing store stays opaque to callers: a view
//! over a heap buffer and a view over an OS mapping expose the same
//! surface, differing only in the capability hints.

use std::sync::Arc;

use crate::codec::{ViewReader, ViewWriter};
use crate::core::{Result, ViewError};
use crate::region::access::AccessMode;
use crate::region::mapped::MappedRegion;
use crate::region::stream_id::StreamId;

/// A bounded window into a [`MappedRegion`].
#[derive(Debug, Clone)]
pub struct View {
    region: Arc<MappedRegion>,
    offset: usize,
    len: usize,
}

impl View {
    /// A view spanning the whole region.
    pub fn root(region: &Arc<MappedRegion>) -> Result<View> {
        View::over(region, 0, region.len())
    }

    /// A bounded view at `offset` of `len` bytes within the region.
    ///
    /// Views hold a strong reference to the region. Minting windows this way
    /// is the supported method of addressing parts of a flat OS mapping,
    /// which does not support nested sub-views.
    pub fn over(region: &Arc<MappedRegion>, offset: usize, len: usize) -> Result<View> {
        if region.is_closed() {
            return Err(ViewError::region_closed(region.id().to_string()));
        }
        let end = offset
            .checked_add(len)
            .ok_or_else(|| ViewError::out_of_range(len, 0, offset))?;
        if end > region.len() {
            return Err(ViewError::out_of_range(
                len,
                region.len().saturating_sub(offset),
                offset,
            ));
        }
        Ok(Self {
            region: Arc::clone(region),
            offset,
            len,
        })
    }

    /// The stream identifier of the owning region.
    pub fn stream_id(&self) -> &StreamId {
        self.region.id()
    }

    /// Byte offset of this view within the region.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the view in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether callers batching bulk reads should favor large contiguous
    /// reads. True for OS mappings, where page-fault cost amortizes over
    /// large reads; false for heap buffers.
    pub fn prefers_bulk_reads(&self) -> bool {
        self.region.prefers_bulk_reads()
    }

    /// Whether this view supports creating nested sub-views.
    ///
    /// Heap-backed views do; a view over a single flat OS mapping does not,
    /// and windows into a mapping are minted with [`View::over`] instead.
    pub fn supports_sub_views(&self) -> bool {
        self.region.supports_sub_views()
    }

    /// Create a sub-view at `offset` (relative to this view) of `len` bytes.
    pub fn sub_view(&self, offset: usize, len: usize) -> Result<View> {
        if !self.supports_sub_views() {
            return Err(ViewError::unsupported("sub-view on mapped backing"));
        }
        if self.region.is_closed() {
            return Err(ViewError::region_closed(self.stream_id().to_string()));
        }
        let end = offset
            .checked_add(len)
            .ok_or_else(|| ViewError::out_of_range(len, 0, offset))?;
        if end > self.len {
            return Err(ViewError::out_of_range(
                len,
                self.len.saturating_sub(offset),
                offset,
            ));
        }
        Ok(Self {
            region: Arc::clone(&self.region),
            offset: self.offset + offset,
            len,
        })
    }

    /// The view's bytes.
    ///
    /// Fails with `RegionClosed` once the region has been force-closed.
    pub fn as_slice(&self) -> Result<&[u8]> {
        if self.region.is_closed() {
            return Err(ViewError::region_closed(self.stream_id().to_string()));
        }
        // SAFETY: offset/len were bounds-checked at view creation and the
        // Arc keeps the backing alive for the borrow.
        Ok(unsafe {
            std::slice::from_raw_parts(self.region.base_ptr().add(self.offset), self.len)
        })
    }

    /// A primitive reader over this view's bytes. Offsets passed to the
    /// reader are relative to the view's own base.
    pub fn reader(&self) -> Result<ViewReader<'_>> {
        if !self.region.mode().contains(AccessMode::READ) {
            return Err(ViewError::unsupported("read on write-only region"));
        }
        Ok(ViewReader::new(self.as_slice()?))
    }

    /// A primitive writer over this view's bytes.
    ///
    /// Requires the region to have been opened with write access. Writers on
    /// a shared mapping must be coordinated externally; the crate provides no
    /// internal write-write lock.
    pub fn writer(&self) -> Result<ViewWriter<'_>> {
        if !self.region.mode().contains(AccessMode::WRITE) {
            return Err(ViewError::unsupported("write on read-only region"));
        }
        if self.region.is_closed() {
            return Err(ViewError::region_closed(self.stream_id().to_string()));
        }
        // SAFETY: bounds established at view creation; the borrow of self
        // keeps the region (and its mapping) alive for the writer.
        Ok(unsafe {
            ViewWriter::from_raw_parts(self.region.base_ptr().add(self.offset), self.len)
        })
    }

    /// Atomically add `delta` to the u32 at `offset`, returning the previous
    /// value. Shorthand for [`ViewWriter::atomic_add_u32`] on this view.
    pub fn fetch_add_u32(&self, offset: usize, delta: u32) -> Result<u32> {
        self.writer()?.atomic_add_u32(offset, delta)
    }
}
