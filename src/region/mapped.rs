// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Mapped region handles: ownership of one OS mapping or heap buffer.
//!
//! A `MappedRegion` owns the underlying resource for its whole lifetime;
//! views borrow from it through an `Arc` and can never outlive it. The
//! region records a closed flag so a force-closed handle refuses new
//! reads and writes even while outstanding `Arc`s keep the pages mapped.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use memmap2::{Mmap, MmapMut, MmapOptions};
use tracing::warn;

use crate::core::{Result, ViewError};
use crate::region::access::{AccessMode, PersistMode};
use crate::region::stream_id::StreamId;

/// Attempts for file-backed mapping creation before giving up.
///
/// Transient share violations are expected when another process is mid-write
/// to the same file during acquisition.
const MAX_OPEN_RETRIES: u32 = 5;

/// Fixed delay between mapping retries.
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(50);

/// The resource owned by a region handle.
///
/// Kept alive for the region's lifetime; the region's base pointer is
/// derived from it at construction and stays valid because mapped pages and
/// boxed buffers do not move.
enum Backing {
    /// Read-only file mapping.
    FileRo { _map: Mmap, _file: File },
    /// Writable file mapping.
    FileRw { map: MmapMut, _file: File },
    /// Anonymous, non-persisted mapping.
    Anonymous { map: MmapMut },
    /// Caller-supplied heap buffer.
    Heap { ptr: *mut u8, len: usize },
}

impl Drop for Backing {
    fn drop(&mut self) {
        if let Backing::Heap { ptr, len } = *self {
            // SAFETY: ptr/len came from Vec::into_boxed_slice via
            // Box::into_raw in from_vec, and are dropped exactly once here.
            drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) });
        }
    }
}

/// A handle owning one mapped region (or in-memory buffer).
///
/// Regions are usually created through the
/// [`MappingRegistry`](crate::region::MappingRegistry) so that repeated
/// requests for the same [`StreamId`] share a single OS mapping. Heap-backed
/// regions are constructed directly with [`MappedRegion::from_vec`] and are
/// not registered.
pub struct MappedRegion {
    id: StreamId,
    mode: AccessMode,
    path: Option<PathBuf>,
    ptr: *mut u8,
    len: usize,
    closed: AtomicBool,
    supports_sub_views: bool,
    prefers_bulk_reads: bool,
    backing: Backing,
}

// SAFETY: the raw pointer refers to memory owned by `backing`, which lives
// as long as the region. Mutation is either exclusive (heap, anonymous) or
// externally coordinated by callers of writable views, matching the shared
// mapping contract.
unsafe impl Send for MappedRegion {}
unsafe impl Sync for MappedRegion {}

impl MappedRegion {
    /// Open or create a region according to `persist` and `mode`.
    ///
    /// `size` is required (and must be non-zero) for anonymous regions and
    /// for file creation; for plain opens the file's length is used.
    pub fn open(
        id: StreamId,
        mode: AccessMode,
        persist: &PersistMode,
        size: Option<u64>,
    ) -> Result<Self> {
        match persist {
            PersistMode::Anonymous => Self::create_anonymous(id, size.unwrap_or(0)),
            PersistMode::FileBacked { path } => Self::open_file(id, mode, path, size),
        }
    }

    /// Create an anonymous, non-persisted region.
    ///
    /// A zero size is rejected before any OS call is attempted.
    pub fn create_anonymous(id: StreamId, size: u64) -> Result<Self> {
        if size == 0 {
            return Err(ViewError::zero_length(id.to_string()));
        }
        let mut map = MmapOptions::new()
            .len(size as usize)
            .map_anon()
            .map_err(|e| ViewError::map_failed(id.to_string(), e.to_string()))?;
        let ptr = map.as_mut_ptr();
        let len = map.len();
        Ok(Self {
            id,
            mode: AccessMode::CREATE_READ_WRITE,
            path: None,
            ptr,
            len,
            closed: AtomicBool::new(false),
            supports_sub_views: false,
            prefers_bulk_reads: true,
            backing: Backing::Anonymous { map },
        })
    }

    /// Open or create a file-backed region.
    ///
    /// Mapping creation is retried a bounded number of times with a fixed
    /// delay; not-found and access-denied failures are terminal and are not
    /// retried.
    pub fn open_file(
        id: StreamId,
        mode: AccessMode,
        path: &Path,
        size: Option<u64>,
    ) -> Result<Self> {
        if mode.contains(AccessMode::CREATE) {
            match size {
                Some(0) | None => return Err(ViewError::zero_length(id.to_string())),
                Some(_) => {}
            }
        } else if size == Some(0) {
            return Err(ViewError::zero_length(id.to_string()));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match Self::open_file_once(&id, mode, path, size) {
                Ok(region) => return Ok(region),
                // Transient share violations surface as MapFailed and resolve
                // once the writer's I/O completes. Everything else is terminal.
                Err(err @ ViewError::MapFailed { .. }) if attempt < MAX_OPEN_RETRIES => {
                    warn!(
                        id = %id,
                        attempt,
                        error = %err,
                        "mapping attempt failed, retrying"
                    );
                    std::thread::sleep(OPEN_RETRY_DELAY);
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn open_file_once(
        id: &StreamId,
        mode: AccessMode,
        path: &Path,
        size: Option<u64>,
    ) -> Result<Self> {
        let classify = |e: std::io::Error| match e.kind() {
            std::io::ErrorKind::NotFound => ViewError::not_found(id.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                ViewError::access_denied(id.to_string(), e.to_string())
            }
            _ => ViewError::map_failed(id.to_string(), e.to_string()),
        };

        let writable = mode.contains(AccessMode::WRITE) || mode.contains(AccessMode::CREATE);
        let file = if mode.contains(AccessMode::CREATE) {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .map_err(classify)?;
            // open_file validated size as Some and non-zero for CREATE.
            let size = size.unwrap_or(0);
            file.set_len(size).map_err(classify)?;
            file
        } else if writable {
            OpenOptions::new()
                .read(true)
                .write(true)
                .open(path)
                .map_err(classify)?
        } else {
            File::open(path).map_err(classify)?
        };

        let file_len = file.metadata().map_err(classify)?.len();
        if file_len == 0 {
            return Err(ViewError::zero_length(id.to_string()));
        }

        let map_len = match size {
            Some(requested) if requested > file_len => {
                if mode.contains(AccessMode::ALLOW_SHORT_READ) {
                    file_len
                } else {
                    return Err(ViewError::map_failed(
                        id.to_string(),
                        format!(
                            "requested {requested} bytes but file holds only {file_len}"
                        ),
                    ));
                }
            }
            Some(requested) => requested,
            None => file_len,
        } as usize;

        let (ptr, len, backing) = if writable {
            let mut map = unsafe { MmapOptions::new().len(map_len).map_mut(&file) }
                .map_err(classify)?;
            let ptr = map.as_mut_ptr();
            let len = map.len();
            (ptr, len, Backing::FileRw { map, _file: file })
        } else {
            let map = unsafe { MmapOptions::new().len(map_len).map(&file) }
                .map_err(classify)?;
            let ptr = map.as_ptr() as *mut u8;
            let len = map.len();
            (ptr, len, Backing::FileRo { _map: map, _file: file })
        };

        Ok(Self {
            id: id.clone(),
            mode,
            path: Some(path.to_path_buf()),
            ptr,
            len,
            closed: AtomicBool::new(false),
            supports_sub_views: false,
            prefers_bulk_reads: true,
            backing,
        })
    }

    /// Wrap a caller-supplied heap buffer in a region handle.
    ///
    /// The buffer gets the same view/reader/writer surface as a mapped file.
    /// Heap regions support arbitrary sub-view nesting and are not tracked
    /// by the registry.
    pub fn from_vec(id: StreamId, data: Vec<u8>, mode: AccessMode) -> Result<Self> {
        if data.is_empty() {
            return Err(ViewError::zero_length(id.to_string()));
        }
        let boxed = data.into_boxed_slice();
        let len = boxed.len();
        let ptr = Box::into_raw(boxed) as *mut u8;
        Ok(Self {
            id,
            mode,
            path: None,
            ptr,
            len,
            closed: AtomicBool::new(false),
            supports_sub_views: true,
            prefers_bulk_reads: false,
            backing: Backing::Heap { ptr, len },
        })
    }

    /// The stream identifier of this region.
    pub fn id(&self) -> &StreamId {
        &self.id
    }

    /// The access mode the region was opened with.
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Backing file path, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Length of the mapped region in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the region is empty. Always false for successfully opened
    /// regions since zero-length mappings are rejected.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the region has been force-closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Mark the region closed so outstanding handles refuse future access.
    /// Reads already executing complete against the still-mapped pages.
    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(crate) fn base_ptr(&self) -> *mut u8 {
        self.ptr
    }

    pub(crate) fn supports_sub_views(&self) -> bool {
        self.supports_sub_views
    }

    pub(crate) fn prefers_bulk_reads(&self) -> bool {
        self.prefers_bulk_reads
    }

    /// Flush a writable file-backed region to disk. A no-op for anonymous
    /// and heap regions.
    pub fn flush(&self) -> Result<()> {
        match &self.backing {
            Backing::FileRw { map, .. } => map
                .flush()
                .map_err(|e| ViewError::map_failed(self.id.to_string(), e.to_string())),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("id", &self.id.to_string())
            .field("mode", &self.mode.to_string())
            .field("len", &self.len)
            .field("closed", &self.is_closed())
            .finish()
    }
}
