// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Rawview
//!
//! Memory-mapped binary view layer for instrument raw-file data.
//!
//! Instrument raw files are large binary containers read by many logical
//! consumers at once, sometimes while an instrument is still appending to
//! them. This crate provides the resource-management and decoding layer
//! underneath such readers:
//!
//! - **Primitive codecs** in [`codec`]: bounds-checked little-endian
//!   reads/writes of scalars, counted arrays, counted UTF-16 strings, and
//!   fixed-layout structs, including legacy-prefix reads for versioned
//!   struct evolution.
//! - **Regions and views** in [`region`]: a [`MappedRegion`] owns one OS
//!   mapping (file-backed or anonymous) or a heap buffer; [`View`]s are
//!   bounded windows that hold the region alive and expose readers/writers.
//! - **Registry** in [`region::registry`]: a [`MappingRegistry`] shares one
//!   OS mapping among consumers keyed by [`StreamId`], reference-counting
//!   exactly and supporting forced close when a file under active
//!   acquisition must be remapped.
//!
//! ## Example: shared mapping with typed reads
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use rawview::{AccessMode, MappingRegistry, PersistMode, StreamId, View};
//!
//! let registry = MappingRegistry::new();
//! let id = StreamId::new_unique("RunHeader");
//! let persist = PersistMode::file("run.raw");
//!
//! let region = registry.acquire(&id, AccessMode::OPEN_READ, &persist, None)?;
//! let view = View::root(&region)?;
//! let reader = view.reader()?;
//!
//! let mut cursor = 0;
//! let (scan_count, n) = reader.read_u32(cursor)?;
//! cursor += n;
//! let (label, _) = reader.read_utf16_string(cursor)?;
//! println!("{scan_count} scans, label {label}");
//!
//! registry.release(&id)?;
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{Result, ViewError};

// Primitive binary codecs
pub mod codec;

pub use codec::{ViewReader, ViewWriter};

// Regions, views, and the mapping registry
pub mod region;

pub use region::{AccessMode, Lookup, MappedRegion, MappingRegistry, PersistMode, StreamId, View};
