// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Binary primitive codecs over view-relative offsets.
//!
//! The raw-file format encodes values little-endian with counted arrays
//! (4-byte element count + elements) and counted UTF-16 strings (4-byte
//! code-unit count + code units). [`ViewReader`] and [`ViewWriter`] are
//! symmetric: anything written at an offset reads back identically at the
//! same offset.

pub mod reader;
pub mod writer;

pub use reader::{ViewReader, MAX_COUNTED_LENGTH};
pub use writer::ViewWriter;
