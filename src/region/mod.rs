// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Mapped regions, views, and the reference-counted registry.
//!
//! A [`MappedRegion`] owns one OS mapping (file-backed or anonymous) or an
//! in-memory buffer. [`View`]s are bounded windows into a region that can
//! never outlive it. The [`MappingRegistry`] shares regions across logical
//! consumers by [`StreamId`], reference-counting so the last release is what
//! truly closes the mapping.

pub mod access;
pub mod mapped;
pub mod registry;
pub mod stream_id;
pub mod view;

pub use access::{AccessMode, PersistMode};
pub use mapped::MappedRegion;
pub use registry::{Lookup, MappingRegistry};
pub use stream_id::StreamId;
pub use view::View;
