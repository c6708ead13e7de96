// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for rawview.
//!
//! Provides error types for the binary view layer:
//! - Bounds-checked reads and writes over views
//! - Mapping open/create failures
//! - Registry lookup and lifecycle errors

use std::fmt;

/// Errors that can occur in the view layer.
#[derive(Debug, Clone)]
pub enum ViewError {
    /// Read or write past the end of a region or view
    OutOfRange {
        /// Requested bytes
        requested: usize,
        /// Available bytes
        available: usize,
        /// Offset at which the access was attempted
        offset: usize,
    },

    /// Zero-size mapping attempt, rejected before any OS call
    ZeroLength {
        /// Stream identifier of the rejected mapping
        id: String,
    },

    /// Stream identifier has no backing file or mapping
    NotFound {
        /// Stream identifier that was looked up
        id: String,
    },

    /// OS denied access to the backing resource
    AccessDenied {
        /// Stream identifier of the resource
        id: String,
        /// OS error message
        message: String,
    },

    /// Mapping open or create failed (after retries)
    MapFailed {
        /// Stream identifier of the mapping
        id: String,
        /// Failure message
        message: String,
    },

    /// Operation on a region that was force-closed
    RegionClosed {
        /// Stream identifier of the closed region
        id: String,
    },

    /// Malformed stream identifier string
    InvalidStreamId {
        /// The offending string
        value: String,
        /// Why it failed to parse
        reason: String,
    },

    /// Undecodable UTF-16 payload in a counted string
    InvalidUtf16 {
        /// Offset of the string payload
        offset: usize,
        /// Decode error message
        message: String,
    },

    /// Atomic in-place operation at an unaligned offset
    Misaligned {
        /// Required alignment
        expected: usize,
        /// Actual offset
        offset: usize,
    },

    /// Operation not supported by this view or backing
    Unsupported {
        /// What is not supported
        feature: String,
    },

    /// Other error
    Other(String),
}

impl ViewError {
    /// Create an out-of-range error.
    pub fn out_of_range(requested: usize, available: usize, offset: usize) -> Self {
        ViewError::OutOfRange {
            requested,
            available,
            offset,
        }
    }

    /// Create a zero-length mapping error.
    pub fn zero_length(id: impl Into<String>) -> Self {
        ViewError::ZeroLength { id: id.into() }
    }

    /// Create a "not found" error.
    pub fn not_found(id: impl Into<String>) -> Self {
        ViewError::NotFound { id: id.into() }
    }

    /// Create an access-denied error.
    pub fn access_denied(id: impl Into<String>, message: impl Into<String>) -> Self {
        ViewError::AccessDenied {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a mapping failure error.
    pub fn map_failed(id: impl Into<String>, message: impl Into<String>) -> Self {
        ViewError::MapFailed {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a region-closed error.
    pub fn region_closed(id: impl Into<String>) -> Self {
        ViewError::RegionClosed { id: id.into() }
    }

    /// Create an invalid stream identifier error.
    pub fn invalid_stream_id(value: impl Into<String>, reason: impl Into<String>) -> Self {
        ViewError::InvalidStreamId {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid UTF-16 error.
    pub fn invalid_utf16(offset: usize, message: impl Into<String>) -> Self {
        ViewError::InvalidUtf16 {
            offset,
            message: message.into(),
        }
    }

    /// Create a misalignment error.
    pub fn misaligned(expected: usize, offset: usize) -> Self {
        ViewError::Misaligned { expected, offset }
    }

    /// Create an unsupported feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        ViewError::Unsupported {
            feature: feature.into(),
        }
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            ViewError::OutOfRange {
                requested,
                available,
                offset,
            } => vec![
                ("requested", requested.to_string()),
                ("available", available.to_string()),
                ("offset", offset.to_string()),
            ],
            ViewError::ZeroLength { id } => vec![("id", id.clone())],
            ViewError::NotFound { id } => vec![("id", id.clone())],
            ViewError::AccessDenied { id, message } => {
                vec![("id", id.clone()), ("message", message.clone())]
            }
            ViewError::MapFailed { id, message } => {
                vec![("id", id.clone()), ("message", message.clone())]
            }
            ViewError::RegionClosed { id } => vec![("id", id.clone())],
            ViewError::InvalidStreamId { value, reason } => {
                vec![("value", value.clone()), ("reason", reason.clone())]
            }
            ViewError::InvalidUtf16 { offset, message } => vec![
                ("offset", offset.to_string()),
                ("message", message.clone()),
            ],
            ViewError::Misaligned { expected, offset } => vec![
                ("expected", expected.to_string()),
                ("offset", offset.to_string()),
            ],
            ViewError::Unsupported { feature } => vec![("feature", feature.clone())],
            ViewError::Other(msg) => vec![("message", msg.clone())],
        }
    }
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::OutOfRange {
                requested,
                available,
                offset,
            } => write!(
                f,
                "Out of range: requested {requested} bytes at offset {offset}, but only {available} bytes available"
            ),
            ViewError::ZeroLength { id } => {
                write!(f, "Zero-length mapping rejected for '{id}'")
            }
            ViewError::NotFound { id } => {
                write!(f, "No backing resource for stream '{id}'")
            }
            ViewError::AccessDenied { id, message } => {
                write!(f, "Access denied for stream '{id}': {message}")
            }
            ViewError::MapFailed { id, message } => {
                write!(f, "Mapping failed for stream '{id}': {message}")
            }
            ViewError::RegionClosed { id } => {
                write!(f, "Region '{id}' has been closed")
            }
            ViewError::InvalidStreamId { value, reason } => {
                write!(f, "Invalid stream identifier '{value}': {reason}")
            }
            ViewError::InvalidUtf16 { offset, message } => {
                write!(f, "Invalid UTF-16 string at offset {offset}: {message}")
            }
            ViewError::Misaligned { expected, offset } => write!(
                f,
                "Misaligned access: offset {offset} is not {expected}-byte aligned"
            ),
            ViewError::Unsupported { feature } => {
                write!(f, "Unsupported operation: '{feature}'")
            }
            ViewError::Other(msg) => write!(f, "Other error: {msg}"),
        }
    }
}

impl std::error::Error for ViewError {}

impl From<std::io::Error> for ViewError {
    fn from(err: std::io::Error) -> Self {
        ViewError::Other(err.to_string())
    }
}

/// Result type for rawview operations.
pub type Result<T> = std::result::Result<T, ViewError>;
