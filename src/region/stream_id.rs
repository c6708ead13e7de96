// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Stream identifiers: the registry key for one shareable mapped resource.
//!
//! Canonical string form is `<GUID as 32 hex chars>__<logical name>`, used
//! both for registry lookup and in diagnostics.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::core::ViewError;

/// Separator between the GUID and the logical name.
const SEPARATOR: &str = "__";

/// Opaque key identifying one shareable mapped resource.
///
/// Two identifiers are equal only if both the GUID and the logical name
/// match; distinct underlying resources get distinct identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamId {
    guid: Uuid,
    name: String,
}

impl StreamId {
    /// Create an identifier from an existing GUID and logical name.
    pub fn new(guid: Uuid, name: impl Into<String>) -> Self {
        Self {
            guid,
            name: name.into(),
        }
    }

    /// Mint an identifier with a fresh random GUID.
    pub fn new_unique(name: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4(), name)
    }

    /// The GUID component.
    pub fn guid(&self) -> Uuid {
        self.guid
    }

    /// The logical name component.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.guid.simple(), SEPARATOR, self.name)
    }
}

impl FromStr for StreamId {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (guid_part, name) = s.split_once(SEPARATOR).ok_or_else(|| {
            ViewError::invalid_stream_id(s, "missing '__' separator")
        })?;
        if guid_part.len() != 32 {
            return Err(ViewError::invalid_stream_id(
                s,
                format!("GUID must be 32 hex chars, got {}", guid_part.len()),
            ));
        }
        let guid = Uuid::try_parse(guid_part)
            .map_err(|e| ViewError::invalid_stream_id(s, e.to_string()))?;
        if name.is_empty() {
            return Err(ViewError::invalid_stream_id(s, "empty logical name"));
        }
        Ok(Self {
            guid,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let guid = Uuid::from_u128(0x0123_4567_89AB_CDEF_0123_4567_89AB_CDEF);
        let id = StreamId::new(guid, "RunHeader");
        assert_eq!(id.to_string(), "0123456789abcdef0123456789abcdef__RunHeader");
    }

    #[test]
    fn test_round_trip() {
        let id = StreamId::new_unique("ScanIndex");
        let parsed: StreamId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.name(), "ScanIndex");
    }

    #[test]
    fn test_name_may_contain_separator_like_text() {
        // Only the first '__' splits; the rest belongs to the name.
        let s = "0123456789abcdef0123456789abcdef__a__b";
        let id: StreamId = s.parse().unwrap();
        assert_eq!(id.name(), "a__b");
        assert_eq!(id.to_string(), s);
    }

    #[test]
    fn test_missing_separator_fails() {
        let err = "0123456789abcdef0123456789abcdef".parse::<StreamId>();
        assert!(matches!(err, Err(ViewError::InvalidStreamId { .. })));
    }

    #[test]
    fn test_short_guid_fails() {
        let err = "abc__name".parse::<StreamId>();
        assert!(matches!(err, Err(ViewError::InvalidStreamId { .. })));
    }

    #[test]
    fn test_non_hex_guid_fails() {
        let err = "zzzz456789abcdef0123456789abcdef__name".parse::<StreamId>();
        assert!(matches!(err, Err(ViewError::InvalidStreamId { .. })));
    }

    #[test]
    fn test_empty_name_fails() {
        let err = "0123456789abcdef0123456789abcdef__".parse::<StreamId>();
        assert!(matches!(err, Err(ViewError::InvalidStreamId { .. })));
    }

    #[test]
    fn test_unique_ids_differ() {
        let a = StreamId::new_unique("x");
        let b = StreamId::new_unique("x");
        assert_ne!(a, b);
    }
}
