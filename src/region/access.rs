// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Access-mode flags and persistence modes for mapped regions.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::PathBuf;

/// Bit flags describing how a mapped region is opened and accessed.
///
/// Flags compose with `|`; the named presets cover the common combinations
/// used by the provider ("open existing, read-only" is `OPEN_READ`, and so
/// on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessMode(u32);

impl AccessMode {
    /// No flags set.
    pub const NONE: AccessMode = AccessMode(0);
    /// Open an existing resource; fail if it does not exist.
    pub const OPEN: AccessMode = AccessMode(1 << 0);
    /// Create the resource, replacing existing content.
    pub const CREATE: AccessMode = AccessMode(1 << 1);
    /// Read access.
    pub const READ: AccessMode = AccessMode(1 << 2);
    /// Write access.
    pub const WRITE: AccessMode = AccessMode(1 << 3);
    /// Global (cross-session) namespace. Accepted for interface
    /// compatibility; no namespace distinction exists on POSIX.
    pub const GLOBAL: AccessMode = AccessMode(1 << 4);
    /// Allow mapping less than the requested size when the backing file is
    /// shorter.
    pub const ALLOW_SHORT_READ: AccessMode = AccessMode(1 << 5);

    /// Open existing, read-only.
    pub const OPEN_READ: AccessMode = AccessMode(Self::OPEN.0 | Self::READ.0);
    /// Open existing, read-write.
    pub const OPEN_READ_WRITE: AccessMode =
        AccessMode(Self::OPEN.0 | Self::READ.0 | Self::WRITE.0);
    /// Create (or replace), read-write.
    pub const CREATE_READ_WRITE: AccessMode =
        AccessMode(Self::CREATE.0 | Self::READ.0 | Self::WRITE.0);

    /// Check whether all flags in `other` are set.
    #[inline]
    pub const fn contains(self, other: AccessMode) -> bool {
        self.0 & other.0 == other.0
    }

    /// The raw flag bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for AccessMode {
    type Output = AccessMode;

    fn bitor(self, rhs: AccessMode) -> AccessMode {
        AccessMode(self.0 | rhs.0)
    }
}

impl BitOrAssign for AccessMode {
    fn bitor_assign(&mut self, rhs: AccessMode) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(AccessMode, &str); 6] = [
            (AccessMode::OPEN, "Open"),
            (AccessMode::CREATE, "Create"),
            (AccessMode::READ, "Read"),
            (AccessMode::WRITE, "Write"),
            (AccessMode::GLOBAL, "Global"),
            (AccessMode::ALLOW_SHORT_READ, "AllowShortRead"),
        ];
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        if first {
            write!(f, "None")?;
        }
        Ok(())
    }
}

/// Whether a region is backed by a file on disk or by anonymous memory.
///
/// Anonymous regions require an explicit size up front and never survive
/// process exit. File-backed regions take their size from the file unless
/// they are being created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistMode {
    /// Backed by a file on disk at the given path.
    FileBacked {
        /// Path of the backing file.
        path: PathBuf,
    },
    /// Anonymous, non-persisted shared memory.
    Anonymous,
}

impl PersistMode {
    /// Convenience constructor for file-backed regions.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        PersistMode::FileBacked { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_compose_expected_flags() {
        assert_eq!(AccessMode::OPEN_READ, AccessMode::OPEN | AccessMode::READ);
        assert_eq!(
            AccessMode::CREATE_READ_WRITE,
            AccessMode::CREATE | AccessMode::READ | AccessMode::WRITE
        );
        assert!(AccessMode::OPEN_READ_WRITE.contains(AccessMode::WRITE));
        assert!(!AccessMode::OPEN_READ.contains(AccessMode::WRITE));
    }

    #[test]
    fn test_bitor_assign() {
        let mut mode = AccessMode::OPEN_READ;
        mode |= AccessMode::ALLOW_SHORT_READ;
        assert!(mode.contains(AccessMode::ALLOW_SHORT_READ));
        assert!(mode.contains(AccessMode::OPEN_READ));
    }

    #[test]
    fn test_display() {
        assert_eq!(AccessMode::OPEN_READ.to_string(), "Open|Read");
        assert_eq!(AccessMode::NONE.to_string(), "None");
        assert_eq!(
            (AccessMode::CREATE_READ_WRITE | AccessMode::GLOBAL).to_string(),
            "Create|Read|Write|Global"
        );
    }

    #[test]
    fn test_persist_mode_file() {
        let mode = PersistMode::file("/tmp/run.dat");
        assert!(matches!(mode, PersistMode::FileBacked { .. }));
    }
}
