//! Negotiated FUSE kernel settings

use std::fmt;

use super::protocol::FUSE_RENAME_SWAP;

/// The settings the kernel announced in its last successful INIT request:
/// protocol version and feature bits.
///
/// A copy travels with every request from the dispatcher to the parser, so
/// the parser never reads shared mutable state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KernelSettings {
    /// Major protocol version
    pub major: u32,
    /// Minor protocol version
    pub minor: u32,
    /// INIT feature bits offered by the kernel
    pub flags: u32,
}

impl KernelSettings {
    /// Settings before the first INIT completed
    pub const UNSPECIFIED: Self = Self {
        major: 0,
        minor: 0,
        flags: 0,
    };

    /// Whether the kernel negotiated the rename-exchange extension, which
    /// widens the RENAME input record by a flags field.
    #[must_use]
    pub const fn supports_rename_swap(&self) -> bool {
        self.flags & FUSE_RENAME_SWAP != 0
    }
}

impl fmt::Display for KernelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.major == 0 && self.minor == 0 {
            write!(f, "UNSPECIFIED")
        } else {
            write!(f, "{}.{} flags={:#x}", self.major, self.minor, self.flags)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::KernelSettings;
    use crate::fuse::protocol::FUSE_RENAME_SWAP;

    #[test]
    fn rename_swap_detection() {
        assert!(!KernelSettings::UNSPECIFIED.supports_rename_swap());
        let settings = KernelSettings {
            major: 7,
            minor: 31,
            flags: FUSE_RENAME_SWAP,
        };
        assert!(settings.supports_rename_swap());
    }
}
