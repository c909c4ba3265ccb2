//! Utility functions

use std::os::raw::c_int;

use nix::errno::Errno;

/// Convert `nix::errno::Errno` to the kernel-style positive error number
#[must_use]
pub const fn errno_to_cint(errno: Errno) -> c_int {
    errno as c_int
}
