//! FUSE protocol deserializer

use std::ffi::OsStr;

use better_as::pointer;
use memchr::memchr;
use tracing::trace;

use super::abi_marker::FuseAbiData;

/// FUSE protocol deserializer
#[derive(Debug)]
pub struct Deserializer<'b> {
    /// inner bytes
    bytes: &'b [u8],
}

/// The error returned by `Deserializer`
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeserializeError {
    /// Expected more data
    #[error("NotEnough")]
    NotEnough,

    /// The pointer's alignment mismatched with the type
    #[error("AlignMismatch")]
    AlignMismatch,
}

/// checks pointer alignment, returns `AlignMismatch` if failed
#[inline]
fn check_align<T>(ptr: *const u8) -> Result<(), DeserializeError> {
    let addr = pointer::to_address(ptr);
    let align = align_of::<T>();
    if addr.wrapping_rem(align) != 0 {
        trace!(
            "failed to convert bytes to type {}, \
                    pointer={:p} is not a multiple of alignment={}",
            std::any::type_name::<T>(),
            ptr,
            align,
        );
        return Err(DeserializeError::AlignMismatch);
    }
    Ok(())
}

/// checks whether there are enough bytes
#[inline]
fn check_size(len: usize, need: usize) -> Result<(), DeserializeError> {
    if len < need {
        trace!(
            "no enough bytes to fetch, remaining {} bytes but to fetch {} bytes",
            len,
            need,
        );
        return Err(DeserializeError::NotEnough);
    }
    Ok(())
}

impl<'b> Deserializer<'b> {
    /// Create `Deserializer`
    #[must_use]
    pub const fn new(bytes: &'b [u8]) -> Deserializer<'b> {
        Self { bytes }
    }

    /// pop some bytes without length check
    unsafe fn pop_bytes_unchecked(&mut self, len: usize) -> &'b [u8] {
        let bytes = self.bytes.get_unchecked(..len);
        self.bytes = self.bytes.get_unchecked(len..);
        bytes
    }

    /// Get the length of the remaining bytes
    #[must_use]
    pub const fn remaining_len(&self) -> usize {
        self.bytes.len()
    }

    /// Fetch some bytes and transmute to `&T`
    ///
    /// # Errors
    /// Returns [`DeserializeError::NotEnough`] on a short buffer and
    /// [`DeserializeError::AlignMismatch`] when the buffer start is not
    /// aligned for `T`.
    pub fn fetch_ref<T: FuseAbiData + Sized>(&mut self) -> Result<&'b T, DeserializeError> {
        let ty_size: usize = size_of::<T>();
        let ty_align: usize = align_of::<T>();
        debug_assert!(ty_size > 0 && ty_size.wrapping_rem(ty_align) == 0);

        check_size(self.bytes.len(), ty_size)?;
        check_align::<T>(self.bytes.as_ptr())?;

        unsafe {
            let bytes = self.pop_bytes_unchecked(ty_size);
            Ok(&*(bytes.as_ptr().cast()))
        }
    }

    /// Fetch some nul-terminated bytes, including the nul byte.
    ///
    /// # Errors
    /// Returns [`DeserializeError::NotEnough`] if no nul byte remains.
    pub fn fetch_c_str(&mut self) -> Result<&'b [u8], DeserializeError> {
        let strlen = memchr(0, self.bytes)
            .ok_or_else(|| {
                trace!("no trailing zero in bytes, cannot fetch c-string");
                DeserializeError::NotEnough
            })?
            .wrapping_add(1);
        debug_assert!(strlen <= self.bytes.len());
        unsafe { Ok(self.pop_bytes_unchecked(strlen)) }
    }

    /// Fetch some nul-terminated bytes and return an `OsStr` without the nul
    /// byte.
    ///
    /// # Errors
    /// Returns [`DeserializeError::NotEnough`] if no nul byte remains.
    pub fn fetch_os_str(&mut self) -> Result<&'b OsStr, DeserializeError> {
        use std::os::unix::ffi::OsStrExt;

        let bytes_with_nul = self.fetch_c_str()?;

        let bytes_without_nul: &[u8] = unsafe {
            let len = bytes_with_nul.len().wrapping_sub(1);
            bytes_with_nul.get_unchecked(..len)
        };

        Ok(OsStrExt::from_bytes(bytes_without_nul))
    }
}

#[cfg(test)]
mod tests {
    use aligned_utils::stack::Align8;

    use super::{DeserializeError, Deserializer};

    #[test]
    fn fetch_ref() {
        // this buffer contains two `u32` or one `u64`
        // so it is aligned to 8 bytes
        let buf: Align8<[u8; 8]> = Align8([0, 1, 2, 3, 4, 5, 6, 7]);

        {
            let mut de = Deserializer::new(&*buf);
            assert_eq!(
                de.fetch_ref::<u32>()
                    .unwrap_or_else(|err| panic!("failed to fetch u32, the error is: {err}")),
                &u32::from_ne_bytes([0, 1, 2, 3])
            );
            assert_eq!(de.remaining_len(), 4);
        }

        {
            let mut de = Deserializer::new(&*buf);
            assert_eq!(
                de.fetch_ref::<u64>()
                    .unwrap_or_else(|err| panic!("failed to fetch u64, the error is: {err}")),
                &u64::from_ne_bytes([0, 1, 2, 3, 4, 5, 6, 7])
            );
            assert_eq!(de.remaining_len(), 0);
        }
    }

    #[test]
    fn fetch_ref_rejects_misaligned() {
        let buf: Align8<[u8; 16]> = Align8([0; 16]);
        // skip two bytes off the 8-aligned base
        let mut de = Deserializer::new(&buf.0[2..]);
        assert_eq!(
            de.fetch_ref::<u64>().unwrap_err(),
            DeserializeError::AlignMismatch
        );
    }

    #[test]
    fn fetch_c_str() {
        let buf: [u8; 12] = *b"hello\0world\0";

        let mut de = Deserializer::new(&buf);
        assert_eq!(
            de.fetch_c_str()
                .unwrap_or_else(|err| panic!("failed to fetch C-String, the error is: {err}")),
            b"hello\0".as_ref()
        );
        assert_eq!(
            de.fetch_os_str()
                .unwrap_or_else(|err| panic!("failed to fetch C-String, the error is: {err}")),
            std::ffi::OsStr::new("world")
        );
        assert_eq!(de.remaining_len(), 0);
    }
}
