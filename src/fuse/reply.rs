//! Reply payloads and the transport contract.
//!
//! The serializer only computes frame lengths; the transport emits the
//! out-buffer followed by the flat bytes, or splices the fd range, as one
//! kernel reply.

use std::os::unix::io::RawFd;

use async_trait::async_trait;

/// A file-descriptor-backed reply payload: the transport may splice this
/// range straight to the FUSE device instead of copying it through
/// userspace.
#[derive(Debug, Clone, Copy)]
pub struct FdData {
    /// The descriptor to splice from
    pub fd: RawFd,
    /// Byte offset within the descriptor
    pub offset: i64,
    /// Number of bytes to splice
    pub size: usize,
}

impl FdData {
    /// Payload size in bytes
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }
}

/// The resources behind a read reply. `done` releases them (e.g. unmaps a
/// page) and is called exactly once, after the reply is serialized.
pub trait ReadResult: Send {
    /// Payload size in bytes
    fn size(&self) -> usize;
    /// Release the underlying resources
    fn done(&mut self);
}

/// The flat part of one reply frame.
#[derive(Debug, Clone, Copy)]
pub enum ReplyPayload<'a> {
    /// Header and structured record only
    None,
    /// Trailing bytes to append after the out-buffer
    Bytes(&'a [u8]),
    /// An fd range to splice after the out-buffer
    Fd(&'a FdData),
}

/// Downstream transport contract: write one reply frame to the kernel.
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Emit `out` followed by the payload as a single kernel reply, and
    /// return how many bytes were written.
    async fn send(&self, out: &[u8], payload: ReplyPayload<'_>) -> nix::Result<usize>;
}
