//! The FUSE session: dispatch and cancellation.
//!
//! The transport reads one frame at a time from the device and hands each
//! to [`Session::dispatch`], usually on its own task so requests run in
//! parallel. The session registers the request in the in-flight table,
//! parses it, runs the filesystem handler, serializes the reply and emits
//! it through the [`ReplySender`]. INTERRUPT requests are consumed here:
//! they close the target's cancel signal and produce no reply.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aligned_utils::bytes::AlignedBytes;
use anyhow::Context;
use clippy_utilities::Cast;
use crossbeam_utils::atomic::AtomicCell;
use nix::errno::Errno;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::buffer_pool::{BufferPool, PAGE_SIZE};
use super::context::KernelSettings;
use super::file_system::FileSystem;
use super::ops::operation_name;
use super::protocol::{
    FuseInitIn, FuseInitOut, FuseInterruptIn, FuseOpCode, FUSE_ASYNC_READ, FUSE_KERNEL_MINOR_VERSION,
    FUSE_KERNEL_VERSION,
};
use super::reply::{ReplyPayload, ReplySender};
use super::request::FuseRequest;
use crate::metrics::PIPELINE_METRICS;

/// The INIT feature bits this runtime accepts from the kernel's offer
const INIT_FLAGS: u32 = FUSE_ASYNC_READ;

/// The max size of write requests from the kernel. The absolute minimum is
/// 4k, FUSE recommends at least 128k, max 16M. The FUSE default is 128k on
/// Linux.
pub const MAX_WRITE_SIZE: u32 = 128 * 1024;

/// Size of the buffer for reading a request from the kernel. Since the
/// kernel may send up to `MAX_WRITE_SIZE` bytes in a write request, the
/// transport must read into buffers of at least that value plus some extra
/// space.
pub const BUFFER_SIZE: usize = MAX_WRITE_SIZE as usize + PAGE_SIZE;

/// Max background pending requests under processing
const MAX_BACKGROUND: u16 = 10;

/// One in-flight request as the dispatcher tracks it.
pub struct Inflight {
    /// One-shot cancel signal, closed when the kernel interrupts the
    /// request
    cancel: CancellationToken,
    /// Written only while the session's in-flight lock is held
    interrupted: AtomicBool,
}

impl Inflight {
    /// Create a fresh handle.
    pub(crate) fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            interrupted: AtomicBool::new(false),
        }
    }

    /// The cancel signal of this request.
    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether an INTERRUPT named this request.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Relaxed)
    }
}

/// FUSE session: owns the filesystem handler, the buffer pool, the
/// negotiated kernel settings and the in-flight table.
pub struct Session<F> {
    /// The underlying FUSE file system
    filesystem: Arc<F>,
    /// Pool serving large request frames
    buffer_pool: Arc<BufferPool>,
    /// Settings from the kernel's last successful INIT
    kernel_settings: AtomicCell<KernelSettings>,
    /// In-flight requests keyed by their kernel-assigned unique ID; only
    /// the dispatcher mutates this table
    inflight: Mutex<HashMap<u64, Arc<Inflight>>>,
}

impl<F: FileSystem + Send + Sync + 'static> Session<F> {
    /// Create a session around a filesystem implementation.
    pub fn new(filesystem: F) -> Self {
        Self {
            filesystem: Arc::new(filesystem),
            buffer_pool: Arc::new(BufferPool::new()),
            kernel_settings: AtomicCell::new(KernelSettings::UNSPECIFIED),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// The buffer pool serving this session.
    #[must_use]
    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    /// Acquire a frame buffer large enough for any request the kernel may
    /// send under the negotiated max-write.
    #[must_use]
    pub fn acquire_buffer(&self) -> AlignedBytes {
        self.buffer_pool.alloc_buffer(BUFFER_SIZE)
    }

    /// The settings from the kernel's last successful INIT.
    #[must_use]
    pub fn kernel_settings(&self) -> KernelSettings {
        self.kernel_settings.load()
    }

    /// Spawn [`dispatch`](Self::dispatch) of one frame onto its own task.
    pub fn spawn_dispatch<S: ReplySender + 'static>(
        self: &Arc<Self>,
        frame: AlignedBytes,
        read_size: usize,
        sender: Arc<S>,
    ) {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = session.dispatch(frame, read_size, &*sender).await {
                error!("failed to process FUSE request, the error is: {e:?}");
            }
        });
    }

    /// Process one raw frame end to end: parse, run the handler, serialize
    /// and reply. Every frame gets exactly one reply, except INTERRUPT,
    /// FORGET and BATCH_FORGET which the kernel does not expect answers
    /// for.
    ///
    /// # Errors
    /// Returns an error when the transport rejects the reply frame;
    /// protocol errors are answered over the wire instead.
    pub async fn dispatch<S: ReplySender>(
        &self,
        frame: AlignedBytes,
        read_size: usize,
        sender: &S,
    ) -> anyhow::Result<()> {
        let mut req = FuseRequest::new();
        if let Some(unused) = req.set_input(frame, read_size) {
            self.buffer_pool.free_buffer(unused);
        }
        let handle = self.register(req.unique());
        req.set_inflight(Arc::clone(&handle));

        req.parse(self.kernel_settings.load(), &self.buffer_pool);
        debug!("{}", req.input_debug());

        let opcode = req.opcode();
        if req.is_ok() && opcode == FuseOpCode::FUSE_INTERRUPT.code() {
            if let Ok(arg) = req.read_in::<FuseInterruptIn>() {
                let target = arg.unique;
                self.interrupt(target);
            }
            self.deregister(req.unique());
            req.recycle(&self.buffer_pool);
            return Ok(());
        }

        if req.is_ok() {
            if opcode == FuseOpCode::FUSE_INIT.code() {
                self.negotiate(&mut req).await;
            } else {
                self.filesystem.handle(&mut req).await;
            }
        }

        let sent = if reply_suppressed(opcode) {
            Ok(0)
        } else {
            req.serialize_header(req.flat_data_size());
            debug!("{}", req.output_debug());
            let payload = match req.fd_data() {
                Some(fd_data) => ReplyPayload::Fd(fd_data),
                None if req.flat_data().is_empty() => ReplyPayload::None,
                None => ReplyPayload::Bytes(req.flat_data()),
            };
            sender.send(req.output_buf(), payload).await
        };

        self.deregister(req.unique());
        req.finish_read_result();
        PIPELINE_METRICS
            .observe_operation_duration(operation_name(opcode), req.start_time().elapsed());
        let unique = req.unique();
        req.recycle(&self.buffer_pool);

        sent.map(drop)
            .with_context(|| format!("failed to send reply for unique={unique}"))
    }

    /// Record a request in the in-flight table.
    fn register(&self, unique: u64) -> Arc<Inflight> {
        let handle = Arc::new(Inflight::new());
        self.inflight.lock().insert(unique, Arc::clone(&handle));
        handle
    }

    /// Drop a request from the in-flight table once its reply is out.
    fn deregister(&self, unique: u64) {
        self.inflight.lock().remove(&unique);
    }

    /// Cancel the request the kernel named. Cancellation is advisory: a
    /// handler that already produced its reply sends it normally. Unknown
    /// uniques mean the target already completed and are ignored.
    fn interrupt(&self, unique: u64) {
        let table = self.inflight.lock();
        match table.get(&unique) {
            Some(handle) => {
                handle.interrupted.store(true, Ordering::Relaxed);
                handle.cancel.cancel();
            }
            None => debug!("interrupt for unknown unique={unique}, already completed"),
        }
    }

    /// Negotiate INIT: validate the kernel's protocol version, give the
    /// filesystem its veto, write the init reply record and remember the
    /// kernel's settings for subsequent parses.
    async fn negotiate(&self, req: &mut FuseRequest) {
        let (major, minor, max_readahead, kernel_flags) = match req.read_in::<FuseInitIn>() {
            Ok(arg) => (arg.major, arg.minor, arg.max_readahead, arg.flags),
            Err(e) => {
                warn!("truncated INIT record, the error is: {e}");
                req.set_error(Errno::EIO);
                return;
            }
        };
        debug!("INIT kernel ABI={major}.{minor}, flags={kernel_flags:#x}");

        // We don't support ABI versions before 7.8
        if major < 7 || (major == 7 && minor < 8) {
            error!("unsupported FUSE ABI version={major}.{minor}");
            req.set_error(Errno::EPROTO);
            return;
        }

        // Call filesystem init method and give it a chance to return an error
        if let Err(e) = self.filesystem.init(req).await {
            warn!("user defined init failed, the error is: {e}");
            req.set_error(Errno::ENOSYS);
            return;
        }

        // Reply with our desired version and settings. If the kernel
        // supports a larger major version, it'll re-send a matching init
        // message. If it supports only lower major versions, we replied
        // with an error above.
        let flags = kernel_flags & INIT_FLAGS;
        let max_pages: u16 = ((MAX_WRITE_SIZE as usize - 1) / PAGE_SIZE + 1).cast();
        req.set_out_data(&FuseInitOut {
            major: FUSE_KERNEL_VERSION,
            minor: FUSE_KERNEL_MINOR_VERSION,
            max_readahead,
            flags,
            max_background: MAX_BACKGROUND,
            congestion_threshold: MAX_BACKGROUND,
            max_write: MAX_WRITE_SIZE,
            time_gran: 1,
            max_pages,
            padding: 0,
            unused: [0; 8],
        });
        debug!(
            "INIT response: ABI version={}.{}, flags={:#x}, max readahead={}, max write={}",
            FUSE_KERNEL_VERSION, FUSE_KERNEL_MINOR_VERSION, flags, max_readahead, MAX_WRITE_SIZE,
        );

        self.kernel_settings.store(KernelSettings {
            major,
            minor,
            flags: kernel_flags,
        });
    }
}

/// Whether the kernel expects no reply frame for this opcode.
fn reply_suppressed(opcode: u32) -> bool {
    opcode == FuseOpCode::FUSE_FORGET.code() || opcode == FuseOpCode::FUSE_BATCH_FORGET.code()
}
