//! The per-request state container and its parser and serializer.
//!
//! A [`FuseRequest`] owns one inbound kernel frame and the matching
//! outbound frame. [`parse`](FuseRequest::parse) splits the frame into
//! header, fixed input record and variable `arg` tail and extracts the
//! filename arguments; [`serialize_header`](FuseRequest::serialize_header)
//! fills in the out-header and truncates the structured region according
//! to the request status and the xattr dual-mode rules. Both are pure CPU
//! work over the request's own buffers.

use std::ffi::OsString;
use std::os::raw::c_int;
use std::sync::Arc;
use std::time::Instant;

use aligned_utils::bytes::AlignedBytes;
use aligned_utils::stack::Align8;
use clippy_utilities::Cast;
use nix::errno::Errno;
use tracing::warn;

use super::abi_marker::{as_abi_bytes, FuseAbiData};
use super::buffer_pool::BufferPool;
use super::context::KernelSettings;
use super::de::{DeserializeError, Deserializer};
use super::ops;
use super::protocol::{
    FuseGetXAttrIn, FuseInHeader, FuseOpCode, FuseOutHeader, FuseRename2In,
};
use super::reply::{FdData, ReadResult};
use super::session::Inflight;
use super::util::errno_to_cint;

/// Size of the in-header on the wire
pub const IN_HEADER_SIZE: usize = size_of::<FuseInHeader>();
/// Size of the out-header on the wire
pub const OUT_HEADER_SIZE: usize = size_of::<FuseOutHeader>();

/// Inbound frames below this size are copied into the request's inline
/// input scratch instead of keeping a pool buffer.
pub const SMALL_INPUT_SIZE: usize = 128;

/// CREATE carries the largest structured reply, so the inline output
/// scratch sized for it covers every opcode in the registry.
const OUT_SCRATCH_SIZE: usize = OUT_HEADER_SIZE
    + size_of::<super::protocol::FuseEntryOut>()
    + size_of::<super::protocol::FuseOpenOut>();

/// One kernel request from frame arrival to reply emission.
pub struct FuseRequest {
    /// The in-header, copied out of the frame on arrival; zeroed until a
    /// frame long enough to carry one is set
    header: FuseInHeader,
    /// Complete inbound frame length
    input_len: usize,
    /// Offset of the variable `arg` tail within the inbound frame
    arg_start: usize,
    /// Length of the fixed input record consumed by the parser
    in_record_len: usize,
    /// Extracted NUL-terminated filename arguments
    filenames: Vec<OsString>,
    /// Kernel-style status: 0 on success, a positive errno on failure,
    /// negative values reserved for notifications
    status: c_int,
    /// Outbound frame length (out-header plus structured record)
    output_len: usize,
    /// Trailing reply bytes (readdir buffer, xattr data, symlink target)
    flat_data: Vec<u8>,
    /// Fd range to splice instead of `flat_data`; never set together with
    /// non-empty `flat_data`
    fd_data: Option<FdData>,
    /// Resources behind a read reply, finalized after serialization
    read_result: Option<Box<dyn ReadResult>>,
    /// Frame arrival timestamp
    start_time: Instant,
    /// Dispatcher handle carrying the cancel signal and interrupted flag
    inflight: Arc<Inflight>,
    /// Inline scratch for small inbound frames
    small_input_buf: Align8<[u8; SMALL_INPUT_SIZE]>,
    /// Inline scratch for the out-header and structured record
    out_scratch: Align8<[u8; OUT_SCRATCH_SIZE]>,
    /// Pool buffer holding a large inbound frame
    pool_input_buf: Option<AlignedBytes>,
    /// Pool buffer for an outbound frame larger than the inline scratch
    pool_output_buf: Option<AlignedBytes>,
}

impl Default for FuseRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl FuseRequest {
    /// Create an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self {
            header: FuseInHeader::default(),
            input_len: 0,
            arg_start: 0,
            in_record_len: 0,
            filenames: Vec::new(),
            status: 0,
            output_len: OUT_HEADER_SIZE,
            flat_data: Vec::new(),
            fd_data: None,
            read_result: None,
            start_time: Instant::now(),
            inflight: Arc::new(Inflight::new()),
            small_input_buf: Align8([0; SMALL_INPUT_SIZE]),
            out_scratch: Align8([0; OUT_SCRATCH_SIZE]),
            pool_input_buf: None,
            pool_output_buf: None,
        }
    }

    /// Install the inbound frame. Frames below [`SMALL_INPUT_SIZE`] are
    /// copied into the inline scratch and the buffer is handed back to the
    /// caller for immediate reuse; larger frames keep the buffer until
    /// [`recycle`](Self::recycle).
    pub fn set_input(&mut self, buf: AlignedBytes, read_size: usize) -> Option<AlignedBytes> {
        self.start_time = Instant::now();
        let len = read_size.min(buf.len());
        self.input_len = len;
        let unused = if len < SMALL_INPUT_SIZE {
            if let Some(scratch) = self.small_input_buf.0.get_mut(..len) {
                scratch.copy_from_slice(&buf[..len]);
            }
            Some(buf)
        } else {
            self.pool_input_buf = Some(buf);
            None
        };
        if len >= IN_HEADER_SIZE {
            let header = {
                let mut de = Deserializer::new(self.input_buf());
                de.fetch_ref::<FuseInHeader>().map(|h| *h)
            };
            if let Ok(h) = header {
                self.header = h;
            }
        }
        unused
    }

    /// The complete inbound frame.
    #[must_use]
    pub fn input_buf(&self) -> &[u8] {
        match self.pool_input_buf {
            Some(ref buf) => buf.get(..self.input_len).unwrap_or(&[]),
            None => self.small_input_buf.0.get(..self.input_len).unwrap_or(&[]),
        }
    }

    /// The in-header of this request.
    #[must_use]
    pub const fn in_header(&self) -> &FuseInHeader {
        &self.header
    }

    /// The raw operation code.
    #[must_use]
    pub const fn opcode(&self) -> u32 {
        self.header.opcode
    }

    /// The kernel-assigned unique ID pairing this request with its reply.
    #[must_use]
    pub const fn unique(&self) -> u64 {
        self.header.unique
    }

    /// The i-number of the node this request targets.
    #[must_use]
    pub const fn nodeid(&self) -> u64 {
        self.header.nodeid
    }

    /// The UID of the calling process.
    #[must_use]
    pub const fn uid(&self) -> u32 {
        self.header.uid
    }

    /// The GID of the calling process.
    #[must_use]
    pub const fn gid(&self) -> u32 {
        self.header.gid
    }

    /// The PID of the calling process.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.header.pid
    }

    /// The fixed input record, without the in-header.
    #[must_use]
    pub fn in_data(&self) -> &[u8] {
        self.input_buf()
            .get(IN_HEADER_SIZE..IN_HEADER_SIZE.wrapping_add(self.in_record_len))
            .unwrap_or(&[])
    }

    /// Borrow the fixed input record as a typed overlay.
    ///
    /// # Errors
    /// Fails when the record region is shorter than `T` or misaligned.
    pub fn read_in<T: FuseAbiData + Sized>(&self) -> Result<&T, DeserializeError> {
        let mut de = Deserializer::new(self.in_data());
        de.fetch_ref::<T>()
    }

    /// The variable tail after the fixed input record: write data, the
    /// xattr value after the SETXATTR name split, or raw filename bytes.
    #[must_use]
    pub fn arg(&self) -> &[u8] {
        self.input_buf().get(self.arg_start..).unwrap_or(&[])
    }

    /// The extracted filename arguments, as many as the registry declares
    /// for this opcode.
    #[must_use]
    pub fn filenames(&self) -> &[OsString] {
        &self.filenames
    }

    /// Parse the installed frame against the negotiated kernel settings.
    ///
    /// On protocol errors the request status is set (`EIO` or `ENOSYS`)
    /// and a header-only reply will still be produced; parsing never
    /// panics on wire input.
    pub fn parse(&mut self, kernel_settings: KernelSettings, pool: &BufferPool) {
        if self.input_len < IN_HEADER_SIZE {
            warn!(
                "frame of {} bytes is shorter than the FUSE in-header",
                self.input_len
            );
            self.status = errno_to_cint(Errno::EIO);
            return;
        }
        let opcode = self.header.opcode;
        let Some(op) = ops::op_entry(opcode) else {
            warn!("unknown opcode {}", opcode);
            self.status = errno_to_cint(Errno::ENOSYS);
            return;
        };

        let mut in_sz = op.input_size;
        if opcode == FuseOpCode::FUSE_RENAME.code() && kernel_settings.supports_rename_swap() {
            in_sz = size_of::<FuseRename2In>();
        }
        if opcode == FuseOpCode::FUSE_INIT.code()
            && in_sz > self.input_len.wrapping_sub(IN_HEADER_SIZE)
        {
            // Protocol 7.36 extended the init record; older kernels send a
            // shorter one and the runtime accepts whatever arrived.
            in_sz = self.input_len.wrapping_sub(IN_HEADER_SIZE);
        }
        if self.input_len < IN_HEADER_SIZE.wrapping_add(in_sz) {
            warn!(
                "short read for {}: {} bytes, input record takes {}",
                op.name, self.input_len, in_sz
            );
            self.status = errno_to_cint(Errno::EIO);
            return;
        }

        self.in_record_len = in_sz;
        self.arg_start = IN_HEADER_SIZE.wrapping_add(in_sz);

        self.extract_filenames(op.file_names, opcode);

        self.prepare_output(op.output_size, pool);
    }

    /// Pull the declared number of NUL-terminated names out of `arg`.
    fn extract_filenames(&mut self, count: usize, opcode: u32) {
        if count == 0 {
            return;
        }
        let mut names: Vec<OsString> = Vec::with_capacity(count);
        let consumed = {
            let arg = self.arg();
            let mut de = Deserializer::new(arg);
            while names.len() < count {
                match de.fetch_os_str() {
                    Ok(name) => names.push(name.to_owned()),
                    Err(..) => break,
                }
            }
            arg.len().wrapping_sub(de.remaining_len())
        };
        if names.len() != count {
            warn!("filename argument mismatch: {:?} want {}", names, count);
            self.status = errno_to_cint(Errno::EIO);
        }
        self.filenames = names;
        if opcode == FuseOpCode::FUSE_SETXATTR.code() {
            // SETXATTR is special: the only opcode with a file name AND a
            // binary argument. The value bytes stay in `arg`.
            self.arg_start = self.arg_start.wrapping_add(consumed);
        }
    }

    /// Zero the outbound frame region: out-header plus the opcode's fixed
    /// output record. The inline scratch covers every registered opcode;
    /// a pool buffer backs anything larger.
    fn prepare_output(&mut self, out_record: usize, pool: &BufferPool) {
        let need = OUT_HEADER_SIZE.wrapping_add(out_record);
        if need > OUT_SCRATCH_SIZE && self.pool_output_buf.is_none() {
            self.pool_output_buf = Some(pool.alloc_buffer(need));
        }
        self.output_len = need;
        let out = self.output_full_mut();
        if let Some(region) = out.get_mut(..need) {
            region.fill(0);
        }
    }

    /// The full backing buffer of the outbound frame.
    fn output_full_mut(&mut self) -> &mut [u8] {
        match self.pool_output_buf {
            Some(ref mut buf) => &mut buf[..],
            None => &mut self.out_scratch.0[..],
        }
    }

    /// The outbound frame: out-header plus structured record, without the
    /// flat payload.
    #[must_use]
    pub fn output_buf(&self) -> &[u8] {
        let buf = match self.pool_output_buf {
            Some(ref buf) => &buf[..],
            None => &self.out_scratch.0[..],
        };
        buf.get(..self.output_len).unwrap_or(buf)
    }

    /// The structured output region after the out-header, for the handler
    /// to fill.
    pub fn out_data_mut(&mut self) -> &mut [u8] {
        let len = self.output_len;
        self.output_full_mut()
            .get_mut(OUT_HEADER_SIZE..len)
            .unwrap_or(&mut [])
    }

    /// Copy a typed output record into the structured output region.
    pub fn set_out_data<T: FuseAbiData + Sized>(&mut self, data: &T) {
        let bytes = as_abi_bytes(data);
        let region = self.out_data_mut();
        debug_assert!(
            bytes.len() <= region.len(),
            "output record of {} bytes exceeds the prepared region of {} bytes",
            bytes.len(),
            region.len(),
        );
        let copy_len = bytes.len().min(region.len());
        if let (Some(dst), Some(src)) = (region.get_mut(..copy_len), bytes.get(..copy_len)) {
            dst.copy_from_slice(src);
        }
    }

    /// Request status: 0 on success, positive errno on failure.
    #[must_use]
    pub const fn status(&self) -> c_int {
        self.status
    }

    /// Whether the request has not failed so far.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status == 0
    }

    /// Set the raw status value.
    pub fn set_status(&mut self, status: c_int) {
        self.status = status;
    }

    /// Fail the request with an errno.
    pub fn set_error(&mut self, errno: Errno) {
        self.status = errno_to_cint(errno);
    }

    /// Attach trailing reply bytes.
    pub fn set_flat_data(&mut self, data: Vec<u8>) {
        debug_assert!(
            self.fd_data.is_none(),
            "flat data and fd data are mutually exclusive"
        );
        self.flat_data = data;
    }

    /// Attach an fd range to splice as the reply payload.
    pub fn set_fd_data(&mut self, fd_data: FdData) {
        debug_assert!(
            self.flat_data.is_empty(),
            "flat data and fd data are mutually exclusive"
        );
        self.fd_data = Some(fd_data);
    }

    /// Keep the read result alive until the reply is serialized.
    pub fn set_read_result(&mut self, read_result: Box<dyn ReadResult>) {
        self.read_result = Some(read_result);
    }

    /// The attached flat payload bytes.
    #[must_use]
    pub fn flat_data(&self) -> &[u8] {
        &self.flat_data
    }

    /// The attached fd payload, if any.
    #[must_use]
    pub const fn fd_data(&self) -> Option<&FdData> {
        self.fd_data.as_ref()
    }

    /// The reply payload size: the fd range size when fd data is attached,
    /// otherwise the flat byte count.
    #[must_use]
    pub fn flat_data_size(&self) -> usize {
        match self.fd_data {
            Some(ref fd_data) => fd_data.size(),
            None => self.flat_data.len(),
        }
    }

    /// Release the resources behind a read reply; called unconditionally
    /// after serialization.
    pub fn finish_read_result(&mut self) {
        if let Some(mut read_result) = self.read_result.take() {
            read_result.done();
        }
    }

    /// Serialize the out-header. The header is written into the request's
    /// own output buffer; flat bytes are never copied here, only counted
    /// into the frame length.
    pub fn serialize_header(&mut self, flat_data_size: usize) {
        let mut data_len = ops::op_entry(self.header.opcode).map_or(0, |op| op.output_size);
        if self.status > 0 {
            // only do this for positive status; negative status
            // is used for notification.
            data_len = 0;
        }
        // [GET|LIST]XATTR is two opcodes in one: a size probe (structured
        // GetXAttrOut, no flat data) and a data fetch (flat data only).
        if self.header.opcode == FuseOpCode::FUSE_GETXATTR.code()
            || self.header.opcode == FuseOpCode::FUSE_LISTXATTR.code()
        {
            if let Ok(arg) = self.read_in::<FuseGetXAttrIn>() {
                if arg.size != 0 {
                    data_len = 0;
                }
            }
        }

        let out_header = FuseOutHeader {
            len: OUT_HEADER_SIZE
                .wrapping_add(data_len)
                .wrapping_add(flat_data_size)
                .cast(),
            error: self.status.wrapping_neg(),
            unique: self.header.unique,
        };
        self.output_len = OUT_HEADER_SIZE.wrapping_add(data_len);
        let bytes_len = {
            let header_bytes = as_abi_bytes(&out_header);
            let out = self.output_full_mut();
            if let (Some(dst), Some(src)) = (
                out.get_mut(..OUT_HEADER_SIZE),
                header_bytes.get(..OUT_HEADER_SIZE),
            ) {
                dst.copy_from_slice(src);
            }
            header_bytes.len()
        };
        debug_assert_eq!(bytes_len, OUT_HEADER_SIZE);
    }

    /// One-line inbound summary for debug logs.
    #[must_use]
    pub fn input_debug(&self) -> String {
        let rendered = ops::op_entry(self.header.opcode)
            .and_then(|op| op.debug)
            .map(|print| print(self.in_data()))
            .unwrap_or_default();

        let mut names = String::new();
        if !self.filenames.is_empty() {
            names = format!("{:?}", self.filenames);
        }
        let arg = self.arg();
        if !arg.is_empty() {
            let mut data = String::new();
            if self.filenames.is_empty() {
                let preview_len = arg.len().min(8);
                let dots = if arg.len() > 8 { "..." } else { "" };
                let preview = String::from_utf8_lossy(arg.get(..preview_len).unwrap_or(&[]));
                data = format!("{preview:?}{dots}");
            }
            names.push_str(&format!("{data} {}b", arg.len()));
        }

        format!(
            "rx {}: {} n{} {}{} p{}",
            self.header.unique,
            ops::operation_name(self.header.opcode),
            self.header.nodeid,
            rendered,
            names,
            self.header.pid,
        )
    }

    /// One-line outbound summary for debug logs.
    #[must_use]
    pub fn output_debug(&self) -> String {
        let flat_size = self.flat_data_size();
        let flat = if flat_size > 0 {
            let splice = if self.fd_data.is_some() { " (fd)" } else { "" };
            format!(", {flat_size}b data{splice}")
        } else {
            String::new()
        };
        format!("tx {}: status={}{}", self.header.unique, self.status, flat)
    }

    /// Frame arrival timestamp.
    #[must_use]
    pub const fn start_time(&self) -> Instant {
        self.start_time
    }

    /// Attach the dispatcher's in-flight handle.
    pub(crate) fn set_inflight(&mut self, inflight: Arc<Inflight>) {
        self.inflight = inflight;
    }

    /// The one-shot cancel signal; closed when the kernel interrupts this
    /// request.
    #[must_use]
    pub fn cancel_token(&self) -> &tokio_util::sync::CancellationToken {
        self.inflight.cancel_token()
    }

    /// Whether an INTERRUPT named this request.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.inflight.is_interrupted()
    }

    /// Return pool buffers and reset the request for reuse.
    pub fn recycle(&mut self, pool: &BufferPool) {
        if let Some(buf) = self.pool_input_buf.take() {
            pool.free_buffer(buf);
        }
        if let Some(buf) = self.pool_output_buf.take() {
            pool.free_buffer(buf);
        }
        self.clear();
    }

    /// Reset every field; inline scratches keep their bytes, which the
    /// next frame overwrites.
    fn clear(&mut self) {
        self.header = FuseInHeader::default();
        self.input_len = 0;
        self.arg_start = 0;
        self.in_record_len = 0;
        self.filenames.clear();
        self.status = 0;
        self.output_len = OUT_HEADER_SIZE;
        self.flat_data = Vec::new();
        self.fd_data = None;
        self.read_result = None;
        self.inflight = Arc::new(Inflight::new());
    }
}
