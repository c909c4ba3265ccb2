//! End-to-end pipeline tests: frames in, reply frames out.

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nix::errno::Errno;
use parking_lot::Mutex;

use fuse_ll::fuse::file_system::FileSystem;
use fuse_ll::fuse::protocol::{
    FuseAttr, FuseAttrOut, FuseInitOut, FuseOpCode, FUSE_KERNEL_MINOR_VERSION,
    FUSE_KERNEL_VERSION, FUSE_RENAME_SWAP,
};
use fuse_ll::fuse::reply::{FdData, ReadResult, ReplyPayload, ReplySender};
use fuse_ll::fuse::request::{FuseRequest, IN_HEADER_SIZE, OUT_HEADER_SIZE};
use fuse_ll::fuse::session::Session;

/// One recorded reply frame.
struct SentFrame {
    out: Vec<u8>,
    flat: Vec<u8>,
    fd_size: Option<usize>,
}

impl SentFrame {
    fn len(&self) -> u32 {
        u32::from_ne_bytes([self.out[0], self.out[1], self.out[2], self.out[3]])
    }
    fn error(&self) -> i32 {
        i32::from_ne_bytes([self.out[4], self.out[5], self.out[6], self.out[7]])
    }
    fn unique(&self) -> u64 {
        u64::from_ne_bytes([
            self.out[8], self.out[9], self.out[10], self.out[11], self.out[12], self.out[13],
            self.out[14], self.out[15],
        ])
    }
}

/// Transport stub collecting every reply frame.
#[derive(Default)]
struct MockSender {
    frames: Mutex<Vec<SentFrame>>,
}

#[async_trait]
impl ReplySender for MockSender {
    async fn send(&self, out: &[u8], payload: ReplyPayload<'_>) -> nix::Result<usize> {
        let (flat, fd_size) = match payload {
            ReplyPayload::None => (Vec::new(), None),
            ReplyPayload::Bytes(bytes) => (bytes.to_vec(), None),
            ReplyPayload::Fd(fd_data) => (Vec::new(), Some(fd_data.size())),
        };
        let written = out.len() + flat.len();
        self.frames.lock().push(SentFrame {
            out: out.to_vec(),
            flat,
            fd_size,
        });
        Ok(written)
    }
}

/// A read result that records its finalization.
struct TrackedReadResult {
    size: usize,
    finalized: Arc<AtomicBool>,
}

impl ReadResult for TrackedReadResult {
    fn size(&self) -> usize {
        self.size
    }
    fn done(&mut self) {
        self.finalized.store(true, Ordering::SeqCst);
    }
}

/// Test filesystem covering the reply shapes the pipeline supports.
#[derive(Default)]
struct TestFs {
    observed_interrupted: Arc<AtomicBool>,
    read_finalized: Arc<AtomicBool>,
}

#[async_trait]
impl FileSystem for TestFs {
    async fn init(&self, _req: &FuseRequest) -> nix::Result<()> {
        Ok(())
    }

    async fn handle(&self, req: &mut FuseRequest) {
        match req.opcode() {
            // structured reply
            code if code == FuseOpCode::FUSE_GETATTR.code() => {
                let attr = FuseAttr {
                    ino: req.nodeid(),
                    ..FuseAttr::default()
                };
                req.set_out_data(&FuseAttrOut {
                    attr_valid: 1,
                    attr_valid_nsec: 0,
                    dummy: 0,
                    attr,
                });
            }
            // flat reply
            code if code == FuseOpCode::FUSE_READLINK.code() => {
                req.set_flat_data(b"target".to_vec());
            }
            // fd-backed reply with a finalizable read result
            code if code == FuseOpCode::FUSE_READ.code() => {
                req.set_fd_data(FdData {
                    fd: 0,
                    offset: 0,
                    size: 42,
                });
                req.set_read_result(Box::new(TrackedReadResult {
                    size: 42,
                    finalized: Arc::clone(&self.read_finalized),
                }));
            }
            // blocks until interrupted, then reports EINTR
            code if code == FuseOpCode::FUSE_FLUSH.code() => {
                req.cancel_token().cancelled().await;
                self.observed_interrupted
                    .store(req.is_interrupted(), Ordering::SeqCst);
                req.set_error(Errno::EINTR);
            }
            // proves the post-INIT rename-swap record size reached the parser
            code if code == FuseOpCode::FUSE_RENAME.code() => {
                let names = req.filenames();
                if names.len() == 2 && names[0] == "old" && names[1] == "new" {
                    // status stays OK
                } else {
                    req.set_error(Errno::EINVAL);
                }
            }
            _ => {}
        }
    }
}

/// Assemble one kernel frame: in-header plus the given body.
fn frame(opcode: u32, unique: u64, nodeid: u64, body: &[u8]) -> Vec<u8> {
    let len: u32 = (IN_HEADER_SIZE + body.len()) as u32;
    let mut bytes = Vec::with_capacity(len as usize);
    bytes.extend_from_slice(&len.to_ne_bytes());
    bytes.extend_from_slice(&opcode.to_ne_bytes());
    bytes.extend_from_slice(&unique.to_ne_bytes());
    bytes.extend_from_slice(&nodeid.to_ne_bytes());
    bytes.extend_from_slice(&501_u32.to_ne_bytes()); // uid
    bytes.extend_from_slice(&100_u32.to_ne_bytes()); // gid
    bytes.extend_from_slice(&4321_u32.to_ne_bytes()); // pid
    bytes.extend_from_slice(&0_u32.to_ne_bytes()); // padding
    bytes.extend_from_slice(body);
    bytes
}

async fn dispatch(session: &Session<TestFs>, sender: &MockSender, raw: &[u8]) {
    let mut buf = session.buffer_pool().alloc_buffer(raw.len());
    buf[..raw.len()].copy_from_slice(raw);
    session
        .dispatch(buf, raw.len(), sender)
        .await
        .unwrap_or_else(|e| panic!("dispatch failed, the error is: {e:?}"));
}

fn init_frame(unique: u64, flags: u32) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&7_u32.to_ne_bytes()); // major
    body.extend_from_slice(&31_u32.to_ne_bytes()); // minor
    body.extend_from_slice(&65536_u32.to_ne_bytes()); // max_readahead
    body.extend_from_slice(&flags.to_ne_bytes()); // flags
    frame(26, unique, 0, &body)
}

#[tokio::test]
async fn getattr_reply_carries_attr_out() {
    let session = Session::new(TestFs::default());
    let sender = MockSender::default();

    dispatch(&session, &sender, &frame(3, 7, 5, &[0_u8; 16])).await;

    let frames = sender.frames.lock();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].unique(), 7);
    assert_eq!(frames[0].error(), 0);
    assert_eq!(
        frames[0].len() as usize,
        OUT_HEADER_SIZE + mem::size_of::<FuseAttrOut>()
    );
    assert_eq!(
        frames[0].out.len(),
        OUT_HEADER_SIZE + mem::size_of::<FuseAttrOut>()
    );
}

#[tokio::test]
async fn unknown_opcode_gets_enosys_header_only() {
    let session = Session::new(TestFs::default());
    let sender = MockSender::default();

    dispatch(&session, &sender, &frame(0xFFFF, 13, 1, &[])).await;

    let frames = sender.frames.lock();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].unique(), 13);
    assert_eq!(frames[0].error(), -(Errno::ENOSYS as i32));
    assert_eq!(frames[0].len() as usize, OUT_HEADER_SIZE);
}

#[tokio::test]
async fn readlink_reply_appends_flat_data() {
    let session = Session::new(TestFs::default());
    let sender = MockSender::default();

    dispatch(&session, &sender, &frame(5, 21, 9, &[])).await;

    let frames = sender.frames.lock();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].error(), 0);
    assert_eq!(frames[0].flat, b"target");
    assert_eq!(frames[0].len() as usize, OUT_HEADER_SIZE + 6);
    assert_eq!(frames[0].out.len(), OUT_HEADER_SIZE);
}

#[tokio::test]
async fn read_reply_splices_fd_data_and_finalizes_the_read_result() {
    let fs = TestFs::default();
    let finalized = Arc::clone(&fs.read_finalized);
    let session = Session::new(fs);
    let sender = MockSender::default();

    dispatch(&session, &sender, &frame(15, 23, 9, &[0_u8; 40])).await;

    let frames = sender.frames.lock();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].fd_size, Some(42));
    assert_eq!(frames[0].len() as usize, OUT_HEADER_SIZE + 42);
    assert!(finalized.load(Ordering::SeqCst));
}

#[tokio::test]
async fn forget_generates_no_reply() {
    let session = Session::new(TestFs::default());
    let sender = MockSender::default();

    dispatch(&session, &sender, &frame(2, 3, 5, &[0_u8; 8])).await;

    assert!(sender.frames.lock().is_empty());
}

#[tokio::test]
async fn batch_forget_generates_no_reply() {
    let session = Session::new(TestFs::default());
    let sender = MockSender::default();

    let mut body = Vec::new();
    body.extend_from_slice(&1_u32.to_ne_bytes()); // count
    body.extend_from_slice(&0_u32.to_ne_bytes()); // dummy
    body.extend_from_slice(&5_u64.to_ne_bytes()); // nodeid
    body.extend_from_slice(&1_u64.to_ne_bytes()); // nlookup
    dispatch(&session, &sender, &frame(42, 4, 0, &body)).await;

    assert!(sender.frames.lock().is_empty());
}

#[tokio::test]
async fn interrupt_cancels_the_target_and_sends_no_reply_itself() {
    let fs = TestFs::default();
    let observed = Arc::clone(&fs.observed_interrupted);
    let session = Arc::new(Session::new(fs));
    let sender = Arc::new(MockSender::default());

    // request 100 blocks on its cancel signal
    let blocked = {
        let session = Arc::clone(&session);
        let sender = Arc::clone(&sender);
        tokio::spawn(async move {
            dispatch(&session, &sender, &frame(25, 100, 1, &[0_u8; 24])).await;
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(sender.frames.lock().is_empty());

    // the interrupt itself gets no reply
    let mut body = Vec::new();
    body.extend_from_slice(&100_u64.to_ne_bytes());
    dispatch(&session, &sender, &frame(36, 101, 0, &body)).await;

    tokio::time::timeout(Duration::from_secs(5), blocked)
        .await
        .unwrap_or_else(|e| panic!("interrupted request never completed: {e}"))
        .unwrap_or_else(|e| panic!("dispatch task failed: {e}"));

    let frames = sender.frames.lock();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].unique(), 100);
    assert_eq!(frames[0].error(), -(Errno::EINTR as i32));
    assert!(observed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn interrupt_for_unknown_unique_is_silently_ignored() {
    let session = Session::new(TestFs::default());
    let sender = MockSender::default();

    let mut body = Vec::new();
    body.extend_from_slice(&999_u64.to_ne_bytes());
    dispatch(&session, &sender, &frame(36, 50, 0, &body)).await;

    assert!(sender.frames.lock().is_empty());
}

#[tokio::test]
async fn init_negotiates_and_feeds_the_parser_settings() {
    let session = Session::new(TestFs::default());
    let sender = MockSender::default();

    dispatch(&session, &sender, &init_frame(1, FUSE_RENAME_SWAP)).await;

    {
        let frames = sender.frames.lock();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].error(), 0);
        assert_eq!(
            frames[0].len() as usize,
            OUT_HEADER_SIZE + mem::size_of::<FuseInitOut>()
        );
        let record = &frames[0].out[OUT_HEADER_SIZE..];
        let major = u32::from_ne_bytes([record[0], record[1], record[2], record[3]]);
        let minor = u32::from_ne_bytes([record[4], record[5], record[6], record[7]]);
        assert_eq!(major, FUSE_KERNEL_VERSION);
        assert_eq!(minor, FUSE_KERNEL_MINOR_VERSION);
    }

    let settings = session.kernel_settings();
    assert_eq!(settings.major, 7);
    assert_eq!(settings.minor, 31);
    assert!(settings.supports_rename_swap());

    // RENAME now consumes the extended input record, so the two names
    // arrive intact at the handler
    let mut body = Vec::new();
    body.extend_from_slice(&2_u64.to_ne_bytes()); // newdir
    body.extend_from_slice(&2_u32.to_ne_bytes()); // flags: RENAME_EXCHANGE
    body.extend_from_slice(&0_u32.to_ne_bytes()); // padding
    body.extend_from_slice(b"old\0new\0");
    dispatch(&session, &sender, &frame(12, 2, 1, &body)).await;

    let frames = sender.frames.lock();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].unique(), 2);
    assert_eq!(frames[1].error(), 0);
}

#[tokio::test]
async fn ancient_kernels_are_rejected_with_eproto() {
    let session = Session::new(TestFs::default());
    let sender = MockSender::default();

    let mut body = Vec::new();
    body.extend_from_slice(&7_u32.to_ne_bytes()); // major
    body.extend_from_slice(&5_u32.to_ne_bytes()); // minor
    body.extend_from_slice(&4096_u32.to_ne_bytes()); // max_readahead
    body.extend_from_slice(&0_u32.to_ne_bytes()); // flags
    dispatch(&session, &sender, &frame(26, 1, 0, &body)).await;

    let frames = sender.frames.lock();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].error(), -(Errno::EPROTO as i32));
    assert_eq!(frames[0].len() as usize, OUT_HEADER_SIZE);
}
