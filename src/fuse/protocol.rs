//! FUSE kernel interface.
//!
//! Wire layout of protocol version 7.31 as defined by
//! <https://github.com/libfuse/libfuse/blob/master/include/fuse_kernel.h>.
//! All records are `#[repr(C)]` overlays of the byte stream exchanged with
//! the kernel; every integer is host-endian (little-endian on every
//! supported target).

/// Version number of this interface
pub const FUSE_KERNEL_VERSION: u32 = 7;
/// Minor version number of this interface
pub const FUSE_KERNEL_MINOR_VERSION: u32 = 31;
/// The node ID of the root inode
pub const FUSE_ROOT_ID: u64 = 1;

/// The read buffer is required to be at least 8k, but may be much larger
pub const FUSE_MIN_READ_BUFFER: usize = 8192;

/// The i-number type used on the wire
pub type INum = u64;

/// FUSE file attributes `fuse_attr`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseAttr {
    /// The i-number of the file
    pub ino: INum,
    /// File size
    pub size: u64,
    /// File blocks
    pub blocks: u64,
    /// Access time seconds
    pub atime: u64,
    /// Content modified time seconds
    pub mtime: u64,
    /// Meta-data changed time seconds
    pub ctime: u64,
    /// Access time nano-seconds
    pub atimensec: u32,
    /// Content modified time nano-seconds
    pub mtimensec: u32,
    /// Meta-data changed time nano-seconds
    pub ctimensec: u32,
    /// File mode
    pub mode: u32,
    /// Number of hard links
    pub nlink: u32,
    /// User ID
    pub uid: u32,
    /// Group ID
    pub gid: u32,
    /// The device ID this file (inode) represents if special file
    pub rdev: u32,
    /// Block size
    pub blksize: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE filesystem statistics `fuse_kstatfs`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseKStatFs {
    /// Total blocks (in units of frsize)
    pub blocks: u64,
    /// Free blocks
    pub bfree: u64,
    /// Free blocks for unprivileged users
    pub bavail: u64,
    /// Total inodes
    pub files: u64,
    /// Free inodes
    pub ffree: u64,
    /// Filesystem block size
    pub bsize: u32,
    /// Maximum filename length
    pub namelen: u32,
    /// Fundamental file system block size
    pub frsize: u32,
    /// Alignment padding
    pub padding: u32,
    /// For future use
    pub spare: [u32; 6],
}

/// FUSE file lock `fuse_file_lock`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseFileLock {
    /// Lock range start
    pub start: u64,
    /// Lock range end
    pub end: u64,
    /// Lock type
    pub typ: u32,
    /// The process ID of the lock owner, tgid
    pub pid: u32,
}

/// INIT request/reply flags
///
/// `FUSE_ASYNC_READ`: asynchronous read requests
/// `FUSE_POSIX_LOCKS`: remote locking for POSIX file locks
/// `FUSE_FILE_OPS`: kernel sends file handle for fstat, etc...
/// `FUSE_ATOMIC_O_TRUNC`: handles the `O_TRUNC` open flag in the filesystem
/// `FUSE_EXPORT_SUPPORT`: filesystem handles lookups of "." and ".."
/// `FUSE_BIG_WRITES`: filesystem can handle write size larger than 4kB
/// `FUSE_DONT_MASK`: don't apply umask to file mode on create operations
/// `FUSE_SPLICE_WRITE`: kernel supports splice write on the device
/// `FUSE_SPLICE_MOVE`: kernel supports splice move on the device
/// `FUSE_SPLICE_READ`: kernel supports splice read on the device
/// `FUSE_FLOCK_LOCKS`: remote locking for BSD style file locks
/// `FUSE_HAS_IOCTL_DIR`: kernel supports ioctl on directories
/// `FUSE_AUTO_INVAL_DATA`: automatically invalidate cached pages
/// `FUSE_DO_READDIRPLUS`: do READDIRPLUS (READDIR+LOOKUP in one)
/// `FUSE_READDIRPLUS_AUTO`: adaptive readdirplus
/// `FUSE_ASYNC_DIO`: asynchronous direct I/O submission
/// `FUSE_WRITEBACK_CACHE`: use writeback cache for buffered writes
/// `FUSE_NO_OPEN_SUPPORT`: kernel supports zero-message opens
/// `FUSE_PARALLEL_DIROPS`: allow parallel lookups and readdir
/// `FUSE_HANDLE_KILLPRIV`: fs handles killing suid/sgid/cap on write/chown/trunc
/// `FUSE_POSIX_ACL`: filesystem supports posix acls
/// `FUSE_ABORT_ERROR`: reading the device after abort returns `ECONNABORTED`
/// `FUSE_MAX_PAGES`: `init_out.max_pages` contains the max number of req pages
/// `FUSE_CACHE_SYMLINKS`: cache READLINK responses
/// `FUSE_RENAME_SWAP`: rename carries a flags field enabling atomic exchange
pub mod init_flags {
    /// Asynchronous read requests
    pub const FUSE_ASYNC_READ: u32 = 1 << 0;
    /// Remote locking for POSIX file locks
    pub const FUSE_POSIX_LOCKS: u32 = 1 << 1;
    /// Kernel sends file handle for fstat, etc...
    pub const FUSE_FILE_OPS: u32 = 1 << 2;
    /// Handles the `O_TRUNC` open flag in the filesystem
    pub const FUSE_ATOMIC_O_TRUNC: u32 = 1 << 3;
    /// Filesystem handles lookups of "." and ".."
    pub const FUSE_EXPORT_SUPPORT: u32 = 1 << 4;
    /// Filesystem can handle write size larger than 4kB
    pub const FUSE_BIG_WRITES: u32 = 1 << 5;
    /// Don't apply umask to file mode on create operations
    pub const FUSE_DONT_MASK: u32 = 1 << 6;
    /// Kernel supports splice write on the device
    pub const FUSE_SPLICE_WRITE: u32 = 1 << 7;
    /// Kernel supports splice move on the device
    pub const FUSE_SPLICE_MOVE: u32 = 1 << 8;
    /// Kernel supports splice read on the device
    pub const FUSE_SPLICE_READ: u32 = 1 << 9;
    /// Remote locking for BSD style file locks
    pub const FUSE_FLOCK_LOCKS: u32 = 1 << 10;
    /// Kernel supports ioctl on directories
    pub const FUSE_HAS_IOCTL_DIR: u32 = 1 << 11;
    /// Automatically invalidate cached pages
    pub const FUSE_AUTO_INVAL_DATA: u32 = 1 << 12;
    /// Do READDIRPLUS (READDIR+LOOKUP in one)
    pub const FUSE_DO_READDIRPLUS: u32 = 1 << 13;
    /// Adaptive readdirplus
    pub const FUSE_READDIRPLUS_AUTO: u32 = 1 << 14;
    /// Asynchronous direct I/O submission
    pub const FUSE_ASYNC_DIO: u32 = 1 << 15;
    /// Use writeback cache for buffered writes
    pub const FUSE_WRITEBACK_CACHE: u32 = 1 << 16;
    /// Kernel supports zero-message opens
    pub const FUSE_NO_OPEN_SUPPORT: u32 = 1 << 17;
    /// Allow parallel lookups and readdir
    pub const FUSE_PARALLEL_DIROPS: u32 = 1 << 18;
    /// Fs handles killing suid/sgid/cap on write/chown/trunc
    pub const FUSE_HANDLE_KILLPRIV: u32 = 1 << 19;
    /// Filesystem supports posix acls
    pub const FUSE_POSIX_ACL: u32 = 1 << 20;
    /// Reading the device after abort returns `ECONNABORTED`
    pub const FUSE_ABORT_ERROR: u32 = 1 << 21;
    /// `init_out.max_pages` contains the max number of req pages
    pub const FUSE_MAX_PAGES: u32 = 1 << 22;
    /// Cache READLINK responses
    pub const FUSE_CACHE_SYMLINKS: u32 = 1 << 23;
    /// Rename carries a flags field enabling atomic two-way exchange
    pub const FUSE_RENAME_SWAP: u32 = 1 << 25;
}

pub use init_flags::*;

/// Release flags
///
/// `FUSE_RELEASE_FLUSH`: flush the file on release
pub const FUSE_RELEASE_FLUSH: u32 = 1 << 0;

/// FUSE operation code `fuse_opcode`
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
#[repr(u32)]
pub enum FuseOpCode {
    /// Look up a directory entry by name and get its attributes
    FUSE_LOOKUP = 1,
    /// Forget about an inode, no reply
    FUSE_FORGET = 2,
    /// Get file attributes
    FUSE_GETATTR = 3,
    /// Set file attributes
    FUSE_SETATTR = 4,
    /// Read symbolic link
    FUSE_READLINK = 5,
    /// Create a symbolic link
    FUSE_SYMLINK = 6,
    /// Create file node
    FUSE_MKNOD = 8,
    /// Create a directory
    FUSE_MKDIR = 9,
    /// Remove a file
    FUSE_UNLINK = 10,
    /// Remove a directory
    FUSE_RMDIR = 11,
    /// Rename a file
    FUSE_RENAME = 12,
    /// Create a hard link
    FUSE_LINK = 13,
    /// Open a file
    FUSE_OPEN = 14,
    /// Read data from file
    FUSE_READ = 15,
    /// Write data to file
    FUSE_WRITE = 16,
    /// Get file system statistics
    FUSE_STATFS = 17,
    /// Release an open file
    FUSE_RELEASE = 18,
    /// Synchronize file contents
    FUSE_FSYNC = 20,
    /// Set an extended attribute
    FUSE_SETXATTR = 21,
    /// Get an extended attribute
    FUSE_GETXATTR = 22,
    /// List extended attribute names
    FUSE_LISTXATTR = 23,
    /// Remove an extended attribute
    FUSE_REMOVEXATTR = 24,
    /// Flush file
    FUSE_FLUSH = 25,
    /// Initialize filesystem
    FUSE_INIT = 26,
    /// Open a directory
    FUSE_OPENDIR = 27,
    /// Read directory
    FUSE_READDIR = 28,
    /// Release an open directory
    FUSE_RELEASEDIR = 29,
    /// Synchronize directory contents
    FUSE_FSYNCDIR = 30,
    /// Test for a POSIX file lock
    FUSE_GETLK = 31,
    /// Acquire, modify or release a POSIX file lock
    FUSE_SETLK = 32,
    /// Acquire, modify or release a POSIX file lock and wait
    FUSE_SETLKW = 33,
    /// Check file access permissions
    FUSE_ACCESS = 34,
    /// Create and open a file
    FUSE_CREATE = 35,
    /// Interrupt a previous FUSE request
    FUSE_INTERRUPT = 36,
    /// Map block index within file to block index within device
    FUSE_BMAP = 37,
    /// Clean up filesystem
    FUSE_DESTROY = 38,
    /// Ioctl
    FUSE_IOCTL = 39,
    /// Poll for IO readiness
    FUSE_POLL = 40,
    /// A reply to a NOTIFY_RETRIEVE notification
    FUSE_NOTIFY_REPLY = 41,
    /// Batch forget inodes
    FUSE_BATCH_FORGET = 42,
    /// Allocate requested space
    FUSE_FALLOCATE = 43,
    /// Read directory with attributes
    FUSE_READDIRPLUS = 44,
    /// Rename a file with flags
    FUSE_RENAME2 = 45,
    /// Find next data or hole after the specified offset
    FUSE_LSEEK = 46,
    /// Copy a range of data from an opened file to another
    FUSE_COPY_FILE_RANGE = 47,
}

impl FuseOpCode {
    /// The raw wire value of this opcode
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// FUSE entry response `fuse_entry_out`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseEntryOut {
    /// Inode ID
    pub nodeid: u64,
    /// Inode generation: nodeid:gen must be unique for the fs's lifetime
    pub generation: u64,
    /// Cache timeout seconds for the name
    pub entry_valid: u64,
    /// Cache timeout seconds for the attributes
    pub attr_valid: u64,
    /// Cache timeout nano-seconds for the name
    pub entry_valid_nsec: u32,
    /// Cache timeout nano-seconds for the attributes
    pub attr_valid_nsec: u32,
    /// FUSE attributes
    pub attr: FuseAttr,
}

/// FUSE forget request input `fuse_forget_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseForgetIn {
    /// The number of lookups to forget
    pub nlookup: u64,
}

/// FUSE forget request input `fuse_forget_one`
#[derive(Debug)]
#[repr(C)]
pub struct FuseForgetOne {
    /// The node i-number
    pub nodeid: u64,
    /// The number of lookups to forget
    pub nlookup: u64,
}

/// FUSE batch forget request input `fuse_batch_forget_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseBatchForgetIn {
    /// Batch count
    pub count: u32,
    /// Alignment padding
    pub dummy: u32,
    // Followed by `count` number of FuseForgetOne
}

/// FUSE get attribute request input `fuse_getattr_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseGetAttrIn {
    /// Get attribute flags
    pub getattr_flags: u32,
    /// Alignment padding
    pub dummy: u32,
    /// File handler
    pub fh: u64,
}

/// FUSE get attribute response `fuse_attr_out`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseAttrOut {
    /// Cache timeout seconds for the attributes
    pub attr_valid: u64,
    /// Cache timeout nano-seconds for the attributes
    pub attr_valid_nsec: u32,
    /// Alignment padding
    pub dummy: u32,
    /// FUSE file attribute
    pub attr: FuseAttr,
}

/// FUSE make node request input `fuse_mknod_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseMkNodIn {
    /// File mode
    pub mode: u32,
    /// The device ID that this file (inode) represents if special file
    pub rdev: u32,
    /// The user file creation mode mask
    pub umask: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE make directory request input `fuse_mkdir_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseMkDirIn {
    /// Directory mode
    pub mode: u32,
    /// The user directory creation mode mask
    pub umask: u32,
}

/// FUSE rename request input `fuse_rename_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseRenameIn {
    /// The new directory i-number
    pub newdir: u64,
}

/// FUSE rename2 request input `fuse_rename2_in`
///
/// Also the shape RENAME itself takes once the kernel has negotiated
/// rename-swap support (see [`FUSE_RENAME_SWAP`]).
#[derive(Debug)]
#[repr(C)]
pub struct FuseRename2In {
    /// The new directory i-number
    pub newdir: u64,
    /// The flags maybe either `RENAME_NOREPLACE`=1 or `RENAME_EXCHANGE`=2
    pub flags: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE link request input `fuse_link_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseLinkIn {
    /// The old node i-number
    pub oldnodeid: u64,
}

/// FUSE set attribute request input `fuse_setattr_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseSetAttrIn {
    /// FUSE set attribute bit mask
    pub valid: u32,
    /// Alignment padding
    pub padding: u32,
    /// File handler
    pub fh: u64,
    /// File size
    pub size: u64,
    /// Lock owner
    pub lock_owner: u64,
    /// Access time seconds
    pub atime: u64,
    /// Content modified time seconds
    pub mtime: u64,
    /// Meta-data changed time seconds
    pub ctime: u64,
    /// Access time nano-seconds
    pub atimensec: u32,
    /// Content modified time nano-seconds
    pub mtimensec: u32,
    /// Meta-data changed time nano-seconds
    pub ctimensec: u32,
    /// File mode
    pub mode: u32,
    /// Alignment padding
    pub unused4: u32,
    /// User ID
    pub uid: u32,
    /// Group ID
    pub gid: u32,
    /// Alignment padding
    pub unused5: u32,
}

/// FUSE open request input `fuse_open_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseOpenIn {
    /// Open flags
    pub flags: u32,
    /// Alignment padding
    pub unused: u32,
}

/// FUSE create request input `fuse_create_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseCreateIn {
    /// Creation flags
    pub flags: u32,
    /// File mode
    pub mode: u32,
    /// The user file creation mode mask
    pub umask: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE open response `fuse_open_out`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseOpenOut {
    /// File handler
    pub fh: u64,
    /// Open flags
    pub open_flags: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE release request input `fuse_release_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseReleaseIn {
    /// File handler
    pub fh: u64,
    /// Open flags
    pub flags: u32,
    /// Release flags
    pub release_flags: u32,
    /// Lock owner
    pub lock_owner: u64,
}

/// FUSE flush request input `fuse_flush_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseFlushIn {
    /// File handler
    pub fh: u64,
    /// Alignment padding
    pub unused: u32,
    /// Alignment padding
    pub padding: u32,
    /// Lock owner
    pub lock_owner: u64,
}

/// FUSE read request input `fuse_read_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseReadIn {
    /// File handler
    pub fh: u64,
    /// Read offset
    pub offset: u64,
    /// Read size
    pub size: u32,
    /// Read flags
    pub read_flags: u32,
    /// Lock owner
    pub lock_owner: u64,
    /// Open flags
    pub flags: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE write request input `fuse_write_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseWriteIn {
    /// File handler
    pub fh: u64,
    /// Write offset
    pub offset: u64,
    /// Write size
    pub size: u32,
    /// Write flags
    pub write_flags: u32,
    /// Lock owner
    pub lock_owner: u64,
    /// Open flags
    pub flags: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE write response `fuse_write_out`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseWriteOut {
    /// Write size
    pub size: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE statfs response `fuse_statfs_out`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseStatFsOut {
    /// FUSE kstatfs
    pub st: FuseKStatFs,
}

/// FUSE fsync request input `fuse_fsync_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseFSyncIn {
    /// File handler
    pub fh: u64,
    /// File sync flags
    pub fsync_flags: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE set extended attribute request input `fuse_setxattr_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseSetXAttrIn {
    /// The size of extended attribute value to set
    pub size: u32,
    /// The flags that specifies the meanings of this operation
    pub flags: u32,
}

/// FUSE get extended attribute request input `fuse_getxattr_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseGetXAttrIn {
    /// The maximum length of the attribute value to be replied
    pub size: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE get extended attribute response `fuse_getxattr_out`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseGetXAttrOut {
    /// The size of the extended attribute value
    pub size: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE lock request input `fuse_lk_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseLockIn {
    /// File handler
    pub fh: u64,
    /// Lock owner
    pub owner: u64,
    /// FUSE file lock
    pub lk: FuseFileLock,
    /// Lock flags
    pub lk_flags: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE lock response `fuse_lk_out`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseLockOut {
    /// FUSE file lock
    pub lk: FuseFileLock,
}

/// FUSE access request input `fuse_access_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseAccessIn {
    /// The requested access mode
    pub mask: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE init request input `fuse_init_in`
///
/// The part every kernel since 7.1 sends; [`FuseInitInExt`] is the record
/// the registry sizes the operation by.
#[derive(Debug)]
#[repr(C)]
pub struct FuseInitIn {
    /// FUSE protocol major version
    pub major: u32,
    /// FUSE protocol minor version
    pub minor: u32,
    /// FUSE maximum readahead size
    pub max_readahead: u32,
    /// FUSE init flags
    pub flags: u32,
}

/// FUSE init request input `fuse_init_in`, as extended in protocol 7.36
///
/// Kernels speaking an older minor version send only the [`FuseInitIn`]
/// prefix; the parser accepts whatever arrived.
#[derive(Debug)]
#[repr(C)]
pub struct FuseInitInExt {
    /// FUSE protocol major version
    pub major: u32,
    /// FUSE protocol minor version
    pub minor: u32,
    /// FUSE maximum readahead size
    pub max_readahead: u32,
    /// FUSE init flags
    pub flags: u32,
    /// Upper 32 bits of the init flags
    pub flags2: u32,
    /// For future use
    pub unused: [u32; 11],
}

/// FUSE init response `fuse_init_out`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseInitOut {
    /// FUSE protocol major version
    pub major: u32,
    /// FUSE protocol minor version
    pub minor: u32,
    /// FUSE maximum readahead size
    pub max_readahead: u32,
    /// FUSE init flags
    pub flags: u32,
    /// Max background pending requests under processing
    pub max_background: u16,
    /// Notify FUSE kernel module to mark the filesystem as "congested"
    /// if the number of pending requests above this threshold
    pub congestion_threshold: u16,
    /// The max size of write requests from the kernel
    pub max_write: u32,
    /// The timestamp granularity supported by the FUSE filesystem
    /// The default is 1 for full nano-second resolution, 1000000000 for
    /// second resolution
    pub time_gran: u32,
    /// The max number of pages per request
    pub max_pages: u16,
    /// Alignment padding
    pub padding: u16,
    /// For future use
    pub unused: [u32; 8],
}

/// FUSE interrupt request input `fuse_interrupt_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseInterruptIn {
    /// Interrupted FUSE request unique ID
    pub unique: u64,
}

/// FUSE bmap request input `fuse_bmap_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseBMapIn {
    /// The block index within file to be mapped
    pub block: u64,
    /// The unit of block index
    pub blocksize: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE bmap response `fuse_bmap_out`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseBMapOut {
    /// The block index to be mapped
    pub block: u64,
}

/// FUSE ioctl request input `fuse_ioctl_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseIoCtlIn {
    /// File handler
    pub fh: u64,
    /// FUSE ioctl flags
    pub flags: u32,
    /// FUSE ioctl command
    pub cmd: u32,
    /// FUSE ioctl command argument
    pub arg: u64,
    /// The number of fetched bytes
    pub in_size: u32,
    /// The maximum size of output data
    pub out_size: u32,
}

/// FUSE ioctl response `fuse_ioctl_out`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseIoCtlOut {
    /// Result to be passed to the caller
    pub result: i32,
    /// `FUSE_IOCTL_*` flags
    pub flags: u32,
    /// iovec specifying data to fetch from the caller
    pub in_iovs: u32,
    /// iovec specifying addresses to write output to
    pub out_iovs: u32,
}

/// FUSE poll request input `fuse_poll_in`
#[derive(Debug)]
#[repr(C)]
pub struct FusePollIn {
    /// File handler
    pub fh: u64,
    /// Wakeup handler
    pub kh: u64,
    /// Poll flags
    pub flags: u32,
    /// Poll events
    pub events: u32,
}

/// FUSE poll response `fuse_poll_out`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FusePollOut {
    /// Poll result event mask
    pub revents: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE notify reply request input `fuse_notify_retrieve_in`
/// matches the size of `fuse_write_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseNotifyRetrieveIn {
    /// Alignment padding
    pub dummy1: u64,
    /// Offset
    pub offset: u64,
    /// Size
    pub size: u32,
    /// Alignment padding
    pub dummy2: u32,
    /// Alignment padding
    pub dummy3: u64,
    /// Alignment padding
    pub dummy4: u64,
}

/// FUSE file allocate request input `fuse_fallocate_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseFAllocateIn {
    /// File handler
    pub fh: u64,
    /// File allocate offset
    pub offset: u64,
    /// File allocate length
    pub length: u64,
    /// File mode
    pub mode: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE lseek request input `fuse_lseek_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseLSeekIn {
    /// File handler
    pub fh: u64,
    /// Seek offset
    pub offset: u64,
    /// The directive that tells lseek what the offset is relative to
    pub whence: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE lseek response `fuse_lseek_out`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseLSeekOut {
    /// Seek offset
    pub offset: u64,
}

/// FUSE copy file range request input `fuse_copy_file_range_in`
#[derive(Debug)]
#[repr(C)]
pub struct FuseCopyFileRangeIn {
    /// The file handler of the source file
    pub fh_in: u64,
    /// The starting point from were the data should be read
    pub off_in: u64,
    /// The i-number or the destination file
    pub nodeid_out: u64,
    /// The file handler of the destination file
    pub fh_out: u64,
    /// The starting point where the data should be written
    pub off_out: u64,
    /// The maximum size of the data to copy
    pub len: u64,
    /// The flags passed along with the `copy_file_range()` syscall
    pub flags: u64,
}

/// FUSE request header `fuse_in_header`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseInHeader {
    /// Request size
    pub len: u32,
    /// FUSE operation code
    pub opcode: u32,
    /// The request unique ID
    pub unique: u64,
    /// The i-number of the node
    pub nodeid: u64,
    /// User ID
    pub uid: u32,
    /// Group ID
    pub gid: u32,
    /// Process ID
    pub pid: u32,
    /// Alignment padding
    pub padding: u32,
}

/// FUSE response header `fuse_out_header`
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct FuseOutHeader {
    /// Response size
    pub len: u32,
    /// Response error code, the negated errno
    pub error: i32,
    /// The associated request unique ID of this response
    pub unique: u64,
}

/// FUSE directory entry `fuse_dirent`
///
/// The flat payload of a READDIR reply is a run of these records, each
/// followed by `namelen` name bytes and zero padding to 8-byte alignment.
#[derive(Debug)]
#[repr(C)]
pub struct FuseDirEnt {
    /// The i-number of the entry
    pub ino: INum,
    /// Entry offset in the directory
    pub off: u64,
    /// Entry name length
    pub namelen: u32,
    /// Entry type
    pub typ: u32,
    // Followed by name of namelen bytes
    // char name[],
}

/// FUSE directory entry plus `fuse_direntplus`
/// used in `readdirplus()`
#[derive(Debug)]
#[repr(C)]
pub struct FuseDirEntPlus {
    /// FUSE directory entry extra info
    pub entry_out: FuseEntryOut,
    /// FUSE directory entry
    pub dirent: FuseDirEnt,
}
