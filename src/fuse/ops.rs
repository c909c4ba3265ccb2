//! The FUSE operation registry.
//!
//! One immutable row per opcode the kernel may send, recording the fixed
//! input-record size (bytes after the in-header), the fixed output-record
//! size (bytes after the out-header), how many NUL-terminated filename
//! arguments trail the input record, whether the reply's flat payload is a
//! filename, and an optional printer used by the request debug rendering.


use clippy_utilities::Cast;
use once_cell::sync::Lazy;

use super::de::Deserializer;
use super::protocol::{
    FuseAccessIn, FuseAttrOut, FuseBMapIn, FuseBMapOut, FuseBatchForgetIn, FuseCopyFileRangeIn,
    FuseCreateIn, FuseEntryOut, FuseFAllocateIn, FuseFSyncIn, FuseFlushIn, FuseForgetIn,
    FuseGetAttrIn, FuseGetXAttrIn, FuseGetXAttrOut, FuseInitInExt, FuseInitOut, FuseInterruptIn,
    FuseIoCtlIn, FuseIoCtlOut, FuseLSeekIn, FuseLSeekOut, FuseLinkIn, FuseLockIn, FuseLockOut,
    FuseMkDirIn, FuseMkNodIn, FuseNotifyRetrieveIn, FuseOpenIn, FuseOpenOut, FusePollIn,
    FusePollOut, FuseReadIn, FuseReleaseIn, FuseRename2In, FuseRenameIn, FuseSetAttrIn,
    FuseSetXAttrIn, FuseStatFsOut, FuseWriteIn, FuseWriteOut,
};

/// One registry row.
#[derive(Debug)]
pub struct OpEntry {
    /// Operation name for logs and metrics
    pub name: &'static str,
    /// Fixed input-record size in bytes, after the in-header
    pub input_size: usize,
    /// Fixed output-record size in bytes, after the out-header
    pub output_size: usize,
    /// How many NUL-terminated filename arguments follow the input record
    pub file_names: usize,
    /// Whether the reply's flat payload is a filename (READLINK)
    pub filename_out: bool,
    /// Renders the input record for debug logs
    pub debug: Option<fn(&[u8]) -> String>,
}

/// The largest opcode in the table
const MAX_OPCODE: usize = 47;

/// Look up the registry entry for a raw opcode, `None` when the kernel sent
/// an operation this runtime does not know.
#[must_use]
pub fn op_entry(opcode: u32) -> Option<&'static OpEntry> {
    OP_TABLE.get(opcode.cast::<usize>())?.as_ref()
}

/// The operation name for a raw opcode, for logs and metric labels.
#[must_use]
pub fn operation_name(opcode: u32) -> &'static str {
    op_entry(opcode).map_or("UNKNOWN", |entry| entry.name)
}

/// The registry table, indexed by opcode.
static OP_TABLE: Lazy<[Option<OpEntry>; MAX_OPCODE + 1]> = Lazy::new(build_op_table);

/// One table row: `row(name, input record size, output record size,
/// filename count, filename-out flag, debug printer)`.
fn row(
    name: &'static str,
    input_size: usize,
    output_size: usize,
    file_names: usize,
    filename_out: bool,
    debug: Option<fn(&[u8]) -> String>,
) -> Option<OpEntry> {
    Some(OpEntry {
        name,
        input_size,
        output_size,
        file_names,
        filename_out,
        debug,
    })
}

/// Record size shorthand, to keep the table rows on one line each.
const fn size<T>() -> usize {
    size_of::<T>()
}

#[rustfmt::skip]
#[allow(clippy::too_many_lines)]
fn build_op_table() -> [Option<OpEntry>; MAX_OPCODE + 1] {
    let mut t: [Option<OpEntry>; MAX_OPCODE + 1] = std::array::from_fn(|_| None);

    t[1] = row("LOOKUP", 0, size::<FuseEntryOut>(), 1, false, None);
    t[2] = row("FORGET", size::<FuseForgetIn>(), 0, 0, false, Some(print_forget_in));
    t[3] = row("GETATTR", size::<FuseGetAttrIn>(), size::<FuseAttrOut>(), 0, false, None);
    t[4] = row("SETATTR", size::<FuseSetAttrIn>(), size::<FuseAttrOut>(), 0, false, Some(print_set_attr_in));
    t[5] = row("READLINK", 0, 0, 0, true, None);
    t[6] = row("SYMLINK", 0, size::<FuseEntryOut>(), 2, false, None);
    t[8] = row("MKNOD", size::<FuseMkNodIn>(), size::<FuseEntryOut>(), 1, false, None);
    t[9] = row("MKDIR", size::<FuseMkDirIn>(), size::<FuseEntryOut>(), 1, false, None);
    t[10] = row("UNLINK", 0, 0, 1, false, None);
    t[11] = row("RMDIR", 0, 0, 1, false, None);
    t[12] = row("RENAME", size::<FuseRenameIn>(), 0, 2, false, Some(print_rename_in));
    t[13] = row("LINK", size::<FuseLinkIn>(), size::<FuseEntryOut>(), 1, false, None);
    t[14] = row("OPEN", size::<FuseOpenIn>(), size::<FuseOpenOut>(), 0, false, Some(print_open_in));
    t[15] = row("READ", size::<FuseReadIn>(), 0, 0, false, Some(print_read_in));
    t[16] = row("WRITE", size::<FuseWriteIn>(), size::<FuseWriteOut>(), 0, false, Some(print_write_in));
    t[17] = row("STATFS", 0, size::<FuseStatFsOut>(), 0, false, None);
    t[18] = row("RELEASE", size::<FuseReleaseIn>(), 0, 0, false, None);
    t[20] = row("FSYNC", size::<FuseFSyncIn>(), 0, 0, false, None);
    t[21] = row("SETXATTR", size::<FuseSetXAttrIn>(), 0, 1, false, None);
    t[22] = row("GETXATTR", size::<FuseGetXAttrIn>(), size::<FuseGetXAttrOut>(), 1, false, Some(print_get_x_attr_in));
    t[23] = row("LISTXATTR", size::<FuseGetXAttrIn>(), size::<FuseGetXAttrOut>(), 0, false, Some(print_get_x_attr_in));
    t[24] = row("REMOVEXATTR", 0, 0, 1, false, None);
    t[25] = row("FLUSH", size::<FuseFlushIn>(), 0, 0, false, Some(print_flush_in));
    t[26] = row("INIT", size::<FuseInitInExt>(), size::<FuseInitOut>(), 0, false, Some(print_init_in));
    t[27] = row("OPENDIR", size::<FuseOpenIn>(), size::<FuseOpenOut>(), 0, false, Some(print_open_in));
    t[28] = row("READDIR", size::<FuseReadIn>(), 0, 0, false, Some(print_read_in));
    t[29] = row("RELEASEDIR", size::<FuseReleaseIn>(), 0, 0, false, None);
    t[30] = row("FSYNCDIR", size::<FuseFSyncIn>(), 0, 0, false, None);
    t[31] = row("GETLK", size::<FuseLockIn>(), size::<FuseLockOut>(), 0, false, None);
    t[32] = row("SETLK", size::<FuseLockIn>(), 0, 0, false, None);
    t[33] = row("SETLKW", size::<FuseLockIn>(), 0, 0, false, None);
    t[34] = row("ACCESS", size::<FuseAccessIn>(), 0, 0, false, Some(print_access_in));
    t[35] = row("CREATE", size::<FuseCreateIn>(), size::<FuseEntryOut>() + size::<FuseOpenOut>(), 1, false, Some(print_create_in));
    t[36] = row("INTERRUPT", size::<FuseInterruptIn>(), 0, 0, false, Some(print_interrupt_in));
    t[37] = row("BMAP", size::<FuseBMapIn>(), size::<FuseBMapOut>(), 0, false, None);
    t[38] = row("DESTROY", 0, 0, 0, false, None);
    t[39] = row("IOCTL", size::<FuseIoCtlIn>(), size::<FuseIoCtlOut>(), 0, false, None);
    t[40] = row("POLL", size::<FusePollIn>(), size::<FusePollOut>(), 0, false, None);
    t[41] = row("NOTIFY_REPLY", size::<FuseNotifyRetrieveIn>(), 0, 0, false, None);
    t[42] = row("BATCH_FORGET", size::<FuseBatchForgetIn>(), 0, 0, false, None);
    t[43] = row("FALLOCATE", size::<FuseFAllocateIn>(), 0, 0, false, Some(print_f_allocate_in));
    t[44] = row("READDIRPLUS", size::<FuseReadIn>(), 0, 0, false, Some(print_read_in));
    t[45] = row("RENAME2", size::<FuseRename2In>(), 0, 2, false, Some(print_rename2_in));
    t[46] = row("LSEEK", size::<FuseLSeekIn>(), size::<FuseLSeekOut>(), 0, false, Some(print_l_seek_in));
    t[47] = row("COPY_FILE_RANGE", size::<FuseCopyFileRangeIn>(), size::<FuseWriteOut>(), 0, false, Some(print_copy_file_range_in));

    t
}

/// Fetches the input record of type `T` and renders it with `f`, falling
/// back to a placeholder when the record is truncated.
fn print_record<T, F>(bytes: &[u8], f: F) -> String
where
    T: super::abi_marker::FuseAbiData + Sized,
    F: FnOnce(&T) -> String,
{
    let mut de = Deserializer::new(bytes);
    match de.fetch_ref::<T>() {
        Ok(record) => f(record),
        Err(..) => "<truncated>".to_owned(),
    }
}

fn print_forget_in(bytes: &[u8]) -> String {
    print_record::<FuseForgetIn, _>(bytes, |arg| format!("nlookup={}", arg.nlookup))
}

fn print_set_attr_in(bytes: &[u8]) -> String {
    print_record::<FuseSetAttrIn, _>(bytes, |arg| format!("valid={:#x}", arg.valid))
}

fn print_rename_in(bytes: &[u8]) -> String {
    print_record::<FuseRenameIn, _>(bytes, |arg| format!("newdir={:#018x}", arg.newdir))
}

fn print_rename2_in(bytes: &[u8]) -> String {
    print_record::<FuseRename2In, _>(bytes, |arg| {
        format!("newdir={:#018x}, flags={:#x}", arg.newdir, arg.flags)
    })
}

fn print_open_in(bytes: &[u8]) -> String {
    print_record::<FuseOpenIn, _>(bytes, |arg| format!("flags={:#x}", arg.flags))
}

fn print_read_in(bytes: &[u8]) -> String {
    print_record::<FuseReadIn, _>(bytes, |arg| {
        format!("fh={}, offset={}, size={}", arg.fh, arg.offset, arg.size)
    })
}

fn print_write_in(bytes: &[u8]) -> String {
    print_record::<FuseWriteIn, _>(bytes, |arg| {
        format!(
            "fh={}, offset={}, size={}, write flags={:#x}",
            arg.fh, arg.offset, arg.size, arg.write_flags
        )
    })
}

fn print_get_x_attr_in(bytes: &[u8]) -> String {
    print_record::<FuseGetXAttrIn, _>(bytes, |arg| format!("size={}", arg.size))
}

fn print_flush_in(bytes: &[u8]) -> String {
    print_record::<FuseFlushIn, _>(bytes, |arg| {
        format!("fh={}, lock owner={}", arg.fh, arg.lock_owner)
    })
}

fn print_init_in(bytes: &[u8]) -> String {
    print_record::<super::protocol::FuseInitIn, _>(bytes, |arg| {
        format!(
            "kernel ABI={}.{}, flags={:#x}, max readahead={}",
            arg.major, arg.minor, arg.flags, arg.max_readahead
        )
    })
}

fn print_access_in(bytes: &[u8]) -> String {
    print_record::<FuseAccessIn, _>(bytes, |arg| format!("mask={:#05o}", arg.mask))
}

fn print_create_in(bytes: &[u8]) -> String {
    print_record::<FuseCreateIn, _>(bytes, |arg| {
        format!("mode={:#05o}, flags={:#x}", arg.mode, arg.flags)
    })
}

fn print_interrupt_in(bytes: &[u8]) -> String {
    print_record::<FuseInterruptIn, _>(bytes, |arg| format!("unique={}", arg.unique))
}

fn print_f_allocate_in(bytes: &[u8]) -> String {
    print_record::<FuseFAllocateIn, _>(bytes, |arg| {
        format!(
            "fh={}, offset={}, length={}, mode={:#05o}",
            arg.fh, arg.offset, arg.length, arg.mode
        )
    })
}

fn print_l_seek_in(bytes: &[u8]) -> String {
    print_record::<FuseLSeekIn, _>(bytes, |arg| {
        format!("fh={}, offset={}, whence={}", arg.fh, arg.offset, arg.whence)
    })
}

fn print_copy_file_range_in(bytes: &[u8]) -> String {
    print_record::<FuseCopyFileRangeIn, _>(bytes, |arg| {
        format!(
            "src fh={}, dst fh={}, len={}, flags={:#x}",
            arg.fh_in, arg.fh_out, arg.len, arg.flags
        )
    })
}

#[cfg(test)]
mod tests {

    use super::{op_entry, operation_name};
    use crate::fuse::protocol::{
        FuseEntryOut, FuseInitInExt, FuseInitOut, FuseOpenOut, FuseReadIn,
    };

    /// Every opcode a kernel may send, as recorded from a protocol trace.
    const OPCODE_CORPUS: [u32; 45] = [
        1, 2, 3, 4, 5, 6, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 20, 21, 22, 23, 24, 25, 26,
        27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47,
    ];

    #[test]
    fn registry_covers_the_full_corpus() {
        for opcode in OPCODE_CORPUS {
            assert!(
                op_entry(opcode).is_some(),
                "opcode {opcode} missing from the registry"
            );
        }
    }

    #[test]
    fn holes_and_out_of_range_opcodes_resolve_to_none() {
        for opcode in [0, 7, 19, 48, 4096, 0xFFFF] {
            assert!(op_entry(opcode).is_none());
        }
    }

    #[test]
    fn entry_shapes() {
        let read = op_entry(15).unwrap_or_else(|| panic!("READ must be registered"));
        assert_eq!(read.input_size, size_of::<FuseReadIn>());
        assert_eq!(read.output_size, 0);
        assert_eq!(read.file_names, 0);

        let lookup = op_entry(1).unwrap_or_else(|| panic!("LOOKUP must be registered"));
        assert_eq!(lookup.input_size, 0);
        assert_eq!(lookup.output_size, size_of::<FuseEntryOut>());
        assert_eq!(lookup.file_names, 1);

        let create = op_entry(35).unwrap_or_else(|| panic!("CREATE must be registered"));
        assert_eq!(
            create.output_size,
            size_of::<FuseEntryOut>() + size_of::<FuseOpenOut>()
        );

        let init = op_entry(26).unwrap_or_else(|| panic!("INIT must be registered"));
        assert_eq!(init.input_size, size_of::<FuseInitInExt>());
        assert_eq!(init.output_size, size_of::<FuseInitOut>());

        let readlink = op_entry(5).unwrap_or_else(|| panic!("READLINK must be registered"));
        assert!(readlink.filename_out);

        let rename = op_entry(12).unwrap_or_else(|| panic!("RENAME must be registered"));
        assert_eq!(rename.file_names, 2);
    }

    #[test]
    fn names() {
        assert_eq!(operation_name(26), "INIT");
        assert_eq!(operation_name(0xFFFF), "UNKNOWN");
    }
}
