//! Internal unsafe marker for FUSE ABI types

use std::slice;

/// FUSE ABI types.
///
/// It is safe to transmute a `&[u8]` to `&T` where `T: FuseAbiData + Sized`.
///
/// [`FuseAbiData`] can not be implemented for ZSTs.
pub unsafe trait FuseAbiData {}

/// # Safety
/// T must not be changed during the lifetime of `&[u8]`
#[inline]
unsafe fn as_bytes_unchecked<T: Sized>(raw: &T) -> &[u8] {
    let ty_size = size_of::<T>();
    let base: *const u8 = <*const T>::cast(raw);
    slice::from_raw_parts(base, ty_size)
}

/// Transmutes `&T` to `&[u8]` where `T: FuseAbiData + Sized`
#[inline]
pub fn as_abi_bytes<T: FuseAbiData + Sized>(raw: &T) -> &[u8] {
    unsafe { as_bytes_unchecked(raw) }
}

/// Impl `FuseAbiData` trait
macro_rules! mark_abi_type {
    ($ty:ty) => {
        unsafe impl FuseAbiData for $ty {}
    };
}

/// Impl `FuseAbiData` for sized types
macro_rules! mark_sized_types {
    (@kernel size_check: $name: ident, $($ty:ident,)+) => {
        $(
            mark_abi_type!(super::protocol::$ty);
        )+

        #[test]
        fn $name() {
            $(
                assert!(size_of::<super::protocol::$ty>() > 0); // ZST makes no sense
            )+
            $(
                assert!(size_of::<super::protocol::$ty>() <= 256); // detect large types
            )+
        }
    };

    (@primitive $($ty:ty,)+) => {
        $(
            mark_abi_type!($ty);
        )+
    }
}

mark_sized_types!(@primitive
    u8,
    u16,
    u32,
    u64,
    usize,
    i8,
    i16,
    i32,
    i64,
    isize,
);

mark_sized_types!(@kernel size_check: check_abi_sizes,
    FuseAttr,
    FuseKStatFs,
    FuseFileLock,
    FuseEntryOut,
    FuseForgetIn,
    FuseForgetOne,
    FuseBatchForgetIn,
    FuseGetAttrIn,
    FuseAttrOut,
    FuseMkNodIn,
    FuseMkDirIn,
    FuseRenameIn,
    FuseRename2In,
    FuseLinkIn,
    FuseSetAttrIn,
    FuseOpenIn,
    FuseCreateIn,
    FuseOpenOut,
    FuseReleaseIn,
    FuseFlushIn,
    FuseReadIn,
    FuseWriteIn,
    FuseWriteOut,
    FuseStatFsOut,
    FuseFSyncIn,
    FuseSetXAttrIn,
    FuseGetXAttrIn,
    FuseGetXAttrOut,
    FuseLockIn,
    FuseLockOut,
    FuseAccessIn,
    FuseInitIn,
    FuseInitInExt,
    FuseInitOut,
    FuseInterruptIn,
    FuseBMapIn,
    FuseBMapOut,
    FuseIoCtlIn,
    FuseIoCtlOut,
    FusePollIn,
    FusePollOut,
    FuseNotifyRetrieveIn,
    FuseFAllocateIn,
    FuseLSeekIn,
    FuseLSeekOut,
    FuseCopyFileRangeIn,
    FuseInHeader,
    FuseOutHeader,
    FuseDirEnt,
    FuseDirEntPlus,
);

#[cfg(test)]
mod tests {

    use super::super::protocol::{
        FuseAttr, FuseCreateIn, FuseEntryOut, FuseInHeader, FuseInitInExt, FuseInitOut,
        FuseOutHeader, FuseReadIn, FuseRename2In, FuseSetAttrIn, FuseWriteIn,
    };

    #[test]
    fn wire_sizes_match_kernel_abi() {
        assert_eq!(size_of::<FuseInHeader>(), 40);
        assert_eq!(size_of::<FuseOutHeader>(), 16);
        assert_eq!(size_of::<FuseAttr>(), 88);
        assert_eq!(size_of::<FuseEntryOut>(), 128);
        assert_eq!(size_of::<FuseSetAttrIn>(), 88);
        assert_eq!(size_of::<FuseReadIn>(), 40);
        assert_eq!(size_of::<FuseWriteIn>(), 40);
        assert_eq!(size_of::<FuseCreateIn>(), 16);
        assert_eq!(size_of::<FuseRename2In>(), 16);
        assert_eq!(size_of::<FuseInitInExt>(), 64);
        assert_eq!(size_of::<FuseInitOut>(), 64);
    }
}
