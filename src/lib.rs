//! `fuse-ll`
//!
//! A low-level FUSE request pipeline: it turns raw kernel frames read from
//! the FUSE character device into typed requests, dispatches them to a
//! user-supplied [`FileSystem`](fuse::file_system::FileSystem) handler and
//! serializes the replies back into single length-prefixed frames.
//!
//! The crate deliberately stops at the pipeline boundary: device I/O, the
//! mount syscall sequence and the high-level inode tree are the caller's
//! business. The transport reads frames and hands them to
//! [`Session::dispatch`](fuse::session::Session::dispatch) together with a
//! [`ReplySender`](fuse::reply::ReplySender) that writes the reply frames
//! back to the kernel.

#![deny(
    // The following are allowed by default lints according to
    // https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html
    anonymous_parameters,
    bare_trait_objects,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    variant_size_differences
)]
#![allow(
    clippy::module_name_repetitions, // repeation of module name in a struct name is not big deal
    clippy::multiple_crate_versions // multi-version dependency crates is not able to fix
)]

pub mod common;
pub mod fuse;
pub mod metrics;
