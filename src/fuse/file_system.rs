//! The `FileSystem` trait

use async_trait::async_trait;

use super::request::FuseRequest;

/// The upstream contract of the request pipeline: a filesystem
/// implementation receives each parsed request and produces its reply
/// state.
///
/// For every opcode the handler may read the typed input record
/// ([`FuseRequest::read_in`]), the variable `arg` tail and the extracted
/// filenames, then set the status and either write a structured output
/// record ([`FuseRequest::set_out_data`]), attach flat bytes
/// ([`FuseRequest::set_flat_data`]) or attach an fd range
/// ([`FuseRequest::set_fd_data`]).
///
/// Handlers run on their own tasks and may block on user I/O; they can
/// observe cancellation cooperatively through
/// [`FuseRequest::cancel_token`].
#[async_trait]
pub trait FileSystem {
    /// Called while INIT is negotiated, before the reply is sent. An error
    /// aborts the negotiation with `ENOSYS`.
    async fn init(&self, req: &FuseRequest) -> nix::Result<()>;

    /// Handle one parsed request. INIT and INTERRUPT never reach this
    /// method; the session answers them itself.
    async fn handle(&self, req: &mut FuseRequest);
}
