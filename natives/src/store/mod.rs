use crate::command::Command;
use crate::error::{Error, Result};
use redis_protocol::resp2::types::OwnedFrame as Frame;

pub mod memory;
pub mod reply;
pub mod resp;
#[cfg(feature = "foundationdb")]
pub mod foundation;

pub use memory::MemoryStore;
pub use resp::RespStore;
#[cfg(feature = "foundationdb")]
pub use foundation::FdbStore;

/// A handle to a remote store that executes set commands.
///
/// Handles are cheap clones over a shared connection; the store, not the
/// handle, owns remote state.
pub trait SetStore: Clone + Send + Sync + 'static {
    /// Executes `commands` in order and returns one reply per command.
    ///
    /// Per-command failures come back as `Frame::Error` entries and do not stop
    /// later commands. `Err` means the exchange itself broke; when some replies
    /// were already received the error is a `BatchPartialFailure`.
    fn pipeline(&self, commands: Vec<Command>) -> impl std::future::Future<Output = Result<Vec<Frame>>> + Send;

    /// Executes a single command, turning an error reply into an `Error`.
    fn execute(&self, command: Command) -> impl std::future::Future<Output = Result<Frame>> + Send {
        async move {
            let key = command.key().to_string();
            let mut replies = self.pipeline(vec![command]).await?;
            match replies.pop() {
                Some(Frame::Error(message)) => Err(Error::from_reply(&message, &key)),
                Some(frame) => Ok(frame),
                None => Err(Error::Protocol("store returned no reply".into())),
            }
        }
    }
}
