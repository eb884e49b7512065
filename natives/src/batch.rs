//! Ordered command batches with temporary-key bookkeeping.
//!
//! A batch is one pipeline: commands run on the store in enqueue order, but a
//! failing command does not roll back the ones before it. Temporary keys
//! handed out by [`Batch::temp_key`] are deleted by a trailing `DEL` in the same
//! pipeline, and again with a separate best-effort `DEL` when submission fails.

use crate::command::Command;
use crate::config::SharedConfig;
use crate::error::{Error, Result};
use crate::store::{SetStore, reply};
use redis_protocol::resp2::types::OwnedFrame as Frame;
use uuid::Uuid;

/// Error for a batch that stopped at `failed_at`; every non-error reply counts as applied.
pub(crate) fn partial_failure(total: usize, replies: &[Frame], failed_at: usize, message: String) -> Error {
    let applied = replies
        .iter()
        .enumerate()
        .take(total)
        .filter(|(_, reply)| !matches!(reply, Frame::Error(_)))
        .map(|(i, _)| i)
        .collect();
    Error::BatchPartialFailure {
        total,
        applied,
        failed_at: failed_at.min(total),
        message,
    }
}

/// Keys a command reads, minus the batch's own temporary keys.
fn source_keys(command: &Command, temp_keys: &[String]) -> Vec<String> {
    let keys: Vec<&str> = match command {
        Command::SUnion { keys }
        | Command::SInter { keys }
        | Command::SDiff { keys }
        | Command::SUnionStore { keys, .. }
        | Command::SInterStore { keys, .. }
        | Command::SDiffStore { keys, .. } => keys.iter().map(String::as_str).collect(),
        other => vec![other.key()],
    };
    keys.into_iter()
        .filter(|k| !temp_keys.iter().any(|t| t == k))
        .map(str::to_string)
        .collect()
}

/// Names the key behind a `WRONGTYPE` reply. Multi-key commands are resolved
/// with a `TYPE` lookup; `fallback` is used when that is inconclusive.
async fn wrong_type_key<S: SetStore>(store: &S, sources: &[String], fallback: &str) -> String {
    if sources.len() > 1 {
        let lookups = sources.iter().map(|k| Command::Type { key: k.clone() }).collect();
        match store.pipeline(lookups).await {
            Ok(types) => {
                for (key, frame) in sources.iter().zip(types) {
                    if let Ok(kind) = reply::status(frame, key) {
                        if kind != "set" && kind != "none" {
                            return key.clone();
                        }
                    }
                }
            }
            Err(e) => log::warn!("type lookup after WRONGTYPE failed: {}", e),
        }
    }
    sources.first().map_or_else(|| fallback.to_string(), String::clone)
}

pub struct Batch {
    config: SharedConfig,
    commands: Vec<Command>,
    temp_keys: Vec<String>,
}

impl Batch {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            config,
            commands: Vec::new(),
            temp_keys: Vec::new(),
        }
    }

    /// Appends a command and returns the index of its reply.
    pub fn enqueue(&mut self, command: Command) -> usize {
        self.commands.push(command);
        self.commands.len() - 1
    }

    /// Splits `members` into commands of at most `max_members_per_command`
    /// members each. Nothing is enqueued for an empty list.
    pub fn enqueue_members<F>(&mut self, members: Vec<Vec<u8>>, make: F)
    where
        F: Fn(Vec<Vec<u8>>) -> Command,
    {
        let size = self.config.max_members_per_command.max(1);
        let mut members = members.into_iter().peekable();
        while members.peek().is_some() {
            let chunk: Vec<Vec<u8>> = members.by_ref().take(size).collect();
            self.enqueue(make(chunk));
        }
    }

    /// A fresh, collision-resistant key that this batch deletes on submit.
    pub fn temp_key(&mut self) -> String {
        let key = format!("{}{}", self.config.temp_key_prefix, Uuid::now_v7().simple());
        self.temp_keys.push(key.clone());
        key
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Submits the batch and returns the replies of the enqueued commands.
    ///
    /// A `WRONGTYPE` reply anywhere fails the batch with `TypeMismatch` on
    /// the key that holds the wrong type. Otherwise a failing single command keeps
    /// its own error kind, and in larger batches an error reply becomes
    /// `BatchPartialFailure`.
    pub async fn submit<S: SetStore>(self, store: &S) -> Result<Vec<Frame>> {
        let Batch { commands, temp_keys, .. } = self;
        let total = commands.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = commands.iter().map(|c| c.key().to_string()).collect();
        let sources: Vec<Vec<String>> = commands.iter().map(|c| source_keys(c, &temp_keys)).collect();

        let mut pipeline = commands;
        if !temp_keys.is_empty() {
            pipeline.push(Command::Del { keys: temp_keys.clone() });
        }
        log::debug!("submitting batch of {} commands with {} temporary keys", total, temp_keys.len());

        let outcome = match store.pipeline(pipeline).await {
            Ok(mut replies) => {
                let expected = total + usize::from(!temp_keys.is_empty());
                if replies.len() != expected {
                    Err(Error::Protocol(format!("expected {} replies, got {}", expected, replies.len())))
                } else {
                    if !temp_keys.is_empty() {
                        if let Some(Frame::Error(message)) = replies.pop() {
                            log::warn!("failed to delete temporary keys {:?}: {}", temp_keys, message);
                        }
                    }
                    let wrong_type = replies
                        .iter()
                        .position(|r| matches!(r, Frame::Error(m) if m.starts_with("WRONGTYPE")));
                    match (wrong_type, replies.iter().position(|r| matches!(r, Frame::Error(_)))) {
                        (_, None) => Ok(replies),
                        (Some(i), _) => Err(Error::TypeMismatch {
                            key: wrong_type_key(store, &sources[i], &keys[i]).await,
                        }),
                        (None, Some(i)) => {
                            let message = match &replies[i] {
                                Frame::Error(message) => message.clone(),
                                _ => String::new(),
                            };
                            if total == 1 {
                                Err(Error::from_reply(&message, &keys[i]))
                            } else {
                                Err(partial_failure(total, &replies, i, message))
                            }
                        }
                    }
                }
            }
            Err(Error::BatchPartialFailure { applied, failed_at, message, .. }) => Err(Error::BatchPartialFailure {
                total,
                applied: applied.into_iter().filter(|i| *i < total).collect(),
                failed_at: failed_at.min(total),
                message,
            }),
            Err(e) => Err(e),
        };

        if outcome.is_err() && !temp_keys.is_empty() {
            if let Err(e) = store.execute(Command::Del { keys: temp_keys.clone() }).await {
                log::warn!("failed to clean up temporary keys {:?}: {}", temp_keys, e);
            }
        }
        outcome
    }
}
