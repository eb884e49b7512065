use crate::command::Command;
use crate::error::{Error, Result};
use crate::store::SetStore;
use fdb::{FoundationDB, SetError, SetModel};
use foundationdb::{FdbBindingError, Transaction};
use redis_protocol::resp2::types::OwnedFrame as Frame;
use std::collections::BTreeSet;

/// Store backed by the FoundationDB set data model.
///
/// A whole pipeline runs in one transaction, so its commands become visible
/// together. Error replies still do not stop later commands.
#[derive(Clone)]
pub struct FdbStore {
    fdb: FoundationDB,
}

impl FdbStore {
    pub fn new(fdb: FoundationDB) -> Self {
        Self { fdb }
    }
}

fn array(members: BTreeSet<Vec<u8>>) -> Frame {
    Frame::Array(members.into_iter().map(Frame::BulkString).collect())
}

fn raw_keys(keys: &[String]) -> Vec<Vec<u8>> {
    keys.iter().map(|k| k.as_bytes().to_vec()).collect()
}

fn optional(member: Option<Vec<u8>>) -> Frame {
    member.map_or(Frame::Null, Frame::BulkString)
}

async fn apply(trx: &Transaction, command: &Command) -> std::result::Result<Frame, FdbBindingError> {
    let outcome: std::result::Result<Frame, SetError> = match command {
        Command::SAdd { key, members } => SetModel::add(trx, key.as_bytes(), members).await.map(Frame::Integer),
        Command::SRem { key, members } => SetModel::remove(trx, key.as_bytes(), members).await.map(Frame::Integer),
        Command::SIsMember { key, member } => SetModel::contains(trx, key.as_bytes(), member)
            .await
            .map(|found| Frame::Integer(found as i64)),
        Command::SCard { key } => SetModel::card(trx, key.as_bytes()).await.map(Frame::Integer),
        Command::SMembers { key } => SetModel::members(trx, key.as_bytes()).await.map(array),
        Command::SUnion { keys } => SetModel::union(trx, &raw_keys(keys)).await.map(array),
        Command::SInter { keys } => SetModel::inter(trx, &raw_keys(keys)).await.map(array),
        Command::SDiff { keys } => SetModel::diff(trx, &raw_keys(keys)).await.map(array),
        Command::SUnionStore { destination, keys } => match SetModel::union(trx, &raw_keys(keys)).await {
            Ok(result) => SetModel::replace(trx, destination.as_bytes(), &result).await.map(Frame::Integer),
            Err(e) => Err(e),
        },
        Command::SInterStore { destination, keys } => match SetModel::inter(trx, &raw_keys(keys)).await {
            Ok(result) => SetModel::replace(trx, destination.as_bytes(), &result).await.map(Frame::Integer),
            Err(e) => Err(e),
        },
        Command::SDiffStore { destination, keys } => match SetModel::diff(trx, &raw_keys(keys)).await {
            Ok(result) => SetModel::replace(trx, destination.as_bytes(), &result).await.map(Frame::Integer),
            Err(e) => Err(e),
        },
        Command::SRandMember { key } => SetModel::random_member(trx, key.as_bytes()).await.map(optional),
        Command::SPop { key } => SetModel::pop(trx, key.as_bytes()).await.map(optional),
        Command::Del { keys } => {
            let mut removed = 0i64;
            for key in keys {
                if SetModel::erase(trx, key.as_bytes()).await? {
                    removed += 1;
                }
            }
            Ok(Frame::Integer(removed))
        }
        Command::Type { key } => {
            let kind = SetModel::kind(trx, key.as_bytes()).await?;
            let name = kind.unwrap_or_else(|| b"none".to_vec());
            Ok(Frame::SimpleString(name))
        }
        Command::Rename { key, new_key } => SetModel::rename(trx, key.as_bytes(), new_key.as_bytes())
            .await
            .map(|_| Frame::SimpleString(b"OK".to_vec())),
    };

    match outcome {
        Ok(frame) => Ok(frame),
        // transport level; let the retry loop see it
        Err(SetError::Fdb(e)) => Err(e.into()),
        Err(other) => Ok(Frame::Error(other.to_string())),
    }
}

impl SetStore for FdbStore {
    async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<Frame>> {
        log::debug!("running pipeline of {} commands in one FoundationDB transaction", commands.len());
        self.fdb
            .transact(|trx| {
                let commands = commands.clone();
                async move {
                    let mut replies = Vec::with_capacity(commands.len());
                    for command in &commands {
                        replies.push(apply(&trx, command).await?);
                    }
                    Ok(replies)
                }
            })
            .await
            .map_err(|e| Error::Store(format!("FoundationDB error: {:?}", e)))
    }
}
