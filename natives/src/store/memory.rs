use crate::command::Command;
use crate::error::Result;
use crate::store::SetStore;
use rand::seq::IteratorRandom;
use redis_protocol::resp2::types::OwnedFrame as Frame;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

#[derive(Debug, Clone)]
enum Value {
    Set(HashSet<Vec<u8>>),
    String(Vec<u8>),
}

/// In-process store with Redis set semantics.
///
/// Empty sets are removed, missing keys read as empty sets, and set commands
/// against a string value answer `WRONGTYPE`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, Value>>>,
}

type Members = HashSet<Vec<u8>>;

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a plain string value, the way a non-set writer would.
    pub fn set_string(&self, key: &str, value: &[u8]) {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.insert(key.to_string(), Value::String(value.to_vec()));
    }

    /// The value under `key` if it holds a plain string.
    pub fn get_string(&self, key: &str) -> Option<Vec<u8>> {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        match data.get(key) {
            Some(Value::String(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Keys currently present, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.keys().cloned().collect()
    }

    /// Executes one command against the locked keyspace.
    pub fn apply(&self, command: Command) -> Frame {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        log::trace!("memory store {} {}", command.name(), command.key());
        match apply(&mut data, command) {
            Ok(frame) => frame,
            Err(message) => Frame::Error(message),
        }
    }
}

impl SetStore for MemoryStore {
    async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<Frame>> {
        Ok(commands.into_iter().map(|c| self.apply(c)).collect())
    }
}

fn lookup<'a>(data: &'a HashMap<String, Value>, key: &str) -> std::result::Result<Option<&'a Members>, String> {
    match data.get(key) {
        None => Ok(None),
        Some(Value::Set(set)) => Ok(Some(set)),
        Some(Value::String(_)) => Err(WRONGTYPE.to_string()),
    }
}

fn load(data: &HashMap<String, Value>, keys: &[String]) -> std::result::Result<Vec<Members>, String> {
    keys.iter()
        .map(|k| lookup(data, k).map(|s| s.cloned().unwrap_or_default()))
        .collect()
}

fn union(sets: Vec<Members>) -> Members {
    sets.into_iter().flatten().collect()
}

fn inter(sets: Vec<Members>) -> Members {
    let mut iter = sets.into_iter();
    let mut result = iter.next().unwrap_or_default();
    for other in iter {
        result.retain(|m| other.contains(m));
    }
    result
}

fn diff(sets: Vec<Members>) -> Members {
    let mut iter = sets.into_iter();
    let mut result = iter.next().unwrap_or_default();
    for other in iter {
        result.retain(|m| !other.contains(m));
    }
    result
}

fn array(members: Members) -> Frame {
    Frame::Array(members.into_iter().map(Frame::BulkString).collect())
}

/// Overwrites `destination` with `result`, dropping the key when it is empty.
fn store(data: &mut HashMap<String, Value>, destination: String, result: Members) -> Frame {
    let len = result.len() as i64;
    if result.is_empty() {
        data.remove(&destination);
    } else {
        data.insert(destination, Value::Set(result));
    }
    Frame::Integer(len)
}

fn apply(data: &mut HashMap<String, Value>, command: Command) -> std::result::Result<Frame, String> {
    let frame = match command {
        Command::SAdd { key, members } => {
            lookup(data, &key)?;
            let entry = data.entry(key).or_insert_with(|| Value::Set(HashSet::new()));
            let mut added = 0i64;
            if let Value::Set(set) = entry {
                for member in members {
                    if set.insert(member) {
                        added += 1;
                    }
                }
            }
            Frame::Integer(added)
        }
        Command::SRem { key, members } => {
            let mut removed = 0i64;
            let mut emptied = false;
            if let Some(Value::Set(set)) = data.get_mut(&key) {
                for member in &members {
                    if set.remove(member) {
                        removed += 1;
                    }
                }
                emptied = set.is_empty();
            } else {
                lookup(data, &key)?;
            }
            if emptied {
                data.remove(&key);
            }
            Frame::Integer(removed)
        }
        Command::SIsMember { key, member } => {
            let found = lookup(data, &key)?.is_some_and(|s| s.contains(&member));
            Frame::Integer(found as i64)
        }
        Command::SCard { key } => Frame::Integer(lookup(data, &key)?.map_or(0, |s| s.len()) as i64),
        Command::SMembers { key } => array(lookup(data, &key)?.cloned().unwrap_or_default()),
        Command::SUnion { keys } => array(union(load(data, &keys)?)),
        Command::SInter { keys } => array(inter(load(data, &keys)?)),
        Command::SDiff { keys } => array(diff(load(data, &keys)?)),
        Command::SUnionStore { destination, keys } => {
            let result = union(load(data, &keys)?);
            store(data, destination, result)
        }
        Command::SInterStore { destination, keys } => {
            let result = inter(load(data, &keys)?);
            store(data, destination, result)
        }
        Command::SDiffStore { destination, keys } => {
            let result = diff(load(data, &keys)?);
            store(data, destination, result)
        }
        Command::SRandMember { key } => {
            let picked = lookup(data, &key)?.and_then(|s| s.iter().choose(&mut rand::thread_rng()).cloned());
            picked.map_or(Frame::Null, Frame::BulkString)
        }
        Command::SPop { key } => {
            let picked = lookup(data, &key)?.and_then(|s| s.iter().choose(&mut rand::thread_rng()).cloned());
            match picked {
                Some(member) => {
                    let emptied = match data.get_mut(&key) {
                        Some(Value::Set(set)) => {
                            set.remove(&member);
                            set.is_empty()
                        }
                        _ => false,
                    };
                    if emptied {
                        data.remove(&key);
                    }
                    Frame::BulkString(member)
                }
                None => Frame::Null,
            }
        }
        Command::Del { keys } => {
            let removed = keys.iter().filter(|k| data.remove(k.as_str()).is_some()).count();
            Frame::Integer(removed as i64)
        }
        Command::Type { key } => {
            let kind = match data.get(&key) {
                None => "none",
                Some(Value::Set(_)) => "set",
                Some(Value::String(_)) => "string",
            };
            Frame::SimpleString(kind.as_bytes().to_vec())
        }
        Command::Rename { key, new_key } => {
            let value = data.remove(&key).ok_or_else(|| "ERR no such key".to_string())?;
            data.insert(new_key, value);
            Frame::SimpleString(b"OK".to_vec())
        }
    };
    Ok(frame)
}
