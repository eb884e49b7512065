use crate::command::Command;
use crate::config::NativesConfig;
use crate::error::Result;
use crate::set::BoundSet;
use crate::set::element::Element;
use crate::store::{MemoryStore, SetStore};
use redis_protocol::resp2::types::OwnedFrame as Frame;
use std::sync::{Arc, Mutex};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A bound set over a fresh in-memory store, seeded with `members`.
pub async fn seeded<T: Element>(key: &str, members: Vec<T>) -> BoundSet<T, MemoryStore> {
    init_logger();
    BoundSet::with_members(MemoryStore::new(), key, members)
        .await
        .expect("seed set")
}

/// Another bound set sharing `on`'s store.
pub async fn sibling<T: Element>(on: &BoundSet<T, MemoryStore>, key: &str, members: Vec<T>) -> BoundSet<T, MemoryStore> {
    BoundSet::with_members(on.store().clone(), key, members)
        .await
        .expect("seed sibling")
}

/// Config whose batches split member lists into chunks of `max`.
pub fn chunking(max: usize) -> Arc<NativesConfig> {
    Arc::new(NativesConfig {
        max_members_per_command: max,
        ..NativesConfig::default()
    })
}

/// Bound set whose batches split member lists into chunks of `max`.
pub fn chunked<T: Element>(store: &MemoryStore, key: &str, max: usize) -> BoundSet<T, MemoryStore> {
    BoundSet::with_config(store.clone(), key, chunking(max))
}

/// Memory store that keeps a log of every command it runs.
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    log: Arc<Mutex<Vec<Command>>>,
}

impl RecordingStore {
    pub fn commands(&self) -> Vec<Command> {
        self.log.lock().expect("log lock").clone()
    }
}

impl SetStore for RecordingStore {
    async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<Frame>> {
        self.log.lock().expect("log lock").extend(commands.iter().cloned());
        self.inner.pipeline(commands).await
    }
}

/// Keys left in the store other than the ones named.
pub fn leftovers(store: &MemoryStore, expected: &[&str]) -> Vec<String> {
    store
        .keys()
        .into_iter()
        .filter(|k| !expected.contains(&k.as_str()))
        .collect()
}
