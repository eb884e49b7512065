use crate::batch::Batch;
use crate::command::Command;
use crate::config::{NativesConfig, SharedConfig};
use crate::error::{Error, Result};
use crate::set::element::{Element, convert_all, prepare_all};
use crate::store::{SetStore, reply};
use async_stream::try_stream;
use futures::Stream;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A set living under one key of a remote store.
///
/// Holds no elements locally: every call goes to the store, and two bound
/// sets on the same key are interchangeable.
pub struct BoundSet<T: Element, S: SetStore> {
    store: S,
    key: String,
    config: SharedConfig,
    _element: PhantomData<fn() -> T>,
}

impl<T: Element, S: SetStore> Clone for BoundSet<T, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key.clone(),
            config: self.config.clone(),
            _element: PhantomData,
        }
    }
}

impl<T: Element, S: SetStore> fmt::Debug for BoundSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundSet").field("key", &self.key).finish()
    }
}

impl<T: Element, S: SetStore> BoundSet<T, S> {
    /// Binds to `key` without touching the store.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self::with_config(store, key, Arc::new(NativesConfig::default()))
    }

    pub fn with_config(store: S, key: impl Into<String>, config: SharedConfig) -> Self {
        Self {
            store,
            key: key.into(),
            config,
            _element: PhantomData,
        }
    }

    /// Binds to `key` and adds `members` to whatever the key already holds.
    pub async fn with_members<I>(store: S, key: impl Into<String>, members: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        Self::with_members_config(store, key, Arc::new(NativesConfig::default()), members).await
    }

    /// Like `with_members`, seeding under `config`'s chunking limits.
    pub async fn with_members_config<I>(
        store: S,
        key: impl Into<String>,
        config: SharedConfig,
        members: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let set = Self::with_config(store, key, config);
        let members: Vec<T> = members.into_iter().collect();
        let raw = prepare_all(&members)?;
        let mut batch = set.batch();
        batch.enqueue_members(raw, |chunk| Command::SAdd { key: set.key.clone(), members: chunk });
        batch.submit(&set.store).await?;
        Ok(set)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn batch(&self) -> Batch {
        Batch::new(self.config.clone())
    }

    /// Adds `element`; returns `false` if it was already a member.
    pub async fn add(&self, element: &T) -> Result<bool> {
        let member = element.prepare()?;
        let frame = self
            .store
            .execute(Command::SAdd { key: self.key.clone(), members: vec![member] })
            .await?;
        reply::boolean(frame, &self.key)
    }

    /// Removes `element`, failing with `ElementNotFound` if it is absent.
    pub async fn remove(&self, element: &T) -> Result<()> {
        if self.discard(element).await? {
            Ok(())
        } else {
            Err(Error::ElementNotFound {
                key: self.key.clone(),
                element: format!("{:?}", element),
            })
        }
    }

    /// Removes `element` if present; returns whether it was.
    pub async fn discard(&self, element: &T) -> Result<bool> {
        let member = element.prepare()?;
        let frame = self
            .store
            .execute(Command::SRem { key: self.key.clone(), members: vec![member] })
            .await?;
        reply::boolean(frame, &self.key)
    }

    /// Returns a random member, removing it unless `peek_only` is set.
    pub async fn pop(&self, peek_only: bool) -> Result<T> {
        match self.random(peek_only).await? {
            Some(element) => Ok(element),
            None => Err(Error::ElementNotFound {
                key: self.key.clone(),
                element: "<any>".to_string(),
            }),
        }
    }

    /// A random member without removing it, or `None` for an empty set.
    pub async fn grab(&self) -> Result<Option<T>> {
        self.random(true).await
    }

    async fn random(&self, peek_only: bool) -> Result<Option<T>> {
        let key = self.key.clone();
        let command = if peek_only { Command::SRandMember { key } } else { Command::SPop { key } };
        let frame = self.store.execute(command).await?;
        match reply::optional_bulk(frame, &self.key)? {
            Some(raw) => Ok(Some(T::convert(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn len(&self) -> Result<usize> {
        let frame = self.store.execute(Command::SCard { key: self.key.clone() }).await?;
        Ok(reply::integer(frame, &self.key)?.max(0) as usize)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    pub async fn contains(&self, element: &T) -> Result<bool> {
        let member = element.prepare()?;
        let frame = self
            .store
            .execute(Command::SIsMember { key: self.key.clone(), member })
            .await?;
        reply::boolean(frame, &self.key)
    }

    /// Deletes the remote set. A key holding another type is left alone.
    pub async fn clear(&self) -> Result<()> {
        if !self.ensure_set().await? {
            return Ok(());
        }
        self.store.execute(Command::Del { keys: vec![self.key.clone()] }).await?;
        log::debug!("cleared set '{}'", self.key);
        Ok(())
    }

    /// Fails with `TypeMismatch` unless the key is a set or absent. Returns
    /// whether the key exists.
    pub(crate) async fn ensure_set(&self) -> Result<bool> {
        let frame = self.store.execute(Command::Type { key: self.key.clone() }).await?;
        match reply::status(frame, &self.key)?.as_str() {
            "none" => Ok(false),
            "set" => Ok(true),
            _ => Err(Error::TypeMismatch { key: self.key.clone() }),
        }
    }

    /// Copies the members into `new_key`, replacing its content, and binds to it.
    pub async fn copy_to(&self, new_key: impl Into<String>) -> Result<BoundSet<T, S>> {
        let destination = new_key.into();
        self.store
            .execute(Command::SUnionStore {
                destination: destination.clone(),
                keys: vec![self.key.clone()],
            })
            .await?;
        Ok(BoundSet::with_config(self.store.clone(), destination, self.config.clone()))
    }

    /// All members, decoded.
    pub async fn members(&self) -> Result<HashSet<T>> {
        let raw = self.raw_members().await?;
        Ok(convert_all(raw)?)
    }

    pub(crate) async fn raw_members(&self) -> Result<Vec<Vec<u8>>> {
        let frame = self.store.execute(Command::SMembers { key: self.key.clone() }).await?;
        reply::members(frame, &self.key)
    }

    /// Streams the members. Nothing is fetched until the stream is first
    /// polled; each call fetches the full membership afresh.
    pub fn iter(&self) -> impl Stream<Item = Result<T>> + Send + 'static {
        let set = self.clone();
        try_stream! {
            let raw = set.raw_members().await?;
            for member in raw {
                yield T::convert(&member).map_err(Error::from)?;
            }
        }
    }

    /// True if the remote set holds exactly `other`.
    pub async fn equals(&self, other: &HashSet<T>) -> Result<bool> {
        Ok(&self.members().await? == other)
    }

    pub async fn same_members(&self, other: &BoundSet<T, S>) -> Result<bool> {
        Ok(self.members().await? == other.members().await?)
    }

    /// Renders the members as `{a, b}`, sorted by their debug form.
    pub async fn repr(&self) -> Result<String> {
        let mut rendered: Vec<String> = self.members().await?.iter().map(|e| format!("{:?}", e)).collect();
        rendered.sort();
        Ok(format!("{{{}}}", rendered.join(", ")))
    }
}
