//! Set algebra over a bound set and a mix of remote and local operands.
//!
//! Remote operands are merged by the store in one command or one batch;
//! local operands are folded into the fetched result in memory. The
//! `*_update` forms write the result back to the bound key in one batch.

use crate::command::Command;
use crate::error::{Error, Result};
use crate::set::bound::BoundSet;
use crate::set::element::{Element, convert_all, prepare_all};
use crate::set::operand::{Operand, classify};
use crate::store::{SetStore, reply};
use redis_protocol::resp2::types::OwnedFrame as Frame;
use std::collections::HashSet;

fn take(replies: Vec<Frame>, index: usize) -> Result<Frame> {
    replies
        .into_iter()
        .nth(index)
        .ok_or_else(|| Error::Protocol(format!("missing reply {}", index)))
}

impl<T: Element, S: SetStore> BoundSet<T, S> {
    /// This set's key followed by `others`.
    fn keys_with(&self, others: &[&str]) -> Vec<String> {
        std::iter::once(self.key())
            .chain(others.iter().copied())
            .map(str::to_string)
            .collect()
    }

    async fn fetch(&self, command: Command) -> Result<HashSet<T>> {
        let frame = self.store().execute(command).await?;
        let raw = reply::members(frame, self.key())?;
        Ok(convert_all(raw)?)
    }

    /// Elements of this set found in none of the operands.
    pub async fn difference(&self, operands: &[Operand<'_, T, S>]) -> Result<HashSet<T>> {
        let classified = classify(operands);
        let mut result = if classified.has_remotes() {
            self.fetch(Command::SDiff { keys: self.keys_with(&classified.remote_keys) }).await?
        } else {
            self.members().await?
        };
        for local in &classified.locals {
            result.retain(|e| !local.contains(e));
        }
        Ok(result)
    }

    /// Elements of this set found in every operand.
    pub async fn intersection(&self, operands: &[Operand<'_, T, S>]) -> Result<HashSet<T>> {
        let classified = classify(operands);
        let mut result = if classified.has_remotes() {
            self.fetch(Command::SInter { keys: self.keys_with(&classified.remote_keys) }).await?
        } else {
            self.members().await?
        };
        for local in &classified.locals {
            result.retain(|e| local.contains(e));
        }
        Ok(result)
    }

    pub async fn union(&self, operands: &[Operand<'_, T, S>]) -> Result<HashSet<T>> {
        let classified = classify(operands);
        let mut result = if classified.has_remotes() {
            self.fetch(Command::SUnion { keys: self.keys_with(&classified.remote_keys) }).await?
        } else {
            self.members().await?
        };
        for local in &classified.locals {
            result.extend(local.iter().cloned());
        }
        Ok(result)
    }

    /// Elements found in an odd number of this set and the operands.
    ///
    /// Remote operands are folded pairwise on the store through temporary
    /// keys, in a single batch that also deletes them.
    pub async fn symmetric_difference(&self, operands: &[Operand<'_, T, S>]) -> Result<HashSet<T>> {
        let classified = classify(operands);
        let mut result = if classified.has_remotes() {
            let mut batch = self.batch();
            let mut acc = self.key().to_string();
            for remote in &classified.remote_keys {
                let inter = batch.temp_key();
                let union = batch.temp_key();
                let diff = batch.temp_key();
                let pair = vec![acc, remote.to_string()];
                batch.enqueue(Command::SInterStore { destination: inter.clone(), keys: pair.clone() });
                batch.enqueue(Command::SUnionStore { destination: union.clone(), keys: pair });
                batch.enqueue(Command::SDiffStore { destination: diff.clone(), keys: vec![union, inter] });
                acc = diff;
            }
            let read = batch.enqueue(Command::SMembers { key: acc });
            log::debug!(
                "symmetric difference of '{}' with {} remote sets in {} commands",
                self.key(),
                classified.remote_keys.len(),
                batch.len()
            );
            let replies = batch.submit(self.store()).await?;
            let raw = reply::members(take(replies, read)?, self.key())?;
            convert_all(raw)?
        } else {
            self.members().await?
        };
        for local in &classified.locals {
            result = result.symmetric_difference(local).cloned().collect();
        }
        Ok(result)
    }

    /// True if this set shares no element with any operand.
    pub async fn isdisjoint(&self, operands: &[Operand<'_, T, S>]) -> Result<bool> {
        let classified = classify(operands);
        let mut batch = self.batch();
        for remote in &classified.remote_keys {
            batch.enqueue(Command::SInter { keys: self.keys_with(&[*remote]) });
        }
        let remotes = batch.len();
        for local in &classified.locals {
            for member in prepare_all(local.iter())? {
                batch.enqueue(Command::SIsMember { key: self.key().to_string(), member });
            }
        }

        if batch.is_empty() {
            self.ensure_set().await?;
            return Ok(true);
        }
        let replies = batch.submit(self.store()).await?;
        for (i, frame) in replies.into_iter().enumerate() {
            let shared = if i < remotes {
                !reply::members(frame, self.key())?.is_empty()
            } else {
                reply::boolean(frame, self.key())?
            };
            if shared {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True if every element of this set is in `other`.
    pub async fn issubset(&self, other: &Operand<'_, T, S>) -> Result<bool> {
        match other {
            Operand::Remote(set) => {
                let frame = self
                    .store()
                    .execute(Command::SDiff { keys: self.keys_with(&[set.key()]) })
                    .await?;
                Ok(reply::members(frame, self.key())?.is_empty())
            }
            Operand::Local(local) => Ok(self.members().await?.is_subset(local)),
        }
    }

    pub async fn issuperset(&self, _other: &Operand<'_, T, S>) -> Result<bool> {
        Err(Error::Unsupported("issuperset"))
    }

    /// Adds every element of every operand to this set.
    pub async fn update(&self, operands: &[Operand<'_, T, S>]) -> Result<()> {
        let classified = classify(operands);
        let raw = prepare_all(classified.locals.iter().flat_map(|local| local.iter()))?;
        let mut batch = self.batch();
        if classified.has_remotes() {
            batch.enqueue(Command::SUnionStore {
                destination: self.key().to_string(),
                keys: self.keys_with(&classified.remote_keys),
            });
        }
        batch.enqueue_members(raw, |chunk| Command::SAdd { key: self.key().to_string(), members: chunk });
        if batch.is_empty() {
            self.ensure_set().await?;
            return Ok(());
        }
        batch.submit(self.store()).await?;
        Ok(())
    }

    /// Removes every element found in any operand.
    pub async fn difference_update(&self, operands: &[Operand<'_, T, S>]) -> Result<()> {
        let classified = classify(operands);
        let raw = prepare_all(classified.locals.iter().flat_map(|local| local.iter()))?;
        let mut batch = self.batch();
        if classified.has_remotes() {
            batch.enqueue(Command::SDiffStore {
                destination: self.key().to_string(),
                keys: self.keys_with(&classified.remote_keys),
            });
        }
        batch.enqueue_members(raw, |chunk| Command::SRem { key: self.key().to_string(), members: chunk });
        if batch.is_empty() {
            self.ensure_set().await?;
            return Ok(());
        }
        batch.submit(self.store()).await?;
        Ok(())
    }

    /// Keeps only elements found in every operand.
    ///
    /// Local operands are staged into temporary keys so the store can
    /// intersect everything in one command.
    pub async fn intersection_update(&self, operands: &[Operand<'_, T, S>]) -> Result<()> {
        if operands.is_empty() {
            self.ensure_set().await?;
            return Ok(());
        }
        let classified = classify(operands);
        let staged = classified
            .locals
            .iter()
            .map(|local| prepare_all(local.iter()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut batch = self.batch();
        let mut keys = self.keys_with(&classified.remote_keys);
        for raw in staged {
            // an empty local stays unwritten and reads as the empty set
            let staging = batch.temp_key();
            batch.enqueue_members(raw, |chunk| Command::SAdd { key: staging.clone(), members: chunk });
            keys.push(staging);
        }
        batch.enqueue(Command::SInterStore { destination: self.key().to_string(), keys });
        batch.submit(self.store()).await?;
        Ok(())
    }

    /// Replaces this set with its symmetric difference with the operands.
    pub async fn symmetric_difference_update(&self, operands: &[Operand<'_, T, S>]) -> Result<()> {
        let result = self.symmetric_difference(operands).await?;
        self.replace(&result).await
    }

    /// Writes `members` to a staging key and renames it over this set, so
    /// readers never observe a half-written set.
    async fn replace(&self, members: &HashSet<T>) -> Result<()> {
        let raw = prepare_all(members)?;
        let mut batch = self.batch();
        if raw.is_empty() {
            batch.enqueue(Command::Del { keys: vec![self.key().to_string()] });
        } else {
            let staging = batch.temp_key();
            batch.enqueue_members(raw, |chunk| Command::SAdd { key: staging.clone(), members: chunk });
            batch.enqueue(Command::Rename { key: staging, new_key: self.key().to_string() });
        }
        batch.submit(self.store()).await?;
        log::debug!("replaced '{}' with {} members", self.key(), members.len());
        Ok(())
    }
}
