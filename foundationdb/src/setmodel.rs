use crate::Prefix;
use foundationdb::{FdbError, RangeOption, Transaction};
use foundationdb_tuple::{PackError, Subspace, pack};
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;

pub const MAX_MEMBER_SIZE: usize = 10 * 1000; // 10KB, FoundationDB key size limit minus headroom
pub const SET_KIND: &[u8] = b"set";

#[derive(Debug, thiserror::Error)]
pub enum SetError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("ERR no such key")]
    NoSuchKey,
    #[error("ERR set member of {0} bytes exceeds the member size limit")]
    MemberTooLarge(usize),
    #[error("ERR corrupt member key: {0:?}")]
    Corrupt(PackError),
    #[error(transparent)]
    Fdb(#[from] FdbError),
}

/// Set layout: `(Type, key) -> b"set"` tags the logical key, and every member
/// lives under its own `(Set, key, member) -> b""` entry.
/// All functions run inside the caller's transaction and see its own writes.
pub struct SetModel {}

impl SetModel {
    fn type_key(key: &[u8]) -> Vec<u8> {
        pack(&(Prefix::Type.as_u64(), key))
    }

    fn members_subspace(key: &[u8]) -> Subspace {
        Subspace::from_bytes(pack(&(Prefix::Set.as_u64(), key)))
    }

    /// Raw kind tag of `key`, `None` when the key does not exist.
    pub async fn kind(trx: &Transaction, key: &[u8]) -> Result<Option<Vec<u8>>, FdbError> {
        Ok(trx.get(&Self::type_key(key), false).await?.map(|v| v.to_vec()))
    }

    /// Returns whether a set exists at `key`; fails if the key holds something else.
    async fn check(trx: &Transaction, key: &[u8]) -> Result<bool, SetError> {
        match Self::kind(trx, key).await? {
            None => Ok(false),
            Some(kind) if kind == SET_KIND => Ok(true),
            Some(_) => Err(SetError::WrongType),
        }
    }

    async fn read_members(trx: &Transaction, key: &[u8]) -> Result<BTreeSet<Vec<u8>>, SetError> {
        let subspace = Self::members_subspace(key);
        let range = RangeOption::from(subspace.range());
        let keys = trx
            .get_ranges_keyvalues(range, false)
            .map(|r| match r {
                Ok(v) => Ok(v.key().to_vec()),
                Err(e) => Err(e),
            })
            .try_collect::<Vec<Vec<u8>>>()
            .await?;

        keys.iter()
            .map(|k| subspace.unpack::<Vec<u8>>(k).map_err(SetError::Corrupt))
            .collect()
    }

    pub async fn members(trx: &Transaction, key: &[u8]) -> Result<BTreeSet<Vec<u8>>, SetError> {
        if !Self::check(trx, key).await? {
            return Ok(BTreeSet::new());
        }
        Self::read_members(trx, key).await
    }

    pub async fn contains(trx: &Transaction, key: &[u8], member: &[u8]) -> Result<bool, SetError> {
        if !Self::check(trx, key).await? {
            return Ok(false);
        }
        let member_key = Self::members_subspace(key).pack(&member);
        Ok(trx.get(&member_key, false).await?.is_some())
    }

    pub async fn card(trx: &Transaction, key: &[u8]) -> Result<i64, SetError> {
        Ok(Self::members(trx, key).await?.len() as i64)
    }

    /// Adds members, returning how many were not already present.
    pub async fn add(trx: &Transaction, key: &[u8], members: &[Vec<u8>]) -> Result<i64, SetError> {
        if let Some(m) = members.iter().find(|m| m.len() > MAX_MEMBER_SIZE) {
            return Err(SetError::MemberTooLarge(m.len()));
        }
        let exists = Self::check(trx, key).await?;
        let subspace = Self::members_subspace(key);
        let unique: BTreeSet<&[u8]> = members.iter().map(|m| m.as_slice()).collect();

        let mut added = 0i64;
        for member in unique {
            let member_key = subspace.pack(&member);
            if trx.get(&member_key, false).await?.is_none() {
                trx.set(&member_key, b"");
                added += 1;
            }
        }
        if !exists && added > 0 {
            trx.set(&Self::type_key(key), SET_KIND);
        }
        Ok(added)
    }

    /// Removes members, dropping the key once the set is empty.
    pub async fn remove(trx: &Transaction, key: &[u8], members: &[Vec<u8>]) -> Result<i64, SetError> {
        if !Self::check(trx, key).await? {
            return Ok(0);
        }
        let subspace = Self::members_subspace(key);
        let unique: BTreeSet<&[u8]> = members.iter().map(|m| m.as_slice()).collect();

        let mut removed = 0i64;
        for member in unique {
            let member_key = subspace.pack(&member);
            if trx.get(&member_key, false).await?.is_some() {
                trx.clear(&member_key);
                removed += 1;
            }
        }
        if removed > 0 && Self::read_members(trx, key).await?.is_empty() {
            trx.clear(&Self::type_key(key));
        }
        Ok(removed)
    }

    /// Deletes whatever is stored at `key`. Returns whether it existed.
    pub async fn erase(trx: &Transaction, key: &[u8]) -> Result<bool, FdbError> {
        let existed = Self::kind(trx, key).await?.is_some();
        let (begin, end) = Self::members_subspace(key).range();
        trx.clear(&Self::type_key(key));
        trx.clear_range(&begin, &end);
        Ok(existed)
    }

    /// Overwrites `key` with exactly `members`; an empty result deletes the key.
    pub async fn replace(
        trx: &Transaction,
        key: &[u8],
        members: &BTreeSet<Vec<u8>>,
    ) -> Result<i64, SetError> {
        Self::erase(trx, key).await?;
        if members.is_empty() {
            return Ok(0);
        }
        let subspace = Self::members_subspace(key);
        for member in members {
            trx.set(&subspace.pack(&member.as_slice()), b"");
        }
        trx.set(&Self::type_key(key), SET_KIND);
        Ok(members.len() as i64)
    }

    pub async fn rename(trx: &Transaction, from: &[u8], to: &[u8]) -> Result<(), SetError> {
        if !Self::check(trx, from).await? {
            return Err(SetError::NoSuchKey);
        }
        if from == to {
            return Ok(());
        }
        let members = Self::read_members(trx, from).await?;
        Self::erase(trx, from).await?;
        Self::replace(trx, to, &members).await?;
        Ok(())
    }

    pub async fn union(trx: &Transaction, keys: &[Vec<u8>]) -> Result<BTreeSet<Vec<u8>>, SetError> {
        let mut result = BTreeSet::new();
        for key in keys {
            result.extend(Self::members(trx, key).await?);
        }
        Ok(result)
    }

    pub async fn inter(trx: &Transaction, keys: &[Vec<u8>]) -> Result<BTreeSet<Vec<u8>>, SetError> {
        let mut sets = Vec::with_capacity(keys.len());
        for key in keys {
            sets.push(Self::members(trx, key).await?);
        }
        let mut iter = sets.into_iter();
        let mut result = iter.next().unwrap_or_default();
        for other in iter {
            result.retain(|m| other.contains(m));
        }
        Ok(result)
    }

    pub async fn diff(trx: &Transaction, keys: &[Vec<u8>]) -> Result<BTreeSet<Vec<u8>>, SetError> {
        let mut sets = Vec::with_capacity(keys.len());
        for key in keys {
            sets.push(Self::members(trx, key).await?);
        }
        let mut iter = sets.into_iter();
        let mut result = iter.next().unwrap_or_default();
        for other in iter {
            result.retain(|m| !other.contains(m));
        }
        Ok(result)
    }

    pub async fn random_member(trx: &Transaction, key: &[u8]) -> Result<Option<Vec<u8>>, SetError> {
        let members: Vec<Vec<u8>> = Self::members(trx, key).await?.into_iter().collect();
        Ok(members.choose(&mut rand::thread_rng()).cloned())
    }

    pub async fn pop(trx: &Transaction, key: &[u8]) -> Result<Option<Vec<u8>>, SetError> {
        let member = Self::random_member(trx, key).await?;
        if let Some(m) = &member {
            Self::remove(trx, key, std::slice::from_ref(m)).await?;
        }
        Ok(member)
    }
}
