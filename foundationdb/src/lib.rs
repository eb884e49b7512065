use foundationdb::{FdbBindingError, RetryableTransaction};
use std::future::Future;
use std::result::Result;
use std::sync::Arc;
pub mod setmodel;
pub use setmodel::{SetError, SetModel};

/// High-level prefixes used to partition top-level keys in FoundationDB.
/// Use these values when packing top-level tuple keys to keep prefix constants in one place.
#[repr(u64)]
#[derive(Clone, Copy, Debug)]
pub enum Prefix {
    /// Kind tag of a logical key (`b"set"` for sets).
    Type = 13,
    /// One FoundationDB key per set member.
    Set = 14,
}

impl Prefix {
    pub fn as_u64(self) -> u64 {
        self as u64
    }
}

#[derive(Clone)]
pub struct FoundationDB {
    pub database: Arc<foundationdb::Database>,
}

impl FoundationDB {
    pub fn new(db: Arc<foundationdb::Database>) -> Self {
        Self { database: db }
    }

    /// Run `f` inside a retried transaction. Everything `f` writes commits together.
    pub async fn transact<F, Fut, T>(&self, f: F) -> Result<T, FdbBindingError>
    where
        F: Fn(RetryableTransaction) -> Fut,
        Fut: Future<Output = Result<T, FdbBindingError>>,
    {
        self.database.run(|trx, _maybe_committed| f(trx)).await
    }
}
