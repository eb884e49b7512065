pub mod batch;
pub mod command;
pub mod config;
pub mod error;
pub mod set;
pub mod store;

pub use config::{NativesConfig, RespConfig};
pub use error::{ConversionError, Error, Result};
pub use set::{Bincoded, BoundSet, Element, Operand};
pub use store::{MemoryStore, RespStore, SetStore};
#[cfg(feature = "foundationdb")]
pub use store::FdbStore;

#[cfg(test)]
pub(crate) use crate::tests::e2e::util::with_e2e_server;
