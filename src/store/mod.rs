//! Where invoices and the invoice counter live.
//!
//! The local store and the remote document store are independent
//! repositories behind the same two traits; [`Persistence`] drives both.

mod bridge;
mod local;
#[cfg(test)]
pub(crate) mod memory;
mod remote;

pub use bridge::{entry_name, Persistence, SaveReport, SaveStatus, COUNTER_FALLBACK};
pub use local::{LocalState, LocalStore};
pub use remote::RemoteStore;

use crate::error::Result;
use crate::invoice::Invoice;

/// Named invoice snapshots, last write wins per name.
pub trait InvoiceRepository {
    fn save(&self, name: &str, invoice: &Invoice) -> Result<()>;

    /// `Ok(None)` when nothing is stored under `name`.
    fn load(&self, name: &str) -> Result<Option<Invoice>>;
}

/// What a counter read observed; handed back on write so the store can
/// reject the write if someone else got there first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub last_number: Option<u64>,
    pub version: Option<String>,
}

/// The shared source of sequential invoice numbers.
pub trait CounterStore {
    fn read_counter(&self) -> Result<CounterSnapshot>;

    /// Store `next`, failing with `CounterConflict` when the counter moved
    /// since `seen` was read.
    fn write_counter(&self, next: u64, seen: &CounterSnapshot) -> Result<()>;
}
