use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::error::{InvoiceError, Result};
use crate::invoice::Invoice;
use crate::store::{CounterSnapshot, CounterStore, InvoiceRepository};

/// In-process stand-in for either store
#[derive(Default)]
pub(crate) struct MemoryStore {
    docs: RefCell<HashMap<String, Invoice>>,
    counter: Cell<Option<u64>>,
    version: Cell<u64>,
    offline: Cell<bool>,
    /// Another client bumps the counter between our read and our write
    race_next_write: Cell<bool>,
    read_only_counter: Cell<bool>,
}

impl MemoryStore {
    pub fn with_counter(value: u64) -> Self {
        let store = Self::default();
        store.counter.set(Some(value));
        store
    }

    pub fn go_offline(&self) {
        self.offline.set(true);
    }

    pub fn race_next_write(&self) {
        self.race_next_write.set(true);
    }

    /// Counter reads still work; writes fail like a read-only disk.
    pub fn make_counter_read_only(&self) {
        self.read_only_counter.set(true);
    }

    pub fn counter(&self) -> Option<u64> {
        self.counter.get()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.docs.borrow().contains_key(name)
    }

    fn check_online(&self, operation: &str) -> Result<()> {
        if self.offline.get() {
            return Err(InvoiceError::remote(operation, "connection refused"));
        }
        Ok(())
    }
}

impl InvoiceRepository for MemoryStore {
    fn save(&self, name: &str, invoice: &Invoice) -> Result<()> {
        self.check_online("save")?;
        self.docs
            .borrow_mut()
            .insert(name.to_string(), invoice.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<Invoice>> {
        self.check_online("load")?;
        Ok(self.docs.borrow().get(name).cloned())
    }
}

impl CounterStore for MemoryStore {
    fn read_counter(&self) -> Result<CounterSnapshot> {
        self.check_online("counter read")?;
        Ok(CounterSnapshot {
            last_number: self.counter.get(),
            version: Some(self.version.get().to_string()),
        })
    }

    fn write_counter(&self, next: u64, seen: &CounterSnapshot) -> Result<()> {
        self.check_online("counter write")?;
        if self.read_only_counter.get() {
            return Err(InvoiceError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "counter is read-only",
            )));
        }
        if self.race_next_write.replace(false) {
            self.counter.set(Some(self.counter.get().unwrap_or(0) + 1));
            self.version.set(self.version.get() + 1);
        }
        if seen.version.as_deref() != Some(self.version.get().to_string().as_str()) {
            return Err(InvoiceError::CounterConflict);
        }
        self.counter.set(Some(next));
        self.version.set(self.version.get() + 1);
        Ok(())
    }
}
