use tracing::{debug, info, warn};

use crate::error::{InvoiceError, Result};
use crate::invoice::{format_invoice_number, Invoice, MIN_NUMBER_WIDTH};
use crate::store::{CounterStore, InvoiceRepository};

/// Counter value assumed when no counter exists yet; the untouched form
/// already shows number 1.
pub const COUNTER_FALLBACK: u64 = 1;

/// Trim a user supplied archive name; blank means the user cancelled.
pub fn entry_name(raw: &str) -> Option<&str> {
    let name = raw.trim();
    (!name.is_empty()).then_some(name)
}

/// How far a save got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// Stored locally and remotely
    Complete,
    /// Stored locally; no remote store is configured
    LocalOnly,
    /// One of the two stores failed
    Partial,
    /// Neither store accepted the invoice
    Failed,
}

/// Outcome of saving to both stores, each side reported separately
#[derive(Debug)]
pub struct SaveReport {
    pub local: Result<()>,
    /// `None` when no remote store is configured
    pub remote: Option<Result<()>>,
}

impl SaveReport {
    pub fn status(&self) -> SaveStatus {
        match (&self.local, &self.remote) {
            (Ok(()), None) => SaveStatus::LocalOnly,
            (Ok(()), Some(Ok(()))) => SaveStatus::Complete,
            (Err(_), None) | (Err(_), Some(Err(_))) => SaveStatus::Failed,
            _ => SaveStatus::Partial,
        }
    }
}

/// Local archive plus optional remote document store.
///
/// The two sides are written independently: a failed remote write never
/// rolls back the local one, and neither blocks the other.
pub struct Persistence<L, R> {
    local: L,
    remote: Option<R>,
    number_width: usize,
}

impl<L, R> Persistence<L, R>
where
    L: InvoiceRepository + CounterStore,
    R: InvoiceRepository + CounterStore,
{
    pub fn new(local: L, remote: Option<R>) -> Self {
        Self {
            local,
            remote,
            number_width: MIN_NUMBER_WIDTH,
        }
    }

    pub fn with_number_width(mut self, width: usize) -> Self {
        self.number_width = width;
        self
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn save_local(&self, name: &str, invoice: &Invoice) -> Result<()> {
        self.local.save(name, invoice)
    }

    pub fn save_remote(&self, name: &str, invoice: &Invoice) -> Result<()> {
        self.remote_store()?.save(name, invoice)
    }

    /// Save under `name` everywhere. `None` when the name is blank.
    pub fn save(&self, name: &str, invoice: &Invoice) -> Option<SaveReport> {
        let name = entry_name(name)?;

        let local = self.save_local(name, invoice);
        if let Err(e) = &local {
            warn!(name, error = %e, "local save failed");
        }

        let remote = self.remote.as_ref().map(|remote| {
            let result = remote.save(name, invoice);
            if let Err(e) = &result {
                warn!(name, error = %e, "remote save failed");
            }
            result
        });

        let report = SaveReport { local, remote };
        info!(name, status = ?report.status(), "saved invoice");
        Some(report)
    }

    pub fn load_local(&self, name: &str) -> Result<Option<Invoice>> {
        self.local.load(name)
    }

    pub fn load_remote(&self, name: &str) -> Result<Option<Invoice>> {
        self.remote_store()?.load(name)
    }

    /// Take the next invoice number from the shared counter and cache it
    /// locally.
    ///
    /// The number is one past the larger of the counter and the local cache,
    /// so it never goes backwards even if the remote counter was reset. The
    /// counter write is conditional; a concurrent mint surfaces as
    /// `CounterConflict` instead of handing out a duplicate.
    pub fn mint_next_invoice_number(&self) -> Result<String> {
        let cached = self.local.read_counter()?;

        let next = match &self.remote {
            Some(remote) => {
                let seen = remote.read_counter()?;
                let last = seen
                    .last_number
                    .unwrap_or(COUNTER_FALLBACK)
                    .max(cached.last_number.unwrap_or(0));
                let next = last + 1;
                remote.write_counter(next, &seen)?;

                // The remote counter already holds `next`; the cache only mirrors it.
                if let Err(e) = self.local.write_counter(next, &cached) {
                    warn!(next, error = %e, "could not cache invoice number locally");
                }
                next
            }
            None => {
                let next = cached.last_number.unwrap_or(COUNTER_FALLBACK) + 1;
                self.local.write_counter(next, &cached)?;
                next
            }
        };

        let number = format_invoice_number(next, self.number_width);
        info!(number = %number, "minted invoice number");
        Ok(number)
    }

    /// The number a freshly opened form shows: the cached one if any,
    /// otherwise a newly minted one.
    pub fn initial_invoice_number(&self) -> Result<String> {
        match self.local.read_counter()?.last_number {
            Some(cached) => {
                debug!(cached, "using cached invoice number");
                Ok(format_invoice_number(cached, self.number_width))
            }
            None => self.mint_next_invoice_number(),
        }
    }

    fn remote_store(&self) -> Result<&R> {
        self.remote
            .as_ref()
            .ok_or(InvoiceError::RemoteNotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{LineItem, LineItems};
    use crate::store::memory::MemoryStore;
    use crate::store::LocalStore;
    use tempfile::TempDir;

    fn invoice(number: &str) -> Invoice {
        let mut invoice = Invoice::with_number(number);
        invoice.to = "Initech".to_string();
        invoice.items = LineItems::from(vec![LineItem::new("Consulting", "2", "100")]);
        invoice
    }

    fn bridge(remote: Option<MemoryStore>) -> Persistence<MemoryStore, MemoryStore> {
        Persistence::new(MemoryStore::default(), remote)
    }

    #[test]
    fn save_reaches_both_stores() {
        let persistence = bridge(Some(MemoryStore::default()));
        let report = persistence.save("A", &invoice("0001")).unwrap();

        assert_eq!(report.status(), SaveStatus::Complete);
        assert_eq!(persistence.load_local("A").unwrap(), Some(invoice("0001")));
        assert_eq!(persistence.load_remote("A").unwrap(), Some(invoice("0001")));
    }

    #[test]
    fn remote_outage_does_not_block_local_save() {
        let remote = MemoryStore::default();
        remote.go_offline();
        let persistence = bridge(Some(remote));

        let report = persistence.save("A", &invoice("0001")).unwrap();

        assert_eq!(report.status(), SaveStatus::Partial);
        assert!(report.local.is_ok());
        assert!(matches!(report.remote, Some(Err(InvoiceError::Remote { .. }))));
        assert!(persistence.local().contains("A"));
    }

    #[test]
    fn without_remote_save_is_local_only() {
        let persistence = bridge(None);
        let report = persistence.save("A", &invoice("0001")).unwrap();

        assert_eq!(report.status(), SaveStatus::LocalOnly);
        assert!(matches!(
            persistence.load_remote("A"),
            Err(InvoiceError::RemoteNotConfigured)
        ));
    }

    #[test]
    fn blank_name_cancels_without_writing() {
        let persistence = bridge(Some(MemoryStore::default()));
        assert!(persistence.save("   ", &invoice("0001")).is_none());
        assert!(!persistence.local().contains(""));
        assert!(!persistence.local().contains("   "));
    }

    #[test]
    fn remote_not_found_is_distinct_from_found() {
        let persistence = bridge(Some(MemoryStore::default()));
        persistence.save_remote("A", &invoice("0004")).unwrap();

        assert_eq!(persistence.load_remote("missing").unwrap(), None);
        assert_eq!(persistence.load_remote("A").unwrap(), Some(invoice("0004")));
    }

    #[test]
    fn sequential_mints_are_consecutive_and_cached() {
        let persistence = bridge(Some(MemoryStore::with_counter(41)));

        let first = persistence.mint_next_invoice_number().unwrap();
        let second = persistence.mint_next_invoice_number().unwrap();

        assert_eq!(first, "0042");
        assert_eq!(second, "0043");
        assert_eq!(persistence.local().counter(), Some(43));
        assert_eq!(persistence.remote.as_ref().unwrap().counter(), Some(43));
    }

    #[test]
    fn missing_counter_falls_back_to_one() {
        let persistence = bridge(Some(MemoryStore::default()));
        assert_eq!(persistence.mint_next_invoice_number().unwrap(), "0002");
    }

    #[test]
    fn mint_never_goes_below_local_cache() {
        let persistence = Persistence::new(
            MemoryStore::with_counter(90),
            Some(MemoryStore::with_counter(3)),
        );
        assert_eq!(persistence.mint_next_invoice_number().unwrap(), "0091");
    }

    #[test]
    fn concurrent_mint_is_reported_and_cache_untouched() {
        let remote = MemoryStore::with_counter(10);
        remote.race_next_write();
        let persistence = Persistence::new(MemoryStore::with_counter(10), Some(remote));

        assert!(matches!(
            persistence.mint_next_invoice_number(),
            Err(InvoiceError::CounterConflict)
        ));
        assert_eq!(persistence.local().counter(), Some(10));
        assert_eq!(persistence.mint_next_invoice_number().unwrap(), "0012");
    }

    #[test]
    fn offline_remote_fails_mint() {
        let remote = MemoryStore::with_counter(5);
        remote.go_offline();
        let persistence = Persistence::new(MemoryStore::default(), Some(remote));

        assert!(matches!(
            persistence.mint_next_invoice_number(),
            Err(InvoiceError::Remote { .. })
        ));
        assert_eq!(persistence.local().counter(), None);
    }

    #[test]
    fn failed_cache_write_keeps_remotely_claimed_number() {
        let local = MemoryStore::with_counter(3);
        local.make_counter_read_only();
        let persistence = Persistence::new(local, Some(MemoryStore::with_counter(5)));

        assert_eq!(persistence.mint_next_invoice_number().unwrap(), "0006");
        assert_eq!(persistence.remote.as_ref().unwrap().counter(), Some(6));
        assert_eq!(persistence.local().counter(), Some(3));

        // The stale cache never pulls the next number backwards
        assert_eq!(persistence.mint_next_invoice_number().unwrap(), "0007");
    }

    #[test]
    fn failed_cache_write_fails_local_only_mint() {
        let local = MemoryStore::with_counter(3);
        local.make_counter_read_only();
        let persistence: Persistence<MemoryStore, MemoryStore> = Persistence::new(local, None);

        assert!(matches!(
            persistence.mint_next_invoice_number(),
            Err(InvoiceError::Io(_))
        ));
        assert_eq!(persistence.local().counter(), Some(3));
    }

    #[test]
    fn initial_number_prefers_local_cache() {
        let persistence = bridge(Some(MemoryStore::with_counter(50)));
        let local = persistence.local();
        local.write_counter(7, &local.read_counter().unwrap()).unwrap();

        assert_eq!(persistence.initial_invoice_number().unwrap(), "0007");
        assert_eq!(persistence.remote.as_ref().unwrap().counter(), Some(50));
    }

    #[test]
    fn initial_number_mints_when_nothing_cached() {
        let persistence = bridge(Some(MemoryStore::with_counter(50)));
        assert_eq!(persistence.initial_invoice_number().unwrap(), "0051");
    }

    #[test]
    fn local_only_counter_uses_local_store() {
        let temp = TempDir::new().unwrap();
        let persistence: Persistence<LocalStore, MemoryStore> =
            Persistence::new(LocalStore::new(temp.path()).with_number_width(6), None)
                .with_number_width(6);

        assert_eq!(persistence.mint_next_invoice_number().unwrap(), "000002");
        assert_eq!(persistence.mint_next_invoice_number().unwrap(), "000003");
        assert_eq!(
            persistence.local().cached_number().unwrap().as_deref(),
            Some("000003")
        );
    }
}
