use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{InvoiceError, Result};
use crate::invoice::{format_invoice_number, parse_invoice_number, Invoice, MIN_NUMBER_WIDTH};
use crate::store::{CounterSnapshot, CounterStore, InvoiceRepository};

const ARCHIVE_FILE: &str = "archive.json";
const STATE_FILE: &str = "state.toml";
const DRAFT_FILE: &str = "draft.json";

/// Small values kept between runs
#[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct LocalState {
    /// Last minted invoice number, zero-padded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_number: Option<String>,
    /// Last used logo as a data URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// Directory-backed store: the archive, the cached counter, the logo and
/// the draft being edited.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
    number_width: usize,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            number_width: MIN_NUMBER_WIDTH,
        }
    }

    pub fn with_number_width(mut self, width: usize) -> Self {
        self.number_width = width;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The whole name → invoice mapping
    pub fn load_archive(&self) -> Result<BTreeMap<String, Invoice>> {
        let path = self.dir.join(ARCHIVE_FILE);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_archive(&self, archive: &BTreeMap<String, Invoice>) -> Result<()> {
        let content = serde_json::to_string_pretty(archive)?;
        fs::write(self.dir.join(ARCHIVE_FILE), content)?;
        Ok(())
    }

    /// Names of archived invoices, sorted
    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.load_archive()?.into_keys().collect())
    }

    /// Load state.toml (default if missing)
    pub fn load_state(&self) -> Result<LocalState> {
        let path = self.dir.join(STATE_FILE);
        if !path.exists() {
            return Ok(LocalState::default());
        }
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| InvoiceError::StateParse { path, source: e })
    }

    pub fn save_state(&self, state: &LocalState) -> Result<()> {
        let path = self.dir.join(STATE_FILE);
        let content = toml::to_string_pretty(state).map_err(|e| InvoiceError::StateWrite {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(path, content)?;
        Ok(())
    }

    /// The cached invoice number, exactly as stored
    pub fn cached_number(&self) -> Result<Option<String>> {
        Ok(self.load_state()?.last_number)
    }

    pub fn logo(&self) -> Result<Option<String>> {
        Ok(self.load_state()?.logo)
    }

    pub fn set_logo(&self, logo: Option<String>) -> Result<()> {
        let mut state = self.load_state()?;
        state.logo = logo;
        self.save_state(&state)
    }

    pub fn load_draft(&self) -> Result<Option<Invoice>> {
        let path = self.dir.join(DRAFT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save_draft(&self, invoice: &Invoice) -> Result<()> {
        let content = serde_json::to_string_pretty(invoice)?;
        fs::write(self.dir.join(DRAFT_FILE), content)?;
        Ok(())
    }
}

impl InvoiceRepository for LocalStore {
    fn save(&self, name: &str, invoice: &Invoice) -> Result<()> {
        let mut archive = self.load_archive()?;
        archive.insert(name.to_string(), invoice.clone());
        self.save_archive(&archive)?;
        debug!(name, entries = archive.len(), "archived invoice locally");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<Invoice>> {
        Ok(self.load_archive()?.remove(name))
    }
}

/// Without a remote store the cached number is the counter itself.
impl CounterStore for LocalStore {
    fn read_counter(&self) -> Result<CounterSnapshot> {
        let last_number = self
            .cached_number()?
            .as_deref()
            .and_then(parse_invoice_number);
        Ok(CounterSnapshot {
            last_number,
            version: None,
        })
    }

    fn write_counter(&self, next: u64, _seen: &CounterSnapshot) -> Result<()> {
        let mut state = self.load_state()?;
        state.last_number = Some(format_invoice_number(next, self.number_width));
        self.save_state(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{Currency, LineItem, LineItems};
    use tempfile::TempDir;

    fn sample(number: &str) -> Invoice {
        let mut invoice = Invoice::with_number(number);
        invoice.to = "Globex".to_string();
        invoice.currency = Currency::Euro;
        invoice.items = LineItems::from(vec![
            LineItem::new("Audit", "3", "120"),
            LineItem::new("Report", "", ""),
        ]);
        invoice
    }

    #[test]
    fn saved_invoice_loads_back_identical() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path());

        let invoice = sample("0003");
        store.save("A", &invoice).unwrap();

        assert_eq!(store.load("A").unwrap(), Some(invoice));
        assert_eq!(store.load("B").unwrap(), None);
    }

    #[test]
    fn save_is_last_write_wins_per_name() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path());

        store.save("A", &sample("0001")).unwrap();
        store.save("B", &sample("0002")).unwrap();
        store.save("A", &sample("0009")).unwrap();

        assert_eq!(store.names().unwrap(), vec!["A", "B"]);
        assert_eq!(store.load("A").unwrap().unwrap().invoice_number, "0009");
        assert_eq!(store.load("B").unwrap().unwrap().invoice_number, "0002");
    }

    #[test]
    fn counter_is_cached_zero_padded() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path()).with_number_width(6);

        assert_eq!(store.read_counter().unwrap().last_number, None);
        store.write_counter(12, &CounterSnapshot::default()).unwrap();

        assert_eq!(store.cached_number().unwrap().as_deref(), Some("000012"));
        assert_eq!(store.read_counter().unwrap().last_number, Some(12));
    }

    #[test]
    fn logo_and_counter_share_state_file() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path());

        store.write_counter(5, &CounterSnapshot::default()).unwrap();
        store.set_logo(Some("data:image/png;base64,AAAA".to_string())).unwrap();

        let state = store.load_state().unwrap();
        assert_eq!(state.last_number.as_deref(), Some("0005"));
        assert_eq!(state.logo.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn corrupt_state_file_is_reported_as_state() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path());
        fs::write(temp.path().join(STATE_FILE), "last_number = [").unwrap();

        let err = store.read_counter().unwrap_err();
        assert!(matches!(err, InvoiceError::StateParse { .. }));
        assert!(err.to_string().contains("state.toml"));
    }

    #[test]
    fn draft_round_trips() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path());

        assert!(store.load_draft().unwrap().is_none());
        let draft = sample("0004");
        store.save_draft(&draft).unwrap();
        assert_eq!(store.load_draft().unwrap(), Some(draft));
    }
}
