pub mod config;
pub mod error;
pub mod invoice;
pub mod numeric;
pub mod pdf;
pub mod store;

pub use config::{Config, RemoteSettings};
pub use error::{InvoiceError, Result};
pub use invoice::{Currency, Invoice, LineItem, LineItems, Totals};
pub use numeric::{coerce, NumericField};
pub use store::{LocalStore, Persistence, RemoteStore, SaveReport, SaveStatus};
