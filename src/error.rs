use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InvoiceError {
    #[error("Config directory not found at {0}. Run 'invoice-builder init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to parse state file {path}: {source}")]
    StateParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write {path}: {message}")]
    StateWrite { path: PathBuf, message: String },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Unknown currency '{0}'. Use one of: ₦ (NGN), $ (USD), € (EUR), £ (GBP), ¥ (JPY)")]
    InvalidCurrency(String),

    #[error("Unknown item field '{0}'. Use 'description', 'quantity' or 'price'.")]
    InvalidItemField(String),

    #[error("Item {index} does not exist (invoice has {count} item(s))")]
    ItemIndexOutOfRange { index: usize, count: usize },

    #[error("Invoice '{0}' not found in the local archive")]
    InvoiceNotFound(String),

    #[error("Remote store is not configured. Add a [remote] section to config.toml.")]
    RemoteNotConfigured,

    #[error("Remote {operation} failed: {message}")]
    Remote { operation: String, message: String },

    #[error("Invoice counter was changed by another client; run the command again")]
    CounterConflict,

    #[error("Unsupported logo file '{0}'. Use a png, jpg, gif, svg or webp image.")]
    UnsupportedLogo(PathBuf),

    #[error("Typst not found. Install it from https://typst.app/ or run: cargo install typst-cli")]
    TypstNotFound,

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("Invalid JSON data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InvoiceError {
    pub(crate) fn remote(operation: &str, message: impl ToString) -> Self {
        InvoiceError::Remote {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InvoiceError>;
