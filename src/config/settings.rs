use serde::{Deserialize, Serialize};

use crate::invoice::{Currency, MIN_NUMBER_WIDTH};

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub invoice: InvoiceSettings,
    #[serde(default)]
    pub pdf: PdfSettings,
    /// Cloud document store; absent means local-only
    #[serde(default)]
    pub remote: Option<RemoteSettings>,
}

/// Values a brand new draft starts with
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Defaults {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct InvoiceSettings {
    #[serde(default = "default_number_width")]
    pub number_width: usize,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            number_width: default_number_width(),
        }
    }
}

fn default_number_width() -> usize {
    MIN_NUMBER_WIDTH
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PdfSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "output".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemoteSettings {
    /// Base URL of the document store, e.g. `https://docs.example.com/v1`
    pub url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Document path of the shared invoice counter
    #[serde(default = "default_counter")]
    pub counter: String,
    /// Sent as a bearer token when present
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_collection() -> String {
    "invoices".to_string()
}

fn default_counter() -> String {
    "meta/counter".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}
