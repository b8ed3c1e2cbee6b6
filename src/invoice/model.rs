use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{InvoiceError, Result};
use crate::invoice::items::{LineItem, LineItems};
use crate::numeric::NumericField;

/// Invoice numbers are never shorter than this.
pub const MIN_NUMBER_WIDTH: usize = 4;

/// Supported currencies; stored as their symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Currency {
    #[default]
    #[serde(rename = "₦")]
    Naira,
    #[serde(rename = "$")]
    Dollar,
    #[serde(rename = "€")]
    Euro,
    #[serde(rename = "£")]
    Pound,
    #[serde(rename = "¥")]
    Yen,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Naira,
        Currency::Dollar,
        Currency::Euro,
        Currency::Pound,
        Currency::Yen,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Naira => "₦",
            Currency::Dollar => "$",
            Currency::Euro => "€",
            Currency::Pound => "£",
            Currency::Yen => "¥",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Currency::Naira => "NGN",
            Currency::Dollar => "USD",
            Currency::Euro => "EUR",
            Currency::Pound => "GBP",
            Currency::Yen => "JPY",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Currency::Naira => "Naira",
            Currency::Dollar => "Dollar",
            Currency::Euro => "Euro",
            Currency::Pound => "Pound",
            Currency::Yen => "Yen",
        }
    }
}

impl FromStr for Currency {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Currency::ALL
            .into_iter()
            .find(|c| {
                c.symbol() == needle
                    || c.code().eq_ignore_ascii_case(needle)
                    || c.name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| InvoiceError::InvalidCurrency(s.to_string()))
    }
}

impl TryFrom<String> for Currency {
    type Error = InvoiceError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The invoice being edited, archived or exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_number: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub to_address: String,
    #[serde(default)]
    pub items: LineItems,
    #[serde(default)]
    pub discount: NumericField,
    #[serde(default)]
    pub tax: NumericField,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub currency: Currency,
    /// Data URI, file path or URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl Default for Invoice {
    fn default() -> Self {
        Self {
            invoice_number: format_invoice_number(1, MIN_NUMBER_WIDTH),
            from: String::new(),
            to: String::new(),
            to_address: String::new(),
            items: LineItems::from(vec![LineItem::blank()]),
            discount: NumericField::from("0"),
            tax: NumericField::from("0"),
            notes: String::new(),
            currency: Currency::default(),
            logo: None,
        }
    }
}

impl Invoice {
    pub fn with_number(invoice_number: impl Into<String>) -> Self {
        Self {
            invoice_number: invoice_number.into(),
            ..Self::default()
        }
    }
}

/// Zero-pad an invoice number to at least four digits.
pub fn format_invoice_number(number: u64, width: usize) -> String {
    format!("{:0width$}", number, width = width.max(MIN_NUMBER_WIDTH))
}

/// Read the numeric value of an invoice number such as `"0042"`.
pub fn parse_invoice_number(number: &str) -> Option<u64> {
    number.trim().parse().ok()
}

/// Encode an image file as a `data:` URI
pub fn logo_data_uri(path: &Path) -> Result<String> {
    let mime = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(image_mime)
        .ok_or_else(|| InvoiceError::UnsupportedLogo(path.to_path_buf()))?;

    let bytes = std::fs::read(path)?;
    let encoded = general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

pub(crate) fn image_mime(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
