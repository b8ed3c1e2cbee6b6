mod typst;

pub use typst::generate_pdf;

use std::path::Path;

use crate::error::Result;
use crate::invoice::{ExportData, Invoice};

/// Render `invoice` dated today to a PDF at `output_path`
pub fn export_pdf(invoice: &Invoice, output_path: &Path) -> Result<()> {
    let data = ExportData::new(invoice, chrono::Local::now().date_naive());
    generate_pdf(data, invoice.logo.as_deref(), output_path)
}
