mod export;
mod items;
mod model;
pub mod totals;

pub use export::{pdf_file_name, ExportData, ExportRow, LOGO_PLACEHOLDER};
pub use items::{ItemField, LineItem, LineItems};
pub use model::{
    format_invoice_number, logo_data_uri, parse_invoice_number, Currency, Invoice,
    MIN_NUMBER_WIDTH,
};
pub(crate) use model::image_mime;
pub use totals::{format_money, Totals};
