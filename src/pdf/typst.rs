use base64::{engine::general_purpose, Engine as _};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, warn};
use ureq::Agent;

use crate::error::{InvoiceError, Result};
use crate::invoice::{image_mime, ExportData};

/// Embedded Typst template for invoice export
/// Uses a placeholder that gets replaced with the actual JSON file path
const INVOICE_TEMPLATE: &str = r##"// Invoice Template
// Data is loaded from JSON file

#let data = json("DATA_JSON_PATH")

#set page(
  paper: "us-letter",
  margin: (top: 0.8in, bottom: 0.8in, left: 0.8in, right: 0.8in),
)

#set text(font: "Helvetica", size: 10pt)

// Header: logo or placeholder, title, number and date
#grid(
  columns: (1fr, 1fr),
  align: (left + horizon, right),
  [
    #if data.logo != none [
      #image(data.logo, height: 0.9in)
    ] else [
      #box(stroke: 0.5pt + gray, inset: 12pt)[
        #text(fill: gray, weight: "bold")[#data.logo_placeholder]
      ]
    ]
  ],
  [
    #text(size: 24pt, weight: "bold")[#data.title]
    #v(0.5em)
    #table(
      columns: (auto, auto),
      stroke: none,
      align: (right, left),
      inset: 2pt,
      [*Invoice \#:*], [#data.number],
      [*Date:*], [#data.date],
    )
  ]
)

#v(1em)
#line(length: 100%, stroke: 0.5pt + gray)
#v(1em)

// From / Bill To blocks
#grid(
  columns: (1fr, 1fr),
  [
    #text(weight: "bold", size: 11pt)[From:]
    #v(0.3em)
    #data.from
  ],
  [
    #text(weight: "bold", size: 11pt)[Bill To:]
    #v(0.3em)
    #text(weight: "bold")[#data.to]
    #if data.to_address != "" [
      \ #data.to_address
    ]
  ]
)

#v(1.5em)

// Line items table
#table(
  columns: (auto, 1fr, auto, auto, auto),
  align: (center, left, right, right, right),
  stroke: (x, y) => if y == 0 { (bottom: 1pt + black) } else if y > 0 { (bottom: 0.5pt + gray) },
  inset: 8pt,
  fill: (x, y) => if y == 0 { luma(240) } else { none },

  // Header
  [*\#*], [*Description*], [*Unit Price*], [*Qty*], [*Amount*],

  // Items
  ..data.items.enumerate().map(((i, item)) => (
    str(i + 1),
    item.description,
    item.price,
    item.quantity,
    item.amount,
  )).flatten()
)

#v(1em)

// Totals
#align(right)[
  #table(
    columns: (auto, auto),
    stroke: none,
    align: (right, right),
    inset: 6pt,

    [Subtotal:], [#data.subtotal],
    [Discount (#data.discount_pct):], [#data.discount],
    [Tax (#data.tax_pct):], [#data.tax],

    table.hline(stroke: 1pt),
    [*Total:*], [*#data.total*],
  )
]

#if data.notes != "" [
  #v(2em)
  #text(weight: "bold")[Notes:] #data.notes
]
"##;

/// Generate the invoice PDF using Typst CLI
///
/// `logo` is the invoice's logo reference (data URI, file path or URL). A
/// logo that cannot be prepared is replaced by the placeholder text.
pub fn generate_pdf(data: ExportData, logo: Option<&str>, output_path: &Path) -> Result<()> {
    // Check if typst is available
    let typst_check = Command::new("typst").arg("--version").output();

    if typst_check.is_err() {
        return Err(InvoiceError::TypstNotFound);
    }

    // Removed when dropped, after typst is done with it
    let staged = stage(data, logo)?;

    debug!(output = %output_path.display(), "running typst compile");
    let output = Command::new("typst")
        .arg("compile")
        .arg("--root")
        .arg(staged.dir.path())
        .arg(&staged.template)
        .arg(output_path)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(InvoiceError::PdfGeneration(stderr.to_string()));
    }

    Ok(())
}

/// Template, data and logo written into a private directory per export
struct Staged {
    dir: TempDir,
    template: PathBuf,
}

fn stage(mut data: ExportData, logo: Option<&str>) -> Result<Staged> {
    let dir = tempfile::Builder::new()
        .prefix("invoice-builder-")
        .tempdir()?;

    let logo_file = logo.and_then(|logo| match prepare_logo(logo, dir.path()) {
        Ok(file) => Some(file),
        Err(e) => {
            warn!(error = %e, "logo unavailable, using placeholder");
            None
        }
    });
    data.logo = logo_file.as_deref().map(file_name);

    let json_data = serde_json::to_string(&data)
        .map_err(|e| InvoiceError::PdfGeneration(e.to_string()))?;
    std::fs::write(dir.path().join("data.json"), &json_data)?;

    // data.json sits next to the template
    let template_content = INVOICE_TEMPLATE.replace("DATA_JSON_PATH", "data.json");
    let template = dir.path().join("invoice.typ");
    std::fs::write(&template, &template_content)?;

    Ok(Staged { dir, template })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Write the logo next to the template and return its path
fn prepare_logo(logo: &str, dir: &Path) -> Result<PathBuf> {
    if let Some(rest) = logo.strip_prefix("data:") {
        let (mime, bytes) = decode_data_uri(rest)?;
        let path = dir.join(format!("logo.{}", extension_for(&mime)));
        std::fs::write(&path, bytes)?;
        return Ok(path);
    }

    if logo.starts_with("http://") || logo.starts_with("https://") {
        let bytes = download(logo)?;
        let extension = logo
            .rsplit('.')
            .next()
            .filter(|ext| image_mime(ext).is_some())
            .unwrap_or("png");
        let path = dir.join(format!("logo.{extension}"));
        std::fs::write(&path, bytes)?;
        return Ok(path);
    }

    let source = PathBuf::from(logo);
    let extension = source
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| image_mime(ext).is_some())
        .ok_or_else(|| InvoiceError::UnsupportedLogo(source.clone()))?
        .to_ascii_lowercase();
    let path = dir.join(format!("logo.{extension}"));
    std::fs::copy(&source, &path)?;
    Ok(path)
}

/// Split `<mime>;base64,<payload>` and decode the payload
fn decode_data_uri(rest: &str) -> Result<(String, Vec<u8>)> {
    let invalid = || InvoiceError::PdfGeneration("logo is not a base64 data URI".to_string());

    let (meta, payload) = rest.split_once(',').ok_or_else(invalid)?;
    let mime = meta.strip_suffix(";base64").ok_or_else(invalid)?;
    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| InvoiceError::PdfGeneration(format!("invalid logo data: {e}")))?;

    Ok((mime.to_string(), bytes))
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        "image/webp" => "webp",
        _ => "png",
    }
}

fn download(url: &str) -> Result<Vec<u8>> {
    let agent: Agent = Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(5)))
        .build()
        .into();

    agent
        .get(url)
        .call()
        .map_err(|e| InvoiceError::remote("logo download", e))?
        .body_mut()
        .read_to_vec()
        .map_err(|e| InvoiceError::remote("logo download", e))
}
