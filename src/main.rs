use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use invoice_builder::config::{config_dir, init_config_dir, load_config, resolve_output_dir};
use invoice_builder::error::{InvoiceError, Result};
use invoice_builder::invoice::{
    format_money, logo_data_uri, pdf_file_name, ExportData, ItemField, Totals,
};
use invoice_builder::pdf::export_pdf;
use invoice_builder::store::{entry_name, SaveStatus};
use invoice_builder::{
    Config, Currency, Invoice, LineItems, LocalStore, NumericField, Persistence, RemoteStore,
};

#[derive(Parser)]
#[command(name = "invoice-builder")]
#[command(version, about = "Build, save and export invoices from the terminal", long_about = None)]
struct Cli {
    /// Path to config directory (default: XDG config dir or ~/.invoice-builder)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Start a new invoice with the next invoice number
    New,

    /// Show the current invoice with its totals
    #[command(alias = "print")]
    Show,

    /// Change fields of the current invoice
    Set {
        /// Invoice number
        #[arg(long)]
        number: Option<String>,

        /// Your company name
        #[arg(long)]
        from: Option<String>,

        /// Client name
        #[arg(long)]
        to: Option<String>,

        /// Client address
        #[arg(long)]
        to_address: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Discount in percent
        #[arg(long, allow_hyphen_values = true)]
        discount: Option<String>,

        /// Tax in percent
        #[arg(long, allow_hyphen_values = true)]
        tax: Option<String>,

        /// Currency symbol or code (₦/NGN, $/USD, €/EUR, £/GBP, ¥/JPY)
        #[arg(long)]
        currency: Option<String>,
    },

    /// Add, remove or edit line items
    #[command(subcommand)]
    Item(ItemCommand),

    /// Set or clear the invoice logo
    #[command(subcommand)]
    Logo(LogoCommand),

    /// Save the current invoice under a name (locally and to the cloud)
    Save {
        /// Archive name (default: the invoice number)
        name: Option<String>,

        /// Skip the cloud store
        #[arg(long)]
        local_only: bool,
    },

    /// Load a saved invoice as the current invoice
    Load {
        /// Archive name
        name: String,

        /// Fetch from the cloud store instead of the local archive
        #[arg(long)]
        remote: bool,
    },

    /// List locally saved invoices
    List,

    /// Export the current invoice as invoice-<number>.pdf
    Export {
        /// Custom output file path (default: output_dir/invoice-<number>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open generated PDF with system default viewer
        #[arg(long)]
        open: bool,
    },

    /// Show storage status and the current invoice number
    Status,
}

#[derive(Subcommand)]
enum ItemCommand {
    /// Append a line item
    Add {
        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(short, long, allow_hyphen_values = true)]
        quantity: Option<String>,

        #[arg(short, long, allow_hyphen_values = true)]
        price: Option<String>,
    },

    /// Remove a line item by its number in 'show'
    Remove { index: usize },

    /// Replace one field (description, quantity, price) of a line item
    Update {
        index: usize,
        field: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

#[derive(Subcommand)]
enum LogoCommand {
    /// Use an image as the logo
    Set {
        path: PathBuf,

        /// Store the path or URL as given instead of embedding the image
        #[arg(long)]
        link: bool,
    },

    /// Remove the logo
    Clear,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    // Everything except init needs an initialized config directory
    if let Commands::Init = cli.command {
        return cmd_init(&cfg_dir);
    }
    let app = App::open(&cfg_dir)?;

    match cli.command {
        Commands::Init => unreachable!("init returns before the config is opened"),
        Commands::New => cmd_new(&app),
        Commands::Show => cmd_show(&app),
        Commands::Set {
            number,
            from,
            to,
            to_address,
            notes,
            discount,
            tax,
            currency,
        } => cmd_set(
            &app,
            FieldChanges {
                number,
                from,
                to,
                to_address,
                notes,
                discount,
                tax,
                currency,
            },
        ),
        Commands::Item(command) => cmd_item(&app, command),
        Commands::Logo(command) => cmd_logo(&app, command),
        Commands::Save { name, local_only } => cmd_save(&app, name, local_only),
        Commands::Load { name, remote } => cmd_load(&app, &name, remote),
        Commands::List => cmd_list(&app),
        Commands::Export { output, open } => cmd_export(&app, output, open),
        Commands::Status => cmd_status(&app),
    }
}

/// Loaded config plus both stores
struct App {
    cfg_dir: PathBuf,
    config: Config,
    persistence: Persistence<LocalStore, RemoteStore>,
}

impl App {
    fn open(cfg_dir: &Path) -> Result<Self> {
        if !cfg_dir.exists() {
            return Err(InvoiceError::ConfigNotFound(cfg_dir.to_path_buf()));
        }

        let config = load_config(cfg_dir)?;
        let width = config.invoice.number_width;
        let local = LocalStore::new(cfg_dir).with_number_width(width);
        let remote = config.remote.as_ref().map(RemoteStore::new);

        Ok(Self {
            cfg_dir: cfg_dir.to_path_buf(),
            persistence: Persistence::new(local, remote).with_number_width(width),
            config,
        })
    }

    fn local(&self) -> &LocalStore {
        self.persistence.local()
    }

    /// A blank invoice with configured defaults and the last used logo
    fn fresh_invoice(&self, invoice_number: String) -> Result<Invoice> {
        let defaults = &self.config.defaults;
        Ok(Invoice {
            invoice_number,
            from: defaults.from.clone(),
            notes: defaults.notes.clone(),
            currency: defaults.currency,
            logo: self.local().logo()?,
            ..Invoice::default()
        })
    }

    /// The invoice being edited; created on first use
    fn draft(&self) -> Result<Invoice> {
        if let Some(draft) = self.local().load_draft()? {
            return Ok(draft);
        }
        let number = self.persistence.initial_invoice_number()?;
        let draft = self.fresh_invoice(number)?;
        self.local().save_draft(&draft)?;
        Ok(draft)
    }

    fn save_draft(&self, draft: &Invoice) -> Result<()> {
        self.local().save_draft(draft)
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    init_config_dir(cfg_dir)?;

    println!("Initialized invoice config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Set your defaults (and optional cloud store):  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Start an invoice:  invoice-builder new");
    println!("  3. Add line items:    invoice-builder item add -d <description> -q <qty> -p <price>");

    Ok(())
}

/// Start a new invoice with a freshly minted number
fn cmd_new(app: &App) -> Result<()> {
    let number = app.persistence.mint_next_invoice_number()?;
    let draft = app.fresh_invoice(number)?;
    app.save_draft(&draft)?;

    println!("New invoice {}", draft.invoice_number);
    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "UNIT PRICE")]
    price: String,
    #[tabled(rename = "QTY")]
    quantity: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
}

#[derive(Tabled)]
struct ArchiveRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "TOTAL")]
    total: String,
}

/// Print the current invoice the way it will be exported
fn cmd_show(app: &App) -> Result<()> {
    let draft = app.draft()?;
    let data = ExportData::new(&draft, chrono::Local::now().date_naive());

    let logo = match &draft.logo {
        Some(logo) if logo.starts_with("data:") => "[embedded image]".to_string(),
        Some(logo) => logo.clone(),
        None => format!("[{}]", data.logo_placeholder),
    };

    println!("{}", logo);
    println!("{} #{}    {}", data.title, data.number, data.date);
    println!("{}", "-".repeat(50));
    println!("From:     {}", data.from);
    println!("Bill To:  {}", data.to);
    if !data.to_address.is_empty() {
        println!("          {}", data.to_address);
    }
    println!();

    // Fields that are not numbers show what was typed; they count as zero
    let rows: Vec<ItemRow> = draft
        .items
        .rows_for_display()
        .iter()
        .zip(&data.items)
        .enumerate()
        .map(|(idx, (item, row))| ItemRow {
            index: idx + 1,
            description: row.description.clone(),
            price: as_typed(&item.price, &row.price),
            quantity: as_typed(&item.quantity, &row.quantity),
            amount: row.amount.clone(),
        })
        .collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    let totals = [
        ("Subtotal:".to_string(), &data.subtotal),
        (format!("Discount ({}):", data.discount_pct), &data.discount),
        (format!("Tax ({}):", data.tax_pct), &data.tax),
        ("TOTAL:".to_string(), &data.total),
    ];
    for (label, value) in totals {
        println!("{:>32} {:>16}", label, value);
    }
    println!();

    if !data.notes.is_empty() {
        println!("Notes: {}", data.notes);
    }

    Ok(())
}

fn as_typed(field: &NumericField, formatted: &str) -> String {
    if field.is_number() {
        formatted.to_string()
    } else {
        field.raw().to_string()
    }
}

/// Optional replacements for the current invoice's fields
struct FieldChanges {
    number: Option<String>,
    from: Option<String>,
    to: Option<String>,
    to_address: Option<String>,
    notes: Option<String>,
    discount: Option<String>,
    tax: Option<String>,
    currency: Option<String>,
}

fn cmd_set(app: &App, changes: FieldChanges) -> Result<()> {
    let mut draft = app.draft()?;

    // Parse first so an invalid currency leaves the draft untouched
    let currency = changes
        .currency
        .as_deref()
        .map(str::parse::<Currency>)
        .transpose()?;

    if let Some(number) = changes.number {
        draft.invoice_number = number;
    }
    if let Some(from) = changes.from {
        draft.from = from;
    }
    if let Some(to) = changes.to {
        draft.to = to;
    }
    if let Some(to_address) = changes.to_address {
        draft.to_address = to_address;
    }
    if let Some(notes) = changes.notes {
        draft.notes = notes;
    }
    if let Some(discount) = changes.discount {
        draft.discount = NumericField::from(discount);
    }
    if let Some(tax) = changes.tax {
        draft.tax = NumericField::from(tax);
    }
    if let Some(currency) = currency {
        draft.currency = currency;
    }

    app.save_draft(&draft)?;
    print_total(&draft);
    Ok(())
}

/// Convert a 1-based index from 'show' into a list position
fn item_index(items: &LineItems, number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .ok_or(InvoiceError::ItemIndexOutOfRange {
            index: number,
            count: items.len(),
        })
}

fn cmd_item(app: &App, command: ItemCommand) -> Result<()> {
    let mut draft = app.draft()?;

    match command {
        ItemCommand::Add {
            description,
            quantity,
            price,
        } => {
            let index = draft.items.add();
            draft
                .items
                .update(index, ItemField::Description, &description)?;
            if let Some(quantity) = quantity {
                draft.items.update(index, ItemField::Quantity, &quantity)?;
            }
            if let Some(price) = price {
                draft.items.update(index, ItemField::Price, &price)?;
            }
            println!("Added item {}", index + 1);
        }
        ItemCommand::Remove { index } => {
            let position = item_index(&draft.items, index)?;
            let removed = draft.items.remove(position)?;
            if removed.description.is_empty() {
                println!("Removed item {}", index);
            } else {
                println!("Removed item {} ({})", index, removed.description);
            }
        }
        ItemCommand::Update {
            index,
            field,
            value,
        } => {
            let field: ItemField = field.parse()?;
            let position = item_index(&draft.items, index)?;
            draft.items.update(position, field, &value)?;
            println!("Updated item {}", index);
        }
    }

    app.save_draft(&draft)?;
    print_total(&draft);
    Ok(())
}

fn cmd_logo(app: &App, command: LogoCommand) -> Result<()> {
    let mut draft = app.draft()?;

    match command {
        LogoCommand::Set { path, link } => {
            let logo = if link {
                path.to_string_lossy().into_owned()
            } else {
                logo_data_uri(&path)?
            };
            app.local().set_logo(Some(logo.clone()))?;
            draft.logo = Some(logo);
            println!("Logo set from {}", path.display());
        }
        LogoCommand::Clear => {
            app.local().set_logo(None)?;
            draft.logo = None;
            println!("Logo cleared");
        }
    }

    app.save_draft(&draft)
}

/// Save the current invoice to the local archive and the cloud store
fn cmd_save(app: &App, name: Option<String>, local_only: bool) -> Result<()> {
    let draft = app.draft()?;
    let name = name.unwrap_or_else(|| draft.invoice_number.clone());

    // A blank name cancels the save
    let Some(name) = entry_name(&name) else {
        return Ok(());
    };

    if local_only || !app.persistence.has_remote() {
        app.persistence.save_local(name, &draft)?;
        println!("Invoice saved as {}", name);
        return Ok(());
    }

    let Some(report) = app.persistence.save(name, &draft) else {
        return Ok(());
    };

    match report.status() {
        SaveStatus::Complete => println!("Invoice saved as {} (local and cloud)", name),
        SaveStatus::LocalOnly => println!("Invoice saved as {}", name),
        SaveStatus::Partial => match (report.local, report.remote) {
            (Ok(()), Some(Err(e))) => {
                println!("Invoice saved as {} (local only)", name);
                eprintln!("Warning: cloud save failed: {e}");
            }
            (Err(e), _) => {
                println!("Invoice saved to cloud as {}", name);
                eprintln!("Warning: local save failed: {e}");
            }
            _ => {}
        },
        SaveStatus::Failed => {
            if let Some(Err(e)) = report.remote {
                eprintln!("Warning: cloud save failed: {e}");
            }
            return report.local;
        }
    }

    Ok(())
}

/// Replace the current invoice with a saved one
fn cmd_load(app: &App, name: &str, remote: bool) -> Result<()> {
    let Some(name) = entry_name(name) else {
        return Ok(());
    };

    if remote {
        match app.persistence.load_remote(name)? {
            Some(invoice) => {
                app.save_draft(&invoice)?;
                println!("Loaded '{}' from cloud", name);
            }
            None => println!("Invoice '{}' not found in cloud", name),
        }
        return Ok(());
    }

    let invoice = app
        .persistence
        .load_local(name)?
        .ok_or_else(|| InvoiceError::InvoiceNotFound(name.to_string()))?;
    app.save_draft(&invoice)?;
    println!("Loaded '{}'", name);
    Ok(())
}

/// List the local archive
fn cmd_list(app: &App) -> Result<()> {
    let archive = app.local().load_archive()?;

    if archive.is_empty() {
        println!("No saved invoices.");
        return Ok(());
    }

    let rows: Vec<ArchiveRow> = archive
        .iter()
        .map(|(name, invoice)| ArchiveRow {
            name: name.clone(),
            number: invoice.invoice_number.clone(),
            client: invoice.to.clone(),
            total: format_money(
                invoice.currency.symbol(),
                Totals::compute(invoice).total,
            ),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!();
    println!("Total: {} saved invoices", archive.len());
    println!("Use 'invoice-builder load <name>' to edit one");
    Ok(())
}

/// Export the current invoice as PDF
fn cmd_export(app: &App, output: Option<PathBuf>, open: bool) -> Result<()> {
    let draft = app.draft()?;

    let pdf_path = match output {
        Some(path) => path,
        None => {
            let output_dir = resolve_output_dir(&app.config.pdf.output_dir, &app.cfg_dir);
            std::fs::create_dir_all(&output_dir)?;
            output_dir.join(pdf_file_name(&draft.invoice_number))
        }
    };

    export_pdf(&draft, &pdf_path)?;

    println!("Exported {}", draft.invoice_number);
    print_total(&draft);
    println!("Saved: {}", pdf_path.display());

    if open {
        open_path(&pdf_path)?;
    }
    Ok(())
}

fn open_path(pdf_path: &Path) -> Result<()> {
    // Open with system default viewer
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(pdf_path)
            .spawn()?;
    }
    Ok(())
}

/// Show storage status
fn cmd_status(app: &App) -> Result<()> {
    let local = app.local();
    let archive = local.load_archive()?;
    let cached = local.cached_number()?;

    println!("Invoice Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", app.cfg_dir.display());
    match &app.config.remote {
        Some(remote) => println!("Cloud store:      {}/{}", remote.url, remote.collection),
        None => println!("Cloud store:      disabled"),
    }
    println!(
        "Last number:      {}",
        cached.as_deref().unwrap_or("(none yet)")
    );
    println!("Saved invoices:   {}", archive.len());

    if let Some(draft) = local.load_draft()? {
        println!(
            "Current invoice:  {} ({})",
            draft.invoice_number,
            format_money(
                draft.currency.symbol(),
                Totals::compute(&draft).total
            )
        );
    }

    Ok(())
}

fn print_total(invoice: &Invoice) {
    let totals = Totals::compute(invoice);
    println!(
        "Total: {}",
        format_money(invoice.currency.symbol(), totals.total)
    );
}
