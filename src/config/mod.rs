mod settings;

pub use settings::{Config, Defaults, InvoiceSettings, PdfSettings, RemoteSettings};

use crate::error::{InvoiceError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (XDG, falling back to ~/.invoice-builder/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "invoice-builder") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = dirs_home().ok_or_else(|| {
        InvoiceError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".invoice-builder"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve the PDF output directory; relative paths live under the config dir
pub fn resolve_output_dir(output_dir: &str, cfg_dir: &Path) -> PathBuf {
    let expanded = expand_path(output_dir);
    if expanded.is_absolute() {
        expanded
    } else {
        cfg_dir.join(expanded)
    }
}

/// Load the main config.toml
pub fn load_config(cfg_dir: &Path) -> Result<Config> {
    let path = cfg_dir.join("config.toml");
    if !path.exists() {
        return Err(InvoiceError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    parse_config(&content).map_err(|e| InvoiceError::ConfigParse { path, source: e })
}

fn parse_config(content: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(content)
}

/// Create the config directory with a template config.toml
pub fn init_config_dir(cfg_dir: &Path) -> Result<()> {
    if cfg_dir.exists() {
        return Err(InvoiceError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"# Values every new invoice starts with
[defaults]
from = "Your Company Name"
currency = "₦"        # one of ₦ $ € £ ¥
notes = ""

[invoice]
number_width = 4      # invoice numbers are zero-padded to at least 4 digits

[pdf]
output_dir = "output" # relative to this directory, or an absolute / ~/ path

# Uncomment to sync invoices and the invoice counter with a cloud document store.
# [remote]
# url = "https://docs.example.com/v1"
# collection = "invoices"
# counter = "meta/counter"
# token = "secret-token"   # optional, sent as a bearer token
# timeout_secs = 10
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::Currency;
    use tempfile::TempDir;

    #[test]
    fn template_parses_without_remote() {
        let config = parse_config(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.defaults.from, "Your Company Name");
        assert_eq!(config.defaults.currency, Currency::Naira);
        assert_eq!(config.invoice.number_width, 4);
        assert!(config.remote.is_none());
    }

    #[test]
    fn remote_section_fills_defaults() {
        let config = parse_config(
            r#"
[remote]
url = "http://localhost:8080"
"#,
        )
        .unwrap();

        let remote = config.remote.unwrap();
        assert_eq!(remote.collection, "invoices");
        assert_eq!(remote.counter, "meta/counter");
        assert_eq!(remote.timeout_secs, 10);
        assert!(remote.token.is_none());
        assert_eq!(config.pdf.output_dir, "output");
    }

    #[test]
    fn invalid_currency_is_a_parse_error() {
        assert!(parse_config("[defaults]\ncurrency = \"BTC\"\n").is_err());
    }

    #[test]
    fn init_refuses_existing_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("cfg");

        init_config_dir(&dir).unwrap();
        assert!(dir.join("config.toml").exists());
        assert!(load_config(&dir).is_ok());
        assert!(matches!(
            init_config_dir(&dir),
            Err(InvoiceError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn relative_output_dir_is_under_config_dir() {
        let cfg = Path::new("/tmp/cfg");
        assert_eq!(resolve_output_dir("output", cfg), cfg.join("output"));
        assert_eq!(
            resolve_output_dir("/srv/pdf", cfg),
            PathBuf::from("/srv/pdf")
        );
    }
}
