use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use pipeline_ui_runtime_config::{Settings, default_config_path, load_from, save_to};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Write a settings file with defaults (or update the server URL).
    Init {
        /// Backend base URL, e.g. `http://localhost:3000`.
        #[arg(long)]
        url: Option<String>,

        /// Overwrite an existing file instead of updating it.
        #[arg(long)]
        force: bool,
    },
    /// Print the effective settings.
    Show,
    /// Print the settings file location.
    Path,
}

pub fn run(args: ConfigArgs, path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => default_config_path().context("resolve config path")?,
    };
    match args.action {
        ConfigAction::Init { url, force } => run_init(&path, url, force),
        ConfigAction::Show => run_show(&path),
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn run_init(path: &Path, server: Option<String>, force: bool) -> Result<()> {
    let mut settings = if path.exists() && !force {
        load_from(path)?
    } else {
        Settings::default()
    };
    if let Some(url) = server {
        settings.server.url = normalize_base_url(&url)?;
    }
    save_to(path, &settings)?;

    println!("config: {}", path.display());
    println!("server: {}", settings.server.url);
    Ok(())
}

fn run_show(path: &Path) -> Result<()> {
    let settings = load_from(path)?;
    let body = toml::to_string_pretty(&settings).context("serialize config")?;
    if path.exists() {
        println!("# {}", path.display());
    } else {
        println!("# {} (not found, showing defaults)", path.display());
    }
    print!("{body}");
    Ok(())
}

pub fn normalize_base_url(value: &str) -> Result<String> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("server URL cannot be empty");
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        bail!("server URL must start with http:// or https://");
    }
    Ok(trimmed.to_string())
}
