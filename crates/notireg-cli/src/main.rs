//! notireg: package-manager hook adapter for notification settings.
//!
//! The host runs one subcommand per lifecycle hook. The hook's status code is
//! printed on stdout and its magnitude becomes the exit code.

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Context;
use clap::{Parser, Subcommand};
use notireg_db::Store;
use notireg_sync::{status_of, Lifecycle, LifecycleSync, StaticCatalog};
use notireg_types::Status;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{LoggingConfig, PluginConfig};

/// Synchronize per-application notification settings with package manifests.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: $NOTIREG_CONFIG or /etc/notireg/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Settings database, overriding the configured path
    #[arg(long, value_name = "FILE", global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Before a package is installed
    PreInstall { pkgid: String },

    /// Register the settings declared by the manifest
    Install {
        pkgid: String,
        /// Manifest file, or `-` for stdin
        manifest: PathBuf,
    },

    /// After a package is installed
    PostInstall { pkgid: String },

    /// Remove the package's settings ahead of an upgrade
    PreUpgrade { pkgid: String },

    /// Register the settings declared by the upgraded manifest
    Upgrade {
        pkgid: String,
        /// Manifest file, or `-` for stdin
        manifest: PathBuf,
    },

    /// After a package is upgraded
    PostUpgrade { pkgid: String },

    /// Before a package is uninstalled
    PreUninstall { pkgid: String },

    /// Remove the settings of every app the package owns
    Uninstall {
        pkgid: String,
        /// App ids owned by the package (repeat for each app)
        #[arg(long = "app", value_name = "APPID", required = true)]
        apps: Vec<String>,
    },

    /// After a package is uninstalled
    PostUninstall { pkgid: String },

    /// Print the package's stored settings as JSON
    Show { pkgid: String },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = PluginConfig::load(cli.config.as_deref())?;
    init_tracing(&config.logging)?;

    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path());
    let catalog = match &cli.command {
        Commands::Uninstall { pkgid, apps } => StaticCatalog::single(pkgid.clone(), apps.clone()),
        _ => StaticCatalog::new(),
    };
    let mut sync = LifecycleSync::new(Store::new(db_path), catalog);
    info!(path = %sync.store().path().display(), "notireg starting");

    let status = match cli.command {
        Commands::PreInstall { pkgid } => report(sync.pre_install(&pkgid)),
        Commands::Install { pkgid, manifest } => {
            with_manifest(&manifest, |text| sync.install(text, &pkgid))
        }
        Commands::PostInstall { pkgid } => report(sync.post_install(&pkgid)),
        Commands::PreUpgrade { pkgid } => report(sync.pre_upgrade(&pkgid)),
        Commands::Upgrade { pkgid, manifest } => {
            with_manifest(&manifest, |text| sync.upgrade(text, &pkgid))
        }
        Commands::PostUpgrade { pkgid } => report(sync.post_upgrade(&pkgid)),
        Commands::PreUninstall { pkgid } => report(sync.pre_uninstall(&pkgid)),
        Commands::Uninstall { pkgid, .. } => report(sync.uninstall("", &pkgid)),
        Commands::PostUninstall { pkgid } => report(sync.post_uninstall(&pkgid)),
        Commands::Show { pkgid } => {
            let mut store = sync.into_store();
            let rows = store.list_by_package(&pkgid)?;
            store.disconnect()?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(ExitCode::SUCCESS);
        }
    };

    let code = i32::from(status);
    println!("{code}");
    Ok(ExitCode::from(u8::try_from(code.unsigned_abs()).unwrap_or(1)))
}

/// Log a failed hook and collapse its result into the host status.
fn report(result: notireg_sync::Result<()>) -> Status {
    let status = status_of(&result);
    if let Err(e) = &result {
        error!(status = %status, "hook failed: {e}");
    }
    status
}

/// Run a manifest-carrying hook. An unreadable manifest is an invalid
/// argument, reported like any other hook failure.
fn with_manifest(path: &Path, hook: impl FnOnce(&str) -> notireg_sync::Result<()>) -> Status {
    match read_manifest(path) {
        Ok(manifest) => report(hook(&manifest)),
        Err(e) => {
            let status = Status::InvalidArgument;
            error!(status = %status, path = %path.display(), "cannot read manifest: {e}");
            status
        }
    }
}

fn read_manifest(path: &Path) -> std::io::Result<String> {
    if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin())
    } else {
        std::fs::read_to_string(path)
    }
}

/// Directives from `RUST_LOG` when set, otherwise the configured level.
fn log_filter(rust_log: Option<&str>, level: &str) -> anyhow::Result<EnvFilter> {
    let directives = match rust_log.filter(|d| !d.is_empty()) {
        Some(directives) => directives.to_string(),
        None => format!("notireg={level}"),
    };
    Ok(EnvFilter::try_new(directives)?)
}

/// Install the global subscriber.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(rust_log.as_deref(), &logging.level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = if logging.file.is_empty() {
        builder.with_writer(std::io::stderr).try_init()
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&logging.file)
            .with_context(|| format!("opening log file {}", logging.file))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    };

    installed.map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))
}
