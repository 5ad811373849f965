mod config;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use config::Config;
use miq_vmdb::{ConnectionParams, ModuleParams, ResourceReference};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Fetch a ManageIQ VMDB resource or invoke an action on it
#[derive(Parser, Debug)]
#[command(name = "miq-vmdb", version, about, long_about = None)]
struct Args {
    /// ManageIQ base URL
    #[arg(long, env = "MIQ_URL")]
    url: Option<String>,

    /// User name for basic authentication
    #[arg(long, env = "MIQ_USERNAME")]
    username: Option<String>,

    /// Password for basic authentication
    #[arg(long, env = "MIQ_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// API token (sent as X-Auth-Token)
    #[arg(long, env = "MIQ_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Group to act as (sent as X-MIQ-Group)
    #[arg(long)]
    group: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    no_verify_ssl: bool,

    /// PEM bundle of CA certificates to trust
    #[arg(long)]
    ca_bundle_path: Option<PathBuf>,

    /// PEM client certificate
    #[arg(long)]
    client_cert: Option<PathBuf>,

    /// PEM private key for the client certificate
    #[arg(long, requires = "client_cert")]
    client_key: Option<PathBuf>,

    /// Use basic auth even when a token is set
    #[arg(long)]
    force_basic_auth: bool,

    /// Resource href, or a collection::id slug
    #[arg(long, conflicts_with = "vmdb")]
    href: Option<String>,

    /// Resource object as JSON (must carry an href)
    #[arg(long)]
    vmdb: Option<String>,

    /// Action to invoke; without it the resource is only read
    #[arg(long)]
    action: Option<String>,

    /// Action payload as JSON
    #[arg(long, requires = "action", conflicts_with = "data_file")]
    data: Option<String>,

    /// Action payload from a YAML or JSON file
    #[arg(long, requires = "action")]
    data_file: Option<PathBuf>,

    /// Read all module arguments from a JSON file
    #[arg(long, conflicts_with_all = ["href", "vmdb", "action", "data", "data_file"])]
    args_file: Option<PathBuf>,

    /// Config file with connection defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();
    let file = open_log_file(&log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("miq-vmdb started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn open_log_file(log_path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("miq-vmdb").join("miq-vmdb.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".miq-vmdb").join("miq-vmdb.log");
    }
    PathBuf::from("miq-vmdb.log")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let params = build_params(&args, &config)?;
    let outcome = miq_vmdb::run(params).await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Assemble module arguments. Explicit values win; flags, environment and
/// the config file fill whatever is left.
fn build_params(args: &Args, config: &Config) -> Result<ModuleParams> {
    let mut params = match &args.args_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read arguments file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse arguments file {}", path.display()))?
        }
        None => ModuleParams {
            vmdb: args.vmdb.as_deref().map(parse_vmdb).transpose()?,
            href: args.href.clone(),
            action: args.action.clone(),
            data: load_data(args)?,
            ..Default::default()
        },
    };

    fill_connection(&mut params.manageiq_connection, args, config);
    Ok(params)
}

fn fill_connection(connection: &mut ConnectionParams, args: &Args, config: &Config) {
    fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
        if slot.is_none() {
            *slot = value;
        }
    }

    fill(&mut connection.url, config.effective_url(args.url.clone()));
    fill(&mut connection.username, args.username.clone());
    fill(&mut connection.password, args.password.clone());
    fill(&mut connection.token, args.token.clone());
    fill(&mut connection.group, config.effective_group(args.group.clone()));
    fill(
        &mut connection.ca_bundle_path,
        config.effective_ca_bundle(args.ca_bundle_path.clone()),
    );
    fill(&mut connection.client_cert, args.client_cert.clone());
    fill(&mut connection.client_key, args.client_key.clone());

    connection.verify_ssl &= config.effective_verify_ssl(args.no_verify_ssl);
    connection.force_basic_auth |= args.force_basic_auth;
}

/// `--vmdb` takes a resource object as JSON; plain references go through `--href`
fn parse_vmdb(raw: &str) -> Result<ResourceReference> {
    let object: Map<String, Value> =
        serde_json::from_str(raw).context("--vmdb is not valid JSON")?;
    Ok(ResourceReference::from(object))
}

fn load_data(args: &Args) -> Result<Option<Value>> {
    if let Some(raw) = &args.data {
        let data = serde_json::from_str(raw).context("--data is not valid JSON")?;
        return Ok(Some(data));
    }
    match &args.data_file {
        Some(path) => read_data_file(path).map(Some),
        None => Ok(None),
    }
}

/// YAML is a superset of JSON, so one parser covers both
fn read_data_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse data file {}", path.display()))
}
