use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use restform::client::{format_api_error, Credentials, HttpTransport};
use restform::config::Config;
use restform::engine::{Diagnostics, OperationKind, Record, RecordExt, Transport};
use restform::handler::ContextHandler;
use restform::resources;
use restform::state::StateDocument;

/// Manage control-plane resources from local state files
#[derive(Parser, Debug)]
#[command(name = "restform", version, about, long_about = None)]
struct Args {
    /// Control-plane base URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// API token (overrides RESTFORM_TOKEN and the token file)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the resource described by a state file
    Create(OperationArgs),
    /// Refresh a state file from the control plane
    Read(OperationArgs),
    /// Push local changes of an existing resource
    Update(OperationArgs),
    /// Delete the resource and clear its id
    Delete(OperationArgs),
    /// List supported resource kinds
    Kinds,
    /// Store defaults in the config file
    Configure {
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        token_file: Option<PathBuf>,
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[derive(clap::Args, Debug)]
struct OperationArgs {
    /// Resource kind, see `restform kinds`
    kind: String,

    /// State file (.json, .yaml or .yml)
    #[arg(long)]
    state: PathBuf,
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

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", log_path.display(), e);
            return None;
        }
    };

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

    tracing::info!("restform started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("restform").join("restform.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".restform").join("restform.log");
    }
    PathBuf::from("restform.log")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let mut config = Config::load();

    let level = args
        .log_level
        .or_else(|| {
            config
                .log_level
                .as_deref()
                .and_then(|l| LogLevel::from_str(l, true).ok())
        })
        .unwrap_or(LogLevel::Off);
    let _log_guard = setup_logging(level);

    match run(&args, &mut config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args, config: &mut Config) -> Result<ExitCode> {
    let (operation, target) = match &args.command {
        Command::Create(target) => (OperationKind::Create, target),
        Command::Read(target) => (OperationKind::Read, target),
        Command::Update(target) => (OperationKind::Update, target),
        Command::Delete(target) => (OperationKind::Delete, target),
        Command::Kinds => {
            for def in resources::resources() {
                let suffix = if def.data_source { " (data source)" } else { "" };
                println!("{:<22} {}{}", def.kind, def.description, suffix);
            }
            return Ok(ExitCode::SUCCESS);
        }
        Command::Configure {
            endpoint,
            token_file,
            timeout_secs,
        } => {
            if let Some(endpoint) = endpoint.as_deref().or(args.endpoint.as_deref()) {
                config.set_endpoint(endpoint)?;
            }
            if token_file.is_some() || timeout_secs.is_some() {
                config.token_file = token_file.clone().or(config.token_file.take());
                config.timeout_secs = timeout_secs.or(config.timeout_secs);
                config.save()?;
            }
            if let Some(path) = Config::config_path() {
                println!("Configuration saved to {}", path.display());
            }
            return Ok(ExitCode::SUCCESS);
        }
    };

    let def = resources::get_resource(&target.kind).with_context(|| {
        format!(
            "Unknown resource kind '{}'. Run 'restform kinds' for the list",
            target.kind
        )
    })?;

    let mut doc = load_state(&target.state, def.kind)?;
    if doc.kind != def.kind {
        bail!(
            "State file {} describes a '{}', not a '{}'",
            target.state.display(),
            doc.kind,
            def.kind
        );
    }

    let credentials = Credentials::resolve(args.token.as_deref(), config.token_file.as_deref())?;
    let endpoint = config.effective_endpoint(args.endpoint.as_deref());
    let transport = HttpTransport::new(&endpoint, credentials, config.effective_timeout())?;

    let handler = def.handler();
    let mut record = doc.to_record();
    let (diagnostics, hint) = execute(&handler, operation, &mut record, &transport).await;

    for diagnostic in diagnostics.iter() {
        eprintln!("{}", diagnostic);
    }
    if let Some(hint) = hint {
        eprintln!("  hint: {}", hint);
    }

    let failed = diagnostics.has_errors();
    if operation == OperationKind::Delete && !failed {
        record.clear_id();
    }
    if !failed && !record.has_id() && operation != OperationKind::Delete {
        eprintln!("{} no longer exists remotely; id cleared", def.kind);
    }

    doc.update_from(record);
    doc.save(&target.state)?;

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn load_state(path: &Path, kind: &str) -> Result<StateDocument> {
    if !path.exists() {
        bail!(
            "State file {} does not exist; write the desired '{}' attributes first",
            path.display(),
            kind
        );
    }
    StateDocument::load(path)
}

/// Run the operation; declarative flows also yield a hint for HTTP failures.
async fn execute(
    handler: &ContextHandler,
    operation: OperationKind,
    record: &mut dyn Record,
    transport: &dyn Transport,
) -> (Diagnostics, Option<String>) {
    match handler.flow(operation) {
        Some(Ok(flow)) => {
            let outcome = flow.run(record, transport).await;
            match outcome.error {
                Some(error) => {
                    let hint = error.transport_error().map(format_api_error);
                    (Diagnostics::from_error(operation, &error), hint)
                }
                None => (Diagnostics::new(), None),
            }
        }
        _ => (handler.apply(operation, record, transport).await, None),
    }
}
