//! mesports - list open ports with their services and owning processes
//!
//! With no arguments, enumerates every TCP and UDP socket on the host,
//! names each port from the IANA registry and prints one table grouped
//! by owning process.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use mesports_core::{
    Config, OutputFormat, Protocol, RecordFilter, RenderOptions, SourceKind,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mesports")]
#[command(author, version, about = "List open ports with their services and owning processes")]
struct Cli {
    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Do not download the IANA registry; use local service data
    #[arg(long)]
    offline: bool,

    /// Only show listening TCP sockets and UDP sockets
    #[arg(short, long)]
    listening: bool,

    /// Only show one transport protocol (tcp or udp)
    #[arg(long)]
    protocol: Option<Protocol>,

    /// Filter by port number
    #[arg(short, long)]
    port: Option<u16>,

    /// Filter by process name
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Socket listing facility
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// Registry download timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Read settings from this file instead of ~/.mesports/config.json
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log pipeline details to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Lsof,
    Ss,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Lsof => SourceKind::Lsof,
            SourceArg::Ss => SourceKind::Ss,
        }
    }
}

impl Cli {
    /// Load the config file and apply command-line overrides.
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        config.offline |= self.offline;
        config.listening_only |= self.listening;
        if let Some(source) = self.source {
            config.source = source.into();
        }
        if let Some(timeout) = self.timeout {
            config.fetch_timeout_secs = timeout;
        }
        if self.protocol.is_some() {
            config.protocol = self.protocol;
        }
        if self.no_color {
            config.color = Some(false);
        }
        Ok(config)
    }

    fn filter(&self, config: &Config) -> RecordFilter {
        RecordFilter::new()
            .with_listening_only(config.listening_only)
            .with_protocol(config.protocol)
            .with_port(self.port)
            .with_name(self.name.clone())
    }

    fn render_options(&self, config: &Config) -> RenderOptions {
        let color = !self.json
            && config
                .color
                .unwrap_or_else(|| atty::is(atty::Stream::Stdout));
        RenderOptions {
            format: if self.json {
                OutputFormat::Json
            } else {
                OutputFormat::Table
            },
            color,
        }
    }
}

/// Log level used when `MESPORTS_LOG` is unset. Registry fallbacks log at
/// `warn` and stay quiet unless asked for.
fn default_log_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "error"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("MESPORTS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config()?;
    let filter = cli.filter(&config);
    let options = cli.render_options(&config);
    colored::control::set_override(options.color);
    tracing::debug!(
        source = ?config.source,
        offline = config.offline,
        timeout_secs = config.fetch_timeout_secs,
        filter = ?filter,
        "applied configuration"
    );

    commands::list::run(&config, &filter, &options).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mesports: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
