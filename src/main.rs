//! api-trace-proxy
//!
//! A loopback forward proxy for HTTP APIs. Every request is relayed to the
//! real upstream untouched (apart from proxy-only headers) and a redacted
//! trace of the request and its response is printed.
//!
//! ```text
//!   client ──▶ 127.0.0.1:8899 ──▶ handler ──▶ forwarder ──▶ upstream API
//!                                    │
//!                                    └──▶ redactor ──▶ trace log
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use api_trace_proxy::config::{self, ProxyConfig};
use api_trace_proxy::lifecycle::startup;
use api_trace_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "api-trace-proxy")]
#[command(about = "Forward proxy that prints redacted traces of API traffic", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the loopback port to listen on.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the host used when requests carry no Host header.
    #[arg(long)]
    upstream_host: Option<String>,
}

fn load(cli: &Cli) -> Result<ProxyConfig, config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(port) = cli.port {
        if let Ok(mut addr) = config.listener.bind_address.parse::<SocketAddr>() {
            addr.set_port(port);
            config.listener.bind_address = addr.to_string();
        }
    }
    if let Some(host) = &cli.upstream_host {
        config.upstream.default_host = host.clone();
    }

    config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("api-trace-proxy: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("api-trace-proxy: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!("api-trace-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    match startup::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Proxy failed");
            ExitCode::FAILURE
        }
    }
}
