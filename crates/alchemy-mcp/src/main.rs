//! Alchemy MCP Server
//!
//! Exposes Alchemy blockchain data to AI agents over the Model Context Protocol.

use clap::{Parser, ValueEnum};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use alchemy_mcp::{backend, config, McpServer, ServerConfig};

/// Alchemy MCP Server - blockchain data tools for AI agents
#[derive(Parser, Debug)]
#[command(name = "alchemy-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Transport mechanism to use
    #[arg(short, long, value_enum, default_value = "stdio")]
    transport: Transport,

    /// Serve canned data instead of calling Alchemy (no API key needed)
    #[arg(long)]
    mock: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Transport {
    /// Standard input/output (for Claude Desktop, VS Code, etc.)
    Stdio,
    /// HTTP with Server-Sent Events - not supported yet
    Http,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout is reserved for MCP frames
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(args.log_level))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Alchemy MCP Server v{} starting", env!("CARGO_PKG_VERSION"));

    if let Transport::Http = args.transport {
        eprintln!("HTTP transport is not supported. Use --transport stdio.");
        std::process::exit(1);
    }

    let server = if args.mock {
        info!("Using mock backend");
        let event_buffer = config::event_buffer(|name| std::env::var(name).ok());
        McpServer::from_backend(backend::mock(), event_buffer)
    } else {
        let config = match ServerConfig::from_env() {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                eprintln!("Failed to start: {}", e);
                eprintln!("Set ALCHEMY_API_KEY, or use --mock to run without Alchemy");
                std::process::exit(1);
            }
        };
        info!(network = %config.network, "Using Alchemy backend");
        McpServer::from_backend(backend::hosted(&config), config.event_buffer)
    };

    server.run_stdio().await?;
    Ok(())
}
