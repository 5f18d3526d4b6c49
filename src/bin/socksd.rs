use anyhow::Result;
use clap::Parser;
use socksd::{
    ServerConfig, Socks5Server,
    config::{DEFAULT_HOST, DEFAULT_PORT},
};
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "A small SOCKS5 proxy server", long_about = None)]
struct Args {
    /// Listener host
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Listener port, 0 falls back to the default
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Account for username/password authentication, as username:password
    #[arg(short, long)]
    account: Option<String>,

    /// Seconds a client may spend before the relay starts
    #[arg(short = 't', long)]
    handshake_timeout: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse args
    let args = Args::parse();

    // Initialize tracing subscriber
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    let port = match args.port {
        0 => DEFAULT_PORT,
        p => p,
    };

    let config = ServerConfig::new(args.host, port)
        .with_credentials(args.account)
        .with_handshake_timeout(args.handshake_timeout.map(Duration::from_secs));

    if config.credentials().is_some() {
        info!("Authentication enabled");
    }

    // Instantiate server
    let mut server = Socks5Server::new(config);

    // Run it
    info!("Starting SOCKS5 proxy: {}", server.config.listen_addr());
    server.run().await
}
