use clap::Parser;
use pkg_api::server::{ServerConfig, start_server};
use pkg_constants::network::{DEFAULT_API_PORT, DEFAULT_TOKEN};
use pkg_constants::paths::{DEFAULT_SERVER_CONFIG, DEFAULT_SERVER_DATA_DIR};
use pkg_types::config::{LogFormat, ServerConfigFile, load_config_file};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bfw-server", about = "Host firewall policy control plane")]
struct Cli {
    /// Path to YAML or JSON config file
    #[arg(long, short, default_value = DEFAULT_SERVER_CONFIG)]
    config: String,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Directory for SlateDB state storage
    #[arg(long)]
    data_dir: Option<String>,

    /// Bearer token required on every API call except ping
    #[arg(long)]
    token: Option<String>,

    /// Log output format: text or json
    #[arg(long)]
    log_format: Option<LogFormat>,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config file (returns defaults if file not found)
    let file_cfg: ServerConfigFile = load_config_file(&cli.config)?;

    init_tracing(cli.log_format.or(file_cfg.log_format).unwrap_or_default());
    info!("Config file: {}", cli.config);

    // Merge: CLI args > config file > defaults
    let port = cli.port.or(file_cfg.port).unwrap_or(DEFAULT_API_PORT);
    let data_dir = cli
        .data_dir
        .or(file_cfg.data_dir)
        .unwrap_or_else(|| DEFAULT_SERVER_DATA_DIR.to_string());
    let token = cli
        .token
        .or(file_cfg.token)
        .unwrap_or_else(|| DEFAULT_TOKEN.to_string());

    info!("Starting bfw-server");
    info!("  Port:      {}", port);
    info!("  Data dir:  {}", data_dir);
    info!("  Token:     {}***", token.chars().take(4).collect::<String>());

    let config = ServerConfig {
        addr: SocketAddr::from(([0, 0, 0, 0], port)),
        data_dir,
        token,
    };

    start_server(config).await?;

    Ok(())
}
