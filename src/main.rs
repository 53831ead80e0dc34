use clap::Parser;

use branch_chat::config::{Settings, StorageBackend};

#[derive(Parser, Debug)]
#[command(name = "branch-chat")]
#[command(about = "Chat API server with conversation branching")]
struct Args {
    /// Address to bind to (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Keep all data in process memory instead of Postgres
    #[arg(long, env = "IN_MEMORY", default_value_t = false)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    branch_chat::init_logging();

    let args = Args::parse();
    let mut settings = Settings::from_env();

    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if args.in_memory {
        settings.storage = StorageBackend::Memory;
    }

    tracing::info!("Starting {} on {}:{}", settings.app_name, settings.host, settings.port);
    branch_chat::run(settings).await
}
