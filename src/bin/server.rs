use address_watch::api::WebhookServer;
use address_watch::config::AppConfig;
use address_watch::logging::init_logging;
use address_watch::sink::LogSink;
use address_watch::webhook::WebhookIngestor;
use clap::Parser;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "webhook-server")]
#[command(about = "HTTP receiver for address event notifications")]
#[command(version)]
struct Args {
    /// Server port (defaults to the configured webhook port)
    #[arg(long)]
    port: Option<u16>,

    /// Bind address (defaults to the configured webhook host)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    print_server_banner();

    let args = Args::parse();
    let config = AppConfig::load()?;

    init_logging(&config.logging)?;

    let host = args.host.unwrap_or_else(|| config.webhook.host.clone());
    let port = args.port.unwrap_or(config.webhook.port);

    let ingestor = WebhookIngestor::new(
        Arc::new(config.token_catalog()),
        config.explorer.clone(),
        Arc::new(LogSink),
    );
    let server = WebhookServer::new(Arc::new(ingestor), &host, port);

    log::info!("Starting webhook server on {}:{}", host, port);

    if let Err(e) = server.start().await {
        log::error!("Server failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}

fn print_server_banner() {
    println!("+--------------------------------------------------------------+");
    println!("|                  address-watch webhook server                |");
    println!("|                                                              |");
    println!("|          Receives pushed address event notifications        |");
    println!("+--------------------------------------------------------------+");
    println!();
}
