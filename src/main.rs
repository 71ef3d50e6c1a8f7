use address_watch::api::{Cli, CliHandler, Commands};
use address_watch::config::AppConfig;
use address_watch::logging::init_logging;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Offline commands print to stdout and do not need a logger
    if matches!(command, Commands::Monitor | Commands::Serve { .. } | Commands::Run) {
        init_logging(&config.logging)?;
        print_banner();
        log::info!("Watching {} addresses via {}", config.watched_addresses.len(), config.rpc.endpoint);
    }

    let handler = CliHandler::new(config);
    if let Err(e) = handler.execute_command(&command).await {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn print_banner() {
    println!("+--------------------------------------------------------------+");
    println!("|                       address-watch                          |");
    println!("|                                                              |");
    println!("|     Incoming transfer monitor for watched EVM addresses     |");
    println!("+--------------------------------------------------------------+");
    println!();
}
