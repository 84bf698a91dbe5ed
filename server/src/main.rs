use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

use meshring_core::NodeConfig;
use meshring_rpc::Server;

mod cli;
use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging(cli.log_level.into());

    let config = NodeConfig {
        bits: cli.bits,
        successor_list_cap: cli.successors,
        ..NodeConfig::default()
    };
    config.validate()?;

    let addr = cli.listen;
    println!("Listening on: {}", addr);

    let server = Server::new(addr, config, cli.ring).await;
    server.run().await?;
    Ok(())
}

fn setup_logging(level: LevelFilter) {
    CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .unwrap();

    log::info!("Logging started");
}
