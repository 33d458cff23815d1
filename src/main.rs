/* src/main.rs */

mod console;
mod monitor;
mod server;
mod setup;

use anyhow::{Context, Result};
use log::info;
use monitor::Monitor;
use setup::check::validate_config;
use setup::config::Config;
use setup::gen_conf::generate_default_config;
use std::env;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

const DEFAULT_CONFIG_PATH: &str = "connwatch.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() == 1 {
        return match generate_default_config(DEFAULT_CONFIG_PATH) {
            Ok(()) => {
                println!(
                    "> Default config generated. Use '-c {}' to run.",
                    DEFAULT_CONFIG_PATH
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("! Could not write {}: {}", DEFAULT_CONFIG_PATH, e);
                ExitCode::FAILURE
            }
        };
    }

    if args.len() == 3 && args[1] == "-c" {
        return match run(&args[2]).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("\nApplication Error: {:#}\n", e);
                ExitCode::FAILURE
            }
        };
    }

    println!(
        "! Invalid usage. Use '-c <config_path>' to run or no arguments to generate a default config."
    );
    ExitCode::FAILURE
}

async fn run(config_path: &str) -> Result<()> {
    let config = Config::from_file(config_path)?;
    validate_config(&config).map_err(anyhow::Error::msg)?;
    console::init_logging(&config.setup.log_level)?;

    // Bind before taking over the terminal so a busy port is reported plainly.
    let listener = server::tarpit::bind(&config.network)
        .await
        .with_context(|| format!("Failed to listen on {}", config.network.listen_addr()))?;

    let cancel = CancellationToken::new();
    let monitor = Monitor::new(config.dashboard.log_capacity);
    let (events, pump) = monitor.spawn_event_pump(cancel.clone());

    let settings = server::tarpit::SessionSettings::new(&config.network, &config.tarpit);
    let server = tokio::spawn(server::tarpit::serve(
        listener,
        monitor.clone(),
        events,
        settings,
        cancel.clone(),
    ));

    let result = console::run_dashboard(&monitor, &config.dashboard, cancel.clone()).await;

    cancel.cancel();
    let _ = server.await;
    let _ = pump.await;
    info!("Shut down.");
    result
}
