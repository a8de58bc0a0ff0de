//! folio: presence, friends and weather poller for a portfolio page.
//! Long-running `watch` mode plus one-shot fetch commands.

use clap::Parser;

mod cli;
mod cmd_fetch;
mod context;
mod render;
mod settings;
mod watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("FOLIO_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = settings::resolve(&args)?;
    let clients = context::build_clients(&config)?;
    let mut stdout = std::io::stdout().lock();

    let command = args
        .command
        .unwrap_or_else(|| cli::Command::Watch(cli::WatchOpts::default()));

    match command {
        cli::Command::Watch(opts) => {
            tracing::info!("folio watch starting");
            watch::run_watch(&clients, &config, &opts, stdout, watch::shutdown_signal()).await?;
        }
        cli::Command::Profile(opts) => {
            cmd_fetch::cmd_profile(&clients, &config, opts.json, &mut stdout).await?;
        }
        cli::Command::Friends(opts) => {
            cmd_fetch::cmd_friends(&clients, &config, opts.json, &mut stdout).await?;
        }
        cli::Command::Weather(opts) => {
            cmd_fetch::cmd_weather(&clients, &config, opts.json, &mut stdout).await?;
        }
    }

    Ok(())
}
