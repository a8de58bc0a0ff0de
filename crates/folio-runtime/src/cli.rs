//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "folio", about = "Presence, friends and weather poller for a portfolio page")]
pub struct Cli {
    /// TOML config file (defaults apply when omitted)
    #[arg(long, short = 'c', global = true, env = "FOLIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Presence API base URL, overrides the config file
    #[arg(long, global = true, env = "FOLIO_PRESENCE_URL")]
    pub presence_url: Option<String>,

    /// Profile subject id, overrides the config file
    #[arg(long, global = true)]
    pub profile_id: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run all pollers and print every state change until interrupted
    Watch(WatchOpts),
    /// Fetch the profile once
    Profile(OutputOpts),
    /// Fetch the friends roster once
    Friends(OutputOpts),
    /// Fetch the local forecast once
    Weather(OutputOpts),
}

#[derive(clap::Args, Default)]
pub struct WatchOpts {
    /// Do not poll the friends roster
    #[arg(long)]
    pub no_friends: bool,

    /// Do not poll the weather
    #[arg(long)]
    pub no_weather: bool,

    /// Emit one JSON object per state change
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Default)]
pub struct OutputOpts {
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}
