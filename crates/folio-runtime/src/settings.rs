//! Effective configuration: defaults < config file < CLI flags / env.

use anyhow::Context;
use folio_core::FolioConfig;

use crate::cli::Cli;

pub fn resolve(cli: &Cli) -> anyhow::Result<FolioConfig> {
    let mut config = match &cli.config {
        Some(path) => FolioConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => FolioConfig::default(),
    };

    if let Some(url) = &cli.presence_url {
        config.presence.base_url.clone_from(url);
    }
    if let Some(id) = &cli.profile_id {
        config.presence.profile_id.clone_from(id);
    }

    config.validate().context("invalid effective configuration")?;
    tracing::debug!(
        presence = %config.presence.base_url,
        profile = %config.presence.profile_id,
        friends = config.presence.friends.len(),
        "configuration resolved"
    );
    Ok(config)
}
