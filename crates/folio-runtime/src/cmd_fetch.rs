//! One-shot `profile`, `friends` and `weather` commands.

use std::io::Write;

use anyhow::Context;
use folio_client::HttpTransport;
use folio_core::{FolioConfig, PresenceSubject, SubjectFailure};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::context::{Clients, now_ms};
use crate::render;

#[derive(Serialize)]
struct FriendEntry<'a> {
    id: &'a str,
    subject: Option<&'a PresenceSubject>,
}

#[derive(Serialize)]
struct FriendsOutput<'a> {
    friends: Vec<FriendEntry<'a>>,
    failures: &'a [SubjectFailure],
}

pub async fn cmd_profile<T, W>(
    clients: &Clients<T>,
    config: &FolioConfig,
    json: bool,
    out: &mut W,
) -> anyhow::Result<()>
where
    T: HttpTransport,
    W: Write,
{
    let subject = clients
        .presence
        .fetch_presence(&config.presence.profile_id, &CancellationToken::new())
        .await
        .with_context(|| format!("fetching profile {}", config.presence.profile_id))?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &subject)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", render::profile_line(&subject, now_ms()))?;
    }
    Ok(())
}

pub async fn cmd_friends<T, W>(
    clients: &Clients<T>,
    config: &FolioConfig,
    json: bool,
    out: &mut W,
) -> anyhow::Result<()>
where
    T: HttpTransport,
    W: Write,
{
    let roster = config.roster()?;
    let cancel = CancellationToken::new();
    let result = folio_poller::refresh_all(&clients.presence, roster.ids(), &cancel)
        .await
        .into_refresh()
        .context("fetching friends")?;

    if json {
        let output = FriendsOutput {
            friends: result
                .in_roster_order(&roster)
                .map(|(id, subject)| FriendEntry { id, subject })
                .collect(),
            failures: &result.failures,
        };
        serde_json::to_writer_pretty(&mut *out, &output)?;
        writeln!(out)?;
    } else {
        for line in render::friends_lines(&result, &roster) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

pub async fn cmd_weather<T, W>(
    clients: &Clients<T>,
    config: &FolioConfig,
    json: bool,
    out: &mut W,
) -> anyhow::Result<()>
where
    T: HttpTransport,
    W: Write,
{
    let forecast = clients
        .weather
        .fetch_forecast(&config.weather.query(), &CancellationToken::new())
        .await
        .context("fetching forecast")?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &forecast)?;
        writeln!(out)?;
    } else {
        writeln!(
            out,
            "{}",
            render::weather_line(&forecast, &config.weather.location_name)
        )?;
    }
    Ok(())
}
