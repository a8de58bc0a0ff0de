//! `folio watch`: runs the profile, friends and weather pollers and prints
//! every published state until shutdown.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use folio_client::HttpTransport;
use folio_core::{FolioConfig, PollState, Roster};
use folio_poller::{PollReader, PollerConfig, PollerHandle, refresh};
use serde::Serialize;

use crate::cli::WatchOpts;
use crate::context::{Clients, now_ms};
use crate::render;

#[derive(Serialize)]
struct Event<'a, T> {
    poller: &'a str,
    state: &'a PollState<T>,
}

struct Printer<'a, W> {
    out: W,
    json: bool,
    roster: &'a Roster,
    location: &'a str,
}

impl<W: Write> Printer<'_, W> {
    fn emit<T: Serialize>(
        &mut self,
        poller: &str,
        state: &PollState<T>,
        text: impl Fn(&T) -> Vec<String>,
    ) -> anyhow::Result<()> {
        if self.json {
            if state.phase != folio_core::PollPhase::Idle {
                serde_json::to_writer(&mut self.out, &Event { poller, state })?;
                writeln!(self.out)?;
            }
        } else if let Some(lines) = render::state_lines(poller, state, text) {
            for line in lines {
                writeln!(self.out, "{line}")?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn profile(&mut self, state: &PollState<folio_core::PresenceSubject>) -> anyhow::Result<()> {
        self.emit("profile", state, |s| vec![render::profile_line(s, now_ms())])
    }

    fn friends(&mut self, state: &PollState<folio_core::AggregateResult>) -> anyhow::Result<()> {
        let roster = self.roster;
        self.emit("friends", state, |r| render::friends_lines(r, roster))
    }

    fn weather(&mut self, state: &PollState<folio_core::Forecast>) -> anyhow::Result<()> {
        let location = self.location;
        self.emit("weather", state, |f| vec![render::weather_line(f, location)])
    }
}

/// Next unseen state of an optional reader. Pending forever once the
/// reader is absent; a stopped poller clears its slot.
async fn next_state<T: Clone>(slot: &mut Option<PollReader<T>>) -> Option<PollState<T>> {
    let Some(reader) = slot.as_mut() else {
        return std::future::pending().await;
    };
    if reader.changed().await {
        Some(reader.snapshot_and_mark_seen())
    } else {
        *slot = None;
        None
    }
}

fn interval(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Run until `shutdown` resolves, then stop every poller.
pub async fn run_watch<T, W>(
    clients: &Clients<T>,
    config: &FolioConfig,
    opts: &WatchOpts,
    out: W,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()>
where
    T: HttpTransport + 'static,
    W: Write,
{
    let roster = config.roster()?;
    let intervals = &config.intervals;

    let profile = folio_poller::start(
        PollerConfig::new("profile", interval(intervals.profile_ms)),
        refresh::presence(
            Arc::clone(&clients.presence),
            config.presence.profile_id.clone(),
        ),
    );
    let friends = (!opts.no_friends).then(|| {
        folio_poller::start(
            PollerConfig::new("friends", interval(intervals.friends_ms))
                .with_retry(config.retry),
            refresh::roster(Arc::clone(&clients.presence), roster.clone()),
        )
    });
    let weather = (!opts.no_weather).then(|| {
        folio_poller::start(
            PollerConfig::new("weather", interval(intervals.weather_ms)),
            refresh::forecast(Arc::clone(&clients.weather), config.weather.query()),
        )
    });
    tracing::info!(
        friends = friends.is_some(),
        weather = weather.is_some(),
        "watch started"
    );

    let mut printer = Printer {
        out,
        json: opts.json,
        roster: &roster,
        location: &config.weather.location_name,
    };

    let mut profile_rx = Some(profile.reader());
    let mut friends_rx = friends.as_ref().map(PollerHandle::reader);
    let mut weather_rx = weather.as_ref().map(PollerHandle::reader);

    // States published before the readers existed.
    if let Some(rx) = profile_rx.as_mut() {
        printer.profile(&rx.snapshot_and_mark_seen())?;
    }
    if let Some(rx) = friends_rx.as_mut() {
        printer.friends(&rx.snapshot_and_mark_seen())?;
    }
    if let Some(rx) = weather_rx.as_mut() {
        printer.weather(&rx.snapshot_and_mark_seen())?;
    }

    tokio::pin!(shutdown);
    let outcome = loop {
        let step = tokio::select! {
            () = &mut shutdown => break Ok(()),
            Some(state) = next_state(&mut profile_rx) => printer.profile(&state),
            Some(state) = next_state(&mut friends_rx) => printer.friends(&state),
            Some(state) = next_state(&mut weather_rx) => printer.weather(&state),
        };
        if let Err(e) = step {
            break Err(e);
        }
    };

    profile.stop().await;
    if let Some(handle) = friends {
        handle.stop().await;
    }
    if let Some(handle) = weather {
        handle.stop().await;
    }
    tracing::info!("watch stopped");
    outcome
}

/// Resolves on ctrl-c, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!("cannot register SIGTERM handler: {e}");
                ctrl_c.await.ok();
                tracing::info!("received ctrl-c, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("received ctrl-c, shutting down");
    }
}
