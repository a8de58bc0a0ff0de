//! Plain-text rendering of presence, roster and forecast values.
//!
//! Everything here is a pure function returning `String`s; callers decide
//! where the lines go.

use folio_core::{
    AggregateResult, ErrorInfo, Forecast, PollPhase, PollState, PresenceSubject, Roster,
    format_clock,
};

const AVATAR_SIZE: u32 = 128;

// ─── Presence ────────────────────────────────────────────────────────

pub fn profile_line(subject: &PresenceSubject, now_ms: i64) -> String {
    let mut line = format!("{} [{}]", subject.display_name, subject.status.as_str());

    if let Some(custom) = &subject.custom_status {
        let emoji = custom.emoji.as_ref().map(|e| e.name.as_str());
        match (emoji, custom.text.as_deref()) {
            (Some(e), Some(t)) => line.push_str(&format!(" \"{e} {t}\"")),
            (Some(e), None) => line.push_str(&format!(" \"{e}\"")),
            (None, Some(t)) => line.push_str(&format!(" \"{t}\"")),
            (None, None) => {}
        }
    }

    if let Some(activity) = &subject.activity {
        line.push_str(&format!(" | {}", activity.name));
        if let Some(state) = &activity.state {
            line.push_str(&format!(" ({state})"));
        }
    }

    if let Some(track) = &subject.spotify {
        line.push_str(&format!(" | ♫ {} - {}", track.song, track.artist));
        if let Some(progress) = track.progress_at(now_ms) {
            line.push_str(&format!(
                " {}/{}",
                format_clock(progress.elapsed_ms),
                format_clock(progress.duration_ms)
            ));
        }
    }

    line.push_str(&format!(" | {}", subject.avatar_url(AVATAR_SIZE)));
    line
}

/// One line per roster entry, in roster order. Unresolved subjects get a
/// placeholder.
pub fn friends_lines(result: &AggregateResult, roster: &Roster) -> Vec<String> {
    result
        .in_roster_order(roster)
        .map(|(id, subject)| match subject {
            Some(s) => format!("{id}  {} [{}]", s.display_name, s.status.as_str()),
            None => format!("{id}  (unavailable)"),
        })
        .collect()
}

// ─── Weather ─────────────────────────────────────────────────────────

pub fn weather_line(forecast: &Forecast, location: &str) -> String {
    let current = &forecast.current;
    let mut line = format!(
        "{location}: {:.0}°C {}",
        current.temperature_2m,
        forecast.condition().label()
    );
    if let Some((min, max)) = forecast.today_range() {
        line.push_str(&format!(" ({min:.0}°/{max:.0}°)"));
    }
    line.push_str(&format!(
        " wind {:.0} km/h, humidity {:.0}%",
        current.wind_speed_10m, current.relative_humidity_2m
    ));
    line
}

// ─── Poll state ──────────────────────────────────────────────────────

pub fn error_line(info: &ErrorInfo) -> String {
    let mut line = format!("could not load: {}", info.error);
    if info.gave_up {
        line.push_str(" (gave up, waiting for next interval)");
    } else if let Some(ms) = info.next_retry_ms {
        line.push_str(&format!(" (retrying in {ms} ms)"));
    }
    line
}

/// Render a poller snapshot. `None` while a refresh is loading with nothing
/// to show yet.
pub fn state_lines<T>(
    name: &str,
    state: &PollState<T>,
    render: impl Fn(&T) -> Vec<String>,
) -> Option<Vec<String>> {
    let lines = match state.phase {
        PollPhase::Idle => return None,
        PollPhase::Loading if state.last_value.is_none() => vec!["loading…".to_string()],
        PollPhase::Loading => return None,
        PollPhase::Success => state.last_value.as_ref().map(&render).unwrap_or_default(),
        PollPhase::Failed => state
            .last_error
            .as_ref()
            .map(|info| vec![error_line(info)])
            .unwrap_or_default(),
    };
    Some(lines.into_iter().map(|l| format!("[{name}] {l}")).collect())
}
