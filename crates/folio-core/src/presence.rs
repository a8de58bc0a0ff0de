//! Presence data model and response envelope decoding.
//!
//! The presence endpoint answers `{ success, data?, error? }`. Decoding is a
//! pure function of the requested subject, the HTTP status and the raw body,
//! so the whole failure taxonomy can be exercised without a network.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::now_playing::SpotifyTrack;

/// Discord activity type used for a user's custom status line.
pub const CUSTOM_STATUS_ACTIVITY: u8 = 4;

const AVATAR_CDN: &str = "https://cdn.discordapp.com";
const DEFAULT_REJECTION: &str = "failed to fetch user data";

// ─── Wire model ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    data: Option<PresenceData>,
    error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// `data` payload of a successful presence response.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceData {
    pub discord_user: DiscordUser,
    pub discord_status: OnlineStatus,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub spotify: Option<SpotifyTrack>,
    #[serde(default)]
    pub listening_to_spotify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub public_flags: Option<u64>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OnlineStatus {
    Online,
    Idle,
    Dnd,
    Offline,
    #[default]
    #[serde(other)]
    Unknown,
}

impl OnlineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnlineStatus::Online => "online",
            OnlineStatus::Idle => "idle",
            OnlineStatus::Dnd => "dnd",
            OnlineStatus::Offline => "offline",
            OnlineStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub emoji: Option<Emoji>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Emoji {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

/// A user's custom status line (activity type 4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomStatus {
    pub text: Option<String>,
    pub emoji: Option<Emoji>,
}

// ─── Normalised subject ──────────────────────────────────────────────

/// Resolved presence of one subject. Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceSubject {
    /// Always the identifier the subject was requested with.
    pub id: String,
    pub status: OnlineStatus,
    /// Avatar hash; `None` means the account uses a default avatar.
    pub avatar: Option<String>,
    pub display_name: String,
    /// First activity that is not a custom status.
    pub activity: Option<Activity>,
    pub custom_status: Option<CustomStatus>,
    pub spotify: Option<SpotifyTrack>,
}

impl PresenceSubject {
    /// Normalise a raw payload fetched for `subject_id`.
    pub fn from_data(subject_id: &str, data: PresenceData) -> Result<Self, FetchError> {
        if data.discord_user.id != subject_id {
            return Err(FetchError::Malformed(format!(
                "payload is for user {} but {subject_id} was requested",
                data.discord_user.id
            )));
        }

        let custom_status = data
            .activities
            .iter()
            .find(|a| a.kind == CUSTOM_STATUS_ACTIVITY)
            .map(|a| CustomStatus {
                text: a.state.clone(),
                emoji: a.emoji.clone(),
            });
        let activity = data
            .activities
            .into_iter()
            .find(|a| a.kind != CUSTOM_STATUS_ACTIVITY);
        let spotify = if data.listening_to_spotify {
            data.spotify
        } else {
            None
        };
        let display_name = data
            .discord_user
            .global_name
            .filter(|n| !n.is_empty())
            .unwrap_or(data.discord_user.username);

        Ok(Self {
            id: subject_id.to_string(),
            status: data.discord_status,
            avatar: data.discord_user.avatar,
            display_name,
            activity,
            custom_status,
            spotify,
        })
    }

    /// CDN URL of the subject's avatar at the given pixel size.
    pub fn avatar_url(&self, size: u32) -> String {
        match &self.avatar {
            Some(hash) => format!("{AVATAR_CDN}/avatars/{}/{hash}.png?size={size}", self.id),
            None => {
                let index = self.id.parse::<u64>().map(|n| (n >> 22) % 6).unwrap_or(0);
                format!("{AVATAR_CDN}/embed/avatars/{index}.png")
            }
        }
    }
}

// ─── Decoding ────────────────────────────────────────────────────────

/// Decode one presence response.
///
/// The HTTP status is checked before the body is parsed, so an error page
/// with a non-2xx status is reported as `HttpStatus`, never `Malformed`.
pub fn decode_presence(
    subject_id: &str,
    status: u16,
    body: &[u8],
) -> Result<PresenceSubject, FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::HttpStatus(status));
    }

    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if !envelope.success {
        let message = envelope
            .error
            .and_then(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION.to_string());
        return Err(FetchError::Rejected(message));
    }

    let data = envelope
        .data
        .ok_or_else(|| FetchError::Malformed("success envelope without data".to_string()))?;
    PresenceSubject::from_data(subject_id, data)
}
