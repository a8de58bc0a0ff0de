//! folio-core: presence data model, failure taxonomy, retry policy and poll
//! state. No IO, no async runtime; everything here is a pure function of
//! its inputs.

pub mod aggregate;
pub mod backoff;
pub mod config;
pub mod error;
pub mod now_playing;
pub mod poll_state;
pub mod presence;
pub mod roster;
pub mod weather;

pub use aggregate::{AggregateResult, AggregateStatus, SubjectFailure};
pub use backoff::{RetryDecision, RetryPolicy};
pub use config::{ConfigError, FolioConfig};
pub use error::{FetchError, RefreshError};
pub use now_playing::{SpotifyTrack, TrackProgress, format_clock};
pub use poll_state::{ErrorInfo, PollPhase, PollState};
pub use presence::{OnlineStatus, PresenceSubject, decode_presence};
pub use roster::Roster;
pub use weather::{Forecast, WeatherCondition, WeatherQuery, decode_forecast};
