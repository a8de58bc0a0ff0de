//! folio-client: HTTP IO boundary.
//! Provides the transport seam plus the presence and forecast clients.
//! Decoding and error classification live in folio-core.

pub mod presence;
pub mod transport;
pub mod weather;

pub use presence::PresenceClient;
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use weather::WeatherClient;
