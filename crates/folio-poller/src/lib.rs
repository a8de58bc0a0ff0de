//! folio-poller: interval pollers, retry side schedule and the settle-all
//! roster fan-out. Each poller is an owned handle; nothing here is global.

pub mod aggregate;
pub mod poller;
pub mod refresh;

pub use aggregate::refresh_all;
pub use poller::{PollReader, PollerConfig, PollerHandle, start};
pub use refresh::RefreshFn;
