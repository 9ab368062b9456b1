pub use record::{Addr, Family, Holder, Protocol, Record, Table, Timer, TimerKind};
pub use snapshot::{Count, Snapshot, Source};
pub use state::{State, STATES};
pub use source::ProcNet;

mod record;
mod snapshot;
mod state;

#[cfg(target_os = "linux")]
#[path = "linux/procnet.rs"]
pub mod source;

#[cfg(not(target_os = "linux"))]
#[path = "empty.rs"]
pub mod source;
