pub use fd::{FdCache, Holding, Owner};
pub use tracked::Tracked;

mod fd;
mod tracked;
