pub use correlate::correlate;
pub use graph::{build, Graph, Locality};
pub use host::Host;
pub use locals::Locals;

mod correlate;
mod graph;
mod host;
mod locals;
