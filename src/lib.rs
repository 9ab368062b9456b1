pub mod args;
pub mod cache;
pub mod config;
pub mod demand;
pub mod display;
pub mod os;
pub mod process;
pub mod sockets;
pub mod topo;
