//! Liveness Module
//!
//! Owns the shared device registry and the periodic sweep that evicts
//! devices which stop answering pings.

mod registry;
mod sweeper;

pub use registry::SharedRegistry;
pub use sweeper::LivenessSweeper;
