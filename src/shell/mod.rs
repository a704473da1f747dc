// Composition root: reads config from the environment, wires the in-memory
// infrastructure into the use case handlers, and serves the HTTP surface.

pub mod config;
pub mod envelope;
pub mod http;
pub mod state;
