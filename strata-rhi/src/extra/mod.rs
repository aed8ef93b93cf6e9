//! Helpers built on the core API: staged uploads and deferred destruction

pub mod drop_sink;
pub mod upload;
