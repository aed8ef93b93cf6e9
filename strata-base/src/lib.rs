//! Small helpers used across the strata crates. Nothing here knows about graphics APIs.

mod decimal;
pub use decimal::DecimalF32;

pub mod memory;
