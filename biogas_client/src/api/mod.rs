//! Typed wrappers over the backend's endpoints, one module per area.

mod auth;
mod calculator;
mod calibrations;
mod dashboard;
mod resources;
mod sensors;
pub mod types;
mod users;

pub use types::*;
