//! data_runtime: companion data schemas and loaders.
//!
//! Kept separate from `server_core` so tooling (xtask schema checks) and the
//! server share one parsing path for definitions and tuning files.

pub mod companions;
pub mod loader;
pub mod configs {
    pub mod physics;
    pub mod telemetry;
}
