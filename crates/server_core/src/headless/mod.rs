//! In-memory host implementations of the world gateway and owner directory.
//! Used by the demo runner and the test suites; the failure knobs let tests
//! exercise every error path of the lifecycle and update engine.

pub mod owners;
pub mod world;

pub use owners::{HeadlessOwner, HeadlessOwners};
pub use world::{HeadlessObject, HeadlessWorld};
