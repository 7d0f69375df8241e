// Root host shell and re-exports for workspace crates used by the binary.
pub use data_runtime as data;
pub use server_core as server;
pub mod demo;
