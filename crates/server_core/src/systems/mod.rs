pub mod follow;
pub mod update;
