pub mod config;
pub mod split;
