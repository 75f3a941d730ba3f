pub mod config;
pub mod personas;
pub mod simulate;
