pub mod app;
pub mod build;
pub mod config;
pub mod directory;
pub mod logging;
