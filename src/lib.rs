pub mod config;
pub mod quest;
pub mod terminal;

#[cfg(feature = "ssr")]
pub mod logging;
#[cfg(feature = "ssr")]
pub mod server;
