//! SwopTrader application: configuration, the SQLite local cache and the
//! REST server.

pub mod config;
pub mod db;
pub mod server;
