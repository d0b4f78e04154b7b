pub mod config;
pub mod dispatch;
pub mod error;
pub mod parsers;
pub mod response;
pub mod server;
