pub mod api;
pub mod config;
pub mod error;
pub mod feed_cache;
pub mod poller;
pub mod shutdown;
pub mod thingspeak;
